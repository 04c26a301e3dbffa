//! Handler errors and their HTTP mapping

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use deploy_hook_core::api::{DeploymentResponse, Environment, ScriptError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum HttpServerError {
    /// Every script failure kind maps to the same 500 response.
    #[error("{source}")]
    Deployment {
        environment: Environment,
        #[source]
        source: ScriptError,
    },
}

impl IntoResponse for HttpServerError {
    fn into_response(self) -> Response {
        match self {
            HttpServerError::Deployment {
                environment,
                source,
            } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(DeploymentResponse::failure(environment, source.to_string())),
            )
                .into_response(),
        }
    }
}
