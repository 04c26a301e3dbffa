//! HTTP route handlers

use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use deploy_hook_core::api::{DeploymentResponse, Environment};

use crate::http::{error::HttpServerError, state::AppState};

pub const HELLO_MESSAGE: &str = "Hello CI/CD";

/// Builds every route
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/api/deployment/deploy-dev", post(deploy_dev_handler))
        .route("/api/deployment/deploy-qa", post(deploy_qa_handler))
        .route("/hello", get(hello_handler))
        .with_state(state)
}

/// POST /api/deployment/deploy-dev
async fn deploy_dev_handler(
    State(state): State<AppState>,
) -> Result<Json<DeploymentResponse>, HttpServerError> {
    run_deployment(&state, Environment::Dev).await
}

/// POST /api/deployment/deploy-qa
async fn deploy_qa_handler(
    State(state): State<AppState>,
) -> Result<Json<DeploymentResponse>, HttpServerError> {
    run_deployment(&state, Environment::Qa).await
}

async fn run_deployment(
    state: &AppState,
    environment: Environment,
) -> Result<Json<DeploymentResponse>, HttpServerError> {
    match state.deployer.deploy(environment).await {
        Ok(output) => Ok(Json(DeploymentResponse::success(environment, output))),
        Err(source) => Err(HttpServerError::Deployment {
            environment,
            source,
        }),
    }
}

/// GET /hello
async fn hello_handler() -> &'static str {
    HELLO_MESSAGE
}
