use serde::{Deserialize, Serialize};

use crate::environment::Environment;
use crate::error::ScriptError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeploymentStatus {
    Success,
    Error,
}

/// Response payload for one deployment trigger. Exactly one of `output`
/// and `error` is set; use the constructors to keep it that way.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentResponse {
    pub status: DeploymentStatus,
    pub environment: Environment,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl DeploymentResponse {
    pub fn success(environment: Environment, output: String) -> Self {
        Self {
            status: DeploymentStatus::Success,
            environment,
            output: Some(output),
            error: None,
        }
    }

    pub fn failure(environment: Environment, message: impl Into<String>) -> Self {
        Self {
            status: DeploymentStatus::Error,
            environment,
            output: None,
            error: Some(message.into()),
        }
    }

    pub fn from_result(environment: Environment, result: Result<String, ScriptError>) -> Self {
        match result {
            Ok(output) => Self::success(environment, output),
            Err(e) => Self::failure(environment, e.to_string()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == DeploymentStatus::Success
    }
}
