//! Stable re-exports for consumers (`cli` and tests).
//!
//! Prefer importing from `deploy_hook_core::api` instead of reaching into internal modules.

pub use crate::config::{AppConfig, HttpServerConfig, LoggingConfig, ScriptsConfig};
pub use crate::deploy::Deployer;
pub use crate::environment::Environment;
pub use crate::error::{CliError, ConfigError, ScriptError, ScriptErrorKind};
pub use crate::runner::{ScriptExecutor, ScriptRunner};
pub use crate::types::{DeploymentResponse, DeploymentStatus};
