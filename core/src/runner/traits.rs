use std::path::Path;

use async_trait::async_trait;

use crate::error::ScriptError;

/// Runs a script to completion and returns its merged output.
#[async_trait]
pub trait ScriptExecutor: Send + Sync {
    async fn execute(&self, script: &Path) -> Result<String, ScriptError>;
}
