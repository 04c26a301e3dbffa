use std::sync::Arc;
use std::time::Instant;

use tracing::Instrument;
use uuid::Uuid;

use crate::config::ScriptsConfig;
use crate::environment::Environment;
use crate::error::ScriptError;
use crate::runner::ScriptExecutor;
use crate::types::DeploymentResponse;

/// Binds each environment to its script and runs it through a
/// [`ScriptExecutor`]. Concurrent triggers are not serialized.
#[derive(Clone)]
pub struct Deployer {
    executor: Arc<dyn ScriptExecutor>,
    scripts: ScriptsConfig,
}

impl Deployer {
    pub fn new(executor: Arc<dyn ScriptExecutor>, scripts: ScriptsConfig) -> Self {
        Self { executor, scripts }
    }

    pub async fn deploy(&self, env: Environment) -> Result<String, ScriptError> {
        let deployment_id = Uuid::new_v4();
        let script = self.scripts.script_for(env);
        let span = tracing::info_span!(
            "deployment",
            %deployment_id,
            environment = env.display_name(),
        );

        async move {
            tracing::info!(script = %script.display(), "deployment started");
            let started = Instant::now();
            let result = self.executor.execute(&script).await;
            let duration_ms = started.elapsed().as_millis() as u64;

            match &result {
                Ok(output) => tracing::info!(
                    duration_ms,
                    output_lines = output.lines().count(),
                    "deployment succeeded"
                ),
                Err(e) => tracing::warn!(
                    duration_ms,
                    error.kind = e.kind().as_str(),
                    error.message = %e,
                    "deployment failed"
                ),
            }
            result
        }
        .instrument(span)
        .await
    }

    pub async fn deploy_response(&self, env: Environment) -> DeploymentResponse {
        DeploymentResponse::from_result(env, self.deploy(env).await)
    }
}
