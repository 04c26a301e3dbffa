//! Shared handler state

use std::sync::Arc;

use chrono::{DateTime, Local};
use deploy_hook_core::api::{Deployer, ScriptExecutor, ScriptRunner, ScriptsConfig};
use tokio::sync::broadcast;

#[derive(Clone)]
pub struct AppState {
    pub deployer: Arc<Deployer>,
    /// Graceful shutdown fans out here so running scripts are interrupted.
    pub shutdown_tx: broadcast::Sender<()>,
    pub started_at: DateTime<Local>,
}

impl AppState {
    /// State backed by a real [`ScriptRunner`] wired to the shutdown channel.
    pub fn new(scripts: ScriptsConfig) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);
        let runner = ScriptRunner::from_config(&scripts).with_shutdown(shutdown_tx.clone());
        Self::with_executor(Arc::new(runner), scripts, shutdown_tx)
    }

    pub fn with_executor(
        executor: Arc<dyn ScriptExecutor>,
        scripts: ScriptsConfig,
        shutdown_tx: broadcast::Sender<()>,
    ) -> Self {
        Self {
            deployer: Arc::new(Deployer::new(executor, scripts)),
            shutdown_tx,
            started_at: Local::now(),
        }
    }
}
