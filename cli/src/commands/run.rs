//! `run` command handler

use std::sync::Arc;

use deploy_hook_core::api::{AppConfig, CliError, Deployer, ScriptRunner};

use crate::commands::cli::RunArgs;

/// Runs one deployment in-process and prints the response JSON to stdout.
/// Returns the process exit code.
pub async fn handle_run(args: RunArgs, cfg: &AppConfig) -> Result<i32, CliError> {
    let runner = ScriptRunner::from_config(&cfg.scripts);
    let deployer = Deployer::new(Arc::new(runner), cfg.scripts.clone());

    let response = deployer.deploy_response(args.environment).await;
    let json = serde_json::to_string_pretty(&response)
        .map_err(|e| CliError::Command(format!("failed to encode response: {e}")))?;
    println!("{json}");

    Ok(if response.is_success() { 0 } else { 1 })
}
