//! `serve` command handler

use deploy_hook_core::api::{AppConfig, CliError, Environment, ScriptsConfig};

use crate::commands::cli::HttpServerArgs;
use crate::http::{server, AppState, ServerConfig};

pub async fn handle_http_server(args: HttpServerArgs, cfg: &AppConfig) -> Result<(), CliError> {
    let mut config = ServerConfig::from(&cfg.http_server);
    if let Some(host) = args.host {
        config.host = host;
    }
    if let Some(port) = args.port {
        config.port = port;
    }

    preflight(&cfg.scripts);

    let state = AppState::new(cfg.scripts.clone());

    tracing::info!(
        "Starting HTTP server on {}:{} (interpreter: {})",
        config.host,
        config.port,
        cfg.scripts.interpreter
    );

    server::start_server(config, state).await
}

/// Warns about problems that would only surface on the first trigger.
/// Returns the number of warnings emitted.
pub fn preflight(scripts: &ScriptsConfig) -> usize {
    let mut warnings = 0;

    if let Err(e) = which::which(&scripts.interpreter) {
        tracing::warn!(
            interpreter = %scripts.interpreter,
            error = %e,
            "script interpreter not found on PATH"
        );
        warnings += 1;
    }

    for env in Environment::ALL {
        let path = scripts.resolved_script_for(env);
        if !path.is_file() {
            tracing::warn!(
                environment = env.display_name(),
                script = %path.display(),
                "deployment script not found"
            );
            warnings += 1;
        }
    }

    warnings
}
