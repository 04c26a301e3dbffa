use clap::Parser;
use deploy_hook::commands::{cli, http_server, run};
use deploy_hook::logging;
use deploy_hook_core::api::{AppConfig, CliError};
use deploy_hook_core::config;

#[tokio::main]
async fn main() -> Result<(), CliError> {
    let mut args = cli::Args::parse();
    let cfg = config::load(args.config.as_deref())?;

    let guard = logging::init_logging(&cfg.logging)
        .map_err(|e| CliError::Command(format!("failed to initialise logging: {e}")))?;

    let cmd = args
        .command
        .take()
        .unwrap_or_else(|| cli::Commands::Serve(cli::HttpServerArgs::default()));
    let exit = dispatch(cmd, &cfg).await?;

    drop(guard);
    if exit != 0 {
        std::process::exit(exit);
    }
    Ok(())
}

async fn dispatch(cmd: cli::Commands, cfg: &AppConfig) -> Result<i32, CliError> {
    match cmd {
        cli::Commands::Serve(serve_args) => {
            http_server::handle_http_server(serve_args, cfg).await?;
            Ok(0)
        }
        cli::Commands::Run(run_args) => run::handle_run(run_args, cfg).await,
    }
}
