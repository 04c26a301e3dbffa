use std::path::PathBuf;

use clap::{Args as ClapArgs, Parser, Subcommand};
use deploy_hook_core::api::Environment;

#[derive(Parser, Debug, Clone)]
#[command(version, about = "HTTP trigger for DEV/QA deployment scripts")]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Config file (defaults to ./config.toml, then ~/.deploy-hook/config.toml).
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(ClapArgs, Debug, Clone, Default)]
pub struct HttpServerArgs {
    /// Listen address; overrides `http_server.host`.
    #[arg(long)]
    pub host: Option<String>,

    /// Listen port; overrides `http_server.port`.
    #[arg(long)]
    pub port: Option<u16>,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct RunArgs {
    /// Environment to deploy: dev or qa.
    pub environment: Environment,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Run the HTTP server (default).
    Serve(HttpServerArgs),
    /// Run one deployment and print the JSON result.
    Run(RunArgs),
}
