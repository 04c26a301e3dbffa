mod cli_error;
mod config_error;
mod script_error;

pub use cli_error::CliError;
pub use config_error::ConfigError;
pub use script_error::{ScriptError, ScriptErrorKind};
