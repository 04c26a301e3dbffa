pub mod exit;
mod output;
mod script;
mod traits;

pub use script::ScriptRunner;
pub use traits::ScriptExecutor;
