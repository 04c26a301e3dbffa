pub mod api;
pub mod config;
pub mod deploy;
pub mod environment;
pub mod error;
pub mod runner;
pub mod types;

pub use deploy::Deployer;
pub use environment::Environment;
