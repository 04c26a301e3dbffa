//! HTTP endpoint layer

pub mod error;
pub mod middleware;
pub mod routes;
pub mod server;
pub mod state;

pub use error::HttpServerError;
pub use routes::create_router;
pub use server::{build_app, serve, start_server, ServerConfig};
pub use state::AppState;
