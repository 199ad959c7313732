pub mod config;
pub mod routes;

pub use config::{ConfigError, Environment, ServerConfig};
pub use routes::{build_app, layered, ApiError, AppState};
