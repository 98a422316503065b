pub mod config;
pub mod handlers;
pub mod observability;
pub mod operations;
pub mod server;

pub use config::{AppConfig, LoggingConfig, ServerConfig};
pub use observability::init_tracing;
pub use server::{AppState, CqlBridgeServer, ServerBuilder, build_app};
