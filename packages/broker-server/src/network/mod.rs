//! HTTP transport: configuration, routes, request guards, and shutdown control.

pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod module;
pub mod shutdown;

pub use config::*;
pub use error::{ApiError, ErrorBody};
pub use handlers::AppState;
pub use module::BrokerServer;
pub use shutdown::*;
