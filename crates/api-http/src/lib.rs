//! HTTP API Layer
//!
//! Routes `/<prefix>/<service>/<method>/...` onto the core dispatcher,
//! authenticates callers, and serves everything over hyper.

pub mod error;
pub mod handler;
pub mod route;
pub mod server;

pub use error::ServerError;
pub use handler::GatewayHandler;
pub use route::{Route, RouteConfig};
pub use server::{HttpServer, DEFAULT_MAX_BODY_BYTES};
