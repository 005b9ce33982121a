//! HTTP server layer
//!
//! Axum server with:
//! - Bearer-token auth on every per-user route
//! - CORS (localhost only by default)
//! - Request tracing
//! - Graceful shutdown
//! - JSON envelopes for success and error bodies

pub mod error;
pub mod extractors;
pub mod response;
pub mod routes;
pub mod server;

#[cfg(test)]
pub(crate) mod testing;

pub use error::ApiError;
pub use response::Envelope;
pub use server::{build_router, run_server, AppState, ServerConfig, ServerError};
