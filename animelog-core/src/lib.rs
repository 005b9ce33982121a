//! animelog-core: domain types shared by the animelog server and CLI
//!
//! Everything that arrives from a client is validated here before it
//! reaches storage. Invalid input returns [`ValidationError`], not panic.

pub mod config;
pub mod error;
pub mod models;
pub mod validation;

pub use config::AnimelogConfig;
pub use error::{CoreError, Result};
pub use validation::ValidationError;
