/// Structured error types for animelog-core.
///
/// The binary wraps these in `anyhow`; the HTTP layer maps them to
/// status codes.
use std::io;
use std::path::PathBuf;
use thiserror::Error;

use crate::validation::ValidationError;

/// Main error type for animelog-core operations
#[derive(Error, Debug)]
pub enum CoreError {
    /// User input failed validation
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// I/O operation failed
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: io::Error,
    },

    /// Config file exists but is not valid TOML for our schema
    #[error("Failed to parse config file {path:?}: {source}")]
    Toml {
        path: PathBuf,
        source: toml::de::Error,
    },

    /// Configuration is incomplete or inconsistent
    #[error("Configuration error: {reason}")]
    Config { reason: String },
}

/// Result type alias for animelog-core operations
pub type Result<T> = std::result::Result<T, CoreError>;

impl CoreError {
    /// Create a config error
    pub fn config(reason: impl Into<String>) -> Self {
        Self::Config {
            reason: reason.into(),
        }
    }
}
