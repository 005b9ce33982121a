//! Validation error types

use std::fmt;

/// Validation error for domain inputs
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// Field is missing or blank
    Empty { field: &'static str },

    /// Field is shorter than allowed
    TooShort { field: &'static str, min: usize },

    /// Field exceeds maximum length
    TooLong { field: &'static str, max: usize },

    /// String doesn't match required format (e.g., email)
    InvalidFormat { field: &'static str, reason: &'static str },

    /// Number outside the accepted range
    OutOfRange { field: &'static str, min: f64, max: f64 },

    /// Invalid enum variant
    InvalidVariant { field: &'static str, value: String },

    /// Request carried several required fields and some were missing
    MissingFields { message: String },

    /// Partial update carried nothing to change
    NothingToUpdate,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty { field } => write!(f, "{} cannot be empty", field),
            Self::TooShort { field, min } => {
                write!(f, "{} must be at least {} characters long", field, min)
            }
            Self::TooLong { field, max } => {
                write!(f, "{} cannot exceed {} characters", field, max)
            }
            Self::InvalidFormat { field, reason } => write!(f, "{}: {}", field, reason),
            Self::OutOfRange { field, min, max } => {
                write!(f, "{} must be between {} and {}", field, min, max)
            }
            Self::InvalidVariant { field, value } => {
                write!(f, "invalid {} value: '{}'", field, value)
            }
            Self::MissingFields { message } => f.write_str(message),
            Self::NothingToUpdate => f.write_str("No valid fields provided for update."),
        }
    }
}

impl std::error::Error for ValidationError {}
