//! API error type with IntoResponse
//!
//! Every failure leaves the server as `{"success": false, "error", "message"}`.
//! Internal details (database, hashing, upstream bodies) are logged, never sent.

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use animelog_core::ValidationError;

use crate::auth::AuthError;
use crate::db::repos::DbError;
use crate::jikan::JikanError;

pub const RATE_LIMITED_MESSAGE: &str =
    "Rate limited by Jikan API. Please wait a moment and try again.";

/// API error type with automatic HTTP status mapping
#[derive(Debug)]
pub enum ApiError {
    /// Validation failed (400)
    Validation(ValidationError),

    /// Request understood but refused (400)
    BadRequest { message: String },

    /// Missing or bad credentials (401)
    Unauthorized { message: String },

    /// Resource belongs to someone else (403)
    Forbidden { message: String },

    /// Resource not found (404)
    NotFound { message: String },

    /// Duplicate entry (409)
    Conflict { message: String },

    /// Metadata API failed (502)
    Upstream { message: String },

    /// Metadata API is rate limiting us (503)
    Unavailable { message: String },

    /// Database error (500, logged)
    Database(DbError),

    /// Internal error (500, logged)
    Internal { message: String },
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest {
            message: message.into(),
        }
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden {
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict {
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) | Self::BadRequest { .. } => StatusCode::BAD_REQUEST,
            Self::Unauthorized { .. } => StatusCode::UNAUTHORIZED,
            Self::Forbidden { .. } => StatusCode::FORBIDDEN,
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::Conflict { .. } => StatusCode::CONFLICT,
            Self::Upstream { .. } => StatusCode::BAD_GATEWAY,
            Self::Unavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
            Self::Database(_) | Self::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let (code, message) = match self {
            Self::Validation(e) => ("validation_error", e.to_string()),
            Self::BadRequest { message } => ("bad_request", message),
            Self::Unauthorized { message } => ("unauthorized", message),
            Self::Forbidden { message } => ("forbidden", message),
            Self::NotFound { message } => ("not_found", message),
            Self::Conflict { message } => ("conflict", message),
            Self::Upstream { message } => ("upstream_error", message),
            Self::Unavailable { message } => ("rate_limited", message),
            Self::Database(e) => {
                // Log the actual error, return generic message
                tracing::error!("Database error: {}", e);
                ("internal_error", "an internal error occurred".to_string())
            }
            Self::Internal { message } => {
                tracing::error!("Internal error: {}", message);
                ("internal_error", "an internal error occurred".to_string())
            }
        };

        let body = json!({
            "success": false,
            "error": code,
            "message": message,
        });
        (status, Json(body)).into_response()
    }
}

impl From<ValidationError> for ApiError {
    fn from(e: ValidationError) -> Self {
        Self::Validation(e)
    }
}

impl From<DbError> for ApiError {
    fn from(e: DbError) -> Self {
        match e {
            DbError::NotFound { resource, .. } => Self::NotFound {
                message: format!("{} not found", capitalize(resource)),
            },
            DbError::Conflict { resource, .. } => Self::Conflict {
                message: format!("{} already exists", capitalize(resource)),
            },
            other => Self::Database(other),
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(e: AuthError) -> Self {
        let message = match e {
            AuthError::Missing => "Not authorized, no token",
            AuthError::Expired => "Not authorized, token expired",
            AuthError::Invalid(ref reason) => {
                tracing::debug!(reason = %reason, "rejected token");
                "Not authorized, token failed"
            }
            AuthError::Hash(_) | AuthError::Encode(_) => {
                return Self::Internal {
                    message: e.to_string(),
                }
            }
        };
        Self::Unauthorized {
            message: message.to_string(),
        }
    }
}

impl From<JikanError> for ApiError {
    fn from(e: JikanError) -> Self {
        match e {
            JikanError::RateLimited { .. } => Self::Unavailable {
                message: RATE_LIMITED_MESSAGE.to_string(),
            },
            JikanError::NotFound => Self::NotFound {
                message: "Not found on MyAnimeList".to_string(),
            },
            JikanError::Config(message) => Self::Internal { message },
            other => {
                tracing::warn!(error = %other, "Jikan request failed");
                Self::Upstream {
                    message: "Failed to fetch data from the Jikan API".to_string(),
                }
            }
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(e: JsonRejection) -> Self {
        Self::BadRequest {
            message: e.body_text(),
        }
    }
}

impl From<QueryRejection> for ApiError {
    fn from(e: QueryRejection) -> Self {
        Self::BadRequest {
            message: e.body_text(),
        }
    }
}

impl From<PathRejection> for ApiError {
    fn from(e: PathRejection) -> Self {
        Self::BadRequest {
            message: e.body_text(),
        }
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
