//! Repository implementations for database access
//!
//! Each repository follows these patterns:
//! - Duplicates are caught by unique constraints, never by a prior lookup
//! - Queries that touch per-user rows carry `user_id` in the WHERE clause
//! - Progress updates are a single UPDATE with COALESCE

pub mod anime;
pub mod manga;
pub mod users;

pub use anime::{AnimeRecord, AnimeRepo};
pub use manga::{MangaRecord, MangaRepo};
pub use users::{UserProfile, UserRecord, UserRepo};

use uuid::Uuid;

/// Database error type
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("database error: {0}")]
    Sqlx(#[from] sqlx::Error),

    #[error("not found: {resource} '{id}'")]
    NotFound { resource: &'static str, id: String },

    /// Unique constraint rejected the write
    #[error("{resource} conflict on {constraint}")]
    Conflict {
        resource: &'static str,
        constraint: String,
    },
}

impl DbError {
    pub(crate) fn not_found(resource: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            resource,
            id: id.to_string(),
        }
    }

    /// Turn a unique violation into `Conflict`, pass everything else through.
    pub(crate) fn classify(resource: &'static str, err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db) = &err {
            if db.is_unique_violation() {
                return Self::Conflict {
                    resource,
                    constraint: db.constraint().unwrap_or_default().to_owned(),
                };
            }
        }
        Self::Sqlx(err)
    }

    /// Name of the violated constraint, if this is a conflict.
    pub fn conflict_constraint(&self) -> Option<&str> {
        match self {
            Self::Conflict { constraint, .. } => Some(constraint),
            _ => None,
        }
    }
}

/// A row that belongs to exactly one user
pub trait Owned {
    fn owner(&self) -> Uuid;

    fn is_owned_by(&self, user_id: Uuid) -> bool {
        self.owner() == user_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_database_errors_are_not_conflicts() {
        let err = DbError::classify("anime", sqlx::Error::RowNotFound);
        assert!(matches!(err, DbError::Sqlx(sqlx::Error::RowNotFound)));
        assert!(err.conflict_constraint().is_none());
    }

    #[test]
    fn not_found_message() {
        let err = DbError::not_found("manga", "abc");
        assert_eq!(err.to_string(), "not found: manga 'abc'");
    }
}
