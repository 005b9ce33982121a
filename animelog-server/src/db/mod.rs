//! Database layer - connection pool, schema, repositories
//!
//! # Design Principles
//!
//! - One row per (user, media) pair; uniqueness lives in the schema
//! - Rely on DB constraints, handle conflicts - no check-then-insert
//! - Every query on tracked media is scoped by `user_id`

pub mod migrations;
pub mod pool;
pub mod repos;

pub use pool::{connect, create_pool, create_pool_with_options};
pub use repos::*;
