//! Route handlers organized by resource

pub mod anime;
pub mod health;
pub mod manga;
pub mod search;
pub mod users;
