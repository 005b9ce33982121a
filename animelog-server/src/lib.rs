//! animelog-server: HTTP API for tracking anime and manga progress
//!
//! Per-user CRUD over Postgres, JWT sessions, and a rate-limited proxy
//! to the Jikan (MyAnimeList) metadata API.

pub mod auth;
pub mod db;
pub mod http;
pub mod jikan;

pub use http::{build_router, run_server, AppState, ServerConfig, ServerError};
