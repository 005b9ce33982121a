//! Read-only client for the Jikan (MyAnimeList) API
//!
//! Handlers depend on the [`MetadataSource`] trait so tests can swap in
//! [`MockSource`] without network access.

pub mod client;
pub mod dto;
pub mod mock;
pub mod retry;

use async_trait::async_trait;
use serde::Serialize;

use animelog_core::models::{MalId, MediaKind};

pub use client::JikanClient;
pub use mock::MockSource;
pub use retry::RetryPolicy;

/// Jikan's maximum page size
pub const MAX_PAGE_SIZE: u32 = 25;

/// Search hit trimmed to the fields the tracker stores.
///
/// Serializes with the same keys the create endpoints accept, so a hit can
/// be posted back as-is.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaSummary {
    pub kind: MediaKind,
    #[serde(rename = "mal_id")]
    pub mal_id: i64,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title_english: Option<String>,
    pub cover_image: Option<String>,
    pub synopsis: Option<String>,
    pub api_status: Option<String>,
    pub api_score: Option<f64>,
    pub source: Option<String>,
    pub genres: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_episodes: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trailer_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aired_from: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aired_to: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_chapters: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_volumes: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub published_from: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub published_to: Option<String>,
}

impl MediaSummary {
    /// Bare summary with only the identifying fields set
    pub fn new(kind: MediaKind, mal_id: i64, title: impl Into<String>) -> Self {
        Self {
            kind,
            mal_id,
            title: title.into(),
            title_english: None,
            cover_image: None,
            synopsis: None,
            api_status: None,
            api_score: None,
            source: None,
            genres: Vec::new(),
            total_episodes: None,
            trailer_url: None,
            aired_from: None,
            aired_to: None,
            total_chapters: None,
            total_volumes: None,
            published_from: None,
            published_to: None,
        }
    }
}

/// One page of results and whether Jikan has another
#[derive(Debug, Clone, PartialEq)]
pub struct MediaPage {
    pub items: Vec<MediaSummary>,
    pub has_next_page: bool,
}

/// A recommended title with the number of users who suggested it
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Recommendation {
    #[serde(rename = "mal_id")]
    pub mal_id: i64,
    pub title: String,
    pub cover_image: Option<String>,
    pub url: Option<String>,
    pub votes: u32,
}

/// Metadata API errors
#[derive(Debug, thiserror::Error)]
pub enum JikanError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("upstream returned status {status}")]
    Status { status: u16 },

    #[error("not found upstream")]
    NotFound,

    #[error("rate limited after {attempts} attempts")]
    RateLimited { attempts: u32 },

    #[error("could not decode response: {0}")]
    Decode(String),

    #[error("invalid client configuration: {0}")]
    Config(String),
}

/// Source of media metadata
#[async_trait]
pub trait MetadataSource: Send + Sync {
    /// Free-text search, at most `limit` results (clamped to 1..=25).
    async fn search(
        &self,
        kind: MediaKind,
        query: &str,
        limit: u32,
    ) -> Result<Vec<MediaSummary>, JikanError>;

    /// One page of the highest-scored anime in a genre.
    async fn top_by_genre(&self, genre_id: u32, page: u32) -> Result<MediaPage, JikanError>;

    async fn recommendations(
        &self,
        kind: MediaKind,
        mal_id: MalId,
    ) -> Result<Vec<Recommendation>, JikanError>;
}

/// Clamp a requested page size into Jikan's accepted range.
pub fn clamp_limit(limit: u32) -> u32 {
    limit.clamp(1, MAX_PAGE_SIZE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn limit_is_clamped() {
        assert_eq!(clamp_limit(0), 1);
        assert_eq!(clamp_limit(10), 10);
        assert_eq!(clamp_limit(500), 25);
    }

    #[test]
    fn summary_serializes_create_keys() {
        let mut hit = MediaSummary::new(MediaKind::Anime, 1, "Cowboy Bebop");
        hit.total_episodes = Some(26);
        hit.cover_image = Some("https://img/1.jpg".into());

        let json = serde_json::to_value(&hit).unwrap();
        assert_eq!(json["mal_id"], 1);
        assert_eq!(json["totalEpisodes"], 26);
        assert_eq!(json["coverImage"], "https://img/1.jpg");
        assert_eq!(json["kind"], "anime");
        assert!(json.get("totalChapters").is_none());
    }
}
