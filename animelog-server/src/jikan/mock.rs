//! In-memory metadata source for tests

use std::sync::Mutex;

use async_trait::async_trait;

use animelog_core::models::{MalId, MediaKind};

use super::{JikanError, MediaPage, MediaSummary, MetadataSource, Recommendation};

/// Canned failure for the next call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockFailure {
    RateLimited,
    NotFound,
    Upstream,
}

impl MockFailure {
    fn into_error(self) -> JikanError {
        match self {
            Self::RateLimited => JikanError::RateLimited { attempts: 1 },
            Self::NotFound => JikanError::NotFound,
            Self::Upstream => JikanError::Status { status: 500 },
        }
    }
}

/// Metadata source backed by fixed data.
///
/// `search` matches titles case-insensitively; `top_by_genre` pages through
/// the catalogue 25 at a time.
#[derive(Default)]
pub struct MockSource {
    catalogue: Vec<MediaSummary>,
    recommendations: Vec<Recommendation>,
    failure: Mutex<Option<MockFailure>>,
    calls: Mutex<Vec<String>>,
}

impl MockSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_catalogue(mut self, items: Vec<MediaSummary>) -> Self {
        self.catalogue = items;
        self
    }

    pub fn with_recommendations(mut self, items: Vec<Recommendation>) -> Self {
        self.recommendations = items;
        self
    }

    /// Make the next call fail.
    pub fn fail_next(&self, failure: MockFailure) {
        if let Ok(mut slot) = self.failure.lock() {
            *slot = Some(failure);
        }
    }

    /// Calls received so far, e.g. `search anime naruto 10`
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    fn record(&self, call: String) -> Result<(), JikanError> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(call);
        }
        match self.failure.lock().ok().and_then(|mut f| f.take()) {
            Some(failure) => Err(failure.into_error()),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl MetadataSource for MockSource {
    async fn search(
        &self,
        kind: MediaKind,
        query: &str,
        limit: u32,
    ) -> Result<Vec<MediaSummary>, JikanError> {
        self.record(format!("search {} {} {}", kind, query, limit))?;
        let needle = query.to_lowercase();
        Ok(self
            .catalogue
            .iter()
            .filter(|m| m.kind == kind && m.title.to_lowercase().contains(&needle))
            .take(super::clamp_limit(limit) as usize)
            .cloned()
            .collect())
    }

    async fn top_by_genre(
        &self,
        genre_id: u32,
        page: u32,
    ) -> Result<MediaPage, JikanError> {
        self.record(format!("genre {} {}", genre_id, page))?;
        let page_size = super::MAX_PAGE_SIZE as usize;
        let skip = page.saturating_sub(1) as usize * page_size;
        let anime: Vec<&MediaSummary> = self
            .catalogue
            .iter()
            .filter(|m| m.kind == MediaKind::Anime)
            .collect();
        Ok(MediaPage {
            items: anime.iter().skip(skip).take(page_size).map(|m| (*m).clone()).collect(),
            has_next_page: skip + page_size < anime.len(),
        })
    }

    async fn recommendations(
        &self,
        kind: MediaKind,
        mal_id: MalId,
    ) -> Result<Vec<Recommendation>, JikanError> {
        self.record(format!("recommendations {} {}", kind, mal_id.get()))?;
        Ok(self.recommendations.clone())
    }
}
