//! Wire types for Jikan v4 responses
//!
//! Only the fields the tracker keeps are modeled, and every one of them is
//! optional: Jikan omits or nulls fields freely.

use serde::Deserialize;

use animelog_core::models::MediaKind;

use super::{MediaSummary, Recommendation};

#[derive(Debug, Deserialize)]
pub struct ListResponse<T> {
    #[serde(default = "Vec::new")]
    pub data: Vec<T>,
    #[serde(default)]
    pub pagination: Option<Pagination>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Pagination {
    #[serde(default)]
    pub has_next_page: bool,
}

impl<T> ListResponse<T> {
    /// Jikan's `has_next_page`; without pagination a full page implies more.
    pub fn has_next_page(&self, page_size: usize) -> bool {
        match &self.pagination {
            Some(p) => p.has_next_page,
            None => self.data.len() >= page_size,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct JikanMedia {
    pub mal_id: i64,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub title_english: Option<String>,
    #[serde(default)]
    pub images: Option<Images>,
    #[serde(default)]
    pub synopsis: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub score: Option<f64>,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub genres: Vec<Named>,
    // anime
    #[serde(default)]
    pub episodes: Option<i32>,
    #[serde(default)]
    pub trailer: Option<Trailer>,
    #[serde(default)]
    pub aired: Option<DateRange>,
    // manga
    #[serde(default)]
    pub chapters: Option<i32>,
    #[serde(default)]
    pub volumes: Option<i32>,
    #[serde(default)]
    pub published: Option<DateRange>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Images {
    #[serde(default)]
    pub jpg: Option<ImageSet>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ImageSet {
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub large_image_url: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Trailer {
    #[serde(default)]
    pub url: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct DateRange {
    #[serde(default)]
    pub from: Option<String>,
    #[serde(default)]
    pub to: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Named {
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct JikanRecommendation {
    pub entry: RecommendationEntry,
    #[serde(default)]
    pub votes: u32,
}

#[derive(Debug, Deserialize)]
pub struct RecommendationEntry {
    pub mal_id: i64,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub images: Option<Images>,
    #[serde(default)]
    pub title: Option<String>,
}

fn cover(images: Option<Images>) -> Option<String> {
    images
        .and_then(|i| i.jpg)
        .and_then(|jpg| jpg.image_url.or(jpg.large_image_url))
}

impl JikanMedia {
    pub fn into_summary(self, kind: MediaKind) -> MediaSummary {
        let title = self
            .title
            .or_else(|| self.title_english.clone())
            .unwrap_or_default();

        let mut summary = MediaSummary::new(kind, self.mal_id, title);
        summary.cover_image = cover(self.images);
        summary.synopsis = self.synopsis;
        summary.api_status = self.status;
        summary.api_score = self.score;
        summary.source = self.source;
        summary.genres = self
            .genres
            .into_iter()
            .map(|g| g.name)
            .filter(|n| !n.is_empty())
            .collect();

        match kind {
            MediaKind::Anime => {
                let aired = self.aired.unwrap_or_default();
                summary.total_episodes = self.episodes;
                summary.trailer_url = self.trailer.and_then(|t| t.url);
                summary.aired_from = aired.from;
                summary.aired_to = aired.to;
            }
            MediaKind::Manga => {
                let published = self.published.unwrap_or_default();
                summary.title_english = self.title_english;
                summary.total_chapters = self.chapters;
                summary.total_volumes = self.volumes;
                summary.published_from = published.from;
                summary.published_to = published.to;
            }
        }
        summary
    }
}

impl From<JikanRecommendation> for Recommendation {
    fn from(rec: JikanRecommendation) -> Self {
        Self {
            mal_id: rec.entry.mal_id,
            title: rec.entry.title.unwrap_or_default(),
            cover_image: cover(rec.entry.images),
            url: rec.entry.url,
            votes: rec.votes,
        }
    }
}
