//! Tracked media inputs: anime and manga drafts, progress updates

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::de::{double_option_f64, opt_datetime, opt_f64, opt_i32, opt_i64};
use super::status::{ReadStatus, TrackingStatus, WatchStatus};
use crate::validation::ValidationError;

const SCORE_MIN: f64 = 0.0;
const SCORE_MAX: f64 = 10.0;

/// Which catalogue a request targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Anime,
    Manga,
}

impl MediaKind {
    /// Path segment used by the metadata API and our own routes
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Anime => "anime",
            Self::Manga => "manga",
        }
    }

    /// Capitalized noun for user-facing messages
    pub fn label(&self) -> &'static str {
        match self {
            Self::Anime => "Anime",
            Self::Manga => "Manga",
        }
    }
}

impl FromStr for MediaKind {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "anime" => Ok(Self::Anime),
            "manga" => Ok(Self::Manga),
            other => Err(ValidationError::InvalidVariant {
                field: "media kind",
                value: other.to_owned(),
            }),
        }
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// MyAnimeList id (strictly positive)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct MalId(i64);

impl MalId {
    pub fn new(id: i64) -> Result<Self, ValidationError> {
        if id <= 0 {
            return Err(ValidationError::InvalidFormat {
                field: "mal_id",
                reason: "must be a positive integer",
            });
        }
        Ok(Self(id))
    }

    pub fn get(&self) -> i64 {
        self.0
    }
}

/// User score in 0..=10
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Score(f64);

impl Score {
    pub fn new(value: f64) -> Result<Self, ValidationError> {
        if !value.is_finite() || !(SCORE_MIN..=SCORE_MAX).contains(&value) {
            return Err(ValidationError::OutOfRange {
                field: "userScore",
                min: SCORE_MIN,
                max: SCORE_MAX,
            });
        }
        Ok(Self(value))
    }

    pub fn get(&self) -> f64 {
        self.0
    }
}

fn non_blank(s: Option<String>) -> Option<String> {
    s.map(|v| v.trim().to_owned()).filter(|v| !v.is_empty())
}

fn positive(n: Option<i32>) -> Option<i32> {
    n.filter(|v| *v > 0)
}

fn counter(field: &'static str, n: Option<i32>) -> Result<Option<i32>, ValidationError> {
    match n {
        Some(v) if v < 0 => Err(ValidationError::OutOfRange {
            field,
            min: 0.0,
            max: i32::MAX as f64,
        }),
        other => Ok(other),
    }
}

fn status<S: TrackingStatus>(raw: Option<&str>) -> Result<Option<S>, ValidationError> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => s.parse().map(Some),
    }
}

fn required(
    label: &str,
    mal_id: Option<i64>,
    title: Option<&str>,
) -> Result<(MalId, String), ValidationError> {
    let title = title.map(str::trim).filter(|t| !t.is_empty());
    match (mal_id, title) {
        (Some(id), Some(title)) => Ok((MalId::new(id)?, title.to_owned())),
        _ => Err(ValidationError::MissingFields {
            message: format!("Missing required {} data (title, mal_id).", label),
        }),
    }
}

/// Anime create payload as sent by clients (search hits or forms)
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnimeDraft {
    #[serde(rename = "mal_id", alias = "malId", default, deserialize_with = "opt_i64")]
    pub mal_id: Option<i64>,
    pub title: Option<String>,
    #[serde(default, deserialize_with = "opt_i32")]
    pub total_episodes: Option<i32>,
    pub cover_image: Option<String>,
    pub synopsis: Option<String>,
    pub api_status: Option<String>,
    #[serde(default, deserialize_with = "opt_f64")]
    pub api_score: Option<f64>,
    pub trailer_url: Option<String>,
    pub source: Option<String>,
    pub genres: Option<Vec<String>>,
    #[serde(default, deserialize_with = "opt_datetime")]
    pub aired_from: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "opt_datetime")]
    pub aired_to: Option<DateTime<Utc>>,
    pub user_status: Option<String>,
    #[serde(default, deserialize_with = "opt_i32")]
    pub episodes_watched: Option<i32>,
    #[serde(default, deserialize_with = "opt_f64")]
    pub user_score: Option<f64>,
    pub user_notes: Option<String>,
}

/// Validated anime entry ready for insertion
#[derive(Debug, Clone, PartialEq)]
pub struct NewAnime {
    pub mal_id: MalId,
    pub title: String,
    pub total_episodes: Option<i32>,
    pub cover_image: Option<String>,
    pub synopsis: Option<String>,
    pub api_status: Option<String>,
    pub api_score: Option<f64>,
    pub trailer_url: Option<String>,
    pub source: Option<String>,
    pub genres: Vec<String>,
    pub aired_from: Option<DateTime<Utc>>,
    pub aired_to: Option<DateTime<Utc>>,
    pub user_status: WatchStatus,
    pub episodes_watched: i32,
    pub user_score: Option<Score>,
    pub user_notes: String,
}

impl AnimeDraft {
    /// Drop any user-entered fields so defaults apply (adding from search).
    pub fn without_user_fields(self) -> Self {
        Self {
            user_status: None,
            episodes_watched: None,
            user_score: None,
            user_notes: None,
            ..self
        }
    }

    pub fn validate(self) -> Result<NewAnime, ValidationError> {
        let (mal_id, title) = required("anime", self.mal_id, self.title.as_deref())?;
        Ok(NewAnime {
            mal_id,
            title,
            total_episodes: positive(self.total_episodes),
            cover_image: non_blank(self.cover_image),
            synopsis: non_blank(self.synopsis),
            api_status: non_blank(self.api_status),
            api_score: self.api_score,
            trailer_url: non_blank(self.trailer_url),
            source: non_blank(self.source),
            genres: self.genres.unwrap_or_default(),
            aired_from: self.aired_from,
            aired_to: self.aired_to,
            user_status: status(self.user_status.as_deref())?.unwrap_or_default(),
            episodes_watched: counter("episodesWatched", self.episodes_watched)?.unwrap_or(0),
            user_score: self.user_score.map(Score::new).transpose()?,
            user_notes: self.user_notes.unwrap_or_default(),
        })
    }
}

/// Manga create payload as sent by clients
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MangaDraft {
    #[serde(
        rename = "mal_id",
        alias = "malId",
        alias = "mangaId",
        default,
        deserialize_with = "opt_i64"
    )]
    pub mal_id: Option<i64>,
    pub title: Option<String>,
    #[serde(rename = "title_english", alias = "titleEnglish")]
    pub title_english: Option<String>,
    #[serde(default, deserialize_with = "opt_i32")]
    pub total_chapters: Option<i32>,
    #[serde(default, deserialize_with = "opt_i32")]
    pub total_volumes: Option<i32>,
    #[serde(alias = "image")]
    pub cover_image: Option<String>,
    pub synopsis: Option<String>,
    pub api_status: Option<String>,
    #[serde(default, deserialize_with = "opt_f64")]
    pub api_score: Option<f64>,
    pub source: Option<String>,
    pub genres: Option<Vec<String>>,
    #[serde(default, deserialize_with = "opt_datetime")]
    pub published_from: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "opt_datetime")]
    pub published_to: Option<DateTime<Utc>>,
    pub user_status: Option<String>,
    #[serde(default, deserialize_with = "opt_i32")]
    pub chapters_read: Option<i32>,
    #[serde(default, deserialize_with = "opt_f64")]
    pub user_score: Option<f64>,
    pub user_notes: Option<String>,
}

/// Validated manga entry ready for insertion
#[derive(Debug, Clone, PartialEq)]
pub struct NewManga {
    pub mal_id: MalId,
    pub title: String,
    pub title_english: Option<String>,
    pub total_chapters: Option<i32>,
    pub total_volumes: Option<i32>,
    pub cover_image: Option<String>,
    pub synopsis: Option<String>,
    pub api_status: Option<String>,
    pub api_score: Option<f64>,
    pub source: Option<String>,
    pub genres: Vec<String>,
    pub published_from: Option<DateTime<Utc>>,
    pub published_to: Option<DateTime<Utc>>,
    pub user_status: ReadStatus,
    pub chapters_read: i32,
    pub user_score: Option<Score>,
    pub user_notes: String,
}

impl MangaDraft {
    pub fn validate(self) -> Result<NewManga, ValidationError> {
        let (mal_id, title) = required("manga", self.mal_id, self.title.as_deref())?;
        Ok(NewManga {
            mal_id,
            title,
            title_english: non_blank(self.title_english),
            total_chapters: positive(self.total_chapters),
            total_volumes: positive(self.total_volumes),
            cover_image: non_blank(self.cover_image),
            synopsis: non_blank(self.synopsis),
            api_status: non_blank(self.api_status),
            api_score: self.api_score,
            source: non_blank(self.source),
            genres: self.genres.unwrap_or_default(),
            published_from: self.published_from,
            published_to: self.published_to,
            user_status: status(self.user_status.as_deref())?.unwrap_or_default(),
            chapters_read: counter("chaptersRead", self.chapters_read)?.unwrap_or(0),
            user_score: self.user_score.map(Score::new).transpose()?,
            user_notes: self.user_notes.unwrap_or_default(),
        })
    }
}

/// Minimal "add to my list" payload: `{animeId|mangaId|mal_id, title, image}`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListEntryDraft {
    #[serde(
        rename = "mal_id",
        alias = "malId",
        alias = "animeId",
        alias = "mangaId",
        default,
        deserialize_with = "opt_i64"
    )]
    pub mal_id: Option<i64>,
    pub title: Option<String>,
    #[serde(alias = "coverImage")]
    pub image: Option<String>,
    pub status: Option<String>,
}

/// Validated list entry; expands into a full anime or manga insert
#[derive(Debug, Clone, PartialEq)]
pub struct NewListEntry {
    pub mal_id: MalId,
    pub title: String,
    pub image: Option<String>,
    pub status: Option<String>,
}

impl ListEntryDraft {
    pub fn validate(self, kind: MediaKind) -> Result<NewListEntry, ValidationError> {
        let label = match kind {
            MediaKind::Anime => "anime",
            MediaKind::Manga => "manga",
        };
        let (mal_id, title) = required(label, self.mal_id, self.title.as_deref())?;
        Ok(NewListEntry {
            mal_id,
            title,
            image: non_blank(self.image),
            status: non_blank(self.status),
        })
    }
}

impl NewListEntry {
    pub fn into_anime(self) -> Result<NewAnime, ValidationError> {
        AnimeDraft {
            mal_id: Some(self.mal_id.get()),
            title: Some(self.title),
            cover_image: self.image,
            user_status: self.status,
            ..Default::default()
        }
        .validate()
    }

    pub fn into_manga(self) -> Result<NewManga, ValidationError> {
        MangaDraft {
            mal_id: Some(self.mal_id.get()),
            title: Some(self.title),
            cover_image: self.image,
            user_status: self.status,
            ..Default::default()
        }
        .validate()
    }
}

/// Partial update of the user-owned fields of an entry.
///
/// `score: Some(None)` clears the score; `None` leaves it untouched.
#[derive(Debug, Clone, PartialEq)]
pub struct Progress<S> {
    pub count: Option<i32>,
    pub status: Option<S>,
    pub score: Option<Option<Score>>,
    pub notes: Option<String>,
}

impl<S> Progress<S> {
    pub fn is_empty(&self) -> bool {
        self.count.is_none() && self.status.is_none() && self.score.is_none() && self.notes.is_none()
    }
}

fn progress<S: TrackingStatus>(
    count_field: &'static str,
    count: Option<i32>,
    raw_status: Option<&str>,
    score: Option<Option<f64>>,
    notes: Option<String>,
) -> Result<Progress<S>, ValidationError> {
    let status = match raw_status {
        Some(s) => Some(s.parse::<S>()?),
        None => None,
    };
    let score = match score {
        Some(Some(v)) => Some(Some(Score::new(v)?)),
        Some(None) => Some(None),
        None => None,
    };
    let update = Progress {
        count: counter(count_field, count)?,
        status,
        score,
        notes,
    };
    if update.is_empty() {
        return Err(ValidationError::NothingToUpdate);
    }
    Ok(update)
}

/// `PUT /api/anime/{id}` body
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnimeProgressDraft {
    #[serde(default, deserialize_with = "opt_i32")]
    pub episodes_watched: Option<i32>,
    pub user_status: Option<String>,
    #[serde(default, deserialize_with = "double_option_f64")]
    pub user_score: Option<Option<f64>>,
    pub user_notes: Option<String>,
}

impl AnimeProgressDraft {
    pub fn validate(self) -> Result<Progress<WatchStatus>, ValidationError> {
        progress(
            "episodesWatched",
            self.episodes_watched,
            self.user_status.as_deref(),
            self.user_score,
            self.user_notes,
        )
    }
}

/// `PUT /api/manga/{id}` body
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MangaProgressDraft {
    #[serde(default, deserialize_with = "opt_i32")]
    pub chapters_read: Option<i32>,
    pub user_status: Option<String>,
    #[serde(default, deserialize_with = "double_option_f64")]
    pub user_score: Option<Option<f64>>,
    pub user_notes: Option<String>,
}

impl MangaProgressDraft {
    pub fn validate(self) -> Result<Progress<ReadStatus>, ValidationError> {
        progress(
            "chaptersRead",
            self.chapters_read,
            self.user_status.as_deref(),
            self.user_score,
            self.user_notes,
        )
    }
}
