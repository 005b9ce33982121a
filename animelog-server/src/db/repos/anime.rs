//! Anime repository
//!
//! One row per (user, mal_id). Inserts rely on `anime_user_mal_key` to
//! reject duplicates, so two racing adds of the same title yield exactly
//! one row and one `Conflict`.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use animelog_core::models::{NewAnime, Progress, WatchStatus};

use super::{DbError, Owned};

/// Tracked anime as stored and as returned to clients
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnimeRecord {
    pub id: Uuid,
    #[serde(rename = "user")]
    pub user_id: Uuid,
    #[serde(rename = "mal_id")]
    pub mal_id: i64,
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
    #[sqlx(try_from = "String")]
    pub user_status: WatchStatus,
    pub episodes_watched: i32,
    pub user_score: Option<f64>,
    pub user_notes: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Owned for AnimeRecord {
    fn owner(&self) -> Uuid {
        self.user_id
    }
}

/// Anime repository
pub struct AnimeRepo<'a> {
    pool: &'a PgPool,
}

impl<'a> AnimeRepo<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Insert a new entry for `user_id`.
    ///
    /// Returns `DbError::Conflict` when the user already tracks this `mal_id`.
    pub async fn create_for_user(
        &self,
        user_id: Uuid,
        anime: &NewAnime,
    ) -> Result<AnimeRecord, DbError> {
        sqlx::query_as::<_, AnimeRecord>(
            r#"
            INSERT INTO anime (
                user_id, mal_id, title, total_episodes, cover_image, synopsis,
                api_status, api_score, trailer_url, source, genres,
                aired_from, aired_to, user_status, episodes_watched,
                user_score, user_notes
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17)
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(anime.mal_id.get())
        .bind(&anime.title)
        .bind(anime.total_episodes)
        .bind(&anime.cover_image)
        .bind(&anime.synopsis)
        .bind(&anime.api_status)
        .bind(anime.api_score)
        .bind(&anime.trailer_url)
        .bind(&anime.source)
        .bind(&anime.genres)
        .bind(anime.aired_from)
        .bind(anime.aired_to)
        .bind(anime.user_status.to_string())
        .bind(anime.episodes_watched)
        .bind(anime.user_score.map(|s| s.get()))
        .bind(&anime.user_notes)
        .fetch_one(self.pool)
        .await
        .map_err(|e| DbError::classify("anime", e))
    }

    /// All entries of a user, newest first.
    pub async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<AnimeRecord>, DbError> {
        let rows = sqlx::query_as::<_, AnimeRecord>(
            r#"
            SELECT * FROM anime
            WHERE user_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;
        Ok(rows)
    }

    /// Fetch by id regardless of owner; ownership is the caller's check.
    pub async fn get(&self, id: Uuid) -> Result<AnimeRecord, DbError> {
        sqlx::query_as::<_, AnimeRecord>("SELECT * FROM anime WHERE id = $1")
            .bind(id)
            .fetch_optional(self.pool)
            .await?
            .ok_or_else(|| DbError::not_found("anime", id))
    }

    /// Apply a progress update to an entry owned by `user_id`.
    ///
    /// Absent fields keep their value; `score: Some(None)` clears the score.
    pub async fn update_progress(
        &self,
        id: Uuid,
        user_id: Uuid,
        update: &Progress<WatchStatus>,
    ) -> Result<AnimeRecord, DbError> {
        let (touch_score, score) = match update.score {
            Some(s) => (true, s.map(|s| s.get())),
            None => (false, None),
        };

        sqlx::query_as::<_, AnimeRecord>(
            r#"
            UPDATE anime SET
                episodes_watched = COALESCE($3, episodes_watched),
                user_status = COALESCE($4, user_status),
                user_score = CASE WHEN $5 THEN $6 ELSE user_score END,
                user_notes = COALESCE($7, user_notes),
                updated_at = NOW()
            WHERE id = $1 AND user_id = $2
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(user_id)
        .bind(update.count)
        .bind(update.status.map(|s| s.to_string()))
        .bind(touch_score)
        .bind(score)
        .bind(&update.notes)
        .fetch_optional(self.pool)
        .await?
        .ok_or_else(|| DbError::not_found("anime", id))
    }

    /// Delete an entry owned by `user_id`.
    pub async fn delete(&self, id: Uuid, user_id: Uuid) -> Result<(), DbError> {
        let result = sqlx::query("DELETE FROM anime WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("anime", id));
        }
        Ok(())
    }

    /// Delete every listed entry owned by `user_id`; ids of other users are skipped.
    pub async fn delete_many_for_user(&self, user_id: Uuid, ids: &[Uuid]) -> Result<u64, DbError> {
        let result = sqlx::query("DELETE FROM anime WHERE user_id = $1 AND id = ANY($2)")
            .bind(user_id)
            .bind(ids)
            .execute(self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}
