//! Manga repository
//!
//! Same shape as the anime repository, keyed by `manga_user_mal_key`.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use animelog_core::models::{NewManga, Progress, ReadStatus};

use super::{DbError, Owned};

/// Tracked manga as stored and as returned to clients
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MangaRecord {
    pub id: Uuid,
    #[serde(rename = "user")]
    pub user_id: Uuid,
    #[serde(rename = "mal_id")]
    pub mal_id: i64,
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
    #[sqlx(try_from = "String")]
    pub user_status: ReadStatus,
    pub chapters_read: i32,
    pub user_score: Option<f64>,
    pub user_notes: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Owned for MangaRecord {
    fn owner(&self) -> Uuid {
        self.user_id
    }
}

/// Manga repository
pub struct MangaRepo<'a> {
    pool: &'a PgPool,
}

impl<'a> MangaRepo<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    pub async fn create_for_user(
        &self,
        user_id: Uuid,
        manga: &NewManga,
    ) -> Result<MangaRecord, DbError> {
        sqlx::query_as::<_, MangaRecord>(
            r#"
            INSERT INTO manga (
                user_id, mal_id, title, title_english, total_chapters,
                total_volumes, cover_image, synopsis, api_status, api_score,
                source, genres, published_from, published_to, user_status,
                chapters_read, user_score, user_notes
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18)
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(manga.mal_id.get())
        .bind(&manga.title)
        .bind(&manga.title_english)
        .bind(manga.total_chapters)
        .bind(manga.total_volumes)
        .bind(&manga.cover_image)
        .bind(&manga.synopsis)
        .bind(&manga.api_status)
        .bind(manga.api_score)
        .bind(&manga.source)
        .bind(&manga.genres)
        .bind(manga.published_from)
        .bind(manga.published_to)
        .bind(manga.user_status.to_string())
        .bind(manga.chapters_read)
        .bind(manga.user_score.map(|s| s.get()))
        .bind(&manga.user_notes)
        .fetch_one(self.pool)
        .await
        .map_err(|e| DbError::classify("manga", e))
    }

    pub async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<MangaRecord>, DbError> {
        let rows = sqlx::query_as::<_, MangaRecord>(
            r#"
            SELECT * FROM manga
            WHERE user_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn get(&self, id: Uuid) -> Result<MangaRecord, DbError> {
        sqlx::query_as::<_, MangaRecord>("SELECT * FROM manga WHERE id = $1")
            .bind(id)
            .fetch_optional(self.pool)
            .await?
            .ok_or_else(|| DbError::not_found("manga", id))
    }

    pub async fn update_progress(
        &self,
        id: Uuid,
        user_id: Uuid,
        update: &Progress<ReadStatus>,
    ) -> Result<MangaRecord, DbError> {
        let (touch_score, score) = match update.score {
            Some(s) => (true, s.map(|s| s.get())),
            None => (false, None),
        };

        sqlx::query_as::<_, MangaRecord>(
            r#"
            UPDATE manga SET
                chapters_read = COALESCE($3, chapters_read),
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
        .ok_or_else(|| DbError::not_found("manga", id))
    }

    pub async fn delete(&self, id: Uuid, user_id: Uuid) -> Result<(), DbError> {
        let result = sqlx::query("DELETE FROM manga WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("manga", id));
        }
        Ok(())
    }

    pub async fn delete_many_for_user(&self, user_id: Uuid, ids: &[Uuid]) -> Result<u64, DbError> {
        let result = sqlx::query("DELETE FROM manga WHERE user_id = $1 AND id = ANY($2)")
            .bind(user_id)
            .bind(ids)
            .execute(self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}
