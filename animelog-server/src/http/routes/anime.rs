//! Per-user anime CRUD
//!
//! Every route requires a token. Rows owned by another user answer 403.

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    routing::{delete, get, post},
    Json, Router,
};
use serde::Deserialize;
use uuid::Uuid;

use animelog_core::models::{AnimeDraft, AnimeProgressDraft, NewAnime};
use animelog_core::ValidationError;

use crate::db::repos::{AnimeRecord, AnimeRepo, DbError, Owned};
use crate::http::error::ApiError;
use crate::http::extractors::{ApiJson, AuthUser, ValidUuid};
use crate::http::response::Envelope;
use crate::http::server::AppState;

/// Bulk delete request: `{"ids": [...]}`
#[derive(Debug, Default, Deserialize)]
pub struct BulkDeleteRequest {
    #[serde(default)]
    pub ids: Vec<String>,
}

impl BulkDeleteRequest {
    /// Parse ids; `None` when the list is empty.
    pub fn parse(&self) -> Result<Option<Vec<Uuid>>, ValidationError> {
        if self.ids.is_empty() {
            return Ok(None);
        }
        self.ids
            .iter()
            .map(|id| {
                Uuid::parse_str(id.trim()).map_err(|_| ValidationError::InvalidFormat {
                    field: "ids",
                    reason: "invalid UUID format",
                })
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Some)
    }
}

/// Owner check shared by the per-user resources.
pub(super) fn ensure_owner<R: Owned>(record: &R, user: AuthUser, label: &str) -> Result<(), ApiError> {
    if record.is_owned_by(user.id) {
        return Ok(());
    }
    tracing::warn!(user_id = %user.id, owner = %record.owner(), "cross-user access refused");
    Err(ApiError::forbidden(format!(
        "Not authorized to access this {}",
        label
    )))
}

/// Insert with the inventory duplicate message on conflict.
pub(super) async fn insert_for_user(
    state: &AppState,
    user: AuthUser,
    anime: &NewAnime,
) -> Result<AnimeRecord, ApiError> {
    AnimeRepo::new(&state.pool)
        .create_for_user(user.id, anime)
        .await
        .map_err(|e| match e {
            DbError::Conflict { .. } => {
                ApiError::conflict("This anime is already in your inventory.")
            }
            other => other.into(),
        })
}

/// POST /api/anime/create
async fn create_anime(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<AnimeDraft>,
) -> Result<(StatusCode, Json<Envelope<AnimeRecord>>), ApiError> {
    let anime = req.validate()?;
    let record = insert_for_user(&state, user, &anime).await?;

    tracing::info!(user_id = %user.id, mal_id = record.mal_id, "anime added");
    Ok((
        StatusCode::CREATED,
        Json(Envelope::data(record).with_message("Anime successfully added!")),
    ))
}

/// GET /api/anime
async fn list_anime(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
) -> Result<Json<Envelope<Vec<AnimeRecord>>>, ApiError> {
    let rows = AnimeRepo::new(&state.pool).list_for_user(user.id).await?;
    Ok(Json(Envelope::list(rows)))
}

/// GET /api/anime/{id}
async fn get_anime(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    ValidUuid(id): ValidUuid,
) -> Result<Json<Envelope<AnimeRecord>>, ApiError> {
    let record = AnimeRepo::new(&state.pool).get(id).await?;
    ensure_owner(&record, user, "anime")?;
    Ok(Json(Envelope::data(record)))
}

/// PUT /api/anime/{id} - progress fields only
async fn update_anime(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    ValidUuid(id): ValidUuid,
    ApiJson(req): ApiJson<AnimeProgressDraft>,
) -> Result<Json<Envelope<AnimeRecord>>, ApiError> {
    let update = req.validate()?;

    let repo = AnimeRepo::new(&state.pool);
    let current = repo.get(id).await?;
    ensure_owner(&current, user, "anime")?;
    let record = repo.update_progress(id, user.id, &update).await?;

    Ok(Json(
        Envelope::data(record).with_message("Anime entry successfully updated"),
    ))
}

/// DELETE /api/anime/{id}
async fn delete_anime(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    ValidUuid(id): ValidUuid,
) -> Result<Json<Envelope<()>>, ApiError> {
    let repo = AnimeRepo::new(&state.pool);
    let current = repo.get(id).await?;
    ensure_owner(&current, user, "anime")?;
    repo.delete(id, user.id).await?;

    Ok(Json(Envelope::message("Anime entry successfully deleted")))
}

/// DELETE /api/anime/bulk-delete
async fn bulk_delete_anime(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<BulkDeleteRequest>,
) -> Result<Json<Envelope<()>>, ApiError> {
    let ids = req
        .parse()?
        .ok_or_else(|| ApiError::bad_request("No anime IDs provided for deletion."))?;

    let deleted = AnimeRepo::new(&state.pool)
        .delete_many_for_user(user.id, &ids)
        .await?;
    if deleted == 0 {
        return Err(ApiError::not_found(
            "No matching anime entries found for deletion.",
        ));
    }

    Ok(Json(Envelope::deleted(
        deleted,
        format!("{} anime entries successfully deleted.", deleted),
    )))
}

/// Anime routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/anime", get(list_anime))
        .route("/api/anime/create", post(create_anime))
        .route("/api/anime/bulk-delete", delete(bulk_delete_anime))
        .route(
            "/api/anime/{id}",
            get(get_anime).put(update_anime).delete(delete_anime),
        )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::testing::{app, bearer, get_request, json_request, send};

    #[test]
    fn bulk_request_parsing() {
        let empty = BulkDeleteRequest::default();
        assert_eq!(empty.parse().unwrap(), None);

        let id = Uuid::new_v4();
        let ok = BulkDeleteRequest {
            ids: vec![id.to_string()],
        };
        assert_eq!(ok.parse().unwrap(), Some(vec![id]));

        let bad = BulkDeleteRequest {
            ids: vec![id.to_string(), "nope".into()],
        };
        assert!(bad.parse().is_err());
    }

    #[tokio::test]
    async fn all_routes_require_auth() {
        let id = Uuid::new_v4();
        let cases = [
            get_request("/api/anime", None),
            get_request(&format!("/api/anime/{}", id), None),
            json_request("POST", "/api/anime/create", None, "{}"),
            json_request("PUT", &format!("/api/anime/{}", id), None, "{}"),
            json_request("DELETE", &format!("/api/anime/{}", id), None, ""),
            json_request("DELETE", "/api/anime/bulk-delete", None, r#"{"ids":[]}"#),
        ];
        for req in cases {
            let uri = req.uri().clone();
            let (status, _) = send(app(), req).await;
            assert_eq!(status, StatusCode::UNAUTHORIZED, "{}", uri);
        }
    }

    #[tokio::test]
    async fn create_requires_title_and_mal_id() {
        let auth = bearer(Uuid::new_v4());
        let req = json_request("POST", "/api/anime/create", Some(&auth), r#"{"title":"Naruto"}"#);
        let (status, body) = send(app(), req).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Missing required anime data (title, mal_id).");
    }

    #[tokio::test]
    async fn create_rejects_out_of_range_score() {
        let auth = bearer(Uuid::new_v4());
        let req = json_request(
            "POST",
            "/api/anime/create",
            Some(&auth),
            r#"{"mal_id":20,"title":"Naruto","userScore":11}"#,
        );
        let (status, body) = send(app(), req).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "validation_error");
    }

    #[tokio::test]
    async fn form_string_numbers_reach_validation() {
        let auth = bearer(Uuid::new_v4());
        let req = json_request(
            "POST",
            "/api/anime/create",
            Some(&auth),
            r#"{"mal_id":"20","title":"Naruto","episodesWatched":"3","userScore":"11"}"#,
        );
        let (status, body) = send(app(), req).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "validation_error");
        assert_eq!(body["message"], "userScore must be between 0 and 10");
    }

    #[tokio::test]
    async fn empty_update_is_rejected() {
        let auth = bearer(Uuid::new_v4());
        let uri = format!("/api/anime/{}", Uuid::new_v4());
        let req = json_request("PUT", &uri, Some(&auth), r#"{"title":"ignored"}"#);
        let (status, body) = send(app(), req).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "No valid fields provided for update.");
    }

    #[tokio::test]
    async fn bulk_delete_needs_ids() {
        let auth = bearer(Uuid::new_v4());
        let req = json_request("DELETE", "/api/anime/bulk-delete", Some(&auth), r#"{"ids":[]}"#);
        let (status, body) = send(app(), req).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "No anime IDs provided for deletion.");
    }

    #[tokio::test]
    async fn malformed_id_is_400() {
        let auth = bearer(Uuid::new_v4());
        let (status, _) = send(app(), get_request("/api/anime/12345", Some(&auth))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
