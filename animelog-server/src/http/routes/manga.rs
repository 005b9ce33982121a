//! Per-user manga CRUD
//!
//! Mirrors the anime routes; request parsing and the owner check are shared.

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    routing::{delete, get, post},
    Json, Router,
};

use animelog_core::models::{MangaDraft, MangaProgressDraft};

use super::anime::{ensure_owner, BulkDeleteRequest};
use crate::db::repos::{DbError, MangaRecord, MangaRepo};
use crate::http::error::ApiError;
use crate::http::extractors::{ApiJson, AuthUser, ValidUuid};
use crate::http::response::Envelope;
use crate::http::server::AppState;

/// POST /api/manga/create
async fn create_manga(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<MangaDraft>,
) -> Result<(StatusCode, Json<Envelope<MangaRecord>>), ApiError> {
    let manga = req.validate()?;
    let record = MangaRepo::new(&state.pool)
        .create_for_user(user.id, &manga)
        .await
        .map_err(|e| match e {
            DbError::Conflict { .. } => {
                ApiError::conflict("This manga is already in your inventory.")
            }
            other => other.into(),
        })?;

    tracing::info!(user_id = %user.id, mal_id = record.mal_id, "manga added");
    Ok((
        StatusCode::CREATED,
        Json(Envelope::data(record).with_message("Manga added to inventory successfully!")),
    ))
}

/// GET /api/manga
async fn list_manga(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
) -> Result<Json<Envelope<Vec<MangaRecord>>>, ApiError> {
    let rows = MangaRepo::new(&state.pool).list_for_user(user.id).await?;
    Ok(Json(Envelope::list(rows)))
}

/// GET /api/manga/{id}
async fn get_manga(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    ValidUuid(id): ValidUuid,
) -> Result<Json<Envelope<MangaRecord>>, ApiError> {
    let record = MangaRepo::new(&state.pool).get(id).await?;
    ensure_owner(&record, user, "manga")?;
    Ok(Json(Envelope::data(record)))
}

/// PUT /api/manga/{id}
async fn update_manga(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    ValidUuid(id): ValidUuid,
    ApiJson(req): ApiJson<MangaProgressDraft>,
) -> Result<Json<Envelope<MangaRecord>>, ApiError> {
    let update = req.validate()?;

    let repo = MangaRepo::new(&state.pool);
    let current = repo.get(id).await?;
    ensure_owner(&current, user, "manga")?;
    let record = repo.update_progress(id, user.id, &update).await?;

    Ok(Json(
        Envelope::data(record).with_message("Manga updated successfully"),
    ))
}

/// DELETE /api/manga/{id}
async fn delete_manga(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    ValidUuid(id): ValidUuid,
) -> Result<Json<Envelope<()>>, ApiError> {
    let repo = MangaRepo::new(&state.pool);
    let current = repo.get(id).await?;
    ensure_owner(&current, user, "manga")?;
    repo.delete(id, user.id).await?;

    Ok(Json(Envelope::message("Manga deleted successfully")))
}

/// DELETE /api/manga/bulk-delete
async fn bulk_delete_manga(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<BulkDeleteRequest>,
) -> Result<Json<Envelope<()>>, ApiError> {
    let ids = req
        .parse()?
        .ok_or_else(|| ApiError::bad_request("No manga IDs provided for deletion."))?;

    let deleted = MangaRepo::new(&state.pool)
        .delete_many_for_user(user.id, &ids)
        .await?;
    if deleted == 0 {
        return Err(ApiError::not_found(
            "No matching manga entries found for deletion.",
        ));
    }

    Ok(Json(Envelope::deleted(
        deleted,
        format!("{} manga entries successfully deleted.", deleted),
    )))
}

/// Manga routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/manga", get(list_manga))
        .route("/api/manga/create", post(create_manga))
        .route("/api/manga/bulk-delete", delete(bulk_delete_manga))
        .route(
            "/api/manga/{id}",
            get(get_manga).put(update_manga).delete(delete_manga),
        )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::testing::{app, bearer, get_request, json_request, send};
    use uuid::Uuid;

    #[tokio::test]
    async fn list_requires_auth() {
        let (status, body) = send(app(), get_request("/api/manga", None)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "unauthorized");
    }

    #[tokio::test]
    async fn expired_token_is_401() {
        let expired = crate::auth::TokenIssuer::new(
            crate::http::testing::TEST_SECRET,
            chrono::Duration::hours(-1),
        )
        .issue(Uuid::new_v4())
        .unwrap();
        let auth = format!("Bearer {}", expired);
        let (status, body) = send(app(), get_request("/api/manga", Some(&auth))).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["message"], "Not authorized, token expired");
    }

    #[tokio::test]
    async fn create_requires_title_and_mal_id() {
        let auth = bearer(Uuid::new_v4());
        let req = json_request("POST", "/api/manga/create", Some(&auth), r#"{"mangaId":2}"#);
        let (status, body) = send(app(), req).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Missing required manga data (title, mal_id).");
    }

    #[tokio::test]
    async fn update_rejects_negative_chapters() {
        let auth = bearer(Uuid::new_v4());
        let uri = format!("/api/manga/{}", Uuid::new_v4());
        let req = json_request("PUT", &uri, Some(&auth), r#"{"chaptersRead":-1}"#);
        let (status, _) = send(app(), req).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn update_rejects_unknown_status() {
        let auth = bearer(Uuid::new_v4());
        let uri = format!("/api/manga/{}", Uuid::new_v4());
        let req = json_request("PUT", &uri, Some(&auth), r#"{"userStatus":"Watching"}"#);
        let (status, body) = send(app(), req).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "validation_error");
    }

    #[tokio::test]
    async fn bulk_delete_rejects_bad_ids() {
        let auth = bearer(Uuid::new_v4());
        let req = json_request(
            "DELETE",
            "/api/manga/bulk-delete",
            Some(&auth),
            r#"{"ids":["not-a-uuid"]}"#,
        );
        let (status, _) = send(app(), req).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
