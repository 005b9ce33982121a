//! Metadata search proxied to Jikan, plus "add from search"
//!
//! Search routes are public; adding a hit to the inventory needs a token.

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;

use animelog_core::models::{AnimeDraft, MalId, MediaKind};
use animelog_core::ValidationError;

use super::anime::insert_for_user;
use crate::db::repos::AnimeRecord;
use crate::http::error::ApiError;
use crate::http::extractors::{ApiJson, ApiPath, ApiQuery, AuthUser};
use crate::http::response::Envelope;
use crate::http::server::AppState;
use crate::jikan::{MediaSummary, Recommendation};

const DEFAULT_LIMIT: u32 = 20;
const MAX_GENRE_PAGES: u32 = 2;

#[derive(Debug, Default, Deserialize)]
pub struct SearchParams {
    pub q: Option<String>,
    pub limit: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
pub struct GenreParams {
    pub pages: Option<u32>,
}

fn media_kind(raw: &str) -> Result<MediaKind, ApiError> {
    raw.parse::<MediaKind>().map_err(ApiError::from)
}

/// POST /api/search/add - store a search hit with default progress
async fn add_from_search(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<AnimeDraft>,
) -> Result<(StatusCode, Json<Envelope<AnimeRecord>>), ApiError> {
    let anime = req.without_user_fields().validate()?;
    let record = insert_for_user(&state, user, &anime).await?;

    Ok((
        StatusCode::CREATED,
        Json(Envelope::data(record).with_message("Anime added to inventory successfully!")),
    ))
}

/// GET /api/search/{kind}?q=&limit=
async fn search(
    State(state): State<Arc<AppState>>,
    ApiPath(kind): ApiPath<String>,
    ApiQuery(params): ApiQuery<SearchParams>,
) -> Result<Json<Envelope<Vec<MediaSummary>>>, ApiError> {
    let kind = media_kind(&kind)?;
    let query = params
        .q
        .as_deref()
        .map(str::trim)
        .filter(|q| !q.is_empty())
        .ok_or(ValidationError::Empty { field: "q" })?;

    let hits = state
        .metadata
        .search(kind, query, params.limit.unwrap_or(DEFAULT_LIMIT))
        .await?;
    Ok(Json(Envelope::list(hits)))
}

/// GET /api/search/genre/{genre_id}?pages= - top anime by score, 25 per page
async fn top_by_genre(
    State(state): State<Arc<AppState>>,
    ApiPath(genre_id): ApiPath<u32>,
    ApiQuery(params): ApiQuery<GenreParams>,
) -> Result<Json<Envelope<Vec<MediaSummary>>>, ApiError> {
    let pages = params
        .pages
        .unwrap_or(MAX_GENRE_PAGES)
        .clamp(1, MAX_GENRE_PAGES);

    let mut items = Vec::new();
    for page in 1..=pages {
        let batch = state.metadata.top_by_genre(genre_id, page).await?;
        items.extend(batch.items);
        if !batch.has_next_page {
            break;
        }
    }
    Ok(Json(Envelope::list(items)))
}

/// GET /api/search/{kind}/{mal_id}/recommendations
async fn recommendations(
    State(state): State<Arc<AppState>>,
    ApiPath((kind, mal_id)): ApiPath<(String, i64)>,
) -> Result<Json<Envelope<Vec<Recommendation>>>, ApiError> {
    let kind = media_kind(&kind)?;
    let mal_id = MalId::new(mal_id)?;
    let recs = state.metadata.recommendations(kind, mal_id).await?;
    Ok(Json(Envelope::list(recs)))
}

/// Search routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/search/add", post(add_from_search))
        .route("/api/search/genre/{genre_id}", get(top_by_genre))
        .route("/api/search/{kind}", get(search))
        .route("/api/search/{kind}/{mal_id}/recommendations", get(recommendations))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::server::build_router;
    use crate::http::testing::{app, get_request, json_request, send, state_with};
    use crate::jikan::mock::MockFailure;
    use crate::jikan::MockSource;

    fn catalogue() -> Vec<MediaSummary> {
        let mut items = vec![
            MediaSummary::new(MediaKind::Anime, 20, "Naruto"),
            MediaSummary::new(MediaKind::Anime, 1735, "Naruto: Shippuuden"),
            MediaSummary::new(MediaKind::Manga, 11, "Naruto"),
        ];
        items.extend((0..30).map(|i| MediaSummary::new(MediaKind::Anime, 1000 + i, format!("Top {}", i))));
        items
    }

    #[tokio::test]
    async fn searches_by_kind() {
        let app = build_router(state_with(MockSource::new().with_catalogue(catalogue())));
        let (status, body) = send(app, get_request("/api/search/anime?q=naruto&limit=5", None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["count"], 2);
        assert_eq!(body["data"][0]["mal_id"], 20);
    }

    #[tokio::test]
    async fn search_defaults_limit_to_20() {
        let source = Arc::new(MockSource::new());
        let app = build_router(state_with(source.clone()));
        let (status, body) = send(app, get_request("/api/search/manga?q=%20berserk%20", None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["count"], 0);
        assert_eq!(source.calls(), vec!["search manga berserk 20".to_string()]);
    }

    #[tokio::test]
    async fn rejects_unknown_kind_and_blank_query() {
        let (status, _) = send(app(), get_request("/api/search/novel?q=x", None)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, body) = send(app(), get_request("/api/search/manga?q=%20", None)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "q cannot be empty");
    }

    #[tokio::test]
    async fn bad_limit_is_400() {
        let (status, body) = send(app(), get_request("/api/search/anime?q=x&limit=lots", None)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "bad_request");
    }

    #[tokio::test]
    async fn rate_limit_surfaces_as_503() {
        let source = MockSource::new();
        source.fail_next(MockFailure::RateLimited);
        let app = build_router(state_with(source));

        let (status, body) = send(app, get_request("/api/search/anime?q=x", None)).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["message"], crate::http::error::RATE_LIMITED_MESSAGE);
    }

    #[tokio::test]
    async fn upstream_failure_is_502() {
        let source = MockSource::new();
        source.fail_next(MockFailure::Upstream);
        let app = build_router(state_with(source));

        let (status, _) = send(app, get_request("/api/search/genre/1", None)).await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
    }

    #[tokio::test]
    async fn genre_fetches_two_pages_by_default() {
        let app = build_router(state_with(MockSource::new().with_catalogue(catalogue())));
        let (status, body) = send(app, get_request("/api/search/genre/1", None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["count"], 32);

        let app = build_router(state_with(MockSource::new().with_catalogue(catalogue())));
        let (_, body) = send(app, get_request("/api/search/genre/1?pages=9", None)).await;
        assert_eq!(body["count"], 32);

        let app = build_router(state_with(MockSource::new().with_catalogue(catalogue())));
        let (_, body) = send(app, get_request("/api/search/genre/1?pages=1", None)).await;
        assert_eq!(body["count"], 25);
    }

    #[tokio::test]
    async fn genre_stops_when_no_next_page() {
        let exactly_one_page = (0..25)
            .map(|i| MediaSummary::new(MediaKind::Anime, 2000 + i, format!("Page {}", i)))
            .collect();
        let source = Arc::new(MockSource::new().with_catalogue(exactly_one_page));
        let app = build_router(state_with(source.clone()));

        let (status, body) = send(app, get_request("/api/search/genre/8", None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["count"], 25);
        assert_eq!(source.calls(), vec!["genre 8 1".to_string()]);
    }

    #[tokio::test]
    async fn genre_id_must_be_numeric() {
        let (status, _) = send(app(), get_request("/api/search/genre/action", None)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn recommendations_validate_mal_id() {
        let rec = Recommendation {
            mal_id: 205,
            title: "Samurai Champloo".into(),
            cover_image: None,
            url: None,
            votes: 119,
        };
        let app = build_router(state_with(MockSource::new().with_recommendations(vec![rec])));
        let (status, body) = send(app, get_request("/api/search/anime/1/recommendations", None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"][0]["votes"], 119);

        let (status, _) = send(crate::http::testing::app(), get_request("/api/search/anime/0/recommendations", None)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn add_requires_auth() {
        let req = json_request("POST", "/api/search/add", None, r#"{"mal_id":1,"title":"x"}"#);
        let (status, _) = send(app(), req).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }
}
