//! Account endpoints and the quick "add to my list" shortcuts
//!
//! Signup and login answer `{success, token, user}`. The list shortcuts
//! create or remove per-user anime/manga rows from a minimal payload.

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    routing::{delete, get, post},
    Json, Router,
};
use serde::Serialize;
use uuid::Uuid;

use animelog_core::models::{ListEntryDraft, LoginDraft, MediaKind, SignupDraft};

use crate::auth::{hash_password, verify_password};
use crate::db::repos::users::{EMAIL_CONSTRAINT, USERNAME_CONSTRAINT};
use crate::db::repos::{
    AnimeRecord, AnimeRepo, DbError, MangaRecord, MangaRepo, Owned, UserProfile, UserRecord,
    UserRepo,
};
use crate::http::error::ApiError;
use crate::http::extractors::{ApiJson, AuthUser, ValidUuid};
use crate::http::response::Envelope;
use crate::http::server::AppState;

const INVALID_CREDENTIALS: &str = "Invalid credentials.";

/// Public part of a user
#[derive(Debug, Serialize)]
pub struct PublicUser {
    pub id: Uuid,
    pub username: String,
    pub email: String,
}

impl From<UserRecord> for PublicUser {
    fn from(u: UserRecord) -> Self {
        Self {
            id: u.id,
            username: u.username,
            email: u.email,
        }
    }
}

/// Signup/login response
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub success: bool,
    pub token: String,
    pub user: PublicUser,
}

/// GET /api/users/me response
#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub success: bool,
    pub user: UserProfile,
}

async fn run_blocking<T, F>(f: F) -> Result<T, ApiError>
where
    F: FnOnce() -> Result<T, crate::auth::AuthError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| ApiError::internal(format!("blocking task failed: {}", e)))?
        .map_err(ApiError::from)
}

fn signup_conflict(e: DbError) -> ApiError {
    let message = match e.conflict_constraint() {
        Some(EMAIL_CONSTRAINT) => Some("User already exists with this email."),
        Some(USERNAME_CONSTRAINT) => Some("Username is already taken."),
        _ => None,
    };
    match message {
        Some(message) => ApiError::bad_request(message),
        None => e.into(),
    }
}

/// POST /api/users/signup
async fn signup(
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<SignupDraft>,
) -> Result<(StatusCode, Json<AuthResponse>), ApiError> {
    let new_user = req.validate()?;

    let plain = new_user.password.expose().to_owned();
    let hash = run_blocking(move || hash_password(&plain)).await?;

    let user = UserRepo::new(&state.pool)
        .create(&new_user, &hash)
        .await
        .map_err(signup_conflict)?;

    tracing::info!(user_id = %user.id, username = %user.username, "user signed up");
    let token = state.tokens.issue(user.id)?;
    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            success: true,
            token,
            user: user.into(),
        }),
    ))
}

/// POST /api/users/login
async fn login(
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<LoginDraft>,
) -> Result<Json<AuthResponse>, ApiError> {
    let email = req.normalized_email();
    if email.is_empty() || req.password.is_empty() {
        return Err(ApiError::bad_request(INVALID_CREDENTIALS));
    }

    let user = UserRepo::new(&state.pool)
        .find_by_email(&email)
        .await?
        .ok_or_else(|| ApiError::bad_request(INVALID_CREDENTIALS))?;

    let plain = req.password;
    let stored = user.password_hash.clone();
    if !run_blocking(move || verify_password(&plain, &stored)).await? {
        return Err(ApiError::bad_request(INVALID_CREDENTIALS));
    }

    let token = state.tokens.issue(user.id)?;
    Ok(Json(AuthResponse {
        success: true,
        token,
        user: user.into(),
    }))
}

/// GET /api/users/me
async fn me(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
) -> Result<Json<ProfileResponse>, ApiError> {
    let profile = UserRepo::new(&state.pool).profile(user.id).await?;
    Ok(Json(ProfileResponse {
        success: true,
        user: profile,
    }))
}

fn already_listed(kind: MediaKind, e: DbError) -> ApiError {
    match e {
        DbError::Conflict { .. } => {
            ApiError::bad_request(format!("{} already in your list", kind.label()))
        }
        other => other.into(),
    }
}

fn ensure_listed<R: Owned>(kind: MediaKind, record: &R, user: AuthUser) -> Result<(), ApiError> {
    if record.is_owned_by(user.id) {
        Ok(())
    } else {
        Err(ApiError::bad_request(format!("{} not in your list", kind.label())))
    }
}

/// POST /api/users/anime
async fn add_anime(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<ListEntryDraft>,
) -> Result<Json<Envelope<AnimeRecord>>, ApiError> {
    let anime = req.validate(MediaKind::Anime)?.into_anime()?;
    let record = AnimeRepo::new(&state.pool)
        .create_for_user(user.id, &anime)
        .await
        .map_err(|e| already_listed(MediaKind::Anime, e))?;

    Ok(Json(Envelope::data(record).with_message("Anime added to your list")))
}

/// DELETE /api/users/anime/{id}
async fn remove_anime(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    ValidUuid(id): ValidUuid,
) -> Result<Json<Envelope<()>>, ApiError> {
    let repo = AnimeRepo::new(&state.pool);
    let record = repo.get(id).await?;
    ensure_listed(MediaKind::Anime, &record, user)?;
    repo.delete(id, user.id).await?;

    Ok(Json(Envelope::message("Anime removed from your list")))
}

/// POST /api/users/manga
async fn add_manga(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<ListEntryDraft>,
) -> Result<Json<Envelope<MangaRecord>>, ApiError> {
    let manga = req.validate(MediaKind::Manga)?.into_manga()?;
    let record = MangaRepo::new(&state.pool)
        .create_for_user(user.id, &manga)
        .await
        .map_err(|e| already_listed(MediaKind::Manga, e))?;

    Ok(Json(Envelope::data(record).with_message("Manga added to your list")))
}

/// DELETE /api/users/manga/{id}
async fn remove_manga(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    ValidUuid(id): ValidUuid,
) -> Result<Json<Envelope<()>>, ApiError> {
    let repo = MangaRepo::new(&state.pool);
    let record = repo.get(id).await?;
    ensure_listed(MediaKind::Manga, &record, user)?;
    repo.delete(id, user.id).await?;

    Ok(Json(Envelope::message("Manga removed from your list")))
}

/// User routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/users/signup", post(signup))
        .route("/api/users/login", post(login))
        .route("/api/users/me", get(me))
        .route("/api/users/anime", post(add_anime))
        .route("/api/users/anime/{id}", delete(remove_anime))
        .route("/api/users/manga", post(add_manga))
        .route("/api/users/manga/{id}", delete(remove_manga))
}
