//! Rate-limited HTTP client for Jikan v4
//!
//! Every request waits on a shared `governor` limiter, then retries 429 and
//! 5xx responses with backoff. Network errors that look transient are
//! retried the same way.

use std::num::NonZeroU32;
use std::time::Duration;

use async_trait::async_trait;
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;

use animelog_core::config::{JikanSection, MAX_REQUESTS_PER_SECOND, MIN_REQUESTS_PER_SECOND};
use animelog_core::models::{MalId, MediaKind};

use super::dto::{JikanMedia, JikanRecommendation, ListResponse};
use super::retry::{self, RetryPolicy};
use super::{
    clamp_limit, JikanError, MediaPage, MediaSummary, MetadataSource, Recommendation, MAX_PAGE_SIZE,
};

const USER_AGENT: &str = concat!("animelog/", env!("CARGO_PKG_VERSION"));

/// Jikan API client
pub struct JikanClient {
    http: Client,
    base_url: String,
    limiter: DefaultDirectRateLimiter,
    policy: RetryPolicy,
}

impl std::fmt::Debug for JikanClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JikanClient")
            .field("base_url", &self.base_url)
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

impl JikanClient {
    pub fn new(config: &JikanSection) -> Result<Self, JikanError> {
        Self::with_policy(config, RetryPolicy::with_max_retries(config.max_retries))
    }

    pub fn with_policy(config: &JikanSection, policy: RetryPolicy) -> Result<Self, JikanError> {
        let http = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(config.timeout_secs.max(1)))
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            limiter: rate_limiter(config.requests_per_second, config.burst)?,
            policy,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// GET `{base}{path}` and decode the JSON body, with rate limiting and retries.
    async fn get_json<T>(&self, path: &str, query: &[(&str, String)]) -> Result<T, JikanError>
    where
        T: DeserializeOwned,
    {
        let url = format!("{}{}", self.base_url, path);
        let attempts = self.policy.max_retries + 1;

        for attempt in 0..attempts {
            self.limiter.until_ready().await;
            let retries_left = attempt + 1 < attempts;

            let response = match self.http.get(&url).query(query).send().await {
                Ok(response) => response,
                Err(e) if retries_left && is_transient(&e) => {
                    let delay = self.policy.delay(attempt, None);
                    tracing::warn!(
                        url = %url,
                        attempt = attempt + 1,
                        error = %e,
                        "Jikan request failed, retrying in {:?}",
                        delay
                    );
                    tokio::time::sleep(delay).await;
                    continue;
                }
                Err(e) => return Err(e.into()),
            };

            let status = response.status();
            if status.is_success() {
                return response
                    .json::<T>()
                    .await
                    .map_err(|e| JikanError::Decode(e.to_string()));
            }

            match status {
                StatusCode::NOT_FOUND => return Err(JikanError::NotFound),
                StatusCode::TOO_MANY_REQUESTS if !retries_left => {
                    return Err(JikanError::RateLimited { attempts })
                }
                StatusCode::TOO_MANY_REQUESTS => {
                    let delay = self
                        .policy
                        .delay(attempt, retry::retry_after(response.headers()));
                    tracing::warn!(
                        url = %url,
                        attempt = attempt + 1,
                        "Jikan rate limited, waiting {:?}",
                        delay
                    );
                    tokio::time::sleep(delay).await;
                }
                s if s.is_server_error() && retries_left => {
                    let delay = self.policy.delay(attempt, None);
                    tracing::warn!(
                        url = %url,
                        status = s.as_u16(),
                        attempt = attempt + 1,
                        "Jikan server error, retrying in {:?}",
                        delay
                    );
                    tokio::time::sleep(delay).await;
                }
                s => return Err(JikanError::Status { status: s.as_u16() }),
            }
        }

        Err(JikanError::RateLimited { attempts })
    }
}

#[async_trait]
impl MetadataSource for JikanClient {
    async fn search(
        &self,
        kind: MediaKind,
        query: &str,
        limit: u32,
    ) -> Result<Vec<MediaSummary>, JikanError> {
        let path = format!("/{}", kind.as_str());
        let params = [
            ("q", query.to_string()),
            ("limit", clamp_limit(limit).to_string()),
        ];
        let resp: ListResponse<JikanMedia> = self.get_json(&path, &params).await?;
        tracing::debug!(kind = %kind, query, hits = resp.data.len(), "Jikan search");
        Ok(resp.data.into_iter().map(|m| m.into_summary(kind)).collect())
    }

    async fn top_by_genre(
        &self,
        genre_id: u32,
        page: u32,
    ) -> Result<MediaPage, JikanError> {
        let params = [
            ("genres", genre_id.to_string()),
            ("limit", MAX_PAGE_SIZE.to_string()),
            ("order_by", "score".to_string()),
            ("sort", "desc".to_string()),
            ("sfw", "true".to_string()),
            ("page", page.max(1).to_string()),
        ];
        let resp: ListResponse<JikanMedia> = self.get_json("/anime", &params).await?;
        let has_next_page = resp.has_next_page(MAX_PAGE_SIZE as usize);
        Ok(MediaPage {
            items: resp
                .data
                .into_iter()
                .map(|m| m.into_summary(MediaKind::Anime))
                .collect(),
            has_next_page,
        })
    }

    async fn recommendations(
        &self,
        kind: MediaKind,
        mal_id: MalId,
    ) -> Result<Vec<Recommendation>, JikanError> {
        let path = format!("/{}/{}/recommendations", kind.as_str(), mal_id.get());
        let resp: ListResponse<JikanRecommendation> = self.get_json(&path, &[]).await?;
        Ok(resp.data.into_iter().map(Recommendation::from).collect())
    }
}

fn rate_limiter(requests_per_second: f64, burst: u32) -> Result<DefaultDirectRateLimiter, JikanError> {
    if !(MIN_REQUESTS_PER_SECOND..=MAX_REQUESTS_PER_SECOND).contains(&requests_per_second) {
        return Err(JikanError::Config(format!(
            "requests_per_second must be between {} and {}, got {}",
            MIN_REQUESTS_PER_SECOND, MAX_REQUESTS_PER_SECOND, requests_per_second
        )));
    }

    let period = Duration::from_secs_f64(1.0 / requests_per_second);
    let burst = NonZeroU32::new(burst.max(1)).unwrap_or(NonZeroU32::MIN);
    let quota = Quota::with_period(period)
        .ok_or_else(|| JikanError::Config("rate limit period is zero".to_string()))?
        .allow_burst(burst);

    Ok(RateLimiter::direct(quota))
}

fn is_transient(e: &reqwest::Error) -> bool {
    e.is_timeout() || e.is_connect()
}
