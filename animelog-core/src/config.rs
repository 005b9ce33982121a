//! Centralized configuration for animelog
//!
//! Resolution order, lowest to highest precedence:
//! built-in defaults, `~/.animelog/config.toml`, environment variables.
//! The CLI applies its own flags on top.

use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};

/// Longest accepted token lifetime.
pub const MAX_TOKEN_TTL_DAYS: i64 = 365;
/// Accepted range for the outbound Jikan request rate.
pub const MIN_REQUESTS_PER_SECOND: f64 = 0.01;
pub const MAX_REQUESTS_PER_SECOND: f64 = 100.0;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AnimelogConfig {
    pub server: ServerSection,
    pub database: DatabaseSection,
    pub auth: AuthSection,
    pub jikan: JikanSection,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSection {
    pub bind: SocketAddr,
    /// Allow any origin. Development only.
    pub cors_permissive: bool,
    /// Origins accepted when `cors_permissive` is off
    pub allowed_origins: Vec<String>,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([127, 0, 0, 1], 5001)),
            cors_permissive: false,
            allowed_origins: vec![
                "http://localhost:3000".to_string(),
                "http://127.0.0.1:3000".to_string(),
            ],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseSection {
    pub url: String,
    pub max_connections: u32,
}

impl DatabaseSection {
    /// Connection string with any credentials masked.
    pub fn redacted_url(&self) -> String {
        redact_url(&self.url)
    }
}

/// Strip the userinfo part of a connection string.
pub fn redact_url(url: &str) -> String {
    match (url.find("://"), url.rfind('@')) {
        (Some(scheme_end), Some(at)) if at > scheme_end => {
            format!("{}://***{}", &url[..scheme_end], &url[at..])
        }
        _ => url.to_string(),
    }
}

impl Default for DatabaseSection {
    fn default() -> Self {
        Self {
            url: "postgres://localhost/animelog".to_string(),
            max_connections: 10,
        }
    }
}

#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthSection {
    pub jwt_secret: String,
    pub token_ttl_days: i64,
}

impl Default for AuthSection {
    fn default() -> Self {
        Self {
            jwt_secret: String::new(),
            token_ttl_days: 7,
        }
    }
}

impl std::fmt::Debug for AuthSection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthSection")
            .field("jwt_secret", &if self.jwt_secret.is_empty() { "" } else { "***" })
            .field("token_ttl_days", &self.token_ttl_days)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct JikanSection {
    pub base_url: String,
    /// Average outbound request rate (Jikan allows ~3/s)
    pub requests_per_second: f64,
    pub burst: u32,
    /// Retries on 429 and 5xx before giving up
    pub max_retries: u32,
    pub timeout_secs: u64,
}

impl Default for JikanSection {
    fn default() -> Self {
        Self {
            base_url: "https://api.jikan.moe/v4".to_string(),
            requests_per_second: 3.0,
            burst: 3,
            max_retries: 3,
            timeout_secs: 30,
        }
    }
}

impl AnimelogConfig {
    /// Config file path: ~/.animelog/config.toml
    pub fn config_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".animelog/config.toml")
    }

    /// Load the config file (if any) and apply environment overrides.
    pub fn load() -> Result<Self> {
        let mut config = Self::load_file(&Self::config_path())?;
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Read a TOML config file. A missing file yields defaults.
    pub fn load_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|source| CoreError::Toml {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Apply environment overrides through `lookup` (injectable for tests).
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(bind) = lookup("ANIMELOG_BIND").and_then(|v| v.parse().ok()) {
            self.server.bind = bind;
        }
        if let Some(port) = lookup("PORT").and_then(|v| v.parse().ok()) {
            self.server.bind.set_port(port);
        }
        if let Some(url) = lookup("DATABASE_URL") {
            self.database.url = url;
        }
        if let Some(secret) = lookup("JWT_SECRET") {
            self.auth.jwt_secret = secret;
        }
        if let Some(base) = lookup("JIKAN_BASE_URL") {
            self.jikan.base_url = base;
        }
    }

    /// Check the settings the server cannot start without.
    pub fn validate(&self) -> Result<()> {
        if self.auth.jwt_secret.trim().is_empty() {
            return Err(CoreError::config(
                "JWT secret is not set. Set JWT_SECRET or auth.jwt_secret in the config file",
            ));
        }
        if !(1..=MAX_TOKEN_TTL_DAYS).contains(&self.auth.token_ttl_days) {
            return Err(CoreError::config(format!(
                "auth.token_ttl_days must be between 1 and {}",
                MAX_TOKEN_TTL_DAYS
            )));
        }
        if self.database.max_connections == 0 {
            return Err(CoreError::config("database.max_connections must be at least 1"));
        }
        let rps = self.jikan.requests_per_second;
        if !(MIN_REQUESTS_PER_SECOND..=MAX_REQUESTS_PER_SECOND).contains(&rps) {
            return Err(CoreError::config(format!(
                "jikan.requests_per_second must be between {} and {}",
                MIN_REQUESTS_PER_SECOND, MAX_REQUESTS_PER_SECOND
            )));
        }
        Ok(())
    }

    /// Render as TOML with the JWT secret and database credentials masked.
    pub fn to_redacted_toml(&self) -> Result<String> {
        let mut shown = self.clone();
        if !shown.auth.jwt_secret.is_empty() {
            shown.auth.jwt_secret = "***".to_string();
        }
        shown.database.url = shown.database.redacted_url();
        toml::to_string_pretty(&shown)
            .map_err(|e| CoreError::config(format!("failed to serialize config: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults() {
        let config = AnimelogConfig::default();
        assert_eq!(config.server.bind.port(), 5001);
        assert_eq!(config.auth.token_ttl_days, 7);
        assert_eq!(config.jikan.base_url, "https://api.jikan.moe/v4");
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = AnimelogConfig::load_file(&dir.path().join("nope.toml")).unwrap();
        assert_eq!(config.database.max_connections, 10);
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            "[database]\nurl = \"postgres://db/anime\"\n\n[jikan]\nburst = 1\n",
        )
        .unwrap();

        let config = AnimelogConfig::load_file(&path).unwrap();
        assert_eq!(config.database.url, "postgres://db/anime");
        assert_eq!(config.database.max_connections, 10);
        assert_eq!(config.jikan.burst, 1);
        assert_eq!(config.jikan.max_retries, 3);
    }

    #[test]
    fn invalid_toml_is_reported_with_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[server\n").unwrap();
        let err = AnimelogConfig::load_file(&path).unwrap_err();
        assert!(matches!(err, CoreError::Toml { .. }));
    }

    #[test]
    fn env_overrides() {
        let mut config = AnimelogConfig::default();
        config.apply_env(env(&[
            ("PORT", "8080"),
            ("DATABASE_URL", "postgres://elsewhere/db"),
            ("JWT_SECRET", "s3cret"),
        ]));
        assert_eq!(config.server.bind.port(), 8080);
        assert_eq!(config.database.url, "postgres://elsewhere/db");
        assert_eq!(config.auth.jwt_secret, "s3cret");
    }

    #[test]
    fn port_applies_after_bind() {
        let mut config = AnimelogConfig::default();
        config.apply_env(env(&[("ANIMELOG_BIND", "0.0.0.0:9000"), ("PORT", "9100")]));
        assert_eq!(config.server.bind.to_string(), "0.0.0.0:9100");
    }

    #[test]
    fn validate_requires_secret() {
        let config = AnimelogConfig::default();
        assert!(matches!(config.validate(), Err(CoreError::Config { .. })));

        let mut config = AnimelogConfig::default();
        config.auth.jwt_secret = "s3cret".into();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn redacted_toml_hides_secret() {
        let mut config = AnimelogConfig::default();
        config.auth.jwt_secret = "s3cret".into();
        let rendered = config.to_redacted_toml().unwrap();
        assert!(rendered.contains("***"));
        assert!(!rendered.contains("s3cret"));
    }

    #[test]
    fn redacted_toml_hides_database_password() {
        let mut config = AnimelogConfig::default();
        config.database.url = "postgres://anime:hunter2@db:5432/animelog".into();
        let rendered = config.to_redacted_toml().unwrap();
        assert!(rendered.contains("postgres://***@db:5432/animelog"));
        assert!(!rendered.contains("hunter2"));
    }

    #[test]
    fn redacts_credentials() {
        assert_eq!(
            redact_url("postgres://anime:s3cret@db:5432/animelog"),
            "postgres://***@db:5432/animelog"
        );
        assert_eq!(
            redact_url("postgres://localhost/animelog"),
            "postgres://localhost/animelog"
        );
    }

    #[test]
    fn validate_bounds_token_ttl() {
        let mut config = AnimelogConfig::default();
        config.auth.jwt_secret = "s3cret".into();

        config.auth.token_ttl_days = i64::MAX;
        assert!(matches!(config.validate(), Err(CoreError::Config { .. })));
        config.auth.token_ttl_days = 0;
        assert!(config.validate().is_err());
        config.auth.token_ttl_days = MAX_TOKEN_TTL_DAYS;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn validate_bounds_request_rate() {
        let mut config = AnimelogConfig::default();
        config.auth.jwt_secret = "s3cret".into();

        for bad in [1e-300, 0.0, -1.0, f64::NAN, f64::INFINITY, 1e9] {
            config.jikan.requests_per_second = bad;
            assert!(config.validate().is_err(), "{} accepted", bad);
        }
        config.jikan.requests_per_second = 0.5;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn auth_debug_masks_secret() {
        let mut config = AnimelogConfig::default();
        config.auth.jwt_secret = "s3cret".into();
        assert!(!format!("{:?}", config).contains("s3cret"));
    }
}
