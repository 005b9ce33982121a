//! HS256 session tokens

use chrono::{Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use animelog_core::config::MAX_TOKEN_TTL_DAYS;

use super::AuthError;

/// Token payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// User id
    pub sub: Uuid,
    pub iat: i64,
    pub exp: i64,
}

/// Signs and verifies session tokens with one shared secret
#[derive(Clone)]
pub struct TokenIssuer {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl std::fmt::Debug for TokenIssuer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenIssuer")
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

impl TokenIssuer {
    pub fn new(secret: &str, ttl: Duration) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            ttl,
        }
    }

    /// Issuer with a lifetime in whole days, capped at `MAX_TOKEN_TTL_DAYS`.
    pub fn with_days(secret: &str, days: i64) -> Self {
        let days = days.clamp(1, MAX_TOKEN_TTL_DAYS);
        Self::new(secret, Duration::days(days))
    }

    pub fn issue(&self, user_id: Uuid) -> Result<String, AuthError> {
        let now = Utc::now();
        let claims = Claims {
            sub: user_id,
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| AuthError::Encode(e.to_string()))
    }

    pub fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        decode::<Claims>(token, &self.decoding, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => AuthError::Expired,
                _ => AuthError::Invalid(e.to_string()),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issued_token_verifies() {
        let issuer = TokenIssuer::with_days("test-secret", 7);
        let user = Uuid::new_v4();
        let claims = issuer.verify(&issuer.issue(user).unwrap()).unwrap();
        assert_eq!(claims.sub, user);
        assert_eq!(claims.exp - claims.iat, 7 * 24 * 60 * 60);
    }

    #[test]
    fn oversized_lifetime_is_capped() {
        let issuer = TokenIssuer::with_days("test-secret", i64::MAX);
        let claims = issuer.verify(&issuer.issue(Uuid::new_v4()).unwrap()).unwrap();
        assert_eq!(claims.exp - claims.iat, MAX_TOKEN_TTL_DAYS * 24 * 60 * 60);
    }

    #[test]
    fn expired_token_is_distinct() {
        let issuer = TokenIssuer::new("test-secret", Duration::hours(-1));
        let token = issuer.issue(Uuid::new_v4()).unwrap();
        assert!(matches!(issuer.verify(&token), Err(AuthError::Expired)));
    }

    #[test]
    fn wrong_secret_is_invalid() {
        let token = TokenIssuer::with_days("secret-a", 1)
            .issue(Uuid::new_v4())
            .unwrap();
        let other = TokenIssuer::with_days("secret-b", 1);
        assert!(matches!(other.verify(&token), Err(AuthError::Invalid(_))));
    }

    #[test]
    fn garbage_is_invalid() {
        let issuer = TokenIssuer::with_days("test-secret", 1);
        assert!(matches!(
            issuer.verify("not.a.token"),
            Err(AuthError::Invalid(_))
        ));
    }

    #[test]
    fn debug_hides_keys() {
        let issuer = TokenIssuer::with_days("super-secret", 1);
        assert!(!format!("{issuer:?}").contains("super-secret"));
    }
}
