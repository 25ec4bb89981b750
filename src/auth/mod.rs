pub mod password;

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::SecurityConfig;
use crate::types::UserId;

pub use password::{hash_password, verify_password, BcryptError};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: the user's email
    pub sub: String,
    pub user_id: UserId,
    pub exp: i64,
    pub iat: i64,
}

impl Claims {
    pub fn new(email: impl Into<String>, user_id: UserId, expiry_minutes: i64) -> Self {
        let now = Utc::now();
        // Saturate instead of overflowing on absurd expiry settings
        let exp = Duration::try_minutes(expiry_minutes)
            .and_then(|ttl| now.checked_add_signed(ttl))
            .unwrap_or(if expiry_minutes < 0 {
                DateTime::<Utc>::MIN_UTC
            } else {
                DateTime::<Utc>::MAX_UTC
            })
            .timestamp();

        Self {
            sub: email.into(),
            user_id,
            exp,
            iat: now.timestamp(),
        }
    }
}

#[derive(Debug, Error)]
pub enum JwtError {
    #[error("JWT generation error: {0}")]
    TokenGeneration(String),

    #[error("Invalid JWT token: {0}")]
    InvalidToken(String),

    #[error("Invalid JWT secret")]
    InvalidSecret,
}

/// Bearer token returned by the login and register endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessToken {
    pub access_token: String,
    pub token_type: String,
}

impl AccessToken {
    pub fn bearer(token: String) -> Self {
        Self {
            access_token: token,
            token_type: "bearer".to_string(),
        }
    }
}

pub fn generate_jwt(claims: &Claims, security: &SecurityConfig) -> Result<String, JwtError> {
    let secret = &security.jwt_secret;

    if secret.is_empty() {
        return Err(JwtError::InvalidSecret);
    }

    let encoding_key = EncodingKey::from_secret(secret.as_bytes());
    encode(&Header::default(), claims, &encoding_key)
        .map_err(|e| JwtError::TokenGeneration(e.to_string()))
}

/// Verify signature and expiry, returning the claims.
pub fn validate_jwt(token: &str, security: &SecurityConfig) -> Result<Claims, JwtError> {
    let secret = &security.jwt_secret;

    if secret.is_empty() {
        return Err(JwtError::InvalidSecret);
    }

    let decoding_key = DecodingKey::from_secret(secret.as_bytes());
    let token_data = decode::<Claims>(token, &decoding_key, &Validation::default())
        .map_err(|e| JwtError::InvalidToken(e.to_string()))?;

    Ok(token_data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;

    #[test]
    fn round_trips_claims() {
        let security = AppConfig::development().security;
        let token = generate_jwt(&Claims::new("ada@example.com", 42, 60), &security).unwrap();

        let claims = validate_jwt(&token, &security).unwrap();
        assert_eq!(claims.sub, "ada@example.com");
        assert_eq!(claims.user_id, 42);
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn rejects_foreign_signatures() {
        let security = AppConfig::development().security;
        let mut other = security.clone();
        other.jwt_secret = "someone-else".to_string();

        let token = generate_jwt(&Claims::new("ada@example.com", 1, 60), &other).unwrap();
        assert!(matches!(
            validate_jwt(&token, &security),
            Err(JwtError::InvalidToken(_))
        ));
    }

    #[test]
    fn rejects_expired_tokens() {
        let security = AppConfig::development().security;
        // Well past the default 60s leeway
        let token = generate_jwt(&Claims::new("ada@example.com", 1, -10), &security).unwrap();
        assert!(validate_jwt(&token, &security).is_err());
    }

    #[test]
    fn huge_expiry_saturates() {
        let claims = Claims::new("ada@example.com", 1, i64::MAX);
        assert!(claims.exp > claims.iat);

        let claims = Claims::new("ada@example.com", 1, i64::MIN);
        assert!(claims.exp < claims.iat);
    }

    #[test]
    fn empty_secret_is_refused() {
        let mut security = AppConfig::development().security;
        security.jwt_secret.clear();
        assert!(matches!(
            generate_jwt(&Claims::new("x@example.com", 1, 5), &security),
            Err(JwtError::InvalidSecret)
        ));
    }
}
