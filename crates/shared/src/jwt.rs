//! JWT token generation and validation.
//!
//! Access and refresh tokens share one signing key and carry a [`TokenKind`]
//! so neither can stand in for the other.

use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use thiserror::Error;

use crate::auth::{Claims, TokenKind};

/// JWT configuration.
#[derive(Debug, Clone)]
pub struct JwtConfig {
    /// Secret key for signing tokens.
    pub secret: String,
    /// Access token expiration in minutes.
    pub access_token_expires_minutes: i64,
    /// Refresh token expiration in days.
    pub refresh_token_expires_days: i64,
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self {
            secret: "change-me-in-production".to_string(),
            access_token_expires_minutes: 60,
            refresh_token_expires_days: 30,
        }
    }
}

impl From<&crate::config::JwtConfig> for JwtConfig {
    fn from(config: &crate::config::JwtConfig) -> Self {
        Self {
            secret: config.secret.clone(),
            access_token_expires_minutes: i64::try_from(config.access_token_expiry_secs / 60)
                .unwrap_or(i64::MAX),
            refresh_token_expires_days: i64::try_from(config.refresh_token_expiry_secs / 86_400)
                .unwrap_or(i64::MAX),
        }
    }
}

/// Errors that can occur during JWT operations.
#[derive(Debug, Error)]
pub enum JwtError {
    /// Token encoding failed.
    #[error("failed to encode token: {0}")]
    EncodingError(String),

    /// Token decoding failed.
    #[error("failed to decode token: {0}")]
    DecodingError(String),

    /// Token has expired.
    #[error("token has expired")]
    Expired,

    /// Token is valid but of the wrong kind for this use.
    #[error("expected {expected:?} token, got {actual:?}")]
    WrongKind {
        /// Kind required by the caller.
        expected: TokenKind,
        /// Kind found in the token.
        actual: TokenKind,
    },
}

/// JWT service for token operations.
#[derive(Clone)]
pub struct JwtService {
    config: JwtConfig,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl std::fmt::Debug for JwtService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtService")
            .field("access_token_expires_minutes", &self.config.access_token_expires_minutes)
            .field("refresh_token_expires_days", &self.config.refresh_token_expires_days)
            .field("secret", &"[hidden]")
            .finish()
    }
}

impl JwtService {
    /// Creates a new JWT service with the given configuration.
    #[must_use]
    pub fn new(config: JwtConfig) -> Self {
        let encoding_key = EncodingKey::from_secret(config.secret.as_bytes());
        let decoding_key = DecodingKey::from_secret(config.secret.as_bytes());
        Self {
            config,
            encoding_key,
            decoding_key,
        }
    }

    /// Generates an access token for a user.
    ///
    /// # Errors
    ///
    /// Returns `JwtError::EncodingError` if token generation fails.
    pub fn generate_access_token(&self, user_id: i64, role: &str) -> Result<String, JwtError> {
        let expires_at = Utc::now() + Duration::minutes(self.config.access_token_expires_minutes);
        self.encode(&Claims::new(user_id, role, TokenKind::Access, expires_at))
    }

    /// Generates a refresh token for a user.
    ///
    /// # Errors
    ///
    /// Returns `JwtError::EncodingError` if token generation fails.
    pub fn generate_refresh_token(&self, user_id: i64, role: &str) -> Result<String, JwtError> {
        let expires_at = Utc::now() + Duration::days(self.config.refresh_token_expires_days);
        self.encode(&Claims::new(user_id, role, TokenKind::Refresh, expires_at))
    }

    fn encode(&self, claims: &Claims) -> Result<String, JwtError> {
        encode(&Header::default(), claims, &self.encoding_key)
            .map_err(|e| JwtError::EncodingError(e.to_string()))
    }

    /// Validates and decodes a token of any kind.
    ///
    /// # Errors
    ///
    /// Returns `JwtError::Expired` if the token has expired.
    /// Returns `JwtError::DecodingError` if the token is malformed.
    pub fn validate_token(&self, token: &str) -> Result<Claims, JwtError> {
        let validation = Validation::default();

        decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => JwtError::Expired,
                _ => JwtError::DecodingError(e.to_string()),
            })
    }

    /// Validates a token and requires it to be of the given kind.
    ///
    /// # Errors
    ///
    /// Returns `JwtError::WrongKind` when the kinds differ, otherwise as
    /// [`JwtService::validate_token`].
    pub fn validate_kind(&self, token: &str, expected: TokenKind) -> Result<Claims, JwtError> {
        let claims = self.validate_token(token)?;
        if claims.kind != expected {
            return Err(JwtError::WrongKind {
                expected,
                actual: claims.kind,
            });
        }
        Ok(claims)
    }

    /// Returns the access token expiration in seconds.
    #[must_use]
    pub const fn access_token_expires_in(&self) -> i64 {
        self.config.access_token_expires_minutes * 60
    }
}

#[cfg(test)]
#[path = "jwt_tests.rs"]
mod tests;
