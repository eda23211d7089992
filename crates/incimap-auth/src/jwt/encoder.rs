//! JWT token creation with configurable signing and TTL.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use jsonwebtoken::{EncodingKey, Header, encode};
use uuid::{NoContext, Timestamp, Uuid};

use incimap_core::config::AuthConfig;
use incimap_core::error::AppError;
use incimap_core::traits::Clock;
use incimap_core::types::Subject;

use super::claims::{Claims, TokenType};

/// Creates signed JWT access and refresh tokens.
#[derive(Clone)]
pub struct JwtEncoder {
    /// HMAC secret key for signing.
    encoding_key: EncodingKey,
    /// Access token TTL.
    access_ttl: chrono::Duration,
    /// Refresh token TTL.
    refresh_ttl: chrono::Duration,
    /// Time source for `iat`/`exp`.
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for JwtEncoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtEncoder")
            .field("access_ttl", &self.access_ttl)
            .field("refresh_ttl", &self.refresh_ttl)
            .finish()
    }
}

/// Result of a successful token pair generation.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct TokenPair {
    /// Short-lived access token.
    pub access_token: String,
    /// Long-lived refresh token.
    pub refresh_token: String,
    /// Access token expiration timestamp.
    pub access_expires_at: DateTime<Utc>,
    /// Refresh token expiration timestamp.
    pub refresh_expires_at: DateTime<Utc>,
}

impl JwtEncoder {
    /// Creates a new encoder from auth configuration.
    pub fn new(config: &AuthConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(config.jwt_secret.as_bytes()),
            access_ttl: chrono::Duration::minutes(config.access_ttl_minutes as i64),
            refresh_ttl: chrono::Duration::hours(config.refresh_ttl_hours as i64),
            clock,
        }
    }

    /// Generates a new access + refresh token pair for the given subject.
    ///
    /// Both tokens carry the same subject claims but a distinct `token_type`
    /// and a distinct `jti`, so no two calls ever yield the same strings.
    pub fn generate_token_pair(&self, subject: &Subject) -> Result<TokenPair, AppError> {
        let now = self.clock.now();

        let (access_token, access_expires_at) =
            self.encode_token(subject, TokenType::Access, now, self.access_ttl)?;
        let (refresh_token, refresh_expires_at) =
            self.encode_token(subject, TokenType::Refresh, now, self.refresh_ttl)?;

        Ok(TokenPair {
            access_token,
            refresh_token,
            access_expires_at,
            refresh_expires_at,
        })
    }

    fn encode_token(
        &self,
        subject: &Subject,
        token_type: TokenType,
        now: DateTime<Utc>,
        ttl: chrono::Duration,
    ) -> Result<(String, DateTime<Utc>), AppError> {
        let exp = now + ttl;
        // `exp` is whole seconds on the wire; report the same instant.
        let expires_at = DateTime::from_timestamp(exp.timestamp(), 0).unwrap_or(exp);

        let claims = Claims {
            sub: subject.id.clone(),
            email: subject.email.clone(),
            iat: now.timestamp(),
            exp: exp.timestamp(),
            jti: issuance_nonce(now),
            token_type,
        };

        let token = encode(&Header::default(), &claims, &self.encoding_key).map_err(|e| {
            AppError::internal(format!("Failed to encode {token_type} token: {e}"))
        })?;

        Ok((token, expires_at))
    }
}

/// Time-ordered nonce: a v7 UUID stamped with the issuance instant plus
/// random bits.
fn issuance_nonce(now: DateTime<Utc>) -> Uuid {
    let seconds = u64::try_from(now.timestamp()).unwrap_or_default();
    let ts = Timestamp::from_unix(NoContext, seconds, now.timestamp_subsec_nanos());
    Uuid::new_v7(ts)
}
