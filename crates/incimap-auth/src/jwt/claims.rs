//! JWT claims structure used in access and refresh tokens.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use incimap_core::types::Subject;

/// JWT claims payload embedded in every session token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: the user ID.
    pub sub: String,
    /// Email of the subject at issuance time.
    pub email: String,
    /// Issued-at timestamp (seconds since epoch).
    pub iat: i64,
    /// Expiration timestamp (seconds since epoch).
    pub exp: i64,
    /// Per-issuance nonce; keeps two tokens for the same subject distinct.
    pub jti: Uuid,
    /// Token type: "access" or "refresh".
    pub token_type: TokenType,
}

/// Distinguishes access tokens from refresh tokens.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum TokenType {
    /// Short-lived access token for API requests.
    Access,
    /// Long-lived refresh token for obtaining new token pairs.
    Refresh,
}

impl TokenType {
    /// Returns the wire name of the token type.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Access => "access",
            Self::Refresh => "refresh",
        }
    }
}

impl std::fmt::Display for TokenType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Claims {
    /// Returns the subject identity carried by the token.
    pub fn subject(&self) -> Subject {
        Subject::new(self.sub.clone(), self.email.clone())
    }

    /// Returns the expiration as a `DateTime<Utc>`.
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.exp, 0)
    }

    /// Checks whether this token is expired at `now`, allowing `leeway_seconds`
    /// of clock skew.
    pub fn is_expired_at(&self, now: DateTime<Utc>, leeway_seconds: i64) -> bool {
        now.timestamp() >= self.exp.saturating_add(leeway_seconds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn claims(exp: i64) -> Claims {
        Claims {
            sub: "u-1".to_string(),
            email: "u1@example.com".to_string(),
            iat: exp - 60,
            exp,
            jti: Uuid::new_v4(),
            token_type: TokenType::Access,
        }
    }

    #[test]
    fn test_expiry_boundary_is_exclusive() {
        let c = claims(1_000);
        let at = |secs| DateTime::from_timestamp(secs, 0).expect("valid timestamp");

        assert!(!c.is_expired_at(at(999), 0));
        assert!(c.is_expired_at(at(1_000), 0));
        assert!(!c.is_expired_at(at(1_000), 5));
        assert!(c.is_expired_at(at(1_005), 5));
    }

    #[test]
    fn test_token_type_wire_name() {
        let json = serde_json::to_string(&TokenType::Refresh).expect("serialize");
        assert_eq!(json, "\"refresh\"");
        assert_eq!(TokenType::Access.to_string(), "access");
    }
}
