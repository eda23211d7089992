//! JWT token validation.
//!
//! Expiry is checked against the injected [`Clock`] rather than inside
//! `jsonwebtoken`, so tests and sweeps share one notion of "now".

use std::sync::Arc;

use chrono::{DateTime, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};

use incimap_core::config::AuthConfig;
use incimap_core::traits::Clock;

use super::claims::{Claims, TokenType};

/// Why a token was refused.
///
/// Only ever logged; callers outside this crate see a uniform rejection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    /// Not a JWT, bad signature, wrong algorithm, or unreadable claims.
    Malformed,
    /// Signature valid but `exp` has passed.
    Expired,
    /// Signature valid and unexpired but the wrong token type.
    WrongType,
    /// Present in the revocation store.
    Revoked,
}

impl Rejection {
    /// Short label used in log fields.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Malformed => "malformed",
            Self::Expired => "expired",
            Self::WrongType => "wrong_type",
            Self::Revoked => "revoked",
        }
    }
}

/// Validates JWT signatures, expiry, and token type.
#[derive(Clone)]
pub struct JwtDecoder {
    /// HMAC secret key for verification.
    decoding_key: DecodingKey,
    /// Validation configuration (signature and claim presence only).
    validation: Validation,
    /// Clock-skew tolerance applied to `exp`, in seconds.
    leeway_seconds: i64,
    /// Time source for the expiry check.
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for JwtDecoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtDecoder")
            .field("validation", &self.validation)
            .field("leeway_seconds", &self.leeway_seconds)
            .finish()
    }
}

impl JwtDecoder {
    /// Creates a new decoder from auth configuration.
    pub fn new(config: &AuthConfig, clock: Arc<dyn Clock>) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Self {
            decoding_key: DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            validation,
            leeway_seconds: config.leeway_seconds as i64,
            clock,
        }
    }

    /// Decodes a token and checks signature, expiry, and token type.
    ///
    /// Revocation is not consulted here; that is the issuer's job.
    pub fn decode(&self, token: &str, expected: TokenType) -> Result<Claims, Rejection> {
        let claims = self.decode_signed(token)?;

        if claims.is_expired_at(self.clock.now(), self.leeway_seconds) {
            return Err(Rejection::Expired);
        }

        if claims.token_type != expected {
            return Err(Rejection::WrongType);
        }

        Ok(claims)
    }

    /// Returns the last instant at which `token` could still pass
    /// [`decode`](Self::decode), or `None` when it can never pass (bad
    /// signature or unreadable claims). Expired tokens still return their
    /// deadline.
    pub fn acceptance_deadline(&self, token: &str) -> Option<DateTime<Utc>> {
        let claims = self.decode_signed(token).ok()?;
        DateTime::from_timestamp(claims.exp.saturating_add(self.leeway_seconds), 0)
    }

    /// Signature and structure check only.
    fn decode_signed(&self, token: &str) -> Result<Claims, Rejection> {
        decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| {
                tracing::trace!(error = %e, "Token failed signature/structure validation");
                Rejection::Malformed
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jwt::encoder::JwtEncoder;
    use chrono::Duration;
    use incimap_core::traits::ManualClock;
    use incimap_core::types::Subject;

    fn setup(secret: &str, leeway: u64) -> (ManualClock, JwtEncoder, JwtDecoder) {
        let clock = ManualClock::starting_now();
        let config = AuthConfig {
            jwt_secret: secret.to_string(),
            leeway_seconds: leeway,
            ..AuthConfig::default()
        };
        let shared: Arc<dyn Clock> = Arc::new(clock.clone());
        (
            clock,
            JwtEncoder::new(&config, Arc::clone(&shared)),
            JwtDecoder::new(&config, shared),
        )
    }

    #[test]
    fn test_decode_checks_type_both_ways() {
        let (_clock, encoder, decoder) = setup("secret", 0);
        let pair = encoder
            .generate_token_pair(&Subject::new("u-1", "a@example.com"))
            .expect("encode");

        let access = decoder
            .decode(&pair.access_token, TokenType::Access)
            .expect("access verifies");
        assert_eq!(access.sub, "u-1");
        assert_eq!(access.email, "a@example.com");

        assert_eq!(
            decoder.decode(&pair.access_token, TokenType::Refresh).unwrap_err(),
            Rejection::WrongType
        );
        assert_eq!(
            decoder.decode(&pair.refresh_token, TokenType::Access).unwrap_err(),
            Rejection::WrongType
        );
    }

    #[test]
    fn test_decode_rejects_foreign_signature() {
        let (_clock, encoder, _) = setup("secret-a", 0);
        let (_clock_b, _, other_decoder) = setup("secret-b", 0);
        let pair = encoder
            .generate_token_pair(&Subject::new("u-1", "a@example.com"))
            .expect("encode");

        assert_eq!(
            other_decoder
                .decode(&pair.access_token, TokenType::Access)
                .unwrap_err(),
            Rejection::Malformed
        );
        assert!(other_decoder.acceptance_deadline(&pair.access_token).is_none());
    }

    #[test]
    fn test_decode_rejects_tampered_payload() {
        let (_clock, encoder, decoder) = setup("secret", 0);
        let pair = encoder
            .generate_token_pair(&Subject::new("u-1", "a@example.com"))
            .expect("encode");

        let mut parts: Vec<String> = pair.access_token.split('.').map(String::from).collect();
        let swapped = parts[1].replace('A', "B");
        parts[1] = if swapped == parts[1] {
            format!("{}A", parts[1])
        } else {
            swapped
        };
        let tampered = parts.join(".");

        assert_eq!(
            decoder.decode(&tampered, TokenType::Access).unwrap_err(),
            Rejection::Malformed
        );
    }

    #[test]
    fn test_decode_rejects_garbage() {
        let (_clock, _, decoder) = setup("secret", 0);
        for garbage in ["", "not-a-token", "a.b.c", "....", "Bearer x.y.z"] {
            assert_eq!(
                decoder.decode(garbage, TokenType::Access).unwrap_err(),
                Rejection::Malformed,
                "input {garbage:?}"
            );
            assert!(decoder.acceptance_deadline(garbage).is_none());
        }
    }

    #[test]
    fn test_expiry_follows_injected_clock() {
        let (clock, encoder, decoder) = setup("secret", 0);
        let pair = encoder
            .generate_token_pair(&Subject::new("u-1", "a@example.com"))
            .expect("encode");

        clock.advance(Duration::minutes(14));
        assert!(decoder.decode(&pair.access_token, TokenType::Access).is_ok());

        clock.advance(Duration::minutes(2));
        assert_eq!(
            decoder.decode(&pair.access_token, TokenType::Access).unwrap_err(),
            Rejection::Expired
        );
        assert!(decoder.decode(&pair.refresh_token, TokenType::Refresh).is_ok());

        clock.advance(Duration::hours(24));
        assert_eq!(
            decoder.decode(&pair.refresh_token, TokenType::Refresh).unwrap_err(),
            Rejection::Expired
        );
        assert!(decoder.acceptance_deadline(&pair.refresh_token).is_some());
    }

    #[test]
    fn test_leeway_extends_deadline() {
        let (clock, encoder, decoder) = setup("secret", 30);
        let pair = encoder
            .generate_token_pair(&Subject::new("u-1", "a@example.com"))
            .expect("encode");

        let deadline = decoder
            .acceptance_deadline(&pair.access_token)
            .expect("deadline");
        assert_eq!(
            deadline.timestamp(),
            pair.access_expires_at.timestamp() + 30
        );

        clock.advance(Duration::minutes(15) + Duration::seconds(10));
        assert!(decoder.decode(&pair.access_token, TokenType::Access).is_ok());
        clock.advance(Duration::seconds(30));
        assert!(decoder.decode(&pair.access_token, TokenType::Access).is_err());
    }
}
