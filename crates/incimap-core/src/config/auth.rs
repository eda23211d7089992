//! Authentication configuration.

use serde::{Deserialize, Serialize};

/// Placeholder secret used when none is configured. The server logs a
/// warning at startup when it is still in effect.
pub const DEFAULT_JWT_SECRET: &str = "CHANGE_ME_IN_PRODUCTION";

/// Credential issuance, verification, and revocation configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Secret key for token signing (HMAC-SHA256).
    #[serde(default = "default_jwt_secret")]
    pub jwt_secret: String,
    /// Access token TTL in minutes.
    #[serde(default = "default_access_ttl")]
    pub access_ttl_minutes: u64,
    /// Refresh token TTL in hours.
    #[serde(default = "default_refresh_ttl")]
    pub refresh_ttl_hours: u64,
    /// Period of the revocation store sweep, in seconds.
    #[serde(default = "default_sweep_interval")]
    pub revocation_sweep_interval_seconds: u64,
    /// Clock-skew tolerance applied to `exp`, in seconds.
    #[serde(default)]
    pub leeway_seconds: u64,
    /// Accounts served by the built-in in-memory subject directory.
    #[serde(default)]
    pub users: Vec<SeededUser>,
}

impl AuthConfig {
    /// Returns `true` while the placeholder signing secret is in use.
    pub fn uses_default_secret(&self) -> bool {
        self.jwt_secret == DEFAULT_JWT_SECRET
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: default_jwt_secret(),
            access_ttl_minutes: default_access_ttl(),
            refresh_ttl_hours: default_refresh_ttl(),
            revocation_sweep_interval_seconds: default_sweep_interval(),
            leeway_seconds: 0,
            users: Vec::new(),
        }
    }
}

/// One account entry for the in-memory subject directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeededUser {
    /// Opaque user identifier.
    pub id: String,
    /// Login email.
    pub email: String,
    /// Argon2 PHC-format password hash.
    pub password_hash: String,
}

fn default_jwt_secret() -> String {
    DEFAULT_JWT_SECRET.to_string()
}

fn default_access_ttl() -> u64 {
    15
}

fn default_refresh_ttl() -> u64 {
    24
}

fn default_sweep_interval() -> u64 {
    15 * 60
}
