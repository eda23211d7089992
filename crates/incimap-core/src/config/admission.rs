//! Admission limiter configuration.

use serde::{Deserialize, Serialize};

/// Settings for the per-client admission window on public write endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdmissionConfig {
    /// Minimum spacing between two admitted requests from one client, in seconds.
    #[serde(default = "default_window")]
    pub window_seconds: u64,
    /// Period of the stale-record cleanup sweep, in seconds.
    #[serde(default = "default_cleanup_interval")]
    pub cleanup_interval_seconds: u64,
    /// Use the first `X-Forwarded-For` hop as the client key instead of the
    /// peer address. Only enable behind a trusted reverse proxy.
    #[serde(default)]
    pub trust_forwarded_for: bool,
}

impl Default for AdmissionConfig {
    fn default() -> Self {
        Self {
            window_seconds: default_window(),
            cleanup_interval_seconds: default_cleanup_interval(),
            trust_forwarded_for: false,
        }
    }
}

fn default_window() -> u64 {
    1
}

fn default_cleanup_interval() -> u64 {
    20
}
