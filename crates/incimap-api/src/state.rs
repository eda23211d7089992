//! Application state shared across all handlers and middleware.

use std::sync::Arc;
use std::time::Instant;

use incimap_auth::{AdmissionLimiter, CredentialIssuer};
use incimap_core::config::AppConfig;
use incimap_core::traits::SubjectDirectory;

/// Application state passed to every Axum handler via `State<AppState>`.
///
/// All fields are `Arc`-wrapped for cheap cloning across tasks.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration
    pub config: Arc<AppConfig>,
    /// Session credential issuer
    pub issuer: Arc<CredentialIssuer>,
    /// Admission limiter guarding public write endpoints
    pub admission: Arc<AdmissionLimiter>,
    /// Login credential lookup
    pub directory: Arc<dyn SubjectDirectory>,
    /// Process start, for health reporting
    pub started_at: Instant,
}

impl AppState {
    /// Assembles the state from its parts.
    pub fn new(
        config: Arc<AppConfig>,
        issuer: Arc<CredentialIssuer>,
        admission: Arc<AdmissionLimiter>,
        directory: Arc<dyn SubjectDirectory>,
    ) -> Self {
        Self {
            config,
            issuer,
            admission,
            directory,
            started_at: Instant::now(),
        }
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("issuer", &self.issuer)
            .field("admission", &self.admission)
            .finish()
    }
}
