//! Session credential lifecycle: issue, verify, refresh, invalidate.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tracing::{debug, info, warn};

use incimap_core::config::AuthConfig;
use incimap_core::error::AppError;
use incimap_core::traits::Clock;
use incimap_core::types::Subject;

use crate::jwt::{JwtDecoder, JwtEncoder, Rejection, TokenPair, TokenType};
use crate::maintenance::PeriodicTask;
use crate::revocation::RevocationStore;

/// The only message callers ever see for a refused credential.
pub const UNAUTHORIZED: &str = "Unauthorized";

/// Mints and verifies session tokens and owns the revocation sweep.
///
/// Verification failures of every kind (malformed, tampered, expired, wrong
/// token type, revoked) collapse into `None`; the specific cause is only
/// logged at debug level.
pub struct CredentialIssuer {
    /// Token signer.
    encoder: JwtEncoder,
    /// Token verifier.
    decoder: JwtDecoder,
    /// Revoked refresh tokens.
    revocations: Arc<RevocationStore>,
    /// Time source shared with the encoder/decoder.
    clock: Arc<dyn Clock>,
    /// Sweep period.
    sweep_interval: Duration,
    /// Running sweep, if started.
    sweeper: Mutex<Option<PeriodicTask>>,
}

impl std::fmt::Debug for CredentialIssuer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialIssuer")
            .field("revoked", &self.revocations.len())
            .field("sweep_interval", &self.sweep_interval)
            .finish()
    }
}

impl CredentialIssuer {
    /// Creates an issuer from auth configuration. The revocation sweep is
    /// not running until [`start_sweeper`](Self::start_sweeper) is called.
    pub fn new(config: &AuthConfig, clock: Arc<dyn Clock>) -> Self {
        let encoder = JwtEncoder::new(config, Arc::clone(&clock));
        let decoder = JwtDecoder::new(config, Arc::clone(&clock));
        let revocations = Arc::new(RevocationStore::new(decoder.clone()));

        Self {
            encoder,
            decoder,
            revocations,
            clock,
            sweep_interval: Duration::from_secs(config.revocation_sweep_interval_seconds),
            sweeper: Mutex::new(None),
        }
    }

    /// Issues a fresh access + refresh pair for `subject`.
    pub fn issue_pair(&self, subject: &Subject) -> Result<TokenPair, AppError> {
        let pair = self.encoder.generate_token_pair(subject)?;
        debug!(subject = %subject.id, "Issued token pair");
        Ok(pair)
    }

    /// Verifies `raw` as a token of type `expected` and returns its subject.
    ///
    /// Refresh tokens are additionally checked against the revocation store.
    pub fn verify(&self, raw: &str, expected: TokenType) -> Option<Subject> {
        match self.check(raw, expected) {
            Ok(subject) => Some(subject),
            Err(reason) => {
                debug!(expected = %expected, reason = reason.as_str(), "Token rejected");
                None
            }
        }
    }

    /// Exchanges a valid, unrevoked refresh token for a new pair.
    ///
    /// The presented refresh token is not revoked; it stays usable until it
    /// expires or is passed to [`invalidate`](Self::invalidate).
    pub fn refresh(&self, raw_refresh: &str) -> Result<TokenPair, AppError> {
        let subject = self
            .verify(raw_refresh, TokenType::Refresh)
            .ok_or_else(|| AppError::authentication(UNAUTHORIZED))?;

        self.issue_pair(&subject)
    }

    /// Revokes a refresh token.
    ///
    /// The string is stored whether or not it decodes, so the call behaves
    /// the same for valid and malformed input.
    pub fn invalidate(&self, raw_refresh: &str) {
        self.revocations.add(raw_refresh);
        debug!(revoked = self.revocations.len(), "Refresh token revoked");
    }

    /// Runs one revocation sweep against the injected clock.
    pub fn sweep_revocations(&self) -> usize {
        self.revocations.sweep(self.clock.now())
    }

    /// Read access to the revocation store, for observability and tests.
    pub fn revocations(&self) -> &RevocationStore {
        &self.revocations
    }

    /// Spawns the periodic revocation sweep. Calling it while a sweep is
    /// already running does nothing.
    pub fn start_sweeper(&self) {
        let mut sweeper = self.sweeper.lock().unwrap_or_else(|e| e.into_inner());
        if sweeper.is_some() {
            warn!("Revocation sweeper already running");
            return;
        }

        let store = Arc::clone(&self.revocations);
        let clock = Arc::clone(&self.clock);
        *sweeper = Some(PeriodicTask::spawn(
            "revocation_sweep",
            self.sweep_interval,
            move || Ok(store.sweep(clock.now())),
        ));

        info!(
            interval_secs = self.sweep_interval.as_secs(),
            "Revocation sweeper started"
        );
    }

    /// Stops the sweep and clears all revocation state. Idempotent.
    pub fn shutdown(&self) {
        if let Some(task) = self
            .sweeper
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take()
        {
            task.shutdown();
            info!("Revocation sweeper stopped");
        }
        self.revocations.clear();
    }

    fn check(&self, raw: &str, expected: TokenType) -> Result<Subject, Rejection> {
        let claims = self.decoder.decode(raw, expected)?;

        if expected == TokenType::Refresh && self.revocations.contains(raw) {
            return Err(Rejection::Revoked);
        }

        Ok(claims.subject())
    }
}

impl Drop for CredentialIssuer {
    fn drop(&mut self) {
        self.shutdown();
    }
}
