//! In-memory denylist of raw token strings.

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tracing::debug;

use crate::jwt::JwtDecoder;

/// Records raw encoded tokens that must be refused even though they have not
/// expired yet.
///
/// Each entry remembers the last instant its token could still verify. A
/// sweep drops entries past that instant, and entries that never decoded
/// with this store's secret, since neither can pass verification anyway.
/// Nothing is persisted beyond process lifetime.
#[derive(Debug)]
pub struct RevocationStore {
    /// Raw token → acceptance deadline (`None` if undecodable).
    entries: DashMap<String, Option<DateTime<Utc>>>,
    /// Decoder sharing the issuer's signing secret.
    decoder: JwtDecoder,
}

impl RevocationStore {
    /// Creates an empty store that decodes with `decoder`'s secret.
    pub fn new(decoder: JwtDecoder) -> Self {
        Self {
            entries: DashMap::new(),
            decoder,
        }
    }

    /// Adds a raw token. Adding the same string twice is a no-op.
    pub fn add(&self, raw: &str) {
        if self.entries.contains_key(raw) {
            return;
        }
        let deadline = self.decoder.acceptance_deadline(raw);
        self.entries.entry(raw.to_string()).or_insert(deadline);
    }

    /// Returns `true` if the raw token has been revoked.
    pub fn contains(&self, raw: &str) -> bool {
        self.entries.contains_key(raw)
    }

    /// Removes every entry whose token can no longer verify at `now`.
    ///
    /// Returns the number of entries removed.
    pub fn sweep(&self, now: DateTime<Utc>) -> usize {
        let before = self.entries.len();
        self.entries
            .retain(|_, deadline| matches!(deadline, Some(until) if *until > now));
        let purged = before.saturating_sub(self.entries.len());

        debug!(purged, remaining = self.entries.len(), "Revocation sweep");
        purged
    }

    /// Drops all entries.
    pub fn clear(&self) {
        self.entries.clear();
    }

    /// Number of revoked tokens currently held.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` when nothing is revoked.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
