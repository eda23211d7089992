//! Per-client minimum spacing between requests.
//!
//! Each client key holds a single timestamp: the last admitted request. A
//! new request is admitted once the configured window has elapsed since
//! then. There is no burst allowance.
//!
//! `is_allowed` and `record_request` are separate calls and are not atomic
//! together. Two concurrent requests from one client can both observe
//! `is_allowed == true` before either records; the window is a best-effort
//! throttle, not a hard quota.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tracing::{debug, info, warn};

use incimap_core::config::AdmissionConfig;
use incimap_core::error::AppError;
use incimap_core::traits::Clock;

use crate::maintenance::PeriodicTask;

/// Sliding single-slot admission limiter keyed by client address.
pub struct AdmissionLimiter {
    /// Client key → last admitted request.
    records: Arc<DashMap<String, DateTime<Utc>>>,
    /// Minimum spacing between admitted requests.
    window: chrono::Duration,
    /// Time source.
    clock: Arc<dyn Clock>,
    /// Cleanup sweep period.
    cleanup_interval: Duration,
    /// Running cleanup sweep, if started.
    sweeper: Mutex<Option<PeriodicTask>>,
}

impl std::fmt::Debug for AdmissionLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdmissionLimiter")
            .field("window", &self.window)
            .field("tracked", &self.records.len())
            .finish()
    }
}

impl AdmissionLimiter {
    /// Creates a limiter from admission configuration.
    pub fn new(config: &AdmissionConfig, clock: Arc<dyn Clock>) -> Self {
        Self::with_window(
            Duration::from_secs(config.window_seconds),
            Duration::from_secs(config.cleanup_interval_seconds),
            clock,
        )
    }

    /// Creates a limiter with explicit window and cleanup period.
    pub fn with_window(window: Duration, cleanup_interval: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            records: Arc::new(DashMap::new()),
            window: chrono::Duration::from_std(window).unwrap_or(chrono::Duration::MAX),
            clock,
            cleanup_interval,
            sweeper: Mutex::new(None),
        }
    }

    /// Returns `true` if `client` has no record or its window has elapsed.
    pub fn is_allowed(&self, client: &str) -> bool {
        let now = self.clock.now();
        match self.records.get(client) {
            Some(last) => now - *last >= self.window,
            None => true,
        }
    }

    /// Stamps the current time against `client`, replacing any prior stamp.
    ///
    /// Call only after a successful [`is_allowed`](Self::is_allowed).
    pub fn record_request(&self, client: &str) {
        self.records.insert(client.to_string(), self.clock.now());
    }

    /// Seconds until `client` is admitted again, rounded up; `0` when it
    /// already is or was never seen.
    pub fn remaining_time(&self, client: &str) -> u64 {
        let Some(last) = self.records.get(client).map(|r| *r) else {
            return 0;
        };

        let remaining_ms = (self.window - (self.clock.now() - last)).num_milliseconds();
        if remaining_ms <= 0 {
            0
        } else {
            (remaining_ms as u64).div_ceil(1000)
        }
    }

    /// Admission check in `Result` form: `Err` carries the remaining wait.
    /// Does not record.
    pub fn check(&self, client: &str) -> Result<(), AppError> {
        if self.is_allowed(client) {
            return Ok(());
        }
        let retry_after = self.remaining_time(client).max(1);
        debug!(client, retry_after, "Admission refused");
        Err(AppError::rate_limited(retry_after))
    }

    /// Drops every record whose window has elapsed at `now`.
    ///
    /// Returns the number of records removed.
    pub fn cleanup(&self, now: DateTime<Utc>) -> usize {
        purge_elapsed(&self.records, self.window, now)
    }

    /// Number of clients currently tracked.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns `true` when no client is tracked.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Spawns the periodic cleanup sweep. Calling it while one is already
    /// running does nothing.
    pub fn start_cleanup(&self) {
        let mut sweeper = self.sweeper.lock().unwrap_or_else(|e| e.into_inner());
        if sweeper.is_some() {
            warn!("Admission cleanup already running");
            return;
        }

        let records = Arc::clone(&self.records);
        let clock = Arc::clone(&self.clock);
        let window = self.window;
        *sweeper = Some(PeriodicTask::spawn(
            "admission_cleanup",
            self.cleanup_interval,
            move || Ok(purge_elapsed(&records, window, clock.now())),
        ));

        info!(
            interval_secs = self.cleanup_interval.as_secs(),
            window_ms = self.window.num_milliseconds(),
            "Admission cleanup started"
        );
    }

    /// Stops the cleanup sweep and forgets every client. Idempotent.
    pub fn shutdown(&self) {
        if let Some(task) = self
            .sweeper
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take()
        {
            task.shutdown();
            info!("Admission cleanup stopped");
        }
        self.records.clear();
    }
}

impl Drop for AdmissionLimiter {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn purge_elapsed(
    records: &DashMap<String, DateTime<Utc>>,
    window: chrono::Duration,
    now: DateTime<Utc>,
) -> usize {
    let before = records.len();
    records.retain(|_, last| now - *last < window);
    before.saturating_sub(records.len())
}

#[cfg(test)]
mod tests {
    use chrono::Duration as ChronoDuration;
    use incimap_core::error::ErrorKind;
    use incimap_core::traits::ManualClock;

    use super::*;

    fn limiter(window_ms: u64) -> (ManualClock, AdmissionLimiter) {
        let clock = ManualClock::starting_now();
        let limiter = AdmissionLimiter::with_window(
            Duration::from_millis(window_ms),
            Duration::from_secs(20),
            Arc::new(clock.clone()),
        );
        (clock, limiter)
    }

    #[test]
    fn test_unseen_key_is_allowed() {
        let (_clock, limiter) = limiter(1_000);
        assert!(limiter.is_allowed("10.0.0.1"));
        assert_eq!(limiter.remaining_time("10.0.0.1"), 0);
        assert!(limiter.check("10.0.0.1").is_ok());
    }

    #[test]
    fn test_window_scenario() {
        let (clock, limiter) = limiter(1_000);
        let key = "10.0.0.1";

        assert!(limiter.is_allowed(key));
        limiter.record_request(key);

        assert!(!limiter.is_allowed(key));
        let remaining = limiter.remaining_time(key);
        assert!(remaining > 0 && remaining <= 1, "remaining = {remaining}");

        clock.advance(ChronoDuration::milliseconds(1_100));
        assert!(limiter.is_allowed(key));
        assert_eq!(limiter.remaining_time(key), 0);
    }

    #[test]
    fn test_window_boundary_is_inclusive() {
        let (clock, limiter) = limiter(1_000);
        limiter.record_request("k");

        clock.advance(ChronoDuration::milliseconds(999));
        assert!(!limiter.is_allowed("k"));
        clock.advance(ChronoDuration::milliseconds(1));
        assert!(limiter.is_allowed("k"));
    }

    #[test]
    fn test_remaining_time_counts_down() {
        let (clock, limiter) = limiter(10_000);
        limiter.record_request("k");

        let mut previous = limiter.remaining_time("k");
        assert_eq!(previous, 10);
        for _ in 0..12 {
            clock.advance(ChronoDuration::milliseconds(900));
            let current = limiter.remaining_time("k");
            assert!(current <= previous);
            previous = current;
        }
        assert_eq!(previous, 0);
    }

    #[test]
    fn test_remaining_time_rounds_up() {
        let (clock, limiter) = limiter(10_000);
        limiter.record_request("k");
        clock.advance(ChronoDuration::milliseconds(8_500));
        assert_eq!(limiter.remaining_time("k"), 2);
    }

    #[test]
    fn test_keys_are_independent() {
        let (_clock, limiter) = limiter(1_000);
        limiter.record_request("k1");
        assert!(!limiter.is_allowed("k1"));
        assert!(limiter.is_allowed("k2"));
        assert_eq!(limiter.remaining_time("k2"), 0);
    }

    #[test]
    fn test_record_overwrites_previous_stamp() {
        let (clock, limiter) = limiter(1_000);
        limiter.record_request("k");
        clock.advance(ChronoDuration::milliseconds(900));
        limiter.record_request("k");
        clock.advance(ChronoDuration::milliseconds(900));
        assert!(!limiter.is_allowed("k"));
    }

    #[test]
    fn test_check_reports_wait() {
        let (_clock, limiter) = limiter(5_000);
        limiter.record_request("k");
        let err = limiter.check("k").unwrap_err();
        assert_eq!(err.kind, ErrorKind::RateLimit);
        assert_eq!(err.retry_after_seconds, Some(5));
    }

    #[test]
    fn test_cleanup_purges_only_elapsed() {
        let (clock, limiter) = limiter(1_000);
        assert_eq!(limiter.cleanup(clock.now()), 0);

        limiter.record_request("old");
        clock.advance(ChronoDuration::milliseconds(600));
        limiter.record_request("new");
        clock.advance(ChronoDuration::milliseconds(600));

        assert_eq!(limiter.cleanup(clock.now()), 1);
        assert_eq!(limiter.len(), 1);
        assert!(!limiter.is_allowed("new"));
        assert!(limiter.is_allowed("old"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_background_cleanup_and_shutdown() {
        let (clock, limiter) = limiter(1_000);
        limiter.start_cleanup();
        limiter.start_cleanup();

        limiter.record_request("a");
        limiter.record_request("b");
        clock.advance(ChronoDuration::seconds(2));

        tokio::time::sleep(Duration::from_secs(21)).await;
        assert!(limiter.is_empty());

        limiter.record_request("c");
        limiter.shutdown();
        limiter.shutdown();
        assert!(limiter.is_empty());
        assert!(limiter.is_allowed("c"));
    }
}
