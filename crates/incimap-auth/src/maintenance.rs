//! Owned background task that runs a maintenance job on a fixed period.

use std::panic::AssertUnwindSafe;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info};

use incimap_core::result::AppResult;

/// Handle to a spawned periodic job.
///
/// The job runs once per `period` until [`shutdown`](Self::shutdown) is
/// called or the handle is dropped. A tick that returns an error or panics
/// is logged and the next tick runs as usual.
pub struct PeriodicTask {
    /// Task label for logs.
    name: &'static str,
    /// Cancellation signal.
    shutdown_tx: watch::Sender<bool>,
    /// The spawned loop.
    handle: JoinHandle<()>,
}

impl std::fmt::Debug for PeriodicTask {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PeriodicTask")
            .field("name", &self.name)
            .field("finished", &self.handle.is_finished())
            .finish()
    }
}

impl PeriodicTask {
    /// Spawns `job` on the current Tokio runtime.
    ///
    /// The first run happens one full `period` after spawning. `job` returns
    /// the number of entries it purged.
    pub fn spawn<F>(name: &'static str, period: Duration, mut job: F) -> Self
    where
        F: FnMut() -> AppResult<usize> + Send + 'static,
    {
        let period = period.max(Duration::from_millis(1));
        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        match std::panic::catch_unwind(AssertUnwindSafe(&mut job)) {
                            Ok(Ok(0)) => debug!(task = name, "Nothing to purge"),
                            Ok(Ok(purged)) => info!(task = name, purged, "Purged stale entries"),
                            Ok(Err(e)) => error!(task = name, error = %e, "Maintenance tick failed"),
                            Err(_) => error!(task = name, "Maintenance tick panicked"),
                        }
                    }
                    changed = shutdown_rx.changed() => {
                        if changed.is_err() || *shutdown_rx.borrow() {
                            break;
                        }
                    }
                }
            }

            debug!(task = name, "Periodic task stopped");
        });

        debug!(task = name, period_ms = period.as_millis() as u64, "Periodic task started");

        Self {
            name,
            shutdown_tx,
            handle,
        }
    }

    /// Stops the task. Safe to call more than once.
    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(true);
        self.handle.abort();
    }

    /// Returns `true` once the loop has exited.
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl Drop for PeriodicTask {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
