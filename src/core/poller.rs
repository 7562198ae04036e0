//! Queue snapshot polling.
//!
//! Each poll is numbered when issued. A response is applied only if it is
//! newer than the last applied one, so a slow poll finishing after a faster
//! later poll cannot roll the display back.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::adapters::{ApiError, QueueApi};
use crate::domain::QueueSnapshot;

/// Banner shown once polling has failed repeatedly
pub const CONNECTION_ERROR_BANNER: &str = "Connection error. Retrying automatically...";

/// Errors surfaced by [`QueuePoller::poll`]
#[derive(Debug, Error)]
pub enum PollError {
    #[error("Queue fetch failed ({consecutive_failures} in a row): {source}")]
    Fetch {
        #[source]
        source: ApiError,
        consecutive_failures: u32,
    },
}

/// Result of a successful fetch
#[derive(Debug, Clone)]
pub enum PollOutcome {
    /// The snapshot is now the latest
    Applied(Arc<QueueSnapshot>),

    /// A newer poll already landed; this response was discarded
    Stale,
}

/// Poll interval policy
#[derive(Debug, Clone, Copy)]
pub struct PollCadence {
    /// Interval while turns are waiting or an announcement is active
    pub busy: Duration,

    /// Interval otherwise
    pub idle: Duration,
}

impl Default for PollCadence {
    fn default() -> Self {
        Self {
            busy: Duration::from_secs(3),
            idle: Duration::from_secs(8),
        }
    }
}

impl PollCadence {
    /// Interval until the next poll
    pub fn interval(&self, has_waiting: bool, announcing: bool) -> Duration {
        if has_waiting || announcing {
            self.busy
        } else {
            self.idle
        }
    }
}

#[derive(Debug, Default)]
struct PollState {
    latest: Option<Arc<QueueSnapshot>>,
    applied_seq: u64,
    consecutive_failures: u32,
}

/// Fetches queue snapshots and keeps the last known good one
pub struct QueuePoller {
    api: Arc<dyn QueueApi>,
    issued: AtomicU64,
    state: Mutex<PollState>,
}

impl QueuePoller {
    pub fn new(api: Arc<dyn QueueApi>) -> Self {
        Self {
            api,
            issued: AtomicU64::new(0),
            state: Mutex::new(PollState::default()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, PollState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Fetch once.
    ///
    /// On success the snapshot replaces the previous one in a single step.
    /// On failure the last known good snapshot is left untouched.
    pub async fn poll(&self) -> Result<PollOutcome, PollError> {
        let seq = self.issued.fetch_add(1, Ordering::SeqCst) + 1;
        let result = self.api.fetch_queue().await;

        let mut state = self.lock();
        if seq <= state.applied_seq {
            debug!(seq, applied = state.applied_seq, "Discarding stale poll response");
            return Ok(PollOutcome::Stale);
        }

        match result {
            Ok(response) => {
                let snapshot = Arc::new(QueueSnapshot::from_response(response));
                if state.consecutive_failures > 0 {
                    info!(
                        failures = state.consecutive_failures,
                        "Queue service reachable again"
                    );
                }
                state.latest = Some(Arc::clone(&snapshot));
                state.applied_seq = seq;
                state.consecutive_failures = 0;
                Ok(PollOutcome::Applied(snapshot))
            }
            Err(source) => {
                state.consecutive_failures += 1;
                let consecutive_failures = state.consecutive_failures;
                warn!(seq, consecutive_failures, error = %source, "Queue poll failed");
                Err(PollError::Fetch {
                    source,
                    consecutive_failures,
                })
            }
        }
    }

    /// Last successfully applied snapshot
    pub fn latest(&self) -> Option<Arc<QueueSnapshot>> {
        self.lock().latest.clone()
    }

    /// Failures since the last applied snapshot
    pub fn consecutive_failures(&self) -> u32 {
        self.lock().consecutive_failures
    }

    /// Banner text once failures reach `threshold`
    pub fn error_banner(&self, threshold: u32) -> Option<String> {
        (self.consecutive_failures() >= threshold.max(1)).then(|| CONNECTION_ERROR_BANNER.to_string())
    }
}
