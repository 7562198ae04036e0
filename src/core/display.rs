//! Waiting-room display loop.
//!
//! Ties the poller, orchestrator and rotator together on one cooperative
//! event loop and publishes a [`DisplayBoard`] for renderers:
//!
//! ```text
//! poll tick ──▶ QueuePoller ──▶ snapshot ──▶ CallOrchestrator ──▶ episode
//!                                   │                               │
//! rotation ticks ──▶ DisplayRotator ┴──▶ DisplayBoard ◀── phase ────┘
//! ```

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::watch;
use tokio::time::{interval_at, sleep_until, Instant, MissedTickBehavior};
use tracing::{debug, info, instrument};

use crate::domain::{EpisodeOutcome, EpisodePhase, Turn};

use super::orchestrator::{CallOrchestrator, EpisodeHandle};
use super::poller::{PollCadence, PollOutcome, QueuePoller};
use super::rotator::{DisplayList, DisplayRotator};
use super::teardown::CancelSignal;

/// Display loop settings
#[derive(Debug, Clone)]
pub struct DisplaySettings {
    /// Poll interval policy
    pub cadence: PollCadence,

    /// Interval between rotation ticks, per list
    pub rotation: Duration,

    /// Rows shown per list
    pub window_size: usize,

    /// Consecutive poll failures before the error banner shows
    pub error_after_failures: u32,

    /// Satisfaction survey link shown in the footer
    pub survey_url: Option<String>,
}

impl Default for DisplaySettings {
    fn default() -> Self {
        Self {
            cadence: PollCadence::default(),
            rotation: Duration::from_secs(8),
            window_size: super::rotator::DEFAULT_WINDOW_SIZE,
            error_after_failures: 3,
            survey_url: None,
        }
    }
}

/// Everything a renderer needs to draw one frame
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DisplayBoard {
    /// Visible window of waiting turns
    pub waiting: Vec<Turn>,
    pub waiting_total: usize,

    /// Visible window of attending turns
    pub attending: Vec<Turn>,
    pub attending_total: usize,

    /// Turn being announced, if any
    pub calling: Option<Turn>,
    pub phase: EpisodePhase,

    /// Persistent error banner
    pub error: Option<String>,

    pub survey_url: Option<String>,

    /// When the underlying snapshot was fetched
    pub fetched_at: Option<DateTime<Utc>>,
}

/// The waiting-room display
pub struct QueueDisplay {
    poller: Arc<QueuePoller>,
    orchestrator: CallOrchestrator,
    rotator: DisplayRotator,
    settings: DisplaySettings,
    board: watch::Sender<DisplayBoard>,
}

impl QueueDisplay {
    pub fn new(
        poller: Arc<QueuePoller>,
        orchestrator: CallOrchestrator,
        settings: DisplaySettings,
    ) -> Self {
        let (board, _) = watch::channel(DisplayBoard {
            survey_url: settings.survey_url.clone(),
            ..Default::default()
        });
        Self {
            poller,
            orchestrator,
            rotator: DisplayRotator::new(settings.window_size),
            settings,
            board,
        }
    }

    /// Subscribe to board updates
    pub fn board(&self) -> watch::Receiver<DisplayBoard> {
        self.board.subscribe()
    }

    pub fn orchestrator(&self) -> &CallOrchestrator {
        &self.orchestrator
    }

    /// Run until `signal` fires, then tear down the orchestrator.
    #[instrument(skip_all)]
    pub async fn run(mut self, mut signal: CancelSignal) {
        info!("Queue display started");

        let rotation = self.settings.rotation;
        let mut waiting_ticks = interval_at(Instant::now() + rotation, rotation);
        let mut attending_ticks = interval_at(Instant::now() + rotation, rotation);
        waiting_ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);
        attending_ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let mut next_poll = Instant::now();
        let mut episode: Option<EpisodeHandle> = None;
        let mut phases = self.orchestrator.subscribe();

        loop {
            tokio::select! {
                biased;

                _ = signal.cancelled() => break,

                outcome = episode_finished(&mut episode) => {
                    debug!(?outcome, "Episode finished, polling now");
                    episode = None;
                    next_poll = Instant::now();
                    self.publish();
                }

                _ = sleep_until(next_poll) => {
                    tokio::select! {
                        biased;
                        _ = signal.cancelled() => break,
                        _ = self.poll_once(&mut episode) => {}
                    }
                    let has_waiting = self
                        .poller
                        .latest()
                        .map(|s| s.has_waiting())
                        .unwrap_or(false);
                    let interval = self
                        .settings
                        .cadence
                        .interval(has_waiting, self.orchestrator.is_busy());
                    next_poll = Instant::now() + interval;
                }

                Ok(change) = phases.recv() => {
                    debug!(turn_id = change.turn_id, phase = %change.phase, "Phase changed");
                    self.publish();
                }

                _ = waiting_ticks.tick() => self.rotate(DisplayList::Waiting),

                _ = attending_ticks.tick() => self.rotate(DisplayList::Attending),
            }
        }

        self.orchestrator.teardown();
        self.publish();
        info!("Queue display stopped");
    }

    /// One poll: apply the snapshot, feed the orchestrator, refresh the board
    async fn poll_once(&mut self, episode: &mut Option<EpisodeHandle>) {
        // Failures are logged by the poller and surface through the banner
        if let Ok(PollOutcome::Applied(snapshot)) = self.poller.poll().await {
            self.rotator.resize(DisplayList::Waiting, snapshot.waiting.len());
            self.rotator.resize(DisplayList::Attending, snapshot.attending.len());

            if let Some(handle) = self.orchestrator.observe(&snapshot) {
                *episode = Some(handle);
            }
        }
        self.publish();
    }

    fn rotate(&mut self, list: DisplayList) {
        let len = self
            .poller
            .latest()
            .map(|s| match list {
                DisplayList::Waiting => s.waiting.len(),
                DisplayList::Attending => s.attending.len(),
            })
            .unwrap_or(0);

        if self.rotator.tick(list, len, self.orchestrator.is_busy()) {
            self.publish();
        }
    }

    /// Current board
    pub fn render(&self) -> DisplayBoard {
        let snapshot = self.poller.latest();
        let (waiting, waiting_total, attending, attending_total, fetched_at) = match &snapshot {
            Some(s) => (
                self.rotator
                    .visible(DisplayList::Waiting, &s.waiting)
                    .into_iter()
                    .cloned()
                    .collect(),
                s.waiting.len(),
                self.rotator
                    .visible(DisplayList::Attending, &s.attending)
                    .into_iter()
                    .cloned()
                    .collect(),
                s.attending.len(),
                Some(s.fetched_at),
            ),
            None => (Vec::new(), 0, Vec::new(), 0, None),
        };

        DisplayBoard {
            waiting,
            waiting_total,
            attending,
            attending_total,
            calling: self.orchestrator.current_turn(),
            phase: self.orchestrator.phase(),
            error: self.poller.error_banner(self.settings.error_after_failures),
            survey_url: self.settings.survey_url.clone(),
            fetched_at,
        }
    }

    fn publish(&self) {
        let board = self.render();
        self.board.send_if_modified(|current| {
            if *current == board {
                false
            } else {
                *current = board;
                true
            }
        });
    }
}

async fn episode_finished(episode: &mut Option<EpisodeHandle>) -> EpisodeOutcome {
    match episode {
        Some(handle) => handle.await,
        None => std::future::pending().await,
    }
}
