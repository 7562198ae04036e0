//! Single-flight call announcement orchestrator.
//!
//! Watches snapshots for a calling turn, runs exactly one announcement
//! episode at a time, and acknowledges the call back to the queue service
//! once per episode.
//!
//! ```text
//! idle → cue-playing → inter-settle → speaking-1 → inter-repeat-pause
//!      → speaking-2 → post-pause → committing → idle
//! ```

use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard};
use std::task::{Context, Poll};

use chrono::Utc;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, instrument};
use uuid::Uuid;

use crate::adapters::QueueApi;
use crate::domain::{EpisodeOutcome, EpisodePhase, PhaseChange, QueueSnapshot, Turn, TurnId};

use super::player::AnnouncementPlayer;
use super::teardown::{CancelSignal, Teardown};

/// Capacity of the phase broadcast channel
const PHASE_CHANNEL_CAPACITY: usize = 64;

/// Announcement orchestrator
#[derive(Clone)]
pub struct CallOrchestrator {
    inner: Arc<Inner>,
}

struct Inner {
    player: AnnouncementPlayer,
    api: Arc<dyn QueueApi>,
    state: Mutex<EpisodeState>,
    phases: broadcast::Sender<PhaseChange>,
    teardown: Teardown,
}

#[derive(Debug, Default)]
struct EpisodeState {
    phase: EpisodePhase,
    episode_id: Option<Uuid>,
    turn: Option<Turn>,
}

/// Handle to a running episode. Awaiting it yields the outcome.
#[derive(Debug)]
pub struct EpisodeHandle {
    pub episode_id: Uuid,
    pub turn: Turn,
    task: JoinHandle<EpisodeOutcome>,
}

impl Future for EpisodeHandle {
    type Output = EpisodeOutcome;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.task)
            .poll(cx)
            .map(|joined| joined.unwrap_or(EpisodeOutcome::Cancelled))
    }
}

impl CallOrchestrator {
    pub fn new(player: AnnouncementPlayer, api: Arc<dyn QueueApi>) -> Self {
        let (phases, _) = broadcast::channel(PHASE_CHANNEL_CAPACITY);
        Self {
            inner: Arc::new(Inner {
                player,
                api,
                state: Mutex::new(EpisodeState::default()),
                phases,
                teardown: Teardown::new(),
            }),
        }
    }

    /// Current phase
    pub fn phase(&self) -> EpisodePhase {
        self.inner.lock().phase
    }

    /// Whether an episode is in flight
    pub fn is_busy(&self) -> bool {
        self.phase().is_active()
    }

    /// Turn currently being announced
    pub fn current_turn(&self) -> Option<Turn> {
        self.inner.lock().turn.clone()
    }

    /// Subscribe to phase transitions
    pub fn subscribe(&self) -> broadcast::Receiver<PhaseChange> {
        self.inner.phases.subscribe()
    }

    /// Feed a snapshot.
    ///
    /// Starts an episode for the lowest-numbered calling turn when idle.
    /// While an episode is active the snapshot is ignored here (callers still
    /// use it for display). Must be called from within a tokio runtime.
    pub fn observe(&self, snapshot: &QueueSnapshot) -> Option<EpisodeHandle> {
        let turn = snapshot.next_calling()?.clone();

        let episode_id = {
            let mut state = self.inner.lock();
            if self.inner.teardown.is_fired() {
                return None;
            }
            if state.phase.is_active() {
                debug!(
                    calling = turn.id,
                    active = ?state.turn.as_ref().map(|t| t.id),
                    "Episode already active, deferring calling turn"
                );
                return None;
            }

            let episode_id = Uuid::new_v4();
            state.phase = EpisodePhase::CuePlaying;
            state.episode_id = Some(episode_id);
            state.turn = Some(turn.clone());
            episode_id
        };

        info!(%episode_id, turn_id = turn.id, patient = %turn.patient_name, "Starting call episode");
        self.inner
            .publish(episode_id, turn.id, EpisodePhase::CuePlaying);

        let inner = Arc::clone(&self.inner);
        let signal = self.inner.teardown.signal();
        let episode_turn = turn.clone();
        let task = tokio::spawn(async move {
            Inner::run_episode(inner, episode_id, episode_turn, signal).await
        });

        Some(EpisodeHandle {
            episode_id,
            turn,
            task,
        })
    }

    /// Tear down: stop audio and speech, cancel pending waits, return to
    /// idle. No acknowledgment is written after this returns.
    pub fn teardown(&self) {
        self.inner.teardown.fire();
        self.inner.player.stop();

        let finished = {
            let mut state = self.inner.lock();
            let finished = state.episode_id.zip(state.turn.as_ref().map(|t| t.id));
            *state = EpisodeState::default();
            finished
        };

        if let Some((episode_id, turn_id)) = finished {
            info!(%episode_id, turn_id, "Display torn down mid-episode");
            self.inner.publish(episode_id, turn_id, EpisodePhase::Idle);
        }
    }
}

impl Inner {
    fn lock(&self) -> MutexGuard<'_, EpisodeState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn publish(&self, episode_id: Uuid, turn_id: TurnId, phase: EpisodePhase) {
        // No subscribers is fine
        let _ = self.phases.send(PhaseChange {
            episode_id,
            turn_id,
            phase,
            at: Utc::now(),
        });
    }

    /// Move `episode_id` to `phase`. Ignored if that episode is no longer current.
    fn transition(&self, episode_id: Uuid, turn_id: TurnId, phase: EpisodePhase) {
        {
            let mut state = self.lock();
            if state.episode_id != Some(episode_id) || state.phase == phase {
                return;
            }
            state.phase = phase;
        }
        debug!(%episode_id, turn_id, %phase, "Episode phase");
        self.publish(episode_id, turn_id, phase);
    }

    /// Return to idle if `episode_id` is still current
    fn finish(&self, episode_id: Uuid, turn_id: TurnId) {
        {
            let mut state = self.lock();
            if state.episode_id != Some(episode_id) {
                return;
            }
            *state = EpisodeState::default();
        }
        self.publish(episode_id, turn_id, EpisodePhase::Idle);
    }

    #[instrument(skip(inner, turn, signal), fields(turn_id = turn.id))]
    async fn run_episode(
        inner: Arc<Inner>,
        episode_id: Uuid,
        turn: Turn,
        mut signal: CancelSignal,
    ) -> EpisodeOutcome {
        // Returns to idle even if this task panics or is aborted
        let _guard = IdleGuard {
            inner: Arc::clone(&inner),
            episode_id,
            turn_id: turn.id,
        };

        let on_phase = |phase: EpisodePhase| inner.transition(episode_id, turn.id, phase);
        let report = inner.player.play(&turn, &mut signal, &on_phase).await;

        if report.cancelled || signal.is_cancelled() {
            info!("Episode cancelled, skipping acknowledgment");
            return EpisodeOutcome::Cancelled;
        }

        inner.transition(episode_id, turn.id, EpisodePhase::Committing);
        match inner.api.acknowledge_call(turn.id).await {
            Ok(()) => {
                info!(
                    repeats_spoken = report.repeats_spoken,
                    "Call acknowledged"
                );
                EpisodeOutcome::Acknowledged
            }
            Err(e) => {
                error!(error = %e, "Failed to acknowledge call, next poll will decide");
                EpisodeOutcome::AckFailed
            }
        }
    }
}

struct IdleGuard {
    inner: Arc<Inner>,
    episode_id: Uuid,
    turn_id: TurnId,
}

impl Drop for IdleGuard {
    fn drop(&mut self) {
        self.inner.finish(self.episode_id, self.turn_id);
    }
}
