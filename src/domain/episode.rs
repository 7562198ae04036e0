//! Announcement episode phases.
//!
//! An episode is one full call cycle for a single turn: chime, settle,
//! two spoken repeats, trailing pause, acknowledgment.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::turn::TurnId;

/// Number of times the announcement text is spoken per episode
pub const ANNOUNCEMENT_REPEATS: u8 = 2;

/// Phase of the call orchestrator.
///
/// Transitions run strictly in declaration order and wrap back to `Idle`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "phase")]
pub enum EpisodePhase {
    /// No episode active
    #[default]
    Idle,

    /// Playing the chime
    CuePlaying,

    /// Settle delay after the chime
    Settling,

    /// Speaking repeat `n` (1-based)
    Speaking { repeat: u8 },

    /// Pause between repeats
    RepeatPause,

    /// Trailing pause so the patient can react
    PostPause,

    /// Writing the acknowledgment back
    Committing,
}

impl EpisodePhase {
    /// Whether an episode is in flight
    pub fn is_active(&self) -> bool {
        !matches!(self, Self::Idle)
    }
}

impl std::fmt::Display for EpisodePhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::CuePlaying => write!(f, "cue-playing"),
            Self::Settling => write!(f, "inter-settle"),
            Self::Speaking { repeat } => write!(f, "speaking-{}", repeat),
            Self::RepeatPause => write!(f, "inter-repeat-pause"),
            Self::PostPause => write!(f, "post-pause"),
            Self::Committing => write!(f, "committing"),
        }
    }
}

/// A recorded phase transition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhaseChange {
    /// Episode this transition belongs to
    pub episode_id: Uuid,

    /// Turn being announced
    pub turn_id: TurnId,

    /// Phase entered
    pub phase: EpisodePhase,

    /// When the phase was entered
    pub at: DateTime<Utc>,
}

/// How an episode ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EpisodeOutcome {
    /// Acknowledgment accepted by the server
    Acknowledged,

    /// Acknowledgment write failed; the next poll decides whether to retry
    AckFailed,

    /// Display torn down mid-episode; nothing was committed
    Cancelled,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_labels() {
        assert_eq!(EpisodePhase::Idle.to_string(), "idle");
        assert_eq!(EpisodePhase::Speaking { repeat: 2 }.to_string(), "speaking-2");
        assert_eq!(EpisodePhase::Settling.to_string(), "inter-settle");
    }

    #[test]
    fn test_is_active() {
        assert!(!EpisodePhase::Idle.is_active());
        assert!(EpisodePhase::Committing.is_active());
        assert!(EpisodePhase::Speaking { repeat: 1 }.is_active());
    }
}
