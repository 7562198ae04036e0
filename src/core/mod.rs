//! Core display logic.
//!
//! This module contains:
//! - VoiceSelector: Deterministic speech voice choice
//! - AnnouncementPlayer: Chime + spoken repeats for one turn
//! - CallOrchestrator: Single-flight announcement state machine
//! - QueuePoller: Snapshot fetching with stale-response discard
//! - DisplayRotator: Rotating windows over long lists
//! - QueueDisplay: The event loop that wires them together

pub mod display;
pub mod orchestrator;
pub mod player;
pub mod poller;
pub mod rotator;
pub mod teardown;
pub mod voice;

// Re-export commonly used types
pub use display::{DisplayBoard, DisplaySettings, QueueDisplay};
pub use orchestrator::{CallOrchestrator, EpisodeHandle};
pub use player::{AnnouncementPlayer, PlaybackReport, PlayerSettings};
pub use poller::{PollCadence, PollError, PollOutcome, QueuePoller, CONNECTION_ERROR_BANNER};
pub use rotator::{DisplayList, DisplayRotator, RotationCursor, DEFAULT_WINDOW_SIZE};
pub use teardown::{CancelSignal, Teardown};
pub use voice::{VoiceSelector, VoiceTables, SPANISH_MX};
