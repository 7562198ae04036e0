//! Domain types for the queue display.
//!
//! This module contains the core data structures:
//! - Turn: A patient's queue entry
//! - Snapshot: One normalized poll of the queue
//! - Episode: Announcement phases and transitions
//! - Voice: Speech-synthesis voice descriptors

pub mod episode;
pub mod snapshot;
pub mod turn;
pub mod voice;

// Re-export commonly used types
pub use episode::{EpisodeOutcome, EpisodePhase, PhaseChange, ANNOUNCEMENT_REPEATS};
pub use snapshot::{QueueListResponse, QueueSnapshot};
pub use turn::{AttentionKind, Cubicle, Turn, TurnId, TurnStatus, DEFAULT_CUBICLE_NAME};
pub use voice::Voice;
