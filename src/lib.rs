//! callboard - Phlebotomy queue display and patient call announcer
//!
//! Drives a waiting-room screen for a blood-draw lab: polls the queue
//! service, rotates long lists through a fixed window, and announces each
//! called patient with a chime and two spoken repeats before acknowledging
//! the call back to the service.
//!
//! # Architecture
//!
//! The display is a single cooperative event loop:
//! - The poller fetches snapshots and discards stale responses
//! - The orchestrator runs at most one announcement episode at a time
//! - Each episode acknowledges its call exactly once, unless torn down
//!
//! # Modules
//!
//! - `adapters`: External collaborators (queue HTTP API, speech, audio)
//! - `core`: Display logic (poller, orchestrator, player, rotator)
//! - `domain`: Data structures (Turn, QueueSnapshot, EpisodePhase)
//! - `config`: Layered configuration
//! - `cli`: Command-line interface
//!
//! # Usage
//!
//! ```bash
//! # Run the display against a queue service
//! callboard --api-url http://queue.local:3000/api run
//!
//! # Print the current queue
//! callboard snapshot
//!
//! # Try an announcement
//! callboard announce "Ana Ruiz" --cubicle 3
//! ```

pub mod adapters;
pub mod cli;
pub mod config;
pub mod core;
pub mod domain;

// Re-export main types at crate root for convenience
pub use adapters::{ApiError, AudioCue, QueueApi, SpeechSynthesizer, Utterance};
pub use core::{CallOrchestrator, DisplayBoard, QueueDisplay, QueuePoller, Teardown};
pub use domain::{EpisodePhase, QueueSnapshot, Turn, TurnStatus};
