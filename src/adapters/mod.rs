//! Adapter interfaces for external systems.
//!
//! The display depends on three collaborators it does not implement:
//! the queue service (HTTP), the platform speech engine, and the platform
//! audio player. Each is a trait here so the orchestration logic can run
//! against fakes in tests.

pub mod audio;
pub mod queue_api;
pub mod speech;

use std::path::Path;

use anyhow::Result;
use async_trait::async_trait;

use crate::domain::{QueueListResponse, TurnId, Voice};

pub use audio::CommandAudioCue;
pub use queue_api::{ApiError, HttpQueueApi};
pub use speech::EspeakSynthesizer;

/// Source of truth for queue state
#[async_trait]
pub trait QueueApi: Send + Sync {
    /// `GET /queue/list`
    async fn fetch_queue(&self) -> Result<QueueListResponse, ApiError>;

    /// `PUT /queue/updateCall` with `{ id, isCalled: true }`
    async fn acknowledge_call(&self, id: TurnId) -> Result<(), ApiError>;
}

/// One spoken utterance
#[derive(Debug, Clone, PartialEq)]
pub struct Utterance {
    /// Text to speak
    pub text: String,

    /// Voice to use; `None` lets the engine pick its default for `lang`
    pub voice: Option<Voice>,

    /// Language tag passed when no voice is set
    pub lang: String,

    /// Speaking rate (1.0 = engine default)
    pub rate: f32,

    /// Pitch (1.0 = engine default)
    pub pitch: f32,

    /// Volume (0.0..=1.0)
    pub volume: f32,
}

/// Platform speech synthesis
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// Human-readable engine name
    fn name(&self) -> &str;

    /// Voices currently known to the engine (may be empty until loaded)
    fn voices(&self) -> Vec<Voice>;

    /// Resolves once the voice catalog has loaded
    async fn voices_ready(&self);

    /// Speak an utterance, resolving when it finishes
    async fn speak(&self, utterance: &Utterance) -> Result<()>;

    /// Stop the in-flight utterance, if any
    fn cancel(&self);
}

/// Platform audio playback for short cues
#[async_trait]
pub trait AudioCue: Send + Sync {
    /// Play an audio asset to completion
    async fn play(&self, asset: &Path) -> Result<()>;

    /// Stop the cue that is currently playing, if any
    fn stop(&self);
}
