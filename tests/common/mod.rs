//! Test doubles shared by the integration tests.

#![allow(dead_code)]

use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use callboard::adapters::{ApiError, AudioCue, QueueApi, SpeechSynthesizer, Utterance};
use callboard::core::{AnnouncementPlayer, CallOrchestrator, PlayerSettings, VoiceSelector};
use callboard::domain::{QueueListResponse, QueueSnapshot, Turn, TurnId, Voice};

/// Records utterances; each one takes `speak_time` of (paused) clock time
pub struct FakeSpeech {
    pub voices: Mutex<Vec<Voice>>,
    /// Voices that appear once `voices_ready` is awaited; `None` never loads
    pub late_voices: Mutex<Option<Vec<Voice>>>,
    pub spoken: Mutex<Vec<Utterance>>,
    pub cancels: AtomicUsize,
    pub speak_time: Duration,
    pub fail: bool,
}

impl FakeSpeech {
    pub fn with_voices(voices: Vec<Voice>) -> Self {
        Self {
            voices: Mutex::new(voices),
            late_voices: Mutex::new(None),
            spoken: Mutex::new(Vec::new()),
            cancels: AtomicUsize::new(0),
            speak_time: Duration::from_secs(1),
            fail: false,
        }
    }

    pub fn spanish() -> Self {
        Self::with_voices(vec![
            Voice::new("Jorge", "es-MX"),
            Voice::new("Paulina", "es-MX"),
        ])
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::spanish()
        }
    }

    pub fn spoken(&self) -> Vec<Utterance> {
        self.spoken.lock().unwrap().clone()
    }
}

#[async_trait]
impl SpeechSynthesizer for FakeSpeech {
    fn name(&self) -> &str {
        "fake"
    }

    fn voices(&self) -> Vec<Voice> {
        self.voices.lock().unwrap().clone()
    }

    async fn voices_ready(&self) {
        let late = self.late_voices.lock().unwrap().take();
        match late {
            Some(voices) => *self.voices.lock().unwrap() = voices,
            None => std::future::pending::<()>().await,
        }
    }

    async fn speak(&self, utterance: &Utterance) -> anyhow::Result<()> {
        tokio::time::sleep(self.speak_time).await;
        if self.fail {
            anyhow::bail!("speech engine unavailable");
        }
        self.spoken.lock().unwrap().push(utterance.clone());
        Ok(())
    }

    fn cancel(&self) {
        self.cancels.fetch_add(1, Ordering::SeqCst);
    }
}

/// Counts cue plays
#[derive(Default)]
pub struct FakeAudio {
    pub plays: AtomicUsize,
    pub stops: AtomicUsize,
    pub fail: bool,
}

#[async_trait]
impl AudioCue for FakeAudio {
    async fn play(&self, _asset: &Path) -> anyhow::Result<()> {
        if self.fail {
            anyhow::bail!("Cue asset not found");
        }
        self.plays.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn stop(&self) {
        self.stops.fetch_add(1, Ordering::SeqCst);
    }
}

/// Serves a fixed queue and records acknowledgments
#[derive(Default)]
pub struct FakeQueueApi {
    pub response: Mutex<QueueListResponse>,
    pub acks: Mutex<Vec<TurnId>>,
    pub fetches: AtomicUsize,
    pub fail_fetch: AtomicBool,
    pub fail_ack: bool,
}

impl FakeQueueApi {
    pub fn serving(response: QueueListResponse) -> Self {
        Self {
            response: Mutex::new(response),
            ..Default::default()
        }
    }

    pub fn set_response(&self, response: QueueListResponse) {
        *self.response.lock().unwrap() = response;
    }

    pub fn acks(&self) -> Vec<TurnId> {
        self.acks.lock().unwrap().clone()
    }
}

#[async_trait]
impl QueueApi for FakeQueueApi {
    async fn fetch_queue(&self) -> Result<QueueListResponse, ApiError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if self.fail_fetch.load(Ordering::SeqCst) {
            return Err(ApiError::Status {
                status: 503,
                body: "unavailable".to_string(),
            });
        }
        Ok(self.response.lock().unwrap().clone())
    }

    async fn acknowledge_call(&self, id: TurnId) -> Result<(), ApiError> {
        self.acks.lock().unwrap().push(id);
        if self.fail_ack {
            return Err(ApiError::Status {
                status: 500,
                body: "boom".to_string(),
            });
        }

        // Called turns move on to attending, as the real service does
        let mut response = self.response.lock().unwrap();
        if let Some(pos) = response.in_calling_turns.iter().position(|t| t.id == id) {
            let turn = response.in_calling_turns.remove(pos);
            response.in_progress_turns.push(turn);
        }
        Ok(())
    }
}

pub fn orchestrator(
    speech: Arc<FakeSpeech>,
    audio: Arc<FakeAudio>,
    api: Arc<FakeQueueApi>,
) -> CallOrchestrator {
    let player = AnnouncementPlayer::new(
        speech,
        audio,
        VoiceSelector::default(),
        PlayerSettings::default(),
    );
    CallOrchestrator::new(player, api)
}

pub fn calling(turns: Vec<Turn>) -> QueueListResponse {
    QueueListResponse {
        in_calling_turns: turns,
        ..Default::default()
    }
}

pub fn snapshot(response: QueueListResponse) -> QueueSnapshot {
    QueueSnapshot::from_response(response)
}

pub fn ana() -> Turn {
    Turn::new(1, "Ana Ruiz", 7).with_cubicle("3")
}
