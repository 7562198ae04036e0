//! espeak-ng speech adapter.
//!
//! Shells out to the `espeak-ng` binary. The voice catalog is read lazily
//! from `espeak-ng --voices` the first time it is requested.

use std::process::Stdio;
use std::sync::RwLock;

use anyhow::{Context, Result};
use async_trait::async_trait;
use tokio::process::Command;
use tokio::sync::{Notify, OnceCell};
use tracing::{debug, warn};

use super::{SpeechSynthesizer, Utterance};
use crate::domain::Voice;

/// espeak-ng defaults that the utterance parameters scale
const BASE_WORDS_PER_MINUTE: f32 = 175.0;
const BASE_PITCH: f32 = 50.0;
const BASE_AMPLITUDE: f32 = 100.0;

/// Speech synthesizer backed by the espeak-ng CLI
pub struct EspeakSynthesizer {
    /// Path to the espeak-ng binary
    binary_path: String,

    /// Voice catalog, empty until loaded
    voices: RwLock<Vec<Voice>>,

    /// Guards the one-time catalog load
    loaded: OnceCell<()>,

    /// Wakes an in-flight `speak` so it can kill its child
    cancel: Notify,
}

impl Default for EspeakSynthesizer {
    fn default() -> Self {
        Self::new("espeak-ng")
    }
}

impl EspeakSynthesizer {
    pub fn new(binary_path: impl Into<String>) -> Self {
        Self {
            binary_path: binary_path.into(),
            voices: RwLock::new(Vec::new()),
            loaded: OnceCell::new(),
            cancel: Notify::new(),
        }
    }

    async fn load_voices(&self) -> Result<Vec<Voice>> {
        let output = Command::new(&self.binary_path)
            .arg("--voices")
            .output()
            .await
            .with_context(|| format!("Failed to run {} --voices", self.binary_path))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            anyhow::bail!("Voice listing failed: {}", stderr.trim());
        }

        Ok(parse_voice_list(&String::from_utf8_lossy(&output.stdout)))
    }

    fn build_args(utterance: &Utterance) -> Vec<String> {
        let voice = utterance
            .voice
            .as_ref()
            .map(|v| v.name.clone())
            .unwrap_or_else(|| utterance.lang.to_ascii_lowercase());

        let speed = (BASE_WORDS_PER_MINUTE * utterance.rate).round().clamp(80.0, 450.0);
        let pitch = (BASE_PITCH * utterance.pitch).round().clamp(0.0, 99.0);
        let amplitude = (BASE_AMPLITUDE * utterance.volume).round().clamp(0.0, 200.0);

        vec![
            "-v".to_string(),
            voice,
            "-s".to_string(),
            format!("{}", speed as u32),
            "-p".to_string(),
            format!("{}", pitch as u32),
            "-a".to_string(),
            format!("{}", amplitude as u32),
            utterance.text.clone(),
        ]
    }
}

/// Parse the table printed by `espeak-ng --voices`.
///
/// ```text
/// Pty Language       Age/Gender VoiceName          File                 Other Languages
///  5  es-419          --/M      Spanish_(Latin_America) roa/es-419
/// ```
fn parse_voice_list(stdout: &str) -> Vec<Voice> {
    stdout
        .lines()
        .skip(1)
        .filter_map(|line| {
            let mut cols = line.split_whitespace();
            let _priority = cols.next()?;
            let lang = cols.next()?;
            let _age_gender = cols.next()?;
            let name = cols.next()?;
            Some(Voice::new(name, lang))
        })
        .collect()
}

#[async_trait]
impl SpeechSynthesizer for EspeakSynthesizer {
    fn name(&self) -> &str {
        "espeak-ng"
    }

    fn voices(&self) -> Vec<Voice> {
        self.voices.read().map(|v| v.clone()).unwrap_or_default()
    }

    async fn voices_ready(&self) {
        self.loaded
            .get_or_init(|| async {
                match self.load_voices().await {
                    Ok(voices) => {
                        debug!(count = voices.len(), "Loaded speech voices");
                        if let Ok(mut slot) = self.voices.write() {
                            *slot = voices;
                        }
                    }
                    Err(e) => warn!(error = %e, "Failed to load speech voices"),
                }
            })
            .await;
    }

    async fn speak(&self, utterance: &Utterance) -> Result<()> {
        let mut child = Command::new(&self.binary_path)
            .args(Self::build_args(utterance))
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .with_context(|| format!("Failed to spawn {}", self.binary_path))?;

        tokio::select! {
            status = child.wait() => {
                let status = status.context("Failed to wait for speech process")?;
                if !status.success() {
                    anyhow::bail!("Speech process exited with {}", status);
                }
                Ok(())
            }
            _ = self.cancel.notified() => {
                let _ = child.kill().await;
                anyhow::bail!("Speech cancelled")
            }
        }
    }

    fn cancel(&self) {
        self.cancel.notify_waiters();
    }
}
