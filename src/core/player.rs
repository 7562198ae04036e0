//! Announcement playback for a single turn.
//!
//! Chime, settle, speak twice with a pause in between, trailing pause.
//! Every step is a suspension point raced against teardown. Failures are
//! absorbed: a missing chime or a failed utterance is logged and skipped so
//! a call can never stall.

use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, instrument, warn};

use crate::adapters::{AudioCue, SpeechSynthesizer, Utterance};
use crate::domain::{EpisodePhase, Turn, Voice, ANNOUNCEMENT_REPEATS};

use super::teardown::CancelSignal;
use super::voice::VoiceSelector;

/// Fixed timings and narration parameters
#[derive(Debug, Clone)]
pub struct PlayerSettings {
    /// Chime asset
    pub cue_path: PathBuf,

    /// Delay after the chime
    pub settle: Duration,

    /// Pause between repeats
    pub repeat_pause: Duration,

    /// Pause after the last repeat
    pub trailing: Duration,

    /// Longest wait for the voice catalog when it is empty
    pub voice_wait: Duration,

    /// Speaking rate, slightly slower than normal
    pub rate: f32,

    /// Pitch, slightly raised
    pub pitch: f32,

    /// Volume, slightly reduced
    pub volume: f32,
}

impl Default for PlayerSettings {
    fn default() -> Self {
        Self {
            cue_path: PathBuf::from("airport-sound.mp3"),
            settle: Duration::from_millis(1500),
            repeat_pause: Duration::from_secs(2),
            trailing: Duration::from_secs(3),
            voice_wait: Duration::from_secs(2),
            rate: 0.9,
            pitch: 1.15,
            volume: 0.95,
        }
    }
}

/// What happened during one playback
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlaybackReport {
    /// The chime played to completion
    pub cue_played: bool,

    /// Utterances that completed without error
    pub repeats_spoken: u8,

    /// Voice used for the last utterance
    pub voice: Option<Voice>,

    /// Playback stopped early because of teardown
    pub cancelled: bool,
}

/// Plays the audio/speech sequence for one turn
pub struct AnnouncementPlayer {
    speech: Arc<dyn SpeechSynthesizer>,
    audio: Arc<dyn AudioCue>,
    selector: VoiceSelector,
    settings: PlayerSettings,
}

impl AnnouncementPlayer {
    pub fn new(
        speech: Arc<dyn SpeechSynthesizer>,
        audio: Arc<dyn AudioCue>,
        selector: VoiceSelector,
        settings: PlayerSettings,
    ) -> Self {
        Self {
            speech,
            audio,
            selector,
            settings,
        }
    }

    pub fn settings(&self) -> &PlayerSettings {
        &self.settings
    }

    /// Text spoken for a turn
    pub fn announcement_text(turn: &Turn) -> String {
        format!(
            "Atención, paciente {}, favor de dirigirse al cubículo número {}.",
            turn.patient_name.trim(),
            turn.cubicle_label()
        )
    }

    /// Stop any in-flight cue or utterance immediately
    pub fn stop(&self) {
        self.audio.stop();
        self.speech.cancel();
    }

    /// Run the full sequence for `turn`.
    ///
    /// `on_phase` is called on entry to each phase. Never fails; returns
    /// early with `cancelled` set if teardown fires.
    #[instrument(skip_all, fields(turn_id = turn.id, assigned_turn = turn.assigned_turn))]
    pub async fn play(
        &self,
        turn: &Turn,
        cancel: &mut CancelSignal,
        on_phase: &(dyn Fn(EpisodePhase) + Send + Sync),
    ) -> PlaybackReport {
        let mut report = PlaybackReport::default();
        let text = Self::announcement_text(turn);

        on_phase(EpisodePhase::CuePlaying);
        match self.guarded(cancel, self.audio.play(&self.settings.cue_path)).await {
            None => return report.cancel(),
            Some(Ok(())) => report.cue_played = true,
            Some(Err(e)) => warn!(error = %e, "Chime failed, continuing without it"),
        }

        on_phase(EpisodePhase::Settling);
        if self.pause(cancel, self.settings.settle).await.is_none() {
            return report.cancel();
        }

        for repeat in 1..=ANNOUNCEMENT_REPEATS {
            on_phase(EpisodePhase::Speaking { repeat });

            let Some(voice) = self.resolve_voice(cancel).await else {
                return report.cancel();
            };
            let utterance = self.utterance(&text, voice);

            match self.guarded(cancel, self.speech.speak(&utterance)).await {
                None => return report.cancel(),
                Some(Ok(())) => {
                    report.repeats_spoken += 1;
                    debug!(repeat, "Utterance finished");
                }
                Some(Err(e)) => warn!(repeat, error = %e, "Utterance failed, continuing"),
            }
            report.voice = utterance.voice;

            if repeat < ANNOUNCEMENT_REPEATS {
                on_phase(EpisodePhase::RepeatPause);
                if self.pause(cancel, self.settings.repeat_pause).await.is_none() {
                    return report.cancel();
                }
            }
        }

        on_phase(EpisodePhase::PostPause);
        if self.pause(cancel, self.settings.trailing).await.is_none() {
            return report.cancel();
        }

        info!(
            cue_played = report.cue_played,
            repeats_spoken = report.repeats_spoken,
            "Announcement finished"
        );
        report
    }

    /// Pick a voice for the next utterance.
    ///
    /// Returns `None` on teardown, `Some(None)` when no voice is available
    /// and the engine default should be used.
    async fn resolve_voice(&self, cancel: &mut CancelSignal) -> Option<Option<Voice>> {
        let mut voices = self.speech.voices();

        if voices.is_empty() {
            debug!(wait = ?self.settings.voice_wait, "Voice catalog empty, waiting");
            let wait = tokio::time::timeout(self.settings.voice_wait, self.speech.voices_ready());
            match self.guarded(cancel, wait).await {
                None => return None,
                Some(Err(_)) => debug!("Voice catalog wait timed out, using what is available"),
                Some(Ok(())) => {}
            }
            voices = self.speech.voices();
        }

        Some(self.selector.select(&voices))
    }

    fn utterance(&self, text: &str, voice: Option<Voice>) -> Utterance {
        let lang = voice
            .as_ref()
            .map(|v| v.lang.clone())
            .unwrap_or_else(|| self.selector.locale().to_string());

        Utterance {
            text: text.to_string(),
            voice,
            lang,
            rate: self.settings.rate,
            pitch: self.settings.pitch,
            volume: self.settings.volume,
        }
    }

    async fn pause(&self, cancel: &mut CancelSignal, duration: Duration) -> Option<()> {
        self.guarded(cancel, tokio::time::sleep(duration)).await
    }

    /// Race `fut` against teardown. On teardown the in-flight platform
    /// operation is stopped and `None` is returned.
    async fn guarded<F: Future>(&self, cancel: &mut CancelSignal, fut: F) -> Option<F::Output> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                self.stop();
                None
            }
            out = fut => Some(out),
        }
    }
}

impl PlaybackReport {
    fn cancel(mut self) -> Self {
        self.cancelled = true;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_announcement_text() {
        let turn = Turn::new(1, "  Ana Ruiz ", 7).with_cubicle("3");
        assert_eq!(
            AnnouncementPlayer::announcement_text(&turn),
            "Atención, paciente Ana Ruiz, favor de dirigirse al cubículo número 3."
        );
    }

    #[test]
    fn test_announcement_text_without_cubicle() {
        let turn = Turn::new(2, "Luis Pérez", 8);
        assert!(AnnouncementPlayer::announcement_text(&turn).ends_with("cubículo número uno."));
    }

    #[test]
    fn test_report_cancel() {
        let report = PlaybackReport {
            cue_played: true,
            ..Default::default()
        }
        .cancel();
        assert!(report.cancelled);
        assert!(report.cue_played);
    }
}
