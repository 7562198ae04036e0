//! Subprocess audio cue player.
//!
//! Plays a local asset with a command-line player (`paplay`, `aplay`,
//! `afplay`, ...) and waits for it to finish.

use std::path::Path;
use std::process::Stdio;

use anyhow::{Context, Result};
use async_trait::async_trait;
use tokio::process::Command;
use tokio::sync::Notify;

use super::AudioCue;

/// Audio cue player that shells out to a CLI player
pub struct CommandAudioCue {
    /// Player binary (default: "paplay")
    binary_path: String,

    /// Wakes an in-flight `play` so it can kill its child
    stop: Notify,
}

impl Default for CommandAudioCue {
    fn default() -> Self {
        Self::new("paplay")
    }
}

impl CommandAudioCue {
    pub fn new(binary_path: impl Into<String>) -> Self {
        Self {
            binary_path: binary_path.into(),
            stop: Notify::new(),
        }
    }
}

#[async_trait]
impl AudioCue for CommandAudioCue {
    async fn play(&self, asset: &Path) -> Result<()> {
        if !asset.is_file() {
            anyhow::bail!("Cue asset not found: {}", asset.display());
        }

        let mut child = Command::new(&self.binary_path)
            .arg(asset)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .with_context(|| format!("Failed to spawn audio player '{}'", self.binary_path))?;

        tokio::select! {
            status = child.wait() => {
                let status = status.context("Failed to wait for audio player")?;
                if !status.success() {
                    anyhow::bail!("Audio player exited with {}", status);
                }
                Ok(())
            }
            _ = self.stop.notified() => {
                let _ = child.kill().await;
                anyhow::bail!("Cue stopped")
            }
        }
    }

    fn stop(&self) {
        self.stop.notify_waiters();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_asset_is_an_error() {
        let cue = CommandAudioCue::default();
        let err = cue.play(Path::new("/nonexistent/chime.mp3")).await.unwrap_err();
        assert!(err.to_string().contains("Cue asset not found"));
    }

    #[tokio::test]
    async fn test_missing_player_is_an_error() {
        let asset = tempfile::NamedTempFile::new().unwrap();
        let cue = CommandAudioCue::new("/nonexistent/player");
        assert!(cue.play(asset.path()).await.is_err());
    }
}
