//! Configuration for the queue display.
//!
//! Configuration sources (highest priority first):
//! 1. CLI flags (applied by the caller)
//! 2. Environment variables (CALLBOARD_API_URL, CALLBOARD_CUE_PATH)
//! 3. Config file (.callboard/config.yaml)
//! 4. Defaults
//!
//! Config file discovery:
//! - Searches current directory and parents for .callboard/config.yaml
//! - Falls back to the user config dir (~/.config/callboard/config.yaml)
//! - Relative asset paths are resolved against the directory holding the config

use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::core::{DisplaySettings, PlayerSettings, PollCadence};

/// Global cached configuration (stores Result to handle init errors)
static CONFIG: OnceLock<Result<ResolvedConfig, String>> = OnceLock::new();

const CONFIG_DIR: &str = ".callboard";
const CONFIG_FILE: &str = "config.yaml";

/// Raw config file schema (matches YAML structure)
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ConfigFile {
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub timings: TimingsConfig,
    #[serde(default)]
    pub display: DisplayConfig,
    #[serde(default)]
    pub speech: SpeechConfig,
    #[serde(default)]
    pub audio: AudioConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL of the queue service (e.g. http://host:3000/api)
    pub base_url: String,
    /// Per-request timeout
    pub timeout_seconds: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3000/api".to_string(),
            timeout_seconds: 10,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimingsConfig {
    pub busy_poll_seconds: f64,
    pub idle_poll_seconds: f64,
    pub rotation_seconds: f64,
    pub settle_seconds: f64,
    pub repeat_pause_seconds: f64,
    pub trailing_seconds: f64,
    pub voice_wait_seconds: f64,
}

impl Default for TimingsConfig {
    fn default() -> Self {
        Self {
            busy_poll_seconds: 3.0,
            idle_poll_seconds: 8.0,
            rotation_seconds: 8.0,
            settle_seconds: 1.5,
            repeat_pause_seconds: 2.0,
            trailing_seconds: 3.0,
            voice_wait_seconds: 2.0,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DisplayConfig {
    pub window_size: usize,
    pub error_after_failures: u32,
    pub survey_url: Option<String>,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            window_size: crate::core::DEFAULT_WINDOW_SIZE,
            error_after_failures: 3,
            survey_url: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SpeechConfig {
    pub binary: String,
    pub rate: f32,
    pub pitch: f32,
    pub volume: f32,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            binary: "espeak-ng".to_string(),
            rate: 0.9,
            pitch: 1.15,
            volume: 0.95,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AudioConfig {
    pub binary: String,
    pub cue_path: String,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            binary: "paplay".to_string(),
            cue_path: "airport-sound.mp3".to_string(),
        }
    }
}

/// Resolved configuration ready to build components from
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    /// Queue service base URL
    pub api_url: String,
    /// Per-request timeout
    pub api_timeout: Duration,
    /// Speech engine binary
    pub speech_binary: String,
    /// Audio player binary
    pub audio_binary: String,
    /// Announcement player settings
    pub player: PlayerSettings,
    /// Display loop settings
    pub display: DisplaySettings,
    /// Path to config file (if found)
    pub config_file: Option<PathBuf>,
}

impl ResolvedConfig {
    /// Override the API base URL (e.g. from a CLI flag)
    pub fn with_api_url(mut self, api_url: Option<String>) -> Self {
        if let Some(url) = api_url {
            self.api_url = url;
        }
        self
    }
}

/// Find config file by searching `start` and its parents
fn find_config_file(start: &Path) -> Option<PathBuf> {
    let mut current = start.to_path_buf();

    loop {
        let config_path = current.join(CONFIG_DIR).join(CONFIG_FILE);
        if config_path.exists() {
            return Some(config_path);
        }

        if !current.pop() {
            break;
        }
    }

    None
}

/// Per-user config file, used when no project config is found
fn user_config_file() -> Option<PathBuf> {
    let path = dirs::config_dir()?.join("callboard").join(CONFIG_FILE);
    path.exists().then_some(path)
}

/// Directory that relative paths in `config_path` are resolved against
fn config_base_dir(config_path: &Path) -> Option<PathBuf> {
    let dir = config_path.parent()?;
    if dir.file_name().map_or(false, |name| name == CONFIG_DIR) {
        // Project config: relative to the parent of .callboard/
        dir.parent().map(Path::to_path_buf)
    } else {
        Some(dir.to_path_buf())
    }
}

/// Load and parse config file
fn load_config_file(path: &Path) -> Result<ConfigFile> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    serde_yaml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

/// Resolve a path that may be relative to `base`
fn resolve_path(base: &Path, path_str: &str) -> PathBuf {
    let path = PathBuf::from(path_str);
    if path.is_absolute() {
        path
    } else {
        base.join(path)
    }
}

fn seconds(value: f64, fallback: f64) -> Duration {
    Duration::try_from_secs_f64(value)
        .ok()
        .filter(|d| !d.is_zero())
        .unwrap_or_else(|| Duration::from_secs_f64(fallback))
}

/// Turn a parsed file into resolved settings.
///
/// `base_dir` anchors relative asset paths.
fn resolve(file: ConfigFile, base_dir: &Path, config_file: Option<PathBuf>) -> ResolvedConfig {
    let defaults = TimingsConfig::default();
    let t = &file.timings;

    let player = PlayerSettings {
        cue_path: resolve_path(base_dir, &file.audio.cue_path),
        settle: seconds(t.settle_seconds, defaults.settle_seconds),
        repeat_pause: seconds(t.repeat_pause_seconds, defaults.repeat_pause_seconds),
        trailing: seconds(t.trailing_seconds, defaults.trailing_seconds),
        voice_wait: seconds(t.voice_wait_seconds, defaults.voice_wait_seconds),
        rate: file.speech.rate,
        pitch: file.speech.pitch,
        volume: file.speech.volume.clamp(0.0, 1.0),
    };

    let display = DisplaySettings {
        cadence: PollCadence {
            busy: seconds(t.busy_poll_seconds, defaults.busy_poll_seconds),
            idle: seconds(t.idle_poll_seconds, defaults.idle_poll_seconds),
        },
        rotation: seconds(t.rotation_seconds, defaults.rotation_seconds),
        window_size: file.display.window_size.max(1),
        error_after_failures: file.display.error_after_failures,
        survey_url: file.display.survey_url,
    };

    ResolvedConfig {
        api_url: file.api.base_url,
        api_timeout: Duration::from_secs(file.api.timeout_seconds.max(1)),
        speech_binary: file.speech.binary,
        audio_binary: file.audio.binary,
        player,
        display,
        config_file,
    }
}

/// Load configuration from all sources
fn load_config() -> Result<ResolvedConfig> {
    let cwd = std::env::current_dir().context("Failed to determine current directory")?;
    let config_file = find_config_file(&cwd).or_else(user_config_file);

    let (file, base_dir) = match config_file {
        Some(ref config_path) => {
            let file = load_config_file(config_path)?;
            let base_dir = config_base_dir(config_path).unwrap_or_else(|| cwd.clone());
            (file, base_dir)
        }
        None => (ConfigFile::default(), cwd.clone()),
    };

    let mut config = resolve(file, &base_dir, config_file);

    if let Ok(url) = std::env::var("CALLBOARD_API_URL") {
        config.api_url = url;
    }
    if let Ok(cue) = std::env::var("CALLBOARD_CUE_PATH") {
        config.player.cue_path = PathBuf::from(cue);
    }

    Ok(config)
}

/// Get the global configuration (loads once, then cached)
pub fn config() -> Result<&'static ResolvedConfig> {
    let result = CONFIG.get_or_init(|| load_config().map_err(|e| e.to_string()));

    match result {
        Ok(config) => Ok(config),
        Err(e) => anyhow::bail!("{}", e),
    }
}

/// Force reload configuration (bypasses the cache)
pub fn reload_config() -> Result<ResolvedConfig> {
    load_config()
}
