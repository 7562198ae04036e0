//! Command-line interface for callboard.
//!
//! Provides commands for running the waiting-room display, inspecting the
//! queue service, and testing the announcement pipeline on a single name.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;

use crate::adapters::{
    CommandAudioCue, EspeakSynthesizer, HttpQueueApi, QueueApi, SpeechSynthesizer,
};
use crate::config::{self, ResolvedConfig};
use crate::core::{
    AnnouncementPlayer, CallOrchestrator, DisplayBoard, QueueDisplay, QueuePoller, Teardown,
    VoiceSelector,
};
use crate::domain::{AttentionKind, EpisodePhase, QueueSnapshot, Turn};

/// callboard - Phlebotomy queue display and patient call announcer
#[derive(Parser, Debug)]
#[command(name = "callboard")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Queue service base URL (overrides config and CALLBOARD_API_URL)
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the waiting-room display until Ctrl-C
    Run {
        /// Print each board as a JSON line instead of a text frame
        #[arg(long)]
        json: bool,
    },

    /// Fetch the queue once and print it
    Snapshot {
        /// Print the normalized snapshot as JSON
        #[arg(long)]
        json: bool,
    },

    /// List speech voices and show which one would be used
    Voices,

    /// Play one announcement without acknowledging anything
    Announce {
        /// Patient name to announce
        name: String,

        /// Cubicle to direct the patient to
        #[arg(short, long)]
        cubicle: Option<String>,
    },

    /// Show resolved configuration (debug)
    Config,
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(self) -> Result<()> {
        let cfg = config::config()?.clone().with_api_url(self.api_url);

        match self.command {
            Commands::Run { json } => run_display(&cfg, json).await,
            Commands::Snapshot { json } => show_snapshot(&cfg, json).await,
            Commands::Voices => list_voices(&cfg).await,
            Commands::Announce { name, cubicle } => announce(&cfg, name, cubicle).await,
            Commands::Config => {
                show_config(&cfg);
                Ok(())
            }
        }
    }
}

fn queue_api(cfg: &ResolvedConfig) -> Result<HttpQueueApi> {
    HttpQueueApi::new(&cfg.api_url, cfg.api_timeout)
        .with_context(|| format!("Failed to build queue client for {}", cfg.api_url))
}

fn player(cfg: &ResolvedConfig, speech: Arc<EspeakSynthesizer>) -> AnnouncementPlayer {
    AnnouncementPlayer::new(
        speech,
        Arc::new(CommandAudioCue::new(cfg.audio_binary.clone())),
        VoiceSelector::default(),
        cfg.player.clone(),
    )
}

/// Run the display loop
async fn run_display(cfg: &ResolvedConfig, json: bool) -> Result<()> {
    let api: Arc<dyn QueueApi> = Arc::new(queue_api(cfg)?);
    let speech = Arc::new(EspeakSynthesizer::new(cfg.speech_binary.clone()));

    // Warm the voice catalog so the first call rarely has to wait for it
    {
        let speech = Arc::clone(&speech);
        tokio::spawn(async move { speech.voices_ready().await });
    }

    let orchestrator = CallOrchestrator::new(player(cfg, speech), Arc::clone(&api));
    let poller = Arc::new(QueuePoller::new(api));
    let display = QueueDisplay::new(poller, orchestrator, cfg.display.clone());

    let mut board = display.board();
    let renderer = tokio::spawn(async move {
        while board.changed().await.is_ok() {
            let frame = board.borrow_and_update().clone();
            render_board(&frame, json);
        }
    });

    let teardown = Teardown::new();
    let signal = teardown.signal();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Interrupt received, tearing down");
            teardown.fire();
        }
    });

    info!(api = %cfg.api_url, "Starting display");
    display.run(signal).await;
    renderer.await.context("Renderer task failed")?;

    Ok(())
}

fn render_board(board: &DisplayBoard, json: bool) {
    if json {
        match serde_json::to_string(board) {
            Ok(line) => println!("{}", line),
            Err(e) => eprintln!("Failed to encode board: {}", e),
        }
        return;
    }

    println!();
    println!("{}", "=".repeat(60));
    if let Some(error) = &board.error {
        println!("!! {}", error);
    }
    if let Some(turn) = &board.calling {
        println!(
            ">> CALLING #{} {} -> cubicle {} [{}]",
            turn.assigned_turn,
            turn.patient_name,
            turn.cubicle_label(),
            board.phase
        );
    }

    println!("In progress ({}):", board.attending_total);
    for turn in &board.attending {
        println!("  {}", turn_row(turn));
    }

    println!("Waiting ({}):", board.waiting_total);
    for turn in &board.waiting {
        println!("  {}", turn_row(turn));
    }

    if let Some(url) = &board.survey_url {
        println!("Survey: {}", url);
    }
}

fn turn_row(turn: &Turn) -> String {
    let marker = match turn.attention_kind {
        AttentionKind::Priority => "*",
        AttentionKind::Normal => " ",
    };
    format!(
        "{}{:>4}  {:<4} {:<32} {}",
        marker,
        turn.assigned_turn,
        turn.initials(),
        turn.patient_name,
        turn.cubicle.as_ref().map(|c| c.name.as_str()).unwrap_or("-")
    )
}

/// Fetch and print the queue once
async fn show_snapshot(cfg: &ResolvedConfig, json: bool) -> Result<()> {
    let api = queue_api(cfg)?;
    let response = api
        .fetch_queue()
        .await
        .with_context(|| format!("Failed to fetch queue from {}", cfg.api_url))?;
    let snapshot = QueueSnapshot::from_response(response);

    if json {
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
        return Ok(());
    }

    println!("{:<6} {:<10} {:<32} {:<10}", "TURN", "STATUS", "PATIENT", "CUBICLE");
    println!("{}", "-".repeat(60));

    for (status, turns) in [
        ("calling", &snapshot.calling),
        ("attending", &snapshot.attending),
        ("waiting", &snapshot.waiting),
    ] {
        for turn in turns {
            println!(
                "{:<6} {:<10} {:<32} {:<10}",
                turn.assigned_turn,
                status,
                turn.patient_name,
                turn.cubicle.as_ref().map(|c| c.name.as_str()).unwrap_or("-")
            );
        }
    }

    if snapshot.total() == 0 {
        println!("Queue is empty");
    }
    if let Some(turn) = snapshot.next_calling() {
        println!();
        println!("Next announcement: {}", AnnouncementPlayer::announcement_text(turn));
    }

    Ok(())
}

/// List speech voices
async fn list_voices(cfg: &ResolvedConfig) -> Result<()> {
    let speech = EspeakSynthesizer::new(cfg.speech_binary.clone());
    speech.voices_ready().await;
    let voices = speech.voices();

    if voices.is_empty() {
        println!("No voices reported by {}", cfg.speech_binary);
        return Ok(());
    }

    let selected = VoiceSelector::default().select(&voices);

    println!("{:<2} {:<32} {:<12}", "", "VOICE", "LANG");
    println!("{}", "-".repeat(48));
    for voice in &voices {
        let marker = if selected.as_ref() == Some(voice) { "*" } else { " " };
        println!("{:<2} {:<32} {:<12}", marker, voice.name, voice.lang);
    }

    Ok(())
}

/// Play one announcement for a made-up turn
async fn announce(cfg: &ResolvedConfig, name: String, cubicle: Option<String>) -> Result<()> {
    let speech = Arc::new(EspeakSynthesizer::new(cfg.speech_binary.clone()));
    let player = player(cfg, speech);

    let mut turn = Turn::new(0, name, 0);
    if let Some(cubicle) = cubicle {
        turn = turn.with_cubicle(cubicle);
    }

    let teardown = Teardown::new();
    let mut signal = teardown.signal();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            teardown.fire();
        }
    });

    println!("{}", AnnouncementPlayer::announcement_text(&turn));
    let report = player
        .play(&turn, &mut signal, &|phase: EpisodePhase| info!(%phase, "Phase"))
        .await;

    println!(
        "Cue played: {}, repeats spoken: {}, voice: {}{}",
        report.cue_played,
        report.repeats_spoken,
        report.voice.as_ref().map(|v| v.name.as_str()).unwrap_or("(engine default)"),
        if report.cancelled { " (cancelled)" } else { "" }
    );

    Ok(())
}

/// Show resolved configuration
fn show_config(cfg: &ResolvedConfig) {
    println!("callboard configuration");
    println!("{}", "=".repeat(40));
    println!();
    println!(
        "Config file: {}",
        cfg.config_file
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "(none - using defaults)".to_string())
    );
    println!();
    println!("Queue service:");
    println!("  Base URL: {}", cfg.api_url);
    println!("  Timeout:  {:?}", cfg.api_timeout);
    println!();
    println!("Polling:");
    println!("  Busy interval: {:?}", cfg.display.cadence.busy);
    println!("  Idle interval: {:?}", cfg.display.cadence.idle);
    println!("  Error banner after {} failures", cfg.display.error_after_failures);
    println!();
    println!("Display:");
    println!("  Rotation:    {:?}", cfg.display.rotation);
    println!("  Window size: {}", cfg.display.window_size);
    println!(
        "  Survey URL:  {}",
        cfg.display.survey_url.as_deref().unwrap_or("(none)")
    );
    println!();
    println!("Announcements:");
    println!("  Cue:          {} ({})", cfg.player.cue_path.display(), cfg.audio_binary);
    println!("  Speech:       {}", cfg.speech_binary);
    println!("  Settle:       {:?}", cfg.player.settle);
    println!("  Repeat pause: {:?}", cfg.player.repeat_pause);
    println!("  Trailing:     {:?}", cfg.player.trailing);
    println!(
        "  Rate/pitch/volume: {}/{}/{}",
        cfg.player.rate, cfg.player.pitch, cfg.player.volume
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_announce_with_global_url() {
        let cli = Cli::try_parse_from([
            "callboard",
            "announce",
            "Ana Ruiz",
            "--cubicle",
            "3",
            "--api-url",
            "http://queue.local/api",
        ])
        .unwrap();

        assert_eq!(cli.api_url.as_deref(), Some("http://queue.local/api"));
        match cli.command {
            Commands::Announce { name, cubicle } => {
                assert_eq!(name, "Ana Ruiz");
                assert_eq!(cubicle.as_deref(), Some("3"));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_turn_row_marks_priority() {
        let turn = Turn::new(1, "Luis Pérez", 9).with_attention(AttentionKind::Priority);
        assert!(turn_row(&turn).starts_with('*'));
    }
}
