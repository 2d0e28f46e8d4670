//! FocusAI Monitor CLI
//!
//! Replays recorded detector output through a monitoring session.

use anyhow::Context;
use clap::{Parser, Subcommand};
use focusai_monitor::{
    collector::{DetectionLogEncoder, JsonlAudioSource, JsonlFrameSource},
    config::{Config, MonitorMode},
    logging::init_logging,
    transparency::{create_shared_log_with_persistence, PersistedStats},
    FsArtifactSink, MonitorError, MonitoringSession, SessionReport, SessionRunner,
    MONITORING_DECLARATION, VERSION,
};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "focusai")]
#[command(author = "FocusAI")]
#[command(version = VERSION)]
#[command(about = "Real-time exam and classroom monitoring", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a monitoring session over recorded detector output
    Monitor {
        /// JSON Lines file of detector frames
        #[arg(long)]
        frames: PathBuf,

        /// JSON Lines file of audio frequency frames
        #[arg(long)]
        audio: Option<PathBuf>,

        /// Monitoring mode (exam or class)
        #[arg(long)]
        mode: Option<MonitorMode>,

        /// Render ticks per second
        #[arg(long)]
        fps: Option<u32>,

        /// Output directory for clips, snapshots and reports
        #[arg(long, short)]
        output: Option<PathBuf>,
    },

    /// Print the summary of a saved session report
    Summarize {
        /// Path to an exam report JSON file
        report: PathBuf,
    },

    /// Show cumulative monitoring statistics
    Status,

    /// Show configuration
    Config,

    /// Display the monitoring declaration
    Declaration,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = Config::load().context("Could not load configuration")?;
    init_logging(&config.logging);

    match cli.command {
        Commands::Monitor {
            frames,
            audio,
            mode,
            fps,
            output,
        } => cmd_monitor(config, frames, audio, mode, fps, output),
        Commands::Summarize { report } => cmd_summarize(&report),
        Commands::Status => {
            cmd_status(&config);
            Ok(())
        }
        Commands::Config => {
            cmd_config(&config);
            Ok(())
        }
        Commands::Declaration => {
            println!("{MONITORING_DECLARATION}");
            Ok(())
        }
    }
}

fn cmd_monitor(
    mut config: Config,
    frames: PathBuf,
    audio: Option<PathBuf>,
    mode: Option<MonitorMode>,
    fps: Option<u32>,
    output: Option<PathBuf>,
) -> anyhow::Result<()> {
    if !frames.exists() {
        return Err(MonitorError::FileNotFound { path: frames }.into());
    }
    let mode = mode.unwrap_or(config.mode);
    if let Some(fps) = fps {
        config.render_fps = fps;
    }
    if let Some(output) = output {
        config.export_path = output;
    }
    if let Err(e) = config.ensure_directories() {
        tracing::warn!(error = %e, "Could not create directories");
    }

    println!("FocusAI Monitor v{VERSION}");
    println!();
    println!("Starting {mode} session...");
    println!("  Frames: {frames:?}");
    println!(
        "  Audio: {}",
        audio
            .as_ref()
            .map(|p| format!("{p:?}"))
            .unwrap_or_else(|| "disabled".to_string())
    );
    println!("  Render rate: {} fps", config.render_fps);
    println!("  Output: {:?}", config.export_path);
    println!();

    let log = create_shared_log_with_persistence(config.data_path.join("transparency.json"));
    let mut session = MonitoringSession::start(
        &config,
        mode,
        Box::new(DetectionLogEncoder::new()),
        chrono::Utc::now(),
    )?
    .with_transparency(log.clone());

    if let Some(path) = audio {
        session.attach_audio(Some(Box::new(JsonlAudioSource::new(path))));
    }
    println!(
        "Noise detection: {}",
        if session.audio_active() { "on" } else { "off" }
    );

    let runner = SessionRunner::new(
        session,
        Box::new(JsonlFrameSource::new(frames)),
        Box::new(FsArtifactSink::new(&config.export_path)),
        &config,
    );

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Could not start runtime")?;
    let summary = runtime.block_on(runner.run())?;

    println!("Processed {} frames", summary.ticks);
    println!("Raised {} alerts", summary.alerts.len());
    for path in &summary.written {
        println!("  Saved {path:?}");
    }
    if summary.failed > 0 {
        eprintln!("Warning: {} artifact(s) could not be saved", summary.failed);
    }
    println!();

    match summary.outcome.report {
        Some(Ok(report)) => println!("{}", report.render_text()),
        Some(Err(e)) => println!("{e}"),
        None => {}
    }

    println!();
    println!("{}", log.summary());
    Ok(())
}

fn cmd_summarize(path: &Path) -> anyhow::Result<()> {
    if !path.exists() {
        return Err(MonitorError::FileNotFound {
            path: path.to_path_buf(),
        }
        .into());
    }
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Could not read {}", path.display()))?;
    let report = SessionReport::from_json(&content)
        .with_context(|| format!("{} is not a session report", path.display()))?;

    println!("{}", report.render_text());
    Ok(())
}

fn cmd_status(config: &Config) {
    println!("FocusAI Monitor Status");
    println!("======================");
    println!();

    println!("Configuration:");
    println!("  Default mode: {}", config.mode);
    println!("  Render rate: {} fps", config.render_fps);
    println!("  Evidence clip cooldown: {}s", config.cooldowns.evidence_clip.as_secs());
    println!("  Clip buffer: {}s", config.windows.clip_buffer.as_secs());
    println!("  Export path: {:?}", config.export_path);
    println!();

    let stats_path = config.data_path.join("transparency.json");
    let persisted = std::fs::read_to_string(&stats_path)
        .ok()
        .and_then(|content| serde_json::from_str::<PersistedStats>(&content).ok());
    match persisted {
        Some(stats) => {
            println!("Cumulative Statistics:");
            println!("  Sessions: {}", stats.sessions);
            println!("  Frames analyzed: {}", stats.frames_analyzed);
            println!("  Subjects scored: {}", stats.subjects_scored);
            println!("  Suspicious verdicts: {}", stats.suspicious_verdicts);
            println!("  Noise alerts: {}", stats.audio_alerts);
            println!("  Object alerts: {}", stats.object_alerts);
            println!("  Evidence clips: {}", stats.clips_captured);
            println!("  Snapshots: {}", stats.snapshots_captured);
            println!("  Session recordings: {}", stats.recordings_captured);
            println!("  Export failures: {}", stats.export_failures);
        }
        None => println!("No previous session data found."),
    }
}

fn cmd_config(config: &Config) {
    println!("Configuration");
    println!("=============");
    println!();
    println!("Config file: {:?}", Config::config_path());
    println!();
    println!(
        "{}",
        serde_json::to_string_pretty(config).unwrap_or_else(|_| "Error".to_string())
    );
}
