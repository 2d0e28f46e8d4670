//! FocusAI Monitor - real-time exam and classroom monitoring core.
//!
//! This library fuses per-frame detector output (body poses, hand landmarks,
//! object detections) with an ambient audio level into per-subject suspicion
//! verdicts, and turns those verdicts into overlays, alerts, evidence clips,
//! snapshots and an end-of-session report.
//!
//! # Monitoring Guarantees
//!
//! - **No identities**: Subjects are per-frame indices, never tracked across frames
//! - **Explainable scores**: Every verdict carries the rules that fired
//! - **Bounded evidence**: Clips hold only the last few seconds, and are rate limited
//! - **Transparency**: All activity is counted and auditable
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                        FocusAI Monitor                           │
//! ├──────────────────────────────────────────────────────────────────┤
//! │  ┌─────────────┐   ┌─────────────┐   ┌─────────────┐            │
//! │  │  Collector  │──▶│   Signals   │──▶│   Scoring   │            │
//! │  │ (detectors) │   │ (geometry)  │   │  (verdicts) │            │
//! │  └─────────────┘   └─────────────┘   └─────────────┘            │
//! │         │                 ▲                 │                    │
//! │         │          ┌─────────────┐          ├──▶ Heatmap         │
//! │         │          │ Audio level │          ├──▶ Timeline ──▶ Report
//! │         │          └─────────────┘          └──▶ Evidence clips  │
//! │         ▼                                                        │
//! │  ┌─────────────┐   ┌─────────────┐   ┌─────────────┐            │
//! │  │   Objects   │──▶│  Snapshots  │   │Transparency │            │
//! │  │  (alerts)   │   │             │   │    Log      │            │
//! │  └─────────────┘   └─────────────┘   └─────────────┘            │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```no_run
//! use chrono::Utc;
//! use focusai_monitor::{collector, Config, MonitorMode, MonitoringSession};
//!
//! let config = Config::default();
//! let encoder = Box::new(collector::DetectionLogEncoder::new());
//! let mut session =
//!     MonitoringSession::start(&config, MonitorMode::Exam, encoder, Utc::now()).unwrap();
//!
//! let frame = collector::DetectionFrame::default();
//! let outcome = session.tick(&frame, Utc::now()).unwrap();
//! println!("{} suspicious", outcome.suspicious_count);
//! ```

pub mod collector;
pub mod config;
pub mod core;
pub mod error;
pub mod export;
pub mod logging;
pub mod runtime;
pub mod session;
pub mod transparency;

// Re-export key types at crate root for convenience
pub use collector::{CollectorError, DetectionFrame, FrameSource, MediaEncoder};
pub use config::{Config, MonitorMode};
pub use core::{SessionReport, SuspicionScorer, SuspicionVerdict, TimelineSample};
pub use error::{CaptureError, ExportError, MonitorError, MonitorResult, ReportError};
pub use export::{Artifact, ArtifactKind, ArtifactSink, FsArtifactSink};
pub use runtime::{RunSummary, SessionRunner};
pub use session::{MonitoringSession, SessionOutcome, TickOutcome};
pub use transparency::{SharedTransparencyLog, TransparencyLog, TransparencyStats};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Monitoring declaration that can be displayed to invigilators and students.
pub const MONITORING_DECLARATION: &str = r#"
╔══════════════════════════════════════════════════════════════════╗
║              FOCUSAI MONITOR - MONITORING DECLARATION            ║
╠══════════════════════════════════════════════════════════════════╣
║                                                                  ║
║  This session is monitored by automated detectors.               ║
║                                                                  ║
║  ✓ WHAT IS ANALYZED:                                             ║
║    • Head orientation relative to the shoulders                  ║
║    • Hand posture (palm width and wrist height)                  ║
║    • Phones and books in view                                    ║
║    • Overall room noise level (volume only)                      ║
║                                                                  ║
║  ✗ WHAT IS NEVER DONE:                                           ║
║    • Recognizing or tracking who you are                         ║
║    • Recording speech content                                    ║
║    • Uploading anything off this device                          ║
║                                                                  ║
║  Evidence clips cover only the few seconds before a flagged      ║
║  moment. Every alert and capture is counted and auditable:       ║
║    focusai status                                                ║
║                                                                  ║
╚══════════════════════════════════════════════════════════════════╝
"#;
