//! Core monitoring logic.
//!
//! This module contains:
//! - Signal extraction from detector output
//! - Suspicion scoring and class-mode focus assessment
//! - Audio and object alert monitors
//! - Heatmap, timeline and evidence capture state
//! - The end-of-session report

pub mod alert;
pub mod audio;
pub mod cooldown;
pub mod evidence;
pub mod focus;
pub mod heatmap;
pub mod objects;
pub mod overlay;
pub mod report;
pub mod scoring;
pub mod signals;
pub mod timeline;

// Re-export commonly used types
pub use alert::{AlertEvent, AlertSource, Severity};
pub use audio::{average_volume, AudioLevelMonitor, SharedAudioLevel};
pub use cooldown::{Cooldown, CooldownChannel};
pub use evidence::{ClipBuffer, ClipChunk, EvidenceCaptureManager};
pub use focus::{FocusAssessor, FocusBand, FocusReport};
pub use heatmap::{HeatGrid, HeatPoint, HeatSample, HeatmapTracker};
pub use objects::{FlaggedObject, ObjectAlertMonitor, ObjectClass, ObjectScan};
pub use overlay::{DrawInstruction, Point};
pub use report::{ReportSummarizer, SessionReport, TimelineSummary, PRODUCER_NAME};
pub use scoring::{RuleHits, ScoringRules, SuspicionScorer, SuspicionVerdict};
pub use signals::{analyze_gesture, extract_pose_geometry, ConfidenceFloor, SignalReading};
pub use timeline::{TimelineRecorder, TimelineSample};
