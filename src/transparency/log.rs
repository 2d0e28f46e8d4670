//! Session transparency log.
//!
//! This module counts what the monitor did during a session (frames
//! analyzed, verdicts issued, alerts raised, evidence captured) without
//! storing any identifying information about the people in view.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Transparency counters for the current session.
#[derive(Debug)]
pub struct TransparencyLog {
    /// Number of detector frames analyzed
    frames_analyzed: AtomicU64,
    /// Number of subjects that cleared the confidence floor
    subjects_scored: AtomicU64,
    /// Number of suspicious verdicts
    suspicious_verdicts: AtomicU64,
    /// Number of noise alerts raised
    audio_alerts: AtomicU64,
    /// Number of forbidden-object alerts raised
    object_alerts: AtomicU64,
    /// Number of evidence clips captured
    clips_captured: AtomicU64,
    /// Number of snapshots captured
    snapshots_captured: AtomicU64,
    /// Number of whole-session recordings captured
    recordings_captured: AtomicU64,
    /// Number of artifacts that could not be written
    export_failures: AtomicU64,
    /// Session start time
    session_start: DateTime<Utc>,
    /// Path for persisting stats
    persist_path: Option<PathBuf>,
    /// Totals of earlier sessions, read from `persist_path`
    baseline: PersistedStats,
}

impl TransparencyLog {
    /// Create a new transparency log.
    pub fn new() -> Self {
        Self::starting_at(Utc::now())
    }

    /// Create a log for a session that started at `session_start`.
    pub fn starting_at(session_start: DateTime<Utc>) -> Self {
        Self {
            frames_analyzed: AtomicU64::new(0),
            subjects_scored: AtomicU64::new(0),
            suspicious_verdicts: AtomicU64::new(0),
            audio_alerts: AtomicU64::new(0),
            object_alerts: AtomicU64::new(0),
            clips_captured: AtomicU64::new(0),
            snapshots_captured: AtomicU64::new(0),
            recordings_captured: AtomicU64::new(0),
            export_failures: AtomicU64::new(0),
            session_start,
            persist_path: None,
            baseline: PersistedStats::default(),
        }
    }

    /// Create a transparency log that accumulates into `path`.
    ///
    /// The counters still describe this session only. Earlier totals are
    /// added when the log is saved.
    pub fn with_persistence(path: PathBuf) -> Self {
        let mut log = Self::new();
        log.persist_path = Some(path);

        if let Err(e) = log.load() {
            tracing::warn!(error = %e, "Could not load previous transparency stats");
        }

        log
    }

    pub fn record_frame(&self) {
        self.frames_analyzed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_subjects_scored(&self, count: u64) {
        self.subjects_scored.fetch_add(count, Ordering::Relaxed);
    }

    pub fn record_suspicious_verdicts(&self, count: u64) {
        self.suspicious_verdicts.fetch_add(count, Ordering::Relaxed);
    }

    pub fn record_audio_alert(&self) {
        self.audio_alerts.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_object_alert(&self) {
        self.object_alerts.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_clip(&self) {
        self.clips_captured.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_snapshot(&self) {
        self.snapshots_captured.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_recording(&self) {
        self.recordings_captured.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_export_failure(&self) {
        self.export_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Get the current statistics.
    pub fn stats(&self) -> TransparencyStats {
        self.stats_at(Utc::now())
    }

    /// Get the statistics as of `now`.
    pub fn stats_at(&self, now: DateTime<Utc>) -> TransparencyStats {
        TransparencyStats {
            frames_analyzed: self.frames_analyzed.load(Ordering::Relaxed),
            subjects_scored: self.subjects_scored.load(Ordering::Relaxed),
            suspicious_verdicts: self.suspicious_verdicts.load(Ordering::Relaxed),
            audio_alerts: self.audio_alerts.load(Ordering::Relaxed),
            object_alerts: self.object_alerts.load(Ordering::Relaxed),
            clips_captured: self.clips_captured.load(Ordering::Relaxed),
            snapshots_captured: self.snapshots_captured.load(Ordering::Relaxed),
            recordings_captured: self.recordings_captured.load(Ordering::Relaxed),
            export_failures: self.export_failures.load(Ordering::Relaxed),
            session_start: self.session_start,
            session_duration_secs: (now - self.session_start).num_seconds().max(0) as u64,
        }
    }

    /// Get a summary string for display.
    pub fn summary(&self) -> String {
        let stats = self.stats();
        format!(
            "Session Statistics:\n\
             - Frames analyzed: {}\n\
             - Subjects scored: {}\n\
             - Suspicious verdicts: {}\n\
             - Noise alerts: {}\n\
             - Object alerts: {}\n\
             - Evidence clips: {}\n\
             - Snapshots: {}\n\
             - Session recordings: {}\n\
             - Export failures: {}\n\
             - Session duration: {} seconds\n\
             \n\
             Monitoring Guarantee:\n\
             - No identities are tracked across frames\n\
             - Evidence is captured only on rule-based triggers\n\
             - All processing stays on this device",
            stats.frames_analyzed,
            stats.subjects_scored,
            stats.suspicious_verdicts,
            stats.audio_alerts,
            stats.object_alerts,
            stats.clips_captured,
            stats.snapshots_captured,
            stats.recordings_captured,
            stats.export_failures,
            stats.session_duration_secs
        )
    }

    /// Totals across every persisted session, this one included.
    pub fn lifetime_stats(&self) -> PersistedStats {
        self.baseline.plus(&self.stats())
    }

    /// Save the lifetime totals to disk.
    ///
    /// Saving again later rewrites the file from the same baseline, so
    /// repeated saves never count a session twice.
    pub fn save(&self) -> Result<(), std::io::Error> {
        if let Some(ref path) = self.persist_path {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }

            let json = serde_json::to_string_pretty(&self.lifetime_stats())
                .map_err(std::io::Error::other)?;

            std::fs::write(path, json)?;
        }
        Ok(())
    }

    /// Load the totals of earlier sessions from disk.
    fn load(&mut self) -> Result<(), std::io::Error> {
        if let Some(ref path) = self.persist_path {
            if path.exists() {
                let content = std::fs::read_to_string(path)?;
                self.baseline = serde_json::from_str(&content).map_err(std::io::Error::other)?;
            }
        }
        Ok(())
    }
}

impl Default for TransparencyLog {
    fn default() -> Self {
        Self::new()
    }
}

/// Snapshot of transparency statistics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransparencyStats {
    pub frames_analyzed: u64,
    pub subjects_scored: u64,
    pub suspicious_verdicts: u64,
    pub audio_alerts: u64,
    pub object_alerts: u64,
    pub clips_captured: u64,
    pub snapshots_captured: u64,
    pub recordings_captured: u64,
    pub export_failures: u64,
    pub session_start: DateTime<Utc>,
    pub session_duration_secs: u64,
}

/// Cumulative counters kept across sessions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PersistedStats {
    pub sessions: u64,
    pub frames_analyzed: u64,
    pub subjects_scored: u64,
    pub suspicious_verdicts: u64,
    pub audio_alerts: u64,
    pub object_alerts: u64,
    pub clips_captured: u64,
    pub snapshots_captured: u64,
    pub recordings_captured: u64,
    pub export_failures: u64,
    pub last_updated: Option<DateTime<Utc>>,
}

impl PersistedStats {
    /// These totals with one more session folded in.
    fn plus(&self, session: &TransparencyStats) -> Self {
        Self {
            sessions: self.sessions + 1,
            frames_analyzed: self.frames_analyzed + session.frames_analyzed,
            subjects_scored: self.subjects_scored + session.subjects_scored,
            suspicious_verdicts: self.suspicious_verdicts + session.suspicious_verdicts,
            audio_alerts: self.audio_alerts + session.audio_alerts,
            object_alerts: self.object_alerts + session.object_alerts,
            clips_captured: self.clips_captured + session.clips_captured,
            snapshots_captured: self.snapshots_captured + session.snapshots_captured,
            recordings_captured: self.recordings_captured + session.recordings_captured,
            export_failures: self.export_failures + session.export_failures,
            last_updated: Some(Utc::now()),
        }
    }
}

/// Thread-safe shared transparency log.
pub type SharedTransparencyLog = Arc<TransparencyLog>;

/// Create a new shared transparency log with persistence.
pub fn create_shared_log_with_persistence(path: PathBuf) -> SharedTransparencyLog {
    Arc::new(TransparencyLog::with_persistence(path))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transparency_log_counting() {
        let log = TransparencyLog::new();

        log.record_frame();
        log.record_frame();
        log.record_suspicious_verdicts(3);
        log.record_object_alert();

        let stats = log.stats();
        assert_eq!(stats.frames_analyzed, 2);
        assert_eq!(stats.suspicious_verdicts, 3);
        assert_eq!(stats.object_alerts, 1);
        assert_eq!(stats.audio_alerts, 0);
    }

    #[test]
    fn test_stats_duration() {
        let t0 = Utc::now();
        let log = TransparencyLog::starting_at(t0);
        let stats = log.stats_at(t0 + chrono::Duration::seconds(42));
        assert_eq!(stats.session_duration_secs, 42);
    }

    #[test]
    fn test_summary_format() {
        let log = TransparencyLog::new();
        let summary = log.summary();

        assert!(summary.contains("Frames analyzed"));
        assert!(summary.contains("Evidence clips"));
        assert!(summary.contains("Monitoring Guarantee"));
    }

    fn persist_path() -> PathBuf {
        std::env::temp_dir()
            .join("focusai-transparency-test")
            .join(format!("{}.json", uuid::Uuid::new_v4()))
    }

    #[test]
    fn test_persistence_roundtrip() {
        let path = persist_path();

        let log = TransparencyLog::with_persistence(path.clone());
        log.record_frame();
        log.record_snapshot();
        log.save().unwrap();

        let reloaded = TransparencyLog::with_persistence(path.clone());
        let lifetime = reloaded.lifetime_stats();
        assert_eq!(lifetime.sessions, 2);
        assert_eq!(lifetime.frames_analyzed, 1);
        assert_eq!(lifetime.snapshots_captured, 1);
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_session_counters_exclude_earlier_sessions() {
        let path = persist_path();
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(
            &path,
            r#"{"frames_analyzed": 500, "object_alerts": 7, "clips_captured": 3}"#,
        )
        .unwrap();

        let log = TransparencyLog::with_persistence(path.clone());
        log.record_frame();
        log.record_frame();
        log.record_subjects_scored(2);

        let stats = log.stats();
        assert_eq!(stats.frames_analyzed, 2);
        assert_eq!(stats.subjects_scored, 2);
        assert_eq!(stats.object_alerts, 0);
        assert_eq!(stats.clips_captured, 0);

        // Saving twice must not double count
        log.save().unwrap();
        log.save().unwrap();
        let saved: PersistedStats =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(saved.frames_analyzed, 502);
        assert_eq!(saved.subjects_scored, 2);
        assert_eq!(saved.object_alerts, 7);
        assert_eq!(saved.clips_captured, 3);
        assert_eq!(saved.sessions, 1);
        let _ = std::fs::remove_file(&path);
    }
}
