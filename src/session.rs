//! A single monitoring session.
//!
//! [`MonitoringSession`] owns every piece of mutable state between start and
//! stop. It has no clock of its own: each operation takes the current time,
//! so the same code runs under the live runner and under deterministic tests.
//!
//! Within a tick the audio level is read once, every subject is extracted
//! before any is scored, and side effects (heatmap, evidence, snapshots) are
//! applied after scoring.

use crate::collector::{AudioSource, DetectionFrame, MediaEncoder, MediaFormat};
use crate::config::{chrono_duration, Config, MonitorMode};
use crate::core::alert::AlertEvent;
use crate::core::audio::{AudioLevelMonitor, SharedAudioLevel};
use crate::core::evidence::EvidenceCaptureManager;
use crate::core::focus::{FocusAssessor, FocusReport};
use crate::core::heatmap::{HeatGrid, HeatSample, HeatmapTracker};
use crate::core::objects::{FlaggedObject, ObjectAlertMonitor};
use crate::core::overlay::{DrawInstruction, Point, OK_COLOR, SUSPECT_COLOR};
use crate::core::report::{ReportSummarizer, SessionReport};
use crate::core::scoring::{SuspicionScorer, SuspicionVerdict};
use crate::core::signals::{
    analyze_gesture, extract_pose_geometry, ConfidenceFloor, PoseGeometry, SignalReading,
};
use crate::core::timeline::{TimelineRecorder, TimelineSample};
use crate::error::{MonitorError, MonitorResult, ReportError};
use crate::export::{Artifact, ArtifactKind, ArtifactNamer};
use crate::transparency::{SharedTransparencyLog, TransparencyLog, TransparencyStats};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use uuid::Uuid;

/// Ring radius relative to shoulder width in exam mode.
const SUBJECT_RING_SCALE: f64 = 0.9;

/// Everything one render tick produced.
#[derive(Debug, Clone, Default)]
pub struct TickOutcome {
    pub verdicts: Vec<SuspicionVerdict>,
    /// Overlay for this frame, subjects first, then object boxes
    pub draw: Vec<DrawInstruction>,
    pub heat: Vec<HeatSample>,
    pub alerts: Vec<AlertEvent>,
    pub artifacts: Vec<Artifact>,
    /// Subjects that were scored (exam) or counted (class)
    pub total: usize,
    pub suspicious_count: u32,
    pub flagged_objects: Vec<FlaggedObject>,
    pub gesture_suspicious: bool,
    pub audio_level: f64,
    /// Class-mode attention summary
    pub focus: Option<FocusReport>,
}

impl TickOutcome {
    /// Count shown on the suspects display: suspicious subjects plus flagged
    /// objects.
    pub fn displayed_suspects(&self) -> usize {
        self.suspicious_count as usize + self.flagged_objects.len()
    }
}

/// What a session leaves behind once stopped.
#[derive(Debug)]
pub struct SessionOutcome {
    pub mode: MonitorMode,
    /// Exam-mode report, or the reason there is none. `None` in class mode.
    pub report: Option<Result<SessionReport, ReportError>>,
    pub timeline: Vec<TimelineSample>,
    /// Artifacts produced at stop (report, class recording)
    pub artifacts: Vec<Artifact>,
    pub stats: TransparencyStats,
}

pub struct MonitoringSession {
    mode: MonitorMode,
    floor: ConfidenceFloor,
    scorer: SuspicionScorer,
    audio: AudioLevelMonitor,
    audio_level: SharedAudioLevel,
    objects: ObjectAlertMonitor,
    heatmap: HeatmapTracker,
    evidence: EvidenceCaptureManager,
    timeline: TimelineRecorder,
    focus: FocusAssessor,
    summarizer: ReportSummarizer,
    namer: ArtifactNamer,
    log: SharedTransparencyLog,
    started_at: DateTime<Utc>,
    running: bool,
}

impl MonitoringSession {
    /// Start a session.
    ///
    /// Invalid configuration is fatal. A media encoder that fails to start
    /// only disables evidence capture.
    pub fn start(
        config: &Config,
        mode: MonitorMode,
        encoder: Box<dyn MediaEncoder>,
        now: DateTime<Utc>,
    ) -> MonitorResult<Self> {
        config.validate()?;
        let timezone = config.timezone()?;
        let cooldowns = &config.cooldowns;
        let windows = &config.windows;

        let audio = AudioLevelMonitor::new(
            config.scoring.audio_threshold,
            chrono_duration(cooldowns.audio_alert),
            chrono_duration(cooldowns.alert_display),
        );
        let audio_level = audio.level_handle();

        let mut evidence = EvidenceCaptureManager::new(
            encoder,
            chrono_duration(windows.clip_buffer),
            chrono_duration(cooldowns.evidence_clip),
            chrono_duration(cooldowns.snapshot),
            mode == MonitorMode::Class && config.save_class_recording,
        );
        if let Err(e) = evidence.start() {
            tracing::warn!(error = %e, "Media encoder unavailable; evidence capture disabled");
        }

        let mut summarizer = ReportSummarizer::new(mode, timezone);
        if let Some(name) = &config.station_name {
            summarizer = summarizer.with_station(Some(name.clone()));
        }
        tracing::info!(
            %mode,
            session_id = %summarizer.session_id(),
            evidence_capture = evidence.is_recording(),
            "Monitoring session started"
        );

        Ok(Self {
            mode,
            floor: config.floor_for(mode),
            scorer: SuspicionScorer::new(config.scoring),
            audio,
            audio_level,
            objects: ObjectAlertMonitor::new(
                config.object_confidence_floor,
                chrono_duration(cooldowns.object_alert),
                chrono_duration(cooldowns.alert_display),
            ),
            heatmap: HeatmapTracker::new(chrono_duration(windows.heat_decay)),
            evidence,
            timeline: TimelineRecorder::new(chrono_duration(windows.timeline_interval), now),
            focus: FocusAssessor::new(config.class_floor, config.focus_strictness),
            summarizer,
            namer: ArtifactNamer::new(),
            log: Arc::new(TransparencyLog::starting_at(now)),
            started_at: now,
            running: true,
        })
    }

    /// Replace the transparency log, e.g. with a persistent one.
    pub fn with_transparency(mut self, log: SharedTransparencyLog) -> Self {
        self.log = log;
        self
    }

    /// Attach an audio source. Returns whether noise detection is active.
    ///
    /// Noise detection is part of exam monitoring only; class sessions
    /// leave the microphone untouched.
    pub fn attach_audio(&mut self, source: Option<Box<dyn AudioSource>>) -> bool {
        if self.mode != MonitorMode::Exam {
            if source.is_some() {
                tracing::info!(mode = %self.mode, "Noise detection runs in exam mode only");
            }
            return false;
        }
        self.audio.start(source)
    }

    pub fn mode(&self) -> MonitorMode {
        self.mode
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn session_id(&self) -> Uuid {
        self.summarizer.session_id()
    }

    pub fn audio_active(&self) -> bool {
        self.audio.is_active()
    }

    /// Latest published audio level.
    pub fn audio_level(&self) -> f64 {
        self.audio_level.get()
    }

    pub fn transparency(&self) -> SharedTransparencyLog {
        Arc::clone(&self.log)
    }

    pub fn timeline(&self) -> &[TimelineSample] {
        self.timeline.samples()
    }

    /// Density grid of the live heat points.
    pub fn heat_grid(
        &mut self,
        now: DateTime<Utc>,
        cols: usize,
        rows: usize,
        width: f64,
        height: f64,
    ) -> HeatGrid {
        self.heatmap.grid(now, cols, rows, width, height)
    }

    /// Process one frame of detector output.
    pub fn tick(&mut self, frame: &DetectionFrame, now: DateTime<Utc>) -> MonitorResult<TickOutcome> {
        if !self.running {
            return Err(MonitorError::NotRunning);
        }
        self.log.record_frame();
        self.evidence.observe(frame);

        let outcome = match self.mode {
            MonitorMode::Exam => self.exam_tick(frame, now),
            MonitorMode::Class => self.class_tick(frame),
        };
        Ok(outcome)
    }

    fn exam_tick(&mut self, frame: &DetectionFrame, now: DateTime<Utc>) -> TickOutcome {
        let audio_level = self.audio_level.get();
        let gesture_suspicious = analyze_gesture(&frame.hands);

        let subjects: Vec<(usize, PoseGeometry)> = frame
            .poses
            .iter()
            .enumerate()
            .filter_map(|(i, pose)| extract_pose_geometry(pose, self.floor).map(|g| (i, g)))
            .collect();

        let mut outcome = TickOutcome {
            total: subjects.len(),
            gesture_suspicious,
            audio_level,
            ..Default::default()
        };

        let mut clip_requested = false;
        for (index, geometry) in &subjects {
            let reading = SignalReading::new(geometry, gesture_suspicious, audio_level);
            let verdict =
                self.scorer
                    .verdict(*index, reading, geometry.nose, geometry.shoulder_width);

            if verdict.suspicious {
                outcome.suspicious_count += 1;
                self.heatmap.record(verdict.position, now);
                clip_requested |= verdict.evidence;
            }
            tracing::debug!(
                subject = index,
                score = verdict.score,
                suspicious = verdict.suspicious,
                "Subject scored"
            );

            outcome.draw.push(subject_overlay(&verdict, geometry));
            outcome.verdicts.push(verdict);
        }

        if clip_requested {
            if let Some(clip) = self.evidence.save_clip(&mut self.namer, now) {
                self.log.record_clip();
                outcome.artifacts.push(clip);
            }
        }

        let scan = self.objects.scan(&frame.objects, now);
        outcome.draw.extend(scan.boxes);
        outcome.flagged_objects = scan.flagged;
        if let Some(alert) = scan.alert {
            tracing::warn!(message = %alert.message, "Object alert");
            self.log.record_object_alert();
            outcome.alerts.push(alert);
        }
        if scan.snapshot_requested {
            if let Some(still) =
                self.evidence
                    .capture_snapshot(frame, &outcome.draw, &mut self.namer, now)
            {
                self.log.record_snapshot();
                outcome.artifacts.push(still);
            }
        }

        outcome.heat = self.heatmap.render(now);
        self.timeline.observe(outcome.suspicious_count, now);

        self.log.record_subjects_scored(outcome.total as u64);
        self.log
            .record_suspicious_verdicts(u64::from(outcome.suspicious_count));

        outcome
    }

    fn class_tick(&mut self, frame: &DetectionFrame) -> TickOutcome {
        let focus = self.focus.assess(&frame.poses);
        self.log.record_subjects_scored(focus.total as u64);

        TickOutcome {
            draw: focus.draw.clone(),
            total: focus.total,
            audio_level: self.audio_level.get(),
            focus: Some(focus),
            ..Default::default()
        }
    }

    /// Run one audio sampling cycle.
    pub fn sample_audio(&mut self, now: DateTime<Utc>) -> Option<AlertEvent> {
        if !self.running {
            return None;
        }
        let alert = self.audio.sample(now)?;
        tracing::warn!(message = %alert.message, "Noise alert");
        self.log.record_audio_alert();
        Some(alert)
    }

    /// Pull the encoder's latest chunk into the clip buffer.
    pub fn record_chunk(&mut self, now: DateTime<Utc>) {
        if self.running {
            self.evidence.record_chunk(now);
        }
    }

    /// Store a chunk produced outside the session's encoder.
    pub fn push_chunk(&mut self, bytes: Vec<u8>, now: DateTime<Utc>) {
        if self.running {
            self.evidence.push_chunk(bytes, now);
        }
    }

    /// Stop the session and hand off its results.
    pub fn stop(&mut self, now: DateTime<Utc>) -> MonitorResult<SessionOutcome> {
        if !self.running {
            return Err(MonitorError::NotRunning);
        }
        self.running = false;
        self.audio.stop();

        let mut artifacts = Vec::new();
        if let Some(recording) = self.evidence.finish(&mut self.namer, now) {
            self.log.record_recording();
            artifacts.push(recording);
        }

        let timeline = self.timeline.take();
        self.heatmap.clear();
        let stats = self.log.stats_at(now);

        let report = match self.mode {
            MonitorMode::Exam => {
                let report = self.summarizer.summarize(&timeline, Some(stats.clone()), now);
                match &report {
                    Ok(report) => match report.to_json_bytes() {
                        Ok(bytes) => artifacts.push(self.namer.artifact(
                            ArtifactKind::Report,
                            MediaFormat::JSON,
                            bytes,
                            now,
                        )),
                        Err(e) => tracing::warn!(error = %e, "Could not encode report"),
                    },
                    Err(e) => tracing::info!("{e}"),
                }
                Some(report)
            }
            MonitorMode::Class => None,
        };

        tracing::info!(
            mode = %self.mode,
            samples = timeline.len(),
            clips = self.namer.issued(ArtifactKind::Clip),
            snapshots = self.namer.issued(ArtifactKind::Snapshot),
            "Monitoring session stopped"
        );

        Ok(SessionOutcome {
            mode: self.mode,
            report,
            timeline,
            artifacts,
            stats,
        })
    }
}

/// Ring, label and shoulder line for a scored subject.
fn subject_overlay(verdict: &SuspicionVerdict, geometry: &PoseGeometry) -> DrawInstruction {
    let (color, label) = if verdict.suspicious {
        (SUSPECT_COLOR, "SUSPECT")
    } else {
        (OK_COLOR, "OK")
    };
    let nose = geometry.nose;

    DrawInstruction::Subject {
        subject_index: verdict.subject_index,
        center: nose,
        radius: geometry.shoulder_width * SUBJECT_RING_SCALE,
        color: color.to_string(),
        label: label.to_string(),
        label_at: Point::new(nose.x - 20.0, nose.y - geometry.shoulder_width),
        shoulders: Some((geometry.left_shoulder, geometry.right_shoulder)),
    }
}
