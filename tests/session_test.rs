//! End-to-end tests of a monitoring session on a simulated clock.

use chrono::{DateTime, Duration, Utc};
use focusai_monitor::{
    collector::{
        keypoint, AudioSource, CollectorError, DetectionFrame, DetectionLogEncoder, Keypoint,
        ObjectPrediction, Pose,
    },
    core::AlertSource,
    transparency::create_shared_log_with_persistence,
    ArtifactKind, Config, MonitorMode, MonitoringSession, ReportError,
};

/// A subject with a 100 px shoulder span and the given head ratios.
fn pose(turn: f64, down: f64) -> Pose {
    Pose {
        score: 0.9,
        keypoints: vec![
            Keypoint::new(keypoint::NOSE, 300.0 + turn * 100.0, 240.0 + down * 120.0, 0.95),
            Keypoint::new(keypoint::LEFT_SHOULDER, 350.0, 240.0, 0.95),
            Keypoint::new(keypoint::RIGHT_SHOULDER, 250.0, 240.0, 0.95),
        ],
    }
}

fn frame(poses: Vec<Pose>) -> DetectionFrame {
    DetectionFrame {
        poses,
        width: 640.0,
        height: 480.0,
        ..Default::default()
    }
}

fn phone_frame() -> DetectionFrame {
    DetectionFrame {
        objects: vec![ObjectPrediction {
            label: "cell phone".to_string(),
            score: 0.91,
            bbox: [100.0, 100.0, 40.0, 80.0],
        }],
        ..frame(vec![])
    }
}

fn exam_session(t0: DateTime<Utc>) -> MonitoringSession {
    MonitoringSession::start(
        &Config::default(),
        MonitorMode::Exam,
        Box::new(DetectionLogEncoder::new()),
        t0,
    )
    .unwrap()
}

/// Always-loud microphone.
struct LoudRoom;

impl AudioSource for LoudRoom {
    fn acquire(&mut self) -> Result<(), CollectorError> {
        Ok(())
    }

    fn read_frequency_data(&mut self, bins: &mut [u8]) -> Result<(), CollectorError> {
        bins.fill(200);
        Ok(())
    }
}

#[test]
fn test_turned_head_for_ten_seconds() {
    let t0 = Utc::now();
    let mut session = exam_session(t0);

    for second in 1..=10 {
        let outcome = session
            .tick(&frame(vec![pose(0.35, 0.0)]), t0 + Duration::seconds(second))
            .unwrap();
        assert_eq!(outcome.verdicts[0].score, 2);
        assert!(outcome.verdicts[0].suspicious);
        assert_eq!(outcome.suspicious_count, 1);
    }
    assert_eq!(session.timeline().len(), 10);

    let end = t0 + Duration::seconds(10);
    let outcome = session.stop(end).unwrap();
    let report = outcome.report.unwrap().unwrap();
    assert_eq!(report.summary.sampled_seconds, 10);
    assert_eq!(report.summary.max_suspicious, 1);
    assert_eq!(report.summary.avg_suspicious, 1.0);
    assert_eq!(outcome.timeline.len(), 10);

    let report_artifact = outcome
        .artifacts
        .iter()
        .find(|a| a.kind == ArtifactKind::Report)
        .unwrap();
    assert!(report_artifact.file_name.starts_with("exam-report_"));
    assert_eq!(report.transparency.unwrap().frames_analyzed, 10);
}

#[test]
fn test_high_frame_rate_samples_once_per_second() {
    let t0 = Utc::now();
    let mut session = exam_session(t0);

    for i in 1..=150 {
        session
            .tick(&frame(vec![pose(0.0, 0.0)]), t0 + Duration::milliseconds(i * 33))
            .unwrap();
    }
    // 4950 ms elapsed
    assert_eq!(session.timeline().len(), 4);
}

#[test]
fn test_phone_alert_sequence() {
    let t0 = Utc::now();
    let mut session = exam_session(t0);

    let mut alerts = Vec::new();
    let mut snapshots = 0;
    for ms in [0, 3000, 4500] {
        let outcome = session
            .tick(&phone_frame(), t0 + Duration::milliseconds(ms))
            .unwrap();
        assert_eq!(outcome.flagged_objects.len(), 1);
        if !outcome.alerts.is_empty() {
            alerts.push(ms);
        }
        snapshots += outcome
            .artifacts
            .iter()
            .filter(|a| a.kind == ArtifactKind::Snapshot)
            .count();
    }

    assert_eq!(alerts, vec![0, 4500]);
    assert_eq!(snapshots, 1);
}

#[test]
fn test_heat_point_lifetime() {
    let t0 = Utc::now();
    let mut session = exam_session(t0);

    let outcome = session.tick(&frame(vec![pose(0.35, 0.0)]), t0).unwrap();
    assert_eq!(outcome.heat.len(), 1);

    let quiet = frame(vec![pose(0.0, 0.0)]);
    let outcome = session
        .tick(&quiet, t0 + Duration::milliseconds(19_999))
        .unwrap();
    assert_eq!(outcome.heat.len(), 1);
    assert!(outcome.heat[0].alpha > 0.0);

    let outcome = session
        .tick(&quiet, t0 + Duration::milliseconds(20_000))
        .unwrap();
    assert!(outcome.heat.is_empty());
}

#[test]
fn test_evidence_clip_cooldown() {
    let t0 = Utc::now();
    let mut session = exam_session(t0);
    let cheating = frame(vec![pose(0.35, 0.2)]);

    let mut clip_times = Vec::new();
    for ms in [0, 1000, 6999, 7000, 8000] {
        let now = t0 + Duration::milliseconds(ms);
        session.push_chunk(format!("chunk-{ms}").into_bytes(), now);
        let outcome = session.tick(&cheating, now).unwrap();
        assert_eq!(outcome.verdicts[0].score, 3);
        if outcome.artifacts.iter().any(|a| a.kind == ArtifactKind::Clip) {
            clip_times.push(ms);
        }
    }

    assert_eq!(clip_times, vec![0, 7000]);
}

#[test]
fn test_stop_without_samples_is_empty_session() {
    let t0 = Utc::now();
    let mut session = exam_session(t0);
    session.tick(&frame(vec![pose(0.35, 0.0)]), t0).unwrap();

    let outcome = session.stop(t0 + Duration::milliseconds(500)).unwrap();
    assert_eq!(outcome.report, Some(Err(ReportError::EmptySession)));
    assert!(outcome.timeline.is_empty());
}

#[test]
fn test_noisy_room_adds_to_score() {
    let t0 = Utc::now();
    let mut session = exam_session(t0);
    assert!(session.attach_audio(Some(Box::new(LoudRoom))));

    let alert = session.sample_audio(t0).unwrap();
    assert_eq!(alert.source, AlertSource::Audio);
    assert_eq!(alert.message, "Talking / whisper detected");
    assert!(session.sample_audio(t0 + Duration::seconds(1)).is_none());

    // One turn threshold plus noise
    let outcome = session.tick(&frame(vec![pose(0.25, 0.0)]), t0).unwrap();
    assert!(outcome.verdicts[0].hits.audio);
    assert_eq!(outcome.verdicts[0].score, 2);
    assert!(outcome.verdicts[0].suspicious);

    session.stop(t0 + Duration::seconds(2)).unwrap();
    assert!(!session.audio_active());
    assert_eq!(session.audio_level(), 0.0);
}

#[test]
fn test_missing_microphone_keeps_session_running() {
    let t0 = Utc::now();
    let mut session = exam_session(t0);
    assert!(!session.attach_audio(None));
    assert!(session.sample_audio(t0).is_none());

    let outcome = session.tick(&frame(vec![pose(0.25, 0.0)]), t0).unwrap();
    assert_eq!(outcome.verdicts[0].score, 1);
    assert!(!outcome.verdicts[0].suspicious);
}

#[test]
fn test_class_session_saves_recording() {
    let t0 = Utc::now();
    let mut session = MonitoringSession::start(
        &Config::default(),
        MonitorMode::Class,
        Box::new(DetectionLogEncoder::new()),
        t0,
    )
    .unwrap();

    for i in 0..10 {
        let now = t0 + Duration::milliseconds(i * 200);
        let outcome = session.tick(&frame(vec![pose(0.1, 0.0)]), now).unwrap();
        assert_eq!(outcome.focus.as_ref().unwrap().percent, 100);
        session.record_chunk(now);
    }

    let outcome = session.stop(t0 + Duration::seconds(2)).unwrap();
    assert!(outcome.report.is_none());
    let recording = &outcome.artifacts[0];
    assert_eq!(recording.kind, ArtifactKind::Recording);
    let text = String::from_utf8(recording.bytes.clone()).unwrap();
    assert_eq!(text.lines().count(), 10);
}

#[test]
fn test_class_session_ignores_microphone() {
    let t0 = Utc::now();
    let mut session = MonitoringSession::start(
        &Config::default(),
        MonitorMode::Class,
        Box::new(DetectionLogEncoder::new()),
        t0,
    )
    .unwrap();

    assert!(!session.attach_audio(Some(Box::new(LoudRoom))));
    assert!(!session.audio_active());
    assert!(session.sample_audio(t0).is_none());
    assert_eq!(session.audio_level(), 0.0);

    let outcome = session.tick(&frame(vec![pose(0.1, 0.0)]), t0).unwrap();
    assert_eq!(outcome.audio_level, 0.0);
}

#[test]
fn test_report_counts_only_this_session() {
    let dir = std::env::temp_dir().join("focusai_session_test_lifetime");
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("transparency.json");
    std::fs::write(&path, r#"{"sessions": 4, "frames_analyzed": 500}"#).unwrap();

    let log = create_shared_log_with_persistence(path.clone());
    let t0 = Utc::now();
    let mut session = exam_session(t0).with_transparency(log.clone());
    for second in 1..=2 {
        session
            .tick(&frame(vec![pose(0.0, 0.0)]), t0 + Duration::seconds(second))
            .unwrap();
    }

    let outcome = session.stop(t0 + Duration::seconds(2)).unwrap();
    let report = outcome.report.unwrap().unwrap();
    assert_eq!(report.transparency.unwrap().frames_analyzed, 2);

    log.save().unwrap();

    let saved: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(saved["frames_analyzed"], 502);
    assert_eq!(saved["sessions"], 5);

    let _ = std::fs::remove_dir_all(&dir);
}
