//! Demonstration of a FocusAI exam session over synthetic detector output.
//!
//! This example shows how to:
//! 1. Start a monitoring session with the detection-log encoder
//! 2. Feed it frames on a simulated 30 fps clock
//! 3. React to alerts and evidence artifacts
//! 4. Stop the session and print its report
//!
//! Run with: cargo run --example synthetic_session

use chrono::{Duration, Utc};
use focusai_monitor::{
    collector::{keypoint, DetectionFrame, DetectionLogEncoder, Keypoint, ObjectPrediction, Pose},
    export::{ArtifactSink, MemoryArtifactSink},
    logging::init_default_logging,
    Config, MonitorMode, MonitoringSession, MONITORING_DECLARATION,
};

/// A seated subject whose head is turned by `turn` shoulder widths.
fn subject(center_x: f64, turn: f64) -> Pose {
    let width = 120.0;
    Pose {
        score: 0.8,
        keypoints: vec![
            Keypoint::new(keypoint::NOSE, center_x + turn * width, 200.0, 0.9),
            Keypoint::new(keypoint::LEFT_SHOULDER, center_x + width / 2.0, 230.0, 0.9),
            Keypoint::new(keypoint::RIGHT_SHOULDER, center_x - width / 2.0, 230.0, 0.9),
        ],
    }
}

fn main() {
    init_default_logging();

    println!("FocusAI Monitor - Synthetic Session");
    println!("===================================");
    println!("{MONITORING_DECLARATION}");

    let config = Config::default();
    let t0 = Utc::now();
    let mut session = match MonitoringSession::start(
        &config,
        MonitorMode::Exam,
        Box::new(DetectionLogEncoder::new()),
        t0,
    ) {
        Ok(session) => session,
        Err(e) => {
            eprintln!("Could not start session: {e}");
            return;
        }
    };
    let mut sink = MemoryArtifactSink::default();

    // Ten seconds at 30 fps. The second subject looks at a neighbour from
    // second 3 and a phone shows up at second 6.
    for frame_index in 0..300i64 {
        let now = t0 + Duration::milliseconds(frame_index * 1000 / 30);
        let second = frame_index / 30;

        let turn = if second >= 3 { 0.4 } else { 0.05 };
        let mut frame = DetectionFrame {
            poses: vec![subject(160.0, 0.0), subject(460.0, turn)],
            width: 640.0,
            height: 480.0,
            ..Default::default()
        };
        if second >= 6 {
            frame.objects.push(ObjectPrediction {
                label: "cell phone".to_string(),
                score: 0.83,
                bbox: [300.0, 350.0, 60.0, 110.0],
            });
        }

        if frame_index % 6 == 0 {
            session.record_chunk(now);
        }

        let outcome = match session.tick(&frame, now) {
            Ok(outcome) => outcome,
            Err(e) => {
                eprintln!("Tick failed: {e}");
                return;
            }
        };

        for alert in &outcome.alerts {
            println!("[{:>5} ms] ALERT {}", frame_index * 1000 / 30, alert.message);
        }
        if frame_index % 30 == 0 {
            for d in &outcome.draw {
                println!("    {} ({})", d.label(), d.color());
            }
            for h in &outcome.heat {
                println!(
                    "    heat at ({:.0}, {:.0}) opacity {:.2}",
                    h.position.x,
                    h.position.y,
                    h.fill_opacity()
                );
            }
            let banners = outcome.alerts.iter().filter(|a| a.is_displayed(now)).count();
            if banners > 0 {
                println!("    {banners} alert banner(s) on screen");
            }
        }
        for artifact in &outcome.artifacts {
            println!("[{:>5} ms] saved {}", frame_index * 1000 / 30, artifact.file_name);
            let _ = sink.write(artifact);
        }
    }

    let end = t0 + Duration::seconds(10);
    let grid = session.heat_grid(end, 8, 6, 640.0, 480.0);
    if let Some((col, row)) = grid.hottest() {
        println!();
        println!("Hottest heatmap cell: column {col}, row {row}");
    }

    let outcome = match session.stop(end) {
        Ok(outcome) => outcome,
        Err(e) => {
            eprintln!("Could not stop session: {e}");
            return;
        }
    };

    println!();
    match outcome.report {
        Some(Ok(report)) => println!("{}", report.render_text()),
        Some(Err(e)) => println!("{e}"),
        None => {}
    }
    println!();
    println!("Artifacts captured: {}", sink.artifacts.len() + outcome.artifacts.len());
    println!("{}", session.transparency().summary());
}
