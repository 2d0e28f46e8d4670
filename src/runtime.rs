//! Live session driver.
//!
//! Three timelines share one task: the render tick pulls the next detector
//! frame, the audio tick samples the microphone, and the chunk tick moves
//! encoded media into the clip buffer. They are multiplexed with
//! `tokio::select!` on a single thread, so the session needs no locking.

use crate::collector::{CollectorError, FramePoll, FrameSource};
use crate::config::Config;
use crate::core::alert::AlertEvent;
use crate::error::{MonitorError, MonitorResult};
use crate::export::{Artifact, ArtifactSink};
use crate::session::{MonitoringSession, SessionOutcome};
use chrono::Utc;
use std::future::Future;
use std::path::PathBuf;
use std::time::Duration;
use tokio::time::MissedTickBehavior;

/// Result of a completed run.
#[derive(Debug)]
pub struct RunSummary {
    pub outcome: SessionOutcome,
    /// Frames that were processed
    pub ticks: u64,
    /// Every alert raised during the run, in order
    pub alerts: Vec<AlertEvent>,
    /// Where every written artifact went
    pub written: Vec<PathBuf>,
    /// Artifacts that could not be written
    pub failed: usize,
}

pub struct SessionRunner {
    session: MonitoringSession,
    frames: Box<dyn FrameSource>,
    sink: Box<dyn ArtifactSink>,
    render_interval: Duration,
    audio_interval: Duration,
    chunk_interval: Duration,
    alerts: Vec<AlertEvent>,
    written: Vec<PathBuf>,
    failed: usize,
}

impl SessionRunner {
    pub fn new(
        session: MonitoringSession,
        frames: Box<dyn FrameSource>,
        sink: Box<dyn ArtifactSink>,
        config: &Config,
    ) -> Self {
        let fps = config.render_fps.max(1);
        Self {
            session,
            frames,
            sink,
            render_interval: Duration::from_secs(1) / fps,
            audio_interval: config.audio_sample_interval,
            chunk_interval: config.chunk_interval,
            alerts: Vec::new(),
            written: Vec::new(),
            failed: 0,
        }
    }

    /// Run until the frame source ends or Ctrl+C is pressed.
    pub async fn run(self) -> MonitorResult<RunSummary> {
        self.run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::warn!(error = %e, "Could not listen for Ctrl+C");
                std::future::pending::<()>().await;
            }
        })
        .await
    }

    /// Run until the frame source ends or `shutdown` completes.
    pub async fn run_until<S>(mut self, shutdown: S) -> MonitorResult<RunSummary>
    where
        S: Future<Output = ()>,
    {
        self.frames.start().map_err(|e| match e {
            CollectorError::Unavailable { .. } => MonitorError::acquisition(e.to_string()),
            other => MonitorError::inference_unavailable(other.to_string()),
        })?;

        let mut render = tokio::time::interval(self.render_interval);
        render.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut audio = tokio::time::interval(self.audio_interval);
        audio.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut chunks = tokio::time::interval(self.chunk_interval);
        chunks.set_missed_tick_behavior(MissedTickBehavior::Skip);

        tokio::pin!(shutdown);
        let mut ticks = 0u64;

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    tracing::info!("Shutdown requested");
                    break;
                }
                _ = render.tick() => {
                    match self.frames.poll_frame() {
                        FramePoll::Ready(frame) => {
                            let outcome = self.session.tick(&frame, Utc::now())?;
                            ticks += 1;
                            tracing::debug!(
                                suspects = outcome.displayed_suspects(),
                                "Frame rendered"
                            );
                            self.persist(&outcome.artifacts);
                            self.alerts.extend(outcome.alerts);
                        }
                        FramePoll::Pending => {}
                        FramePoll::Exhausted => {
                            tracing::info!(ticks, "Frame source ended");
                            break;
                        }
                    }
                }
                _ = audio.tick() => {
                    if let Some(alert) = self.session.sample_audio(Utc::now()) {
                        self.alerts.push(alert);
                    }
                }
                _ = chunks.tick() => {
                    self.session.record_chunk(Utc::now());
                }
            }
        }

        self.frames.stop();
        let outcome = self.session.stop(Utc::now())?;
        self.persist(&outcome.artifacts);

        let log = self.session.transparency();
        if let Err(e) = log.save() {
            tracing::warn!(error = %e, "Could not save transparency log");
        }

        Ok(RunSummary {
            outcome,
            ticks,
            alerts: self.alerts,
            written: self.written,
            failed: self.failed,
        })
    }

    fn persist(&mut self, artifacts: &[Artifact]) {
        for artifact in artifacts {
            match self.sink.write(artifact) {
                Ok(path) => self.written.push(path),
                Err(e) => {
                    tracing::warn!(error = %e, file = %artifact.file_name, "Could not save artifact");
                    self.session.transparency().record_export_failure();
                    self.failed += 1;
                }
            }
        }
    }
}
