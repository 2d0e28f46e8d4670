//! Evidence capture: rolling clip buffer, snapshots and class recordings.
//!
//! All capture is best-effort. Encoder failures and empty buffers are
//! logged and reported as `None`; they never interrupt the tick that asked
//! for them, and they never consume a cooldown.

use crate::collector::types::DetectionFrame;
use crate::collector::MediaEncoder;
use crate::core::cooldown::{Cooldown, CooldownChannel};
use crate::core::overlay::DrawInstruction;
use crate::error::CaptureError;
use crate::export::{Artifact, ArtifactKind, ArtifactNamer};
use chrono::{DateTime, Duration, Utc};
use std::collections::VecDeque;

/// One encoded media chunk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClipChunk {
    pub bytes: Vec<u8>,
    pub captured_at: DateTime<Utc>,
}

/// Time-window ring buffer of the most recent chunks.
#[derive(Debug)]
pub struct ClipBuffer {
    chunks: VecDeque<ClipChunk>,
    window: Duration,
}

impl ClipBuffer {
    pub fn new(window: Duration) -> Self {
        Self {
            chunks: VecDeque::new(),
            window,
        }
    }

    /// Append a chunk and evict everything that has aged out of the window.
    pub fn push(&mut self, bytes: Vec<u8>, now: DateTime<Utc>) {
        self.chunks.push_back(ClipChunk {
            bytes,
            captured_at: now,
        });
        while let Some(front) = self.chunks.front() {
            if now - front.captured_at >= self.window {
                self.chunks.pop_front();
            } else {
                break;
            }
        }
    }

    /// Concatenate the buffered chunks in capture order.
    pub fn concat(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.total_bytes());
        for chunk in &self.chunks {
            out.extend_from_slice(&chunk.bytes);
        }
        out
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    pub fn total_bytes(&self) -> usize {
        self.chunks.iter().map(|c| c.bytes.len()).sum()
    }

    pub fn clear(&mut self) {
        self.chunks.clear();
    }
}

/// Drives the media encoder and turns its output into artifacts.
pub struct EvidenceCaptureManager {
    encoder: Box<dyn MediaEncoder>,
    recording: bool,
    buffer: ClipBuffer,
    clip_cooldown: Cooldown,
    snapshot_cooldown: Cooldown,
    /// Every chunk of the session, kept only when a recording is wanted
    session_media: Option<Vec<u8>>,
}

impl EvidenceCaptureManager {
    pub fn new(
        encoder: Box<dyn MediaEncoder>,
        clip_window: Duration,
        clip_cooldown: Duration,
        snapshot_cooldown: Duration,
        keep_session_recording: bool,
    ) -> Self {
        Self {
            encoder,
            recording: false,
            buffer: ClipBuffer::new(clip_window),
            clip_cooldown: Cooldown::new(CooldownChannel::EvidenceClip, clip_cooldown),
            snapshot_cooldown: Cooldown::new(CooldownChannel::Snapshot, snapshot_cooldown),
            session_media: keep_session_recording.then(Vec::new),
        }
    }

    /// Start the encoder. On failure capture stays disabled for the session.
    pub fn start(&mut self) -> Result<(), CaptureError> {
        self.encoder.start()?;
        self.recording = true;
        Ok(())
    }

    pub fn is_recording(&self) -> bool {
        self.recording
    }

    pub fn buffer(&self) -> &ClipBuffer {
        &self.buffer
    }

    /// Show the encoder the frame rendered this tick.
    pub fn observe(&mut self, frame: &DetectionFrame) {
        if self.recording {
            self.encoder.observe(frame);
        }
    }

    /// Pull whatever the encoder produced since the last call into the buffer.
    pub fn record_chunk(&mut self, now: DateTime<Utc>) {
        if !self.recording {
            return;
        }
        match self.encoder.take_chunk() {
            Ok(Some(bytes)) => self.push_chunk(bytes, now),
            Ok(None) => {}
            Err(e) => tracing::warn!(error = %e, "Could not read media chunk"),
        }
    }

    /// Store an externally produced chunk.
    pub fn push_chunk(&mut self, bytes: Vec<u8>, now: DateTime<Utc>) {
        if bytes.is_empty() {
            return;
        }
        if let Some(media) = self.session_media.as_mut() {
            media.extend_from_slice(&bytes);
        }
        self.buffer.push(bytes, now);
    }

    /// Save the buffered seconds as a clip if the clip cooldown allows.
    pub fn save_clip(&mut self, namer: &mut ArtifactNamer, now: DateTime<Utc>) -> Option<Artifact> {
        if !self.clip_cooldown.is_ready(now) {
            return None;
        }
        if self.buffer.is_empty() {
            tracing::warn!(error = %CaptureError::EmptyBuffer, "Evidence clip skipped");
            return None;
        }

        self.clip_cooldown.mark_fired(now);
        let artifact = namer.artifact(
            ArtifactKind::Clip,
            self.encoder.clip_format(),
            self.buffer.concat(),
            now,
        );
        tracing::info!(
            file = %artifact.file_name,
            chunks = self.buffer.len(),
            "Evidence clip captured"
        );
        Some(artifact)
    }

    /// Capture the composited surface if the snapshot cooldown allows.
    pub fn capture_snapshot(
        &mut self,
        frame: &DetectionFrame,
        overlay: &[DrawInstruction],
        namer: &mut ArtifactNamer,
        now: DateTime<Utc>,
    ) -> Option<Artifact> {
        if !self.snapshot_cooldown.is_ready(now) {
            return None;
        }

        match self.encoder.encode_still(frame, overlay) {
            Ok(bytes) => {
                self.snapshot_cooldown.mark_fired(now);
                let artifact =
                    namer.artifact(ArtifactKind::Snapshot, self.encoder.still_format(), bytes, now);
                tracing::info!(file = %artifact.file_name, "Snapshot captured");
                Some(artifact)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Snapshot skipped");
                None
            }
        }
    }

    /// Stop the encoder and materialize the session recording, if kept.
    ///
    /// Whatever the encoder still holds is collected before it stops.
    pub fn finish(&mut self, namer: &mut ArtifactNamer, now: DateTime<Utc>) -> Option<Artifact> {
        if self.recording {
            self.record_chunk(now);
            self.encoder.stop();
            self.recording = false;
        }
        self.buffer.clear();

        let media = self.session_media.take().filter(|m| !m.is_empty())?;
        let artifact = namer.artifact(
            ArtifactKind::Recording,
            self.encoder.clip_format(),
            media,
            now,
        );
        tracing::info!(
            file = %artifact.file_name,
            bytes = artifact.bytes.len(),
            "Session recording saved"
        );
        Some(artifact)
    }
}
