//! Detection-log media encoder.
//!
//! Headless deployments have no video surface to encode, so evidence is the
//! detector output itself: chunks are JSON Lines of the frames observed since
//! the previous chunk, and stills are the frame together with the overlay
//! that was drawn on it.

use super::{MediaEncoder, MediaFormat};
use crate::collector::types::DetectionFrame;
use crate::core::overlay::DrawInstruction;
use crate::error::CaptureError;
use serde::Serialize;

/// Still-image payload: the composited surface as data.
#[derive(Serialize)]
struct CompositedStill<'a> {
    frame: &'a DetectionFrame,
    overlay: &'a [DrawInstruction],
}

/// Encodes observed frames as JSON Lines chunks.
#[derive(Debug, Default)]
pub struct DetectionLogEncoder {
    pending: Vec<u8>,
    recording: bool,
}

impl DetectionLogEncoder {
    pub fn new() -> Self {
        Self::default()
    }
}

impl MediaEncoder for DetectionLogEncoder {
    fn start(&mut self) -> Result<(), CaptureError> {
        self.pending.clear();
        self.recording = true;
        Ok(())
    }

    fn observe(&mut self, frame: &DetectionFrame) {
        if !self.recording {
            return;
        }
        match serde_json::to_vec(frame) {
            Ok(mut line) => {
                line.push(b'\n');
                self.pending.extend_from_slice(&line);
            }
            Err(e) => tracing::warn!(error = %e, "Could not encode frame"),
        }
    }

    fn take_chunk(&mut self) -> Result<Option<Vec<u8>>, CaptureError> {
        if !self.recording {
            return Err(CaptureError::EncoderUnavailable);
        }
        if self.pending.is_empty() {
            return Ok(None);
        }
        Ok(Some(std::mem::take(&mut self.pending)))
    }

    fn encode_still(
        &mut self,
        frame: &DetectionFrame,
        overlay: &[DrawInstruction],
    ) -> Result<Vec<u8>, CaptureError> {
        if !self.recording {
            return Err(CaptureError::EncoderUnavailable);
        }
        serde_json::to_vec_pretty(&CompositedStill { frame, overlay }).map_err(|e| {
            CaptureError::Encoder {
                message: e.to_string(),
            }
        })
    }

    fn stop(&mut self) {
        self.recording = false;
        self.pending.clear();
    }

    fn clip_format(&self) -> MediaFormat {
        MediaFormat::JSONL
    }

    fn still_format(&self) -> MediaFormat {
        MediaFormat::JSON
    }
}
