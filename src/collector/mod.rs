//! Input collection for the FocusAI monitor.
//!
//! The perceptual models, the microphone and the media encoder live outside
//! this crate. This module defines the seams they plug into and ships replay
//! implementations that read recorded detector output from JSON Lines files.

pub mod encoder;
pub mod replay;
pub mod types;

use crate::core::overlay::DrawInstruction;
use crate::error::CaptureError;

// Re-export commonly used types
pub use encoder::DetectionLogEncoder;
pub use replay::{JsonlAudioSource, JsonlFrameSource};
pub use types::{keypoint, DetectionFrame, Hand, Keypoint, Landmark, ObjectPrediction, Pose};

/// Number of frequency bins delivered per audio read (FFT size 512).
pub const FREQUENCY_BIN_COUNT: usize = 256;

/// Result of polling a frame source.
#[derive(Debug, Clone, PartialEq)]
pub enum FramePoll {
    /// A new frame of detector output is available.
    Ready(DetectionFrame),
    /// No new inference result yet; try again next tick.
    Pending,
    /// The source has ended and will never produce another frame.
    Exhausted,
}

/// Per-tick detector output from the external inference services.
pub trait FrameSource {
    /// Bring the inference services up. Failure is fatal to the session.
    fn start(&mut self) -> Result<(), CollectorError>;

    /// Fetch the next frame without blocking.
    fn poll_frame(&mut self) -> FramePoll;

    /// Stop producing frames.
    fn stop(&mut self);
}

/// A frequency-domain audio feed.
pub trait AudioSource: Send {
    /// Acquire the device. Failure leaves the audio monitor inactive.
    fn acquire(&mut self) -> Result<(), CollectorError>;

    /// Fill `bins` with byte-scaled frequency energy.
    fn read_frequency_data(&mut self, bins: &mut [u8]) -> Result<(), CollectorError>;

    /// Release the device.
    fn release(&mut self) {}
}

/// Container format of an encoded artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MediaFormat {
    pub mime: &'static str,
    pub extension: &'static str,
}

impl MediaFormat {
    pub const WEBM: MediaFormat = MediaFormat {
        mime: "video/webm",
        extension: "webm",
    };
    pub const PNG: MediaFormat = MediaFormat {
        mime: "image/png",
        extension: "png",
    };
    pub const JSON: MediaFormat = MediaFormat {
        mime: "application/json",
        extension: "json",
    };
    pub const JSONL: MediaFormat = MediaFormat {
        mime: "application/x-ndjson",
        extension: "jsonl",
    };
}

/// Produces the media chunks and still images that evidence capture stores.
pub trait MediaEncoder: Send {
    /// Begin recording.
    fn start(&mut self) -> Result<(), CaptureError>;

    /// Let the encoder see the frame being rendered this tick.
    fn observe(&mut self, _frame: &DetectionFrame) {}

    /// Take whatever has been encoded since the previous call.
    ///
    /// `Ok(None)` means nothing new was produced.
    fn take_chunk(&mut self) -> Result<Option<Vec<u8>>, CaptureError>;

    /// Encode the composited surface (frame plus overlays) as a still image.
    fn encode_still(
        &mut self,
        frame: &DetectionFrame,
        overlay: &[DrawInstruction],
    ) -> Result<Vec<u8>, CaptureError>;

    /// Stop recording. Any partially encoded chunk is discarded.
    fn stop(&mut self);

    fn clip_format(&self) -> MediaFormat;

    fn still_format(&self) -> MediaFormat;
}

/// Errors raised by input sources.
#[derive(Debug, thiserror::Error)]
pub enum CollectorError {
    #[error("Source is already running")]
    AlreadyRunning,

    #[error("{source_name} unavailable: {message}")]
    Unavailable {
        source_name: &'static str,
        message: String,
    },

    #[error("Source has no more data")]
    Exhausted,

    #[error("Line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
