//! JSON Lines replay sources.
//!
//! A recorded session is a file with one [`DetectionFrame`] per line for the
//! video side, and optionally a second file with one array of frequency bins
//! per line for the audio side.

use super::{AudioSource, CollectorError, FramePoll, FrameSource};
use crate::collector::types::DetectionFrame;
use crossbeam_channel::{bounded, Receiver, TryRecvError};
use std::fs::File;
use std::io::{BufRead, BufReader, Lines};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;

/// Frames parsed ahead of the render loop.
const FRAME_QUEUE_CAPACITY: usize = 256;

/// Replays detector output recorded as JSON Lines.
///
/// Parsing happens on a reader thread feeding a bounded channel, so a slow
/// render loop applies backpressure to the reader instead of buffering the
/// whole file.
pub struct JsonlFrameSource {
    path: PathBuf,
    receiver: Option<Receiver<DetectionFrame>>,
    reader: Option<JoinHandle<()>>,
    running: Arc<AtomicBool>,
}

impl JsonlFrameSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            receiver: None,
            reader: None,
            running: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Check if the reader is currently running.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}

impl FrameSource for JsonlFrameSource {
    fn start(&mut self) -> Result<(), CollectorError> {
        if self.is_running() {
            return Err(CollectorError::AlreadyRunning);
        }

        let file = File::open(&self.path).map_err(|e| CollectorError::Unavailable {
            source_name: "frame stream",
            message: format!("{}: {e}", self.path.display()),
        })?;

        let (sender, receiver) = bounded(FRAME_QUEUE_CAPACITY);
        let running = self.running.clone();
        running.store(true, Ordering::SeqCst);

        let handle = std::thread::spawn(move || {
            for (index, line) in BufReader::new(file).lines().enumerate() {
                if !running.load(Ordering::SeqCst) {
                    break;
                }
                let line = match line {
                    Ok(line) => line,
                    Err(e) => {
                        tracing::warn!(error = %e, "Frame stream read failed");
                        break;
                    }
                };
                if line.trim().is_empty() {
                    continue;
                }
                match serde_json::from_str::<DetectionFrame>(&line) {
                    Ok(frame) => {
                        if sender.send(frame).is_err() {
                            break;
                        }
                    }
                    Err(e) => {
                        tracing::warn!(line = index + 1, error = %e, "Skipping malformed frame");
                    }
                }
            }
            running.store(false, Ordering::SeqCst);
        });

        self.receiver = Some(receiver);
        self.reader = Some(handle);
        Ok(())
    }

    fn poll_frame(&mut self) -> FramePoll {
        let Some(receiver) = self.receiver.as_ref() else {
            return FramePoll::Exhausted;
        };
        match receiver.try_recv() {
            Ok(frame) => FramePoll::Ready(frame),
            Err(TryRecvError::Empty) => FramePoll::Pending,
            Err(TryRecvError::Disconnected) => FramePoll::Exhausted,
        }
    }

    fn stop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        // Dropping the receiver unblocks a reader waiting on a full queue.
        self.receiver = None;
        if let Some(handle) = self.reader.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for JsonlFrameSource {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Replays frequency-bin arrays recorded as JSON Lines.
pub struct JsonlAudioSource {
    path: PathBuf,
    lines: Option<Lines<BufReader<File>>>,
    line_number: usize,
}

impl JsonlAudioSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lines: None,
            line_number: 0,
        }
    }
}

impl AudioSource for JsonlAudioSource {
    fn acquire(&mut self) -> Result<(), CollectorError> {
        if self.lines.is_some() {
            return Err(CollectorError::AlreadyRunning);
        }
        let file = File::open(&self.path).map_err(|e| CollectorError::Unavailable {
            source_name: "microphone",
            message: format!("{}: {e}", self.path.display()),
        })?;
        self.lines = Some(BufReader::new(file).lines());
        self.line_number = 0;
        Ok(())
    }

    fn read_frequency_data(&mut self, bins: &mut [u8]) -> Result<(), CollectorError> {
        let lines = self.lines.as_mut().ok_or(CollectorError::Unavailable {
            source_name: "microphone",
            message: "not acquired".to_string(),
        })?;

        loop {
            let line = lines.next().ok_or(CollectorError::Exhausted)??;
            self.line_number += 1;
            if line.trim().is_empty() {
                continue;
            }

            let values: Vec<u8> =
                serde_json::from_str(&line).map_err(|e| CollectorError::Parse {
                    line: self.line_number,
                    message: e.to_string(),
                })?;

            bins.fill(0);
            for (bin, value) in bins.iter_mut().zip(values) {
                *bin = value;
            }
            return Ok(());
        }
    }

    fn release(&mut self) {
        self.lines = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_temp(name: &str, contents: &str) -> PathBuf {
        let dir = std::env::temp_dir().join("focusai-replay-test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join(format!("{}-{name}", uuid::Uuid::new_v4()));
        let mut file = File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        path
    }

    fn drain(source: &mut JsonlFrameSource) -> Vec<DetectionFrame> {
        let mut frames = Vec::new();
        loop {
            match source.poll_frame() {
                FramePoll::Ready(frame) => frames.push(frame),
                FramePoll::Pending => std::thread::sleep(std::time::Duration::from_millis(1)),
                FramePoll::Exhausted => return frames,
            }
        }
    }

    #[test]
    fn test_frame_source_skips_malformed_lines() {
        let path = write_temp(
            "frames.jsonl",
            "{\"width\": 640}\nnot json\n\n{\"height\": 480}\n",
        );
        let mut source = JsonlFrameSource::new(&path);
        source.start().unwrap();

        let frames = drain(&mut source);
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0].width, 640.0);
        assert_eq!(frames[1].height, 480.0);
        source.stop();
        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn test_frame_source_missing_file_is_unavailable() {
        let mut source = JsonlFrameSource::new("/nonexistent/focusai/frames.jsonl");
        assert!(matches!(
            source.start(),
            Err(CollectorError::Unavailable { .. })
        ));
        assert_eq!(source.poll_frame(), FramePoll::Exhausted);
    }

    #[test]
    fn test_audio_source_pads_and_exhausts() {
        let path = write_temp("audio.jsonl", "[255, 255]\n[10]\n");
        let mut source = JsonlAudioSource::new(&path);
        source.acquire().unwrap();

        let mut bins = [7u8; 4];
        source.read_frequency_data(&mut bins).unwrap();
        assert_eq!(bins, [255, 255, 0, 0]);

        source.read_frequency_data(&mut bins).unwrap();
        assert_eq!(bins, [10, 0, 0, 0]);

        assert!(matches!(
            source.read_frequency_data(&mut bins),
            Err(CollectorError::Exhausted)
        ));
        source.release();
        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn test_audio_source_requires_acquire() {
        let mut source = JsonlAudioSource::new("/nonexistent/audio.jsonl");
        let mut bins = [0u8; 4];
        assert!(source.read_frequency_data(&mut bins).is_err());
        assert!(source.acquire().is_err());
    }
}
