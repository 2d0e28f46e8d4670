//! Per-second timeline of suspicious-subject counts.
//!
//! Render ticks arrive far more often than once per second. The recorder keeps
//! at most one sample per interval, so the number of samples approximates the
//! number of monitored seconds.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// One timeline entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimelineSample {
    /// When the sample was taken
    pub timestamp: DateTime<Utc>,
    /// Suspicious subjects in the tick that was sampled
    pub suspicious_count: u32,
}

/// Records timeline samples at a fixed minimum interval.
pub struct TimelineRecorder {
    /// Minimum spacing between samples
    interval: Duration,
    /// Time of the last sample, or of the session start
    last_sampled: DateTime<Utc>,
    samples: Vec<TimelineSample>,
}

impl TimelineRecorder {
    /// Create a recorder for a session that started at `session_start`.
    ///
    /// The first sample is taken one interval after the start.
    pub fn new(interval: Duration, session_start: DateTime<Utc>) -> Self {
        Self {
            interval,
            last_sampled: session_start,
            samples: Vec::new(),
        }
    }

    /// Offer a tick's count. Returns whether it was recorded.
    pub fn observe(&mut self, suspicious_count: u32, now: DateTime<Utc>) -> bool {
        if now - self.last_sampled < self.interval {
            return false;
        }
        self.samples.push(TimelineSample {
            timestamp: now,
            suspicious_count,
        });
        self.last_sampled = now;
        true
    }

    pub fn samples(&self) -> &[TimelineSample] {
        &self.samples
    }

    /// Hand off the recorded samples, leaving the recorder empty.
    pub fn take(&mut self) -> Vec<TimelineSample> {
        std::mem::take(&mut self.samples)
    }
}
