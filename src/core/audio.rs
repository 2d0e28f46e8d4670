//! Ambient audio level monitoring.
//!
//! The monitor is sampled on its own cadence, independent of render ticks.
//! Each sample reduces a frequency buffer to one normalized volume and
//! publishes it through a [`SharedAudioLevel`] that the scorer reads without
//! blocking. The latest write wins.

use crate::collector::{AudioSource, CollectorError, FREQUENCY_BIN_COUNT};
use crate::core::alert::{AlertEvent, AlertSource, Severity};
use crate::core::cooldown::{Cooldown, CooldownChannel};
use chrono::{DateTime, Duration, Utc};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

pub const AUDIO_ALERT_MESSAGE: &str = "Talking / whisper detected";

/// Last-write-wins cell holding the latest normalized volume.
#[derive(Debug, Clone, Default)]
pub struct SharedAudioLevel(Arc<AtomicU64>);

impl SharedAudioLevel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self) -> f64 {
        f64::from_bits(self.0.load(Ordering::Acquire))
    }

    pub fn set(&self, level: f64) {
        self.0.store(level.to_bits(), Ordering::Release);
    }
}

/// Reduce byte-scaled frequency bins to a volume in [0, 1].
pub fn average_volume(bins: &[u8]) -> f64 {
    if bins.is_empty() {
        return 0.0;
    }
    let sum: u64 = bins.iter().map(|&b| u64::from(b)).sum();
    sum as f64 / bins.len() as f64 / 255.0
}

/// Samples an audio source and raises noise alerts.
pub struct AudioLevelMonitor {
    source: Option<Box<dyn AudioSource>>,
    bins: Vec<u8>,
    level: SharedAudioLevel,
    threshold: f64,
    cooldown: Cooldown,
    alert_display: Duration,
}

impl AudioLevelMonitor {
    pub fn new(threshold: f64, cooldown: Duration, alert_display: Duration) -> Self {
        Self {
            source: None,
            bins: vec![0; FREQUENCY_BIN_COUNT],
            level: SharedAudioLevel::new(),
            threshold,
            cooldown: Cooldown::new(CooldownChannel::AudioAlert, cooldown),
            alert_display,
        }
    }

    /// Acquire the source and start sampling.
    ///
    /// Failure is not fatal: the monitor stays inactive and the published
    /// level stays at zero. Returns whether the monitor is active.
    pub fn start(&mut self, source: Option<Box<dyn AudioSource>>) -> bool {
        let Some(mut source) = source else {
            tracing::warn!("No audio source configured; noise detection disabled");
            return false;
        };

        match source.acquire() {
            Ok(()) => {
                tracing::info!("Noise detection on");
                self.source = Some(source);
                true
            }
            Err(e) => {
                tracing::warn!(error = %e, "Microphone access failed; noise detection disabled");
                false
            }
        }
    }

    pub fn is_active(&self) -> bool {
        self.source.is_some()
    }

    /// Handle for readers of the latest level.
    pub fn level_handle(&self) -> SharedAudioLevel {
        self.level.clone()
    }

    /// Run one sampling cycle against the acquired source.
    pub fn sample(&mut self, now: DateTime<Utc>) -> Option<AlertEvent> {
        let source = self.source.as_mut()?;

        let mut bins = std::mem::take(&mut self.bins);
        let read = source.read_frequency_data(&mut bins);
        let alert = match read {
            Ok(()) => self.process_bins(&bins, now),
            Err(CollectorError::Exhausted) => {
                tracing::info!("Audio source ended; noise detection stopped");
                self.stop();
                None
            }
            Err(e) => {
                tracing::warn!(error = %e, "Audio read failed; noise detection stopped");
                self.stop();
                None
            }
        };
        self.bins = bins;
        alert
    }

    /// Publish the volume of `bins` and raise an alert if it is too loud.
    pub fn process_bins(&mut self, bins: &[u8], now: DateTime<Utc>) -> Option<AlertEvent> {
        let volume = average_volume(bins);
        self.level.set(volume);

        if volume > self.threshold && self.cooldown.try_fire(now) {
            tracing::debug!(volume, "Noise above threshold");
            return Some(AlertEvent::new(
                AlertSource::Audio,
                Severity::Warning,
                AUDIO_ALERT_MESSAGE,
                now,
                self.alert_display,
            ));
        }
        None
    }

    /// Release the source and stop sampling.
    pub fn stop(&mut self) {
        if let Some(mut source) = self.source.take() {
            source.release();
        }
        self.level.set(0.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedSource {
        level: u8,
        reads_left: usize,
        fail_acquire: bool,
    }

    impl AudioSource for FixedSource {
        fn acquire(&mut self) -> Result<(), CollectorError> {
            if self.fail_acquire {
                return Err(CollectorError::Unavailable {
                    source_name: "microphone",
                    message: "permission denied".to_string(),
                });
            }
            Ok(())
        }

        fn read_frequency_data(&mut self, bins: &mut [u8]) -> Result<(), CollectorError> {
            if self.reads_left == 0 {
                return Err(CollectorError::Exhausted);
            }
            self.reads_left -= 1;
            bins.fill(self.level);
            Ok(())
        }
    }

    fn monitor() -> AudioLevelMonitor {
        AudioLevelMonitor::new(0.18, Duration::seconds(3), Duration::seconds(2))
    }

    #[test]
    fn test_average_volume() {
        assert_eq!(average_volume(&[]), 0.0);
        assert_eq!(average_volume(&[255, 255]), 1.0);
        assert!((average_volume(&[51, 51, 51]) - 0.2).abs() < 1e-9);
    }

    #[test]
    fn test_alert_respects_cooldown() {
        let t0 = Utc::now();
        let mut monitor = monitor();
        let loud = [128u8; 8];

        let alert = monitor.process_bins(&loud, t0).unwrap();
        assert_eq!(alert.source, AlertSource::Audio);
        assert_eq!(alert.display_until, t0 + Duration::seconds(2));

        assert!(monitor
            .process_bins(&loud, t0 + Duration::milliseconds(2999))
            .is_none());
        assert!(monitor
            .process_bins(&loud, t0 + Duration::seconds(3))
            .is_some());
    }

    #[test]
    fn test_level_is_published_even_without_alert() {
        let t0 = Utc::now();
        let mut monitor = monitor();
        let handle = monitor.level_handle();

        assert!(monitor.process_bins(&[20u8; 4], t0).is_none());
        assert!((handle.get() - 20.0 / 255.0).abs() < 1e-9);
    }

    #[test]
    fn test_failed_acquisition_leaves_monitor_inactive() {
        let mut monitor = monitor();
        let started = monitor.start(Some(Box::new(FixedSource {
            level: 255,
            reads_left: 10,
            fail_acquire: true,
        })));
        assert!(!started);
        assert!(!monitor.is_active());
        assert!(monitor.sample(Utc::now()).is_none());
        assert_eq!(monitor.level_handle().get(), 0.0);

        assert!(!monitor.start(None));
    }

    #[test]
    fn test_exhausted_source_stops_monitor() {
        let t0 = Utc::now();
        let mut monitor = monitor();
        assert!(monitor.start(Some(Box::new(FixedSource {
            level: 255,
            reads_left: 1,
            fail_acquire: false,
        }))));

        assert!(monitor.sample(t0).is_some());
        assert_eq!(monitor.level_handle().get(), 1.0);

        assert!(monitor.sample(t0 + Duration::seconds(5)).is_none());
        assert!(!monitor.is_active());
        assert_eq!(monitor.level_handle().get(), 0.0);
    }
}
