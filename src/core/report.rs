//! End-of-session report.
//!
//! The timeline reduces to a handful of statistics. The report wraps them
//! with enough metadata (session, producer, station, mode) to be filed on its
//! own, and keeps the raw samples with wall-clock labels in the configured
//! time zone.

use crate::config::MonitorMode;
use crate::core::timeline::TimelineSample;
use crate::error::ReportError;
use crate::transparency::TransparencyStats;
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use statrs::statistics::{Data, OrderStatistics, Statistics};
use uuid::Uuid;

/// Version of the report payload layout.
pub const REPORT_VERSION: &str = "1.0";

/// The name of this producer.
pub const PRODUCER_NAME: &str = "focusai-monitor";

/// Round to two decimals for display.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Statistics over the suspicious counts of a timeline.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimelineSummary {
    /// One sample is taken per monitored second
    pub sampled_seconds: usize,
    pub max_suspicious: u32,
    /// Mean count, rounded to two decimals
    pub avg_suspicious: f64,
    pub std_dev_suspicious: f64,
    pub p95_suspicious: f64,
}

impl TimelineSummary {
    /// Reduce a timeline. An empty timeline has nothing to summarize.
    pub fn from_samples(samples: &[TimelineSample]) -> Result<Self, ReportError> {
        if samples.is_empty() {
            return Err(ReportError::EmptySession);
        }

        let counts: Vec<f64> = samples
            .iter()
            .map(|s| f64::from(s.suspicious_count))
            .collect();
        let max_suspicious = samples
            .iter()
            .map(|s| s.suspicious_count)
            .fold(0, u32::max);
        let mean = counts.iter().sum::<f64>() / counts.len() as f64;
        let std_dev = if counts.len() > 1 {
            counts.iter().population_std_dev()
        } else {
            0.0
        };
        let p95 = Data::new(counts).percentile(95);

        Ok(Self {
            sampled_seconds: samples.len(),
            max_suspicious,
            avg_suspicious: round2(mean),
            std_dev_suspicious: round2(std_dev),
            p95_suspicious: round2(p95),
        })
    }
}

/// Producer metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportProducer {
    pub name: String,
    pub version: String,
}

/// One timeline sample as written to the report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportSample {
    pub timestamp: DateTime<Utc>,
    /// Wall-clock label in the report time zone
    pub local_time: String,
    pub suspicious_count: u32,
}

/// The exportable session report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionReport {
    pub report_version: String,
    pub session_id: String,
    pub producer: ReportProducer,
    pub mode: MonitorMode,
    /// Host the session ran on
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub station: Option<String>,
    pub timezone: String,
    pub generated_at: DateTime<Utc>,
    #[serde(flatten)]
    pub summary: TimelineSummary,
    pub raw_samples: Vec<ReportSample>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transparency: Option<TransparencyStats>,
}

impl SessionReport {
    pub fn to_json_bytes(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec_pretty(self)
    }

    pub fn from_json(content: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(content)
    }

    /// Human-readable summary for the terminal.
    pub fn render_text(&self) -> String {
        let s = &self.summary;
        let mut text = format!(
            "Session Report ({})\n\
             - Session: {}\n\
             - Station: {}\n\
             - Generated: {}\n\
             - Monitored seconds: {}\n\
             - Peak suspicious subjects: {}\n\
             - Average suspicious subjects: {:.2}\n\
             - Standard deviation: {:.2}\n\
             - 95th percentile: {:.2}",
            self.mode,
            self.session_id,
            self.station.as_deref().unwrap_or("unknown"),
            self.generated_at.to_rfc3339(),
            s.sampled_seconds,
            s.max_suspicious,
            s.avg_suspicious,
            s.std_dev_suspicious,
            s.p95_suspicious,
        );

        if let (Some(first), Some(last)) = (self.raw_samples.first(), self.raw_samples.last()) {
            text.push_str(&format!(
                "\n- Window: {} to {} ({})",
                first.local_time, last.local_time, self.timezone
            ));
        }
        text
    }
}

/// Builds [`SessionReport`]s for one session.
pub struct ReportSummarizer {
    session_id: Uuid,
    mode: MonitorMode,
    timezone: Tz,
    station: Option<String>,
}

impl ReportSummarizer {
    /// Create a summarizer with a fresh session ID.
    pub fn new(mode: MonitorMode, timezone: Tz) -> Self {
        let station = hostname::get()
            .ok()
            .and_then(|h| h.into_string().ok());

        Self {
            session_id: Uuid::new_v4(),
            mode,
            timezone,
            station,
        }
    }

    /// Override the station name.
    pub fn with_station(mut self, station: Option<String>) -> Self {
        self.station = station;
        self
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    /// Summarize a timeline into a report.
    pub fn summarize(
        &self,
        samples: &[TimelineSample],
        transparency: Option<TransparencyStats>,
        generated_at: DateTime<Utc>,
    ) -> Result<SessionReport, ReportError> {
        let summary = TimelineSummary::from_samples(samples)?;

        let raw_samples = samples
            .iter()
            .map(|s| ReportSample {
                timestamp: s.timestamp,
                local_time: s
                    .timestamp
                    .with_timezone(&self.timezone)
                    .format("%H:%M:%S")
                    .to_string(),
                suspicious_count: s.suspicious_count,
            })
            .collect();

        Ok(SessionReport {
            report_version: REPORT_VERSION.to_string(),
            session_id: self.session_id.to_string(),
            producer: ReportProducer {
                name: PRODUCER_NAME.to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
            mode: self.mode,
            station: self.station.clone(),
            timezone: self.timezone.name().to_string(),
            generated_at,
            summary,
            raw_samples,
            transparency,
        })
    }
}
