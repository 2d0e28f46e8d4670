//! Alert events raised for the UI.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Which monitor raised an alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertSource {
    Audio,
    Object,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Warning,
    Critical,
}

/// An alert banner request.
///
/// `display_until` is independent of the cooldown that gated the alert.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertEvent {
    pub source: AlertSource,
    pub message: String,
    pub severity: Severity,
    pub raised_at: DateTime<Utc>,
    pub display_until: DateTime<Utc>,
}

impl AlertEvent {
    pub fn new(
        source: AlertSource,
        severity: Severity,
        message: impl Into<String>,
        raised_at: DateTime<Utc>,
        display_for: Duration,
    ) -> Self {
        Self {
            source,
            message: message.into(),
            severity,
            raised_at,
            display_until: raised_at + display_for,
        }
    }

    /// Whether the banner should still be shown at `now`.
    pub fn is_displayed(&self, now: DateTime<Utc>) -> bool {
        now < self.display_until
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_window() {
        let t0 = Utc::now();
        let alert = AlertEvent::new(
            AlertSource::Audio,
            Severity::Warning,
            "noise",
            t0,
            Duration::seconds(2),
        );
        assert!(alert.is_displayed(t0 + Duration::milliseconds(1999)));
        assert!(!alert.is_displayed(t0 + Duration::seconds(2)));
    }
}
