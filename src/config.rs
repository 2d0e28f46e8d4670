//! Configuration for the FocusAI monitor.

use crate::core::scoring::ScoringRules;
use crate::core::signals::ConfidenceFloor;
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Which monitoring policy a session runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MonitorMode {
    /// Suspicion scoring, evidence capture and reporting.
    #[default]
    Exam,
    /// Attention tracking with a whole-session recording.
    Class,
}

impl std::str::FromStr for MonitorMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "exam" => Ok(MonitorMode::Exam),
            "class" => Ok(MonitorMode::Class),
            other => Err(ConfigError::Parse(format!("unknown mode '{other}'"))),
        }
    }
}

impl std::fmt::Display for MonitorMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MonitorMode::Exam => write!(f, "exam"),
            MonitorMode::Class => write!(f, "class"),
        }
    }
}

/// Main configuration for the monitor.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Default mode for `focusai monitor`
    pub mode: MonitorMode,

    /// Suspicion rule thresholds and weights
    pub scoring: ScoringRules,

    /// Cooldowns for every rate-limited side effect
    pub cooldowns: CooldownConfig,

    /// Time windows for decaying and rolling state
    pub windows: WindowConfig,

    /// Detector confidence floors in exam mode
    pub exam_floor: ConfidenceFloor,

    /// Detector confidence floors in class mode
    pub class_floor: ConfidenceFloor,

    /// Class-mode strictness in [0, 1]; higher tolerates less head offset
    pub focus_strictness: f64,

    /// Minimum object-detector confidence for phone/paper alerts
    pub object_confidence_floor: f64,

    /// Render ticks per second
    pub render_fps: u32,

    /// Cadence of the audio sampling loop
    #[serde(with = "duration_serde")]
    pub audio_sample_interval: Duration,

    /// Cadence of media chunk production
    #[serde(with = "duration_serde")]
    pub chunk_interval: Duration,

    /// Directory for clips, snapshots and reports
    pub export_path: PathBuf,

    /// Directory for the transparency log
    pub data_path: PathBuf,

    /// IANA time zone used for report time labels
    pub report_timezone: String,

    /// Station name written into reports; the host name when unset
    pub station_name: Option<String>,

    /// Whether class mode saves the whole-session recording at stop
    pub save_class_recording: bool,

    pub logging: LoggingConfig,
}

impl Default for Config {
    fn default() -> Self {
        let data_dir = dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("focusai-monitor");

        Self {
            mode: MonitorMode::Exam,
            scoring: ScoringRules::default(),
            cooldowns: CooldownConfig::default(),
            windows: WindowConfig::default(),
            exam_floor: ConfidenceFloor::EXAM,
            class_floor: ConfidenceFloor::CLASS,
            focus_strictness: 0.5,
            object_confidence_floor: 0.5,
            render_fps: 30,
            audio_sample_interval: Duration::from_millis(50),
            chunk_interval: Duration::from_millis(200),
            export_path: data_dir.join("exports"),
            data_path: data_dir,
            report_timezone: "UTC".to_string(),
            station_name: None,
            save_class_recording: true,
            logging: LoggingConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from the default location.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::config_path())
    }

    /// Load configuration from a specific file, falling back to defaults
    /// when the file does not exist.
    pub fn load_from(path: &std::path::Path) -> Result<Self, ConfigError> {
        if path.exists() {
            let content =
                std::fs::read_to_string(path).map_err(|e| ConfigError::Io(e.to_string()))?;
            let config: Config =
                serde_json::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))?;
            config.validate()?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to the default location.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::config_path())
    }

    /// Save configuration to a specific file.
    pub fn save_to(&self, path: &std::path::Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::Io(e.to_string()))?;
        }

        let content = serde_json::to_string_pretty(self)
            .map_err(|e| ConfigError::Serialize(e.to_string()))?;

        std::fs::write(path, content).map_err(|e| ConfigError::Io(e.to_string()))?;

        Ok(())
    }

    /// Get the path to the configuration file.
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("focusai-monitor")
            .join("config.json")
    }

    /// Ensure all required directories exist.
    pub fn ensure_directories(&self) -> Result<(), ConfigError> {
        std::fs::create_dir_all(&self.export_path).map_err(|e| ConfigError::Io(e.to_string()))?;
        std::fs::create_dir_all(&self.data_path).map_err(|e| ConfigError::Io(e.to_string()))?;
        Ok(())
    }

    /// Confidence floor for the given mode.
    pub fn floor_for(&self, mode: MonitorMode) -> ConfidenceFloor {
        match mode {
            MonitorMode::Exam => self.exam_floor,
            MonitorMode::Class => self.class_floor,
        }
    }

    /// Parsed report time zone.
    pub fn timezone(&self) -> Result<Tz, ConfigError> {
        self.report_timezone
            .parse::<Tz>()
            .map_err(|_| ConfigError::InvalidTimezone(self.report_timezone.clone()))
    }

    /// Reject configurations the scoring and capture logic cannot honor.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.scoring.validate()?;
        self.timezone()?;

        if !(0.0..=1.0).contains(&self.focus_strictness) {
            return Err(ConfigError::InvalidThreshold(format!(
                "focus_strictness must be within [0, 1], got {}",
                self.focus_strictness
            )));
        }
        if !(0.0..=1.0).contains(&self.object_confidence_floor) {
            return Err(ConfigError::InvalidThreshold(format!(
                "object_confidence_floor must be within [0, 1], got {}",
                self.object_confidence_floor
            )));
        }
        if self.render_fps == 0 {
            return Err(ConfigError::InvalidThreshold(
                "render_fps must be positive".to_string(),
            ));
        }
        if self.audio_sample_interval.is_zero() || self.chunk_interval.is_zero() {
            return Err(ConfigError::InvalidThreshold(
                "sampling intervals must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Cooldowns for the rate-limited side effects.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CooldownConfig {
    #[serde(with = "duration_serde")]
    pub audio_alert: Duration,
    #[serde(with = "duration_serde")]
    pub object_alert: Duration,
    #[serde(with = "duration_serde")]
    pub evidence_clip: Duration,
    #[serde(with = "duration_serde")]
    pub snapshot: Duration,
    /// How long an alert banner stays up, independent of the cooldowns
    #[serde(with = "duration_serde")]
    pub alert_display: Duration,
}

impl Default for CooldownConfig {
    fn default() -> Self {
        Self {
            audio_alert: Duration::from_secs(3),
            object_alert: Duration::from_secs(4),
            evidence_clip: Duration::from_secs(7),
            snapshot: Duration::from_secs(5),
            alert_display: Duration::from_secs(2),
        }
    }
}

/// Time windows for rolling and decaying state.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    #[serde(with = "duration_serde")]
    pub heat_decay: Duration,
    #[serde(with = "duration_serde")]
    pub clip_buffer: Duration,
    #[serde(with = "duration_serde")]
    pub timeline_interval: Duration,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            heat_decay: Duration::from_secs(20),
            clip_buffer: Duration::from_secs(5),
            timeline_interval: Duration::from_secs(1),
        }
    }
}

/// Tracing subscriber settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive when `RUST_LOG` is unset
    pub level: String,
    /// Emit JSON lines instead of human-readable output
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

/// Configuration errors.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(String),
    #[error("Parse error: {0}")]
    Parse(String),
    #[error("Serialize error: {0}")]
    Serialize(String),
    #[error("Unknown time zone: {0}")]
    InvalidTimezone(String),
    #[error("Invalid threshold: {0}")]
    InvalidThreshold(String),
}

/// Convert a configured duration into the chrono arithmetic type.
pub fn chrono_duration(duration: Duration) -> chrono::Duration {
    chrono::Duration::milliseconds(duration.as_millis() as i64)
}

/// Serde support for Duration, stored as milliseconds.
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        (duration.as_millis() as u64).serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.mode, MonitorMode::Exam);
        assert_eq!(config.cooldowns.evidence_clip, Duration::from_secs(7));
        assert_eq!(config.cooldowns.snapshot, Duration::from_secs(5));
        assert_eq!(config.windows.heat_decay, Duration::from_secs(20));
        assert_eq!(config.chunk_interval, Duration::from_millis(200));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_mode_parsing() {
        assert_eq!("exam".parse::<MonitorMode>().unwrap(), MonitorMode::Exam);
        assert_eq!(" Class ".parse::<MonitorMode>().unwrap(), MonitorMode::Class);
        assert!("lecture".parse::<MonitorMode>().is_err());
    }

    #[test]
    fn test_durations_serialize_as_millis() {
        let json = serde_json::to_value(CooldownConfig::default()).unwrap();
        assert_eq!(json["evidence_clip"], 7000);
        assert_eq!(json["alert_display"], 2000);
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: Config =
            serde_json::from_str(r#"{"mode": "class", "render_fps": 15}"#).unwrap();
        assert_eq!(config.mode, MonitorMode::Class);
        assert_eq!(config.render_fps, 15);
        assert_eq!(config.cooldowns.object_alert, Duration::from_secs(4));
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let path = std::env::temp_dir()
            .join("focusai-config-test")
            .join(format!("{}.json", uuid::Uuid::new_v4()));
        let mut config = Config::default();
        config.report_timezone = "Asia/Kolkata".to_string();
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.report_timezone, "Asia/Kolkata");
        assert_eq!(loaded.timezone().unwrap(), chrono_tz::Asia::Kolkata);
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        let mut config = Config::default();
        config.report_timezone = "Mars/Olympus".to_string();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidTimezone(_))
        ));

        let mut config = Config::default();
        config.focus_strictness = 1.5;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidThreshold(_))
        ));

        let mut config = Config::default();
        config.render_fps = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_chrono_duration_conversion() {
        assert_eq!(
            chrono_duration(Duration::from_millis(1500)),
            chrono::Duration::milliseconds(1500)
        );
    }
}
