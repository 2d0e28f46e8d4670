//! Forbidden-object alerts.
//!
//! Only an allow-list of detector classes is considered. Every qualifying
//! detection is boxed on the overlay, while the alert and the snapshot it
//! requests share one cooldown.

use crate::collector::types::ObjectPrediction;
use crate::core::alert::{AlertEvent, AlertSource, Severity};
use crate::core::cooldown::{Cooldown, CooldownChannel};
use crate::core::overlay::{DrawInstruction, OBJECT_COLOR};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Forbidden object categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectClass {
    Phone,
    Paper,
}

impl ObjectClass {
    /// Map a detector class label onto the allow-list.
    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "cell phone" => Some(ObjectClass::Phone),
            "book" => Some(ObjectClass::Paper),
            _ => None,
        }
    }

    pub fn overlay_label(self) -> &'static str {
        match self {
            ObjectClass::Phone => "PHONE DETECTED",
            ObjectClass::Paper => "CHEAT SHEET",
        }
    }

    pub fn alert_message(self) -> &'static str {
        match self {
            ObjectClass::Phone => "CHEATING: Phone Detected!",
            ObjectClass::Paper => "CHEATING: Paper / Book Detected!",
        }
    }
}

/// A detection that passed the allow-list and the confidence floor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlaggedObject {
    pub class: ObjectClass,
    pub score: f64,
    pub bbox: [f64; 4],
}

/// What the object monitor produced for one tick.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObjectScan {
    pub flagged: Vec<FlaggedObject>,
    pub boxes: Vec<DrawInstruction>,
    pub alert: Option<AlertEvent>,
    /// Whether a snapshot should be captured this tick
    pub snapshot_requested: bool,
}

pub struct ObjectAlertMonitor {
    confidence_floor: f64,
    cooldown: Cooldown,
    alert_display: Duration,
}

impl ObjectAlertMonitor {
    pub fn new(confidence_floor: f64, cooldown: Duration, alert_display: Duration) -> Self {
        Self {
            confidence_floor,
            cooldown: Cooldown::new(CooldownChannel::ObjectAlert, cooldown),
            alert_display,
        }
    }

    /// Filter one tick's detections and raise at most one alert.
    pub fn scan(&mut self, objects: &[ObjectPrediction], now: DateTime<Utc>) -> ObjectScan {
        let mut scan = ObjectScan::default();

        for object in objects {
            let Some(class) = ObjectClass::from_label(&object.label) else {
                continue;
            };
            if object.score < self.confidence_floor {
                continue;
            }

            scan.boxes.push(DrawInstruction::ObjectBox {
                bbox: object.bbox,
                color: OBJECT_COLOR.to_string(),
                label: class.overlay_label().to_string(),
            });

            if scan.alert.is_none() && self.cooldown.try_fire(now) {
                tracing::debug!(?class, score = object.score, "Forbidden object flagged");
                scan.alert = Some(AlertEvent::new(
                    AlertSource::Object,
                    Severity::Critical,
                    class.alert_message(),
                    now,
                    self.alert_display,
                ));
                scan.snapshot_requested = true;
            }

            scan.flagged.push(FlaggedObject {
                class,
                score: object.score,
                bbox: object.bbox,
            });
        }

        scan
    }
}
