//! Class-mode attention tracking.
//!
//! A subject counts toward the room total once its pose clears the pose
//! floor. It is focused only if its nose and both shoulders are confidently
//! detected and the nose stays within a strictness-scaled band around the
//! shoulder center. A subject whose keypoints are weak still counts, as
//! distracted.

use crate::collector::types::{keypoint, Pose};
use crate::core::overlay::{DrawInstruction, Point, DISTRACTED_COLOR, FOCUSED_COLOR};
use crate::core::signals::ConfidenceFloor;
use serde::{Deserialize, Serialize};

/// Ring radius around a subject's nose in class mode, in pixels.
pub const FOCUS_RING_RADIUS: f64 = 40.0;

/// Room-level attention band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FocusBand {
    Focused,
    Warning,
    Distracted,
}

impl FocusBand {
    pub fn from_percent(percent: u32) -> Self {
        if percent > 80 {
            FocusBand::Focused
        } else if percent > 50 {
            FocusBand::Warning
        } else {
            FocusBand::Distracted
        }
    }
}

/// Attention summary for one tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FocusReport {
    pub total: usize,
    pub focused: usize,
    pub percent: u32,
    pub band: FocusBand,
    #[serde(skip)]
    pub draw: Vec<DrawInstruction>,
}

pub struct FocusAssessor {
    floor: ConfidenceFloor,
    strictness: f64,
}

impl FocusAssessor {
    pub fn new(floor: ConfidenceFloor, strictness: f64) -> Self {
        Self {
            floor,
            strictness: strictness.clamp(0.0, 1.0),
        }
    }

    /// Whether a single counted subject is looking ahead.
    pub fn is_focused(&self, pose: &Pose) -> bool {
        let (Some(nose), Some(ls), Some(rs)) = (
            pose.keypoint(keypoint::NOSE),
            pose.keypoint(keypoint::LEFT_SHOULDER),
            pose.keypoint(keypoint::RIGHT_SHOULDER),
        ) else {
            return false;
        };
        if ls.score <= self.floor.keypoint
            || rs.score <= self.floor.keypoint
            || nose.score <= self.floor.keypoint
        {
            return false;
        }

        let center = (ls.x + rs.x) / 2.0;
        let width = (ls.x - rs.x).abs();
        (nose.x - center).abs() < width * (1.0 - self.strictness)
    }

    pub fn assess(&self, poses: &[Pose]) -> FocusReport {
        let mut total = 0;
        let mut focused = 0;
        let mut draw = Vec::new();

        for (index, pose) in poses.iter().enumerate() {
            if pose.score < self.floor.pose {
                continue;
            }
            total += 1;

            let is_focused = self.is_focused(pose);
            if is_focused {
                focused += 1;
            }

            let (color, label) = if is_focused {
                (FOCUSED_COLOR, "FOCUSED")
            } else {
                (DISTRACTED_COLOR, "DISTRACTED")
            };

            // Without a nose there is nothing to anchor the ring on
            let Some(nose) = pose.keypoint(keypoint::NOSE) else {
                continue;
            };
            let shoulders = pose
                .keypoint(keypoint::LEFT_SHOULDER)
                .zip(pose.keypoint(keypoint::RIGHT_SHOULDER))
                .map(|(ls, rs)| (Point::new(ls.x, ls.y), Point::new(rs.x, rs.y)));

            draw.push(DrawInstruction::Subject {
                subject_index: index,
                center: Point::new(nose.x, nose.y),
                radius: FOCUS_RING_RADIUS,
                color: color.to_string(),
                label: label.to_string(),
                label_at: Point::new(nose.x - 30.0, nose.y - 50.0),
                shoulders,
            });
        }

        let percent = if total > 0 {
            ((focused as f64 / total as f64) * 100.0).round() as u32
        } else {
            0
        };

        FocusReport {
            total,
            focused,
            percent,
            band: FocusBand::from_percent(percent),
            draw,
        }
    }
}
