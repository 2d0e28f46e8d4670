//! Signal extraction from detector output.
//!
//! Pure per-tick functions: one pose becomes head geometry ratios, and the
//! tick's hands collapse into a single gesture flag. Subjects whose detection
//! is too weak are skipped (`None`) rather than reported as errors.

use crate::collector::types::{keypoint, Hand, Pose};
use crate::core::overlay::Point;
use serde::{Deserialize, Serialize};

/// Vertical scale applied to shoulder width for the head-down ratio.
pub const HEAD_DOWN_SCALE: f64 = 1.2;

/// A hand narrower than this (normalized) reads as clenched or occluded.
pub const PALM_WIDTH_LIMIT: f64 = 0.05;

/// A wrist below this line (normalized, y grows downward) reads as held low.
pub const WRIST_LOW_LIMIT: f64 = 0.65;

/// Minimum detector confidences for a subject to be scored.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceFloor {
    /// Overall pose score
    pub pose: f64,
    /// Score of each required keypoint
    pub keypoint: f64,
}

impl ConfidenceFloor {
    pub const EXAM: ConfidenceFloor = ConfidenceFloor {
        pose: 0.10,
        keypoint: 0.25,
    };
    pub const CLASS: ConfidenceFloor = ConfidenceFloor {
        pose: 0.25,
        keypoint: 0.30,
    };
}

impl Default for ConfidenceFloor {
    fn default() -> Self {
        Self::EXAM
    }
}

/// Head and shoulder geometry of one valid subject.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PoseGeometry {
    pub nose: Point,
    pub left_shoulder: Point,
    pub right_shoulder: Point,
    pub shoulder_center: Point,
    /// Horizontal shoulder span, never zero
    pub shoulder_width: f64,
    pub head_turn_ratio: f64,
    pub head_down_ratio: f64,
}

/// Everything the scorer needs about one subject in one tick.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SignalReading {
    pub head_turn_ratio: f64,
    pub head_down_ratio: f64,
    pub gesture_suspicious: bool,
    pub audio_level: f64,
}

impl SignalReading {
    pub fn new(geometry: &PoseGeometry, gesture_suspicious: bool, audio_level: f64) -> Self {
        Self {
            head_turn_ratio: geometry.head_turn_ratio,
            head_down_ratio: geometry.head_down_ratio,
            gesture_suspicious,
            audio_level,
        }
    }
}

/// Extract head geometry from a pose, or `None` if it is too weak to score.
pub fn extract_pose_geometry(pose: &Pose, floor: ConfidenceFloor) -> Option<PoseGeometry> {
    if pose.score < floor.pose {
        return None;
    }

    let nose = pose.keypoint(keypoint::NOSE)?;
    let ls = pose.keypoint(keypoint::LEFT_SHOULDER)?;
    let rs = pose.keypoint(keypoint::RIGHT_SHOULDER)?;

    if nose.score < floor.keypoint || ls.score < floor.keypoint || rs.score < floor.keypoint {
        return None;
    }

    let shoulder_center = Point::new((ls.x + rs.x) / 2.0, (ls.y + rs.y) / 2.0);
    let span = (ls.x - rs.x).abs();
    let shoulder_width = if span == 0.0 { 1.0 } else { span };

    let head_turn_ratio = (nose.x - shoulder_center.x).abs() / shoulder_width;
    let head_down_ratio = (nose.y - shoulder_center.y) / (shoulder_width * HEAD_DOWN_SCALE);

    Some(PoseGeometry {
        nose: Point::new(nose.x, nose.y),
        left_shoulder: Point::new(ls.x, ls.y),
        right_shoulder: Point::new(rs.x, rs.y),
        shoulder_center,
        shoulder_width,
        head_turn_ratio,
        head_down_ratio,
    })
}

/// Whether a single hand is held low with a narrow palm.
pub fn is_hand_suspicious(hand: &Hand) -> bool {
    if !hand.is_complete() {
        return false;
    }
    let (Some(wrist), Some(thumb), Some(pinky)) = (hand.wrist(), hand.thumb_tip(), hand.pinky_tip())
    else {
        return false;
    };

    let palm_width = (thumb.x - pinky.x).abs();
    palm_width < PALM_WIDTH_LIMIT && wrist.y > WRIST_LOW_LIMIT
}

/// The tick's gesture flag: true if any detected hand is suspicious.
pub fn analyze_gesture(hands: &[Hand]) -> bool {
    hands.iter().any(is_hand_suspicious)
}

#[cfg(test)]
pub(crate) mod fixtures {
    use crate::collector::types::{keypoint, Hand, Keypoint, Landmark, Pose};

    /// A pose whose nose sits at the given turn and down ratios relative to a
    /// 100 px shoulder span centered at (200, 300).
    pub fn pose_with_ratios(turn: f64, down: f64) -> Pose {
        let width = 100.0;
        Pose {
            score: 0.9,
            keypoints: vec![
                Keypoint::new(keypoint::NOSE, 200.0 + turn * width, 300.0 + down * width * 1.2, 0.9),
                Keypoint::new(keypoint::LEFT_SHOULDER, 250.0, 300.0, 0.9),
                Keypoint::new(keypoint::RIGHT_SHOULDER, 150.0, 300.0, 0.9),
            ],
        }
    }

    pub fn hand(wrist_y: f64, thumb_x: f64, pinky_x: f64) -> Hand {
        let mut landmarks = vec![Landmark::default(); Hand::LANDMARK_COUNT];
        landmarks[Hand::WRIST] = Landmark { x: 0.5, y: wrist_y, z: 0.0 };
        landmarks[Hand::THUMB_TIP] = Landmark { x: thumb_x, y: wrist_y, z: 0.0 };
        landmarks[Hand::PINKY_TIP] = Landmark { x: pinky_x, y: wrist_y, z: 0.0 };
        Hand { landmarks }
    }
}
