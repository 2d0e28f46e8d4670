//! Detector output types consumed by the monitoring core.
//!
//! These mirror what the external inference services hand over once per
//! render tick. Coordinates of poses and object boxes are in frame pixels;
//! hand landmarks are normalized to [0, 1].

use serde::{Deserialize, Serialize};

/// Keypoint names used by the signal extractors.
pub mod keypoint {
    pub const NOSE: &str = "nose";
    pub const LEFT_SHOULDER: &str = "left_shoulder";
    pub const RIGHT_SHOULDER: &str = "right_shoulder";
}

/// A named body keypoint with detector confidence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Keypoint {
    pub name: String,
    pub x: f64,
    pub y: f64,
    pub score: f64,
}

impl Keypoint {
    pub fn new(name: impl Into<String>, x: f64, y: f64, score: f64) -> Self {
        Self {
            name: name.into(),
            x,
            y,
            score,
        }
    }
}

/// One detected person in a frame.
///
/// There is no identity across frames: the position of a pose in
/// [`DetectionFrame::poses`] is only meaningful within its own tick.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    /// Overall detection confidence
    pub score: f64,
    pub keypoints: Vec<Keypoint>,
}

impl Pose {
    /// Look up a keypoint by name.
    pub fn keypoint(&self, name: &str) -> Option<&Keypoint> {
        self.keypoints.iter().find(|k| k.name == name)
    }
}

/// A single hand landmark in normalized image coordinates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Landmark {
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub z: f64,
}

/// The 21-point landmark set of one detected hand.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Hand {
    pub landmarks: Vec<Landmark>,
}

impl Hand {
    pub const WRIST: usize = 0;
    pub const THUMB_TIP: usize = 4;
    pub const PINKY_TIP: usize = 20;
    pub const LANDMARK_COUNT: usize = 21;

    pub fn wrist(&self) -> Option<&Landmark> {
        self.landmarks.get(Self::WRIST)
    }

    pub fn thumb_tip(&self) -> Option<&Landmark> {
        self.landmarks.get(Self::THUMB_TIP)
    }

    pub fn pinky_tip(&self) -> Option<&Landmark> {
        self.landmarks.get(Self::PINKY_TIP)
    }

    /// Whether the detector produced the full landmark set.
    pub fn is_complete(&self) -> bool {
        self.landmarks.len() >= Self::LANDMARK_COUNT
    }
}

/// An object-detector prediction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectPrediction {
    /// Detector class label, e.g. "cell phone"
    #[serde(rename = "class")]
    pub label: String,
    pub score: f64,
    /// Bounding box as [x, y, width, height]
    pub bbox: [f64; 4],
}

/// Everything the inference services report for one render tick.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DetectionFrame {
    #[serde(default)]
    pub poses: Vec<Pose>,
    #[serde(default)]
    pub hands: Vec<Hand>,
    #[serde(default)]
    pub objects: Vec<ObjectPrediction>,
    /// Frame width in pixels
    #[serde(default)]
    pub width: f64,
    /// Frame height in pixels
    #[serde(default)]
    pub height: f64,
}

impl DetectionFrame {
    pub fn is_empty(&self) -> bool {
        self.poses.is_empty() && self.hands.is_empty() && self.objects.is_empty()
    }
}
