//! Draw instructions handed to the renderer.

use serde::{Deserialize, Serialize};

pub const SUSPECT_COLOR: &str = "#dc2626";
pub const OK_COLOR: &str = "#16a34a";
pub const FOCUSED_COLOR: &str = "#059669";
pub const DISTRACTED_COLOR: &str = "#dc2626";
pub const OBJECT_COLOR: &str = "red";

/// A point in frame pixel coordinates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// One overlay element for the current frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "shape", rename_all = "snake_case")]
pub enum DrawInstruction {
    /// Ring around a subject's head, a label above it and the shoulder line.
    Subject {
        subject_index: usize,
        center: Point,
        radius: f64,
        color: String,
        label: String,
        label_at: Point,
        shoulders: Option<(Point, Point)>,
    },
    /// Bounding box around a flagged object.
    ObjectBox {
        bbox: [f64; 4],
        color: String,
        label: String,
    },
}

impl DrawInstruction {
    pub fn color(&self) -> &str {
        match self {
            DrawInstruction::Subject { color, .. } | DrawInstruction::ObjectBox { color, .. } => {
                color
            }
        }
    }

    pub fn label(&self) -> &str {
        match self {
            DrawInstruction::Subject { label, .. } | DrawInstruction::ObjectBox { label, .. } => {
                label
            }
        }
    }
}
