//! Decaying heatmap of where suspicious subjects were seen.
//!
//! Points are appended at the nose position of every suspicious verdict and
//! fade linearly over the decay window. Eviction happens on every render, so
//! the store never holds a point older than the window for longer than one
//! tick.

use crate::core::overlay::Point;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Radius of a rendered heat blob, in pixels.
pub const HEAT_RADIUS: f64 = 60.0;

/// Fill opacity of a blob at full intensity.
pub const HEAT_FILL_OPACITY: f64 = 0.4;

/// A recorded suspicious position.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HeatPoint {
    pub position: Point,
    pub created_at: DateTime<Utc>,
}

/// A live point with its current intensity.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HeatSample {
    pub position: Point,
    /// Intensity in (0, 1], fading with age
    pub alpha: f64,
}

impl HeatSample {
    /// Opacity the renderer should fill this blob with.
    pub fn fill_opacity(&self) -> f64 {
        self.alpha * HEAT_FILL_OPACITY
    }
}

/// Alpha-weighted density over a fixed grid, normalized to the hottest cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeatGrid {
    pub cols: usize,
    pub rows: usize,
    /// Row-major cell values in [0, 1]
    pub cells: Vec<f64>,
}

impl HeatGrid {
    pub fn get(&self, col: usize, row: usize) -> f64 {
        self.cells[row * self.cols + col]
    }

    /// Cell with the highest density, if any cell is warm.
    pub fn hottest(&self) -> Option<(usize, usize)> {
        self.cells
            .iter()
            .enumerate()
            .filter(|(_, v)| **v > 0.0)
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(i, _)| (i % self.cols, i / self.cols))
    }
}

pub struct HeatmapTracker {
    points: Vec<HeatPoint>,
    window: Duration,
}

impl HeatmapTracker {
    pub fn new(window: Duration) -> Self {
        Self {
            points: Vec::new(),
            window,
        }
    }

    pub fn record(&mut self, position: Point, now: DateTime<Utc>) {
        self.points.push(HeatPoint {
            position,
            created_at: now,
        });
    }

    /// Evict expired points and return the live ones with their intensity.
    pub fn render(&mut self, now: DateTime<Utc>) -> Vec<HeatSample> {
        self.evict(now);
        self.points
            .iter()
            .map(|p| HeatSample {
                position: p.position,
                alpha: self.alpha(p, now),
            })
            .collect()
    }

    /// Aggregate live points into a `cols` x `rows` grid covering a
    /// `width` x `height` frame.
    pub fn grid(
        &mut self,
        now: DateTime<Utc>,
        cols: usize,
        rows: usize,
        width: f64,
        height: f64,
    ) -> HeatGrid {
        let cols = cols.max(1);
        let rows = rows.max(1);
        let mut cells = vec![0.0; cols * rows];

        if width > 0.0 && height > 0.0 {
            for sample in self.render(now) {
                let nx = (sample.position.x / width).clamp(0.0, 1.0);
                let ny = (sample.position.y / height).clamp(0.0, 1.0);
                let col = ((nx * cols as f64) as usize).min(cols - 1);
                let row = ((ny * rows as f64) as usize).min(rows - 1);
                cells[row * cols + col] += sample.alpha;
            }
        }

        let max = cells.iter().copied().fold(0.0, f64::max);
        if max > 0.0 {
            for cell in &mut cells {
                *cell /= max;
            }
        }

        HeatGrid { cols, rows, cells }
    }

    pub fn clear(&mut self) {
        self.points.clear();
    }

    fn evict(&mut self, now: DateTime<Utc>) {
        let window = self.window;
        self.points.retain(|p| now - p.created_at < window);
    }

    fn alpha(&self, point: &HeatPoint, now: DateTime<Utc>) -> f64 {
        let age = (now - point.created_at).num_milliseconds() as f64;
        let window = self.window.num_milliseconds() as f64;
        if window <= 0.0 {
            return 0.0;
        }
        (1.0 - age / window).clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tracker() -> HeatmapTracker {
        HeatmapTracker::new(Duration::seconds(20))
    }

    #[test]
    fn test_point_expires_at_window() {
        let t0 = Utc::now();
        let mut heat = tracker();
        heat.record(Point::new(10.0, 10.0), t0);

        let live = heat.render(t0 + Duration::milliseconds(19_999));
        assert_eq!(live.len(), 1);
        assert!(live[0].alpha > 0.0);

        assert!(heat.render(t0 + Duration::milliseconds(20_000)).is_empty());
        assert!(heat.render(t0).is_empty());
    }

    #[test]
    fn test_alpha_fades_linearly() {
        let t0 = Utc::now();
        let mut heat = tracker();
        heat.record(Point::new(0.0, 0.0), t0);

        assert_eq!(heat.render(t0)[0].alpha, 1.0);
        let half = heat.render(t0 + Duration::seconds(10))[0];
        assert!((half.alpha - 0.5).abs() < 1e-9);
        assert!((half.fill_opacity() - 0.2).abs() < 1e-9);
    }

    #[test]
    fn test_grid_normalizes_to_hottest_cell() {
        let t0 = Utc::now();
        let mut heat = tracker();
        heat.record(Point::new(50.0, 50.0), t0);
        heat.record(Point::new(60.0, 40.0), t0);
        heat.record(Point::new(350.0, 250.0), t0);

        let grid = heat.grid(t0, 4, 3, 400.0, 300.0);
        assert_eq!(grid.cells.len(), 12);
        assert_eq!(grid.get(0, 0), 1.0);
        assert!((grid.get(3, 2) - 0.5).abs() < 1e-9);
        assert_eq!(grid.hottest(), Some((0, 0)));
    }

    #[test]
    fn test_empty_grid() {
        let mut heat = tracker();
        let grid = heat.grid(Utc::now(), 2, 2, 100.0, 100.0);
        assert!(grid.cells.iter().all(|&c| c == 0.0));
        assert_eq!(grid.hottest(), None);
    }
}
