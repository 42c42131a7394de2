// src/terrain/height_map.rs
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Row-major grid of height samples, indexed `(x, y)` with `y` as the row.
#[derive(Debug, Clone, PartialEq)]
pub struct HeightGrid {
    width: usize,
    height: usize,
    data: Vec<f32>,
}

impl HeightGrid {
    pub fn from_vec(width: usize, height: usize, data: Vec<f32>) -> Self {
        assert_eq!(
            data.len(),
            width * height,
            "height grid data does not match {}x{}",
            width,
            height
        );
        HeightGrid { width, height, data }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn values(&self) -> &[f32] {
        &self.data
    }

    pub fn get(&self, x: usize, y: usize) -> f32 {
        assert!(
            x < self.width && y < self.height,
            "height lookup ({}, {}) outside {}x{} grid",
            x,
            y,
            self.width,
            self.height
        );
        self.data[y * self.width + x]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CurveKey {
    pub time: f32,
    pub value: f32,
}

/// Piecewise-linear response curve applied to normalized heights.
///
/// Keys are kept sorted by time. Inputs before the first key or after the
/// last one take that key's value. A curve with no keys is the identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeightCurve {
    #[serde(default)]
    keys: Vec<CurveKey>,
}

impl Default for HeightCurve {
    fn default() -> Self {
        HeightCurve::linear()
    }
}

impl HeightCurve {
    pub fn new(mut keys: Vec<CurveKey>) -> Self {
        keys.retain(|k| k.time.is_finite() && k.value.is_finite());
        keys.sort_by(|a, b| a.time.total_cmp(&b.time));
        HeightCurve { keys }
    }

    pub fn linear() -> Self {
        HeightCurve::new(vec![
            CurveKey { time: 0.0, value: 0.0 },
            CurveKey { time: 1.0, value: 1.0 },
        ])
    }

    pub fn keys(&self) -> &[CurveKey] {
        &self.keys
    }

    // Config files may list keys out of order
    pub fn sanitized(self) -> Self {
        HeightCurve::new(self.keys)
    }

    pub fn evaluate(&self, t: f32) -> f32 {
        let (first, last) = match (self.keys.first(), self.keys.last()) {
            (Some(first), Some(last)) => (first, last),
            _ => return t,
        };
        if t <= first.time {
            return first.value;
        }
        if t >= last.time {
            return last.value;
        }

        // First key strictly after t; t > first.time so idx >= 1
        let idx = self.keys.partition_point(|k| k.time <= t);
        let a = self.keys[idx - 1];
        let b = self.keys[idx];
        let span = b.time - a.time;
        if span <= 0.0 {
            return b.value;
        }
        a.value + (b.value - a.value) * ((t - a.time) / span)
    }
}

/// Elevation view over a shared height grid.
///
/// `height_at(x, y) = curve(raw(x, y)) * multiplier`.
#[derive(Debug, Clone)]
pub struct HeightMap {
    grid: Arc<HeightGrid>,
    curve: HeightCurve,
    multiplier: f32,
}

impl HeightMap {
    pub fn new(grid: Arc<HeightGrid>, curve: HeightCurve, multiplier: f32) -> Self {
        HeightMap { grid, curve, multiplier }
    }

    pub fn width(&self) -> usize {
        self.grid.width()
    }

    pub fn height(&self) -> usize {
        self.grid.height()
    }

    pub fn multiplier(&self) -> f32 {
        self.multiplier
    }

    pub fn grid(&self) -> &HeightGrid {
        &self.grid
    }

    // Panics outside [0, width) x [0, height)
    pub fn height_at(&self, x: usize, y: usize) -> f32 {
        self.curve.evaluate(self.grid.get(x, y)) * self.multiplier
    }
}
