//! World and fixed-point coordinates.

use serde::{Deserialize, Serialize};

use crate::COORD_SCALE;

/// A position in world space, in meters.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Position {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Quantize to fixed-point micrometers.
    ///
    /// Quantization happens before any hashing or persistence step so
    /// that comparisons are stable across floating-point producers.
    pub fn quantize(&self) -> QuantizedPosition {
        QuantizedPosition {
            x: quantize_axis(self.x),
            y: quantize_axis(self.y),
            z: quantize_axis(self.z),
        }
    }
}

/// A position in fixed-point micrometers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct QuantizedPosition {
    pub x: i64,
    pub y: i64,
    pub z: i64,
}

impl QuantizedPosition {
    pub fn new(x: i64, y: i64, z: i64) -> Self {
        Self { x, y, z }
    }

    /// Convert back to world meters, for display.
    pub fn to_world(self) -> Position {
        Position {
            x: self.x as f64 / COORD_SCALE,
            y: self.y as f64 / COORD_SCALE,
            z: self.z as f64 / COORD_SCALE,
        }
    }
}

fn quantize_axis(v: f64) -> i64 {
    // Saturating float-to-int cast; NaN maps to 0.
    (v * COORD_SCALE).round() as i64
}
