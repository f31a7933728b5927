//! Stroke and drawing payload structures.
//!
//! A payload is what the drawing capture surface hands over when the
//! artist finishes: an ordered list of strokes, each an ordered point
//! sequence with its brush attributes. Payloads are immutable once
//! published; the publisher stores the serialized form verbatim.

use serde::{Deserialize, Serialize};

use crate::Position;

/// A single brush stroke.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Stroke {
    /// Ordered points along the stroke, in world meters.
    pub points: Vec<[f64; 3]>,
    /// Hex color string, e.g. `#FF0000`.
    pub color: String,
    /// Brush width in meters.
    pub width: f64,
    /// Brush type tag, e.g. `flat` or `round`.
    pub brush_type: String,
}

/// An ordered collection of strokes making up one drawing.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct DrawingPayload {
    pub strokes: Vec<Stroke>,
    /// Unix timestamp when the drawing was finished.
    pub finished_at: u64,
}

impl DrawingPayload {
    pub fn stroke_count(&self) -> usize {
        self.strokes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strokes.is_empty()
    }

    /// Mean of all points across all strokes.
    ///
    /// Returns `None` when the payload contains no points at all.
    pub fn centroid(&self) -> Option<Position> {
        let mut sum = [0.0f64; 3];
        let mut count = 0usize;
        for stroke in &self.strokes {
            for p in &stroke.points {
                sum[0] += p[0];
                sum[1] += p[1];
                sum[2] += p[2];
                count += 1;
            }
        }
        if count == 0 {
            return None;
        }
        let n = count as f64;
        Some(Position::new(sum[0] / n, sum[1] / n, sum[2] / n))
    }
}
