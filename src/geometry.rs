use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// A region in page (CSS pixel) coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// A region in device pixels of a captured frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    /// Normalises a drag from `start` to `end` in any direction.
    pub fn from_corners(start: Point, end: Point) -> Self {
        Self {
            x: start.x.min(end.x),
            y: start.y.min(end.y),
            width: (end.x - start.x).abs(),
            height: (end.y - start.y).abs(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }

    /// Scales into device pixels. Negative origins clamp to zero; sizes are
    /// truncated the way a canvas truncates fractional dimensions.
    pub fn to_device(&self, scale: f64) -> DeviceRect {
        let scale = normalize_scale(scale);
        DeviceRect {
            x: (self.x * scale).floor().max(0.0) as u32,
            y: (self.y * scale).floor().max(0.0) as u32,
            width: (self.width * scale).max(0.0) as u32,
            height: (self.height * scale).max(0.0) as u32,
        }
    }
}

/// Device pixel ratio, falling back to 1 when unknown or nonsensical.
pub fn normalize_scale(scale: f64) -> f64 {
    if scale.is_finite() && scale > 0.0 {
        scale
    } else {
        1.0
    }
}
