//! Polygon geometry for text regions.
//!
//! All public results carry polygons in **original-page pixel space**.
//! Preprocessing may resize or rotate a page internally; the inverse
//! transforms in [`crate::pipeline::detect`] use the helpers here so that
//! downstream consumers never see internal coordinates.

use serde::{Deserialize, Serialize};

/// A point in page pixel space. Origin is the top-left corner, y grows
/// downward.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// An axis-aligned rectangle, used when cropping regions out of a page.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x_min: f32,
    pub y_min: f32,
    pub x_max: f32,
    pub y_max: f32,
}

impl Rect {
    pub fn width(&self) -> f32 {
        (self.x_max - self.x_min).max(0.0)
    }

    pub fn height(&self) -> f32 {
        (self.y_max - self.y_min).max(0.0)
    }

    /// Vertical center, the primary key for reading-order line bands.
    pub fn center_y(&self) -> f32 {
        (self.y_min + self.y_max) / 2.0
    }
}

/// An ordered bounding polygon around a detected text region.
///
/// Detectors usually emit quadrilaterals, but nothing here assumes four
/// points; curved-text detectors may emit more.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Polygon {
    pub points: Vec<Point>,
}

impl Polygon {
    pub fn new(points: Vec<Point>) -> Self {
        Self { points }
    }

    /// Axis-aligned rectangle as a four-point polygon (clockwise from
    /// top-left).
    pub fn from_rect(x_min: f32, y_min: f32, x_max: f32, y_max: f32) -> Self {
        Self {
            points: vec![
                Point::new(x_min, y_min),
                Point::new(x_max, y_min),
                Point::new(x_max, y_max),
                Point::new(x_min, y_max),
            ],
        }
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Axis-aligned bounding rectangle. Returns a zero-area rect at the
    /// origin for an empty polygon.
    pub fn bounding_rect(&self) -> Rect {
        let mut rect = Rect {
            x_min: f32::MAX,
            y_min: f32::MAX,
            x_max: f32::MIN,
            y_max: f32::MIN,
        };
        if self.points.is_empty() {
            return Rect {
                x_min: 0.0,
                y_min: 0.0,
                x_max: 0.0,
                y_max: 0.0,
            };
        }
        for p in &self.points {
            rect.x_min = rect.x_min.min(p.x);
            rect.y_min = rect.y_min.min(p.y);
            rect.x_max = rect.x_max.max(p.x);
            rect.y_max = rect.y_max.max(p.y);
        }
        rect
    }

    /// Uniformly scale every point by `factor`.
    pub fn scaled(&self, factor: f32) -> Self {
        Self {
            points: self
                .points
                .iter()
                .map(|p| Point::new(p.x * factor, p.y * factor))
                .collect(),
        }
    }

    /// Rotate every point by `angle_rad` about `(cx, cy)`.
    ///
    /// Positive angles rotate clockwise in image coordinates (y down).
    pub fn rotated_about(&self, cx: f32, cy: f32, angle_rad: f32) -> Self {
        let (sin, cos) = angle_rad.sin_cos();
        Self {
            points: self
                .points
                .iter()
                .map(|p| {
                    let dx = p.x - cx;
                    let dy = p.y - cy;
                    Point::new(cx + dx * cos - dy * sin, cy + dx * sin + dy * cos)
                })
                .collect(),
        }
    }

    /// Clamp every point into `[0, width] x [0, height]`.
    pub fn clamped(&self, width: f32, height: f32) -> Self {
        Self {
            points: self
                .points
                .iter()
                .map(|p| Point::new(p.x.clamp(0.0, width), p.y.clamp(0.0, height)))
                .collect(),
        }
    }
}
