//! Raw model output: detected instances, masks, and defects.

use serde::{Deserialize, Serialize};

/// Axis-aligned bounding region in pixel coordinates (top-left origin).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundingBox {
    /// Left edge.
    pub x: u32,
    /// Top edge.
    pub y: u32,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl BoundingBox {
    /// Creates a bounding box.
    #[must_use]
    pub const fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }
}

/// Polygon vertex in pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    /// Horizontal coordinate.
    pub x: f32,
    /// Vertical coordinate.
    pub y: f32,
}

impl Point {
    /// Creates a point.
    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Instance mask expressed as a closed polygon outline.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MaskPolygon(Vec<Point>);

impl MaskPolygon {
    /// Creates a mask from its outline vertices.
    #[must_use]
    pub const fn new(points: Vec<Point>) -> Self {
        Self(points)
    }

    /// Creates a rectangular mask covering the given bounding box.
    #[must_use]
    pub fn from_bbox(bbox: BoundingBox) -> Self {
        let left = bbox.x as f32;
        let top = bbox.y as f32;
        let right = left + bbox.width as f32;
        let bottom = top + bbox.height as f32;
        Self(vec![
            Point::new(left, top),
            Point::new(right, top),
            Point::new(right, bottom),
            Point::new(left, bottom),
        ])
    }

    /// Returns the outline vertices.
    #[must_use]
    pub fn points(&self) -> &[Point] {
        &self.0
    }

    /// Returns `(min_x, min_y, max_x, max_y)` over the outline, or `None`
    /// for a polygon with fewer than three vertices.
    #[must_use]
    pub fn extent(&self) -> Option<(f32, f32, f32, f32)> {
        if self.0.len() < 3 {
            return None;
        }
        let initial = (f32::INFINITY, f32::INFINITY, f32::NEG_INFINITY, f32::NEG_INFINITY);
        let extent = self.0.iter().fold(initial, |(x0, y0, x1, y1), p| {
            (x0.min(p.x), y0.min(p.y), x1.max(p.x), y1.max(p.y))
        });
        Some(extent)
    }
}

/// One tree-like object found by the segmentation model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Instance {
    /// Class label as emitted by the model.
    pub label: String,
    /// Detection confidence.
    pub confidence: f64,
    /// Bounding region.
    pub bbox: BoundingBox,
    /// Pixel mask outline.
    pub mask: MaskPolygon,
}

impl Instance {
    /// Creates an instance whose mask is the full bounding box.
    #[must_use]
    pub fn rectangular(label: impl Into<String>, confidence: f64, bbox: BoundingBox) -> Self {
        Self {
            label: label.into(),
            confidence,
            bbox,
            mask: MaskPolygon::from_bbox(bbox),
        }
    }
}

/// One defect reported by the defect model for an isolated instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawDefect {
    /// Class label as emitted by the model.
    pub label: String,
    /// Detection confidence, when the model reports one.
    pub confidence: Option<f64>,
}

impl RawDefect {
    /// Creates a raw defect.
    #[must_use]
    pub fn new(label: impl Into<String>, confidence: Option<f64>) -> Self {
        Self {
            label: label.into(),
            confidence,
        }
    }
}
