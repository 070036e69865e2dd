//! Stroke data model and tool definitions.

use kurbo::{Point, Rect};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for strokes.
pub type StrokeId = Uuid;

/// Serializable color representation (RGBA8).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub fn black() -> Self {
        Self::new(0, 0, 0, 255)
    }

    pub fn white() -> Self {
        Self::new(255, 255, 255, 255)
    }

    pub fn transparent() -> Self {
        Self::new(0, 0, 0, 0)
    }
}

impl Default for Rgba {
    fn default() -> Self {
        Self::black()
    }
}

/// Available drawing tools.
///
/// This is a closed set: every consumer matches it exhaustively, so adding
/// a tool is a compile-time event rather than a silently ignored branch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Tool {
    #[default]
    Pen,
    Eraser,
    Highlighter,
    Line,
    Rectangle,
    Circle,
}

impl Tool {
    /// Freehand tools record every pointer sample; shape tools keep only
    /// the start and current anchor.
    pub fn is_freehand(self) -> bool {
        match self {
            Tool::Pen | Tool::Eraser | Tool::Highlighter => true,
            Tool::Line | Tool::Rectangle | Tool::Circle => false,
        }
    }

    /// Opacity applied to a new stroke when this tool is selected.
    pub fn default_opacity(self) -> f64 {
        match self {
            Tool::Highlighter => 0.5,
            Tool::Pen | Tool::Eraser | Tool::Line | Tool::Rectangle | Tool::Circle => 1.0,
        }
    }
}

/// One continuous drawing gesture: an ordered list of world-space points
/// plus style attributes.
///
/// Mutable only while actively being drawn; immutable once committed to
/// the tile store (committed strokes are shared as `Arc<Stroke>`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Stroke {
    pub id: StrokeId,
    pub tool: Tool,
    pub color: Rgba,
    /// Stroke width in world units.
    pub width: f64,
    /// Overall opacity (0.0 = fully transparent, 1.0 = fully opaque).
    pub opacity: f64,
    /// Points in world coordinates, in gesture order.
    pub points: Vec<Point>,
}

impl Stroke {
    /// Create a new empty stroke with the given style.
    pub fn new(tool: Tool, color: Rgba, width: f64, opacity: f64) -> Self {
        Self {
            id: Uuid::new_v4(),
            tool,
            color,
            width,
            opacity,
            points: Vec::new(),
        }
    }

    /// Create a stroke from existing points.
    pub fn from_points(tool: Tool, color: Rgba, width: f64, opacity: f64, points: Vec<Point>) -> Self {
        Self {
            id: Uuid::new_v4(),
            tool,
            color,
            width,
            opacity,
            points,
        }
    }

    /// Append a point (freehand extension).
    pub fn add_point(&mut self, point: Point) {
        self.points.push(point);
    }

    /// Replace the second anchor, keeping only `[start, point]`.
    ///
    /// Shape tools call this on every pointer move so the stroke always
    /// holds exactly the start and current anchors.
    pub fn set_endpoint(&mut self, point: Point) {
        self.points.truncate(1);
        self.points.push(point);
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Axis-aligned bounding box in world coordinates.
    ///
    /// Returns `Rect::ZERO` for an empty stroke.
    pub fn bounds(&self) -> Rect {
        if self.points.is_empty() {
            return Rect::ZERO;
        }

        let mut min_x = f64::MAX;
        let mut min_y = f64::MAX;
        let mut max_x = f64::MIN;
        let mut max_y = f64::MIN;

        for point in &self.points {
            min_x = min_x.min(point.x);
            min_y = min_y.min(point.y);
            max_x = max_x.max(point.x);
            max_y = max_y.max(point.y);
        }

        Rect::new(min_x, min_y, max_x, max_y)
    }

    /// Test whether this stroke's bounding geometry intersects `rect`.
    ///
    /// Multi-point strokes use bounding-box overlap (edges inclusive);
    /// a single-point stroke degenerates to point containment. Empty
    /// strokes intersect nothing.
    pub fn intersects(&self, rect: Rect) -> bool {
        if self.points.is_empty() {
            return false;
        }
        let b = self.bounds();
        b.x0 <= rect.x1 && b.x1 >= rect.x0 && b.y0 <= rect.y1 && b.y1 >= rect.y0
    }
}
