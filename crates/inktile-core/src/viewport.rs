//! Viewport state and screen/world coordinate transforms.

use kurbo::{Point, Rect, Vec2};
use serde::{Deserialize, Serialize};

/// Minimum allowed zoom scale.
pub const MIN_SCALE: f64 = 0.1;
/// Maximum allowed zoom scale.
pub const MAX_SCALE: f64 = 5.0;

/// The visible window into world space.
///
/// `(x, y)` is the world-space position of the window's top-left corner,
/// `(width, height)` the screen size in pixels, `scale` the zoom factor.
/// Exactly one live instance exists per engine session.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Viewport {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub scale: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            width: 800.0,
            height: 600.0,
            scale: 1.0,
        }
    }
}

impl Viewport {
    /// Create a viewport at the world origin with the given screen size.
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            ..Self::default()
        }
    }

    /// Update the screen size (e.g. after a container resize).
    pub fn set_size(&mut self, width: f64, height: f64) {
        self.width = width;
        self.height = height;
    }

    /// Convert a screen point to world coordinates.
    pub fn screen_to_world(&self, screen: Point) -> Point {
        Point::new(screen.x / self.scale + self.x, screen.y / self.scale + self.y)
    }

    /// Convert a world point to screen coordinates.
    pub fn world_to_screen(&self, world: Point) -> Point {
        Point::new((world.x - self.x) * self.scale, (world.y - self.y) * self.scale)
    }

    /// Translate the viewport by a screen-space delta.
    ///
    /// Positive delta moves the window toward larger world coordinates,
    /// scaled by the current zoom (wheel-pan semantics).
    pub fn pan_screen(&mut self, delta: Vec2) {
        self.x += delta.x / self.scale;
        self.y += delta.y / self.scale;
    }

    /// Set the zoom scale directly, clamped to `[MIN_SCALE, MAX_SCALE]`.
    pub fn set_scale(&mut self, scale: f64) {
        self.scale = scale.clamp(MIN_SCALE, MAX_SCALE);
    }

    /// Zoom by `factor`, keeping the world point under `cursor` (a screen
    /// position) fixed on screen.
    pub fn zoom_at(&mut self, cursor: Point, factor: f64) {
        let new_scale = (self.scale * factor).clamp(MIN_SCALE, MAX_SCALE);
        if (new_scale - self.scale).abs() < f64::EPSILON {
            return;
        }

        // World point under the cursor before the scale change
        let before = self.screen_to_world(cursor);

        self.scale = new_scale;

        // Shift the origin so the same world point is under the cursor again
        let after = self.screen_to_world(cursor);
        self.x += before.x - after.x;
        self.y += before.y - after.y;
    }

    /// The world-space rectangle currently visible.
    pub fn visible_rect(&self) -> Rect {
        Rect::new(
            self.x,
            self.y,
            self.x + self.width / self.scale,
            self.y + self.height / self.scale,
        )
    }

    /// Zoom level as a percentage, for UI readouts.
    pub fn zoom_percent(&self) -> f64 {
        self.scale * 100.0
    }

    /// Pan and zoom so that `bounds` fills the window with `padding`
    /// pixels of margin, clamped to the allowed scale range.
    pub fn fit_to_bounds(&mut self, bounds: Rect, padding: f64) {
        if bounds.width() <= 0.0 || bounds.height() <= 0.0 {
            return;
        }

        let padded_w = (self.width - padding * 2.0).max(1.0);
        let padded_h = (self.height - padding * 2.0).max(1.0);

        let scale_x = padded_w / bounds.width();
        let scale_y = padded_h / bounds.height();
        self.scale = scale_x.min(scale_y).clamp(MIN_SCALE, MAX_SCALE);

        let center = bounds.center();
        self.x = center.x - self.width / self.scale / 2.0;
        self.y = center.y - self.height / self.scale / 2.0;
    }
}
