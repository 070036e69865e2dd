//! The interactive sketch session.
//!
//! One owned engine object holds all mutable session state: viewport,
//! tool selection, the in-progress stroke, undo/redo history, and the
//! tile store. Input adapters translate pointer/touch/wheel gestures
//! into draw, pan, and zoom operations; hosts observe the session
//! through the change and repaint hooks rather than implicit re-renders.

use std::sync::Arc;
use std::time::Instant;

use inktile_core::history::History;
use inktile_core::input::{Modifiers, MouseButton};
use inktile_core::stroke::{Rgba, Stroke, Tool};
use inktile_core::viewport::Viewport;
use inktile_render::export::{encode_png, ExportError};
use inktile_render::tiles::TileManager;
use inktile_render::Pixmap;
use kurbo::{Point, Vec2};

use crate::schedule::{RepaintScheduler, Throttle, CLEANUP_INTERVAL};

/// Gesture state. Initial state is `Idle`; the machine lives for the
/// whole session.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Gesture {
    Idle,
    Drawing,
    Panning { last: Point },
}

type ChangeHook = Box<dyn FnMut(&[Arc<Stroke>])>;

/// The infinite-canvas sketch engine.
pub struct SketchEngine {
    tiles: TileManager,
    viewport: Viewport,
    tool: Tool,
    color: Rgba,
    stroke_width: f64,
    /// Stroke being drawn right now; committed to the tile store on
    /// gesture end, rendered directly in viewport space until then.
    active: Option<Stroke>,
    gesture: Gesture,
    history: History,
    /// Monotonic commit counter, a cheap change-detection signal.
    committed: u64,
    pan_throttle: Throttle,
    wheel_throttle: Throttle,
    scheduler: RepaintScheduler,
    last_cleanup: Instant,
    on_change: Option<ChangeHook>,
}

impl SketchEngine {
    /// Create an engine for a drawing surface of the given screen size.
    pub fn new(width: f64, height: f64) -> Self {
        let mut scheduler = RepaintScheduler::new();
        scheduler.request();

        Self {
            tiles: TileManager::new(),
            viewport: Viewport::new(width, height),
            tool: Tool::default(),
            color: Rgba::black(),
            stroke_width: 2.0,
            active: None,
            gesture: Gesture::Idle,
            history: History::new(),
            committed: 0,
            pan_throttle: Throttle::default(),
            wheel_throttle: Throttle::default(),
            scheduler,
            last_cleanup: Instant::now(),
            on_change: None,
        }
    }

    // --- Host integration ---

    /// Seed the session with an existing stroke collection, replacing
    /// any current content. History starts fresh; the change hook is
    /// not invoked for the initial load.
    pub fn load_strokes(&mut self, strokes: Vec<Stroke>) {
        let strokes: Vec<Arc<Stroke>> = strokes
            .into_iter()
            .filter(|s| !s.is_empty())
            .map(Arc::new)
            .collect();
        self.tiles.update_strokes(&strokes);
        self.history.clear();
        self.active = None;
        self.gesture = Gesture::Idle;
        self.scheduler.request();
    }

    /// Install the hook invoked with the updated stroke collection
    /// whenever a stroke is committed, cleared, undone, or redone.
    pub fn set_change_hook(&mut self, hook: impl FnMut(&[Arc<Stroke>]) + 'static) {
        self.on_change = Some(Box::new(hook));
    }

    /// Install the hook invoked when a repaint becomes pending.
    pub fn set_repaint_hook(&mut self, hook: impl FnMut() + 'static) {
        self.scheduler.set_hook(hook);
    }

    /// The authoritative committed stroke collection.
    pub fn strokes(&self) -> Vec<Arc<Stroke>> {
        self.tiles.all_strokes()
    }

    pub fn stroke_count(&self) -> usize {
        self.tiles.stroke_count()
    }

    /// Monotonic commit counter.
    pub fn revision(&self) -> u64 {
        self.committed
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn zoom_percent(&self) -> f64 {
        self.viewport.zoom_percent()
    }

    pub fn set_viewport_size(&mut self, width: f64, height: f64) {
        self.viewport.set_size(width, height);
        self.scheduler.request();
    }

    /// Set the zoom scale directly (clamped), anchored at the viewport
    /// center.
    pub fn set_zoom(&mut self, scale: f64) {
        let center = Point::new(self.viewport.width / 2.0, self.viewport.height / 2.0);
        let factor = scale.clamp(inktile_core::MIN_SCALE, inktile_core::MAX_SCALE) / self.viewport.scale;
        self.viewport.zoom_at(center, factor);
        self.scheduler.request();
    }

    pub fn tool(&self) -> Tool {
        self.tool
    }

    pub fn set_tool(&mut self, tool: Tool) {
        self.tool = tool;
    }

    pub fn color(&self) -> Rgba {
        self.color
    }

    pub fn set_color(&mut self, color: Rgba) {
        self.color = color;
    }

    pub fn stroke_width(&self) -> f64 {
        self.stroke_width
    }

    pub fn set_stroke_width(&mut self, width: f64) {
        self.stroke_width = width.max(0.1);
    }

    pub fn is_drawing(&self) -> bool {
        matches!(self.gesture, Gesture::Drawing)
    }

    pub fn is_panning(&self) -> bool {
        matches!(self.gesture, Gesture::Panning { .. })
    }

    pub fn needs_repaint(&self) -> bool {
        self.scheduler.is_pending()
    }

    /// Pan and zoom so all committed strokes are visible. No-op on an
    /// empty canvas.
    pub fn fit_to_content(&mut self) {
        if let Some(bounds) = self.tiles.bounds() {
            self.viewport.fit_to_bounds(bounds, 50.0);
            self.scheduler.request();
        }
    }

    // --- Pointer input ---

    pub fn on_pointer_down(&mut self, position: Point, button: MouseButton, modifiers: Modifiers) {
        if !matches!(self.gesture, Gesture::Idle) {
            return;
        }
        match button {
            MouseButton::Middle => self.gesture = Gesture::Panning { last: position },
            MouseButton::Left if modifiers.pan_chord() => {
                self.gesture = Gesture::Panning { last: position };
            }
            MouseButton::Left => self.begin_stroke(position),
            MouseButton::Right => {}
        }
    }

    pub fn on_pointer_move(&mut self, position: Point) {
        match self.gesture {
            Gesture::Drawing => self.extend_stroke(position),
            Gesture::Panning { last } => self.pan_to(position, last),
            Gesture::Idle => {}
        }
    }

    pub fn on_pointer_up(&mut self, position: Point, _button: MouseButton) {
        match self.gesture {
            Gesture::Drawing => {
                self.extend_stroke(position);
                self.finish_stroke();
            }
            Gesture::Panning { .. } => self.gesture = Gesture::Idle,
            Gesture::Idle => {}
        }
    }

    /// An abandoned gesture (pointer left the surface without a clean
    /// release) is treated exactly like a release, so no orphaned
    /// drawing state survives the input sequence.
    pub fn on_pointer_leave(&mut self) {
        match self.gesture {
            Gesture::Drawing => self.finish_stroke(),
            Gesture::Panning { .. } => self.gesture = Gesture::Idle,
            Gesture::Idle => {}
        }
    }

    /// Unmodified wheel pans; with the zoom chord (ctrl/cmd) it zooms
    /// toward the cursor, 10% per event.
    pub fn on_wheel(&mut self, position: Point, delta: Vec2, modifiers: Modifiers) {
        if !self.wheel_throttle.ready(Instant::now()) {
            return;
        }
        if modifiers.zoom_chord() {
            let factor = if delta.y > 0.0 { 0.9 } else { 1.1 };
            self.viewport.zoom_at(position, factor);
        } else {
            self.viewport.pan_screen(delta);
        }
        self.scheduler.request();
    }

    // --- Touch input ---

    pub fn on_touch_start(&mut self, touches: &[Point]) {
        match touches {
            [] => {}
            [point] => {
                if matches!(self.gesture, Gesture::Idle) {
                    self.begin_stroke(*point);
                }
            }
            _ => {
                // Second simultaneous touch: drop any in-progress stroke
                // (palm rejection) and pan from the touch centroid.
                self.active = None;
                self.gesture = Gesture::Panning { last: centroid(touches) };
                self.scheduler.request();
            }
        }
    }

    pub fn on_touch_move(&mut self, touches: &[Point]) {
        match self.gesture {
            Gesture::Drawing => {
                if let Some(point) = touches.first() {
                    self.extend_stroke(*point);
                }
            }
            Gesture::Panning { last } => {
                if !touches.is_empty() {
                    self.pan_to(centroid(touches), last);
                }
            }
            Gesture::Idle => {}
        }
    }

    pub fn on_touch_end(&mut self, remaining: &[Point]) {
        if remaining.is_empty() {
            match self.gesture {
                Gesture::Drawing => self.finish_stroke(),
                Gesture::Panning { .. } => self.gesture = Gesture::Idle,
                Gesture::Idle => {}
            }
        } else if self.is_panning() {
            // Re-anchor so the remaining fingers don't cause a jump.
            self.gesture = Gesture::Panning { last: centroid(remaining) };
        }
    }

    // --- Undo / redo / clear ---

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    pub fn undo(&mut self) {
        if !self.history.can_undo() {
            return;
        }
        let current = self.tiles.all_strokes();
        if let Some(snapshot) = self.history.undo(current) {
            self.tiles.update_strokes(&snapshot);
            self.emit_change();
            self.scheduler.request();
        }
    }

    pub fn redo(&mut self) {
        if !self.history.can_redo() {
            return;
        }
        let current = self.tiles.all_strokes();
        if let Some(snapshot) = self.history.redo(current) {
            self.tiles.update_strokes(&snapshot);
            self.emit_change();
            self.scheduler.request();
        }
    }

    /// Remove every committed stroke. Itself undoable; clearing an
    /// already-empty collection is a no-op and pushes no snapshot.
    pub fn clear_all(&mut self) {
        if self.tiles.is_empty() {
            return;
        }
        self.history.record(self.tiles.all_strokes());
        self.tiles.update_strokes(&[]);
        self.emit_change();
        self.scheduler.request();
    }

    // --- Painting and export ---

    /// Composite the current view into `target`, if a repaint is pending
    /// and the frame throttle allows a redraw. Returns whether a redraw
    /// happened. Also runs the periodic empty-tile eviction pass.
    ///
    /// The viewport's screen size follows the target surface, so a host
    /// resize takes effect on the next paint.
    pub fn paint(&mut self, target: &mut Pixmap) -> bool {
        let now = Instant::now();
        if now.duration_since(self.last_cleanup) >= CLEANUP_INTERVAL {
            self.tiles.cleanup(&self.viewport);
            self.last_cleanup = now;
        }
        if !self.scheduler.should_paint(now) {
            return false;
        }

        self.viewport
            .set_size(f64::from(target.width()), f64::from(target.height()));
        self.tiles.composite(target, &self.viewport, self.active.as_ref());
        true
    }

    /// Evict empty off-screen tiles now (host-driven timer entry point).
    pub fn run_cleanup(&mut self) {
        self.tiles.cleanup(&self.viewport);
        self.last_cleanup = Instant::now();
    }

    /// Serialize the currently composited visible raster as PNG bytes.
    pub fn export_png(&mut self) -> Result<Vec<u8>, ExportError> {
        let width = self.viewport.width.round() as u32;
        let height = self.viewport.height.round() as u32;
        if width == 0 || height == 0 {
            return Err(ExportError::EmptySurface);
        }

        let mut surface = Pixmap::new(width, height).ok_or(ExportError::Allocation)?;
        self.tiles.composite(&mut surface, &self.viewport, self.active.as_ref());
        let bytes = encode_png(&surface)?;
        log::info!("PNG export complete: {} bytes", bytes.len());
        Ok(bytes)
    }

    // --- Gesture internals ---

    fn begin_stroke(&mut self, position: Point) {
        let mut stroke = Stroke::new(
            self.tool,
            self.color,
            self.stroke_width,
            self.tool.default_opacity(),
        );
        stroke.add_point(self.viewport.screen_to_world(position));
        self.active = Some(stroke);
        self.gesture = Gesture::Drawing;
        self.scheduler.request();
    }

    fn extend_stroke(&mut self, position: Point) {
        let world = self.viewport.screen_to_world(position);
        let Some(stroke) = self.active.as_mut() else {
            return;
        };
        if stroke.tool.is_freehand() {
            stroke.add_point(world);
        } else {
            stroke.set_endpoint(world);
        }
        self.scheduler.request();
    }

    fn pan_to(&mut self, position: Point, last: Point) {
        if !self.pan_throttle.ready(Instant::now()) {
            return;
        }
        let delta = position - last;
        self.viewport.pan_screen(Vec2::new(-delta.x, -delta.y));
        self.gesture = Gesture::Panning { last: position };
        self.scheduler.request();
    }

    fn finish_stroke(&mut self) {
        self.gesture = Gesture::Idle;
        let Some(stroke) = self.active.take() else {
            return;
        };
        if stroke.is_empty() {
            // Zero-point gestures vanish without touching the undo stack.
            return;
        }

        self.history.record(self.tiles.all_strokes());
        self.tiles.add_stroke(Arc::new(stroke));
        self.committed += 1;
        self.emit_change();
        self.scheduler.request();
    }

    fn emit_change(&mut self) {
        if self.on_change.is_none() {
            return;
        }
        let strokes = self.tiles.all_strokes();
        if let Some(hook) = self.on_change.as_mut() {
            hook(&strokes);
        }
    }
}

fn centroid(points: &[Point]) -> Point {
    let n = points.len().max(1) as f64;
    let sum = points.iter().fold(Vec2::ZERO, |acc, p| acc + p.to_vec2());
    Point::new(sum.x / n, sum.y / n)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    fn engine() -> SketchEngine {
        SketchEngine::new(800.0, 600.0)
    }

    fn draw_segment(engine: &mut SketchEngine, from: Point, to: Point) {
        engine.on_pointer_down(from, MouseButton::Left, Modifiers::default());
        engine.on_pointer_move(to);
        engine.on_pointer_up(to, MouseButton::Left);
    }

    #[test]
    fn test_draw_gesture_commits_stroke() {
        let mut engine = engine();
        draw_segment(&mut engine, Point::new(10.0, 10.0), Point::new(50.0, 50.0));

        assert_eq!(engine.stroke_count(), 1);
        assert_eq!(engine.revision(), 1);
        assert!(!engine.is_drawing());

        let strokes = engine.strokes();
        assert_eq!(strokes[0].tool, Tool::Pen);
        assert_eq!(strokes[0].points.first().copied(), Some(Point::new(10.0, 10.0)));
    }

    #[test]
    fn test_shape_tool_keeps_two_anchors() {
        let mut engine = engine();
        engine.set_tool(Tool::Rectangle);

        engine.on_pointer_down(Point::new(0.0, 0.0), MouseButton::Left, Modifiers::default());
        engine.on_pointer_move(Point::new(10.0, 10.0));
        engine.on_pointer_move(Point::new(30.0, 20.0));
        engine.on_pointer_up(Point::new(40.0, 50.0), MouseButton::Left);

        let strokes = engine.strokes();
        assert_eq!(strokes[0].points.len(), 2);
        assert_eq!(strokes[0].points[0], Point::new(0.0, 0.0));
        assert_eq!(strokes[0].points[1], Point::new(40.0, 50.0));
    }

    #[test]
    fn test_highlighter_gets_reduced_opacity() {
        let mut engine = engine();
        engine.set_tool(Tool::Highlighter);
        draw_segment(&mut engine, Point::new(0.0, 0.0), Point::new(20.0, 0.0));

        assert!((engine.strokes()[0].opacity - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_drawing_records_world_coordinates() {
        let mut engine = engine();
        engine.set_zoom(2.0);
        let viewport = engine.viewport();

        let screen = Point::new(100.0, 100.0);
        let world = viewport.screen_to_world(screen);
        draw_segment(&mut engine, screen, Point::new(140.0, 100.0));

        let stroke = &engine.strokes()[0];
        assert!((stroke.points[0].x - world.x).abs() < 1e-9);
        assert!((stroke.points[0].y - world.y).abs() < 1e-9);
    }

    #[test]
    fn test_middle_button_pans() {
        let mut engine = engine();
        engine.on_pointer_down(Point::new(100.0, 100.0), MouseButton::Middle, Modifiers::default());
        assert!(engine.is_panning());

        engine.on_pointer_move(Point::new(150.0, 100.0));
        // Dragging right moves the window left in world space.
        assert!((engine.viewport().x + 50.0).abs() < f64::EPSILON);

        engine.on_pointer_up(Point::new(150.0, 100.0), MouseButton::Middle);
        assert!(!engine.is_panning());
        assert_eq!(engine.stroke_count(), 0);
    }

    #[test]
    fn test_modifier_primary_drag_pans() {
        let mut engine = engine();
        let ctrl = Modifiers { ctrl: true, ..Modifiers::default() };
        engine.on_pointer_down(Point::new(0.0, 0.0), MouseButton::Left, ctrl);
        assert!(engine.is_panning());
        assert!(!engine.is_drawing());
    }

    #[test]
    fn test_wheel_pan_scales_with_zoom() {
        let mut engine = engine();
        engine.set_zoom(2.0);
        let x0 = engine.viewport().x;

        engine.on_wheel(Point::new(400.0, 300.0), Vec2::new(50.0, 0.0), Modifiers::default());
        assert!((engine.viewport().x - x0 - 25.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_wheel_zoom_keeps_cursor_fixed() {
        let mut engine = engine();
        let cursor = Point::new(400.0, 300.0);
        let ctrl = Modifiers { ctrl: true, ..Modifiers::default() };

        engine.on_wheel(cursor, Vec2::new(0.0, -10.0), ctrl);

        let viewport = engine.viewport();
        assert!((viewport.scale - 1.1).abs() < f64::EPSILON);
        let world = viewport.screen_to_world(cursor);
        assert!((world.x - 400.0).abs() < 1e-9);
        assert!((world.y - 300.0).abs() < 1e-9);
    }

    #[test]
    fn test_undo_redo_restores_order() {
        let mut engine = engine();
        draw_segment(&mut engine, Point::new(0.0, 0.0), Point::new(10.0, 10.0));
        let a = engine.strokes()[0].id;
        draw_segment(&mut engine, Point::new(20.0, 20.0), Point::new(30.0, 30.0));
        let b = engine.strokes()[1].id;

        engine.undo();
        let after_undo = engine.strokes();
        assert_eq!(after_undo.len(), 1);
        assert_eq!(after_undo[0].id, a);

        engine.redo();
        let after_redo = engine.strokes();
        assert_eq!(after_redo.len(), 2);
        assert_eq!(after_redo[0].id, a);
        assert_eq!(after_redo[1].id, b);
    }

    #[test]
    fn test_commit_clears_redo() {
        let mut engine = engine();
        draw_segment(&mut engine, Point::new(0.0, 0.0), Point::new(10.0, 10.0));
        engine.undo();
        assert!(engine.can_redo());

        draw_segment(&mut engine, Point::new(40.0, 40.0), Point::new(50.0, 50.0));
        assert!(!engine.can_redo());
    }

    #[test]
    fn test_clear_all_is_undoable() {
        let mut engine = engine();
        draw_segment(&mut engine, Point::new(0.0, 0.0), Point::new(10.0, 10.0));

        engine.clear_all();
        assert_eq!(engine.stroke_count(), 0);
        assert!(engine.can_undo());

        engine.undo();
        assert_eq!(engine.stroke_count(), 1);
    }

    #[test]
    fn test_clear_all_on_empty_is_noop() {
        let mut engine = engine();
        engine.clear_all();
        assert!(!engine.can_undo());
    }

    #[test]
    fn test_pointer_leave_acts_as_release() {
        let mut engine = engine();
        engine.on_pointer_down(Point::new(0.0, 0.0), MouseButton::Left, Modifiers::default());
        engine.on_pointer_move(Point::new(20.0, 20.0));
        engine.on_pointer_leave();

        assert!(!engine.is_drawing());
        assert_eq!(engine.stroke_count(), 1);
    }

    #[test]
    fn test_second_touch_abandons_stroke_and_pans() {
        let mut engine = engine();
        engine.on_touch_start(&[Point::new(10.0, 10.0)]);
        assert!(engine.is_drawing());

        engine.on_touch_start(&[Point::new(10.0, 10.0), Point::new(200.0, 10.0)]);
        assert!(engine.is_panning());

        engine.on_touch_end(&[]);
        assert_eq!(engine.stroke_count(), 0);
    }

    #[test]
    fn test_single_touch_draws() {
        let mut engine = engine();
        engine.on_touch_start(&[Point::new(10.0, 10.0)]);
        engine.on_touch_move(&[Point::new(30.0, 30.0)]);
        engine.on_touch_end(&[]);

        assert_eq!(engine.stroke_count(), 1);
    }

    #[test]
    fn test_change_hook_fires_on_mutations() {
        let mut engine = engine();
        let count = Rc::new(Cell::new(0u32));
        let hook_count = count.clone();
        engine.set_change_hook(move |_| hook_count.set(hook_count.get() + 1));

        draw_segment(&mut engine, Point::new(0.0, 0.0), Point::new(10.0, 10.0));
        assert_eq!(count.get(), 1);

        engine.undo();
        assert_eq!(count.get(), 2);

        engine.redo();
        assert_eq!(count.get(), 3);

        engine.clear_all();
        assert_eq!(count.get(), 4);
    }

    #[test]
    fn test_stray_events_are_noops() {
        let mut engine = engine();
        engine.on_pointer_move(Point::new(10.0, 10.0));
        engine.on_pointer_up(Point::new(10.0, 10.0), MouseButton::Left);
        engine.on_pointer_leave();
        engine.on_touch_move(&[]);
        engine.on_touch_end(&[]);

        assert_eq!(engine.stroke_count(), 0);
        assert!(!engine.can_undo());
    }

    #[test]
    fn test_load_strokes_seeds_session() {
        let mut engine = engine();
        let seed = vec![
            Stroke::from_points(
                Tool::Pen,
                Rgba::black(),
                2.0,
                1.0,
                vec![Point::new(0.0, 0.0), Point::new(5.0, 5.0)],
            ),
            Stroke::from_points(
                Tool::Line,
                Rgba::black(),
                2.0,
                1.0,
                vec![Point::new(10.0, 0.0), Point::new(20.0, 5.0)],
            ),
        ];
        engine.load_strokes(seed);

        assert_eq!(engine.stroke_count(), 2);
        assert!(!engine.can_undo());
    }

    #[test]
    fn test_paint_consumes_pending_repaint() {
        let mut engine = engine();
        let mut target = Pixmap::new(800, 600).unwrap();

        // A fresh engine has an initial repaint pending.
        assert!(engine.needs_repaint());
        assert!(engine.paint(&mut target));
        assert!(!engine.needs_repaint());
        assert!(!engine.paint(&mut target));
    }

    #[test]
    fn test_paint_renders_committed_strokes() {
        let mut engine = engine();
        engine.set_stroke_width(8.0);
        draw_segment(&mut engine, Point::new(20.0, 100.0), Point::new(200.0, 100.0));

        let mut target = Pixmap::new(800, 600).unwrap();
        assert!(engine.paint(&mut target));
        assert!(target.pixels()[100 * 800 + 100].alpha() > 0);
    }

    #[test]
    fn test_export_png() {
        let mut engine = engine();
        draw_segment(&mut engine, Point::new(20.0, 100.0), Point::new(200.0, 100.0));

        let bytes = engine.export_png().unwrap();
        assert_eq!(&bytes[..8], &[0x89, b'P', b'N', b'G', b'\r', b'\n', 0x1a, b'\n']);
    }

    #[test]
    fn test_fit_to_content() {
        let mut engine = engine();
        draw_segment(&mut engine, Point::new(1000.0, 1000.0), Point::new(1400.0, 1300.0));

        engine.fit_to_content();
        let rect = engine.viewport().visible_rect();
        assert!(rect.x0 <= 1000.0 && rect.x1 >= 1400.0);
        assert!(rect.y0 <= 1000.0 && rect.y1 >= 1300.0);
    }
}
