//! Rasterizes a single stroke with tool-specific compositing.

use inktile_core::stroke::{Rgba, Stroke, Tool};
use kurbo::Point;
use tiny_skia::{BlendMode, Color, LineCap, LineJoin, Paint, Path, PathBuilder, Pixmap, Transform};

/// Compositing mode for a tool.
///
/// Pen and shape tools paint over existing content; the highlighter
/// multiplies so overlapping strokes darken like translucent ink; the
/// eraser punches transparency instead of painting.
fn blend_mode(tool: Tool) -> BlendMode {
    match tool {
        Tool::Pen | Tool::Line | Tool::Rectangle | Tool::Circle => BlendMode::SourceOver,
        Tool::Highlighter => BlendMode::Multiply,
        Tool::Eraser => BlendMode::DestinationOut,
    }
}

fn color_with_opacity(color: Rgba, opacity: f64) -> Color {
    let alpha = (f64::from(color.a) * opacity.clamp(0.0, 1.0)).round() as u8;
    Color::from_rgba8(color.r, color.g, color.b, alpha)
}

/// Build the stroke's outline path in surface-local coordinates.
///
/// Points are offset by `origin` and scaled in f64 before narrowing to
/// f32, so distant world coordinates keep their precision.
fn build_path(stroke: &Stroke, origin: Point, scale: f64) -> Option<Path> {
    let local = |p: &Point| -> (f32, f32) {
        (((p.x - origin.x) * scale) as f32, ((p.y - origin.y) * scale) as f32)
    };

    let first = stroke.points.first()?;
    let last = stroke.points.last()?;

    let mut pb = PathBuilder::new();
    match stroke.tool {
        Tool::Pen | Tool::Eraser | Tool::Highlighter => {
            // Connected polyline through every recorded point, in order.
            let (x, y) = local(first);
            pb.move_to(x, y);
            if stroke.points.len() == 1 {
                // Degenerate tap: a zero-length segment, drawn as a dot
                // by the round line cap.
                pb.line_to(x, y);
            } else {
                for point in stroke.points.iter().skip(1) {
                    let (x, y) = local(point);
                    pb.line_to(x, y);
                }
            }
        }
        Tool::Line => {
            let (x0, y0) = local(first);
            let (x1, y1) = local(last);
            pb.move_to(x0, y0);
            pb.line_to(x1, y1);
        }
        Tool::Rectangle | Tool::Circle => {
            // Shape strokes use only the first and last anchors.
            let (x0, y0) = local(first);
            let (x1, y1) = local(last);
            let rect = tiny_skia::Rect::from_ltrb(x0.min(x1), y0.min(y1), x0.max(x1), y0.max(y1))?;
            match stroke.tool {
                Tool::Rectangle => pb.push_rect(rect),
                Tool::Circle => pb.push_oval(rect),
                _ => unreachable!(),
            }
        }
    }

    pb.finish()
}

/// Render one stroke into `pixmap`.
///
/// `origin` is the world point mapped to the surface's local origin and
/// `scale` the world-to-surface zoom, so the same stored stroke renders
/// in tile-local space (`scale = 1`) or viewport space without mutation.
///
/// Paint state is constructed per call; nothing leaks into subsequent
/// draws on the shared surface. Strokes with no points are skipped.
pub fn render_stroke(pixmap: &mut Pixmap, stroke: &Stroke, origin: Point, scale: f64) {
    if stroke.points.is_empty() {
        return;
    }
    let Some(path) = build_path(stroke, origin, scale) else {
        return;
    };

    let mut paint = Paint::default();
    paint.set_color(color_with_opacity(stroke.color, stroke.opacity));
    paint.anti_alias = true;
    paint.blend_mode = blend_mode(stroke.tool);

    let sk_stroke = tiny_skia::Stroke {
        width: (stroke.width * scale) as f32,
        line_cap: LineCap::Round,
        line_join: LineJoin::Round,
        ..tiny_skia::Stroke::default()
    };

    pixmap.stroke_path(&path, &paint, &sk_stroke, Transform::identity(), None);
}
