//! InkTile Engine
//!
//! The interaction layer of the InkTile sketch engine: one owned session
//! object translating pointer/touch/wheel input into draw, pan, and zoom
//! operations over the tile store, with snapshot undo/redo and repaint
//! scheduling.

pub mod engine;
pub mod schedule;

pub use engine::SketchEngine;
pub use schedule::{RepaintScheduler, Throttle, CLEANUP_INTERVAL, MIN_FRAME_INTERVAL};

pub use inktile_core::{Modifiers, MouseButton, Rgba, Stroke, StrokeId, Tool, Viewport};
pub use inktile_render::{ExportError, Pixmap};
