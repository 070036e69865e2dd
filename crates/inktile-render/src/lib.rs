//! InkTile Render Library
//!
//! CPU rasterization for the InkTile sketch engine: per-stroke rendering
//! with tool-specific compositing, the sparse tile cache, and PNG export.

pub mod export;
pub mod stroke_renderer;
pub mod tiles;

pub use export::{encode_png, ExportError};
pub use stroke_renderer::render_stroke;
pub use tiles::{Tile, TileManager};

// Host surfaces are plain pixmaps; re-exported so consumers don't need a
// direct tiny-skia dependency.
pub use tiny_skia::Pixmap;
