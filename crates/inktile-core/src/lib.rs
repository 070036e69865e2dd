//! InkTile Core Library
//!
//! Platform-agnostic data structures and coordinate logic for the InkTile
//! infinite-canvas sketch engine.

pub mod history;
pub mod input;
pub mod stroke;
pub mod tile;
pub mod viewport;

pub use history::{History, Snapshot};
pub use input::{Modifiers, MouseButton};
pub use stroke::{Rgba, Stroke, StrokeId, Tool};
pub use tile::{visible_tiles, TileCoord, TileRange, TILE_BUFFER, TILE_SIZE};
pub use viewport::{Viewport, MAX_SCALE, MIN_SCALE};
