//! Sparse tile store with cached rasters.
//!
//! Keeps render cost proportional to the visible area rather than the
//! total stroke count or world extent. Tiles are pure derived data: the
//! whole map can be rebuilt from the authoritative stroke collection.

use std::collections::HashMap;
use std::sync::Arc;

use inktile_core::stroke::{Stroke, StrokeId};
use inktile_core::tile::{visible_tiles, TileCoord, TileRange, TILE_SIZE};
use inktile_core::viewport::Viewport;
use kurbo::Rect;
use log::debug;
use tiny_skia::{Color, FilterQuality, Pixmap, PixmapPaint, Transform};

use crate::stroke_renderer::render_stroke;

/// One tile: the strokes intersecting its world bounds, in insertion
/// order (per-tile z-order), plus a lazily rasterized cache.
pub struct Tile {
    pub coord: TileCoord,
    /// Ids of intersecting strokes, oldest first.
    pub strokes: Vec<StrokeId>,
    /// Cached raster; `None` until first rasterization.
    raster: Option<Pixmap>,
    /// Set when the stroke list changed since the last rasterization.
    pub dirty: bool,
}

impl Tile {
    fn new(coord: TileCoord) -> Self {
        Self {
            coord,
            strokes: Vec::new(),
            raster: None,
            dirty: false,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.strokes.is_empty()
    }

    pub fn raster(&self) -> Option<&Pixmap> {
        self.raster.as_ref()
    }
}

/// Sparse map of tile coordinate → tile, plus the authoritative stroke
/// collection (id map and commit order) the tiles are derived from.
#[derive(Default)]
pub struct TileManager {
    tiles: HashMap<TileCoord, Tile>,
    strokes: HashMap<StrokeId, Arc<Stroke>>,
    z_order: Vec<StrokeId>,
}

impl TileManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bin a committed stroke into every tile its bounding geometry
    /// intersects and mark those tiles dirty.
    ///
    /// Strokes with no points are never committed and are ignored here.
    pub fn add_stroke(&mut self, stroke: Arc<Stroke>) {
        if stroke.is_empty() {
            return;
        }

        let range = TileRange::covering(stroke.bounds());
        for coord in range.iter() {
            if stroke.intersects(coord.world_rect()) {
                let tile = self.tiles.entry(coord).or_insert_with(|| Tile::new(coord));
                tile.strokes.push(stroke.id);
                tile.dirty = true;
            }
        }

        self.z_order.push(stroke.id);
        self.strokes.insert(stroke.id, stroke);
    }

    /// Remove a stroke from every tile that holds it (a stroke may span
    /// several tiles), marking each affected tile dirty.
    pub fn remove_stroke(&mut self, id: StrokeId) {
        for tile in self.tiles.values_mut() {
            let before = tile.strokes.len();
            tile.strokes.retain(|&s| s != id);
            if tile.strokes.len() != before {
                tile.dirty = true;
            }
        }
        self.strokes.remove(&id);
        self.z_order.retain(|&s| s != id);
    }

    /// Full resynchronization: discard all tiles and cached rasters,
    /// then re-bin every stroke.
    ///
    /// Used for undo/redo and initial load; runs only on discrete user
    /// actions, never per frame.
    pub fn update_strokes(&mut self, strokes: &[Arc<Stroke>]) {
        self.tiles.clear();
        self.strokes.clear();
        self.z_order.clear();
        for stroke in strokes {
            self.add_stroke(stroke.clone());
        }
    }

    /// Re-rasterize a tile if it is dirty or uncached.
    ///
    /// The cached surface is fixed-size (`TILE_SIZE` square); strokes are
    /// rendered in insertion order so later strokes paint over earlier
    /// ones. Tiles that hold no strokes and have no stale raster skip
    /// allocation entirely.
    pub fn render_tile(&mut self, coord: TileCoord) {
        let Some(tile) = self.tiles.get(&coord) else {
            return;
        };
        let uncached = tile.raster.is_none() && !tile.strokes.is_empty();
        if !tile.dirty && !uncached {
            return;
        }

        let strokes: Vec<Arc<Stroke>> = tile
            .strokes
            .iter()
            .filter_map(|id| self.strokes.get(id).cloned())
            .collect();
        let origin = coord.world_origin();

        let Some(tile) = self.tiles.get_mut(&coord) else {
            return;
        };
        if strokes.is_empty() && tile.raster.is_none() {
            tile.dirty = false;
            return;
        }
        if tile.raster.is_none() {
            tile.raster = Pixmap::new(TILE_SIZE as u32, TILE_SIZE as u32);
        }
        let Some(raster) = tile.raster.as_mut() else {
            return;
        };

        raster.fill(Color::TRANSPARENT);
        for stroke in &strokes {
            render_stroke(raster, stroke, origin, 1.0);
        }
        tile.dirty = false;
    }

    /// Composite the visible region into `target`.
    ///
    /// Clears the target, lazily creates a record for every tile in the
    /// visible+buffer range (the surface is unbounded), re-rasterizes
    /// dirty or uncached tiles, and blits each cached raster at its
    /// scaled screen position. The in-progress stroke, if any, is drawn
    /// last, directly in viewport space, so live drawing never touches
    /// the tile cache.
    pub fn composite(&mut self, target: &mut Pixmap, viewport: &Viewport, active: Option<&Stroke>) {
        target.fill(Color::TRANSPARENT);

        let paint = PixmapPaint {
            quality: FilterQuality::Bilinear,
            ..PixmapPaint::default()
        };
        let scale = viewport.scale as f32;

        for coord in visible_tiles(viewport).iter() {
            self.tiles.entry(coord).or_insert_with(|| Tile::new(coord));
            self.render_tile(coord);

            let Some(tile) = self.tiles.get(&coord) else {
                continue;
            };
            let Some(raster) = tile.raster.as_ref() else {
                continue;
            };

            let screen = viewport.world_to_screen(coord.world_origin());
            let transform =
                Transform::from_row(scale, 0.0, 0.0, scale, screen.x as f32, screen.y as f32);
            target.draw_pixmap(0, 0, raster.as_ref(), &paint, transform, None);
        }

        if let Some(stroke) = active {
            render_stroke(
                target,
                stroke,
                kurbo::Point::new(viewport.x, viewport.y),
                viewport.scale,
            );
        }
    }

    /// Evict tiles that are both empty of strokes and outside the
    /// visible+buffer region. Tiles holding any stroke are never
    /// evicted, regardless of visibility.
    pub fn cleanup(&mut self, viewport: &Viewport) {
        let keep = visible_tiles(viewport);
        let before = self.tiles.len();
        self.tiles
            .retain(|coord, tile| !tile.strokes.is_empty() || keep.contains(*coord));
        let evicted = before - self.tiles.len();
        if evicted > 0 {
            debug!("evicted {evicted} empty off-screen tiles");
        }
    }

    /// The authoritative stroke collection: each committed stroke exactly
    /// once, in commit order, regardless of how many tiles it spans.
    pub fn all_strokes(&self) -> Vec<Arc<Stroke>> {
        self.z_order
            .iter()
            .filter_map(|id| self.strokes.get(id).cloned())
            .collect()
    }

    /// Union of all stroke bounding boxes, if any strokes exist.
    pub fn bounds(&self) -> Option<Rect> {
        let mut result: Option<Rect> = None;
        for stroke in self.strokes.values() {
            let bounds = stroke.bounds();
            result = Some(match result {
                Some(r) => r.union(bounds),
                None => bounds,
            });
        }
        result
    }

    pub fn stroke_count(&self) -> usize {
        self.z_order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.z_order.is_empty()
    }

    pub fn tile(&self, coord: TileCoord) -> Option<&Tile> {
        self.tiles.get(&coord)
    }

    pub fn tile_count(&self) -> usize {
        self.tiles.len()
    }
}
