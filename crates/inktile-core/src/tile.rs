//! Tile coordinate space: fixed-size square partitions of the unbounded
//! world-space drawing surface.

use crate::viewport::Viewport;
use kurbo::{Point, Rect};

/// Side length of one tile, in world units.
pub const TILE_SIZE: f64 = 512.0;

/// Extra rings of tiles kept around the visible rectangle so panning does
/// not expose un-rasterized tiles at the edges.
pub const TILE_BUFFER: i32 = 2;

/// Integer coordinates of one tile. The tile covers the world rectangle
/// `[x * TILE_SIZE, (x + 1) * TILE_SIZE) x [y * TILE_SIZE, (y + 1) * TILE_SIZE)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TileCoord {
    pub x: i32,
    pub y: i32,
}

impl TileCoord {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// The tile containing a world point (floor division).
    pub fn from_world(point: Point) -> Self {
        Self {
            x: (point.x / TILE_SIZE).floor() as i32,
            y: (point.y / TILE_SIZE).floor() as i32,
        }
    }

    /// World coordinates of this tile's top-left corner.
    pub fn world_origin(self) -> Point {
        Point::new(f64::from(self.x) * TILE_SIZE, f64::from(self.y) * TILE_SIZE)
    }

    /// World-space bounds of this tile.
    pub fn world_rect(self) -> Rect {
        let origin = self.world_origin();
        Rect::new(origin.x, origin.y, origin.x + TILE_SIZE, origin.y + TILE_SIZE)
    }
}

/// An inclusive rectangular range of tile coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileRange {
    pub min: TileCoord,
    pub max: TileCoord,
}

impl TileRange {
    /// The smallest range of tiles whose union covers `rect`.
    pub fn covering(rect: Rect) -> Self {
        Self {
            min: TileCoord::from_world(Point::new(rect.x0, rect.y0)),
            max: TileCoord::from_world(Point::new(rect.x1, rect.y1)),
        }
    }

    /// Grow the range by `tiles` on every side.
    pub fn expanded(self, tiles: i32) -> Self {
        Self {
            min: TileCoord::new(self.min.x - tiles, self.min.y - tiles),
            max: TileCoord::new(self.max.x + tiles, self.max.y + tiles),
        }
    }

    pub fn contains(self, coord: TileCoord) -> bool {
        coord.x >= self.min.x && coord.x <= self.max.x && coord.y >= self.min.y && coord.y <= self.max.y
    }

    /// Enumerate every coordinate in the range, row by row.
    pub fn iter(self) -> impl Iterator<Item = TileCoord> {
        let Self { min, max } = self;
        (min.y..=max.y).flat_map(move |y| (min.x..=max.x).map(move |x| TileCoord::new(x, y)))
    }

    pub fn len(self) -> usize {
        let w = (self.max.x - self.min.x + 1).max(0) as usize;
        let h = (self.max.y - self.min.y + 1).max(0) as usize;
        w * h
    }

    pub fn is_empty(self) -> bool {
        self.len() == 0
    }
}

/// Tiles that must be available for the current view: the tiles covering
/// the visible world rectangle, expanded by [`TILE_BUFFER`] on every side.
pub fn visible_tiles(viewport: &Viewport) -> TileRange {
    TileRange::covering(viewport.visible_rect()).expanded(TILE_BUFFER)
}
