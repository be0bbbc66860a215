//! Tile grid and collision tile table
//!
//! The grid stores tile indices row-major with the authored top row first.
//! World Y grows upward, so the bottom of the world is the last grid row.
//!
//! Collision tile data format (little-endian floats):
//! ```text
//! u8  signature (52)
//! u8  tile count
//! per tile:
//!   u8 tile index
//!   u8 segment count
//!   per segment: f32 start.x, start.y, end.x, end.y, normal.x, normal.y
//! ```

use std::io::Read;

use glam::Vec2;
use thiserror::Error;

use super::geometry::LineSegment;
use crate::consts::COLLISION_SIGNATURE;

/// Grid cell without collision
pub const EMPTY_TILE: i32 = -1;

/// Bytes per encoded segment (six f32)
const SEGMENT_BYTES: usize = 6 * 4;

/// Collision data failures
#[derive(Debug, Error)]
pub enum CollisionDataError {
    #[error("bad collision signature {found} (expected {expected})")]
    BadSignature { found: u8, expected: u8 },

    #[error("collision data truncated while reading {0}")]
    Truncated(&'static str),

    #[error("too many collision tiles to encode: {0}")]
    TooManyTiles(usize),

    #[error("tile {tile} has too many segments to encode: {count}")]
    TooManySegments { tile: usize, count: usize },

    #[error("I/O error reading collision data: {0}")]
    Io(#[from] std::io::Error),
}

/// 2D array of tile indices into the collision tile table.
///
/// Rows are stored as authored, top row first: grid row `height - 1` is the
/// bottom of the world and world Y grows upward. `CollisionSystem` inverts the
/// row when mapping world Y, so cell `(x, y)` sits at world row `height - 1 - y`.
#[derive(Debug, Clone, PartialEq)]
pub struct TileGrid {
    width: usize,
    height: usize,
    tiles: Vec<i32>,
}

impl TileGrid {
    /// Empty grid (every cell `EMPTY_TILE`)
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            tiles: vec![EMPTY_TILE; width * height],
        }
    }

    /// Build from authored rows, top row first. Short rows are padded with empty cells.
    pub fn from_rows(rows: &[Vec<i32>]) -> Self {
        let height = rows.len();
        let width = rows.iter().map(Vec::len).max().unwrap_or(0);
        let mut grid = Self::new(width, height);
        for (y, row) in rows.iter().enumerate() {
            for (x, &tile) in row.iter().enumerate() {
                grid.set_tile(x, y, tile);
            }
        }
        grid
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Tile index at grid column `x`, grid row `y`. Out of range reads as empty.
    pub fn tile(&self, x: usize, y: usize) -> i32 {
        if x < self.width && y < self.height {
            self.tiles[y * self.width + x]
        } else {
            EMPTY_TILE
        }
    }

    pub fn set_tile(&mut self, x: usize, y: usize, tile: i32) {
        if x < self.width && y < self.height {
            self.tiles[y * self.width + x] = tile;
        }
    }

    /// Fill a rectangle of grid cells (inclusive bounds, clamped)
    pub fn fill(&mut self, x0: usize, y0: usize, x1: usize, y1: usize, tile: i32) {
        for y in y0..=y1.min(self.height.saturating_sub(1)) {
            for x in x0..=x1.min(self.width.saturating_sub(1)) {
                self.set_tile(x, y, tile);
            }
        }
    }
}

/// Segments shared by every grid cell that references this tile index.
/// Coordinates are tile-local: (0, 0) is the cell's bottom-left corner.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CollisionTile {
    pub segments: Vec<LineSegment>,
}

impl CollisionTile {
    pub fn new(segments: Vec<LineSegment>) -> Self {
        Self { segments }
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }
}

struct ByteCursor<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> ByteCursor<'a> {
    fn remaining(&self) -> usize {
        self.bytes.len() - self.pos
    }

    fn read_u8(&mut self, what: &'static str) -> Result<u8, CollisionDataError> {
        let byte = *self
            .bytes
            .get(self.pos)
            .ok_or(CollisionDataError::Truncated(what))?;
        self.pos += 1;
        Ok(byte)
    }

    fn read_f32(&mut self) -> f32 {
        let mut raw = [0u8; 4];
        raw.copy_from_slice(&self.bytes[self.pos..self.pos + 4]);
        self.pos += 4;
        f32::from_le_bytes(raw)
    }
}

/// Decode a collision tile table. The result is indexed by tile index; indices
/// missing from the data become empty tiles.
pub fn parse_collision_tiles(bytes: &[u8]) -> Result<Vec<CollisionTile>, CollisionDataError> {
    let mut cursor = ByteCursor { bytes, pos: 0 };

    let signature = cursor.read_u8("signature")?;
    if signature != COLLISION_SIGNATURE {
        return Err(CollisionDataError::BadSignature {
            found: signature,
            expected: COLLISION_SIGNATURE,
        });
    }

    let tile_count = cursor.read_u8("tile count")?;
    let mut tiles: Vec<CollisionTile> = Vec::with_capacity(tile_count as usize);

    for _ in 0..tile_count {
        let index = cursor.read_u8("tile index")? as usize;
        let segment_count = cursor.read_u8("segment count")? as usize;

        if cursor.remaining() < segment_count * SEGMENT_BYTES {
            return Err(CollisionDataError::Truncated("segments"));
        }

        let mut segments = Vec::with_capacity(segment_count);
        for _ in 0..segment_count {
            let start = Vec2::new(cursor.read_f32(), cursor.read_f32());
            let end = Vec2::new(cursor.read_f32(), cursor.read_f32());
            let normal = Vec2::new(cursor.read_f32(), cursor.read_f32());
            if (normal.length_squared() - 1.0).abs() > 1e-3 {
                log::warn!("Tile {}: non-unit normal {:?}, renormalizing", index, normal);
            }
            segments.push(LineSegment::new(start, end, normal));
        }

        if tiles.len() <= index {
            tiles.resize_with(index + 1, CollisionTile::default);
        }
        tiles[index] = CollisionTile::new(segments);
    }

    Ok(tiles)
}

/// Read the whole stream, then decode it
pub fn read_collision_tiles(mut reader: impl Read) -> Result<Vec<CollisionTile>, CollisionDataError> {
    let mut bytes = Vec::new();
    reader.read_to_end(&mut bytes)?;
    parse_collision_tiles(&bytes)
}

/// Encode a tile table. Empty tiles are skipped; tile indices must fit in a byte.
pub fn encode_collision_tiles(tiles: &[CollisionTile]) -> Result<Vec<u8>, CollisionDataError> {
    let present: Vec<(usize, &CollisionTile)> = tiles
        .iter()
        .enumerate()
        .filter(|(_, tile)| !tile.is_empty())
        .collect();

    if present.len() > u8::MAX as usize || tiles.len() > u8::MAX as usize + 1 {
        return Err(CollisionDataError::TooManyTiles(present.len().max(tiles.len())));
    }

    let mut bytes = vec![COLLISION_SIGNATURE, present.len() as u8];
    for (index, tile) in present {
        if tile.segments.len() > u8::MAX as usize {
            return Err(CollisionDataError::TooManySegments {
                tile: index,
                count: tile.segments.len(),
            });
        }
        bytes.push(index as u8);
        bytes.push(tile.segments.len() as u8);
        for seg in &tile.segments {
            for value in [seg.start.x, seg.start.y, seg.end.x, seg.end.y, seg.normal.x, seg.normal.y] {
                bytes.extend_from_slice(&value.to_le_bytes());
            }
        }
    }
    Ok(bytes)
}
