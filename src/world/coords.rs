//! Layout constants and coordinate helpers.
//!
//! World pixels use `i32` coordinates with the origin in the top-left corner.
//! Chunks tile the world in `CHUNK_SIZE` squares; the mapping from a pixel to
//! its chunk is plain floor division and lives only here.

use bevy::prelude::*;

/// Side length of a chunk in pixels.
pub const CHUNK_SIZE: i32 = 64;

/// Number of pixels stored per chunk.
pub const CHUNK_AREA: usize = (CHUNK_SIZE * CHUNK_SIZE) as usize;

/// Width of a road strip in pixels.
pub const ROAD_WIDTH: i32 = 8;

/// Width of the sidewalk on each side of a road.
pub const SIDEWALK_WIDTH: i32 = 3;

/// Buildable interior of a block, between its two sidewalks.
pub const BLOCK_INNER: i32 = 42;

/// Repeat period of the city grid: one road, two sidewalks, one interior.
pub const BLOCK_PERIOD: i32 = ROAD_WIDTH + 2 * SIDEWALK_WIDTH + BLOCK_INNER;

/// Thickness of the indestructible frame around the world.
pub const BORDER_WIDTH: i32 = 4;

/// Longest distance a shadow ray travels before giving up.
pub const MAX_SHADOW_DIST: i32 = 24;

/// Height reported for solid border and out-of-world reads.
pub const MAX_HEIGHT: u8 = u8::MAX;

/// Chunk grid coordinate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChunkKey {
    pub x: i32,
    pub y: i32,
}

impl ChunkKey {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Chunk containing the given world pixel.
    pub fn containing(x: i32, y: i32) -> Self {
        Self::new(x.div_euclid(CHUNK_SIZE), y.div_euclid(CHUNK_SIZE))
    }

    /// World position of the chunk's top-left pixel.
    pub fn origin(self) -> IVec2 {
        IVec2::new(self.x * CHUNK_SIZE, self.y * CHUNK_SIZE)
    }

    /// Pixel bounds of the chunk (exclusive max).
    pub fn bounds(self) -> IRect {
        let origin = self.origin();
        IRect::from_corners(origin, origin + IVec2::splat(CHUNK_SIZE))
    }
}

/// Split a world pixel into its chunk and the chunk-local offset.
pub fn split_world(x: i32, y: i32) -> (ChunkKey, UVec2) {
    let key = ChunkKey::containing(x, y);
    let local = UVec2::new(
        x.rem_euclid(CHUNK_SIZE) as u32,
        y.rem_euclid(CHUNK_SIZE) as u32,
    );
    (key, local)
}

/// Index into a chunk's flat buffers.
#[inline]
pub fn local_index(lx: u32, ly: u32) -> usize {
    (ly * CHUNK_SIZE as u32 + lx) as usize
}

/// True when two half-open rectangles share at least one pixel.
pub fn rects_overlap(a: &IRect, b: &IRect) -> bool {
    a.min.x < b.max.x && b.min.x < a.max.x && a.min.y < b.max.y && b.min.y < a.max.y
}

/// True when `inner` lies entirely inside `outer`.
pub fn rect_contains(outer: &IRect, inner: &IRect) -> bool {
    inner.min.x >= outer.min.x
        && inner.min.y >= outer.min.y
        && inner.max.x <= outer.max.x
        && inner.max.y <= outer.max.y
}

/// Pixel-space intersection of two half-open rectangles.
pub fn rect_intersection(a: &IRect, b: &IRect) -> Option<IRect> {
    if !rects_overlap(a, b) {
        return None;
    }
    Some(IRect {
        min: a.min.max(b.min),
        max: a.max.min(b.max),
    })
}
