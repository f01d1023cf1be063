//! City grid geometry.
//!
//! The city is a repeating pattern of `BLOCK_PERIOD` pixels per axis: a road
//! strip, a sidewalk, the block interior and the far sidewalk. Block-corner
//! road squares are the intersections of the road graph, the strips between
//! them are its edges.

use bevy::prelude::*;

use crate::world::coords::{BLOCK_INNER, BLOCK_PERIOD, BORDER_WIDTH, ROAD_WIDTH, SIDEWALK_WIDTH};

/// A road segment between two neighbouring intersections.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum GridEdge {
    /// Vertical road from intersection `(ix, iy)` down to `(ix, iy + 1)`.
    Vertical { ix: i32, iy: i32 },
    /// Horizontal road from intersection `(ix, iy)` right to `(ix + 1, iy)`.
    Horizontal { ix: i32, iy: i32 },
}

impl GridEdge {
    /// Intersections at both ends.
    pub fn endpoints(self) -> (IVec2, IVec2) {
        match self {
            GridEdge::Vertical { ix, iy } => (IVec2::new(ix, iy), IVec2::new(ix, iy + 1)),
            GridEdge::Horizontal { ix, iy } => (IVec2::new(ix, iy), IVec2::new(ix + 1, iy)),
        }
    }

    /// Coordinate used to hash this edge; vertical and horizontal never collide.
    pub fn hash_coord(self) -> IVec2 {
        match self {
            GridEdge::Vertical { ix, iy } => IVec2::new(ix * 2, iy),
            GridEdge::Horizontal { ix, iy } => IVec2::new(ix * 2 + 1, iy),
        }
    }
}

/// What the grid says a pixel is, before parcels are considered.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GridCell {
    /// Outside the city grid: open terrain.
    Outside,
    /// Road square shared by up to four edges.
    Intersection,
    /// Road strip belonging to an edge. `across` runs over the road width,
    /// `along` over its length.
    Road { edge: GridEdge, across: i32, along: i32 },
    /// Road strip between an intersection and the sidewalk corners; carries
    /// the edge's traffic when open and joins the sidewalk ring when closed.
    Approach { edge: GridEdge, across: i32, along: i32 },
    /// Sidewalk beside an edge; `None` for corner pieces touching an
    /// intersection, which stay sidewalk whatever happens to the edges.
    Sidewalk { edge: Option<GridEdge>, block: IVec2 },
    /// Block interior.
    Interior { block: IVec2 },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Band {
    Road,
    NearLow,
    Interior,
    NearHigh,
}

fn band(local: i32) -> Band {
    if local < ROAD_WIDTH {
        Band::Road
    } else if local < ROAD_WIDTH + SIDEWALK_WIDTH {
        Band::NearLow
    } else if local >= BLOCK_PERIOD - SIDEWALK_WIDTH {
        Band::NearHigh
    } else {
        Band::Interior
    }
}

/// Placement of the block grid inside the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CityGrid {
    /// World pixel of the top-left intersection.
    pub origin: IVec2,
    /// Blocks per axis.
    pub blocks: IVec2,
}

impl CityGrid {
    /// Fit as many whole blocks as the world leaves room for inside its
    /// border, centred. Returns `None` when not even one block fits.
    pub fn fit(width: i32, height: i32) -> Option<Self> {
        let fit_axis = |extent: i32| -> Option<(i32, i32)> {
            let room = extent - 2 * BORDER_WIDTH;
            let blocks = (room - ROAD_WIDTH - 2 * SIDEWALK_WIDTH) / BLOCK_PERIOD;
            if blocks < 1 {
                return None;
            }
            let used = blocks * BLOCK_PERIOD + ROAD_WIDTH + 2 * SIDEWALK_WIDTH;
            let origin = BORDER_WIDTH + SIDEWALK_WIDTH + (room - used) / 2;
            Some((origin, blocks))
        };
        let (ox, bx) = fit_axis(width)?;
        let (oy, by) = fit_axis(height)?;
        Some(Self {
            origin: IVec2::new(ox, oy),
            blocks: IVec2::new(bx, by),
        })
    }

    /// Intersections per axis.
    pub fn nodes(&self) -> IVec2 {
        self.blocks + IVec2::ONE
    }

    pub fn contains_block(&self, block: IVec2) -> bool {
        block.x >= 0 && block.y >= 0 && block.x < self.blocks.x && block.y < self.blocks.y
    }

    /// Interior pixels of a single block.
    pub fn block_interior(&self, block: IVec2) -> IRect {
        let min = self.origin + block * BLOCK_PERIOD + IVec2::splat(ROAD_WIDTH + SIDEWALK_WIDTH);
        IRect::from_corners(min, min + IVec2::splat(BLOCK_INNER))
    }

    /// Interior pixels spanned by a run of blocks, including the roads
    /// between them.
    pub fn span_interior(&self, anchor: IVec2, size: IVec2) -> IRect {
        let first = self.block_interior(anchor);
        let last = self.block_interior(anchor + size - IVec2::ONE);
        IRect::from_corners(first.min, last.max)
    }

    /// Blocks whose period touches the pixel rectangle, clamped to the grid.
    pub fn blocks_touching(&self, rect: IRect) -> impl Iterator<Item = IVec2> {
        let lo = (rect.min - self.origin).div_euclid(IVec2::splat(BLOCK_PERIOD));
        let hi = (rect.max - IVec2::ONE - self.origin).div_euclid(IVec2::splat(BLOCK_PERIOD));
        let lo = lo.max(IVec2::ZERO);
        let hi = hi.min(self.blocks - IVec2::ONE);
        (lo.y..=hi.y).flat_map(move |y| (lo.x..=hi.x).map(move |x| IVec2::new(x, y)))
    }

    /// Blocks on either side of an interior edge, `None` for the outer ring.
    pub fn blocks_beside(&self, edge: GridEdge) -> Option<(IVec2, IVec2)> {
        let (a, b) = match edge {
            GridEdge::Vertical { ix, iy } => (IVec2::new(ix - 1, iy), IVec2::new(ix, iy)),
            GridEdge::Horizontal { ix, iy } => (IVec2::new(ix, iy - 1), IVec2::new(ix, iy)),
        };
        (self.contains_block(a) && self.contains_block(b)).then_some((a, b))
    }

    /// Every edge of the grid.
    pub fn edges(&self) -> impl Iterator<Item = GridEdge> + '_ {
        let nodes = self.nodes();
        let vertical = (0..self.blocks.y)
            .flat_map(move |iy| (0..nodes.x).map(move |ix| GridEdge::Vertical { ix, iy }));
        let horizontal = (0..nodes.y)
            .flat_map(move |iy| (0..self.blocks.x).map(move |ix| GridEdge::Horizontal { ix, iy }));
        vertical.chain(horizontal)
    }

    /// Classify a world pixel against the grid pattern.
    pub fn classify(&self, x: i32, y: i32) -> GridCell {
        let g = IVec2::new(x, y) - self.origin;
        let end = self.blocks * BLOCK_PERIOD + IVec2::splat(ROAD_WIDTH + SIDEWALK_WIDTH);
        if g.x < -SIDEWALK_WIDTH || g.y < -SIDEWALK_WIDTH || g.x >= end.x || g.y >= end.y {
            return GridCell::Outside;
        }

        let b = g.div_euclid(IVec2::splat(BLOCK_PERIOD));
        let l = g.rem_euclid(IVec2::splat(BLOCK_PERIOD));
        let block = b;

        match (band(l.x), band(l.y)) {
            (Band::Road, Band::Road) => GridCell::Intersection,
            (Band::Road, Band::Interior) => GridCell::Road {
                edge: GridEdge::Vertical { ix: b.x, iy: b.y },
                across: l.x,
                along: g.y,
            },
            (Band::Interior, Band::Road) => GridCell::Road {
                edge: GridEdge::Horizontal { ix: b.x, iy: b.y },
                across: l.y,
                along: g.x,
            },
            (Band::Road, Band::NearLow | Band::NearHigh) if b.y >= 0 && b.y < self.blocks.y => {
                GridCell::Approach {
                    edge: GridEdge::Vertical { ix: b.x, iy: b.y },
                    across: l.x,
                    along: g.y,
                }
            }
            (Band::NearLow | Band::NearHigh, Band::Road) if b.x >= 0 && b.x < self.blocks.x => {
                GridCell::Approach {
                    edge: GridEdge::Horizontal { ix: b.x, iy: b.y },
                    across: l.y,
                    along: g.x,
                }
            }
            (Band::NearLow, Band::Interior) => GridCell::Sidewalk {
                edge: Some(GridEdge::Vertical { ix: b.x, iy: b.y }),
                block,
            },
            (Band::NearHigh, Band::Interior) => GridCell::Sidewalk {
                edge: Some(GridEdge::Vertical { ix: b.x + 1, iy: b.y }),
                block,
            },
            (Band::Interior, Band::NearLow) => GridCell::Sidewalk {
                edge: Some(GridEdge::Horizontal { ix: b.x, iy: b.y }),
                block,
            },
            (Band::Interior, Band::NearHigh) => GridCell::Sidewalk {
                edge: Some(GridEdge::Horizontal { ix: b.x, iy: b.y + 1 }),
                block,
            },
            (Band::Interior, Band::Interior) => GridCell::Interior { block },
            _ => GridCell::Sidewalk { edge: None, block },
        }
    }
}
