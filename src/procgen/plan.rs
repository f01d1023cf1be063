//! City plan: the grid, every block's parcel and the solved road network.
//!
//! The plan is a pure function of seed, theme and world size. It is solved
//! once when the generator is built and only read afterwards, so every chunk
//! sees the same roads regardless of generation order.

use bevy::prelude::*;

use super::grid::{CityGrid, GridCell, GridEdge};
use super::hash::{hash, salt};
use super::parcels::{BlockParcel, ParcelKind, ParcelResolver};
use super::roads::RoadNetwork;
use super::theme::Theme;
use crate::world::coords::ROAD_WIDTH;

/// Length of a center-line dash and of the gap after it.
const DASH: i32 = 4;

/// What a pixel is once the road network is known.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Surface {
    /// Open terrain outside the city grid.
    Terrain,
    /// Road; `marking` pixels carry the dashed center line.
    Road { marking: bool },
    Sidewalk,
    /// Content of the parcel that owns `block`.
    Parcel { block: IVec2 },
}

#[derive(Clone, Debug)]
struct City {
    grid: CityGrid,
    roads: RoadNetwork,
    parcels: Vec<BlockParcel>,
}

#[derive(Clone, Debug, Default)]
pub struct CityPlan {
    city: Option<City>,
}

impl CityPlan {
    /// Solve the plan. Road-less themes and worlds too small for a single
    /// block get an empty plan.
    pub fn build(seed: u64, theme: &Theme, width: i32, height: i32) -> Self {
        if theme.no_roads {
            info!("Theme '{}' has no roads - open terrain only", theme.name);
            return Self::default();
        }
        let Some(grid) = CityGrid::fit(width, height) else {
            warn!("World {}x{} is too small for a city block", width, height);
            return Self::default();
        };

        let mut parcels = Vec::with_capacity((grid.blocks.x * grid.blocks.y) as usize);
        {
            let mut resolver = ParcelResolver::new(seed, theme, &grid);
            for y in 0..grid.blocks.y {
                for x in 0..grid.blocks.x {
                    if let Some(parcel) = resolver.parcel(IVec2::new(x, y)) {
                        parcels.push(parcel);
                    }
                }
            }
        }

        let mut city = City {
            grid,
            roads: RoadNetwork::new(&grid),
            parcels,
        };

        let candidates: Vec<(GridEdge, u64)> = grid
            .edges()
            .filter_map(|edge| {
                let (a, b) = grid.blocks_beside(edge)?;
                let pa = city.parcel(a)?;
                let pb = city.parcel(b)?;
                let merge = pa.kind != ParcelKind::None && pa.same_as(pb);
                let at = edge.hash_coord();
                merge.then(|| (edge, hash(seed, at.x, at.y, salt::EDGE_SCORE)))
            })
            .collect();
        let candidate_count = candidates.len();
        let closed = city.roads.close_edges(candidates);

        info!(
            "City plan: {}x{} blocks, {} merge candidates, {} roads closed, {} open",
            grid.blocks.x,
            grid.blocks.y,
            candidate_count,
            closed,
            city.roads.open_edge_count()
        );
        Self { city: Some(city) }
    }

    pub fn grid(&self) -> Option<&CityGrid> {
        self.city.as_ref().map(|c| &c.grid)
    }

    pub fn roads(&self) -> Option<&RoadNetwork> {
        self.city.as_ref().map(|c| &c.roads)
    }

    /// Parcel owning `block`.
    pub fn parcel(&self, block: IVec2) -> Option<&BlockParcel> {
        self.city.as_ref()?.parcel(block)
    }

    pub fn parcels(&self) -> &[BlockParcel] {
        match &self.city {
            Some(city) => &city.parcels,
            None => &[],
        }
    }

    /// Classify a world pixel.
    pub fn surface(&self, x: i32, y: i32) -> Surface {
        let Some(city) = &self.city else {
            return Surface::Terrain;
        };
        match city.grid.classify(x, y) {
            GridCell::Outside => Surface::Terrain,
            GridCell::Intersection => Surface::Road { marking: false },
            GridCell::Road { edge, across, along } => {
                if city.roads.is_open(edge) {
                    let marking = across == ROAD_WIDTH / 2 && along.rem_euclid(2 * DASH) < DASH;
                    Surface::Road { marking }
                } else {
                    let block = match edge {
                        GridEdge::Vertical { ix, iy } | GridEdge::Horizontal { ix, iy } => {
                            IVec2::new(ix, iy)
                        }
                    };
                    Surface::Parcel { block }
                }
            }
            GridCell::Approach { edge, across, along } => {
                if city.roads.is_open(edge) {
                    let marking = across == ROAD_WIDTH / 2 && along.rem_euclid(2 * DASH) < DASH;
                    Surface::Road { marking }
                } else {
                    Surface::Sidewalk
                }
            }
            GridCell::Sidewalk { edge: None, .. } => Surface::Sidewalk,
            GridCell::Sidewalk {
                edge: Some(edge),
                block,
            } => {
                if city.roads.is_open(edge) {
                    Surface::Sidewalk
                } else {
                    Surface::Parcel { block }
                }
            }
            GridCell::Interior { block } => Surface::Parcel { block },
        }
    }
}

impl City {
    fn parcel(&self, block: IVec2) -> Option<&BlockParcel> {
        if !self.grid.contains_block(block) {
            return None;
        }
        self.parcels
            .get((block.y * self.grid.blocks.x + block.x) as usize)
    }
}
