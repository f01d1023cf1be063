//! Parcel assignment.
//!
//! Every block anchors a candidate parcel rolled from coordinate hashes: a
//! kind, a footprint of one or more blocks and a score. A block belongs to the
//! highest-scoring candidate that covers it among the anchors in its 3x3
//! neighbourhood (up and to the left, since footprints grow right and down).
//! Multi-block parcels only survive when every block they cover agrees on the
//! same winner; otherwise the anchor block falls back to a single-block parcel.
//!
//! Nothing is stored. A [`ParcelResolver`] memoises results for the lifetime
//! of one generation pass.

use std::collections::HashMap;

use bevy::prelude::*;

use super::grid::CityGrid;
use super::hash::{hash, salt, unit};
use super::theme::Theme;

/// Largest parcel footprint along either axis, in blocks.
pub const MAX_PARCEL_SPAN: i32 = 2;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ParcelKind {
    /// Empty lot, dithered gravel.
    None,
    Park,
    Building,
    ParkingLot,
}

/// Parcel claimed by a block.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BlockParcel {
    pub kind: ParcelKind,
    /// Top-left block of the footprint.
    pub anchor: IVec2,
    /// Footprint in blocks.
    pub size: IVec2,
    pub score: f32,
}

impl BlockParcel {
    pub fn covers(&self, block: IVec2) -> bool {
        let rel = block - self.anchor;
        rel.x >= 0 && rel.y >= 0 && rel.x < self.size.x && rel.y < self.size.y
    }

    pub fn blocks(&self) -> impl Iterator<Item = IVec2> + '_ {
        (0..self.size.y).flat_map(move |y| (0..self.size.x).map(move |x| self.anchor + IVec2::new(x, y)))
    }

    pub fn is_multi_block(&self) -> bool {
        self.size.x > 1 || self.size.y > 1
    }

    /// Same parcel, judged by kind and footprint.
    pub fn same_as(&self, other: &BlockParcel) -> bool {
        self.kind == other.kind && self.anchor == other.anchor && self.size == other.size
    }
}

/// Per-block weights derived from the theme, nudged by a district-level
/// hash so neighbouring blocks lean the same way.
#[derive(Clone, Copy, Debug)]
struct BlockProfile {
    park: f32,
    building: f32,
    parking: f32,
    empty: f32,
    /// Chance of rolling a footprint larger than one block.
    merge: f32,
}

fn block_profile(seed: u64, theme: &Theme, block: IVec2) -> BlockProfile {
    let district = block.div_euclid(IVec2::splat(3));
    let d = hash(seed, district.x, district.y, salt::PROFILE);
    let b = hash(seed, block.x, block.y, salt::PROFILE);

    let lean = |shift: u32| 0.6 + 0.8 * unit(d.rotate_left(shift));
    let jitter = 0.85 + 0.3 * unit(b);

    BlockProfile {
        park: theme.park_weight * lean(0) * jitter,
        building: theme.building_weight * lean(16),
        parking: theme.parking_weight * lean(32) / jitter,
        empty: theme.empty_weight * lean(48),
        merge: 0.25 + 0.35 * unit(d.rotate_left(8)),
    }
}

fn roll_kind(profile: &BlockProfile, roll: f32) -> ParcelKind {
    let total = profile.park + profile.building + profile.parking + profile.empty;
    if total <= 0.0 {
        return ParcelKind::None;
    }
    let mut t = roll * total;
    for (kind, weight) in [
        (ParcelKind::Park, profile.park),
        (ParcelKind::Building, profile.building),
        (ParcelKind::ParkingLot, profile.parking),
    ] {
        if t < weight {
            return kind;
        }
        t -= weight;
    }
    ParcelKind::None
}

/// Candidate anchored at `anchor`, or `None` when its footprint would leave
/// the grid.
pub fn candidate(seed: u64, theme: &Theme, grid: &CityGrid, anchor: IVec2) -> Option<BlockParcel> {
    if !grid.contains_block(anchor) {
        return None;
    }
    let profile = block_profile(seed, theme, anchor);
    let kind = roll_kind(&profile, unit(hash(seed, anchor.x, anchor.y, salt::PARCEL_KIND)));

    let size_hash = hash(seed, anchor.x, anchor.y, salt::PARCEL_SIZE);
    let size = if unit(size_hash) >= profile.merge {
        IVec2::ONE
    } else {
        match kind {
            ParcelKind::Park => {
                let span = (size_hash >> 32) % 3;
                match span {
                    0 => IVec2::new(2, 1),
                    1 => IVec2::new(1, 2),
                    _ => IVec2::splat(MAX_PARCEL_SPAN),
                }
            }
            ParcelKind::Building | ParcelKind::ParkingLot => {
                if (size_hash >> 32) & 1 == 0 {
                    IVec2::new(2, 1)
                } else {
                    IVec2::new(1, 2)
                }
            }
            ParcelKind::None => IVec2::ONE,
        }
    };

    let parcel = BlockParcel {
        kind,
        anchor,
        size,
        score: unit(hash(seed, anchor.x, anchor.y, salt::PARCEL_SCORE)),
    };
    let last = anchor + size - IVec2::ONE;
    grid.contains_block(last).then_some(parcel)
}

/// Memoising parcel lookup for one generation pass.
pub struct ParcelResolver<'a> {
    seed: u64,
    theme: &'a Theme,
    grid: &'a CityGrid,
    winners: HashMap<IVec2, BlockParcel>,
    resolved: HashMap<IVec2, BlockParcel>,
}

impl<'a> ParcelResolver<'a> {
    pub fn new(seed: u64, theme: &'a Theme, grid: &'a CityGrid) -> Self {
        Self {
            seed,
            theme,
            grid,
            winners: HashMap::new(),
            resolved: HashMap::new(),
        }
    }

    /// Highest-scoring candidate covering `block`, before agreement.
    fn winner(&mut self, block: IVec2) -> Option<BlockParcel> {
        if let Some(found) = self.winners.get(&block) {
            return Some(*found);
        }
        let mut best: Option<BlockParcel> = None;
        for dy in 0..MAX_PARCEL_SPAN {
            for dx in 0..MAX_PARCEL_SPAN {
                let anchor = block - IVec2::new(dx, dy);
                let Some(c) = candidate(self.seed, self.theme, self.grid, anchor) else {
                    continue;
                };
                if !c.covers(block) {
                    continue;
                }
                let better = match best {
                    None => true,
                    Some(b) => c.score > b.score || (c.score == b.score && c.anchor.to_array() < b.anchor.to_array()),
                };
                if better {
                    best = Some(c);
                }
            }
        }
        if let Some(found) = best {
            self.winners.insert(block, found);
        }
        best
    }

    /// Parcel that `block` ends up belonging to.
    pub fn parcel(&mut self, block: IVec2) -> Option<BlockParcel> {
        if !self.grid.contains_block(block) {
            return None;
        }
        if let Some(found) = self.resolved.get(&block) {
            return Some(*found);
        }

        let winner = self.winner(block)?;
        let agreed = !winner.is_multi_block()
            || winner
                .blocks()
                .all(|b| self.winner(b).is_some_and(|w| w.same_as(&winner)));

        let parcel = if agreed {
            winner
        } else {
            // The block's own candidate always exists and fits, so a
            // single-block fallback keeps the kind but drops the span.
            BlockParcel {
                kind: winner.kind,
                anchor: block,
                size: IVec2::ONE,
                score: winner.score,
            }
        };
        self.resolved.insert(block, parcel);
        Some(parcel)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid() -> CityGrid {
        CityGrid::fit(1024, 1024).unwrap()
    }

    #[test]
    fn candidates_stay_on_the_grid() {
        let g = grid();
        let theme = Theme::city();
        for y in 0..g.blocks.y {
            for x in 0..g.blocks.x {
                if let Some(c) = candidate(9, &theme, &g, IVec2::new(x, y)) {
                    assert!(g.contains_block(c.anchor + c.size - IVec2::ONE));
                }
            }
        }
        assert!(candidate(9, &theme, &g, IVec2::new(-1, 0)).is_none());
    }

    #[test]
    fn every_block_resolves_to_a_parcel_that_covers_it() {
        let g = grid();
        let theme = Theme::city();
        let mut resolver = ParcelResolver::new(42, &theme, &g);
        for y in 0..g.blocks.y {
            for x in 0..g.blocks.x {
                let block = IVec2::new(x, y);
                let parcel = resolver.parcel(block).unwrap();
                assert!(parcel.covers(block));
            }
        }
    }

    #[test]
    fn multi_block_parcels_agree_across_their_footprint() {
        let g = grid();
        let theme = Theme::city();
        let mut resolver = ParcelResolver::new(1337, &theme, &g);
        let mut merged = 0;
        for y in 0..g.blocks.y {
            for x in 0..g.blocks.x {
                let parcel = resolver.parcel(IVec2::new(x, y)).unwrap();
                if parcel.is_multi_block() {
                    merged += 1;
                    for b in parcel.blocks() {
                        assert!(resolver.parcel(b).unwrap().same_as(&parcel));
                    }
                }
            }
        }
        assert!(merged > 0, "expected at least one merged parcel");
    }

    #[test]
    fn resolution_is_order_independent() {
        let g = grid();
        let theme = Theme::autumn();
        let mut forward = ParcelResolver::new(5, &theme, &g);
        let mut backward = ParcelResolver::new(5, &theme, &g);
        let blocks: Vec<IVec2> = (0..g.blocks.y)
            .flat_map(|y| (0..g.blocks.x).map(move |x| IVec2::new(x, y)))
            .collect();
        let a: Vec<_> = blocks.iter().map(|b| forward.parcel(*b)).collect();
        let mut b: Vec<_> = blocks.iter().rev().map(|b| backward.parcel(*b)).collect();
        b.reverse();
        assert_eq!(a, b);
    }
}
