//! Open terrain: the ground wash outside the city grid and the scattered
//! trees of road-less themes.

use bevy::prelude::*;
use noise::{NoiseFn, Perlin};
use rand::Rng;
use smallvec::SmallVec;

use super::hash::{hash, rng_for, salt, unit};
use super::theme::{Palette, Theme};
use super::trees::{Tree, TREE_MAX_HEIGHT, TREE_MAX_RADIUS, TREE_MIN_HEIGHT, TREE_MIN_RADIUS};
use crate::world::color::Rgb;

/// Side of a wash tile; each tile gets one hashed tint.
const WASH_TILE: i32 = 8;
/// Side of a tree-scatter tile.
pub const WILD_TILE: i32 = 32;
/// Noise below this leaves a clearing.
const CLEARING: f64 = -0.25;

/// Ground field for one seed.
pub struct TerrainField {
    seed: u64,
    perlin: Perlin,
}

impl TerrainField {
    pub fn new(seed: u64) -> Self {
        // Perlin expects a u32 seed; fold the high half in so both halves count.
        Self {
            seed,
            perlin: Perlin::new((seed ^ (seed >> 32)) as u32),
        }
    }

    /// Two-octave noise in roughly [-1, 1].
    fn noise(&self, x: i32, y: i32) -> f64 {
        let (nx, ny) = (x as f64 / 160.0, y as f64 / 160.0);
        self.perlin.get([nx, ny]) * 0.7 + self.perlin.get([nx * 3.0, ny * 3.0]) * 0.3
    }

    /// Ground color at a pixel.
    pub fn ground(&self, theme: &Theme, palette: &Palette, x: i32, y: i32) -> Rgb {
        let tile = IVec2::new(x, y).div_euclid(IVec2::splat(WASH_TILE));
        let n = (self.noise(x, y) * 0.5 + 0.5) as f32;
        let t = (unit(hash(self.seed, tile.x, tile.y, salt::WASH)) * 0.3 + n * 0.7).clamp(0.0, 1.0);

        let base = if theme.frost && theme.no_roads {
            palette.ground.lerp(palette.frost, 0.55 + 0.35 * t)
        } else if theme.no_roads {
            palette.grass_dark.lerp(palette.grass, t)
        } else {
            palette.ground.lerp(palette.grass_dark, t * 0.6)
        };
        if hash(self.seed, x, y, salt::DITHER) % 7 == 0 {
            base.offset(-4)
        } else {
            base
        }
    }

    /// Trees scattered over one scatter tile, kept inside `keep`.
    pub fn wild_trees(&self, theme: &Theme, tile: IVec2, keep: IRect) -> SmallVec<[Tree; 4]> {
        let mut trees = SmallVec::new();
        let corner = tile * WILD_TILE;
        let centre = corner + IVec2::splat(WILD_TILE / 2);
        if self.noise(centre.x, centre.y) < CLEARING {
            return trees;
        }

        let mut rng = rng_for(self.seed, tile.x, tile.y, salt::WILD_TREES);
        let (lo, hi) = theme.trees_per_block;
        let count = rng.gen_range(lo / 3..=(hi / 3).max(lo / 3));
        for _ in 0..count * 3 {
            if trees.len() as u32 >= count {
                break;
            }
            let tree = Tree {
                center: corner + IVec2::new(rng.gen_range(0..WILD_TILE), rng.gen_range(0..WILD_TILE)),
                radius: rng.gen_range(TREE_MIN_RADIUS..=TREE_MAX_RADIUS),
                height: rng.gen_range(TREE_MIN_HEIGHT..=TREE_MAX_HEIGHT),
            };
            let b = tree.bounds();
            let fits = b.min.x >= keep.min.x
                && b.min.y >= keep.min.y
                && b.max.x <= keep.max.x
                && b.max.y <= keep.max.y;
            if fits && !trees.iter().any(|t: &Tree| t.crowds(&tree)) {
                trees.push(tree);
            }
        }
        trees
    }
}

/// Scatter tiles whose trees can reach into `rect`.
pub fn tiles_reaching(rect: IRect) -> impl Iterator<Item = IVec2> {
    let reach = IVec2::splat(TREE_MAX_RADIUS);
    let lo = (rect.min - reach).div_euclid(IVec2::splat(WILD_TILE));
    let hi = (rect.max - IVec2::ONE + reach).div_euclid(IVec2::splat(WILD_TILE));
    (lo.y..=hi.y).flat_map(move |y| (lo.x..=hi.x).map(move |x| IVec2::new(x, y)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ground_is_deterministic_per_seed() {
        let theme = Theme::wilds();
        let palette = Palette::for_theme(&theme);
        let a = TerrainField::new(4);
        let b = TerrainField::new(4);
        for (x, y) in [(0, 0), (77, 13), (500, 900)] {
            assert_eq!(a.ground(&theme, &palette, x, y), b.ground(&theme, &palette, x, y));
        }
    }

    #[test]
    fn wild_trees_respect_the_keep_rect() {
        let theme = Theme::wilds();
        let field = TerrainField::new(21);
        let keep = IRect::new(4, 4, 252, 252);
        let mut total = 0;
        for ty in 0..8 {
            for tx in 0..8 {
                for tree in field.wild_trees(&theme, IVec2::new(tx, ty), keep) {
                    let b = tree.bounds();
                    assert!(b.min.x >= keep.min.x && b.max.x <= keep.max.x);
                    total += 1;
                }
            }
        }
        assert!(total > 0);
    }

    #[test]
    fn tiles_reaching_includes_neighbours() {
        let tiles: Vec<_> = tiles_reaching(IRect::new(64, 64, 128, 128)).collect();
        assert!(tiles.contains(&IVec2::new(1, 1)));
        assert!(tiles.contains(&IVec2::new(2, 2)));
        assert!(tiles.contains(&IVec2::new(4, 4)));
    }
}
