//! Park layout: rounded lawn beds ringed by gravel paths, with trees kept off
//! the paths.

use bevy::prelude::*;
use rand::Rng;
use smallvec::SmallVec;

use super::hash::{hash, rng_for, salt};
use super::parcels::BlockParcel;
use super::theme::{Palette, Theme};
use super::trees::{Tree, TREE_MAX_HEIGHT, TREE_MAX_RADIUS, TREE_MIN_HEIGHT, TREE_MIN_RADIUS};
use crate::world::color::Rgb;

/// Width of the gravel path along a bed's edge.
const PATH_WIDTH: f32 = 2.0;

/// A rounded lawn bed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ParkBed {
    pub rect: IRect,
    pub corner: i32,
}

impl ParkBed {
    /// Distance from the pixel centre to the bed outline, positive inside.
    pub fn depth(&self, x: i32, y: i32) -> f32 {
        let r = self.corner as f32;
        let p = Vec2::new(x as f32 + 0.5, y as f32 + 0.5);
        let min = self.rect.min.as_vec2();
        let max = self.rect.max.as_vec2();
        let core = Vec2::new(p.x.clamp(min.x + r, max.x - r), p.y.clamp(min.y + r, max.y - r));
        let d = p.distance(core);
        if d > 0.0 {
            r - d
        } else {
            (p.x - min.x).min(max.x - p.x).min(p.y - min.y).min(max.y - p.y)
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct ParkLayout {
    pub beds: SmallVec<[ParkBed; 4]>,
    pub trees: Vec<Tree>,
}

impl ParkLayout {
    /// Ground color at a pixel inside the park.
    pub fn ground(&self, seed: u64, palette: &Palette, x: i32, y: i32) -> Rgb {
        let jitter = (hash(seed, x, y, salt::PARK_EDGE) % 3) as f32 - 1.0;
        let depth = self
            .beds
            .iter()
            .map(|b| b.depth(x, y))
            .fold(f32::NEG_INFINITY, f32::max)
            + jitter * 0.6;

        if depth >= PATH_WIDTH {
            palette.grass
        } else if depth >= 0.0 {
            palette.sidewalk.lerp(palette.ground, 0.5)
        } else if hash(seed, x, y, salt::DITHER) % 6 == 0 {
            palette.grass
        } else {
            palette.grass_dark
        }
    }
}

/// Plan a park over `area`, the interior pixels of the parcel.
pub fn plan_park(seed: u64, theme: &Theme, parcel: &BlockParcel, area: IRect) -> ParkLayout {
    let mut rng = rng_for(seed, parcel.anchor.x, parcel.anchor.y, salt::PARK_LAYOUT);
    let blocks = (parcel.size.x * parcel.size.y) as u32;
    let mut layout = ParkLayout::default();

    let bed_count = rng.gen_range(1..=blocks + 1);
    for _ in 0..bed_count {
        let w = rng.gen_range(area.width() / 4..=area.width() / 2);
        let h = rng.gen_range(area.height() / 4..=area.height() / 2);
        let x = rng.gen_range(area.min.x + 2..=area.max.x - 2 - w);
        let y = rng.gen_range(area.min.y + 2..=area.max.y - 2 - h);
        let corner = rng.gen_range(3..=6).min(w.min(h) / 2);
        layout.beds.push(ParkBed {
            rect: IRect::new(x, y, x + w, y + h),
            corner,
        });
    }

    let (lo, hi) = theme.trees_per_block;
    let wanted = rng.gen_range(lo..=hi.max(lo)) * blocks;
    let mut attempts = wanted * 8;
    while layout.trees.len() < wanted as usize && attempts > 0 {
        attempts -= 1;
        let radius = rng.gen_range(TREE_MIN_RADIUS..=TREE_MAX_RADIUS);
        let inset = radius + 1;
        let tree = Tree {
            center: IVec2::new(
                rng.gen_range(area.min.x + inset..area.max.x - inset),
                rng.gen_range(area.min.y + inset..area.max.y - inset),
            ),
            radius,
            height: rng.gen_range(TREE_MIN_HEIGHT..=TREE_MAX_HEIGHT),
        };

        let on_path = layout
            .beds
            .iter()
            .any(|b| b.depth(tree.center.x, tree.center.y).abs() < (radius + 1) as f32);
        if on_path || layout.trees.iter().any(|t| t.crowds(&tree)) {
            continue;
        }
        layout.trees.push(tree);
    }
    layout
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::procgen::parcels::ParcelKind;

    fn parcel(size: IVec2) -> BlockParcel {
        BlockParcel {
            kind: ParcelKind::Park,
            anchor: IVec2::new(2, 3),
            size,
            score: 0.5,
        }
    }

    #[test]
    fn bed_depth_is_positive_inside() {
        let bed = ParkBed {
            rect: IRect::new(0, 0, 20, 10),
            corner: 4,
        };
        assert!(bed.depth(10, 5) > 4.0);
        assert!(bed.depth(0, 5) < 1.0);
        assert!(bed.depth(0, 0) < 0.0);
        assert!(bed.depth(25, 5) < 0.0);
    }

    #[test]
    fn layout_stays_inside_the_parcel() {
        let area = IRect::new(100, 100, 142, 142);
        let theme = Theme::city();
        for seed in 0..20 {
            let layout = plan_park(seed, &theme, &parcel(IVec2::ONE), area);
            assert!(!layout.beds.is_empty());
            for bed in &layout.beds {
                assert!(area.contains(bed.rect.min) && area.contains(bed.rect.max - IVec2::ONE));
            }
            for tree in &layout.trees {
                let b = tree.bounds();
                assert!(b.min.x >= area.min.x && b.max.x <= area.max.x);
                assert!(b.min.y >= area.min.y && b.max.y <= area.max.y);
            }
            for (i, a) in layout.trees.iter().enumerate() {
                for b in &layout.trees[i + 1..] {
                    assert!(!a.crowds(b));
                }
            }
        }
    }

    #[test]
    fn layout_is_deterministic() {
        let area = IRect::new(0, 0, 98, 42);
        let theme = Theme::autumn();
        let a = plan_park(77, &theme, &parcel(IVec2::new(2, 1)), area);
        let b = plan_park(77, &theme, &parcel(IVec2::new(2, 1)), area);
        assert_eq!(a.beds, b.beds);
        assert_eq!(a.trees, b.trees);
    }
}
