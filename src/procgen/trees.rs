//! Tree canopies.
//!
//! A tree is a raised disc of foliage, tallest in the middle. Parks and the
//! open-terrain themes both place them; drawing is shared.

use bevy::prelude::*;

use super::hash::{hash, salt};
use super::theme::Palette;
use crate::world::color::Rgb;

pub const TREE_MIN_RADIUS: i32 = 3;
pub const TREE_MAX_RADIUS: i32 = 5;
pub const TREE_MIN_HEIGHT: u8 = 6;
pub const TREE_MAX_HEIGHT: u8 = 12;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Tree {
    pub center: IVec2,
    pub radius: i32,
    pub height: u8,
}

impl Tree {
    /// Pixel bounds of the canopy (exclusive max).
    pub fn bounds(&self) -> IRect {
        IRect::from_corners(
            self.center - IVec2::splat(self.radius),
            self.center + IVec2::splat(self.radius + 1),
        )
    }

    /// Whether two canopies would visibly merge.
    pub fn crowds(&self, other: &Tree) -> bool {
        let reach = self.radius + other.radius - 1;
        (self.center - other.center).length_squared() < reach * reach
    }

    /// Canopy color and height at a world pixel, `None` outside the disc.
    pub fn sample(&self, seed: u64, palette: &Palette, x: i32, y: i32) -> Option<(Rgb, u8)> {
        let d2 = (IVec2::new(x, y) - self.center).length_squared();
        let r2 = self.radius * self.radius;
        if d2 > r2 {
            return None;
        }
        let rim = d2 > (self.radius - 1) * (self.radius - 1);
        let color = if rim || hash(seed, x, y, salt::DITHER) % 5 == 0 {
            palette.tree_dark
        } else {
            palette.tree
        };
        let falloff = ((d2 as f32).sqrt() / 2.0) as u8;
        Some((color, self.height.saturating_sub(falloff).max(1)))
    }
}
