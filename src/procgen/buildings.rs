//! Building footprints.
//!
//! A single-block parcel is packed with a handful of non-overlapping
//! footprints; a multi-block parcel gets one dominant superblock building.
//! Shapes are rectangles with notches cut out: L (one corner), T (two corners
//! on one side) and H (the middle of two opposite sides).

use bevy::prelude::*;
use rand::rngs::StdRng;
use rand::Rng;
use smallvec::SmallVec;

use super::hash::{hash, rng_for, salt};
use super::parcels::BlockParcel;
use super::theme::{Palette, Theme};
use crate::world::color::Rgb;

/// Setback from the sidewalk to any footprint.
const LOT_MARGIN: i32 = 3;
/// Clear space kept between packed footprints.
const BUILDING_GAP: i32 = 3;
/// Smallest side of a packed footprint.
const MIN_SIDE: i32 = 12;
/// Outline walls stand this much above the roof.
pub const OUTLINE_RISE: u8 = 4;
/// Rooftop units stand this much above the roof.
pub const ROOF_UNIT_RISE: u8 = 6;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FootprintShape {
    Rect,
    L,
    T,
    H,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Footprint {
    pub bounds: IRect,
    pub shape: FootprintShape,
    /// Areas cut out of `bounds`.
    pub notches: SmallVec<[IRect; 2]>,
    /// Roof height.
    pub height: u8,
    pub roof_units: SmallVec<[IRect; 4]>,
}

fn inside(rect: &IRect, x: i32, y: i32) -> bool {
    x >= rect.min.x && x < rect.max.x && y >= rect.min.y && y < rect.max.y
}

impl Footprint {
    pub fn covers(&self, x: i32, y: i32) -> bool {
        inside(&self.bounds, x, y) && !self.notches.iter().any(|n| inside(n, x, y))
    }

    fn covers_rect(&self, rect: &IRect) -> bool {
        (rect.min.y..rect.max.y).all(|y| (rect.min.x..rect.max.x).all(|x| self.covers(x, y)))
    }

    /// Color and height at a world pixel, `None` off the footprint.
    pub fn sample(&self, seed: u64, palette: &Palette, x: i32, y: i32) -> Option<(Rgb, u8)> {
        if !self.covers(x, y) {
            return None;
        }
        let outline = [(1, 0), (-1, 0), (0, 1), (0, -1)]
            .iter()
            .any(|(dx, dy)| !self.covers(x + dx, y + dy));
        if outline {
            return Some((palette.wall, self.height.saturating_add(OUTLINE_RISE)));
        }
        if self.roof_units.iter().any(|u| inside(u, x, y)) {
            return Some((palette.roof_unit, self.height.saturating_add(ROOF_UNIT_RISE)));
        }
        let grain = (hash(seed, x, y, salt::DITHER) % 5) as i16 - 2;
        Some((palette.roof.offset(grain), self.height))
    }
}

fn roll_shape(rng: &mut StdRng, w: i32, h: i32) -> FootprintShape {
    if w < MIN_SIDE || h < MIN_SIDE {
        return FootprintShape::Rect;
    }
    match rng.gen_range(0..20) {
        0..=9 => FootprintShape::Rect,
        10..=13 => FootprintShape::L,
        14..=16 => FootprintShape::T,
        _ => FootprintShape::H,
    }
}

fn cut_notches(rng: &mut StdRng, shape: FootprintShape, b: IRect) -> SmallVec<[IRect; 2]> {
    let (w, h) = (b.width(), b.height());
    let mut notches = SmallVec::new();
    match shape {
        FootprintShape::Rect => {}
        FootprintShape::L => {
            let (nw, nh) = (w / 2, h / 2);
            let x = if rng.gen_bool(0.5) { b.min.x } else { b.max.x - nw };
            let y = if rng.gen_bool(0.5) { b.min.y } else { b.max.y - nh };
            notches.push(IRect::new(x, y, x + nw, y + nh));
        }
        FootprintShape::T => {
            if rng.gen_bool(0.5) {
                // Bar along the top or bottom, stem in the middle.
                let (nw, nh) = (w / 3, h / 2);
                let y = if rng.gen_bool(0.5) { b.min.y } else { b.max.y - nh };
                notches.push(IRect::new(b.min.x, y, b.min.x + nw, y + nh));
                notches.push(IRect::new(b.max.x - nw, y, b.max.x, y + nh));
            } else {
                let (nw, nh) = (w / 2, h / 3);
                let x = if rng.gen_bool(0.5) { b.min.x } else { b.max.x - nw };
                notches.push(IRect::new(x, b.min.y, x + nw, b.min.y + nh));
                notches.push(IRect::new(x, b.max.y - nh, x + nw, b.max.y));
            }
        }
        FootprintShape::H => {
            if rng.gen_bool(0.5) {
                let (nx0, nx1, nh) = (b.min.x + w / 3, b.max.x - w / 3, h / 3);
                notches.push(IRect::new(nx0, b.min.y, nx1, b.min.y + nh));
                notches.push(IRect::new(nx0, b.max.y - nh, nx1, b.max.y));
            } else {
                let (ny0, ny1, nw) = (b.min.y + h / 3, b.max.y - h / 3, w / 3);
                notches.push(IRect::new(b.min.x, ny0, b.min.x + nw, ny1));
                notches.push(IRect::new(b.max.x - nw, ny0, b.max.x, ny1));
            }
        }
    }
    notches
}

fn place_roof_units(rng: &mut StdRng, footprint: &mut Footprint, count: u32) {
    let b = footprint.bounds;
    if b.width() < 14 || b.height() < 14 {
        return;
    }
    for _ in 0..count * 6 {
        if footprint.roof_units.len() as u32 >= count {
            break;
        }
        let w = rng.gen_range(3..=6);
        let h = rng.gen_range(3..=6);
        let x = rng.gen_range(b.min.x + 3..=b.max.x - 3 - w);
        let y = rng.gen_range(b.min.y + 3..=b.max.y - 3 - h);
        let unit = IRect::new(x, y, x + w, y + h);
        // Keep a ring of roof between the unit and the outline.
        if !footprint.covers_rect(&unit.inflate(2)) {
            continue;
        }
        if footprint.roof_units.iter().any(|u| !u.inflate(1).intersect(unit).is_empty()) {
            continue;
        }
        footprint.roof_units.push(unit);
    }
}

/// Plan the buildings on a parcel over `area`, its interior pixels.
pub fn plan_buildings(seed: u64, theme: &Theme, parcel: &BlockParcel, area: IRect) -> Vec<Footprint> {
    let mut rng = rng_for(seed, parcel.anchor.x, parcel.anchor.y, salt::BUILDING_LAYOUT);
    let lot = area.inflate(-LOT_MARGIN);
    let (lo, hi) = theme.building_height;

    if parcel.is_multi_block() {
        let b = IRect::new(
            lot.min.x + rng.gen_range(0..=4),
            lot.min.y + rng.gen_range(0..=4),
            lot.max.x - rng.gen_range(0..=4),
            lot.max.y - rng.gen_range(0..=4),
        );
        let shape = if rng.gen_bool(0.3) {
            FootprintShape::L
        } else {
            FootprintShape::Rect
        };
        let mut tower = Footprint {
            bounds: b,
            shape,
            notches: cut_notches(&mut rng, shape, b),
            height: rng.gen_range(lo..=hi).saturating_add(6),
            roof_units: SmallVec::new(),
        };
        let units = rng.gen_range(2..=4);
        place_roof_units(&mut rng, &mut tower, units);
        return vec![tower];
    }

    let mut placed: Vec<Footprint> = Vec::new();
    let wanted = rng.gen_range(1..=4);
    let max_w = (lot.width() * 2 / 3).max(MIN_SIDE);
    let max_h = (lot.height() * 2 / 3).max(MIN_SIDE);
    for attempt in 0..24 {
        if placed.len() >= wanted {
            break;
        }
        // The first footprint is large and always fits.
        let (w, h) = if attempt == 0 {
            (rng.gen_range(max_w / 2..=max_w), rng.gen_range(max_h / 2..=max_h))
        } else {
            (rng.gen_range(MIN_SIDE / 2..=max_w / 2), rng.gen_range(MIN_SIDE / 2..=max_h / 2))
        };
        let x = rng.gen_range(lot.min.x..=lot.max.x - w);
        let y = rng.gen_range(lot.min.y..=lot.max.y - h);
        let bounds = IRect::new(x, y, x + w, y + h);
        if placed
            .iter()
            .any(|f| !f.bounds.inflate(BUILDING_GAP).intersect(bounds).is_empty())
        {
            continue;
        }

        let shape = roll_shape(&mut rng, w, h);
        let mut footprint = Footprint {
            bounds,
            shape,
            notches: cut_notches(&mut rng, shape, bounds),
            height: rng.gen_range(lo..=hi),
            roof_units: SmallVec::new(),
        };
        if w * h > 400 {
            let units = rng.gen_range(0..=2);
            place_roof_units(&mut rng, &mut footprint, units);
        }
        placed.push(footprint);
    }
    placed
}
