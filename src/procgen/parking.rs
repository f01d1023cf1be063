//! Parking lots: dithered asphalt with rows of striped stalls.

use bevy::prelude::*;

use super::hash::{hash, salt};
use super::parcels::BlockParcel;
use super::theme::Palette;
use crate::world::color::Rgb;

/// Curb between the sidewalk and the asphalt.
const CURB: i32 = 2;
/// Stall width, stripe included.
const STALL_WIDTH: i32 = 5;
/// Stall depth.
const STALL_DEPTH: i32 = 10;
/// Driving aisle between two stall rows.
const AISLE: i32 = 8;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ParkingLayout {
    pub area: IRect,
    /// Stalls run along x when true, along y otherwise.
    pub rows_along_x: bool,
}

pub fn plan_parking(seed: u64, parcel: &BlockParcel, area: IRect) -> ParkingLayout {
    ParkingLayout {
        area,
        rows_along_x: hash(seed, parcel.anchor.x, parcel.anchor.y, salt::PARKING_LAYOUT) & 1 == 0,
    }
}

impl ParkingLayout {
    /// Pixel color; lots are flat so height is always zero.
    pub fn sample(&self, seed: u64, palette: &Palette, x: i32, y: i32) -> Rgb {
        let inner = self.area.inflate(-CURB);
        if !(x >= inner.min.x && x < inner.max.x && y >= inner.min.y && y < inner.max.y) {
            return palette.lot;
        }

        // `along` runs down a stall row, `across` through the row pattern.
        let (along, across) = if self.rows_along_x {
            (x - inner.min.x, y - inner.min.y)
        } else {
            (y - inner.min.y, x - inner.min.x)
        };
        let period = 2 * STALL_DEPTH + AISLE;
        let band = across % period;
        let in_stalls = band < STALL_DEPTH || band >= STALL_DEPTH + AISLE;
        if in_stalls && along % STALL_WIDTH == 0 {
            return palette.stripe;
        }

        let checker = (x + y) & 1 == 0;
        let speck = hash(seed, x, y, salt::DITHER) % 11 == 0;
        if checker != speck {
            palette.asphalt
        } else {
            palette.asphalt_alt
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::procgen::parcels::ParcelKind;
    use crate::procgen::theme::Theme;

    #[test]
    fn stripes_only_in_stall_rows() {
        let palette = Palette::for_theme(&Theme::city());
        let layout = ParkingLayout {
            area: IRect::new(0, 0, 42, 42),
            rows_along_x: true,
        };
        // First stall row: stripe every STALL_WIDTH along x.
        assert_eq!(layout.sample(0, &palette, CURB, CURB + 3), palette.stripe);
        assert_ne!(layout.sample(0, &palette, CURB + 1, CURB + 3), palette.stripe);
        // Aisle carries no stripes.
        let aisle_y = CURB + STALL_DEPTH + 1;
        assert_ne!(layout.sample(0, &palette, CURB, aisle_y), palette.stripe);
        assert_eq!(layout.sample(0, &palette, 0, 0), palette.lot);
    }

    #[test]
    fn orientation_is_a_coin_flip_per_parcel() {
        let mut seen = [false; 2];
        for x in 0..32 {
            let parcel = BlockParcel {
                kind: ParcelKind::ParkingLot,
                anchor: IVec2::new(x, 0),
                size: IVec2::ONE,
                score: 0.0,
            };
            let layout = plan_parking(11, &parcel, IRect::new(0, 0, 42, 42));
            seen[layout.rows_along_x as usize] = true;
            assert_eq!(layout, plan_parking(11, &parcel, IRect::new(0, 0, 42, 42)));
        }
        assert_eq!(seen, [true, true]);
    }
}
