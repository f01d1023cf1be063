//! Themes and palettes.
//!
//! Every generated color starts from one small base palette. A theme shifts
//! the terrain, building and greenery families by fixed RGB deltas; winter
//! themes also frost the result.

use crate::world::color::Rgb;

/// Theme families.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ThemeKind {
    City,
    Autumn,
    Winter,
    Snowfield,
    Wilds,
}

/// Generation parameters supplied at world construction.
#[derive(Clone, Debug, PartialEq)]
pub struct Theme {
    pub name: &'static str,
    pub kind: ThemeKind,
    /// RGB delta for roads, sidewalks, ground and lots.
    pub terrain_shift: [i16; 3],
    /// RGB delta for walls, roofs and rooftop units.
    pub building_shift: [i16; 3],
    /// RGB delta for grass and trees.
    pub greenery_shift: [i16; 3],
    /// Dither a frost overlay over non-road pixels.
    pub frost: bool,
    /// Skip the city grid and paint open terrain.
    pub no_roads: bool,
    /// Relative weight of parks when rolling a parcel kind.
    pub park_weight: f32,
    /// Relative weight of buildings when rolling a parcel kind.
    pub building_weight: f32,
    /// Relative weight of parking lots when rolling a parcel kind.
    pub parking_weight: f32,
    /// Relative weight of empty lots when rolling a parcel kind.
    pub empty_weight: f32,
    /// Trees per single-block park, inclusive range.
    pub trees_per_block: (u32, u32),
    /// Building body height, inclusive range.
    pub building_height: (u8, u8),
}

impl Default for Theme {
    fn default() -> Self {
        Self::city()
    }
}

impl Theme {
    pub fn city() -> Self {
        Self {
            name: "city",
            kind: ThemeKind::City,
            terrain_shift: [0, 0, 0],
            building_shift: [0, 0, 0],
            greenery_shift: [0, 0, 0],
            frost: false,
            no_roads: false,
            park_weight: 0.25,
            building_weight: 0.5,
            parking_weight: 0.15,
            empty_weight: 0.1,
            trees_per_block: (4, 9),
            building_height: (12, 34),
        }
    }

    pub fn autumn() -> Self {
        Self {
            name: "autumn",
            kind: ThemeKind::Autumn,
            terrain_shift: [8, 2, -6],
            building_shift: [10, 4, -4],
            greenery_shift: [24, -4, -12],
            park_weight: 0.35,
            building_weight: 0.4,
            trees_per_block: (6, 12),
            ..Self::city()
        }
    }

    pub fn winter() -> Self {
        Self {
            name: "winter",
            kind: ThemeKind::Winter,
            terrain_shift: [18, 22, 30],
            building_shift: [6, 8, 14],
            greenery_shift: [-10, -16, 4],
            frost: true,
            ..Self::city()
        }
    }

    pub fn snowfield() -> Self {
        Self {
            name: "snowfield",
            kind: ThemeKind::Snowfield,
            no_roads: true,
            trees_per_block: (2, 6),
            ..Self::winter()
        }
    }

    pub fn wilds() -> Self {
        Self {
            name: "wilds",
            kind: ThemeKind::Wilds,
            terrain_shift: [4, 6, -4],
            greenery_shift: [-6, 8, -6],
            no_roads: true,
            trees_per_block: (5, 11),
            ..Self::city()
        }
    }

    pub fn from_kind(kind: ThemeKind) -> Self {
        match kind {
            ThemeKind::City => Self::city(),
            ThemeKind::Autumn => Self::autumn(),
            ThemeKind::Winter => Self::winter(),
            ThemeKind::Snowfield => Self::snowfield(),
            ThemeKind::Wilds => Self::wilds(),
        }
    }

    /// Copy with inverted ranges put in order and weights that are negative
    /// or not finite zeroed, so any collaborator-supplied theme can generate.
    pub fn normalized(mut self) -> Self {
        let (lo, hi) = self.trees_per_block;
        self.trees_per_block = (lo.min(hi), lo.max(hi));
        let (lo, hi) = self.building_height;
        self.building_height = (lo.min(hi), lo.max(hi));
        for weight in [
            &mut self.park_weight,
            &mut self.building_weight,
            &mut self.parking_weight,
            &mut self.empty_weight,
        ] {
            if !weight.is_finite() || *weight < 0.0 {
                *weight = 0.0;
            }
        }
        self
    }
}

/// Base palette, before any theme shift.
mod base {
    use crate::world::color::Rgb;

    pub const ROAD: Rgb = Rgb::new(58, 58, 62);
    pub const ROAD_LINE: Rgb = Rgb::new(196, 178, 88);
    pub const SIDEWALK: Rgb = Rgb::new(148, 144, 136);
    pub const GRASS: Rgb = Rgb::new(74, 126, 62);
    pub const GRASS_DARK: Rgb = Rgb::new(62, 110, 54);
    pub const GROUND: Rgb = Rgb::new(104, 96, 78);
    pub const LOT: Rgb = Rgb::new(122, 116, 104);
    pub const ASPHALT: Rgb = Rgb::new(66, 66, 70);
    pub const ASPHALT_ALT: Rgb = Rgb::new(72, 72, 76);
    pub const STRIPE: Rgb = Rgb::new(212, 210, 196);
    pub const TREE: Rgb = Rgb::new(40, 104, 44);
    pub const TREE_DARK: Rgb = Rgb::new(30, 84, 36);
    pub const WALL: Rgb = Rgb::new(150, 138, 126);
    pub const ROOF: Rgb = Rgb::new(112, 106, 102);
    pub const ROOF_UNIT: Rgb = Rgb::new(132, 130, 128);
    pub const BORDER: Rgb = Rgb::new(24, 22, 26);
    pub const RUBBLE: Rgb = Rgb::new(92, 84, 74);
    pub const CLEARED: Rgb = Rgb::new(138, 128, 110);
    pub const CHAR: Rgb = Rgb::new(46, 40, 36);
    pub const EMBER: Rgb = Rgb::new(236, 118, 34);
    pub const FROST: Rgb = Rgb::new(228, 234, 242);
}

/// Theme-shifted palette used by the generator and by destruction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Palette {
    pub road: Rgb,
    pub road_line: Rgb,
    pub sidewalk: Rgb,
    pub grass: Rgb,
    pub grass_dark: Rgb,
    pub ground: Rgb,
    pub lot: Rgb,
    pub asphalt: Rgb,
    pub asphalt_alt: Rgb,
    pub stripe: Rgb,
    pub tree: Rgb,
    pub tree_dark: Rgb,
    pub wall: Rgb,
    pub roof: Rgb,
    pub roof_unit: Rgb,
    pub border: Rgb,
    pub rubble: Rgb,
    pub cleared: Rgb,
    pub char: Rgb,
    pub ember: Rgb,
    pub frost: Rgb,
}

impl Palette {
    pub fn for_theme(theme: &Theme) -> Self {
        let t = theme.terrain_shift;
        let b = theme.building_shift;
        let g = theme.greenery_shift;
        Self {
            road: base::ROAD.shifted(t),
            road_line: base::ROAD_LINE.shifted(t),
            sidewalk: base::SIDEWALK.shifted(t),
            grass: base::GRASS.shifted(g),
            grass_dark: base::GRASS_DARK.shifted(g),
            ground: base::GROUND.shifted(t),
            lot: base::LOT.shifted(t),
            asphalt: base::ASPHALT.shifted(t),
            asphalt_alt: base::ASPHALT_ALT.shifted(t),
            stripe: base::STRIPE.shifted(t),
            tree: base::TREE.shifted(g),
            tree_dark: base::TREE_DARK.shifted(g),
            wall: base::WALL.shifted(b),
            roof: base::ROOF.shifted(b),
            roof_unit: base::ROOF_UNIT.shifted(b),
            border: base::BORDER,
            rubble: base::RUBBLE.shifted(t),
            cleared: base::CLEARED.shifted(t),
            char: base::CHAR,
            ember: base::EMBER,
            frost: base::FROST,
        }
    }

    /// Charred ground with a little per-pixel variation.
    pub fn char_tone(&self, h: u64) -> Rgb {
        self.char.offset((h % 13) as i16 - 6)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::color::{is_foliage, is_structure};

    #[test]
    fn families_shift_independently() {
        let city = Palette::for_theme(&Theme::city());
        let autumn = Palette::for_theme(&Theme::autumn());
        assert_ne!(city.tree, autumn.tree);
        assert_ne!(city.road, autumn.road);
        assert_eq!(city.border, autumn.border);
    }

    #[test]
    fn burn_heuristics_hold_for_every_theme() {
        for kind in [
            ThemeKind::City,
            ThemeKind::Autumn,
            ThemeKind::Winter,
            ThemeKind::Snowfield,
            ThemeKind::Wilds,
        ] {
            let theme = Theme::from_kind(kind);
            let p = Palette::for_theme(&theme);
            for wall in [p.wall, p.roof, p.roof_unit] {
                assert!(is_structure(wall), "{:?} {:?}", kind, wall);
            }
            assert!(!is_structure(p.ember));
            assert!(is_foliage(p.tree), "{:?}", kind);
            assert!(is_foliage(p.tree_dark), "{:?}", kind);
            assert!(!is_structure(p.tree));
        }
    }

    #[test]
    fn winter_family_frosts() {
        assert!(Theme::winter().frost);
        assert!(Theme::snowfield().frost);
        assert!(Theme::snowfield().no_roads);
        assert!(!Theme::autumn().frost);
    }

    #[test]
    fn normalized_orders_ranges_and_drops_bad_weights() {
        let theme = Theme {
            building_height: (30, 10),
            trees_per_block: (9, 2),
            park_weight: f32::NAN,
            parking_weight: -1.0,
            ..Theme::city()
        }
        .normalized();
        assert_eq!(theme.building_height, (10, 30));
        assert_eq!(theme.trees_per_block, (2, 9));
        assert_eq!(theme.park_weight, 0.0);
        assert_eq!(theme.parking_weight, 0.0);
        assert_eq!(theme.building_weight, Theme::city().building_weight);
        assert_eq!(Theme::autumn().normalized(), Theme::autumn());
    }
}
