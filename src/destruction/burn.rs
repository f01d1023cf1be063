//! Burning trees and buildings.
//!
//! A burn collects the matching pixels around its origin once, then eats
//! through them a pixel or two per interval, leaving flat charred ground.
//! Building burns smolder first: for a while the fire creeps into adjacent
//! structure pixels instead of consuming anything.

use std::collections::{BTreeMap, HashSet};

use bevy::prelude::*;
use rand::rngs::StdRng;
use rand::Rng;

use crate::procgen::hash::{coord_key, rng_for, salt};
use crate::world::color::{is_foliage, is_structure, Rgb};
use crate::world::terrain::TerrainWorld;

/// Burn tuning.
#[derive(Clone, Debug, PartialEq)]
pub struct BurnConfig {
    /// Seconds between consumption steps of a tree burn.
    pub tree_interval: f32,
    /// Seconds between steps of a building burn.
    pub building_interval: f32,
    /// Pixels scanned around a tree ignition point.
    pub tree_radius: i32,
    /// Pixels scanned around a building ignition point.
    pub building_radius: i32,
    /// Seconds a building smolders before collapsing.
    pub smolder_time: f32,
    /// Smoldering fire never creeps further than this from the origin.
    pub spread_radius: i32,
    /// Most pixels a single building burn may hold.
    pub spread_cap: usize,
    /// Lifetime of the ember flicker painted on creeping pixels.
    pub ember_ttl: f32,
}

impl Default for BurnConfig {
    fn default() -> Self {
        Self {
            tree_interval: 0.05,
            building_interval: 0.03,
            tree_radius: 8,
            building_radius: 12,
            smolder_time: 1.2,
            spread_radius: 24,
            spread_cap: 1500,
            ember_ttl: 0.35,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BurnKind {
    Tree,
    Building,
}

#[derive(Clone, Copy, Debug, PartialEq)]
enum BurnPhase {
    Smolder { remaining: f32 },
    Consume,
}

/// One burning tree or building.
#[derive(Clone, Debug)]
pub struct BurnEffect {
    origin: IVec2,
    kind: BurnKind,
    pixels: Vec<IVec2>,
    members: HashSet<u64>,
    rng: StdRng,
    timer: f32,
    phase: BurnPhase,
}

impl BurnEffect {
    fn new(world: &TerrainWorld, origin: IVec2, kind: BurnKind, pixels: Vec<IVec2>) -> Self {
        let phase = match kind {
            BurnKind::Tree => BurnPhase::Consume,
            BurnKind::Building => BurnPhase::Smolder {
                remaining: world.config().burn.smolder_time,
            },
        };
        Self {
            origin,
            kind,
            members: pixels.iter().map(|p| coord_key(p.x, p.y)).collect(),
            pixels,
            rng: rng_for(world.seed(), origin.x, origin.y, salt::BURN),
            timer: 0.0,
            phase,
        }
    }

    pub fn origin(&self) -> IVec2 {
        self.origin
    }

    pub fn kind(&self) -> BurnKind {
        self.kind
    }

    /// Pixels still waiting to burn.
    pub fn pixels(&self) -> &[IVec2] {
        &self.pixels
    }

    pub fn is_smoldering(&self) -> bool {
        matches!(self.phase, BurnPhase::Smolder { .. })
    }

    pub fn is_done(&self) -> bool {
        self.pixels.is_empty()
    }

    fn advance(&mut self, world: &mut TerrainWorld, dt: f32) {
        let config = world.config().burn.clone();
        let interval = match self.kind {
            BurnKind::Tree => config.tree_interval,
            BurnKind::Building => config.building_interval,
        }
        .max(f32::EPSILON);

        self.timer += dt;
        while self.timer >= interval && !self.pixels.is_empty() {
            self.timer -= interval;
            match self.phase {
                BurnPhase::Smolder { remaining } => {
                    self.creep(world, &config);
                    let left = remaining - interval;
                    self.phase = if left > 0.0 {
                        BurnPhase::Smolder { remaining: left }
                    } else {
                        BurnPhase::Consume
                    };
                }
                BurnPhase::Consume => self.consume(world),
            }
        }
    }

    /// Burn one or two random pixels down to char.
    fn consume(&mut self, world: &mut TerrainWorld) {
        let count = self.rng.gen_range(1..=2);
        for _ in 0..count {
            if self.pixels.is_empty() {
                return;
            }
            let i = self.rng.gen_range(0..self.pixels.len());
            let p = self.pixels.swap_remove(i);
            world.burn_pixel(p.x, p.y);
        }
    }

    /// Spread from a random burning pixel into adjacent structure pixels.
    fn creep(&mut self, world: &mut TerrainWorld, config: &BurnConfig) {
        if self.pixels.is_empty() {
            return;
        }
        let from = self.pixels[self.rng.gen_range(0..self.pixels.len())];
        let ember = world.palette().ember;
        world.add_temp_paint(from.x, from.y, ember, config.ember_ttl);

        let reach = config.spread_radius * config.spread_radius;
        for step in [IVec2::X, IVec2::NEG_X, IVec2::Y, IVec2::NEG_Y] {
            if self.pixels.len() >= config.spread_cap {
                return;
            }
            let n = from + step;
            if (n - self.origin).length_squared() > reach || self.members.contains(&coord_key(n.x, n.y)) {
                continue;
            }
            if world.is_indestructible(n.x, n.y) || world.height_at(n.x, n.y) == 0 {
                continue;
            }
            if !is_structure(world.color_at(n.x, n.y)) {
                continue;
            }
            self.members.insert(coord_key(n.x, n.y));
            self.pixels.push(n);
            world.add_temp_paint(n.x, n.y, ember, config.ember_ttl);
        }
    }
}

/// Active burns, keyed by the origin's coordinate key.
#[derive(Clone, Debug, Default)]
pub struct BurnRegistry {
    trees: BTreeMap<u64, BurnEffect>,
    buildings: BTreeMap<u64, BurnEffect>,
}

impl BurnRegistry {
    pub fn is_empty(&self) -> bool {
        self.trees.is_empty() && self.buildings.is_empty()
    }
}

impl TerrainWorld {
    /// Raised, destructible pixels within `radius` whose color passes `matches`.
    fn collect_burnable(&mut self, x: i32, y: i32, radius: i32, matches: fn(Rgb) -> bool) -> Vec<IVec2> {
        let mut found = Vec::new();
        let radius = i64::from(radius.max(0));
        let (cx, cy) = (i64::from(x), i64::from(y));
        let world = self.bounds();
        let (x0, x1) = ((cx - radius).max(i64::from(world.min.x)), (cx + radius).min(i64::from(world.max.x) - 1));
        let (y0, y1) = ((cy - radius).max(i64::from(world.min.y)), (cy + radius).min(i64::from(world.max.y) - 1));
        for py in y0..=y1 {
            for px in x0..=x1 {
                let (dx, dy) = (px - cx, py - cy);
                if dx * dx + dy * dy > radius * radius {
                    continue;
                }
                // Clamped to the world above.
                let (px, py) = (px as i32, py as i32);
                if self.is_indestructible(px, py) {
                    continue;
                }
                if self.height_at(px, py) > 0 && matches(self.color_at(px, py)) {
                    found.push(IVec2::new(px, py));
                }
            }
        }
        found
    }

    /// Ignite the foliage around a point. Returns false when nothing there
    /// burns or a tree burn already started at this exact origin.
    pub fn start_tree_burn(&mut self, x: i32, y: i32) -> bool {
        self.start_burn(x, y, BurnKind::Tree)
    }

    /// Ignite the structure around a point. Returns false when nothing there
    /// burns or a building burn already started at this exact origin.
    pub fn start_building_burn(&mut self, x: i32, y: i32) -> bool {
        self.start_burn(x, y, BurnKind::Building)
    }

    fn start_burn(&mut self, x: i32, y: i32, kind: BurnKind) -> bool {
        let key = coord_key(x, y);
        let exists = match kind {
            BurnKind::Tree => self.burns.trees.contains_key(&key),
            BurnKind::Building => self.burns.buildings.contains_key(&key),
        };
        if exists {
            return false;
        }

        let pixels = match kind {
            BurnKind::Tree => self.collect_burnable(x, y, self.config().burn.tree_radius, is_foliage),
            BurnKind::Building => self.collect_burnable(x, y, self.config().burn.building_radius, is_structure),
        };
        if pixels.is_empty() {
            return false;
        }

        debug!("{:?} burn started at ({}, {}) over {} pixels", kind, x, y, pixels.len());
        let effect = BurnEffect::new(self, IVec2::new(x, y), kind, pixels);
        match kind {
            BurnKind::Tree => self.burns.trees.insert(key, effect),
            BurnKind::Building => self.burns.buildings.insert(key, effect),
        };
        true
    }

    pub fn tree_burn(&self, x: i32, y: i32) -> Option<&BurnEffect> {
        self.burns.trees.get(&coord_key(x, y))
    }

    pub fn building_burn(&self, x: i32, y: i32) -> Option<&BurnEffect> {
        self.burns.buildings.get(&coord_key(x, y))
    }

    pub fn active_tree_burns(&self) -> usize {
        self.burns.trees.len()
    }

    pub fn active_building_burns(&self) -> usize {
        self.burns.buildings.len()
    }

    /// Trees first, then buildings. Burns never start other burns, so the
    /// registries can be taken out while they run.
    pub(crate) fn advance_burns(&mut self, dt: f32) {
        if self.burns.is_empty() {
            return;
        }
        let mut trees = std::mem::take(&mut self.burns.trees);
        for effect in trees.values_mut() {
            effect.advance(self, dt);
        }
        trees.retain(|_, effect| !finished(effect));
        self.burns.trees = trees;

        let mut buildings = std::mem::take(&mut self.burns.buildings);
        for effect in buildings.values_mut() {
            effect.advance(self, dt);
        }
        buildings.retain(|_, effect| !finished(effect));
        self.burns.buildings = buildings;
    }
}

fn finished(effect: &BurnEffect) -> bool {
    if effect.is_done() {
        debug!(
            "{:?} burn at ({}, {}) burnt out",
            effect.kind, effect.origin.x, effect.origin.y
        );
        return true;
    }
    false
}
