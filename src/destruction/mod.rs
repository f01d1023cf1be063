//! Terrain destruction: explosions and fire.
//!
//! Gameplay code sends [`Detonate`] and [`Ignite`] events; they are applied
//! to the world before the frame's tick so new burns start advancing the
//! same frame.

use bevy::prelude::*;

pub mod burn;
pub mod explosion;

use crate::world::terrain::TerrainWorld;
use crate::world::WorldTick;
use burn::BurnKind;

pub struct DestructionPlugin;

impl Plugin for DestructionPlugin {
    fn build(&self, app: &mut App) {
        app.add_event::<Detonate>()
            .add_event::<Ignite>()
            .add_systems(Update, apply_destruction.before(WorldTick));
    }
}

/// Carve a crater.
#[derive(Event, Clone, Copy, Debug)]
pub struct Detonate {
    pub x: i32,
    pub y: i32,
    pub radius: i32,
}

/// Set a tree or building on fire.
#[derive(Event, Clone, Copy, Debug)]
pub struct Ignite {
    pub x: i32,
    pub y: i32,
    pub kind: BurnKind,
}

fn apply_destruction(
    mut detonations: EventReader<Detonate>,
    mut ignitions: EventReader<Ignite>,
    world: Option<ResMut<TerrainWorld>>,
) {
    let Some(mut world) = world else {
        return;
    };

    for event in detonations.read() {
        world.explode(event.x, event.y, event.radius);
    }

    for event in ignitions.read() {
        let started = match event.kind {
            BurnKind::Tree => world.start_tree_burn(event.x, event.y),
            BurnKind::Building => world.start_building_burn(event.x, event.y),
        };
        if !started {
            debug!("Nothing to ignite at ({}, {})", event.x, event.y);
        }
    }
}
