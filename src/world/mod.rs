//! World management: chunk storage, coordinates, shadows, spatial index and
//! the terrain world resource.

use bevy::prelude::*;

pub mod chunk;
pub mod color;
pub mod coords;
pub mod paint;
pub mod quadtree;
pub mod sun;
pub mod terrain;

use crate::destruction::burn::BurnConfig;
use crate::procgen::theme::Theme;
use terrain::TerrainWorld;

pub struct WorldPlugin;

impl Plugin for WorldPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<WorldConfig>()
            .init_resource::<SunInput>()
            .add_systems(Startup, generate_world)
            .add_systems(Update, (apply_sun, tick_world).chain().in_set(WorldTick));
    }
}

/// Systems that advance the world each frame.
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub struct WorldTick;

/// Global world configuration.
#[derive(Resource, Clone, Debug)]
pub struct WorldConfig {
    pub seed: u64,
    /// World width in pixels.
    pub width: i32,
    /// World height in pixels.
    pub height: i32,
    pub theme: Theme,
    pub burn: BurnConfig,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            seed: 1337,
            width: 1024,
            height: 1024,
            theme: Theme::city(),
            burn: BurnConfig::default(),
        }
    }
}

/// Sun position written by the day-night model each frame.
#[derive(Resource, Clone, Copy, Debug)]
pub struct SunInput {
    pub angle: f32,
    pub slope: f32,
}

impl Default for SunInput {
    fn default() -> Self {
        let sun = sun::Sun::default();
        Self {
            angle: sun.angle(),
            slope: sun.slope(),
        }
    }
}

fn generate_world(mut commands: Commands, config: Res<WorldConfig>) {
    info!("Generating pixel world...");
    let mut world = TerrainWorld::new(config.clone());
    world.generate_all();
    world.build_spatial_index();
    commands.insert_resource(world);
}

fn apply_sun(input: Res<SunInput>, world: Option<ResMut<TerrainWorld>>) {
    if let Some(mut world) = world {
        world.update_sun(input.angle, input.slope);
    }
}

fn tick_world(time: Res<Time>, world: Option<ResMut<TerrainWorld>>) {
    if let Some(mut world) = world {
        world.update(time.delta_secs());
    }
}
