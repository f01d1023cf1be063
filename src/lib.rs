//! PixelSprawl - destructible pixel-city terrain.
//!
//! A top-down world of colored pixels with heights, stored in fixed-size
//! chunks. Cities are generated deterministically from a seed, shaded by a
//! moving sun, and can be blown up or burnt down pixel by pixel.

use bevy::prelude::*;

pub mod destruction;
pub mod procgen;
pub mod world;

pub use destruction::burn::{BurnConfig, BurnKind};
pub use destruction::{DestructionPlugin, Detonate, Ignite};
pub use procgen::theme::{Theme, ThemeKind};
pub use world::color::Rgb;
pub use world::coords::ChunkKey;
pub use world::terrain::TerrainWorld;
pub use world::{SunInput, WorldConfig, WorldPlugin};

/// Everything needed to run the terrain in an app.
pub struct PixelSprawlPlugin;

impl Plugin for PixelSprawlPlugin {
    fn build(&self, app: &mut App) {
        app
            // World management
            .add_plugins(WorldPlugin)
            // Explosions and fire
            .add_plugins(DestructionPlugin);
    }
}
