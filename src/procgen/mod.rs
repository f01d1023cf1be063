//! Procedural generation of the pixel city.
//!
//! - Deterministic hashing keyed on seed, coordinates and salt
//! - A regular block grid with merged parcels and a pruned road graph
//! - Parks, buildings and parking lots planned per parcel
//! - Perlin ground and wild trees outside the grid
//!
//! Everything here is a pure function of the seed and world size, so any
//! chunk can be generated alone and in any order.

pub mod buildings;
pub mod generator;
pub mod grid;
pub mod hash;
pub mod parcels;
pub mod parking;
pub mod parks;
pub mod plan;
pub mod roads;
pub mod terrain;
pub mod theme;
pub mod trees;
