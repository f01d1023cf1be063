//! Continuous sun model.
//!
//! The day/night model outside this crate drifts the sun every frame. Shadows
//! are only invalidated once the drift crosses a small threshold, otherwise
//! every frame would re-shade the whole world.

use bevy::prelude::*;

use super::coords::MAX_SHADOW_DIST;

/// Smallest angle change (radians, about 0.57 degrees) that re-shades the world.
pub const SUN_ANGLE_EPSILON: f32 = 0.01;

/// Smallest slope change that re-shades the world.
pub const SUN_SLOPE_EPSILON: f32 = 0.04;

/// One precomputed step of a shadow ray.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RayStep {
    pub offset: IVec2,
    /// Height lost by the sun ray after travelling this far.
    pub drop: f32,
}

/// Cached sun direction and elevation.
#[derive(Clone, Debug)]
pub struct Sun {
    angle: f32,
    slope: f32,
    cos: f32,
    sin: f32,
    ray: Vec<RayStep>,
}

impl Default for Sun {
    fn default() -> Self {
        // Late-afternoon light from the upper left.
        Self::new(-2.35, 1.2)
    }
}

impl Sun {
    pub fn new(angle: f32, slope: f32) -> Self {
        let mut sun = Self {
            angle,
            slope: slope.max(0.0),
            cos: angle.cos(),
            sin: angle.sin(),
            ray: Vec::with_capacity(MAX_SHADOW_DIST as usize),
        };
        sun.rebuild_ray();
        sun
    }

    pub fn angle(&self) -> f32 {
        self.angle
    }

    pub fn slope(&self) -> f32 {
        self.slope
    }

    /// Unit vector pointing from the ground toward the sun.
    pub fn direction(&self) -> Vec2 {
        Vec2::new(self.cos, self.sin)
    }

    /// Steps walked by every shadow ray, nearest first.
    pub fn ray(&self) -> &[RayStep] {
        &self.ray
    }

    /// Apply a new sun position. Returns true when the change was large enough
    /// to be taken; small drifts leave the cached state untouched.
    /// Non-finite input is ignored.
    pub fn update(&mut self, angle: f32, slope: f32) -> bool {
        if !angle.is_finite() || !slope.is_finite() {
            return false;
        }
        let slope = slope.max(0.0);
        let angle_delta = angle_difference(self.angle, angle).abs();
        let slope_delta = (self.slope - slope).abs();
        if angle_delta <= SUN_ANGLE_EPSILON && slope_delta <= SUN_SLOPE_EPSILON {
            return false;
        }

        self.angle = angle;
        self.slope = slope;
        self.cos = angle.cos();
        self.sin = angle.sin();
        self.rebuild_ray();
        true
    }

    fn rebuild_ray(&mut self) {
        self.ray.clear();
        for step in 1..=MAX_SHADOW_DIST {
            let distance = step as f32;
            self.ray.push(RayStep {
                offset: IVec2::new(
                    (self.cos * distance).round() as i32,
                    (self.sin * distance).round() as i32,
                ),
                drop: distance * self.slope,
            });
        }
    }
}

/// Shortest signed difference between two angles.
fn angle_difference(a: f32, b: f32) -> f32 {
    use std::f32::consts::{PI, TAU};
    (b - a + PI).rem_euclid(TAU) - PI
}
