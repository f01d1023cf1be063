//! Cosmetic pixel overrides: temporary paints that revert on a timer, and
//! scheduled paints that turn into temporary ones after a delay.
//!
//! Only the color changes. A temporary paint is reverted only while the pixel
//! still shows the temporary color; any permanent write in between wins.
//!
//! Timers lapse within [`TTL_SLACK`] of zero, so a paint ticked in frame-sized
//! steps that sum to its lifetime reverts on the last step despite f32
//! rounding.

use bevy::prelude::*;

use super::color::Rgb;
use super::terrain::TerrainWorld;

/// Remaining time at or below which a paint counts as lapsed.
pub const TTL_SLACK: f32 = 1e-4;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TempPaint {
    pub pos: IVec2,
    pub color: Rgb,
    /// Color captured when the first paint landed.
    pub original: Rgb,
    pub remaining: f32,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScheduledPaint {
    pub pos: IVec2,
    pub color: Rgb,
    pub delay: f32,
    pub ttl: f32,
}

#[derive(Clone, Debug, Default)]
pub struct PaintQueue {
    temp: Vec<TempPaint>,
    scheduled: Vec<ScheduledPaint>,
}

impl PaintQueue {
    pub fn temp_len(&self) -> usize {
        self.temp.len()
    }

    pub fn scheduled_len(&self) -> usize {
        self.scheduled.len()
    }

    pub fn is_empty(&self) -> bool {
        self.temp.is_empty() && self.scheduled.is_empty()
    }

    /// Paint now and remember how to undo it.
    pub(crate) fn add_temp(&mut self, world: &mut TerrainWorld, pos: IVec2, color: Rgb, ttl: f32) -> bool {
        if ttl.is_nan() || ttl <= 0.0 {
            return false;
        }
        let original = world.color_at(pos.x, pos.y);
        if !world.paint_rgb(pos.x, pos.y, color) {
            return false;
        }
        match self.temp.iter_mut().find(|p| p.pos == pos) {
            Some(existing) => {
                existing.color = color;
                existing.remaining = ttl;
            }
            None => self.temp.push(TempPaint {
                pos,
                color,
                original,
                remaining: ttl,
            }),
        }
        true
    }

    pub(crate) fn add_scheduled(&mut self, pos: IVec2, color: Rgb, delay: f32, ttl: f32) -> bool {
        if ttl.is_nan() || ttl <= 0.0 || delay.is_nan() {
            return false;
        }
        self.scheduled.push(ScheduledPaint {
            pos,
            color,
            delay: delay.max(0.0),
            ttl,
        });
        true
    }

    /// Advance scheduled paints, then temporary ones.
    pub(crate) fn advance(&mut self, world: &mut TerrainWorld, dt: f32) {
        let mut due = Vec::new();
        self.scheduled.retain_mut(|p| {
            p.delay -= dt;
            if p.delay <= TTL_SLACK {
                due.push(*p);
                false
            } else {
                true
            }
        });
        for p in due {
            // The temp pass below takes `dt` off again; the overshoot past
            // zero already counts as lived time.
            let ttl = p.ttl + dt + p.delay;
            self.add_temp(world, p.pos, p.color, ttl);
        }

        self.temp.retain_mut(|p| {
            p.remaining -= dt;
            if p.remaining > TTL_SLACK {
                return true;
            }
            if world.color_at(p.pos.x, p.pos.y) == p.color {
                world.paint_rgb(p.pos.x, p.pos.y, p.original);
            }
            false
        });
    }
}

#[cfg(test)]
mod tests {
    use crate::world::color::Rgb;
    use crate::world::terrain::TerrainWorld;
    use crate::world::WorldConfig;

    fn world() -> TerrainWorld {
        TerrainWorld::new(WorldConfig {
            width: 128,
            height: 128,
            ..WorldConfig::default()
        })
    }

    #[test]
    fn fractional_ticks_summing_to_ttl_revert() {
        let mut w = world();
        let red = Rgb::new(250, 1, 1);
        for (ttl, dt, ticks) in [(0.3, 0.1, 3), (0.7, 0.1, 7), (1.0, 1.0 / 60.0, 60)] {
            let original = w.color_at(90, 90);
            assert!(w.add_temp_paint(90, 90, red, ttl));
            for _ in 0..ticks - 1 {
                w.update(dt);
            }
            assert_eq!(w.color_at(90, 90), red, "ttl {} reverted early", ttl);
            w.update(dt);
            assert_eq!(w.color_at(90, 90), original, "ttl {} never reverted", ttl);
            assert_eq!(w.temp_paint_count(), 0);
        }
    }

    #[test]
    fn repaint_keeps_first_original() {
        let mut w = world();
        let original = w.color_at(60, 60);
        w.add_temp_paint(60, 60, Rgb::new(1, 2, 3), 0.5);
        w.add_temp_paint(60, 60, Rgb::new(4, 5, 6), 0.5);
        assert_eq!(w.temp_paint_count(), 1);
        w.update(0.5);
        assert_eq!(w.color_at(60, 60), original);
    }
}
