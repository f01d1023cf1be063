//! Circular terrain carving.

use bevy::prelude::*;

use crate::world::coords::rect_intersection;
use crate::world::terrain::TerrainWorld;

impl TerrainWorld {
    /// Flatten every destructible pixel within `radius` of the centre.
    /// Rubble covers the inner half of the radius, cleared ground the rest.
    /// Returns the number of pixels carved; a negative radius is a no-op.
    pub fn explode(&mut self, x: i32, y: i32, radius: i32) -> usize {
        if radius < 0 {
            return 0;
        }
        let radius = i64::from(radius);
        let (cx, cy) = (i64::from(x), i64::from(y));
        let world = self.bounds();
        let min_x = (cx - radius).max(i64::from(world.min.x));
        let min_y = (cy - radius).max(i64::from(world.min.y));
        let max_x = (cx + radius + 1).min(i64::from(world.max.x));
        let max_y = (cy + radius + 1).min(i64::from(world.max.y));
        if min_x >= max_x || min_y >= max_y {
            return 0;
        }
        // Clamped to the world, so these fit.
        let area = IRect::new(min_x as i32, min_y as i32, max_x as i32, max_y as i32);
        // Squares in u64: a pixel inside the clamped box is at most `radius`
        // away per axis, so neither the squares nor their sum overflow.
        let r2 = (radius * radius) as u64;
        let rubble = self.palette().rubble;
        let cleared = self.palette().cleared;

        let mut carved = 0;
        for key in self.keys_overlapping(area) {
            let Some(clip) = rect_intersection(&area, &key.bounds()) else {
                continue;
            };
            let Some(chunk) = self.ensure_chunk(key) else {
                continue;
            };
            let origin = key.origin();
            for py in clip.min.y..clip.max.y {
                for px in clip.min.x..clip.max.x {
                    let dx = (i64::from(px) - cx).unsigned_abs();
                    let dy = (i64::from(py) - cy).unsigned_abs();
                    let d2 = dx * dx + dy * dy;
                    if d2 > r2 {
                        continue;
                    }
                    let (lx, ly) = (px - origin.x, py - origin.y);
                    let Some(pixel) = chunk.get(lx, ly) else {
                        continue;
                    };
                    if pixel.indestructible {
                        continue;
                    }
                    let color = if d2 <= r2 / 4 { rubble } else { cleared };
                    chunk.set(lx, ly, color, 0, pixel.shade, false);
                    carved += 1;
                }
            }
        }

        if carved > 0 {
            self.invalidate_shadows(area);
        }
        debug!("Explosion at ({}, {}) r={} carved {} pixels", x, y, radius, carved);
        carved
    }
}

#[cfg(test)]
mod tests {
    use crate::world::coords::{BORDER_WIDTH, MAX_HEIGHT};
    use crate::world::terrain::TerrainWorld;
    use crate::world::WorldConfig;

    fn world() -> TerrainWorld {
        TerrainWorld::new(WorldConfig {
            width: 256,
            height: 256,
            ..WorldConfig::default()
        })
    }

    #[test]
    fn crater_is_flat_with_rubble_core() {
        let mut w = world();
        let palette = *w.palette();
        let carved = w.explode(120, 120, 9);
        assert!(carved > 200);
        for dy in -9i32..=9 {
            for dx in -9i32..=9 {
                let d2 = dx * dx + dy * dy;
                if d2 > 81 {
                    continue;
                }
                assert_eq!(w.height_at(120 + dx, 120 + dy), 0);
                let expected = if d2 * 4 <= 81 { palette.rubble } else { palette.cleared };
                assert_eq!(w.color_at(120 + dx, 120 + dy), expected);
            }
        }
    }

    #[test]
    fn border_survives_explosions() {
        let mut w = world();
        let border = w.color_at(0, 100);
        w.explode(1, 100, 12);
        for x in 0..BORDER_WIDTH {
            assert_eq!(w.height_at(x, 100), MAX_HEIGHT);
            assert_eq!(w.color_at(x, 100), border);
        }
        assert_eq!(w.height_at(BORDER_WIDTH, 100), 0);
    }

    #[test]
    fn huge_radius_and_far_centres_do_not_overflow() {
        let mut w = world();
        let inner = (256 - 2 * BORDER_WIDTH) as usize;
        assert_eq!(w.explode(100, 100, 50_000), inner * inner);
        assert_eq!(w.height_at(BORDER_WIDTH, BORDER_WIDTH), 0);
        assert_eq!(w.height_at(0, 0), MAX_HEIGHT);
        assert_eq!(w.explode(i32::MAX, i32::MIN, i32::MAX), 0);
        assert_eq!(w.explode(i32::MAX - 1, 5, 10), 0);
    }

    #[test]
    fn negative_radius_is_a_no_op() {
        let mut w = world();
        assert_eq!(w.explode(50, 50, -3), 0);
        assert_eq!(w.generated_chunk_count(), 0);
    }
}
