//! The destructible terrain world.
//!
//! Owns every chunk in a dense arena indexed `y * chunks_x + x`. Chunks are
//! generated on first access. All writes go through the typed methods here so
//! the border stays indestructible and the dirty flags stay honest.

use bevy::prelude::*;

use super::chunk::{Chunk, HeightSampler};
use super::color::Rgb;
use super::coords::{split_world, ChunkKey, CHUNK_SIZE, MAX_HEIGHT, MAX_SHADOW_DIST};
use super::paint::PaintQueue;
use super::quadtree::QuadTree;
use super::sun::Sun;
use super::WorldConfig;
use crate::destruction::burn::BurnRegistry;
use crate::procgen::generator::ChunkGenerator;
use crate::procgen::hash::{hash, salt};
use crate::procgen::theme::{Palette, Theme};
use crate::world::coords::rects_overlap;

/// The world resource.
#[derive(Resource)]
pub struct TerrainWorld {
    config: WorldConfig,
    generator: ChunkGenerator,
    chunks: Vec<Option<Chunk>>,
    chunks_x: i32,
    chunks_y: i32,
    sun: Sun,
    paints: PaintQueue,
    pub(crate) burns: BurnRegistry,
    index: Option<QuadTree<ChunkKey>>,
}

impl TerrainWorld {
    pub fn new(config: WorldConfig) -> Self {
        let width = config.width.max(1);
        let height = config.height.max(1);
        let chunks_x = (width + CHUNK_SIZE - 1) / CHUNK_SIZE;
        let chunks_y = (height + CHUNK_SIZE - 1) / CHUNK_SIZE;
        info!(
            "Creating {}x{} world: {} chunks, theme '{}', seed {}",
            width,
            height,
            chunks_x * chunks_y,
            config.theme.name,
            config.seed
        );

        let generator = ChunkGenerator::new(config.seed, config.theme.clone(), width, height);
        let mut chunks = Vec::new();
        chunks.resize_with((chunks_x * chunks_y) as usize, || None);

        Self {
            config: WorldConfig {
                width,
                height,
                ..config
            },
            generator,
            chunks,
            chunks_x,
            chunks_y,
            sun: Sun::default(),
            paints: PaintQueue::default(),
            burns: BurnRegistry::default(),
            index: None,
        }
    }

    pub fn config(&self) -> &WorldConfig {
        &self.config
    }

    pub fn width(&self) -> i32 {
        self.config.width
    }

    pub fn height(&self) -> i32 {
        self.config.height
    }

    pub fn seed(&self) -> u64 {
        self.config.seed
    }

    pub fn theme(&self) -> &Theme {
        self.generator.theme()
    }

    pub fn palette(&self) -> &Palette {
        self.generator.palette()
    }

    pub fn generator(&self) -> &ChunkGenerator {
        &self.generator
    }

    pub fn sun(&self) -> &Sun {
        &self.sun
    }

    /// World pixel bounds (exclusive max).
    pub fn bounds(&self) -> IRect {
        IRect::new(0, 0, self.config.width, self.config.height)
    }

    pub fn in_bounds(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && x < self.config.width && y < self.config.height
    }

    // ------------------------------------------------------------------
    // Chunk arena
    // ------------------------------------------------------------------

    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    pub fn generated_chunk_count(&self) -> usize {
        self.chunks.iter().filter(|c| c.is_some()).count()
    }

    fn chunk_index(&self, key: ChunkKey) -> Option<usize> {
        if key.x < 0 || key.y < 0 || key.x >= self.chunks_x || key.y >= self.chunks_y {
            return None;
        }
        Some((key.y * self.chunks_x + key.x) as usize)
    }

    /// Chunk owning a world pixel, `None` outside the world.
    pub fn chunk_key_at(&self, x: i32, y: i32) -> Option<ChunkKey> {
        self.in_bounds(x, y).then(|| ChunkKey::containing(x, y))
    }

    /// An already generated chunk.
    pub fn chunk(&self, key: ChunkKey) -> Option<&Chunk> {
        self.chunks.get(self.chunk_index(key)?)?.as_ref()
    }

    /// Chunk at `key`, generating it on first access.
    pub(crate) fn ensure_chunk(&mut self, key: ChunkKey) -> Option<&mut Chunk> {
        let index = self.chunk_index(key)?;
        if self.chunks[index].is_none() {
            debug!("Generating chunk ({}, {})", key.x, key.y);
            self.chunks[index] = Some(self.generator.generate(key));
        }
        self.chunks[index].as_mut()
    }

    /// Keys of the chunks overlapping a pixel rectangle, clamped to the world.
    pub(crate) fn keys_overlapping(&self, rect: IRect) -> Vec<ChunkKey> {
        if rect.max.x <= rect.min.x || rect.max.y <= rect.min.y {
            return Vec::new();
        }
        let lo = ChunkKey::containing(rect.min.x, rect.min.y);
        let hi = ChunkKey::containing(rect.max.x - 1, rect.max.y - 1);
        let (x0, y0) = (lo.x.max(0), lo.y.max(0));
        let (x1, y1) = (hi.x.min(self.chunks_x - 1), hi.y.min(self.chunks_y - 1));
        let mut keys = Vec::new();
        for cy in y0..=y1 {
            for cx in x0..=x1 {
                keys.push(ChunkKey::new(cx, cy));
            }
        }
        keys
    }

    /// Chunk and chunk-local offset of an in-world pixel.
    fn locate(&self, x: i32, y: i32) -> Option<(ChunkKey, i32, i32)> {
        if !self.in_bounds(x, y) {
            return None;
        }
        let (key, local) = split_world(x, y);
        Some((key, local.x as i32, local.y as i32))
    }

    // ------------------------------------------------------------------
    // Reads
    // ------------------------------------------------------------------

    /// Height at a pixel; outside the world reads as solid border.
    pub fn height_at(&mut self, x: i32, y: i32) -> u8 {
        let Some((key, lx, ly)) = self.locate(x, y) else {
            return MAX_HEIGHT;
        };
        self.ensure_chunk(key)
            .and_then(|c| c.height(lx, ly))
            .unwrap_or(MAX_HEIGHT)
    }

    /// Color at a pixel; outside the world reads as the border color.
    pub fn color_at(&mut self, x: i32, y: i32) -> Rgb {
        let border = self.palette().border;
        let Some((key, lx, ly)) = self.locate(x, y) else {
            return border;
        };
        self.ensure_chunk(key)
            .and_then(|c| c.color(lx, ly))
            .unwrap_or(border)
    }

    pub fn is_blocked(&mut self, x: i32, y: i32) -> bool {
        self.height_at(x, y) > 0
    }

    /// Border pixels, and everything outside the world, are indestructible.
    pub fn is_indestructible(&mut self, x: i32, y: i32) -> bool {
        let Some((key, lx, ly)) = self.locate(x, y) else {
            return true;
        };
        self.ensure_chunk(key)
            .map_or(true, |c| c.is_indestructible(lx, ly))
    }

    /// Bresenham walk between two pixels. Only the pixels strictly between
    /// the endpoints are tested, so a wall can be seen.
    pub fn has_line_of_sight(&mut self, ax: i32, ay: i32, bx: i32, by: i32) -> bool {
        if !self.in_bounds(ax, ay) || !self.in_bounds(bx, by) {
            // Any line with a pixel between its ends passes either the solid
            // border frame or the solid void outside it.
            let reach = (i64::from(bx) - i64::from(ax))
                .abs()
                .max((i64::from(by) - i64::from(ay)).abs());
            return reach <= 1;
        }
        let dx = (bx - ax).abs();
        let dy = -(by - ay).abs();
        let sx = if ax < bx { 1 } else { -1 };
        let sy = if ay < by { 1 } else { -1 };
        let mut err = dx + dy;
        let (mut x, mut y) = (ax, ay);

        loop {
            if x == bx && y == by {
                return true;
            }
            let e2 = 2 * err;
            if e2 >= dy {
                err += dy;
                x += sx;
            }
            if e2 <= dx {
                err += dx;
                y += sy;
            }
            if (x != bx || y != by) && self.is_blocked(x, y) {
                return false;
            }
        }
    }

    // ------------------------------------------------------------------
    // Writes
    // ------------------------------------------------------------------

    /// Overwrite a pixel's color, keeping its height and shade.
    pub fn paint_rgb(&mut self, x: i32, y: i32, color: Rgb) -> bool {
        let Some((key, lx, ly)) = self.locate(x, y) else {
            return false;
        };
        let Some(chunk) = self.ensure_chunk(key) else {
            return false;
        };
        if chunk.is_indestructible(lx, ly) {
            return false;
        }
        chunk.set_color(lx, ly, color)
    }

    /// Flatten a pixel to hashed char.
    pub fn burn_pixel(&mut self, x: i32, y: i32) -> bool {
        let tone = self.palette().char_tone(hash(self.config.seed, x, y, salt::CHAR));
        self.burn_pixel_with_color(x, y, tone)
    }

    /// Flatten a pixel to height 0 and repaint it.
    pub fn burn_pixel_with_color(&mut self, x: i32, y: i32, color: Rgb) -> bool {
        let Some((key, lx, ly)) = self.locate(x, y) else {
            return false;
        };
        let Some(chunk) = self.ensure_chunk(key) else {
            return false;
        };
        let Some(px) = chunk.get(lx, ly) else {
            return false;
        };
        if px.indestructible {
            return false;
        }
        chunk.set(lx, ly, color, 0, px.shade, false);
        if px.height > 0 {
            self.invalidate_shadows(IRect::new(x, y, x + 1, y + 1));
        }
        true
    }

    pub fn add_temp_paint(&mut self, x: i32, y: i32, color: Rgb, ttl: f32) -> bool {
        let mut paints = std::mem::take(&mut self.paints);
        let added = paints.add_temp(self, IVec2::new(x, y), color, ttl);
        self.paints = paints;
        added
    }

    pub fn add_scheduled_paint(&mut self, x: i32, y: i32, color: Rgb, delay: f32, ttl: f32) -> bool {
        if !self.in_bounds(x, y) {
            return false;
        }
        self.paints.add_scheduled(IVec2::new(x, y), color, delay, ttl)
    }

    pub fn temp_paint_count(&self) -> usize {
        self.paints.temp_len()
    }

    pub fn scheduled_paint_count(&self) -> usize {
        self.paints.scheduled_len()
    }

    /// Per-frame tick: scheduled paints, temporary paints, tree burns, then
    /// building burns.
    pub fn update(&mut self, dt: f32) {
        if dt.is_nan() || dt <= 0.0 {
            return;
        }
        if !self.paints.is_empty() {
            let mut paints = std::mem::take(&mut self.paints);
            paints.advance(self, dt);
            self.paints = paints;
        }

        self.advance_burns(dt);
    }

    // ------------------------------------------------------------------
    // Sun and shadows
    // ------------------------------------------------------------------

    /// Feed the sun position from the day-night model. Returns true when the
    /// change was big enough to invalidate shadows.
    pub fn update_sun(&mut self, angle: f32, slope: f32) -> bool {
        if !self.sun.update(angle, slope) {
            return false;
        }
        debug!(
            "Sun moved to angle {:.3}, slope {:.3}; shadows invalidated",
            angle, slope
        );
        for chunk in self.chunks.iter_mut().flatten() {
            chunk.needs_shadow = true;
        }
        true
    }

    /// Mark shadow-dirty every chunk whose shading can depend on heights in
    /// `area`: the area itself plus its reach in the anti-sun direction.
    pub(crate) fn invalidate_shadows(&mut self, area: IRect) {
        let away = -self.sun.direction() * MAX_SHADOW_DIST as f32;
        let shift = IVec2::new(away.x.round() as i32, away.y.round() as i32);
        let reach = area.union(IRect::from_corners(area.min + shift, area.max + shift));
        for key in self.keys_overlapping(reach) {
            if let Some(chunk) = self.chunk_index(key).and_then(|i| self.chunks[i].as_mut()) {
                chunk.needs_shadow = true;
            }
        }
    }

    /// Recompute one chunk's shadows. Chunks the sun rays can cross are
    /// generated first so rays never read missing terrain.
    pub fn refresh_shadows(&mut self, key: ChunkKey) -> bool {
        if self.ensure_chunk(key).is_none() {
            return false;
        }
        let toward = self.sun.direction() * MAX_SHADOW_DIST as f32;
        let shift = IVec2::new(toward.x.round() as i32, toward.y.round() as i32);
        let bounds = key.bounds();
        let reach = bounds.union(IRect::from_corners(bounds.min + shift, bounds.max + shift));
        for neighbour in self.keys_overlapping(reach) {
            self.ensure_chunk(neighbour);
        }

        let Some(index) = self.chunk_index(key) else {
            return false;
        };
        let Some(mut chunk) = self.chunks[index].take() else {
            return false;
        };
        chunk.recompute_shadows(&self.sun, &*self);
        self.chunks[index] = Some(chunk);
        true
    }

    /// Chunks overlapping the view with their shadows brought up to date,
    /// ready for upload.
    pub fn prepare_visible(&mut self, view: IRect) -> Vec<ChunkKey> {
        let keys = self.visible_chunks(view);
        for key in &keys {
            let stale = self
                .ensure_chunk(*key)
                .is_some_and(|c| c.needs_shadow);
            if stale {
                self.refresh_shadows(*key);
            }
        }
        keys
    }

    /// The renderer pulled the chunk's buffers.
    pub fn mark_uploaded(&mut self, key: ChunkKey) {
        if let Some(chunk) = self.chunk_index(key).and_then(|i| self.chunks[i].as_mut()) {
            chunk.needs_upload = false;
        }
    }

    // ------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------

    /// Generate every chunk, then re-stamp the road network.
    pub fn generate_all(&mut self) {
        info!("Generating {} chunks...", self.chunk_count());
        for cy in 0..self.chunks_y {
            for cx in 0..self.chunks_x {
                self.ensure_chunk(ChunkKey::new(cx, cy));
            }
        }
        let repaired = self.repair_roads();
        info!(
            "World generation complete: {} chunks, {} road pixels repaired",
            self.generated_chunk_count(),
            repaired
        );
    }

    /// Re-stamp every road and sidewalk pixel from the solved road network.
    /// Returns the number of pixels that had to change.
    pub fn repair_roads(&mut self) -> usize {
        let mut repaired = 0;
        let generator = &self.generator;
        for slot in self.chunks.iter_mut() {
            let Some(chunk) = slot.as_mut() else {
                continue;
            };
            let origin = chunk.key().origin();
            let mut touched = false;
            for ly in 0..CHUNK_SIZE {
                for lx in 0..CHUNK_SIZE {
                    let Some(color) = generator.road_surface(origin.x + lx, origin.y + ly) else {
                        continue;
                    };
                    let Some(px) = chunk.get(lx, ly) else {
                        continue;
                    };
                    if px.indestructible || (px.color == color && px.height == 0) {
                        continue;
                    }
                    chunk.set(lx, ly, color, 0, px.shade, false);
                    repaired += 1;
                    touched = true;
                }
            }
            if touched {
                chunk.needs_shadow = true;
            }
        }
        if repaired > 0 {
            debug!("Road repair touched {} pixels", repaired);
        }
        repaired
    }

    /// Index every chunk's bounds for view culling.
    pub fn build_spatial_index(&mut self) {
        let mut tree = QuadTree::new(self.bounds());
        for cy in 0..self.chunks_y {
            for cx in 0..self.chunks_x {
                let key = ChunkKey::new(cx, cy);
                tree.insert(key, key.bounds());
            }
        }
        info!("Spatial index built over {} chunks", tree.len());
        self.index = Some(tree);
    }

    /// Chunks overlapping a view rectangle (exclusive max), sorted row-major.
    pub fn visible_chunks(&self, view: IRect) -> Vec<ChunkKey> {
        let mut keys = match &self.index {
            Some(tree) => {
                let mut hits = Vec::new();
                tree.query(view, &mut hits);
                hits.retain(|k| rects_overlap(&k.bounds(), &view));
                hits
            }
            None => self.keys_overlapping(view),
        };
        keys.sort_by_key(|k| (k.y, k.x));
        keys.dedup();
        keys
    }
}

impl HeightSampler for TerrainWorld {
    /// Heights for shadow rays. Ungenerated chunks read as flat ground.
    fn sample_height(&self, x: i32, y: i32) -> u8 {
        let Some((key, lx, ly)) = self.locate(x, y) else {
            return MAX_HEIGHT;
        };
        self.chunk(key).and_then(|c| c.height(lx, ly)).unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::coords::BORDER_WIDTH;

    fn world() -> TerrainWorld {
        TerrainWorld::new(WorldConfig {
            width: 256,
            height: 256,
            ..WorldConfig::default()
        })
    }

    #[test]
    fn chunks_generate_lazily() {
        let mut w = world();
        assert_eq!(w.chunk_count(), 16);
        assert_eq!(w.generated_chunk_count(), 0);
        w.height_at(70, 70);
        assert_eq!(w.generated_chunk_count(), 1);
        assert!(w.chunk(ChunkKey::new(1, 1)).is_some());
        assert!(w.chunk(ChunkKey::new(0, 0)).is_none());
    }

    #[test]
    fn out_of_world_reads_are_border() {
        let mut w = world();
        let border = w.palette().border;
        assert_eq!(w.height_at(-1, 5), MAX_HEIGHT);
        assert_eq!(w.color_at(300, 5), border);
        assert!(w.is_blocked(5, 256));
        assert!(w.is_indestructible(-3, -3));
        assert!(!w.paint_rgb(-1, 0, Rgb::new(1, 2, 3)));
        assert!(w.chunk_key_at(256, 0).is_none());
    }

    #[test]
    fn paint_keeps_height_and_respects_border() {
        let mut w = world();
        let before = w.height_at(100, 100);
        assert!(w.paint_rgb(100, 100, Rgb::new(9, 9, 9)));
        assert_eq!(w.color_at(100, 100), Rgb::new(9, 9, 9));
        assert_eq!(w.height_at(100, 100), before);

        let border = w.color_at(0, 0);
        assert!(!w.paint_rgb(0, 0, Rgb::new(9, 9, 9)));
        assert!(!w.burn_pixel(BORDER_WIDTH - 1, 50));
        assert_eq!(w.color_at(0, 0), border);
        assert_eq!(w.height_at(BORDER_WIDTH - 1, 50), MAX_HEIGHT);
    }

    #[test]
    fn burn_flattens_and_dirties_shadows() {
        let mut w = world();
        w.generate_all();
        let raised = (BORDER_WIDTH..256 - BORDER_WIDTH)
            .flat_map(|y| (BORDER_WIDTH..256 - BORDER_WIDTH).map(move |x| (x, y)))
            .find(|&(x, y)| w.height_at(x, y) > 0);
        let (x, y) = raised.expect("city should have raised pixels");
        let key = ChunkKey::containing(x, y);
        w.refresh_shadows(key);
        assert!(!w.chunk(key).unwrap().needs_shadow);

        assert!(w.burn_pixel(x, y));
        assert_eq!(w.height_at(x, y), 0);
        assert!(w.chunk(key).unwrap().needs_shadow);
    }

    #[test]
    fn line_of_sight_through_cleared_corridor() {
        let mut w = world();
        for y in 40..60 {
            w.burn_pixel_with_color(40, y, Rgb::BLACK);
            w.burn_pixel_with_color(41, y, Rgb::BLACK);
            w.burn_pixel_with_color(42, y, Rgb::BLACK);
        }
        assert!(w.has_line_of_sight(40, 40, 42, 59));
        assert!(w.has_line_of_sight(10, 10, 10, 10));
        // Through the border frame.
        assert!(!w.has_line_of_sight(BORDER_WIDTH, 20, -5, 20));
    }

    #[test]
    fn line_of_sight_stops_at_raised_pixels_between_the_ends() {
        let mut w = world();
        for x in 40..60 {
            w.burn_pixel_with_color(x, 40, Rgb::BLACK);
        }
        assert!(w.has_line_of_sight(40, 40, 59, 40));

        let (key, local) = split_world(50, 40);
        let chunk = w.ensure_chunk(key).unwrap();
        chunk.set(local.x as i32, local.y as i32, Rgb::BLACK, 10, 0, false);
        assert!(w.is_blocked(50, 40));

        assert!(!w.has_line_of_sight(40, 40, 59, 40));
        assert!(!w.has_line_of_sight(59, 40, 40, 40));
        // The wall itself can be seen from either side.
        assert!(w.has_line_of_sight(40, 40, 50, 40));
        assert!(w.has_line_of_sight(59, 40, 50, 40));
        assert!(!w.has_line_of_sight(49, 40, 51, 40));
    }

    #[test]
    fn line_of_sight_to_far_outside_points_is_blocked() {
        let mut w = world();
        assert!(!w.has_line_of_sight(-10, 5, i32::MAX, 5));
        assert!(!w.has_line_of_sight(i32::MIN, i32::MIN, 100, 100));
        assert!(!w.has_line_of_sight(100, 100, 100, 300));
        // Adjacent pixels have nothing between them.
        assert!(w.has_line_of_sight(0, 5, -1, 5));
        assert!(w.has_line_of_sight(-1, -1, -2, -2));
    }

    #[test]
    fn small_sun_drift_keeps_shadows() {
        let mut w = world();
        w.generate_all();
        w.prepare_visible(w.bounds());
        assert!(!w.update_sun(w.sun().angle() + 0.005, w.sun().slope()));
        assert!(w.chunk(ChunkKey::new(0, 0)).is_some_and(|c| !c.needs_shadow));
        assert!(w.update_sun(w.sun().angle() + 0.5, w.sun().slope()));
        assert!(w.chunk(ChunkKey::new(0, 0)).is_some_and(|c| c.needs_shadow));
    }

    #[test]
    fn visible_chunks_match_with_and_without_index() {
        let mut w = world();
        let view = IRect::new(30, 70, 140, 130);
        let direct = w.visible_chunks(view);
        w.build_spatial_index();
        assert_eq!(w.visible_chunks(view), direct);
        assert_eq!(direct.len(), 3 * 2);
    }

    #[test]
    fn fresh_world_needs_no_road_repair() {
        let mut w = world();
        w.generate_all();
        assert_eq!(w.repair_roads(), 0);
    }

    #[test]
    fn mark_uploaded_clears_the_flag() {
        let mut w = world();
        let keys = w.prepare_visible(IRect::new(0, 0, 64, 64));
        assert_eq!(keys, vec![ChunkKey::new(0, 0)]);
        assert!(w.chunk(keys[0]).unwrap().needs_upload);
        w.mark_uploaded(keys[0]);
        assert!(!w.chunk(keys[0]).unwrap().needs_upload);
    }
}
