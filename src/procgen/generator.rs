//! Chunk generator.
//!
//! Paints one chunk at a time from the city plan. Layers go down in a fixed
//! order: ground classification, parcel content, trees, frost, then the road
//! pass (which always wins) and finally the indestructible border. Every
//! decision is a hash of world coordinates, so a pixel's value does not
//! depend on which chunk was generated first.

use bevy::prelude::*;
use smallvec::SmallVec;

use super::buildings::plan_buildings;
use super::hash::{hash, salt, unit};
use super::parcels::{BlockParcel, ParcelKind};
use super::parking::plan_parking;
use super::parks::plan_park;
use super::plan::{CityPlan, Surface};
use super::terrain::{tiles_reaching, TerrainField};
use super::theme::{Palette, Theme};
use super::trees::Tree;
use crate::world::chunk::Chunk;
use crate::world::color::Rgb;
use crate::world::coords::{
    local_index, rect_intersection, ChunkKey, BORDER_WIDTH, CHUNK_AREA, CHUNK_SIZE, MAX_HEIGHT,
};

/// Share of frostable pixels that get frosted.
const FROST_COVER: f32 = 0.22;

/// Chunk being painted, addressed in world coordinates.
struct Canvas {
    chunk: Chunk,
    origin: IVec2,
    bounds: IRect,
    /// Ground and roofs take frost; foliage and walls do not.
    frostable: Vec<bool>,
}

impl Canvas {
    fn new(key: ChunkKey) -> Self {
        Self {
            chunk: Chunk::new(key),
            origin: key.origin(),
            bounds: key.bounds(),
            frostable: vec![false; CHUNK_AREA],
        }
    }

    fn put(&mut self, x: i32, y: i32, color: Rgb, height: u8, frostable: bool) {
        let (lx, ly) = (x - self.origin.x, y - self.origin.y);
        if self.chunk.height(lx, ly).is_some() {
            self.chunk.put(lx, ly, color, height);
            self.frostable[local_index(lx as u32, ly as u32)] = frostable;
        }
    }

    fn pixels(&self, rect: IRect) -> impl Iterator<Item = (i32, i32)> {
        let clip = rect_intersection(&rect, &self.bounds);
        clip.into_iter()
            .flat_map(|r| (r.min.y..r.max.y).flat_map(move |y| (r.min.x..r.max.x).map(move |x| (x, y))))
    }
}

/// Deterministic chunk generator for one world.
pub struct ChunkGenerator {
    seed: u64,
    theme: Theme,
    palette: Palette,
    width: i32,
    height: i32,
    plan: CityPlan,
    terrain: TerrainField,
}

impl ChunkGenerator {
    /// Solve the city plan and get ready to paint chunks.
    pub fn new(seed: u64, theme: Theme, width: i32, height: i32) -> Self {
        let theme = theme.normalized();
        let palette = Palette::for_theme(&theme);
        let plan = CityPlan::build(seed, &theme, width, height);
        Self {
            seed,
            palette,
            width,
            height,
            plan,
            terrain: TerrainField::new(seed),
            theme,
        }
    }

    pub fn theme(&self) -> &Theme {
        &self.theme
    }

    pub fn palette(&self) -> &Palette {
        &self.palette
    }

    pub fn plan(&self) -> &CityPlan {
        &self.plan
    }

    /// Pixel belongs to the border frame, or lies outside the world.
    pub fn is_border(&self, x: i32, y: i32) -> bool {
        x < BORDER_WIDTH || y < BORDER_WIDTH || x >= self.width - BORDER_WIDTH || y >= self.height - BORDER_WIDTH
    }

    /// Road or sidewalk color for a pixel the road network owns.
    pub fn road_surface(&self, x: i32, y: i32) -> Option<Rgb> {
        if self.is_border(x, y) {
            return None;
        }
        let grain = (hash(self.seed, x, y, salt::DITHER) % 3) as i16 - 1;
        match self.plan.surface(x, y) {
            Surface::Road { marking: true } => Some(self.palette.road_line),
            Surface::Road { marking: false } => Some(self.palette.road.offset(grain)),
            Surface::Sidewalk => Some(self.palette.sidewalk.offset(grain * 2)),
            Surface::Terrain | Surface::Parcel { .. } => None,
        }
    }

    /// Paint a chunk.
    pub fn generate(&self, key: ChunkKey) -> Chunk {
        let mut canvas = Canvas::new(key);
        let bounds = canvas.bounds;

        self.paint_ground(&mut canvas, bounds);
        if self.plan.grid().is_some() {
            self.paint_parcels(&mut canvas, bounds);
        } else {
            self.paint_wild_trees(&mut canvas, bounds);
        }
        if self.theme.frost {
            self.paint_frost(&mut canvas);
        }
        self.paint_roads(&mut canvas, bounds);
        self.paint_border(&mut canvas, bounds);

        let mut chunk = canvas.chunk;
        chunk.needs_shadow = true;
        chunk.needs_upload = true;
        chunk
    }

    fn paint_ground(&self, canvas: &mut Canvas, bounds: IRect) {
        let pixels: Vec<_> = canvas.pixels(bounds).collect();
        for (x, y) in pixels {
            let color = match self.plan.surface(x, y) {
                Surface::Terrain => self.terrain.ground(&self.theme, &self.palette, x, y),
                Surface::Road { .. } => self.palette.road,
                Surface::Sidewalk => self.palette.sidewalk,
                Surface::Parcel { .. } => self.palette.lot,
            };
            canvas.put(x, y, color, 0, true);
        }
    }

    fn paint_parcels(&self, canvas: &mut Canvas, bounds: IRect) {
        let Some(grid) = self.plan.grid() else {
            return;
        };

        // One pass per parcel, even when several of its blocks touch the chunk.
        let mut parcels: SmallVec<[BlockParcel; 8]> = SmallVec::new();
        for block in grid.blocks_touching(bounds) {
            if let Some(parcel) = self.plan.parcel(block) {
                if !parcels.iter().any(|p| p.same_as(parcel)) {
                    parcels.push(*parcel);
                }
            }
        }

        for parcel in &parcels {
            let area = grid.span_interior(parcel.anchor, parcel.size);
            if rect_intersection(&area, &bounds).is_none() {
                continue;
            }
            match parcel.kind {
                ParcelKind::None => self.paint_empty_lot(canvas, area),
                ParcelKind::Park => self.paint_park(canvas, parcel, area),
                ParcelKind::Building => self.paint_buildings(canvas, parcel, area),
                ParcelKind::ParkingLot => {
                    let layout = plan_parking(self.seed, parcel, area);
                    let pixels: Vec<_> = canvas.pixels(area).collect();
                    for (x, y) in pixels {
                        let color = layout.sample(self.seed, &self.palette, x, y);
                        canvas.put(x, y, color, 0, true);
                    }
                }
            }
        }
    }

    fn paint_empty_lot(&self, canvas: &mut Canvas, area: IRect) {
        let pixels: Vec<_> = canvas.pixels(area).collect();
        for (x, y) in pixels {
            let h = hash(self.seed, x, y, salt::DITHER);
            let color = match h % 9 {
                0 => self.palette.lot.offset(-10),
                1 => self.palette.ground,
                _ => self.palette.lot,
            };
            canvas.put(x, y, color, 0, true);
        }
    }

    fn paint_park(&self, canvas: &mut Canvas, parcel: &BlockParcel, area: IRect) {
        let layout = plan_park(self.seed, &self.theme, parcel, area);
        let pixels: Vec<_> = canvas.pixels(area).collect();
        for (x, y) in pixels {
            let color = layout.ground(self.seed, &self.palette, x, y);
            canvas.put(x, y, color, 0, true);
        }
        for tree in &layout.trees {
            self.paint_tree(canvas, tree);
        }
    }

    fn paint_buildings(&self, canvas: &mut Canvas, parcel: &BlockParcel, area: IRect) {
        let footprints = plan_buildings(self.seed, &self.theme, parcel, area);
        let pixels: Vec<_> = canvas.pixels(area).collect();
        for (x, y) in pixels {
            let sampled = footprints
                .iter()
                .find_map(|f| f.sample(self.seed, &self.palette, x, y));
            match sampled {
                Some((color, height)) => {
                    let roof = color != self.palette.wall && color != self.palette.roof_unit;
                    canvas.put(x, y, color, height, roof);
                }
                None => canvas.put(x, y, self.palette.lot, 0, true),
            }
        }
    }

    fn paint_tree(&self, canvas: &mut Canvas, tree: &Tree) {
        let pixels: Vec<_> = canvas.pixels(tree.bounds()).collect();
        for (x, y) in pixels {
            if let Some((color, height)) = tree.sample(self.seed, &self.palette, x, y) {
                canvas.put(x, y, color, height, false);
            }
        }
    }

    fn paint_wild_trees(&self, canvas: &mut Canvas, bounds: IRect) {
        let keep = IRect::new(
            BORDER_WIDTH,
            BORDER_WIDTH,
            self.width - BORDER_WIDTH,
            self.height - BORDER_WIDTH,
        );
        for tile in tiles_reaching(bounds) {
            for tree in self.terrain.wild_trees(&self.theme, tile, keep) {
                self.paint_tree(canvas, &tree);
            }
        }
    }

    fn paint_frost(&self, canvas: &mut Canvas) {
        let frost = self.palette.frost;
        let origin = canvas.origin;
        for i in 0..CHUNK_AREA {
            if !canvas.frostable[i] {
                continue;
            }
            let lx = i as i32 % CHUNK_SIZE;
            let ly = i as i32 / CHUNK_SIZE;
            let h = hash(self.seed, origin.x + lx, origin.y + ly, salt::FROST);
            if unit(h) >= FROST_COVER {
                continue;
            }
            if let (Some(color), Some(height)) = (canvas.chunk.color(lx, ly), canvas.chunk.height(lx, ly)) {
                let amount = 0.45 + 0.35 * unit(h.rotate_left(24));
                canvas.chunk.put(lx, ly, color.lerp(frost, amount), height);
            }
        }
    }

    fn paint_roads(&self, canvas: &mut Canvas, bounds: IRect) {
        if self.plan.grid().is_none() {
            return;
        }
        let pixels: Vec<_> = canvas.pixels(bounds).collect();
        for (x, y) in pixels {
            if let Some(color) = self.road_surface(x, y) {
                canvas.put(x, y, color, 0, false);
            }
        }
    }

    fn paint_border(&self, canvas: &mut Canvas, bounds: IRect) {
        let border = self.palette.border;
        let origin = canvas.origin;
        let pixels: Vec<_> = canvas.pixels(bounds).collect();
        for (x, y) in pixels {
            if self.is_border(x, y) {
                canvas.put(x, y, border, MAX_HEIGHT, false);
                canvas.chunk.set_indestructible(x - origin.x, y - origin.y, true);
            }
        }
    }
}
