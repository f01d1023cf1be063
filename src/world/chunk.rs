//! Chunk storage.
//!
//! A chunk is a `CHUNK_SIZE` square of color, shade, height and
//! indestructibility data. It knows nothing about generation; the world hands
//! it world-to-local translated coordinates and keeps the dirty flags honest.

use super::color::Rgb;
use super::coords::{local_index, ChunkKey, CHUNK_AREA, CHUNK_SIZE};
use super::sun::Sun;

/// Shade value for a pixel in direct light.
pub const SHADE_LIT: u8 = 255;

/// Shade value for a pixel in shadow.
pub const SHADE_DARK: u8 = 168;

/// Source of heights for shadow rays that leave the chunk.
pub trait HeightSampler {
    fn sample_height(&self, x: i32, y: i32) -> u8;
}

/// Snapshot of one pixel.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ChunkPixel {
    pub color: Rgb,
    pub height: u8,
    pub shade: u8,
    pub indestructible: bool,
}

/// Fixed-size tile of world data.
#[derive(Clone, Debug)]
pub struct Chunk {
    key: ChunkKey,
    colors: Vec<Rgb>,
    shade: Vec<u8>,
    heights: Vec<u8>,
    indestructible: Vec<bool>,
    /// Pixel buffer changed since the renderer last pulled it.
    pub needs_upload: bool,
    /// Heights or sun changed since shadows were last cast.
    pub needs_shadow: bool,
}

impl Chunk {
    /// Blank chunk: black, walkable, lit, destructible.
    pub fn new(key: ChunkKey) -> Self {
        Self {
            key,
            colors: vec![Rgb::BLACK; CHUNK_AREA],
            shade: vec![SHADE_LIT; CHUNK_AREA],
            heights: vec![0; CHUNK_AREA],
            indestructible: vec![false; CHUNK_AREA],
            needs_upload: true,
            needs_shadow: true,
        }
    }

    pub fn key(&self) -> ChunkKey {
        self.key
    }

    #[inline]
    fn index(lx: i32, ly: i32) -> Option<usize> {
        if (0..CHUNK_SIZE).contains(&lx) && (0..CHUNK_SIZE).contains(&ly) {
            Some(local_index(lx as u32, ly as u32))
        } else {
            None
        }
    }

    /// Read a pixel by chunk-local coordinate.
    pub fn get(&self, lx: i32, ly: i32) -> Option<ChunkPixel> {
        let i = Self::index(lx, ly)?;
        Some(ChunkPixel {
            color: self.colors[i],
            height: self.heights[i],
            shade: self.shade[i],
            indestructible: self.indestructible[i],
        })
    }

    /// Overwrite every attribute of a pixel. Returns false when out of bounds.
    pub(crate) fn set(
        &mut self,
        lx: i32,
        ly: i32,
        color: Rgb,
        height: u8,
        shade: u8,
        indestructible: bool,
    ) -> bool {
        let Some(i) = Self::index(lx, ly) else {
            return false;
        };
        self.colors[i] = color;
        self.heights[i] = height;
        self.shade[i] = shade;
        self.indestructible[i] = indestructible;
        self.needs_upload = true;
        true
    }

    /// Generator write: color and height, leaving shade to the shadow pass.
    pub(crate) fn put(&mut self, lx: i32, ly: i32, color: Rgb, height: u8) {
        if let Some(i) = Self::index(lx, ly) {
            self.colors[i] = color;
            self.heights[i] = height;
        }
    }

    pub(crate) fn set_color(&mut self, lx: i32, ly: i32, color: Rgb) -> bool {
        let Some(i) = Self::index(lx, ly) else {
            return false;
        };
        self.colors[i] = color;
        self.needs_upload = true;
        true
    }

    pub(crate) fn set_indestructible(&mut self, lx: i32, ly: i32, value: bool) {
        if let Some(i) = Self::index(lx, ly) {
            self.indestructible[i] = value;
        }
    }

    #[inline]
    pub fn color(&self, lx: i32, ly: i32) -> Option<Rgb> {
        Self::index(lx, ly).map(|i| self.colors[i])
    }

    #[inline]
    pub fn height(&self, lx: i32, ly: i32) -> Option<u8> {
        Self::index(lx, ly).map(|i| self.heights[i])
    }

    #[inline]
    pub fn is_indestructible(&self, lx: i32, ly: i32) -> bool {
        Self::index(lx, ly).is_some_and(|i| self.indestructible[i])
    }

    /// Color with the shade term applied, as the renderer shows it.
    pub fn shaded_color(&self, lx: i32, ly: i32) -> Option<Rgb> {
        Self::index(lx, ly).map(|i| self.colors[i].scaled(self.shade[i]))
    }

    /// Row-major color buffer. Cast with `bytemuck::cast_slice` for upload.
    pub fn colors(&self) -> &[Rgb] {
        &self.colors
    }

    pub fn shades(&self) -> &[u8] {
        &self.shade
    }

    pub fn heights(&self) -> &[u8] {
        &self.heights
    }

    pub fn indestructible_mask(&self) -> &[bool] {
        &self.indestructible
    }

    /// Cast a ray toward the sun from every pixel and mark it dark when any
    /// sampled height, lowered by the sun slope over the distance travelled,
    /// rises above the pixel's own height.
    ///
    /// Samples inside the chunk read this chunk's heights; samples that leave
    /// it go through `world`.
    pub fn recompute_shadows<S: HeightSampler>(&mut self, sun: &Sun, world: &S) {
        let origin = self.key.origin();
        let ray = sun.ray();

        for ly in 0..CHUNK_SIZE {
            for lx in 0..CHUNK_SIZE {
                let i = local_index(lx as u32, ly as u32);
                let base = self.heights[i] as f32;

                let dark = ray.iter().any(|step| {
                    let sx = lx + step.offset.x;
                    let sy = ly + step.offset.y;
                    let h = match Self::index(sx, sy) {
                        Some(j) => self.heights[j],
                        None => world.sample_height(origin.x + sx, origin.y + sy),
                    };
                    h as f32 - step.drop > base
                });

                self.shade[i] = if dark { SHADE_DARK } else { SHADE_LIT };
            }
        }

        self.needs_shadow = false;
        self.needs_upload = true;
    }
}
