//! Pixel color type and the color heuristics used by combustion.

use bytemuck::{Pod, Zeroable};

/// 8-bit RGB triple, laid out so chunk buffers can be cast straight to bytes.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Pod, Zeroable)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb::new(0, 0, 0);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Add a signed offset to every channel, saturating.
    pub fn shifted(self, shift: [i16; 3]) -> Self {
        fn add(c: u8, d: i16) -> u8 {
            (c as i16 + d).clamp(0, 255) as u8
        }
        Self::new(add(self.r, shift[0]), add(self.g, shift[1]), add(self.b, shift[2]))
    }

    /// Brighten (positive) or darken (negative) evenly.
    pub fn offset(self, amount: i16) -> Self {
        self.shifted([amount; 3])
    }

    /// Linear blend toward `other` by `t` in `[0, 1]`.
    pub fn lerp(self, other: Rgb, t: f32) -> Self {
        let t = t.clamp(0.0, 1.0);
        let mix = |a: u8, b: u8| (a as f32 + (b as f32 - a as f32) * t).round() as u8;
        Self::new(mix(self.r, other.r), mix(self.g, other.g), mix(self.b, other.b))
    }

    /// Multiply every channel by `factor / 255`.
    pub fn scaled(self, factor: u8) -> Self {
        let mul = |c: u8| ((c as u16 * factor as u16) / 255) as u8;
        Self::new(mul(self.r), mul(self.g), mul(self.b))
    }
}

/// Foliage test: green clearly dominates red and blue.
pub fn is_foliage(c: Rgb) -> bool {
    let (r, g, b) = (c.r as i16, c.g as i16, c.b as i16);
    g > r + 15 && g > b + 5
}

/// Structure test: muted, roughly neutral tones that are not foliage.
///
/// Walls, roofs and rooftop units all fall in this family across every theme
/// shift, while greenery and the saturated ember tones do not.
pub fn is_structure(c: Rgb) -> bool {
    if is_foliage(c) {
        return false;
    }
    let max = c.r.max(c.g).max(c.b) as i16;
    let min = c.r.min(c.g).min(c.b) as i16;
    max - min <= 60 && max >= 40
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shift_saturates() {
        let c = Rgb::new(250, 5, 100).shifted([10, -10, 0]);
        assert_eq!(c, Rgb::new(255, 0, 100));
    }

    #[test]
    fn heuristics_separate_greens_from_walls() {
        assert!(is_foliage(Rgb::new(40, 110, 45)));
        assert!(!is_structure(Rgb::new(40, 110, 45)));
        assert!(is_structure(Rgb::new(120, 112, 104)));
        assert!(!is_foliage(Rgb::new(120, 112, 104)));
        assert!(!is_structure(Rgb::new(230, 120, 30)));
    }

    #[test]
    fn buffers_cast_to_bytes() {
        let pixels = [Rgb::new(1, 2, 3), Rgb::new(4, 5, 6)];
        let bytes: &[u8] = bytemuck::cast_slice(&pixels);
        assert_eq!(bytes, &[1, 2, 3, 4, 5, 6]);
    }
}
