//! Coordinate hashing.
//!
//! All world generation randomness flows through [`hash`], a pure function of
//! the world seed, a coordinate and a purpose salt. Nothing here keeps state,
//! so a pixel comes out the same no matter which chunk asked first.

use rand::{rngs::StdRng, SeedableRng};

/// Purpose salts. Each consumer of randomness gets its own stream.
pub mod salt {
    pub const PROFILE: u64 = 0x01;
    pub const PARCEL_KIND: u64 = 0x02;
    pub const PARCEL_SIZE: u64 = 0x03;
    pub const PARCEL_SCORE: u64 = 0x04;
    pub const EDGE_SCORE: u64 = 0x05;
    pub const PARK_LAYOUT: u64 = 0x10;
    pub const PARK_EDGE: u64 = 0x11;
    pub const TREES: u64 = 0x12;
    pub const BUILDING_LAYOUT: u64 = 0x20;
    pub const PARKING_LAYOUT: u64 = 0x30;
    pub const DITHER: u64 = 0x40;
    pub const FROST: u64 = 0x41;
    pub const WASH: u64 = 0x42;
    pub const WILD_TREES: u64 = 0x43;
    pub const CHAR: u64 = 0x50;
    pub const BURN: u64 = 0x51;
}

#[inline]
fn mix(mut z: u64) -> u64 {
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

/// Hash a coordinate under a seed and salt.
#[inline]
pub fn hash(seed: u64, x: i32, y: i32, salt: u64) -> u64 {
    let mut h = mix(seed ^ salt.wrapping_mul(0x9E37_79B9_7F4A_7C15));
    h = mix(h ^ x as u32 as u64);
    h = mix(h ^ ((y as u32 as u64) << 32));
    h
}

/// Map a hash to `[0, 1)`.
#[inline]
pub fn unit(h: u64) -> f32 {
    (h >> 40) as f32 / (1u64 << 24) as f32
}

/// Map a hash to the inclusive range `[lo, hi]`.
#[inline]
pub fn range(h: u64, lo: i32, hi: i32) -> i32 {
    if hi <= lo {
        return lo;
    }
    let span = (hi - lo + 1) as u64;
    lo + (h % span) as i32
}

/// Stable 64-bit key for a world coordinate.
#[inline]
pub fn coord_key(x: i32, y: i32) -> u64 {
    ((x as u32 as u64) << 32) | y as u32 as u64
}

/// Local generator for one layout decision, seeded from a coordinate hash.
pub fn rng_for(seed: u64, x: i32, y: i32, salt: u64) -> StdRng {
    StdRng::seed_from_u64(hash(seed, x, y, salt))
}
