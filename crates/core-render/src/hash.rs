//! Seeded, stateless noise for render-time choices.
//!
//! Every pseudo-random decision the renderer makes is a pure function of
//! `(instance seed, animation step, line index, column)`, so identical inputs
//! always produce identical frames.

const GOLDEN: u64 = 0x9E37_79B9_7F4A_7C15;

/// SplitMix64 finalizer.
#[inline]
pub fn mix(mut z: u64) -> u64 {
    z = z.wrapping_add(GOLDEN);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

#[inline]
pub fn noise(seed: u64, step: u64, line: usize, col: usize) -> u64 {
    let mut h = mix(seed);
    h = mix(h ^ step.wrapping_mul(GOLDEN));
    h = mix(h ^ (line as u64).wrapping_mul(0xBF58_476D_1CE4_E5B9));
    mix(h ^ (col as u64).wrapping_mul(0x94D0_49BB_1331_11EB))
}

/// Map a hash onto `[0, 1)`.
#[inline]
pub fn unit(h: u64) -> f32 {
    (h >> 40) as f32 / (1u64 << 24) as f32
}
