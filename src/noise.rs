//! Hash noise for displacement and particle turbulence.
//!
//! The same function is written in `shaders/common.wgsl`; this CPU copy is
//! the reference the animation math is tested against.

use glam::Vec3;

const HASH_DIRECTION: Vec3 = Vec3::new(12.9898, 78.233, 151.7182);
const HASH_GAIN: f32 = 43758.545;

/// GLSL-style fract, in [0, 1) for any finite input (also negatives)
pub fn fract(x: f32) -> f32 {
    let f = x - x.floor();
    // x - floor(x) rounds up to 1.0 for tiny negative x
    if f >= 1.0 {
        0.0
    } else {
        f
    }
}

/// Pseudo-random value in [-1, 1) for a 3D sample point
pub fn hash_noise(p: Vec3) -> f32 {
    fract(p.dot(HASH_DIRECTION).sin() * HASH_GAIN) * 2.0 - 1.0
}

/// Three decorrelated hash samples (offsets 0, 100, 200)
pub fn hash_noise3(p: Vec3) -> Vec3 {
    Vec3::new(
        hash_noise(p),
        hash_noise(p + Vec3::splat(100.0)),
        hash_noise(p + Vec3::splat(200.0)),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fract() {
        assert_eq!(fract(1.25), 0.25);
        assert_eq!(fract(-0.25), 0.75);
        assert_eq!(fract(3.0), 0.0);
        assert_eq!(fract(-1e-12), 0.0);
    }

    #[test]
    fn test_hash_noise_range() {
        for i in 0..1000 {
            let p = Vec3::new(i as f32 * 0.37, i as f32 * -1.3, (i % 17) as f32);
            let n = hash_noise(p);
            assert!((-1.0..1.0).contains(&n), "noise {} out of range at {}", n, i);
        }
    }

    #[test]
    fn test_hash_noise_is_deterministic() {
        let p = Vec3::new(0.3, -2.0, 5.5);
        assert_eq!(hash_noise(p), hash_noise(p));
        assert_eq!(hash_noise3(p), hash_noise3(p));
    }
}
