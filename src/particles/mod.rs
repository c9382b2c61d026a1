//! Particle swarms around the sphere.
//!
//! Each swarm is a fixed set of [`Particle`]s generated once from a seeded
//! RNG. Per frame only a uniform block changes; the GPU recomputes every
//! position from `(base_position, phase, time, intensity)`.

mod motion;
mod swarm;

pub use motion::{
    ambient_position, life, life_alpha, noise_field, point_size_px, reactive_position,
    tangential, INTENSITY_SPEEDUP, POINT_SIZE_REFERENCE_DEPTH,
};
pub use swarm::{ParticleSystem, ParticleUniforms, INPUT_INTENSITY_WEIGHT, RATIO_EPSILON};

use bytemuck::{Pod, Zeroable};

/// Immutable per-particle data, uploaded once as an instance buffer
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct Particle {
    /// Birth position (world units, before swarm rotation)
    pub base_position: [f32; 3],
    /// Life-rate multiplier, fixed per particle
    pub phase: f32,
}
