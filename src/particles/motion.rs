//! Per-particle motion model.
//!
//! Positions are a pure function of (particle, time, intensity); nothing is
//! integrated between frames. `shaders/particles.wgsl` evaluates the same
//! formulas per vertex, these versions exist for tests and CPU-side tooling.

use std::f32::consts::PI;

use glam::Vec3;

use super::Particle;
use crate::noise::{fract, hash_noise3};
use crate::params::ParticleSystemConfig;

/// Point sizes are specified for this view depth (world units)
pub const POINT_SIZE_REFERENCE_DEPTH: f32 = 30.0;

/// Outward speed multiplier per unit audio intensity (reactive swarm)
pub const INTENSITY_SPEEDUP: f32 = 5.0;

/// Normalized age in [0, 1), wrapping every `1 / (life_rate * phase)` seconds
pub fn life(time: f32, life_rate: f32, phase: f32) -> f32 {
    fract(time * life_rate * phase)
}

/// Fade-in/fade-out over one life
pub fn life_alpha(life: f32) -> f32 {
    (life * PI).sin().max(0.0)
}

/// Three-channel noise field sampled at `position`, drifting with time
pub fn noise_field(position: Vec3, time: f32, config: &ParticleSystemConfig) -> Vec3 {
    hash_noise3(position * config.noise_scale + Vec3::splat(time * config.noise_speed))
}

/// Remove the component of `v` along unit `direction`
pub fn tangential(v: Vec3, direction: Vec3) -> Vec3 {
    v - direction * v.dot(direction)
}

/// Reactive swarm: burst outward from the birth sphere, swirling while young
pub fn reactive_position(
    particle: &Particle,
    time: f32,
    intensity: f32,
    config: &ParticleSystemConfig,
) -> Vec3 {
    let base = Vec3::from_array(particle.base_position);
    let direction = base.normalize_or_zero();
    let life = life(time, config.life_rate, particle.phase);

    let speed = 1.0 + intensity * INTENSITY_SPEEDUP;
    let position = base + direction * life * config.travel_radius * speed;

    let swirl = tangential(noise_field(position, time, config), direction);
    position + swirl * (1.0 - life) * config.swirl_amplitude * intensity
}

/// Ambient swarm: slow radial drift plus a gentle wobble, deaf to audio
pub fn ambient_position(particle: &Particle, time: f32, config: &ParticleSystemConfig) -> Vec3 {
    let base = Vec3::from_array(particle.base_position);
    let life = life(time, config.life_rate, particle.phase);

    // Wobble is sampled at the birth position, not the drifted one
    let wobble = noise_field(base, time, config);
    base * (1.0 + life * config.expansion) + wobble * config.swirl_amplitude
}

/// Point diameter in pixels for a particle `view_depth` units in front of the camera
pub fn point_size_px(size: f32, view_depth: f32) -> f32 {
    if view_depth <= 0.0 {
        return 0.0;
    }
    size * POINT_SIZE_REFERENCE_DEPTH / view_depth
}
