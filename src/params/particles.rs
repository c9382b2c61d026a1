//! Particle swarm configuration.

/// Which motion model a swarm follows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwarmKind {
    /// Audio-coupled burst leaving the sphere surface
    Reactive,

    /// Slow drifting field around the scene, independent of audio
    Ambient,
}

/// Immutable swarm configuration
#[derive(Debug, Clone)]
pub struct ParticleSystemConfig {
    pub kind: SwarmKind,

    /// Number of particles
    pub count: usize,

    /// Radius of the sphere particles are born on (world units)
    pub initial_radius: f32,

    /// Life cycles per second before the per-particle phase multiplier
    pub life_rate: f32,

    /// Turbulence displacement amplitude (world units)
    pub swirl_amplitude: f32,

    /// Outward travel over one life at zero audio (reactive only, world units)
    pub travel_radius: f32,

    /// Radial growth over one life, as a multiple of the base position (ambient only)
    pub expansion: f32,

    /// Spatial frequency of the turbulence field
    pub noise_scale: f32,

    /// Temporal drift of the turbulence field (per second)
    pub noise_speed: f32,

    /// Per-particle phase multiplier range [min, max)
    pub phase_range: (f32, f32),

    /// Point diameter (pixels at unit depth/30) at zero audio
    pub size_base: f32,

    /// Additional point diameter per unit audio intensity
    pub size_gain: f32,

    /// Alpha multiplier at zero audio
    pub alpha_base: f32,

    /// Additional alpha per unit audio intensity
    pub alpha_gain: f32,

    /// Fraction of the sphere's rotation the whole swarm follows
    pub rotation_follow: f32,
}

impl ParticleSystemConfig {
    /// Swarm bursting off the sphere, driven by both voices
    pub fn reactive() -> Self {
        Self {
            kind: SwarmKind::Reactive,
            count: 5000,
            initial_radius: 1.2, // Just outside the sphere
            life_rate: 0.1,
            swirl_amplitude: 2.0,
            travel_radius: 5.0,
            expansion: 0.0,
            noise_scale: 0.4,
            noise_speed: 0.1,
            phase_range: (0.5, 1.5),
            size_base: 1.5,
            size_gain: 8.0,
            alpha_base: 0.3,
            alpha_gain: 0.7,
            rotation_follow: 1.0,
        }
    }

    /// Dim, slow background dust
    pub fn ambient() -> Self {
        Self {
            kind: SwarmKind::Ambient,
            count: 1000,
            initial_radius: 4.0,
            life_rate: 0.05,
            swirl_amplitude: 0.5,
            travel_radius: 0.0,
            expansion: 3.0,
            noise_scale: 0.1,
            noise_speed: 0.02,
            phase_range: (0.2, 0.7),
            size_base: 2.0,
            size_gain: 0.0,
            alpha_base: 0.2,
            alpha_gain: 0.0,
            rotation_follow: 0.5,
        }
    }
}
