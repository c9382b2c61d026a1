//! Sphere animation and effect envelope parameters.

/// Reactive sphere geometry, displacement and motion parameters
#[derive(Debug, Clone)]
pub struct SphereParams {
    /// Icosahedron subdivision (segments per edge minus one)
    /// 64 = ~44k vertices, smooth enough for the fine treble ripples
    pub detail: u32,

    // === Displacement along the surface normal ===
    /// Bass noise spatial frequency (per unit radius)
    pub bass_frequency: f32,

    /// Bass noise temporal rate (per second)
    pub bass_rate: f32,

    /// Bass displacement per unit bass intensity (units of radius)
    pub bass_amplitude: f32,

    /// Treble noise spatial frequency (per unit radius)
    pub treble_frequency: f32,

    /// Treble noise temporal rate (per second)
    pub treble_rate: f32,

    /// Treble displacement per unit treble intensity (units of radius)
    pub treble_amplitude: f32,

    /// Input lattice spatial frequency (radians per unit radius)
    pub lattice_frequency: f32,

    /// Lattice displacement per unit input intensity (units of radius)
    pub lattice_amplitude: f32,

    // === Scale pulse ===
    /// Scale gain per unit of (input + output) intensity
    pub pulse_gain: f32,

    /// Extra scale gain per unit bass intensity ("kick")
    pub bass_kick_gain: f32,

    /// Fraction of the remaining distance to the target scale covered per frame
    /// Must be in (0, 1) for monotonic, non-overshooting approach
    pub scale_smoothing: f32,

    // === Rotation ===
    /// Base rotation rate (radians per second)
    pub rotation_rate: f32,

    /// X-axis tilt gain relative to rotation_rate, per unit bass intensity
    pub bass_tilt_gain: f32,

    // === Fragment shading ===
    /// Weight of the audio-energy glow: colour * (bass + treble) * this
    pub energy_glow: f32,

    /// Weight of the view-angle rim term
    pub rim_strength: f32,
}

impl Default for SphereParams {
    fn default() -> Self {
        Self {
            detail: 64,

            // Slow, large waves for bass
            bass_frequency: 3.0,
            bass_rate: 0.3,
            bass_amplitude: 0.12,

            // Fast, small ripples for treble
            treble_frequency: 18.0,
            treble_rate: 0.9,
            treble_amplitude: 0.06,

            // Subtle geometric grid for the local voice
            lattice_frequency: 30.0,
            lattice_amplitude: 0.04,

            pulse_gain: 0.1,
            bass_kick_gain: 0.25,
            scale_smoothing: 0.2,

            rotation_rate: 0.05,
            bass_tilt_gain: 0.2,

            energy_glow: 2.0,
            rim_strength: 0.5,
        }
    }
}

/// One-shot effect pulse parameters
#[derive(Debug, Clone)]
pub struct EnvelopeParams {
    /// Pulse length (seconds)
    pub duration_s: f32,
}

impl Default for EnvelopeParams {
    fn default() -> Self {
        Self { duration_s: 2.5 }
    }
}
