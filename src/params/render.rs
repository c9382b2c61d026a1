//! Rendering, post-processing and colour configuration.

/// Rendering configuration
#[derive(Debug, Clone)]
pub struct RenderConfig {
    /// Window width (pixels)
    pub window_width: u32,

    /// Window height (pixels)
    pub window_height: u32,

    /// Vertical field of view (degrees)
    pub fov_degrees: f32,

    /// Near clipping plane (world units)
    pub near_plane: f32,

    /// Far clipping plane (world units)
    pub far_plane: f32,

    /// Camera distance from the sphere centre along +Z (world units)
    pub camera_distance: f32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            window_width: 1280,
            window_height: 720,
            fov_degrees: 75.0,
            near_plane: 0.1,
            far_plane: 1000.0,
            camera_distance: 4.0,
        }
    }
}

impl RenderConfig {
    pub fn aspect_ratio(&self) -> f32 {
        self.window_width as f32 / self.window_height as f32
    }
}

/// Bloom pass parameters
///
/// Formula: strength = base + bass * bass_gain + treble * treble_gain + envelope * envelope_gain
#[derive(Debug, Clone)]
pub struct BloomParams {
    /// Strength with silent audio and no pulse
    pub base_strength: f32,

    /// Strength per unit bass intensity
    pub bass_gain: f32,

    /// Strength per unit treble intensity
    pub treble_gain: f32,

    /// Strength per unit envelope value
    pub envelope_gain: f32,

    /// Blur spread (0 = tight, 1 = wide)
    pub radius: f32,

    /// Luminance above which pixels contribute to bloom
    pub threshold: f32,
}

impl Default for BloomParams {
    fn default() -> Self {
        Self {
            base_strength: 0.6,
            bass_gain: 1.0,
            treble_gain: 1.5,
            envelope_gain: 1.0, // Gentler than the audio terms
            radius: 0.5,
            threshold: 0.1,
        }
    }
}

/// Scene colours (linear RGB in [0, 1])
#[derive(Debug, Clone)]
pub struct Palette {
    /// Local voice hue for particles (soft teal)
    pub input: [f32; 3],

    /// Remote voice hue for particles (muted purple)
    pub output: [f32; 3],

    /// Pulse hue for particles (creamy mint)
    pub empathy_particle: [f32; 3],

    /// Ambient dust hue (dark purple)
    pub ambient: [f32; 3],

    /// Clear colour behind the backdrop gradient
    pub background: [f32; 3],

    /// Sphere hue at pure bass (deep indigo)
    pub sphere_bass: [f32; 3],

    /// Sphere hue at pure treble (lavender)
    pub sphere_treble: [f32; 3],

    /// Sphere hue mixed in by the local voice (soft teal)
    pub sphere_input: [f32; 3],

    /// Sphere hue at pulse peak (creamy mint)
    pub sphere_empathy: [f32; 3],
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            input: hex_color(0x20c2a8),
            output: hex_color(0xb0a0e0),
            empathy_particle: hex_color(0xe0fff0),
            ambient: hex_color(0x402666),
            background: hex_color(0x100c14),
            sphere_bass: [0.2, 0.1, 0.5],
            sphere_treble: [0.7, 0.6, 1.0],
            sphere_input: [0.125, 0.76, 0.66],
            sphere_empathy: [0.88, 1.0, 0.94],
        }
    }
}

/// Convert a 0xRRGGBB literal into normalized RGB
pub fn hex_color(hex: u32) -> [f32; 3] {
    [
        ((hex >> 16) & 0xff) as f32 / 255.0,
        ((hex >> 8) & 0xff) as f32 / 255.0,
        (hex & 0xff) as f32 / 255.0,
    ]
}
