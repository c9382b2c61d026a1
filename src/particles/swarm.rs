//! Swarm generation and per-frame uniforms.

use bytemuck::{Pod, Zeroable};
use glam::{EulerRot, Mat4, Vec3};
use rand::Rng;

use super::Particle;
use crate::audio::AudioFeatureFrame;
use crate::camera::CameraMatrices;
use crate::params::{Palette, ParticleSystemConfig, SwarmKind};

/// Keeps input/(output + eps) finite when the remote voice is silent
pub const RATIO_EPSILON: f32 = 0.01;

/// Weight of the local voice in the reactive swarm's intensity
pub const INPUT_INTENSITY_WEIGHT: f32 = 0.75;

/// Share of the pulse colour at envelope peak
const EMPATHY_COLOR_MIX: f32 = 0.8;

/// Uniform buffer for the particle shaders
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct ParticleUniforms {
    pub model_view: [[f32; 4]; 4],
    pub projection: [[f32; 4]; 4],
    pub color: [f32; 3],
    pub audio_intensity: f32,
    pub resolution: [f32; 2],
    pub time: f32,
    pub life_rate: f32,
    pub travel_radius: f32,
    pub expansion: f32,
    pub swirl: f32,
    pub noise_scale: f32,
    pub noise_speed: f32,
    pub size_base: f32,
    pub size_gain: f32,
    pub alpha_base: f32,
    pub alpha_gain: f32,
    pub _padding: [f32; 3],
}

#[derive(Debug, Clone, Copy)]
struct SwarmColors {
    input: Vec3,
    output: Vec3,
    empathy: Vec3,
    ambient: Vec3,
}

/// One swarm of particles sharing a motion model
pub struct ParticleSystem {
    config: ParticleSystemConfig,
    colors: SwarmColors,
    particles: Vec<Particle>,
}

impl ParticleSystem {
    /// Scatter `config.count` particles on a sphere of `config.initial_radius`
    pub fn new<R: Rng + ?Sized>(
        config: ParticleSystemConfig,
        palette: &Palette,
        rng: &mut R,
    ) -> Self {
        let (phase_min, phase_max) = config.phase_range;

        let particles = (0..config.count)
            .map(|_| {
                let direction = Vec3::new(
                    rng.gen::<f32>() * 2.0 - 1.0,
                    rng.gen::<f32>() * 2.0 - 1.0,
                    rng.gen::<f32>() * 2.0 - 1.0,
                )
                .normalize_or(Vec3::Y);

                Particle {
                    base_position: (direction * config.initial_radius).to_array(),
                    phase: phase_min + rng.gen::<f32>() * (phase_max - phase_min),
                }
            })
            .collect();

        log::debug!(
            "Generated {:?} swarm with {} particles",
            config.kind,
            config.count
        );

        Self {
            config,
            colors: SwarmColors {
                input: Vec3::from_array(palette.input),
                output: Vec3::from_array(palette.output),
                empathy: Vec3::from_array(palette.empathy_particle),
                ambient: Vec3::from_array(palette.ambient),
            },
            particles,
        }
    }

    pub fn config(&self) -> &ParticleSystemConfig {
        &self.config
    }

    pub fn kind(&self) -> SwarmKind {
        self.config.kind
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    /// Audio intensity driving speed, size and alpha (0 for ambient)
    pub fn intensity(&self, features: &AudioFeatureFrame) -> f32 {
        match self.config.kind {
            SwarmKind::Reactive => {
                features.output_intensity + features.input_intensity * INPUT_INTENSITY_WEIGHT
            }
            SwarmKind::Ambient => 0.0,
        }
    }

    /// Swarm colour for this frame
    pub fn color(&self, features: &AudioFeatureFrame, envelope: f32) -> Vec3 {
        match self.config.kind {
            SwarmKind::Reactive => {
                // Shifts toward the local voice as it overtakes the remote one
                let ratio = (features.input_intensity
                    / (features.output_intensity + RATIO_EPSILON))
                    .clamp(0.0, 1.0);
                self.colors
                    .output
                    .lerp(self.colors.input, ratio)
                    .lerp(self.colors.empathy, envelope * EMPATHY_COLOR_MIX)
            }
            SwarmKind::Ambient => self.colors.ambient,
        }
    }

    /// Whole-swarm model matrix for the sphere's accumulated `rotation`
    pub fn model_matrix(&self, rotation: Vec3) -> Mat4 {
        let r = rotation * self.config.rotation_follow;
        Mat4::from_euler(EulerRot::XYZ, r.x, r.y, r.z)
    }

    /// Build this frame's uniforms
    pub fn uniforms(
        &self,
        features: &AudioFeatureFrame,
        envelope: f32,
        time: f32,
        rotation: Vec3,
        camera: &CameraMatrices,
        resolution: [f32; 2],
    ) -> ParticleUniforms {
        let c = &self.config;
        let model_view = camera.view * self.model_matrix(rotation);

        ParticleUniforms {
            model_view: model_view.to_cols_array_2d(),
            projection: camera.projection.to_cols_array_2d(),
            color: self.color(features, envelope).to_array(),
            audio_intensity: self.intensity(features),
            resolution,
            time,
            life_rate: c.life_rate,
            travel_radius: c.travel_radius,
            expansion: c.expansion,
            swirl: c.swirl_amplitude,
            noise_scale: c.noise_scale,
            noise_speed: c.noise_speed,
            size_base: c.size_base,
            size_gain: c.size_gain,
            alpha_base: c.alpha_base,
            alpha_gain: c.alpha_gain,
            _padding: [0.0; 3],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn reactive() -> ParticleSystem {
        let mut rng = StdRng::seed_from_u64(7);
        ParticleSystem::new(ParticleSystemConfig::reactive(), &Palette::default(), &mut rng)
    }

    fn voices(input: f32, output: f32) -> AudioFeatureFrame {
        AudioFeatureFrame {
            input_intensity: input,
            output_intensity: output,
            ..Default::default()
        }
    }

    #[test]
    fn test_uniform_layout_size() {
        assert_eq!(std::mem::size_of::<Particle>(), 16);
        assert_eq!(std::mem::size_of::<ParticleUniforms>(), 208);
    }

    #[test]
    fn test_generation_respects_config() {
        let swarm = reactive();
        assert_eq!(swarm.len(), 5000);

        for p in swarm.particles() {
            let radius = Vec3::from_array(p.base_position).length();
            assert!((radius - 1.2).abs() < 1e-4);
            assert!((0.5..=1.5).contains(&p.phase));
        }

        let mut rng = StdRng::seed_from_u64(3);
        let ambient =
            ParticleSystem::new(ParticleSystemConfig::ambient(), &Palette::default(), &mut rng);
        assert_eq!(ambient.len(), 1000);
        for p in ambient.particles() {
            assert!((Vec3::from_array(p.base_position).length() - 4.0).abs() < 1e-3);
            assert!((0.2..=0.7).contains(&p.phase));
        }
    }

    #[test]
    fn test_generation_is_deterministic_per_seed() {
        let a = reactive();
        let b = reactive();
        assert_eq!(a.particles(), b.particles());
    }

    #[test]
    fn test_reactive_intensity() {
        let swarm = reactive();
        assert!((swarm.intensity(&voices(0.4, 0.5)) - 0.8).abs() < 1e-6);
    }

    #[test]
    fn test_reactive_color_follows_dominant_voice() {
        let swarm = reactive();
        let palette = Palette::default();
        let output = Vec3::from_array(palette.output);
        let input = Vec3::from_array(palette.input);

        assert!((swarm.color(&voices(0.0, 0.6), 0.0) - output).length() < 1e-6);
        assert!((swarm.color(&voices(0.9, 0.2), 0.0) - input).length() < 1e-6);

        // Both silent: ratio 0 / 0.01 stays on the remote hue
        assert!((swarm.color(&voices(0.0, 0.0), 0.0) - output).length() < 1e-6);
    }

    #[test]
    fn test_pulse_tints_reactive_color() {
        let swarm = reactive();
        let palette = Palette::default();
        let output = Vec3::from_array(palette.output);
        let empathy = Vec3::from_array(palette.empathy_particle);

        let tinted = swarm.color(&voices(0.0, 0.5), 1.0);
        assert!((tinted - output.lerp(empathy, 0.8)).length() < 1e-6);
    }

    #[test]
    fn test_ambient_ignores_audio() {
        let mut rng = StdRng::seed_from_u64(1);
        let ambient =
            ParticleSystem::new(ParticleSystemConfig::ambient(), &Palette::default(), &mut rng);
        let loud = voices(1.0, 1.0);

        assert_eq!(ambient.intensity(&loud), 0.0);
        assert_eq!(
            ambient.color(&loud, 1.0),
            Vec3::from_array(Palette::default().ambient)
        );
    }

    #[test]
    fn test_ambient_rotates_at_half_rate() {
        let mut rng = StdRng::seed_from_u64(1);
        let ambient =
            ParticleSystem::new(ParticleSystemConfig::ambient(), &Palette::default(), &mut rng);
        let rotation = Vec3::new(0.2, 1.0, 0.0);

        let expected = Mat4::from_euler(EulerRot::XYZ, 0.1, 0.5, 0.0);
        assert!(ambient.model_matrix(rotation).abs_diff_eq(expected, 1e-6));
        assert!(reactive()
            .model_matrix(rotation)
            .abs_diff_eq(Mat4::from_euler(EulerRot::XYZ, 0.2, 1.0, 0.0), 1e-6));
    }
}
