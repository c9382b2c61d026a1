//! Maps audio features and the effect envelope onto the sphere.
//!
//! Displacement and colour are evaluated on the GPU by `shaders/sphere.wgsl`
//! from [`SphereUniforms`]; [`MeshAnimator::displacement`] and
//! [`MeshAnimator::surface_color`] are the CPU forms of the same formulas.

use bytemuck::{Pod, Zeroable};
use glam::{EulerRot, Mat4, Quat, Vec3};

use crate::audio::AudioFeatureFrame;
use crate::camera::CameraMatrices;
use crate::noise::hash_noise;
use crate::params::{Palette, SphereParams};
use crate::scene::SceneAnimationState;

/// Guards the treble/(bass + treble) hue ratio at silence
pub const HUE_EPSILON: f32 = 0.001;

/// Uniform buffer for the sphere shader
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct SphereUniforms {
    pub view_proj: [[f32; 4]; 4],
    pub model: [[f32; 4]; 4],
    pub view: [[f32; 4]; 4],
    pub time: f32,
    pub bass: f32,
    pub treble: f32,
    pub input: f32,
    pub empathy: f32,
    pub bass_frequency: f32,
    pub bass_rate: f32,
    pub bass_amplitude: f32,
    pub treble_frequency: f32,
    pub treble_rate: f32,
    pub treble_amplitude: f32,
    pub lattice_frequency: f32,
    pub lattice_amplitude: f32,
    pub energy_glow: f32,
    pub rim_strength: f32,
    pub _padding: f32,
    pub bass_color: [f32; 4],
    pub treble_color: [f32; 4],
    pub input_color: [f32; 4],
    pub empathy_color: [f32; 4],
}

/// Sphere hues used by the fragment stage
#[derive(Debug, Clone, Copy)]
struct SphereHues {
    bass: Vec3,
    treble: Vec3,
    input: Vec3,
    empathy: Vec3,
}

/// Procedural mesh animator
pub struct MeshAnimator {
    params: SphereParams,
    hues: SphereHues,
}

impl MeshAnimator {
    pub fn new(mut params: SphereParams, palette: &Palette) -> Self {
        params.scale_smoothing = params.scale_smoothing.clamp(0.0, 1.0);
        Self {
            params,
            hues: SphereHues {
                bass: Vec3::from_array(palette.sphere_bass),
                treble: Vec3::from_array(palette.sphere_treble),
                input: Vec3::from_array(palette.sphere_input),
                empathy: Vec3::from_array(palette.sphere_empathy),
            },
        }
    }

    pub fn params(&self) -> &SphereParams {
        &self.params
    }

    /// Scale the sphere pulses toward: 1 + (input + output) * pulse + bass * kick
    pub fn target_scale(&self, features: &AudioFeatureFrame) -> f32 {
        1.0 + (features.input_intensity + features.output_intensity) * self.params.pulse_gain
            + features.bass_intensity * self.params.bass_kick_gain
    }

    /// One step of the per-frame low-pass toward `target`
    pub fn smooth_scale(&self, current: f32, target: f32) -> f32 {
        current + (target - current) * self.params.scale_smoothing
    }

    /// Rotation accumulated over `dt` seconds (Z never turns)
    pub fn rotation_delta(&self, features: &AudioFeatureFrame, dt: f32) -> Vec3 {
        let rate = self.params.rotation_rate;
        Vec3::new(
            dt * rate * features.bass_intensity * self.params.bass_tilt_gain,
            dt * rate * (0.5 + 0.5 * features.input_intensity),
            0.0,
        )
    }

    /// Advance scale and rotation in `state`, then build this frame's uniforms
    pub fn animate(
        &self,
        state: &mut SceneAnimationState,
        features: &AudioFeatureFrame,
        envelope: f32,
        dt: f32,
        now: f32,
        camera: &CameraMatrices,
    ) -> SphereUniforms {
        let target = self.target_scale(features);
        state.sphere_scale = self.smooth_scale(state.sphere_scale, target);
        state.rotation += self.rotation_delta(features, dt);

        let p = &self.params;
        SphereUniforms {
            view_proj: camera.view_proj().to_cols_array_2d(),
            model: model_matrix(state.sphere_scale, state.rotation).to_cols_array_2d(),
            view: camera.view.to_cols_array_2d(),
            time: now,
            bass: features.bass_intensity,
            treble: features.treble_intensity,
            input: features.input_intensity,
            empathy: envelope,
            bass_frequency: p.bass_frequency,
            bass_rate: p.bass_rate,
            bass_amplitude: p.bass_amplitude,
            treble_frequency: p.treble_frequency,
            treble_rate: p.treble_rate,
            treble_amplitude: p.treble_amplitude,
            lattice_frequency: p.lattice_frequency,
            lattice_amplitude: p.lattice_amplitude,
            energy_glow: p.energy_glow,
            rim_strength: p.rim_strength,
            _padding: 0.0,
            bass_color: self.hues.bass.extend(1.0).to_array(),
            treble_color: self.hues.treble.extend(1.0).to_array(),
            input_color: self.hues.input.extend(1.0).to_array(),
            empathy_color: self.hues.empathy.extend(1.0).to_array(),
        }
    }

    /// Offset along the normal at object-space `position` (unit sphere)
    pub fn displacement(&self, position: Vec3, time: f32, features: &AudioFeatureFrame) -> f32 {
        let p = &self.params;

        // Slow, large waves for bass
        let bass = hash_noise(position * p.bass_frequency + Vec3::splat(time * p.bass_rate))
            * p.bass_amplitude
            * features.bass_intensity;

        // Fast, small ripples for treble
        let treble =
            hash_noise(position * p.treble_frequency + Vec3::splat(time * p.treble_rate))
                * p.treble_amplitude
                * features.treble_intensity;

        // Fixed lattice that reacts to the local voice
        let k = p.lattice_frequency;
        let lattice = (position.y * k).sin() * (position.x * k).sin() * (position.z * k).cos();
        let input = lattice * p.lattice_amplitude * features.input_intensity;

        bass + treble + input
    }

    /// Fragment colour for a surface whose view-space normal is `view_normal`
    pub fn surface_color(
        &self,
        view_normal: Vec3,
        features: &AudioFeatureFrame,
        envelope: f32,
    ) -> Vec3 {
        let bass = features.bass_intensity;
        let treble = features.treble_intensity;

        let total = bass + treble + HUE_EPSILON;
        let base = self.hues.bass.lerp(self.hues.treble, treble / total);
        let base = base.lerp(self.hues.input, features.input_intensity * 0.5);
        let blended = base.lerp(self.hues.empathy, envelope);

        let rim = 1.0 - view_normal.normalize_or_zero().dot(Vec3::Z);

        blended * (bass + treble) * self.params.energy_glow
            + blended * rim * self.params.rim_strength
    }
}

/// Scale and XYZ-ordered Euler rotation about the origin
pub fn model_matrix(scale: f32, rotation: Vec3) -> Mat4 {
    Mat4::from_scale_rotation_translation(
        Vec3::splat(scale),
        Quat::from_euler(EulerRot::XYZ, rotation.x, rotation.y, rotation.z),
        Vec3::ZERO,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::CameraSystem;
    use crate::params::RenderConfig;

    fn animator() -> MeshAnimator {
        MeshAnimator::new(SphereParams::default(), &Palette::default())
    }

    fn features(input: f32, output: f32, bass: f32, treble: f32) -> AudioFeatureFrame {
        AudioFeatureFrame {
            input_intensity: input,
            output_intensity: output,
            bass_intensity: bass,
            treble_intensity: treble,
        }
    }

    #[test]
    fn test_target_scale() {
        let animator = animator();
        assert_eq!(animator.target_scale(&AudioFeatureFrame::default()), 1.0);

        let target = animator.target_scale(&features(0.0, 1.0, 1.0, 1.0));
        assert!((target - 1.35).abs() < 1e-6);
    }

    #[test]
    fn test_scale_approaches_target_without_overshoot() {
        let animator = animator();
        let camera = CameraSystem::new(&RenderConfig::default()).matrices();
        let loud = features(0.5, 0.8, 0.6, 0.4);
        let target = animator.target_scale(&loud);

        let mut state = SceneAnimationState::default();
        let mut previous_gap = (target - state.sphere_scale).abs();

        for _ in 0..100 {
            // dt = 0 must still be well defined
            let uniforms = animator.animate(&mut state, &loud, 0.0, 0.0, 0.0, &camera);
            assert!(uniforms.model.iter().flatten().all(|v| v.is_finite()));

            assert!(state.sphere_scale <= target);
            let gap = (target - state.sphere_scale).abs();
            assert!(gap <= previous_gap);
            previous_gap = gap;
        }
        assert!(previous_gap < 1e-4);
    }

    #[test]
    fn test_scale_step_is_a_fifth() {
        let animator = animator();
        assert!((animator.smooth_scale(1.0, 2.0) - 1.2).abs() < 1e-6);
    }

    #[test]
    fn test_rotation_accumulates() {
        let animator = animator();
        let camera = CameraSystem::new(&RenderConfig::default()).matrices();
        let mut state = SceneAnimationState::default();

        let quiet = AudioFeatureFrame::default();
        animator.animate(&mut state, &quiet, 0.0, 1.0, 1.0, &camera);
        assert!((state.rotation.y - 0.025).abs() < 1e-6);
        assert_eq!(state.rotation.x, 0.0);

        let bassy = features(1.0, 0.0, 1.0, 0.0);
        animator.animate(&mut state, &bassy, 0.0, 2.0, 3.0, &camera);
        assert!((state.rotation.y - (0.025 + 0.1)).abs() < 1e-6);
        assert!((state.rotation.x - 0.02).abs() < 1e-6);
        assert_eq!(state.rotation.z, 0.0);
    }

    #[test]
    fn test_silence_does_not_displace() {
        let animator = animator();
        let p = Vec3::new(0.3, 0.9, -0.2).normalize();
        assert_eq!(animator.displacement(p, 12.5, &AudioFeatureFrame::default()), 0.0);
    }

    #[test]
    fn test_displacement_bounded_by_amplitudes() {
        let animator = animator();
        let loud = features(1.0, 1.0, 1.0, 1.0);
        let bound = 0.12 + 0.06 + 0.04;

        for i in 0..200 {
            let t = i as f32 * 0.1;
            let p = Vec3::new(t.sin(), t.cos(), (t * 0.7).sin()).normalize();
            let d = animator.displacement(p, t, &loud);
            assert!(d.abs() <= bound + 1e-6);
        }
    }

    #[test]
    fn test_color_at_silence_facing_camera_is_black() {
        let animator = animator();
        let color = animator.surface_color(Vec3::Z, &AudioFeatureFrame::default(), 0.0);
        assert!(color.length() < 1e-6);
    }

    #[test]
    fn test_rim_brightens_edges() {
        let animator = animator();
        let quiet = AudioFeatureFrame::default();
        let centre = animator.surface_color(Vec3::Z, &quiet, 0.0);
        let edge = animator.surface_color(Vec3::X, &quiet, 0.0);

        assert!(edge.length() > centre.length());
        // Silent hue is pure bass colour, rim weight 0.5
        let expected = Vec3::from_array(Palette::default().sphere_bass) * 0.5;
        assert!((edge - expected).length() < 1e-5);
    }

    #[test]
    fn test_full_envelope_uses_empathy_hue() {
        let animator = animator();
        let edge = animator.surface_color(Vec3::X, &features(0.7, 0.5, 0.3, 0.9), 1.0);
        let rim_only = animator.surface_color(Vec3::X, &features(0.0, 0.0, 0.0, 0.0), 1.0);

        let empathy = Vec3::from_array(Palette::default().sphere_empathy);
        assert!((rim_only - empathy * 0.5).length() < 1e-5);
        // Same hue, brighter with energy
        let ratio = edge / empathy;
        assert!((ratio.x - ratio.y).abs() < 1e-4 && (ratio.y - ratio.z).abs() < 1e-4);
    }

    #[test]
    fn test_treble_ratio_at_silence_is_finite() {
        let animator = animator();
        let color = animator.surface_color(Vec3::Y, &AudioFeatureFrame::default(), 0.0);
        assert!(color.is_finite());
    }
}
