//! Bloom controller: maps bass, treble and the effect pulse to glow strength.

use bytemuck::{Pod, Zeroable};

use crate::audio::AudioFeatureFrame;
use crate::params::BloomParams;

/// Uniform buffer for the bright-pass and composite shaders
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct BloomUniforms {
    pub strength: f32,
    pub radius: f32,
    pub threshold: f32,
    pub _padding: f32,
}

/// Post-processing controller
#[derive(Debug, Clone)]
pub struct PostProcessController {
    params: BloomParams,
}

impl Default for PostProcessController {
    fn default() -> Self {
        Self::new(BloomParams::default())
    }
}

impl PostProcessController {
    pub fn new(params: BloomParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &BloomParams {
        &self.params
    }

    /// base + bass * gain + treble * gain + envelope * gain
    pub fn strength(&self, features: &AudioFeatureFrame, envelope: f32) -> f32 {
        let p = &self.params;
        p.base_strength
            + features.bass_intensity * p.bass_gain
            + features.treble_intensity * p.treble_gain
            + envelope * p.envelope_gain
    }

    pub fn uniforms(&self, features: &AudioFeatureFrame, envelope: f32) -> BloomUniforms {
        BloomUniforms {
            strength: self.strength(features, envelope),
            radius: self.params.radius,
            threshold: self.params.threshold,
            _padding: 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bands(bass: f32, treble: f32) -> AudioFeatureFrame {
        AudioFeatureFrame {
            bass_intensity: bass,
            treble_intensity: treble,
            ..Default::default()
        }
    }

    #[test]
    fn test_silence_is_base_strength() {
        let bloom = PostProcessController::default();
        assert!((bloom.strength(&AudioFeatureFrame::default(), 0.0) - 0.6).abs() < 1e-6);
    }

    #[test]
    fn test_full_scale_strength() {
        let bloom = PostProcessController::default();
        // 0.6 + 1.0 + 1.5 + 1.0
        assert!((bloom.strength(&bands(1.0, 1.0), 1.0) - 4.1).abs() < 1e-5);
        assert!((bloom.strength(&bands(1.0, 1.0), 0.0) - 3.1).abs() < 1e-5);
    }

    #[test]
    fn test_monotonic_in_every_input() {
        let bloom = PostProcessController::default();
        let mut previous = bloom.strength(&bands(0.0, 0.0), 0.0);

        for step in 1..=10 {
            let x = step as f32 / 10.0;
            let s = bloom.strength(&bands(x, 0.0), 0.0);
            assert!(s >= previous);
            previous = s;
        }
        assert!(bloom.strength(&bands(1.0, 0.5), 0.0) > bloom.strength(&bands(1.0, 0.4), 0.0));
        assert!(bloom.strength(&bands(0.3, 0.3), 0.6) > bloom.strength(&bands(0.3, 0.3), 0.5));
    }

    #[test]
    fn test_uniforms_carry_fixed_pass_settings() {
        let uniforms = PostProcessController::default().uniforms(&bands(0.2, 0.1), 0.0);
        assert_eq!(uniforms.radius, 0.5);
        assert_eq!(uniforms.threshold, 0.1);
        assert_eq!(std::mem::size_of::<BloomUniforms>(), 16);
    }
}
