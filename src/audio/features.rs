//! Reduction of raw bin snapshots into scalar intensities.
//!
//! Bands are taken from the remote (output) voice only: bass is the lowest
//! quarter of the bins, treble the upper half. The second quarter belongs to
//! neither band; the sphere's colour balance is tuned around that gap.

use std::ops::Range;

/// Scalar audio features for one frame, nominally in [0, 1]
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct AudioFeatureFrame {
    /// Mean level of the local voice
    pub input_intensity: f32,
    /// Mean level of the remote voice
    pub output_intensity: f32,
    /// Remote voice, lowest quarter of bins
    pub bass_intensity: f32,
    /// Remote voice, upper half of bins
    pub treble_intensity: f32,
}

impl AudioFeatureFrame {
    /// Aggregate the local (input) and remote (output) snapshots
    pub fn aggregate(input: &[u8], output: &[u8]) -> Self {
        Self {
            input_intensity: overall_intensity(input),
            output_intensity: overall_intensity(output),
            bass_intensity: bass_intensity(output),
            treble_intensity: treble_intensity(output),
        }
    }

    /// Replace any non-finite field with zero
    pub fn sanitized(self) -> Self {
        let clean = |v: f32| if v.is_finite() { v } else { 0.0 };
        Self {
            input_intensity: clean(self.input_intensity),
            output_intensity: clean(self.output_intensity),
            bass_intensity: clean(self.bass_intensity),
            treble_intensity: clean(self.treble_intensity),
        }
    }
}

/// Bass bins: [0, floor(n/4))
pub fn bass_band(bin_count: usize) -> Range<usize> {
    0..bin_count / 4
}

/// Treble bins: [floor(n/2), n)
pub fn treble_band(bin_count: usize) -> Range<usize> {
    bin_count / 2..bin_count
}

/// mean(snapshot) / 255
pub fn overall_intensity(snapshot: &[u8]) -> f32 {
    mean_level(snapshot)
}

pub fn bass_intensity(snapshot: &[u8]) -> f32 {
    mean_level(&snapshot[bass_band(snapshot.len())])
}

pub fn treble_intensity(snapshot: &[u8]) -> f32 {
    mean_level(&snapshot[treble_band(snapshot.len())])
}

/// Empty ranges (tiny snapshots) read as silence
fn mean_level(bins: &[u8]) -> f32 {
    if bins.is_empty() {
        return 0.0;
    }
    let sum: u32 = bins.iter().map(|&b| b as u32).sum();
    sum as f32 / (bins.len() as f32 * 255.0)
}
