//! Live voice capture, playback and spectrum analysis.
//!
//! An [`AudioNode`] owns a device stream and a tap of recent samples; an
//! [`Analyser`] turns that tap into byte-per-bin spectra once per frame,
//! and [`AudioFeatureFrame`] reduces two spectra to the scalar intensities
//! the visual consumes.

mod analyser;
mod features;
mod node;
mod synthesis;

// Re-export public types
pub use analyser::{blackman_window, magnitude_to_byte, Analyser};
pub use features::{
    bass_band, bass_intensity, overall_intensity, treble_band, treble_intensity,
    AudioFeatureFrame,
};
pub use node::{AudioNode, SampleTap};

/// A source of per-bin magnitude snapshots (0..=255 per bin).
///
/// `update` is called exactly once per frame before `data`, must not block,
/// and the snapshot length never changes over the source's lifetime.
pub trait AudioFeatureSource {
    /// Refresh the snapshot from whatever signal is currently buffered
    fn update(&mut self);

    /// Current snapshot
    fn data(&self) -> &[u8];

    fn bin_count(&self) -> usize {
        self.data().len()
    }
}

/// Source with a fixed snapshot, for hosts that do their own analysis
#[derive(Debug, Clone)]
pub struct StaticSpectrum {
    bins: Vec<u8>,
}

impl StaticSpectrum {
    pub fn new(bins: Vec<u8>) -> Self {
        Self { bins }
    }

    /// Overwrite the snapshot in place (length must match)
    pub fn set(&mut self, bins: &[u8]) {
        let n = self.bins.len().min(bins.len());
        self.bins[..n].copy_from_slice(&bins[..n]);
    }
}

impl AudioFeatureSource for StaticSpectrum {
    fn update(&mut self) {}

    fn data(&self) -> &[u8] {
        &self.bins
    }
}
