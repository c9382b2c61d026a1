//! Spectrum analyser turning a sample tap into byte magnitudes.
//!
//! Follows the Web-Audio analyser pipeline: Blackman window over the newest
//! `fft_size` samples, FFT, per-bin one-pole smoothing over time, then a
//! linear map of [min_decibels, max_decibels] onto 0..=255.

use rustfft::{num_complex::Complex, Fft, FftPlanner};
use std::f32::consts::PI;
use std::sync::Arc;

use super::node::{AudioNode, SampleTap};
use super::AudioFeatureSource;
use crate::error::{Error, Result};
use crate::params::AnalyserConfig;

/// Audio feature source over one [`AudioNode`]
pub struct Analyser {
    config: AnalyserConfig,
    tap: SampleTap,
    fft: Arc<dyn Fft<f32>>,
    window: Vec<f32>,
    samples: Vec<f32>,
    spectrum: Vec<Complex<f32>>,
    smoothed: Vec<f32>,
    data: Vec<u8>,
}

impl Analyser {
    /// Create an analyser reading `node`'s tap
    pub fn new(node: &AudioNode, config: AnalyserConfig) -> Result<Self> {
        Self::from_tap(node.tap().clone(), config)
    }

    pub fn from_tap(tap: SampleTap, config: AnalyserConfig) -> Result<Self> {
        config.validate().map_err(Error::InvalidAnalyser)?;
        if config.fft_size > tap.capacity() {
            return Err(Error::InvalidAnalyser(format!(
                "FFT size {} exceeds the {}-sample tap",
                config.fft_size,
                tap.capacity()
            )));
        }

        let size = config.fft_size;
        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(size);
        let window = (0..size).map(|i| blackman_window(i, size)).collect();
        let bins = config.bin_count();

        Ok(Self {
            config,
            tap,
            fft,
            window,
            samples: vec![0.0; size],
            spectrum: vec![Complex::new(0.0, 0.0); size],
            smoothed: vec![0.0; bins],
            data: vec![0; bins],
        })
    }

    pub fn config(&self) -> &AnalyserConfig {
        &self.config
    }

    /// Run one analysis step over `self.samples`
    fn analyse(&mut self) {
        for ((dst, &sample), &w) in self.spectrum.iter_mut().zip(&self.samples).zip(&self.window) {
            *dst = Complex::new(sample * w, 0.0);
        }
        self.fft.process(&mut self.spectrum);

        let scale = 1.0 / self.config.fft_size as f32;
        let tau = self.config.smoothing_time_constant;

        for (bin, (smoothed, byte)) in self.smoothed.iter_mut().zip(&mut self.data).enumerate() {
            let magnitude = self.spectrum[bin].norm() * scale;
            let next = tau * *smoothed + (1.0 - tau) * magnitude;
            *smoothed = if next.is_finite() { next } else { 0.0 };
            *byte = magnitude_to_byte(
                *smoothed,
                self.config.min_decibels,
                self.config.max_decibels,
            );
        }
    }
}

impl AudioFeatureSource for Analyser {
    fn update(&mut self) {
        // Keep the previous snapshot if the audio thread holds the tap
        if self.tap.read_latest(&mut self.samples) {
            self.analyse();
        }
    }

    fn data(&self) -> &[u8] {
        &self.data
    }
}

/// Blackman window function (a0 = 0.42, a1 = 0.5, a2 = 0.08)
pub fn blackman_window(index: usize, size: usize) -> f32 {
    let x = index as f32 / size as f32;
    0.42 - 0.5 * (2.0 * PI * x).cos() + 0.08 * (4.0 * PI * x).cos()
}

/// Map a linear magnitude onto 0..=255 through the decibel range
pub fn magnitude_to_byte(magnitude: f32, min_db: f32, max_db: f32) -> u8 {
    if magnitude <= 0.0 || !magnitude.is_finite() {
        return 0;
    }
    let db = 20.0 * magnitude.log10();
    let scaled = 255.0 * (db - min_db) / (max_db - min_db);
    scaled.clamp(0.0, 255.0) as u8
}
