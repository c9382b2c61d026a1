//! Audio analysis configuration and constants.

/// Spectrum analyser configuration (Web-Audio analyser semantics)
#[derive(Debug, Clone)]
pub struct AnalyserConfig {
    /// FFT window size in samples (power of two, 32..=32768)
    /// Bin count of every snapshot is half of this.
    pub fft_size: usize,

    /// Temporal smoothing between consecutive spectra, in [0, 1)
    /// 0 = no smoothing, 0.8 = heavy averaging
    pub smoothing_time_constant: f32,

    /// Magnitude (dB) mapped to byte value 0
    pub min_decibels: f32,

    /// Magnitude (dB) mapped to byte value 255
    pub max_decibels: f32,
}

impl Default for AnalyserConfig {
    fn default() -> Self {
        Self {
            fft_size: 32,
            smoothing_time_constant: 0.8,
            min_decibels: -100.0,
            max_decibels: -30.0,
        }
    }
}

impl AnalyserConfig {
    /// Number of frequency bins per snapshot
    pub fn bin_count(&self) -> usize {
        self.fft_size / 2
    }

    /// Validate configuration (FFT size must be power of 2, etc.)
    pub fn validate(&self) -> Result<(), String> {
        if !self.fft_size.is_power_of_two()
            || !(32..=audio_constants::MAX_FFT_SIZE).contains(&self.fft_size)
        {
            return Err(format!(
                "FFT size must be a power of 2 in [32, {}], got {}",
                audio_constants::MAX_FFT_SIZE,
                self.fft_size
            ));
        }
        if !(0.0..1.0).contains(&self.smoothing_time_constant) {
            return Err(format!(
                "Smoothing time constant must be in [0, 1), got {}",
                self.smoothing_time_constant
            ));
        }
        if self.min_decibels >= self.max_decibels {
            return Err(format!(
                "min_decibels ({}) must be below max_decibels ({})",
                self.min_decibels, self.max_decibels
            ));
        }
        Ok(())
    }
}

/// Audio constants (compile-time, match Glicol engine setup)
pub mod audio_constants {
    /// Audio block size (samples per buffer)
    /// 128 = 2.9ms @ 44.1kHz
    pub const BLOCK_SIZE: usize = 128;

    /// Samples retained per node for analysis (~190ms @ 44.1kHz)
    pub const TAP_CAPACITY: usize = 8192;

    /// Largest analysis window (samples)
    pub const MAX_FFT_SIZE: usize = 32768;

    /// Sample rate of the synthesized voice and the silent fallback (Hz)
    pub const VOICE_SAMPLE_RATE_HZ: u32 = 44100;
}
