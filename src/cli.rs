//! Command-line argument parsing.

use std::path::PathBuf;

use clap::Parser;

use crate::params::AnalyserConfig;
use crate::scene::SceneConfig;

/// Command line arguments
#[derive(Parser, Debug)]
#[command(name = "voiceorb")]
#[command(about = "Audio-reactive orb for a two-voice conversation", long_about = None)]
pub struct Args {
    /// Remote voice from a WAV file (default: synthesized voice)
    #[arg(long, value_name = "WAV")]
    pub voice: Option<PathBuf>,

    /// Do not open the microphone; the local voice stays silent
    #[arg(long)]
    pub no_mic: bool,

    /// Analyser FFT size (power of two, 32 to 32768)
    #[arg(long, value_name = "N", default_value_t = 32)]
    pub fft_size: usize,

    /// Seed for particle layout and backdrop grain
    #[arg(long, value_name = "N", default_value_t = 42)]
    pub seed: u64,

    /// Sphere subdivision level
    #[arg(long, value_name = "N", default_value_t = 64)]
    pub detail: u32,

    /// Window width (pixels)
    #[arg(long, value_name = "PIXELS", default_value_t = 1280)]
    pub width: u32,

    /// Window height (pixels)
    #[arg(long, value_name = "PIXELS", default_value_t = 720)]
    pub height: u32,

    /// Fire the pulse automatically every N seconds
    #[arg(long, value_name = "SECONDS")]
    pub empathy_every: Option<f32>,
}

impl Args {
    /// Scene configuration with the command-line overrides applied
    pub fn scene_config(&self) -> SceneConfig {
        let mut config = SceneConfig {
            analyser: AnalyserConfig {
                fft_size: self.fft_size,
                ..AnalyserConfig::default()
            },
            seed: self.seed,
            ..SceneConfig::default()
        };
        config.sphere.detail = self.detail;
        config.render.window_width = self.width.max(1);
        config.render.window_height = self.height.max(1);
        config
    }

    /// Automatic pulse interval, if a positive one was given
    pub fn pulse_interval(&self) -> Option<f32> {
        match self.empathy_every {
            Some(seconds) if seconds.is_finite() && seconds > 0.0 => Some(seconds),
            Some(seconds) => {
                log::warn!("Ignoring --empathy-every {}: must be positive", seconds);
                None
            }
            None => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let args = Args::parse_from(["voiceorb"]);
        let config = args.scene_config();

        assert_eq!(config.analyser.fft_size, 32);
        assert_eq!(config.analyser.bin_count(), 16);
        assert_eq!(config.seed, 42);
        assert_eq!(config.sphere.detail, 64);
        assert_eq!(config.render.window_width, 1280);
        assert!(args.voice.is_none());
        assert!(!args.no_mic);
        assert_eq!(args.pulse_interval(), None);
    }

    #[test]
    fn test_overrides() {
        let args = Args::parse_from([
            "voiceorb",
            "--voice",
            "remote.wav",
            "--no-mic",
            "--fft-size",
            "128",
            "--seed",
            "9",
            "--detail",
            "8",
            "--width",
            "640",
            "--height",
            "480",
            "--empathy-every",
            "4.5",
        ]);
        let config = args.scene_config();

        assert_eq!(args.voice, Some(PathBuf::from("remote.wav")));
        assert!(args.no_mic);
        assert_eq!(config.analyser.bin_count(), 64);
        assert_eq!(config.seed, 9);
        assert_eq!(config.sphere.detail, 8);
        assert_eq!(config.render.aspect_ratio(), 640.0 / 480.0);
        assert_eq!(args.pulse_interval(), Some(4.5));
    }

    #[test]
    fn test_non_positive_interval_is_ignored() {
        let args = Args::parse_from(["voiceorb", "--empathy-every", "0"]);
        assert_eq!(args.pulse_interval(), None);
    }
}
