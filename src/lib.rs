//! Voiceorb library - audio-reactive orb visual for two-party voice sessions

pub mod audio;
pub mod bloom;
pub mod camera;
pub mod cli;
pub mod envelope;
pub mod error;
pub mod noise;
pub mod params;
pub mod particles;
pub mod rendering;
pub mod scene;
pub mod sphere;

pub use error::{Error, Result};
