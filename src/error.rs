//! Crate-wide error type.
//!
//! Only setup can fail: opening audio devices, decoding voice files and
//! acquiring the GPU. The per-frame pipeline never returns these for
//! numeric reasons; a missing audio source is a skipped frame, not an error.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("no audio input device found")]
    NoInputDevice,

    #[error("no audio output device found")]
    NoOutputDevice,

    #[error("failed to query audio device config: {0}")]
    DeviceConfig(#[from] cpal::DefaultStreamConfigError),

    #[error("failed to build audio stream: {0}")]
    BuildStream(#[from] cpal::BuildStreamError),

    #[error("failed to start audio stream: {0}")]
    PlayStream(#[from] cpal::PlayStreamError),

    #[error("unsupported sample format: {0:?}")]
    UnsupportedSampleFormat(cpal::SampleFormat),

    #[error("voice synthesis init failed: {0}")]
    Synthesis(String),

    #[error("failed to read voice file: {0}")]
    Wav(#[from] hound::Error),

    #[error("voice file contains no samples")]
    EmptyVoice,

    #[error("invalid analyser config: {0}")]
    InvalidAnalyser(String),

    #[error("failed to create surface: {0}")]
    CreateSurface(#[from] wgpu::CreateSurfaceError),

    #[error("failed to find suitable GPU adapter")]
    NoAdapter,

    #[error("surface reports no supported texture format")]
    NoSurfaceFormat,

    #[error("failed to request device: {0}")]
    RequestDevice(#[from] wgpu::RequestDeviceError),

    #[error("surface error: {0}")]
    Surface(#[from] wgpu::SurfaceError),
}

pub type Result<T> = std::result::Result<T, Error>;
