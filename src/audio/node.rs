//! Audio nodes: live signals with a shared tap of recent samples.
//!
//! The device callback pushes mono samples into the tap; the render thread
//! reads the newest window without ever waiting on the audio thread.

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::Sample;
use glicol::Engine;
use std::collections::VecDeque;
use std::path::Path;
use std::sync::{Arc, Mutex};

use super::synthesis::VOICE_COMPOSITION;
use crate::error::{Error, Result};
use crate::params::audio_constants::{BLOCK_SIZE, MAX_FFT_SIZE, VOICE_SAMPLE_RATE_HZ};

/// Bounded ring of the most recent mono samples (thread-safe)
#[derive(Clone, Debug)]
pub struct SampleTap {
    buffer: Arc<Mutex<VecDeque<f32>>>,
    capacity: usize,
}

impl SampleTap {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            buffer: Arc::new(Mutex::new(VecDeque::with_capacity(capacity))),
            capacity,
        }
    }

    /// Append samples, dropping the oldest beyond capacity
    pub fn push<I: IntoIterator<Item = f32>>(&self, samples: I) {
        if let Ok(mut buf) = self.buffer.lock() {
            for sample in samples {
                if buf.len() == self.capacity {
                    buf.pop_front();
                }
                buf.push_back(sample);
            }
        }
    }

    /// Copy the newest `out.len()` samples into `out`.
    ///
    /// Never blocks: returns false if the audio thread holds the lock or
    /// fewer than `out.len()` samples have arrived.
    pub fn read_latest(&self, out: &mut [f32]) -> bool {
        let Ok(buf) = self.buffer.try_lock() else {
            return false;
        };
        if buf.len() < out.len() {
            return false;
        }
        let start = buf.len() - out.len();
        for (dst, src) in out.iter_mut().zip(buf.range(start..)) {
            *dst = *src;
        }
        true
    }

    pub fn len(&self) -> usize {
        self.buffer.lock().map(|buf| buf.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    #[cfg(test)]
    pub(crate) fn buffer(&self) -> &Mutex<VecDeque<f32>> {
        &self.buffer
    }
}

/// Handle to a live voice signal
pub struct AudioNode {
    label: &'static str,
    sample_rate: u32,
    tap: SampleTap,

    /// Device stream (kept alive for the node's lifetime)
    _stream: Option<cpal::Stream>,
}

impl AudioNode {
    /// Node fed by an external producer through `tap`
    pub fn from_tap(label: &'static str, tap: SampleTap, sample_rate: u32) -> Self {
        Self {
            label,
            sample_rate,
            tap,
            _stream: None,
        }
    }

    /// Node that never produces samples (analysers read it as silence).
    ///
    /// Its tap admits any valid analysis window.
    pub fn silent() -> Self {
        Self::from_tap("silent", SampleTap::new(MAX_FFT_SIZE), VOICE_SAMPLE_RATE_HZ)
    }

    /// Capture the default input device, channels averaged to mono
    pub fn microphone(capacity: usize) -> Result<Self> {
        let host = cpal::default_host();
        let device = host.default_input_device().ok_or(Error::NoInputDevice)?;

        let supported = device.default_input_config()?;
        let sample_format = supported.sample_format();
        let config: cpal::StreamConfig = supported.into();

        log::info!(
            "Input: {} @ {}Hz, {} ch",
            device.name().unwrap_or_else(|_| "Unknown".to_string()),
            config.sample_rate.0,
            config.channels
        );

        let tap = SampleTap::new(capacity);
        let stream = match sample_format {
            cpal::SampleFormat::F32 => build_capture_stream::<f32>(&device, &config, tap.clone())?,
            cpal::SampleFormat::I16 => build_capture_stream::<i16>(&device, &config, tap.clone())?,
            cpal::SampleFormat::U16 => build_capture_stream::<u16>(&device, &config, tap.clone())?,
            other => return Err(Error::UnsupportedSampleFormat(other)),
        };
        stream.play()?;

        Ok(Self {
            label: "microphone",
            sample_rate: config.sample_rate.0,
            tap,
            _stream: Some(stream),
        })
    }

    /// Play a procedurally synthesized voice on the default output device
    pub fn synth_voice(capacity: usize) -> Result<Self> {
        let (device, config) = default_output()?;
        let channels = config.channels as usize;

        // Create Glicol engine
        let mut engine = Engine::<BLOCK_SIZE>::new();
        engine.set_sr(config.sample_rate.0 as usize);
        engine.update_with_code(VOICE_COMPOSITION);
        engine
            .update()
            .map_err(|e| Error::Synthesis(format!("{:?}", e)))?;

        let tap = SampleTap::new(capacity);
        let tap_stream = tap.clone();

        let stream = device.build_output_stream(
            &config,
            move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                let frames_needed = data.len() / channels;
                let mut mono = Vec::with_capacity(frames_needed);
                let mut frame_idx = 0;

                // Generate multiple blocks if needed to fill the entire buffer
                while frame_idx < frames_needed {
                    let (buffers, _) = engine.next_block(vec![]);

                    let samples_to_copy = (frames_needed - frame_idx).min(BLOCK_SIZE);

                    for i in 0..samples_to_copy {
                        // Safety limiter: hard clip to ±0.5
                        let left = buffers[0][i].clamp(-0.5, 0.5);
                        let right = buffers[1][i].clamp(-0.5, 0.5);

                        let start = (frame_idx + i) * channels;
                        write_frame(&mut data[start..start + channels], left, right);
                        mono.push(0.5 * (left + right));
                    }

                    frame_idx += samples_to_copy;
                }

                tap_stream.push(mono);
            },
            |err| log::error!("Voice stream error: {}", err),
            None,
        )?;
        stream.play()?;

        Ok(Self {
            label: "synth voice",
            sample_rate: config.sample_rate.0,
            tap,
            _stream: Some(stream),
        })
    }

    /// Loop a WAV file on the default output device
    pub fn wav_file(path: &Path, capacity: usize) -> Result<Self> {
        let (samples, wav_rate) = read_wav_mono(path)?;
        if samples.is_empty() {
            return Err(Error::EmptyVoice);
        }
        log::info!(
            "Voice file: {} ({:.1}s @ {}Hz)",
            path.display(),
            samples.len() as f32 / wav_rate as f32,
            wav_rate
        );

        let (device, config) = default_output()?;
        let channels = config.channels as usize;

        // Nearest-sample rate conversion is enough for a level meter
        let step = wav_rate as f64 / config.sample_rate.0 as f64;
        let len = samples.len() as f64;
        let mut cursor = 0.0f64;

        let tap = SampleTap::new(capacity);
        let tap_stream = tap.clone();

        let stream = device.build_output_stream(
            &config,
            move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                let mut mono = Vec::with_capacity(data.len() / channels);
                for frame in data.chunks_mut(channels) {
                    let sample = samples[cursor as usize].clamp(-1.0, 1.0);
                    cursor = (cursor + step) % len;
                    write_frame(frame, sample, sample);
                    mono.push(sample);
                }
                tap_stream.push(mono);
            },
            |err| log::error!("Voice stream error: {}", err),
            None,
        )?;
        stream.play()?;

        Ok(Self {
            label: "voice file",
            sample_rate: config.sample_rate.0,
            tap,
            _stream: Some(stream),
        })
    }

    pub fn label(&self) -> &'static str {
        self.label
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn tap(&self) -> &SampleTap {
        &self.tap
    }
}

/// Default output device with an f32 stream config
fn default_output() -> Result<(cpal::Device, cpal::StreamConfig)> {
    let host = cpal::default_host();
    let device = host.default_output_device().ok_or(Error::NoOutputDevice)?;

    let supported = device.default_output_config()?;
    if supported.sample_format() != cpal::SampleFormat::F32 {
        return Err(Error::UnsupportedSampleFormat(supported.sample_format()));
    }
    let config: cpal::StreamConfig = supported.into();

    log::info!(
        "Output: {} @ {}Hz, {} ch",
        device.name().unwrap_or_else(|_| "Unknown".to_string()),
        config.sample_rate.0,
        config.channels
    );

    Ok((device, config))
}

fn build_capture_stream<T>(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    tap: SampleTap,
) -> Result<cpal::Stream>
where
    T: cpal::SizedSample,
    f32: cpal::FromSample<T>,
{
    let channels = (config.channels as usize).max(1);
    let stream = device.build_input_stream(
        config,
        move |data: &[T], _: &cpal::InputCallbackInfo| {
            tap.push(data.chunks(channels).map(|frame| {
                frame.iter().map(|&s| s.to_sample::<f32>()).sum::<f32>() / frame.len() as f32
            }));
        },
        |err| log::error!("Input stream error: {}", err),
        None,
    )?;
    Ok(stream)
}

/// Write a stereo pair into an interleaved frame of any width
fn write_frame(frame: &mut [f32], left: f32, right: f32) {
    match frame {
        [] => {}
        [mono] => *mono = 0.5 * (left + right),
        [l, r, rest @ ..] => {
            *l = left;
            *r = right;
            rest.fill(0.0);
        }
    }
}

/// Decode a WAV file into mono f32 samples and its sample rate
fn read_wav_mono(path: &Path) -> Result<(Vec<f32>, u32)> {
    let mut reader = hound::WavReader::open(path)?;
    let spec = reader.spec();
    let channels = (spec.channels as usize).max(1);

    let interleaved: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Float => reader
            .samples::<f32>()
            .collect::<std::result::Result<_, _>>()?,
        hound::SampleFormat::Int => {
            let scale = 1.0 / (1u64 << (spec.bits_per_sample.clamp(1, 32) - 1)) as f32;
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f32 * scale))
                .collect::<std::result::Result<_, _>>()?
        }
    };

    let mono = interleaved
        .chunks(channels)
        .map(|frame| frame.iter().sum::<f32>() / frame.len() as f32)
        .collect();

    Ok((mono, spec.sample_rate))
}
