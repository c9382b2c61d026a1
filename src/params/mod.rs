//! Parameter definitions with units and documented semantics.
//!
//! Every tuning constant of the visual lives here with:
//! - Units (seconds, pixels, bins, etc.)
//! - Documented ranges and meanings
//! - A `Default` matching the shipped look

mod audio;
mod particles;
mod render;
mod scene;

// Re-export all types
pub use audio::{audio_constants, AnalyserConfig};
pub use particles::{ParticleSystemConfig, SwarmKind};
pub use render::{hex_color, BloomParams, Palette, RenderConfig};
pub use scene::{EnvelopeParams, SphereParams};
