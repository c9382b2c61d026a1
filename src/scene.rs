//! Frame orchestration: audio in, per-frame uniforms out.
//!
//! [`FrameOrchestrator::frame`] is called once per display refresh. It pulls
//! both spectra, reduces them to an [`AudioFeatureFrame`], advances the
//! effect envelope and hands the resulting [`SceneFrame`] to a [`FrameSink`]
//! (the GPU renderer in the binary, a recorder in tests).

use bytemuck::{Pod, Zeroable};
use glam::Vec3;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::audio::{Analyser, AudioFeatureFrame, AudioFeatureSource, AudioNode};
use crate::bloom::{BloomUniforms, PostProcessController};
use crate::camera::CameraSystem;
use crate::envelope::EffectEnvelope;
use crate::error::Result;
use crate::params::{
    AnalyserConfig, BloomParams, EnvelopeParams, Palette, ParticleSystemConfig, RenderConfig,
    SphereParams,
};
use crate::particles::{ParticleSystem, ParticleUniforms};
use crate::sphere::{MeshAnimator, SphereMesh, SphereUniforms};

/// Upper bound (exclusive) of the per-frame backdrop grain seed
pub const GRAIN_SEED_RANGE: f32 = 10000.0;

/// Everything needed to build a scene
#[derive(Debug, Clone)]
pub struct SceneConfig {
    pub analyser: AnalyserConfig,
    pub sphere: SphereParams,
    pub envelope: EnvelopeParams,
    pub reactive: ParticleSystemConfig,
    pub ambient: ParticleSystemConfig,
    pub bloom: BloomParams,
    pub render: RenderConfig,
    pub palette: Palette,
    /// Seed for particle layout and backdrop grain
    pub seed: u64,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            analyser: AnalyserConfig::default(),
            sphere: SphereParams::default(),
            envelope: EnvelopeParams::default(),
            reactive: ParticleSystemConfig::reactive(),
            ambient: ParticleSystemConfig::ambient(),
            bloom: BloomParams::default(),
            render: RenderConfig::default(),
            palette: Palette::default(),
            seed: 42,
        }
    }
}

/// State carried from one frame to the next
#[derive(Debug, Clone, PartialEq)]
pub struct SceneAnimationState {
    /// Accumulated Euler rotation (radians); Z stays 0
    pub rotation: Vec3,
    /// Smoothed uniform scale of the sphere
    pub sphere_scale: f32,
    /// Timestamp of the previous rendered frame (seconds)
    pub prev_frame_time: Option<f32>,
}

impl Default for SceneAnimationState {
    fn default() -> Self {
        Self {
            rotation: Vec3::ZERO,
            sphere_scale: 1.0,
            prev_frame_time: None,
        }
    }
}

impl SceneAnimationState {
    /// Record `now` and return the elapsed time since the previous frame.
    ///
    /// The first frame, clocks running backwards and non-finite timestamps all yield 0.
    pub fn advance_clock(&mut self, now: f32) -> f32 {
        if !now.is_finite() {
            return 0.0;
        }
        let dt = match self.prev_frame_time {
            Some(prev) => (now - prev).max(0.0),
            None => 0.0,
        };
        self.prev_frame_time = Some(now);
        dt
    }
}

/// Drawable size in physical pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn resolution(&self) -> [f32; 2] {
        [self.width as f32, self.height as f32]
    }
}

/// Uniform buffer for the backdrop gradient
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct BackdropUniforms {
    pub resolution: [f32; 2],
    pub rand: f32,
    pub _padding: f32,
    pub background: [f32; 4],
}

/// Everything the renderer needs for one frame
#[derive(Debug, Clone, Copy)]
pub struct SceneFrame {
    pub time: f32,
    pub dt: f32,
    pub features: AudioFeatureFrame,
    pub envelope: f32,
    pub sphere: SphereUniforms,
    pub reactive: ParticleUniforms,
    pub ambient: ParticleUniforms,
    pub bloom: BloomUniforms,
    pub backdrop: BackdropUniforms,
}

impl SceneFrame {
    /// True when every value bound for the GPU is finite
    pub fn is_finite(&self) -> bool {
        all_finite(&self.sphere)
            && all_finite(&self.reactive)
            && all_finite(&self.ambient)
            && all_finite(&self.bloom)
            && all_finite(&self.backdrop)
    }
}

/// Uniform blocks here are made only of f32 fields
fn all_finite<T: Pod>(block: &T) -> bool {
    bytemuck::cast_slice::<T, f32>(std::slice::from_ref(block))
        .iter()
        .all(|v| v.is_finite())
}

/// Outcome of one [`FrameOrchestrator::frame`] call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameStatus {
    /// An audio source is not ready yet; nothing was computed
    Skipped,
    /// A frame was submitted to the sink
    Rendered,
}

/// Consumer of finished frames (the rendering substrate)
pub trait FrameSink {
    fn submit(&mut self, frame: &SceneFrame) -> Result<()>;

    /// Reallocate size-dependent targets
    fn resize(&mut self, viewport: Viewport);
}

/// Frame orchestrator
pub struct FrameOrchestrator {
    analyser_config: AnalyserConfig,
    input: Option<Box<dyn AudioFeatureSource>>,
    output: Option<Box<dyn AudioFeatureSource>>,

    empathy_trigger: u64,
    envelope: EffectEnvelope,

    mesh: SphereMesh,
    animator: MeshAnimator,
    reactive: ParticleSystem,
    ambient: ParticleSystem,
    bloom: PostProcessController,
    camera: CameraSystem,
    background: [f32; 3],

    state: SceneAnimationState,
    viewport: Option<Viewport>,
    default_resolution: [f32; 2],
    rng: StdRng,
}

impl FrameOrchestrator {
    pub fn new(config: SceneConfig) -> Self {
        let mut rng = StdRng::seed_from_u64(config.seed);

        let mesh = SphereMesh::new(config.sphere.detail);
        log::info!(
            "Sphere mesh: {} vertices, {} triangles",
            mesh.vertices.len(),
            mesh.triangle_count()
        );

        let reactive = ParticleSystem::new(config.reactive, &config.palette, &mut rng);
        let ambient = ParticleSystem::new(config.ambient, &config.palette, &mut rng);

        Self {
            analyser_config: config.analyser,
            input: None,
            output: None,
            empathy_trigger: 0,
            envelope: EffectEnvelope::new(config.envelope),
            mesh,
            animator: MeshAnimator::new(config.sphere, &config.palette),
            reactive,
            ambient,
            bloom: PostProcessController::new(config.bloom),
            camera: CameraSystem::new(&config.render),
            background: config.palette.background,
            state: SceneAnimationState::default(),
            viewport: None,
            default_resolution: [
                config.render.window_width as f32,
                config.render.window_height as f32,
            ],
            rng,
        }
    }

    /// Analyse the local voice from `node`
    pub fn set_input_node(&mut self, node: &AudioNode) -> Result<()> {
        let analyser = Analyser::new(node, self.analyser_config.clone())?;
        log::info!("Input source: {} ({} bins)", node.label(), analyser.bin_count());
        self.set_input_source(Box::new(analyser));
        Ok(())
    }

    /// Analyse the remote voice from `node`
    pub fn set_output_node(&mut self, node: &AudioNode) -> Result<()> {
        let analyser = Analyser::new(node, self.analyser_config.clone())?;
        log::info!("Output source: {} ({} bins)", node.label(), analyser.bin_count());
        self.set_output_source(Box::new(analyser));
        Ok(())
    }

    pub fn set_input_source(&mut self, source: Box<dyn AudioFeatureSource>) {
        self.input = Some(source);
    }

    pub fn set_output_source(&mut self, source: Box<dyn AudioFeatureSource>) {
        self.output = Some(source);
    }

    /// Record the external trigger; observed at the start of the next rendered frame
    pub fn set_empathy_trigger(&mut self, trigger: u64) {
        self.empathy_trigger = trigger;
    }

    pub fn empathy_trigger(&self) -> u64 {
        self.empathy_trigger
    }

    pub fn is_ready(&self) -> bool {
        self.input.is_some() && self.output.is_some()
    }

    /// Run one frame at `now` seconds and submit it to `sink`
    pub fn frame<S: FrameSink + ?Sized>(&mut self, now: f32, sink: &mut S) -> Result<FrameStatus> {
        let (Some(input), Some(output)) = (self.input.as_mut(), self.output.as_mut()) else {
            log::trace!("Audio sources not ready, skipping frame");
            return Ok(FrameStatus::Skipped);
        };

        input.update();
        output.update();
        let features = AudioFeatureFrame::aggregate(input.data(), output.data()).sanitized();

        let dt = self.state.advance_clock(now);
        let now = self.state.prev_frame_time.unwrap_or(0.0);

        if self.envelope.observe(self.empathy_trigger, now) {
            log::debug!("Pulse {} started at {:.3}s", self.empathy_trigger, now);
        }
        let envelope = self.envelope.advance(now);

        self.camera.look_at(Vec3::ZERO);
        let camera = self.camera.matrices();
        let resolution = self.resolution();

        let sphere = self
            .animator
            .animate(&mut self.state, &features, envelope, dt, now, &camera);
        let rotation = self.state.rotation;

        let frame = SceneFrame {
            time: now,
            dt,
            features,
            envelope,
            sphere,
            reactive: self
                .reactive
                .uniforms(&features, envelope, now, rotation, &camera, resolution),
            ambient: self
                .ambient
                .uniforms(&features, envelope, now, rotation, &camera, resolution),
            bloom: self.bloom.uniforms(&features, envelope),
            backdrop: BackdropUniforms {
                resolution,
                rand: self.rng.gen_range(0.0..GRAIN_SEED_RANGE),
                _padding: 0.0,
                background: [self.background[0], self.background[1], self.background[2], 1.0],
            },
        };

        log::trace!(
            "Frame {:.3}s dt={:.4} bass={:.2} treble={:.2} pulse={:.2}",
            now,
            dt,
            features.bass_intensity,
            features.treble_intensity,
            envelope
        );

        sink.submit(&frame)?;
        Ok(FrameStatus::Rendered)
    }

    /// Subscribe to viewport changes, starting at `viewport`
    pub fn attach_viewport(&mut self, viewport: Viewport) {
        self.viewport = Some(viewport);
        self.camera.set_viewport(viewport.width, viewport.height);
    }

    /// Apply a new window size; ignored when detached or minimized
    pub fn resize<S: FrameSink + ?Sized>(&mut self, width: u32, height: u32, sink: &mut S) {
        let viewport = Viewport::new(width, height);
        if self.viewport.is_none() || viewport.is_empty() {
            return;
        }

        self.viewport = Some(viewport);
        self.camera.set_viewport(width, height);
        sink.resize(viewport);
        log::debug!("Viewport resized to {}x{}", width, height);
    }

    /// Stop reacting to viewport changes
    pub fn detach_viewport(&mut self) {
        self.viewport = None;
    }

    pub fn viewport(&self) -> Option<Viewport> {
        self.viewport
    }

    /// Resolution used for point sizes and the backdrop
    pub fn resolution(&self) -> [f32; 2] {
        self.viewport
            .map(|v| v.resolution())
            .unwrap_or(self.default_resolution)
    }

    pub fn camera(&self) -> &CameraSystem {
        &self.camera
    }

    pub fn state(&self) -> &SceneAnimationState {
        &self.state
    }

    pub fn envelope(&self) -> &EffectEnvelope {
        &self.envelope
    }

    pub fn mesh(&self) -> &SphereMesh {
        &self.mesh
    }

    pub fn reactive_particles(&self) -> &ParticleSystem {
        &self.reactive
    }

    pub fn ambient_particles(&self) -> &ParticleSystem {
        &self.ambient
    }

    pub fn background(&self) -> [f32; 3] {
        self.background
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::StaticSpectrum;

    #[derive(Default)]
    struct CountingSink {
        submitted: usize,
        resized: Vec<Viewport>,
    }

    impl FrameSink for CountingSink {
        fn submit(&mut self, _frame: &SceneFrame) -> Result<()> {
            self.submitted += 1;
            Ok(())
        }

        fn resize(&mut self, viewport: Viewport) {
            self.resized.push(viewport);
        }
    }

    fn small_config() -> SceneConfig {
        let mut config = SceneConfig::default();
        config.sphere.detail = 2;
        config.reactive.count = 64;
        config.ambient.count = 16;
        config
    }

    #[test]
    fn test_clock() {
        let mut state = SceneAnimationState::default();
        assert_eq!(state.advance_clock(5.0), 0.0);
        assert!((state.advance_clock(5.5) - 0.5).abs() < 1e-6);
        // Backwards clock clamps
        assert_eq!(state.advance_clock(4.0), 0.0);
        assert_eq!(state.advance_clock(f32::NAN), 0.0);
        assert_eq!(state.prev_frame_time, Some(4.0));
    }

    #[test]
    fn test_skips_until_both_sources_exist() {
        let mut scene = FrameOrchestrator::new(small_config());
        let mut sink = CountingSink::default();

        assert_eq!(scene.frame(0.0, &mut sink).unwrap(), FrameStatus::Skipped);
        scene.set_input_source(Box::new(StaticSpectrum::new(vec![0; 16])));
        assert_eq!(scene.frame(0.1, &mut sink).unwrap(), FrameStatus::Skipped);
        assert_eq!(sink.submitted, 0);
        assert_eq!(scene.state().prev_frame_time, None);

        scene.set_output_source(Box::new(StaticSpectrum::new(vec![0; 16])));
        assert_eq!(scene.frame(0.2, &mut sink).unwrap(), FrameStatus::Rendered);
        assert_eq!(sink.submitted, 1);
    }

    #[test]
    fn test_resize_lifecycle() {
        let mut scene = FrameOrchestrator::new(small_config());
        let mut sink = CountingSink::default();

        // Not attached yet
        scene.resize(640, 480, &mut sink);
        assert!(sink.resized.is_empty());
        assert_eq!(scene.resolution(), [1280.0, 720.0]);

        scene.attach_viewport(Viewport::new(800, 600));
        scene.resize(1000, 500, &mut sink);
        assert_eq!(sink.resized, vec![Viewport::new(1000, 500)]);
        assert_eq!(scene.camera().aspect_ratio(), 2.0);
        assert_eq!(scene.resolution(), [1000.0, 500.0]);

        // Minimized
        scene.resize(0, 0, &mut sink);
        assert_eq!(sink.resized.len(), 1);

        scene.detach_viewport();
        scene.resize(300, 300, &mut sink);
        assert_eq!(sink.resized.len(), 1);
    }

    #[test]
    fn test_trigger_is_observed_on_next_rendered_frame() {
        let mut scene = FrameOrchestrator::new(small_config());
        let mut sink = CountingSink::default();
        scene.set_empathy_trigger(1);

        // Skipped frames do not consume the trigger
        scene.frame(0.0, &mut sink).unwrap();
        assert_eq!(scene.envelope().trigger_id(), 0);

        scene.set_input_source(Box::new(StaticSpectrum::new(vec![0; 16])));
        scene.set_output_source(Box::new(StaticSpectrum::new(vec![0; 16])));
        scene.frame(2.0, &mut sink).unwrap();
        assert_eq!(scene.envelope().trigger_id(), 1);
        assert!((scene.envelope().progress(3.25) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_grain_seed_range() {
        let mut scene = FrameOrchestrator::new(small_config());
        scene.set_input_source(Box::new(StaticSpectrum::new(vec![10; 16])));
        scene.set_output_source(Box::new(StaticSpectrum::new(vec![200; 16])));

        struct Grain(Vec<f32>);
        impl FrameSink for Grain {
            fn submit(&mut self, frame: &SceneFrame) -> Result<()> {
                self.0.push(frame.backdrop.rand);
                Ok(())
            }
            fn resize(&mut self, _viewport: Viewport) {}
        }

        let mut sink = Grain(Vec::new());
        for i in 0..50 {
            scene.frame(i as f32 / 60.0, &mut sink).unwrap();
        }
        assert!(sink.0.iter().all(|r| (0.0..GRAIN_SEED_RANGE).contains(r)));
        assert!(sink.0.windows(2).any(|w| w[0] != w[1]));
    }
}
