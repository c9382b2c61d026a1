//! Voiceorb - a glowing orb that listens to both sides of a conversation.
//!
//! The sphere breathes with the remote voice, particles burst with both
//! voices, and Space fires a short pulse of shared colour.

use std::sync::Arc;
use std::time::Instant;

use anyhow::Context;
use clap::Parser;
use winit::{
    application::ApplicationHandler,
    event::*,
    event_loop::{ActiveEventLoop, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowId},
};

use voiceorb::audio::AudioNode;
use voiceorb::cli::Args;
use voiceorb::params::audio_constants::TAP_CAPACITY;
use voiceorb::rendering::RenderSystem;
use voiceorb::scene::{FrameOrchestrator, Viewport};
use voiceorb::Error;

/// Main application state
struct App {
    args: Args,

    // Window and rendering
    window: Option<Arc<Window>>,
    render_system: Option<RenderSystem>,

    scene: FrameOrchestrator,

    // Nodes own the device streams; dropping them stops the audio
    input_node: Option<AudioNode>,
    output_node: Option<AudioNode>,

    // Pulse trigger (stand-in for the host's counter)
    empathy_trigger: u64,
    pulse_interval: Option<f32>,
    next_auto_pulse: f32,

    start_time: Instant,
    fatal: Option<anyhow::Error>,
}

impl App {
    fn new(args: Args) -> Self {
        let scene = FrameOrchestrator::new(args.scene_config());
        let pulse_interval = args.pulse_interval();

        Self {
            args,
            window: None,
            render_system: None,
            scene,
            input_node: None,
            output_node: None,
            empathy_trigger: 0,
            pulse_interval,
            next_auto_pulse: pulse_interval.unwrap_or(0.0),
            start_time: Instant::now(),
            fatal: None,
        }
    }

    /// Open the window, GPU and audio; any error here ends the app
    fn initialize(&mut self, event_loop: &ActiveEventLoop) -> anyhow::Result<()> {
        let config = self.args.scene_config();
        let window_attributes = Window::default_attributes()
            .with_title("Voiceorb")
            .with_inner_size(winit::dpi::LogicalSize::new(
                config.render.window_width,
                config.render.window_height,
            ));

        let window = Arc::new(
            event_loop
                .create_window(window_attributes)
                .context("failed to create window")?,
        );

        let render_system = pollster::block_on(RenderSystem::new(Arc::clone(&window), &self.scene))
            .context("failed to initialize rendering")?;

        let input_node = self.open_input();
        let output_node = self.open_output();
        self.scene
            .set_input_node(&input_node)
            .context("failed to analyse input")?;
        self.scene
            .set_output_node(&output_node)
            .context("failed to analyse output")?;

        let size = window.inner_size();
        self.scene
            .attach_viewport(Viewport::new(size.width, size.height));

        log::info!("Voiceorb is running (Space: pulse, Esc: quit)");

        self.window = Some(window);
        self.render_system = Some(render_system);
        self.input_node = Some(input_node);
        self.output_node = Some(output_node);
        Ok(())
    }

    /// Every tap must hold at least one analysis window
    fn tap_capacity(&self) -> usize {
        TAP_CAPACITY.max(self.args.fft_size)
    }

    /// Local voice: microphone unless disabled or unavailable
    fn open_input(&self) -> AudioNode {
        if self.args.no_mic {
            log::info!("Microphone disabled");
            return AudioNode::silent();
        }
        AudioNode::microphone(self.tap_capacity()).unwrap_or_else(|e| {
            log::warn!("Microphone unavailable ({}), input stays silent", e);
            AudioNode::silent()
        })
    }

    /// Remote voice: WAV file if given, otherwise the synthesized voice
    fn open_output(&self) -> AudioNode {
        let node = match &self.args.voice {
            Some(path) => AudioNode::wav_file(path, self.tap_capacity()),
            None => AudioNode::synth_voice(self.tap_capacity()),
        };
        node.unwrap_or_else(|e| {
            log::warn!("Voice output unavailable ({}), output stays silent", e);
            AudioNode::silent()
        })
    }

    fn fire_pulse(&mut self) {
        self.empathy_trigger = self.empathy_trigger.wrapping_add(1);
        self.scene.set_empathy_trigger(self.empathy_trigger);
        log::debug!("Pulse trigger -> {}", self.empathy_trigger);
    }

    /// Render a single frame
    fn render_frame(&mut self, event_loop: &ActiveEventLoop) {
        let time_s = self.start_time.elapsed().as_secs_f32();

        if let Some(interval) = self.pulse_interval {
            if time_s >= self.next_auto_pulse {
                self.fire_pulse();
                self.next_auto_pulse = time_s + interval;
            }
        }

        let Some(render_system) = self.render_system.as_mut() else {
            return;
        };

        match self.scene.frame(time_s, render_system) {
            Ok(_) => {}
            Err(Error::Surface(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated)) => {
                render_system.reconfigure();
            }
            Err(Error::Surface(wgpu::SurfaceError::OutOfMemory)) => {
                log::error!("GPU out of memory");
                event_loop.exit();
            }
            Err(e) => log::warn!("Render error: {}", e),
        }
    }
}

impl ApplicationHandler for App {
    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }

    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return; // Already initialized
        }

        if let Err(e) = self.initialize(event_loop) {
            self.fatal = Some(e);
            event_loop.exit();
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _window_id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => {
                self.scene.detach_viewport();
                event_loop.exit();
            }
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        state: ElementState::Pressed,
                        physical_key: PhysicalKey::Code(code),
                        repeat: false,
                        ..
                    },
                ..
            } => match code {
                KeyCode::Escape => {
                    self.scene.detach_viewport();
                    event_loop.exit();
                }
                KeyCode::Space => self.fire_pulse(),
                _ => {}
            },
            WindowEvent::Resized(size) => {
                if let Some(render_system) = self.render_system.as_mut() {
                    self.scene.resize(size.width, size.height, render_system);
                }
            }
            WindowEvent::RedrawRequested => self.render_frame(event_loop),
            _ => {}
        }
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let mut app = App::new(args);
    let event_loop = EventLoop::new().context("failed to create event loop")?;
    event_loop.run_app(&mut app)?;

    match app.fatal.take() {
        Some(e) => Err(e),
        None => Ok(()),
    }
}
