//! Rendering system with wgpu pipelines, offscreen targets and the bloom chain.
//!
//! Frame layout: backdrop, sphere and both particle swarms are drawn into an
//! HDR scene target; a bright pass and a separable blur produce the bloom at
//! half resolution; the composite pass adds it back onto the surface.

mod pipelines;
mod targets;

use std::sync::Arc;

use bytemuck::{Pod, Zeroable};
use wgpu::util::DeviceExt;

use crate::bloom::BloomUniforms;
use crate::error::{Error, Result};
use crate::particles::{ParticleSystem, ParticleUniforms};
use crate::scene::{BackdropUniforms, FrameOrchestrator, FrameSink, SceneFrame, Viewport};
use crate::sphere::SphereUniforms;

use targets::{RenderTargets, HDR_FORMAT};

/// Uniform buffer shared by every post pass
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct PostUniforms {
    pub strength: f32,
    pub radius: f32,
    pub threshold: f32,
    pub _padding: f32,
    /// Size of one texel of the pass's source (UV units)
    pub texel: [f32; 2],
    /// Blur axis; zero for the bright and composite passes
    pub direction: [f32; 2],
}

impl PostUniforms {
    fn new(bloom: &BloomUniforms, texel: [f32; 2], direction: [f32; 2]) -> Self {
        Self {
            strength: bloom.strength,
            radius: bloom.radius,
            threshold: bloom.threshold,
            _padding: 0.0,
            texel,
            direction,
        }
    }
}

/// Uniform buffer and its bind group
struct UniformSlot {
    buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
}

impl UniformSlot {
    fn new<T: Pod>(
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
        label: &str,
        initial: &T,
    ) -> Self {
        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(label),
            contents: bytemuck::bytes_of(initial),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(label),
            layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: buffer.as_entire_binding(),
            }],
        });
        Self { buffer, bind_group }
    }

    fn write<T: Pod>(&self, queue: &wgpu::Queue, value: &T) {
        queue.write_buffer(&self.buffer, 0, bytemuck::bytes_of(value));
    }
}

/// One particle swarm on the GPU
struct SwarmDraw {
    pipeline: wgpu::RenderPipeline,
    instances: wgpu::Buffer,
    instance_count: u32,
    uniforms: UniformSlot,
}

impl SwarmDraw {
    fn new(
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
        shader: &wgpu::ShaderModule,
        swarm: &ParticleSystem,
        label: &str,
        vertex_entry: &str,
    ) -> Self {
        let instances = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(label),
            contents: bytemuck::cast_slice(swarm.particles()),
            usage: wgpu::BufferUsages::VERTEX,
        });

        Self {
            pipeline: pipelines::particle_pipeline(device, layout, shader, label, vertex_entry),
            instances,
            instance_count: swarm.len() as u32,
            uniforms: UniformSlot::new(device, layout, label, &ParticleUniforms::zeroed()),
        }
    }

    fn draw(&self, pass: &mut wgpu::RenderPass<'_>) {
        if self.instance_count == 0 {
            return;
        }
        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(0, &self.uniforms.bind_group, &[]);
        pass.set_vertex_buffer(0, self.instances.slice(..));
        // 6 vertices per particle (2 triangles for quad)
        pass.draw(0..6, 0..self.instance_count);
    }
}

/// Bind groups that reference size-dependent targets
struct PostBindGroups {
    bright: wgpu::BindGroup,
    blur_horizontal: wgpu::BindGroup,
    blur_vertical: wgpu::BindGroup,
    composite: wgpu::BindGroup,
}

/// Post pass pipelines and their uniform buffers
struct PostChain {
    layout: wgpu::BindGroupLayout,
    sampler: wgpu::Sampler,
    bright_pipeline: wgpu::RenderPipeline,
    blur_pipeline: wgpu::RenderPipeline,
    composite_pipeline: wgpu::RenderPipeline,
    params_buffer: wgpu::Buffer,
    blur_horizontal_buffer: wgpu::Buffer,
    blur_vertical_buffer: wgpu::Buffer,
    bind_groups: PostBindGroups,
}

impl PostChain {
    fn new(
        device: &wgpu::Device,
        surface_format: wgpu::TextureFormat,
        targets: &RenderTargets,
    ) -> Self {
        let layout = pipelines::post_layout(device);
        let shader =
            pipelines::load_shader(device, "Post Shader", include_str!("../shaders/post.wgsl"));

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Post Sampler"),
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        let uniform_buffer = |label| {
            device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(label),
                contents: bytemuck::bytes_of(&PostUniforms::zeroed()),
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            })
        };
        let params_buffer = uniform_buffer("Bloom Params Buffer");
        let blur_horizontal_buffer = uniform_buffer("Blur Horizontal Buffer");
        let blur_vertical_buffer = uniform_buffer("Blur Vertical Buffer");

        let bright_pipeline = pipelines::post_pipeline(
            device,
            &layout,
            &shader,
            "Bright Pipeline",
            "fs_bright",
            HDR_FORMAT,
        );
        let blur_pipeline = pipelines::post_pipeline(
            device,
            &layout,
            &shader,
            "Blur Pipeline",
            "fs_blur",
            HDR_FORMAT,
        );
        let composite_pipeline = pipelines::post_pipeline(
            device,
            &layout,
            &shader,
            "Composite Pipeline",
            "fs_composite",
            surface_format,
        );

        let bind_groups = PostBindGroups::new(
            device,
            &layout,
            &sampler,
            [&params_buffer, &blur_horizontal_buffer, &blur_vertical_buffer],
            targets,
        );

        Self {
            layout,
            sampler,
            bright_pipeline,
            blur_pipeline,
            composite_pipeline,
            params_buffer,
            blur_horizontal_buffer,
            blur_vertical_buffer,
            bind_groups,
        }
    }

    /// Point every pass at the current targets
    fn rebind(&mut self, device: &wgpu::Device, targets: &RenderTargets) {
        self.bind_groups = PostBindGroups::new(
            device,
            &self.layout,
            &self.sampler,
            [
                &self.params_buffer,
                &self.blur_horizontal_buffer,
                &self.blur_vertical_buffer,
            ],
            targets,
        );
    }

    fn write(&self, queue: &wgpu::Queue, bloom: &BloomUniforms, targets: &RenderTargets) {
        let texel = targets.bloom_texel();
        let params = PostUniforms::new(bloom, texel, [0.0, 0.0]);
        let horizontal = PostUniforms::new(bloom, texel, [1.0, 0.0]);
        let vertical = PostUniforms::new(bloom, texel, [0.0, 1.0]);

        queue.write_buffer(&self.params_buffer, 0, bytemuck::bytes_of(&params));
        queue.write_buffer(&self.blur_horizontal_buffer, 0, bytemuck::bytes_of(&horizontal));
        queue.write_buffer(&self.blur_vertical_buffer, 0, bytemuck::bytes_of(&vertical));
    }
}

impl PostBindGroups {
    /// `buffers`: bloom params, horizontal blur, vertical blur
    fn new(
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
        sampler: &wgpu::Sampler,
        [params, horizontal, vertical]: [&wgpu::Buffer; 3],
        targets: &RenderTargets,
    ) -> Self {
        let bind = |label: &str,
                    source: &wgpu::TextureView,
                    bloom: &wgpu::TextureView,
                    buffer: &wgpu::Buffer| {
            post_bind_group(device, layout, sampler, label, source, bloom, buffer)
        };

        Self {
            bright: bind("Bright Bind Group", &targets.scene, &targets.scene, params),
            blur_horizontal: bind(
                "Blur Horizontal Bind Group",
                &targets.bloom_a,
                &targets.bloom_a,
                horizontal,
            ),
            blur_vertical: bind(
                "Blur Vertical Bind Group",
                &targets.bloom_b,
                &targets.bloom_b,
                vertical,
            ),
            composite: bind("Composite Bind Group", &targets.scene, &targets.bloom_a, params),
        }
    }
}

fn post_bind_group(
    device: &wgpu::Device,
    layout: &wgpu::BindGroupLayout,
    sampler: &wgpu::Sampler,
    label: &str,
    source: &wgpu::TextureView,
    bloom: &wgpu::TextureView,
    buffer: &wgpu::Buffer,
) -> wgpu::BindGroup {
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some(label),
        layout,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::TextureView(source),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::TextureView(bloom),
            },
            wgpu::BindGroupEntry {
                binding: 2,
                resource: wgpu::BindingResource::Sampler(sampler),
            },
            wgpu::BindGroupEntry {
                binding: 3,
                resource: buffer.as_entire_binding(),
            },
        ],
    })
}

/// Rendering system managing wgpu device, pipelines, and buffers
pub struct RenderSystem {
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    targets: RenderTargets,

    backdrop_pipeline: wgpu::RenderPipeline,
    backdrop: UniformSlot,

    sphere_pipeline: wgpu::RenderPipeline,
    sphere: UniformSlot,
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    index_count: u32,

    reactive: SwarmDraw,
    ambient: SwarmDraw,

    post: PostChain,
    clear_color: wgpu::Color,
}

impl RenderSystem {
    /// Create new rendering system for `scene`'s geometry
    pub async fn new(
        window: Arc<winit::window::Window>,
        scene: &FrameOrchestrator,
    ) -> Result<Self> {
        let size = window.inner_size();

        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        // Window must have 'static lifetime via Arc
        let surface = instance.create_surface(window)?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .ok_or(Error::NoAdapter)?;
        log::info!("GPU adapter: {}", adapter.get_info().name);

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("Main Device"),
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::default(),
                    memory_hints: Default::default(),
                },
                None,
            )
            .await?;

        // Colours are authored in display space; avoid a second sRGB encode
        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| !f.is_srgb())
            .or_else(|| surface_caps.formats.first())
            .copied()
            .ok_or(Error::NoSurfaceFormat)?;
        log::info!("Surface format: {:?}", surface_format);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode: surface_caps
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let targets = RenderTargets::new(&device, config.width, config.height);

        let stages = wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT;

        // Backdrop
        let backdrop_layout =
            pipelines::uniform_layout(&device, "Backdrop Bind Group Layout", stages);
        let backdrop_pipeline = pipelines::backdrop_pipeline(&device, &backdrop_layout);
        let backdrop = UniformSlot::new(
            &device,
            &backdrop_layout,
            "Backdrop Uniform Buffer",
            &BackdropUniforms::zeroed(),
        );

        // Sphere
        let sphere_layout = pipelines::uniform_layout(&device, "Sphere Bind Group Layout", stages);
        let sphere_pipeline = pipelines::sphere_pipeline(&device, &sphere_layout);
        let sphere = UniformSlot::new(
            &device,
            &sphere_layout,
            "Sphere Uniform Buffer",
            &SphereUniforms::zeroed(),
        );

        let mesh = scene.mesh();
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Sphere Vertex Buffer"),
            contents: bytemuck::cast_slice(&mesh.vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Sphere Index Buffer"),
            contents: bytemuck::cast_slice(&mesh.indices),
            usage: wgpu::BufferUsages::INDEX,
        });

        // Particles
        let particle_layout =
            pipelines::uniform_layout(&device, "Particle Bind Group Layout", stages);
        let particle_shader = pipelines::load_shader(
            &device,
            "Particle Shader",
            include_str!("../shaders/particles.wgsl"),
        );
        let reactive = SwarmDraw::new(
            &device,
            &particle_layout,
            &particle_shader,
            scene.reactive_particles(),
            "Reactive Particles",
            "vs_reactive",
        );
        let ambient = SwarmDraw::new(
            &device,
            &particle_layout,
            &particle_shader,
            scene.ambient_particles(),
            "Ambient Particles",
            "vs_ambient",
        );

        let post = PostChain::new(&device, surface_format, &targets);

        let [r, g, b] = scene.background();

        Ok(Self {
            surface,
            device,
            queue,
            config,
            targets,
            backdrop_pipeline,
            backdrop,
            sphere_pipeline,
            sphere,
            vertex_buffer,
            index_buffer,
            index_count: mesh.indices.len() as u32,
            reactive,
            ambient,
            post,
            clear_color: wgpu::Color {
                r: r as f64,
                g: g as f64,
                b: b as f64,
                a: 1.0,
            },
        })
    }

    /// Current surface size in pixels
    pub fn size(&self) -> (u32, u32) {
        (self.config.width, self.config.height)
    }

    /// Reconfigure the surface at its current size (after `Lost`/`Outdated`)
    pub fn reconfigure(&self) {
        self.surface.configure(&self.device, &self.config);
    }

    fn write_uniforms(&self, frame: &SceneFrame) {
        self.backdrop.write(&self.queue, &frame.backdrop);
        self.sphere.write(&self.queue, &frame.sphere);
        self.reactive.uniforms.write(&self.queue, &frame.reactive);
        self.ambient.uniforms.write(&self.queue, &frame.ambient);
        self.post.write(&self.queue, &frame.bloom, &self.targets);
    }

    fn post_pass(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        label: &str,
        target: &wgpu::TextureView,
        pipeline: &wgpu::RenderPipeline,
        bind_group: &wgpu::BindGroup,
    ) {
        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some(label),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: target,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
        });
        pass.set_pipeline(pipeline);
        pass.set_bind_group(0, bind_group, &[]);
        // Fullscreen triangle
        pass.draw(0..3, 0..1);
    }

    /// Render a frame
    fn render(&self) -> std::result::Result<(), wgpu::SurfaceError> {
        let output = self.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Scene Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &self.targets.scene,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(self.clear_color),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.targets.depth,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            // Render backdrop first
            render_pass.set_pipeline(&self.backdrop_pipeline);
            render_pass.set_bind_group(0, &self.backdrop.bind_group, &[]);
            render_pass.draw(0..3, 0..1);

            render_pass.set_pipeline(&self.sphere_pipeline);
            render_pass.set_bind_group(0, &self.sphere.bind_group, &[]);
            render_pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
            render_pass.set_index_buffer(self.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
            render_pass.draw_indexed(0..self.index_count, 0, 0..1);

            self.ambient.draw(&mut render_pass);
            self.reactive.draw(&mut render_pass);
        }

        let post = &self.post;
        self.post_pass(
            &mut encoder,
            "Bright Pass",
            &self.targets.bloom_a,
            &post.bright_pipeline,
            &post.bind_groups.bright,
        );
        self.post_pass(
            &mut encoder,
            "Blur Horizontal Pass",
            &self.targets.bloom_b,
            &post.blur_pipeline,
            &post.bind_groups.blur_horizontal,
        );
        self.post_pass(
            &mut encoder,
            "Blur Vertical Pass",
            &self.targets.bloom_a,
            &post.blur_pipeline,
            &post.bind_groups.blur_vertical,
        );
        self.post_pass(
            &mut encoder,
            "Composite Pass",
            &view,
            &post.composite_pipeline,
            &post.bind_groups.composite,
        );

        self.queue.submit(std::iter::once(encoder.finish()));
        output.present();

        Ok(())
    }
}

impl FrameSink for RenderSystem {
    fn submit(&mut self, frame: &SceneFrame) -> Result<()> {
        self.write_uniforms(frame);
        self.render()?;
        Ok(())
    }

    fn resize(&mut self, viewport: Viewport) {
        if viewport.is_empty() {
            return;
        }
        self.config.width = viewport.width;
        self.config.height = viewport.height;
        self.surface.configure(&self.device, &self.config);

        self.targets = RenderTargets::new(&self.device, viewport.width, viewport.height);
        self.post.rebind(&self.device, &self.targets);
    }
}
