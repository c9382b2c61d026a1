//! Offscreen textures for the scene and the bloom chain.

/// HDR format for everything drawn before the composite pass
pub const HDR_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba16Float;

pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// Size-dependent render targets, rebuilt on every resize
pub struct RenderTargets {
    pub scene: wgpu::TextureView,
    pub depth: wgpu::TextureView,
    /// Half-resolution ping-pong pair for the blur
    pub bloom_a: wgpu::TextureView,
    pub bloom_b: wgpu::TextureView,
    pub bloom_size: (u32, u32),
}

impl RenderTargets {
    pub fn new(device: &wgpu::Device, width: u32, height: u32) -> Self {
        let width = width.max(1);
        let height = height.max(1);
        let bloom_size = ((width / 2).max(1), (height / 2).max(1));

        let sampled = wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING;

        Self {
            scene: create_view(device, "Scene Target", (width, height), HDR_FORMAT, sampled),
            depth: create_view(
                device,
                "Depth Target",
                (width, height),
                DEPTH_FORMAT,
                wgpu::TextureUsages::RENDER_ATTACHMENT,
            ),
            bloom_a: create_view(device, "Bloom Target A", bloom_size, HDR_FORMAT, sampled),
            bloom_b: create_view(device, "Bloom Target B", bloom_size, HDR_FORMAT, sampled),
            bloom_size,
        }
    }

    /// Size of one bloom texel in UV units
    pub fn bloom_texel(&self) -> [f32; 2] {
        [1.0 / self.bloom_size.0 as f32, 1.0 / self.bloom_size.1 as f32]
    }
}

fn create_view(
    device: &wgpu::Device,
    label: &str,
    (width, height): (u32, u32),
    format: wgpu::TextureFormat,
    usage: wgpu::TextureUsages,
) -> wgpu::TextureView {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some(label),
        size: wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format,
        usage,
        view_formats: &[],
    });
    texture.create_view(&wgpu::TextureViewDescriptor::default())
}
