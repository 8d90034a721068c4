//! HDR scene target, bloom and final composite.
//!
//! The scene renders into a floating-point offscreen texture. Bloom runs at
//! half resolution (bright pass, horizontal blur, vertical blur), then a
//! fullscreen composite adds it back, tone maps and vignettes into the
//! swapchain image.

use bytemuck::{Pod, Zeroable};
use wgpu::util::DeviceExt;

use super::{DEPTH_FORMAT, HDR_FORMAT, POST_SHADER};
use crate::scene::{BloomConfig, VignetteConfig};

/// Uniform block of `post.wgsl`.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct PostParams {
    /// Size of one source texel in UV units.
    pub texel: [f32; 2],
    /// Blur axis; zero outside the blur passes.
    pub direction: [f32; 2],
    pub threshold: f32,
    pub intensity: f32,
    pub radius: f32,
    pub vignette_offset: f32,
    pub vignette_darkness: f32,
    pub _padding: [f32; 3],
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Pass {
    Bright,
    BlurHorizontal,
    BlurVertical,
    Composite,
}

impl Pass {
    const ALL: [Pass; 4] = [
        Pass::Bright,
        Pass::BlurHorizontal,
        Pass::BlurVertical,
        Pass::Composite,
    ];

    fn label(self) -> &'static str {
        match self {
            Pass::Bright => "Bloom Bright Pass",
            Pass::BlurHorizontal => "Bloom Blur H",
            Pass::BlurVertical => "Bloom Blur V",
            Pass::Composite => "Composite",
        }
    }

    fn direction(self) -> [f32; 2] {
        match self {
            Pass::BlurHorizontal => [1.0, 0.0],
            Pass::BlurVertical => [0.0, 1.0],
            _ => [0.0, 0.0],
        }
    }
}

/// Bloom sizes are half the surface, never below one texel.
fn half(extent: u32) -> u32 {
    (extent / 2).max(1)
}

/// Build the params for `pass` given the surface size.
fn pass_params(
    pass: Pass,
    width: u32,
    height: u32,
    bloom: &BloomConfig,
    vignette: &VignetteConfig,
) -> PostParams {
    // Bright and composite sample full-size textures, the blurs half-size ones.
    let (w, h) = match pass {
        Pass::BlurHorizontal | Pass::BlurVertical => (half(width), half(height)),
        _ => (width.max(1), height.max(1)),
    };
    PostParams {
        texel: [1.0 / w as f32, 1.0 / h as f32],
        direction: pass.direction(),
        threshold: bloom.threshold,
        intensity: bloom.intensity,
        radius: bloom.radius,
        vignette_offset: vignette.offset,
        vignette_darkness: vignette.darkness,
        _padding: [0.0; 3],
    }
}

/// A render target texture with its default view.
pub(super) struct Target {
    _texture: wgpu::Texture,
    pub(super) view: wgpu::TextureView,
}

impl Target {
    pub(super) fn new(
        device: &wgpu::Device,
        label: &str,
        width: u32,
        height: u32,
        format: wgpu::TextureFormat,
        usage: wgpu::TextureUsages,
    ) -> Self {
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
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        Self {
            _texture: texture,
            view,
        }
    }
}

/// Size-dependent textures, rebuilt on resize.
struct Targets {
    hdr: Target,
    depth: Target,
    bloom_a: Target,
    bloom_b: Target,
}

impl Targets {
    fn new(device: &wgpu::Device, width: u32, height: u32) -> Self {
        let sampled = wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING;
        Self {
            hdr: Target::new(device, "HDR Scene Texture", width, height, HDR_FORMAT, sampled),
            depth: Target::new(
                device,
                "Scene Depth Texture",
                width,
                height,
                DEPTH_FORMAT,
                wgpu::TextureUsages::RENDER_ATTACHMENT,
            ),
            bloom_a: Target::new(device, "Bloom Texture A", half(width), half(height), HDR_FORMAT, sampled),
            bloom_b: Target::new(device, "Bloom Texture B", half(width), half(height), HDR_FORMAT, sampled),
        }
    }

    /// Source and bloom views sampled by `pass`. Only the composite reads
    /// the bloom slot; other passes repeat their source there.
    fn views(&self, pass: Pass) -> (&wgpu::TextureView, &wgpu::TextureView) {
        match pass {
            Pass::Bright => (&self.hdr.view, &self.hdr.view),
            Pass::BlurHorizontal => (&self.bloom_a.view, &self.bloom_a.view),
            Pass::BlurVertical => (&self.bloom_b.view, &self.bloom_b.view),
            Pass::Composite => (&self.hdr.view, &self.bloom_a.view),
        }
    }

    fn destination(&self, pass: Pass) -> Option<&wgpu::TextureView> {
        match pass {
            Pass::Bright | Pass::BlurVertical => Some(&self.bloom_a.view),
            Pass::BlurHorizontal => Some(&self.bloom_b.view),
            Pass::Composite => None,
        }
    }
}

/// GPU resources for the post-processing chain.
pub struct PostProcess {
    targets: Targets,
    sampler: wgpu::Sampler,
    layout: wgpu::BindGroupLayout,
    params: Vec<wgpu::Buffer>,
    bind_groups: Vec<wgpu::BindGroup>,
    bright_pipeline: wgpu::RenderPipeline,
    blur_pipeline: wgpu::RenderPipeline,
    composite_pipeline: wgpu::RenderPipeline,
    bloom: BloomConfig,
    vignette: VignetteConfig,
}

impl PostProcess {
    pub fn new(
        device: &wgpu::Device,
        width: u32,
        height: u32,
        surface_format: wgpu::TextureFormat,
        bloom: BloomConfig,
        vignette: VignetteConfig,
    ) -> Self {
        let targets = Targets::new(device, width, height);

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Post Sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        let texture_entry = |binding| wgpu::BindGroupLayoutEntry {
            binding,
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Texture {
                sample_type: wgpu::TextureSampleType::Float { filterable: true },
                view_dimension: wgpu::TextureViewDimension::D2,
                multisampled: false,
            },
            count: None,
        };
        let layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Post Bind Group Layout"),
            entries: &[
                texture_entry(0),
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                texture_entry(3),
            ],
        });

        let params: Vec<wgpu::Buffer> = Pass::ALL
            .iter()
            .map(|&pass| {
                let data = pass_params(pass, width, height, &bloom, &vignette);
                device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some(pass.label()),
                    contents: bytemuck::bytes_of(&data),
                    usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                })
            })
            .collect();

        let bind_groups = create_bind_groups(device, &layout, &sampler, &params, &targets);

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Post Shader"),
            source: wgpu::ShaderSource::Wgsl(POST_SHADER.into()),
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Post Pipeline Layout"),
            bind_group_layouts: &[&layout],
            push_constant_ranges: &[],
        });

        let pipeline = |label: &str, entry_point: &str, format: wgpu::TextureFormat| {
            device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some(label),
                layout: Some(&pipeline_layout),
                vertex: wgpu::VertexState {
                    module: &shader,
                    entry_point: Some("vs_main"),
                    buffers: &[],
                    compilation_options: Default::default(),
                },
                fragment: Some(wgpu::FragmentState {
                    module: &shader,
                    entry_point: Some(entry_point),
                    targets: &[Some(wgpu::ColorTargetState {
                        format,
                        blend: None,
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                    compilation_options: Default::default(),
                }),
                primitive: wgpu::PrimitiveState {
                    topology: wgpu::PrimitiveTopology::TriangleList,
                    ..Default::default()
                },
                depth_stencil: None,
                multisample: wgpu::MultisampleState::default(),
                multiview: None,
                cache: None,
            })
        };

        let bright_pipeline = pipeline("Bloom Bright Pipeline", "fs_bright", HDR_FORMAT);
        let blur_pipeline = pipeline("Bloom Blur Pipeline", "fs_blur", HDR_FORMAT);
        let composite_pipeline = pipeline("Composite Pipeline", "fs_composite", surface_format);

        Self {
            targets,
            sampler,
            layout,
            params,
            bind_groups,
            bright_pipeline,
            blur_pipeline,
            composite_pipeline,
            bloom,
            vignette,
        }
    }

    /// Where the scene pass draws color.
    pub fn hdr_view(&self) -> &wgpu::TextureView {
        &self.targets.hdr.view
    }

    /// Depth attachment for the scene pass.
    pub fn depth_view(&self) -> &wgpu::TextureView {
        &self.targets.depth.view
    }

    /// Recreate textures, bind groups and texel sizes after a resize.
    pub fn resize(&mut self, device: &wgpu::Device, queue: &wgpu::Queue, width: u32, height: u32) {
        self.targets = Targets::new(device, width, height);
        for (&pass, buffer) in Pass::ALL.iter().zip(&self.params) {
            let data = pass_params(pass, width, height, &self.bloom, &self.vignette);
            queue.write_buffer(buffer, 0, bytemuck::bytes_of(&data));
        }
        self.bind_groups =
            create_bind_groups(device, &self.layout, &self.sampler, &self.params, &self.targets);
    }

    /// Record the bloom passes and the composite into `output`.
    pub fn run(&self, encoder: &mut wgpu::CommandEncoder, output: &wgpu::TextureView) {
        for (i, &pass) in Pass::ALL.iter().enumerate() {
            let pipeline = match pass {
                Pass::Bright => &self.bright_pipeline,
                Pass::BlurHorizontal | Pass::BlurVertical => &self.blur_pipeline,
                Pass::Composite => &self.composite_pipeline,
            };
            let view = self.targets.destination(pass).unwrap_or(output);

            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some(pass.label()),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view,
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
            render_pass.set_pipeline(pipeline);
            render_pass.set_bind_group(0, &self.bind_groups[i], &[]);
            render_pass.draw(0..3, 0..1);
        }
    }
}

fn create_bind_groups(
    device: &wgpu::Device,
    layout: &wgpu::BindGroupLayout,
    sampler: &wgpu::Sampler,
    params: &[wgpu::Buffer],
    targets: &Targets,
) -> Vec<wgpu::BindGroup> {
    Pass::ALL
        .iter()
        .zip(params)
        .map(|(&pass, buffer)| {
            let (source, bloom) = targets.views(pass);
            device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some(pass.label()),
                layout,
                entries: &[
                    wgpu::BindGroupEntry {
                        binding: 0,
                        resource: wgpu::BindingResource::TextureView(source),
                    },
                    wgpu::BindGroupEntry {
                        binding: 1,
                        resource: wgpu::BindingResource::Sampler(sampler),
                    },
                    wgpu::BindGroupEntry {
                        binding: 2,
                        resource: buffer.as_entire_binding(),
                    },
                    wgpu::BindGroupEntry {
                        binding: 3,
                        resource: wgpu::BindingResource::TextureView(bloom),
                    },
                ],
            })
        })
        .collect()
}
