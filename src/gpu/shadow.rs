//! Contact shadow.
//!
//! Casters are drawn into a small square map from the ground plane looking
//! up. The map is blurred in two passes and the scene pass lays it on the
//! ground as a translucent square.

use bytemuck::{Pod, Zeroable};
use glam::Vec2;
use wgpu::util::DeviceExt;

use super::post_process::Target;
use super::{vertex_buffers, DEPTH_FORMAT, HDR_FORMAT, SHADOW_SHADER};
use crate::scene::ContactShadowConfig;

const MAP_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;

/// Shadow camera, plane extent and color.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct ShadowUniforms {
    pub view_proj: [[f32; 4]; 4],
    /// Plane center, then half the edge length.
    pub plane: [f32; 4],
    /// Linear color, then opacity.
    pub color: [f32; 4],
}

impl ShadowUniforms {
    pub fn new(config: &ContactShadowConfig) -> Self {
        let center = config.position;
        let color = config.color.linear();
        Self {
            view_proj: config.view_proj().to_cols_array_2d(),
            plane: [center.x, center.y, center.z, config.scale / 2.0],
            color: [color.x, color.y, color.z, config.opacity],
        }
    }
}

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct BlurParams {
    /// UV distance between taps.
    pub stride: [f32; 2],
    _padding: [f32; 2],
}

impl BlurParams {
    /// Taps `spread` texels apart along `direction` on a square map.
    pub fn new(direction: Vec2, spread: f32, resolution: u32) -> Self {
        let stride = direction * spread / resolution.max(1) as f32;
        Self {
            stride: stride.to_array(),
            _padding: [0.0; 2],
        }
    }
}

pub struct ContactShadow {
    map: Target,
    scratch: Target,
    depth: Target,
    caster_bind_group: wgpu::BindGroup,
    /// Horizontal (map to scratch), then vertical (scratch to map).
    blur_bind_groups: [wgpu::BindGroup; 2],
    ground_bind_group: wgpu::BindGroup,
    caster_pipeline: wgpu::RenderPipeline,
    blur_pipeline: wgpu::RenderPipeline,
    ground_pipeline: wgpu::RenderPipeline,
}

impl ContactShadow {
    /// `frame_buffer` is the scene's frame uniform; the ground reads its
    /// view-projection.
    pub fn new(device: &wgpu::Device, config: &ContactShadowConfig, frame_buffer: &wgpu::Buffer) -> Self {
        let size = config.resolution.max(1);
        let sampled = wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING;
        let map = Target::new(device, "Shadow Map", size, size, MAP_FORMAT, sampled);
        let scratch = Target::new(device, "Shadow Blur Texture", size, size, MAP_FORMAT, sampled);
        let depth = Target::new(
            device,
            "Shadow Depth Texture",
            size,
            size,
            DEPTH_FORMAT,
            wgpu::TextureUsages::RENDER_ATTACHMENT,
        );

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Shadow Sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        let uniforms = ShadowUniforms::new(config);
        let shadow_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Shadow Uniform Buffer"),
            contents: bytemuck::bytes_of(&uniforms),
            usage: wgpu::BufferUsages::UNIFORM,
        });
        let blur_buffers = [Vec2::X, Vec2::Y].map(|direction| {
            let params = BlurParams::new(direction, config.blur, size);
            device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Shadow Blur Params"),
                contents: bytemuck::bytes_of(&params),
                usage: wgpu::BufferUsages::UNIFORM,
            })
        });

        let uniform = |binding, visibility| wgpu::BindGroupLayoutEntry {
            binding,
            visibility,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        };
        let texture = |binding| wgpu::BindGroupLayoutEntry {
            binding,
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Texture {
                sample_type: wgpu::TextureSampleType::Float { filterable: true },
                view_dimension: wgpu::TextureViewDimension::D2,
                multisampled: false,
            },
            count: None,
        };
        let filtering = wgpu::BindGroupLayoutEntry {
            binding: 2,
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
            count: None,
        };

        let caster_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Shadow Caster Layout"),
            entries: &[uniform(0, wgpu::ShaderStages::VERTEX)],
        });
        let blur_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Shadow Blur Layout"),
            entries: &[texture(1), filtering, uniform(3, wgpu::ShaderStages::FRAGMENT)],
        });
        let ground_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Shadow Ground Layout"),
            entries: &[
                uniform(0, wgpu::ShaderStages::VERTEX_FRAGMENT),
                filtering,
                uniform(4, wgpu::ShaderStages::VERTEX),
                texture(5),
            ],
        });

        let caster_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Shadow Caster Bind Group"),
            layout: &caster_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: shadow_buffer.as_entire_binding(),
            }],
        });

        let blur_group = |source: &Target, params: &wgpu::Buffer| {
            device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("Shadow Blur Bind Group"),
                layout: &blur_layout,
                entries: &[
                    wgpu::BindGroupEntry {
                        binding: 1,
                        resource: wgpu::BindingResource::TextureView(&source.view),
                    },
                    wgpu::BindGroupEntry {
                        binding: 2,
                        resource: wgpu::BindingResource::Sampler(&sampler),
                    },
                    wgpu::BindGroupEntry {
                        binding: 3,
                        resource: params.as_entire_binding(),
                    },
                ],
            })
        };
        let [horizontal, vertical] = &blur_buffers;
        let blur_bind_groups = [blur_group(&map, horizontal), blur_group(&scratch, vertical)];

        let ground_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Shadow Ground Bind Group"),
            layout: &ground_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: shadow_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::Sampler(&sampler),
                },
                wgpu::BindGroupEntry {
                    binding: 4,
                    resource: frame_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 5,
                    resource: wgpu::BindingResource::TextureView(&map.view),
                },
            ],
        });

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Shadow Shader"),
            source: wgpu::ShaderSource::Wgsl(SHADOW_SHADER.into()),
        });

        let layout = |label, group: &wgpu::BindGroupLayout| {
            device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some(label),
                bind_group_layouts: &[group],
                push_constant_ranges: &[],
            })
        };

        let caster_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Shadow Caster Pipeline"),
            layout: Some(&layout("Shadow Caster Pipeline Layout", &caster_layout)),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_caster"),
                buffers: &vertex_buffers(),
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_caster"),
                targets: &[Some(MAP_FORMAT.into())],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState::default(),
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        let blur_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Shadow Blur Pipeline"),
            layout: Some(&layout("Shadow Blur Pipeline Layout", &blur_layout)),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_fullscreen"),
                buffers: &[],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_blur"),
                targets: &[Some(MAP_FORMAT.into())],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState::default(),
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        let ground_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Shadow Ground Pipeline"),
            layout: Some(&layout("Shadow Ground Pipeline Layout", &ground_layout)),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_ground"),
                buffers: &[],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_ground"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: HDR_FORMAT,
                    blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState::default(),
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: false,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        log::debug!("contact shadow: {size}x{size} map, blur {}", config.blur);

        Self {
            map,
            scratch,
            depth,
            caster_bind_group,
            blur_bind_groups,
            ground_bind_group,
            caster_pipeline,
            blur_pipeline,
            ground_pipeline,
        }
    }

    /// Clear the map and start the caster pass. Callers bind mesh and
    /// instance buffers at slots 0 and 1 and draw.
    pub fn begin_casters<'e>(&self, encoder: &'e mut wgpu::CommandEncoder) -> wgpu::RenderPass<'e> {
        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Shadow Caster Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: &self.map.view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: &self.depth.view,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Discard,
                }),
                stencil_ops: None,
            }),
            timestamp_writes: None,
            occlusion_query_set: None,
        });
        pass.set_pipeline(&self.caster_pipeline);
        pass.set_bind_group(0, &self.caster_bind_group, &[]);
        pass
    }

    /// Blur the map horizontally into scratch, then vertically back.
    pub fn blur(&self, encoder: &mut wgpu::CommandEncoder) {
        let destinations = [&self.scratch.view, &self.map.view];
        for (bind_group, destination) in self.blur_bind_groups.iter().zip(destinations) {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Shadow Blur Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: destination,
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
            pass.set_pipeline(&self.blur_pipeline);
            pass.set_bind_group(0, bind_group, &[]);
            pass.draw(0..3, 0..1);
        }
    }

    /// Draw the ground square. Replaces bind group 0; callers rebind theirs.
    pub fn draw_ground(&self, pass: &mut wgpu::RenderPass<'_>) {
        pass.set_pipeline(&self.ground_pipeline);
        pass.set_bind_group(0, &self.ground_bind_group, &[]);
        pass.draw(0..6, 0..1);
    }
}
