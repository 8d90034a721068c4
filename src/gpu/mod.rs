//! wgpu renderer.
//!
//! `GpuState` owns the surface and device, one pipeline per [`BlendMode`],
//! and a list of registered batches. Each batch pairs a static mesh vertex
//! buffer with a per-frame instance buffer and a material uniform. Frames
//! draw opaque batches first, then the [`ContactShadow`] ground, then
//! blended batches, into an HDR target that [`PostProcess`] turns into the
//! swapchain image.

mod camera;
mod post_process;
mod shadow;
mod uniforms;

use std::sync::Arc;

use wgpu::util::DeviceExt;
use winit::window::Window;

pub use camera::OrbitCamera;
pub use post_process::{PostParams, PostProcess};
pub use shadow::{BlurParams, ContactShadow, ShadowUniforms};
pub use uniforms::{FrameUniforms, LightRaw};

use crate::error::GpuError;
use crate::instances::{InstanceBatch, InstanceRaw};
use crate::mesh::{Mesh, MeshVertex};
use crate::scene::SceneConfig;
use crate::visuals::{BlendMode, Material};

const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;
const HDR_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba16Float;

/// Source of the instanced scene shader.
pub const SCENE_SHADER: &str = include_str!("scene.wgsl");
/// Source of the bloom and composite shader.
pub const POST_SHADER: &str = include_str!("post.wgsl");
/// Source of the contact shadow shader.
pub const SHADOW_SHADER: &str = include_str!("shadow.wgsl");

/// Handle to a registered batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BatchId(usize);

struct GpuBatch {
    label: &'static str,
    vertex_buffer: wgpu::Buffer,
    vertex_count: u32,
    instance_buffer: wgpu::Buffer,
    instance_count: u32,
    material_bind_group: wgpu::BindGroup,
    blend: BlendMode,
    visible: bool,
}

pub struct GpuState {
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    pub config: wgpu::SurfaceConfiguration,
    frame_buffer: wgpu::Buffer,
    frame_bind_group: wgpu::BindGroup,
    material_layout: wgpu::BindGroupLayout,
    pipelines: [wgpu::RenderPipeline; 3],
    batches: Vec<GpuBatch>,
    shadow: ContactShadow,
    post: PostProcess,
    clear_color: wgpu::Color,
}

impl GpuState {
    pub async fn new(window: Arc<Window>, scene: &SceneConfig) -> Result<Self, GpuError> {
        let size = window.inner_size();
        let (width, height) = (size.width.max(1), size.height.max(1));

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            ..Default::default()
        });

        let surface = instance.create_surface(window)?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .ok_or(GpuError::NoAdapter)?;

        let info = adapter.get_info();
        log::info!("using adapter {} ({:?})", info.name, info.backend);

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("Device"),
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::default(),
                    memory_hints: Default::default(),
                },
                None,
            )
            .await?;

        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .or_else(|| surface_caps.formats.first())
            .copied()
            .ok_or(GpuError::NoSurfaceFormat)?;

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width,
            height,
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode: surface_caps
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);
        log::debug!("surface configured: {width}x{height} {surface_format:?}");

        let frame_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Frame Uniform Buffer"),
            size: std::mem::size_of::<FrameUniforms>() as wgpu::BufferAddress,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let uniform_entry = |visibility| wgpu::BindGroupLayoutEntry {
            binding: 0,
            visibility,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        };

        let frame_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Frame Bind Group Layout"),
            entries: &[uniform_entry(wgpu::ShaderStages::VERTEX_FRAGMENT)],
        });
        let material_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Material Bind Group Layout"),
            entries: &[uniform_entry(wgpu::ShaderStages::FRAGMENT)],
        });

        let frame_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Frame Bind Group"),
            layout: &frame_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: frame_buffer.as_entire_binding(),
            }],
        });

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Scene Shader"),
            source: wgpu::ShaderSource::Wgsl(SCENE_SHADER.into()),
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Scene Pipeline Layout"),
            bind_group_layouts: &[&frame_layout, &material_layout],
            push_constant_ranges: &[],
        });

        let pipelines = BlendMode::ALL.map(|blend| create_scene_pipeline(&device, &pipeline_layout, &shader, blend));

        let shadow = ContactShadow::new(&device, &scene.contact_shadow, &frame_buffer);
        let post = PostProcess::new(&device, width, height, surface_format, scene.bloom, scene.vignette);

        let bg = scene.background.linear();

        Ok(Self {
            surface,
            device,
            queue,
            config,
            frame_buffer,
            frame_bind_group,
            material_layout,
            pipelines,
            batches: Vec::new(),
            shadow,
            post,
            clear_color: wgpu::Color {
                r: bg.x as f64,
                g: bg.y as f64,
                b: bg.z as f64,
                a: 1.0,
            },
        })
    }

    /// Create the GPU side of `batch`, drawn with `mesh` and `material`.
    pub fn add_batch(&mut self, mesh: &Mesh, material: &Material, batch: &InstanceBatch) -> BatchId {
        let label = batch.label();

        let vertex_buffer = self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(label),
            contents: bytemuck::cast_slice(&mesh.vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });

        let instance_buffer = self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(label),
            contents: batch.bytes(),
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
        });

        let material_buffer = self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(label),
            contents: bytemuck::bytes_of(&material.to_raw()),
            usage: wgpu::BufferUsages::UNIFORM,
        });

        let material_bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(label),
            layout: &self.material_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: material_buffer.as_entire_binding(),
            }],
        });

        log::debug!(
            "registered batch {label}: {} instances, {} vertices, {:?}",
            batch.capacity(),
            mesh.vertex_count(),
            material.blend
        );

        self.batches.push(GpuBatch {
            label,
            vertex_buffer,
            vertex_count: mesh.vertex_count(),
            instance_buffer,
            instance_count: batch.capacity(),
            material_bind_group,
            blend: material.blend,
            visible: true,
        });
        BatchId(self.batches.len() - 1)
    }

    /// Copy `batch` to its instance buffer if it changed since the last upload.
    pub fn upload(&self, id: BatchId, batch: &mut InstanceBatch) {
        let gpu = &self.batches[id.0];
        debug_assert_eq!(gpu.label, batch.label());
        if let Some(bytes) = batch.take_dirty() {
            self.queue.write_buffer(&gpu.instance_buffer, 0, bytes);
        }
    }

    pub fn set_visible(&mut self, id: BatchId, visible: bool) {
        self.batches[id.0].visible = visible;
    }

    pub fn write_frame(&self, uniforms: &FrameUniforms) {
        self.queue
            .write_buffer(&self.frame_buffer, 0, bytemuck::bytes_of(uniforms));
    }

    #[inline]
    pub fn aspect(&self) -> f32 {
        self.config.width as f32 / self.config.height as f32
    }

    pub fn resize(&mut self, new_size: winit::dpi::PhysicalSize<u32>) {
        if new_size.width > 0 && new_size.height > 0 {
            self.config.width = new_size.width;
            self.config.height = new_size.height;
            self.surface.configure(&self.device, &self.config);
            self.post
                .resize(&self.device, &self.queue, new_size.width, new_size.height);
        }
    }

    /// Reconfigure the surface at its current size after it was lost.
    pub fn reconfigure(&mut self) {
        self.surface.configure(&self.device, &self.config);
    }

    pub fn render(&mut self) -> Result<(), wgpu::SurfaceError> {
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
            let mut shadow_pass = self.shadow.begin_casters(&mut encoder);
            for batch in self
                .batches
                .iter()
                .filter(|b| b.visible && b.blend.casts_shadow() && b.instance_count > 0)
            {
                shadow_pass.set_vertex_buffer(0, batch.vertex_buffer.slice(..));
                shadow_pass.set_vertex_buffer(1, batch.instance_buffer.slice(..));
                shadow_pass.draw(0..batch.vertex_count, 0..batch.instance_count);
            }
        }
        self.shadow.blur(&mut encoder);

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Scene Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: self.post.hdr_view(),
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(self.clear_color),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: self.post.depth_view(),
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            render_pass.set_bind_group(0, &self.frame_bind_group, &[]);
            for (pipeline, blend) in self.pipelines.iter().zip(BlendMode::ALL) {
                if blend == BlendMode::Alpha {
                    self.shadow.draw_ground(&mut render_pass);
                    render_pass.set_bind_group(0, &self.frame_bind_group, &[]);
                }
                render_pass.set_pipeline(pipeline);
                for batch in self
                    .batches
                    .iter()
                    .filter(|b| b.visible && b.blend == blend && b.instance_count > 0)
                {
                    render_pass.set_bind_group(1, &batch.material_bind_group, &[]);
                    render_pass.set_vertex_buffer(0, batch.vertex_buffer.slice(..));
                    render_pass.set_vertex_buffer(1, batch.instance_buffer.slice(..));
                    render_pass.draw(0..batch.vertex_count, 0..batch.instance_count);
                }
            }
        }

        self.post.run(&mut encoder, &view);

        self.queue.submit(std::iter::once(encoder.finish()));
        output.present();

        Ok(())
    }
}

fn blend_state(blend: BlendMode) -> Option<wgpu::BlendState> {
    match blend {
        BlendMode::Opaque => None,
        BlendMode::Alpha => Some(wgpu::BlendState::ALPHA_BLENDING),
        BlendMode::Additive => Some(wgpu::BlendState {
            color: wgpu::BlendComponent {
                src_factor: wgpu::BlendFactor::SrcAlpha,
                dst_factor: wgpu::BlendFactor::One,
                operation: wgpu::BlendOperation::Add,
            },
            alpha: wgpu::BlendComponent {
                src_factor: wgpu::BlendFactor::One,
                dst_factor: wgpu::BlendFactor::One,
                operation: wgpu::BlendOperation::Add,
            },
        }),
    }
}

const MESH_ATTRIBUTES: [wgpu::VertexAttribute; 2] =
    wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x3];

const INSTANCE_ATTRIBUTES: [wgpu::VertexAttribute; 5] = wgpu::vertex_attr_array![
    2 => Float32x4,
    3 => Float32x4,
    4 => Float32x4,
    5 => Float32x4,
    6 => Float32x4
];

/// Mesh vertices at slot 0, instances at slot 1.
fn vertex_buffers() -> [wgpu::VertexBufferLayout<'static>; 2] {
    [
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<MeshVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &MESH_ATTRIBUTES,
        },
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<InstanceRaw>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &INSTANCE_ATTRIBUTES,
        },
    ]
}

fn create_scene_pipeline(
    device: &wgpu::Device,
    layout: &wgpu::PipelineLayout,
    shader: &wgpu::ShaderModule,
    blend: BlendMode,
) -> wgpu::RenderPipeline {
    let label = format!("Scene Pipeline ({blend:?})");
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(&label),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module: shader,
            entry_point: Some("vs_main"),
            buffers: &vertex_buffers(),
            compilation_options: Default::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module: shader,
            entry_point: Some("fs_main"),
            targets: &[Some(wgpu::ColorTargetState {
                format: HDR_FORMAT,
                blend: blend_state(blend),
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: Default::default(),
        }),
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            strip_index_format: None,
            front_face: wgpu::FrontFace::Ccw,
            cull_mode: None,
            polygon_mode: wgpu::PolygonMode::Fill,
            unclipped_depth: false,
            conservative: false,
        },
        depth_stencil: Some(wgpu::DepthStencilState {
            format: DEPTH_FORMAT,
            depth_write_enabled: blend.writes_depth(),
            depth_compare: wgpu::CompareFunction::Less,
            stencil: wgpu::StencilState::default(),
            bias: wgpu::DepthBiasState::default(),
        }),
        multisample: wgpu::MultisampleState::default(),
        multiview: None,
        cache: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn validate(name: &str, source: &str) -> naga::Module {
        let module = naga::front::wgsl::parse_str(source)
            .unwrap_or_else(|e| panic!("{name} failed to parse: {}", e.emit_to_string(source)));
        naga::valid::Validator::new(
            naga::valid::ValidationFlags::all(),
            naga::valid::Capabilities::all(),
        )
        .validate(&module)
        .unwrap_or_else(|e| panic!("{name} failed to validate: {e:?}"));
        module
    }

    fn struct_size(module: &naga::Module, name: &str) -> u32 {
        module
            .types
            .iter()
            .find(|(_, ty)| ty.name.as_deref() == Some(name))
            .map(|(_, ty)| ty.inner.size(module.to_ctx()))
            .unwrap_or_else(|| panic!("no struct {name}"))
    }

    #[test]
    fn test_scene_shader_validates() {
        let module = validate("scene.wgsl", SCENE_SHADER);
        assert_eq!(struct_size(&module, "Frame") as usize, std::mem::size_of::<FrameUniforms>());
        assert_eq!(struct_size(&module, "Light") as usize, std::mem::size_of::<LightRaw>());
        assert_eq!(
            struct_size(&module, "Material") as usize,
            std::mem::size_of::<crate::visuals::MaterialRaw>()
        );

        // Instance tints (the ribbon wave) scale albedo, never emission.
        let emissive = SCENE_SHADER
            .lines()
            .find(|l| l.contains("let emissive"))
            .unwrap_or_else(|| panic!("no emissive term"));
        assert!(!emissive.contains("tint"));
        let albedo = SCENE_SHADER
            .lines()
            .find(|l| l.contains("let albedo"))
            .unwrap_or_else(|| panic!("no albedo term"));
        assert!(albedo.contains("in.tint"));
    }

    #[test]
    fn test_post_shader_validates() {
        let module = validate("post.wgsl", POST_SHADER);
        assert_eq!(struct_size(&module, "PostParams") as usize, std::mem::size_of::<PostParams>());
        for entry in ["vs_main", "fs_bright", "fs_blur", "fs_composite"] {
            assert!(module.entry_points.iter().any(|e| e.name == entry), "missing {entry}");
        }
    }

    #[test]
    fn test_shadow_shader_validates() {
        let module = validate("shadow.wgsl", SHADOW_SHADER);
        assert_eq!(struct_size(&module, "Shadow") as usize, std::mem::size_of::<ShadowUniforms>());
        assert_eq!(struct_size(&module, "Blur") as usize, std::mem::size_of::<BlurParams>());
        // The ground reads only the leading view-projection of the frame.
        assert_eq!(struct_size(&module, "Camera"), 64);
        for entry in ["vs_caster", "fs_caster", "vs_fullscreen", "fs_blur", "vs_ground", "fs_ground"] {
            assert!(module.entry_points.iter().any(|e| e.name == entry), "missing {entry}");
        }
    }

    #[test]
    fn test_vertex_strides() {
        assert_eq!(std::mem::size_of::<MeshVertex>(), 24);
        assert_eq!(std::mem::size_of::<InstanceRaw>(), 80);
        assert_eq!(MESH_ATTRIBUTES[1].offset, 12);
        assert_eq!(INSTANCE_ATTRIBUTES[4].offset, 64);
    }

    #[test]
    fn test_blend_states() {
        assert!(blend_state(BlendMode::Opaque).is_none());
        let additive = blend_state(BlendMode::Additive).map(|b| b.color.dst_factor);
        assert_eq!(additive, Some(wgpu::BlendFactor::One));
    }
}
