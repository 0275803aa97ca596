//! GPU rendering system for the cube visualization.
//!
//! Draws every cubie body and sticker as an instance of one unit cube mesh,
//! scaled and translated on the CPU each frame.

use iced::widget::shader::wgpu::{self, CommandEncoder, Device, Queue, TextureFormat, TextureView};
use iced::{Rectangle, Size};
use nalgebra::{Matrix4, Vector3, Vector4};
use wgpu::util::DeviceExt;

use crate::RenderMode;
use crate::camera::{Camera, CameraUniform, Projection};
use crate::cube::{CubeLayout, CubeModel, INDICES, VERTICES, Vertex};
use crate::math::Axis;

/// Color of the plastic between stickers.
const BODY_COLOR: [f32; 4] = [0.05, 0.05, 0.05, 1.0];
/// Fraction of the cubie face covered by its sticker.
const STICKER_FRACTION: f32 = 0.88;
/// Sticker thickness, relative to cubie size.
const STICKER_THICKNESS: f32 = 0.02;

/// GPU-compatible instance data for rendering individual cubes.
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub(crate) struct InstanceRaw {
    /// 4x4 model transformation matrix
    model: [[f32; 4]; 4],
    /// RGBA color values
    color: [f32; 4],
}

impl InstanceRaw {
    fn new(center: Vector3<f32>, half_extents: Vector3<f32>, color: [f32; 4]) -> Self {
        let model =
            Matrix4::new_translation(&center) * Matrix4::new_nonuniform_scaling(&half_extents);
        Self {
            model: model.into(),
            color,
        }
    }
}

/// Generates one body instance per cubie and one instance per sticker.
pub(crate) fn generate_instances(cube: &CubeModel, layout: &CubeLayout) -> Vec<InstanceRaw> {
    let half_size = layout.cubie_size * 0.5;
    let mut instances = Vec::with_capacity(cube.slots().len() * 4);

    for slot in cube.slots() {
        let center = layout.slot_center(slot.coords).coords;
        instances.push(InstanceRaw::new(
            center,
            Vector3::repeat(half_size),
            BODY_COLOR,
        ));

        for sticker in &slot.piece.stickers {
            let normal = sticker.facing.to_vector();
            let half_thickness = layout.cubie_size * STICKER_THICKNESS * 0.5;
            let half_extents = Vector3::from_fn(|i, _| {
                if sticker.facing[Axis::ALL[i]] != 0 {
                    half_thickness
                } else {
                    half_size * STICKER_FRACTION
                }
            });
            instances.push(InstanceRaw::new(
                center + normal * (half_size + half_thickness),
                half_extents,
                Vector4::from(sticker.color).into(),
            ));
        }
    }

    instances
}

/// GPU renderer for the cube visualization.
#[derive(Debug)]
pub(crate) struct Renderer {
    /// Graphics pipeline for cube rendering
    render_pipeline: wgpu::RenderPipeline,
    /// Buffer containing cube vertex data
    vertex_buffer: wgpu::Buffer,
    /// Buffer containing cube index data
    index_buffer: wgpu::Buffer,
    /// Number of indices in the index buffer
    num_indices: u32,
    /// Buffer containing per-instance transformation data
    instance_buffer: wgpu::Buffer,
    /// Number of instances the instance buffer holds
    instance_capacity: usize,
    /// Number of instances to render
    num_instances: u32,
    /// CPU-side camera uniform data
    camera_uniform: CameraUniform,
    /// GPU buffer containing camera matrices
    camera_buffer: wgpu::Buffer,
    /// Bind group for camera uniform buffer
    camera_bind_group: wgpu::BindGroup,
    /// Depth texture for z-buffering
    depth_texture: wgpu::Texture,
    /// Depth texture view for rendering
    depth_view: wgpu::TextureView,
    /// Pipeline filling the viewport with the background color
    clear_pipeline: wgpu::RenderPipeline,
}

fn create_depth_texture(device: &Device, size: Size<u32>) -> (wgpu::Texture, wgpu::TextureView) {
    let depth_texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("Depth Texture"),
        size: wgpu::Extent3d {
            width: size.width.max(1),
            height: size.height.max(1),
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: wgpu::TextureFormat::Depth32Float,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    let depth_view = depth_texture.create_view(&wgpu::TextureViewDescriptor::default());
    (depth_texture, depth_view)
}

fn color_target(format: TextureFormat) -> [Option<wgpu::ColorTargetState>; 1] {
    [Some(wgpu::ColorTargetState {
        format,
        blend: Some(wgpu::BlendState::REPLACE),
        write_mask: wgpu::ColorWrites::ALL,
    })]
}

fn triangles(cull_mode: Option<wgpu::Face>) -> wgpu::PrimitiveState {
    wgpu::PrimitiveState {
        topology: wgpu::PrimitiveTopology::TriangleList,
        front_face: wgpu::FrontFace::Ccw,
        cull_mode,
        ..Default::default()
    }
}

/// Color attachment that draws over what iced already rendered.
fn load_target(target: &TextureView) -> [Option<wgpu::RenderPassColorAttachment<'_>>; 1] {
    [Some(wgpu::RenderPassColorAttachment {
        view: target,
        resolve_target: None,
        ops: wgpu::Operations {
            load: wgpu::LoadOp::Load,
            store: wgpu::StoreOp::Store,
        },
    })]
}

impl Renderer {
    /// Creates a new renderer with initialized GPU resources.
    ///
    /// # Arguments
    /// * `format` - Format of the target the viewport is drawn into
    /// * `viewport_size` - Physical size of the whole target
    /// * `instances` - Initial instance data; sets the instance buffer size
    pub(crate) async fn new(
        device: &Device,
        format: TextureFormat,
        viewport_size: Size<u32>,
        instances: &[InstanceRaw],
    ) -> Self {
        let camera_uniform = CameraUniform::new();

        let (depth_texture, depth_view) = create_depth_texture(device, viewport_size);

        let camera_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Camera Buffer"),
            contents: bytemuck::cast_slice(&[camera_uniform]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let camera_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                entries: &[wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                }],
                label: Some("Camera Bind Group Layout"),
            });

        let camera_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &camera_bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: camera_buffer.as_entire_binding(),
            }],
            label: Some("Camera Bind Group"),
        });

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shader.wgsl").into()),
        });

        let render_pipeline_layout =
            device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("Render Pipeline Layout"),
                bind_group_layouts: &[&camera_bind_group_layout],
                push_constant_ranges: &[],
            });

        let render_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Render Pipeline"),
            layout: Some(&render_pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: "vs_main",
                buffers: &[
                    wgpu::VertexBufferLayout {
                        array_stride: std::mem::size_of::<Vertex>() as wgpu::BufferAddress,
                        step_mode: wgpu::VertexStepMode::Vertex,
                        attributes: &wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x3],
                    },
                    wgpu::VertexBufferLayout {
                        array_stride: std::mem::size_of::<InstanceRaw>() as wgpu::BufferAddress,
                        step_mode: wgpu::VertexStepMode::Instance,
                        attributes: &wgpu::vertex_attr_array![
                            2 => Float32x4,
                            3 => Float32x4,
                            4 => Float32x4,
                            5 => Float32x4,
                            6 => Float32x4,
                        ],
                    },
                ],
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: "fs_main",
                targets: &color_target(format),
            }),
            primitive: triangles(Some(wgpu::Face::Back)),
            depth_stencil: Some(wgpu::DepthStencilState {
                format: wgpu::TextureFormat::Depth32Float,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
        });

        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Vertex Buffer"),
            contents: bytemuck::cast_slice(VERTICES),
            usage: wgpu::BufferUsages::VERTEX,
        });

        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Index Buffer"),
            contents: bytemuck::cast_slice(INDICES),
            usage: wgpu::BufferUsages::INDEX,
        });

        let num_indices = INDICES.len() as u32;

        let instance_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Instance Buffer"),
            contents: bytemuck::cast_slice(instances),
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
        });

        let clear_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Clear Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("clear.wgsl").into()),
        });

        let clear_pipeline_layout =
            device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("Clear Pipeline Layout"),
                bind_group_layouts: &[],
                push_constant_ranges: &[],
            });

        let clear_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Clear Pipeline"),
            layout: Some(&clear_pipeline_layout),
            vertex: wgpu::VertexState {
                module: &clear_shader,
                entry_point: "vs_main",
                buffers: &[],
            },
            fragment: Some(wgpu::FragmentState {
                module: &clear_shader,
                entry_point: "fs_main",
                targets: &color_target(format),
            }),
            primitive: triangles(None),
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
        });

        Self {
            render_pipeline,
            vertex_buffer,
            index_buffer,
            num_indices,
            instance_buffer,
            instance_capacity: instances.len(),
            num_instances: instances.len() as u32,
            camera_uniform,
            camera_buffer,
            camera_bind_group,
            depth_texture,
            depth_view,
            clear_pipeline,
        }
    }

    /// Recreates the depth buffer when the target changes size.
    pub(crate) fn resize(&mut self, device: &Device, new_size: Size<u32>) {
        if new_size.width > 0
            && new_size.height > 0
            && (self.depth_texture.size().width != new_size.width
                || self.depth_texture.size().height != new_size.height)
        {
            (self.depth_texture, self.depth_view) = create_depth_texture(device, new_size);
        }
    }

    pub(crate) fn update_camera(
        &mut self,
        queue: &Queue,
        camera: &Camera,
        projection: &Projection,
        render_mode: RenderMode,
    ) {
        self.camera_uniform.update_view_proj(camera, projection);
        self.camera_uniform.render_mode = render_mode.shader_index();
        queue.write_buffer(
            &self.camera_buffer,
            0,
            bytemuck::cast_slice(&[self.camera_uniform]),
        );
    }

    /// Uploads new instance data, growing the instance buffer if needed.
    pub(crate) fn update_instances(&mut self, device: &Device, queue: &Queue, instances: &[InstanceRaw]) {
        if instances.len() > self.instance_capacity {
            self.instance_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Instance Buffer"),
                contents: bytemuck::cast_slice(instances),
                usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            });
            self.instance_capacity = instances.len();
        } else {
            queue.write_buffer(&self.instance_buffer, 0, bytemuck::cast_slice(instances));
        }
        self.num_instances = instances.len() as u32;
    }

    /// Renders a single frame into the `clip_bounds` region of `target`.
    pub(crate) fn render(
        &self,
        encoder: &mut CommandEncoder,
        target: &TextureView,
        clip_bounds: &Rectangle<u32>,
    ) {
        if clip_bounds.width == 0 || clip_bounds.height == 0 {
            return;
        }
        let (x, y) = (clip_bounds.x as f32, clip_bounds.y as f32);
        let (width, height) = (clip_bounds.width as f32, clip_bounds.height as f32);

        // Background, limited to the viewport; the rest of the target is iced's.
        {
            let mut clear_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Clear Pass"),
                color_attachments: &load_target(target),
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            clear_pass.set_viewport(x, y, width, height, 0.0, 1.0);
            clear_pass.set_pipeline(&self.clear_pipeline);
            clear_pass.draw(0..3, 0..1);
        }

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Cube Pass"),
                color_attachments: &load_target(target),
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            render_pass.set_viewport(x, y, width, height, 0.0, 1.0);
            render_pass.set_pipeline(&self.render_pipeline);
            render_pass.set_bind_group(0, &self.camera_bind_group, &[]);
            render_pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
            render_pass.set_vertex_buffer(1, self.instance_buffer.slice(..));
            render_pass.set_index_buffer(self.index_buffer.slice(..), wgpu::IndexFormat::Uint16);
            render_pass.draw_indexed(0..self.num_indices, 0, 0..self.num_instances);
        }
    }
}
