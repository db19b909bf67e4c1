use glam::Mat4;

use crate::scene::Vertex;

use super::common::{shader, uniform_entry, SHADOW_WGSL};
use super::mesh::MeshCache;
use super::targets::{extent, DEPTH_FORMAT};
use super::uniforms::{ShadowUniform, DRAW_UNIFORM_STRIDE};
use super::DrawItem;

/// Depth-only pass from the directional light's orthographic camera.
pub(super) struct ShadowPass {
    pipeline: wgpu::RenderPipeline,
    ubo: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
    map_size: u32,
    map_view: wgpu::TextureView,
}

impl ShadowPass {
    pub fn new(device: &wgpu::Device, draw_bgl: &wgpu::BindGroupLayout) -> Self {
        let module = shader(device, "lumen shadow shader", SHADOW_WGSL);

        let bgl = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("lumen shadow bgl"),
            entries: &[uniform_entry(
                0,
                wgpu::ShaderStages::VERTEX,
                false,
                std::mem::size_of::<ShadowUniform>() as u64,
            )],
        });

        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("lumen shadow pipeline layout"),
            bind_group_layouts: &[&bgl, draw_bgl],
            immediate_size: 0,
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("lumen shadow pipeline"),
            layout: Some(&layout),
            vertex: wgpu::VertexState {
                module: &module,
                entry_point: Some("vs_main"),
                compilation_options: Default::default(),
                buffers: &[Vertex::layout()],
            },
            fragment: None,
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                front_face: wgpu::FrontFace::Ccw,
                // back faces into the map keeps acne off lit surfaces
                cull_mode: Some(wgpu::Face::Front),
                ..Default::default()
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::LessEqual,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState { constant: 2, slope_scale: 2.0, clamp: 0.0 },
            }),
            multisample: wgpu::MultisampleState::default(),
            multiview_mask: None,
            cache: None,
        });

        let ubo = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("lumen shadow ubo"),
            size: std::mem::size_of::<ShadowUniform>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("lumen shadow bind group"),
            layout: &bgl,
            entries: &[wgpu::BindGroupEntry { binding: 0, resource: ubo.as_entire_binding() }],
        });

        Self {
            pipeline,
            ubo,
            bind_group,
            map_size: 1,
            map_view: shadow_map(device, 1),
        }
    }

    pub fn map_view(&self) -> &wgpu::TextureView {
        &self.map_view
    }

    /// Reallocates the map when the requested size changes. Returns whether
    /// the view was replaced.
    pub fn ensure_size(&mut self, device: &wgpu::Device, size: u32) -> bool {
        let size = size.clamp(1, device.limits().max_texture_dimension_2d);
        if size == self.map_size {
            return false;
        }
        self.map_view = shadow_map(device, size);
        self.map_size = size;
        log::debug!("shadow map resized to {size}x{size}");
        true
    }

    pub fn render(
        &self,
        queue: &wgpu::Queue,
        encoder: &mut wgpu::CommandEncoder,
        light_view_proj: Mat4,
        draws: &[DrawItem],
        draw_bind_group: &wgpu::BindGroup,
        meshes: &MeshCache,
    ) {
        let u = ShadowUniform { light_view_proj: light_view_proj.to_cols_array_2d() };
        queue.write_buffer(&self.ubo, 0, bytemuck::bytes_of(&u));

        let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("lumen shadow pass"),
            color_attachments: &[],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: &self.map_view,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });

        rpass.set_pipeline(&self.pipeline);
        rpass.set_bind_group(0, &self.bind_group, &[]);

        for (i, item) in draws.iter().enumerate() {
            if !item.cast_shadow {
                continue;
            }
            let Some(mesh) = meshes.get(item.geometry.id()) else { continue };
            let offset = (i as u64 * DRAW_UNIFORM_STRIDE) as u32;
            rpass.set_bind_group(1, draw_bind_group, &[offset]);
            rpass.set_vertex_buffer(0, mesh.vbo.slice(..));
            rpass.set_index_buffer(mesh.ibo.slice(..), wgpu::IndexFormat::Uint32);
            rpass.draw_indexed(0..mesh.index_count, 0, 0..1);
        }
    }
}

fn shadow_map(device: &wgpu::Device, size: u32) -> wgpu::TextureView {
    device
        .create_texture(&wgpu::TextureDescriptor {
            label: Some("lumen shadow map"),
            size: extent((size, size)),
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[],
        })
        .create_view(&wgpu::TextureViewDescriptor::default())
}
