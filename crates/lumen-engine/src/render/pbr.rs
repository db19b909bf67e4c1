use std::num::NonZeroU64;
use std::sync::Arc;

use crate::scene::{EnvironmentMap, Vertex};
use crate::texture::NormalMap;

use super::common::{linear_sampler, sampler_entry, shader, texture_entry, uniform_entry, PBR_WGSL};
use super::mesh::MeshCache;
use super::targets::{SceneTargets, DEPTH_FORMAT, HDR_FORMAT};
use super::textures::{solid_texture, upload_environment, upload_normal_map, Uploaded};
use super::uniforms::{DrawUniform, FrameUniform, DRAW_UNIFORM_STRIDE};
use super::DrawItem;

const INITIAL_DRAW_CAPACITY: usize = 16;

struct NormalBinding {
    texture: Uploaded<NormalMap>,
    bind_group: wgpu::BindGroup,
    used: bool,
}

/// Forward PBR pass into the HDR scene targets.
///
/// Group 0 holds per-frame state (camera, lights, environment, shadow map),
/// group 1 the per-draw block at a dynamic offset, group 2 the normal map.
pub(super) struct PbrPass {
    frame_bgl: wgpu::BindGroupLayout,
    draw_bgl: wgpu::BindGroupLayout,
    normal_bgl: wgpu::BindGroupLayout,
    layout: wgpu::PipelineLayout,
    module: wgpu::ShaderModule,

    pipeline_samples: u32,
    pipeline: Option<wgpu::RenderPipeline>,

    frame_ubo: wgpu::Buffer,
    frame_bind_group: Option<wgpu::BindGroup>,

    draw_buffer: wgpu::Buffer,
    draw_capacity: usize,
    draw_bind_group: wgpu::BindGroup,

    env_sampler: wgpu::Sampler,
    shadow_sampler: wgpu::Sampler,
    normal_sampler: wgpu::Sampler,

    env_fallback: wgpu::TextureView,
    environment: Option<Uploaded<EnvironmentMap>>,

    flat_normals: wgpu::BindGroup,
    normal_maps: Vec<NormalBinding>,
}

impl PbrPass {
    pub fn new(device: &wgpu::Device, queue: &wgpu::Queue) -> Self {
        let frag = wgpu::ShaderStages::FRAGMENT;
        let both = wgpu::ShaderStages::VERTEX_FRAGMENT;

        let frame_bgl = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("lumen pbr frame bgl"),
            entries: &[
                uniform_entry(0, both, false, std::mem::size_of::<FrameUniform>() as u64),
                texture_entry(1, frag),
                sampler_entry(2, frag),
                wgpu::BindGroupLayoutEntry {
                    binding: 3,
                    visibility: frag,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Depth,
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 4,
                    visibility: frag,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Comparison),
                    count: None,
                },
            ],
        });

        let draw_bgl = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("lumen draw bgl"),
            entries: &[uniform_entry(0, both, true, DRAW_UNIFORM_STRIDE)],
        });

        let normal_bgl = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("lumen pbr normal bgl"),
            entries: &[texture_entry(0, frag), sampler_entry(1, frag)],
        });

        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("lumen pbr pipeline layout"),
            bind_group_layouts: &[&frame_bgl, &draw_bgl, &normal_bgl],
            immediate_size: 0,
        });

        let module = shader(device, "lumen pbr shader", PBR_WGSL);

        let frame_ubo = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("lumen frame ubo"),
            size: std::mem::size_of::<FrameUniform>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let draw_buffer = draw_buffer(device, INITIAL_DRAW_CAPACITY);
        let draw_bind_group = draw_bind_group(device, &draw_bgl, &draw_buffer);

        let env_sampler = linear_sampler(
            device,
            "lumen environment sampler",
            wgpu::AddressMode::Repeat,
            wgpu::AddressMode::ClampToEdge,
        );
        let normal_sampler = linear_sampler(
            device,
            "lumen normal sampler",
            wgpu::AddressMode::Repeat,
            wgpu::AddressMode::Repeat,
        );
        let shadow_sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("lumen shadow sampler"),
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            compare: Some(wgpu::CompareFunction::LessEqual),
            ..Default::default()
        });

        let env_fallback = solid_texture(
            device,
            queue,
            "lumen environment fallback",
            wgpu::TextureFormat::Rgba16Float,
            bytemuck::cast_slice(&[0u16; 4]),
        );

        let flat = solid_texture(
            device,
            queue,
            "lumen flat normal",
            wgpu::TextureFormat::Rgba8Unorm,
            &[128, 128, 255, 255],
        );
        let flat_normals = normal_bind_group(device, &normal_bgl, &flat, &normal_sampler);

        Self {
            frame_bgl,
            draw_bgl,
            normal_bgl,
            layout,
            module,
            pipeline_samples: 0,
            pipeline: None,
            frame_ubo,
            frame_bind_group: None,
            draw_buffer,
            draw_capacity: INITIAL_DRAW_CAPACITY,
            draw_bind_group,
            env_sampler,
            shadow_sampler,
            normal_sampler,
            env_fallback,
            environment: None,
            flat_normals,
            normal_maps: Vec::new(),
        }
    }

    pub fn draw_bgl(&self) -> &wgpu::BindGroupLayout {
        &self.draw_bgl
    }

    pub fn draw_bind_group(&self) -> &wgpu::BindGroup {
        &self.draw_bind_group
    }

    /// Forces group 0 to be rebuilt, e.g. after the shadow map was replaced.
    pub fn invalidate_frame_bindings(&mut self) {
        self.frame_bind_group = None;
    }

    pub fn ensure_pipeline(&mut self, device: &wgpu::Device, samples: u32) {
        if self.pipeline.is_some() && self.pipeline_samples == samples {
            return;
        }

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("lumen pbr pipeline"),
            layout: Some(&self.layout),
            vertex: wgpu::VertexState {
                module: &self.module,
                entry_point: Some("vs_main"),
                compilation_options: Default::default(),
                buffers: &[Vertex::layout()],
            },
            fragment: Some(wgpu::FragmentState {
                module: &self.module,
                entry_point: Some("fs_main"),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: HDR_FORMAT,
                    blend: None,
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: Some(wgpu::Face::Back),
                ..Default::default()
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState {
                count: samples,
                mask: !0,
                alpha_to_coverage_enabled: false,
            },
            multiview_mask: None,
            cache: None,
        });

        self.pipeline_samples = samples;
        self.pipeline = Some(pipeline);
    }

    /// Uploads a new environment or drops a removed one.
    pub fn prepare_environment(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        environment: Option<&Arc<EnvironmentMap>>,
    ) {
        match (environment, &self.environment) {
            (Some(env), Some(current)) if current.is(env) => {}
            (Some(env), _) => {
                self.environment = Some(upload_environment(device, queue, env));
                self.frame_bind_group = None;
            }
            (None, Some(_)) => {
                self.environment = None;
                self.frame_bind_group = None;
            }
            (None, None) => {}
        }
    }

    /// Makes sure every normal map referenced by `draws` is resident and
    /// releases the ones no longer referenced.
    pub fn prepare_normal_maps(&mut self, device: &wgpu::Device, queue: &wgpu::Queue, draws: &[DrawItem]) {
        for binding in &mut self.normal_maps {
            binding.used = false;
        }

        for item in draws {
            let Some(map) = &item.normal_map else { continue };
            if let Some(binding) = self.normal_maps.iter_mut().find(|b| b.texture.is(map)) {
                binding.used = true;
                continue;
            }
            let texture = upload_normal_map(device, queue, map);
            let bind_group = normal_bind_group(device, &self.normal_bgl, &texture.view, &self.normal_sampler);
            self.normal_maps.push(NormalBinding { texture, bind_group, used: true });
        }

        self.normal_maps.retain(|b| b.used);
    }

    pub fn write_uniforms(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        frame: &FrameUniform,
        draws: &[DrawItem],
    ) {
        queue.write_buffer(&self.frame_ubo, 0, bytemuck::bytes_of(frame));

        if draws.is_empty() {
            return;
        }
        if draws.len() > self.draw_capacity {
            let capacity = draws.len().next_power_of_two();
            self.draw_buffer = draw_buffer(device, capacity);
            self.draw_bind_group = draw_bind_group(device, &self.draw_bgl, &self.draw_buffer);
            self.draw_capacity = capacity;
        }

        let blocks: Vec<DrawUniform> = draws.iter().map(|d| d.uniform).collect();
        queue.write_buffer(&self.draw_buffer, 0, bytemuck::cast_slice(&blocks));
    }

    fn ensure_frame_bindings(&mut self, device: &wgpu::Device, shadow_map: &wgpu::TextureView) {
        if self.frame_bind_group.is_some() {
            return;
        }
        let env_view = self.environment.as_ref().map_or(&self.env_fallback, |e| &e.view);

        self.frame_bind_group = Some(device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("lumen pbr frame bind group"),
            layout: &self.frame_bgl,
            entries: &[
                wgpu::BindGroupEntry { binding: 0, resource: self.frame_ubo.as_entire_binding() },
                wgpu::BindGroupEntry { binding: 1, resource: wgpu::BindingResource::TextureView(env_view) },
                wgpu::BindGroupEntry { binding: 2, resource: wgpu::BindingResource::Sampler(&self.env_sampler) },
                wgpu::BindGroupEntry { binding: 3, resource: wgpu::BindingResource::TextureView(shadow_map) },
                wgpu::BindGroupEntry { binding: 4, resource: wgpu::BindingResource::Sampler(&self.shadow_sampler) },
            ],
        }));
    }

    #[allow(clippy::too_many_arguments)]
    pub fn render(
        &mut self,
        device: &wgpu::Device,
        encoder: &mut wgpu::CommandEncoder,
        targets: &SceneTargets,
        shadow_map: &wgpu::TextureView,
        clear: wgpu::Color,
        draws: &[DrawItem],
        meshes: &MeshCache,
    ) {
        self.ensure_frame_bindings(device, shadow_map);

        let (view, resolve_target) = targets.color_attachment();
        let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("lumen scene pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view,
                resolve_target,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(clear),
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: &targets.depth_view,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Discard,
                }),
                stencil_ops: None,
            }),
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });

        let Some(pipeline) = self.pipeline.as_ref() else { return };
        let Some(frame_bind_group) = self.frame_bind_group.as_ref() else { return };

        rpass.set_pipeline(pipeline);
        rpass.set_bind_group(0, frame_bind_group, &[]);

        for (i, item) in draws.iter().enumerate() {
            let Some(mesh) = meshes.get(item.geometry.id()) else { continue };

            let normals = item
                .normal_map
                .as_ref()
                .and_then(|map| self.normal_maps.iter().find(|b| b.texture.is(map)))
                .map_or(&self.flat_normals, |b| &b.bind_group);

            let offset = (i as u64 * DRAW_UNIFORM_STRIDE) as u32;
            rpass.set_bind_group(1, &self.draw_bind_group, &[offset]);
            rpass.set_bind_group(2, normals, &[]);
            rpass.set_vertex_buffer(0, mesh.vbo.slice(..));
            rpass.set_index_buffer(mesh.ibo.slice(..), wgpu::IndexFormat::Uint32);
            rpass.draw_indexed(0..mesh.index_count, 0, 0..1);
        }
    }
}

fn draw_buffer(device: &wgpu::Device, capacity: usize) -> wgpu::Buffer {
    device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("lumen draw ubo"),
        size: capacity as u64 * DRAW_UNIFORM_STRIDE,
        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    })
}

fn draw_bind_group(device: &wgpu::Device, layout: &wgpu::BindGroupLayout, buffer: &wgpu::Buffer) -> wgpu::BindGroup {
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("lumen draw bind group"),
        layout,
        entries: &[wgpu::BindGroupEntry {
            binding: 0,
            resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                buffer,
                offset: 0,
                size: NonZeroU64::new(DRAW_UNIFORM_STRIDE),
            }),
        }],
    })
}

fn normal_bind_group(
    device: &wgpu::Device,
    layout: &wgpu::BindGroupLayout,
    view: &wgpu::TextureView,
    sampler: &wgpu::Sampler,
) -> wgpu::BindGroup {
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("lumen normal map bind group"),
        layout,
        entries: &[
            wgpu::BindGroupEntry { binding: 0, resource: wgpu::BindingResource::TextureView(view) },
            wgpu::BindGroupEntry { binding: 1, resource: wgpu::BindingResource::Sampler(sampler) },
        ],
    })
}
