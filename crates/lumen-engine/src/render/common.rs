//! Shared GPU helpers used by the render passes.

use std::num::NonZeroU64;

// ── shader sources ───────────────────────────────────────────────────────

pub(super) const PBR_WGSL: &str =
    concat!(include_str!("shaders/common.wgsl"), "\n", include_str!("shaders/pbr.wgsl"));
pub(super) const SHADOW_WGSL: &str =
    concat!(include_str!("shaders/common.wgsl"), "\n", include_str!("shaders/shadow.wgsl"));
pub(super) const HIGH_PASS_WGSL: &str =
    concat!(include_str!("shaders/fullscreen.wgsl"), "\n", include_str!("shaders/bloom_high_pass.wgsl"));
pub(super) const BLUR_WGSL: &str =
    concat!(include_str!("shaders/fullscreen.wgsl"), "\n", include_str!("shaders/bloom_blur.wgsl"));
pub(super) const COMPOSITE_WGSL: &str =
    concat!(include_str!("shaders/fullscreen.wgsl"), "\n", include_str!("shaders/bloom_composite.wgsl"));
pub(super) const OUTPUT_WGSL: &str =
    concat!(include_str!("shaders/fullscreen.wgsl"), "\n", include_str!("shaders/output.wgsl"));

pub(super) fn shader(device: &wgpu::Device, label: &str, source: &'static str) -> wgpu::ShaderModule {
    device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some(label),
        source: wgpu::ShaderSource::Wgsl(source.into()),
    })
}

// ── bind group layout entries ────────────────────────────────────────────

/// Uniform buffer entry. `size` of zero is treated as unsized.
pub(super) fn uniform_entry(
    binding: u32,
    visibility: wgpu::ShaderStages,
    dynamic: bool,
    size: u64,
) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: dynamic,
            min_binding_size: NonZeroU64::new(size),
        },
        count: None,
    }
}

pub(super) fn texture_entry(binding: u32, visibility: wgpu::ShaderStages) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility,
        ty: wgpu::BindingType::Texture {
            sample_type: wgpu::TextureSampleType::Float { filterable: true },
            view_dimension: wgpu::TextureViewDimension::D2,
            multisampled: false,
        },
        count: None,
    }
}

pub(super) fn sampler_entry(binding: u32, visibility: wgpu::ShaderStages) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility,
        ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
        count: None,
    }
}

// ── samplers ─────────────────────────────────────────────────────────────

pub(super) fn linear_sampler(
    device: &wgpu::Device,
    label: &str,
    address_u: wgpu::AddressMode,
    address_v: wgpu::AddressMode,
) -> wgpu::Sampler {
    device.create_sampler(&wgpu::SamplerDescriptor {
        label: Some(label),
        address_mode_u: address_u,
        address_mode_v: address_v,
        address_mode_w: wgpu::AddressMode::ClampToEdge,
        mag_filter: wgpu::FilterMode::Linear,
        min_filter: wgpu::FilterMode::Linear,
        mipmap_filter: wgpu::MipmapFilterMode::Linear,
        ..Default::default()
    })
}

// ── fullscreen pipelines ─────────────────────────────────────────────────

/// Fullscreen-triangle pipeline writing one color target, no blending.
pub(super) fn fullscreen_pipeline(
    device: &wgpu::Device,
    label: &str,
    source: &'static str,
    bind_group_layout: &wgpu::BindGroupLayout,
    format: wgpu::TextureFormat,
) -> wgpu::RenderPipeline {
    let module = shader(device, label, source);

    let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some(label),
        bind_group_layouts: &[bind_group_layout],
        immediate_size: 0,
    });

    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(label),
        layout: Some(&layout),
        vertex: wgpu::VertexState {
            module: &module,
            entry_point: Some("vs_fullscreen"),
            compilation_options: Default::default(),
            buffers: &[],
        },
        fragment: Some(wgpu::FragmentState {
            module: &module,
            entry_point: Some("fs_main"),
            compilation_options: Default::default(),
            targets: &[Some(wgpu::ColorTargetState {
                format,
                blend: None,
                write_mask: wgpu::ColorWrites::ALL,
            })],
        }),
        primitive: wgpu::PrimitiveState::default(),
        depth_stencil: None,
        multisample: wgpu::MultisampleState::default(),
        multiview_mask: None,
        cache: None,
    })
}

/// Records one fullscreen draw into `view`.
pub(super) fn draw_fullscreen(
    encoder: &mut wgpu::CommandEncoder,
    label: &str,
    view: &wgpu::TextureView,
    pipeline: &wgpu::RenderPipeline,
    bind_group: &wgpu::BindGroup,
) {
    let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
        label: Some(label),
        color_attachments: &[Some(wgpu::RenderPassColorAttachment {
            view,
            resolve_target: None,
            ops: wgpu::Operations {
                load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                store: wgpu::StoreOp::Store,
            },
            depth_slice: None,
        })],
        depth_stencil_attachment: None,
        timestamp_writes: None,
        occlusion_query_set: None,
        multiview_mask: None,
    });
    rpass.set_pipeline(pipeline);
    rpass.set_bind_group(0, bind_group, &[]);
    rpass.draw(0..3, 0..1);
}
