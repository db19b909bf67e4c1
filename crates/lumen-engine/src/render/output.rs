use bytemuck::{Pod, Zeroable};

use super::common::{draw_fullscreen, fullscreen_pipeline, linear_sampler, sampler_entry, texture_entry, uniform_entry, OUTPUT_WGSL};
use super::post::PostProcessing;
use super::settings::RenderSettings;
use super::textures::solid_texture;
use super::HDR_FORMAT;

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub(super) struct OutputUniform {
    /// post exposure, tone mapping exposure, bloom on, encode sRGB.
    pub params: [f32; 4],
}

impl OutputUniform {
    pub fn new(post: &PostProcessing, settings: &RenderSettings, bloom: bool, format: wgpu::TextureFormat) -> Self {
        Self {
            params: [
                post.exposure,
                settings.tone_mapping_exposure,
                if bloom { 1.0 } else { 0.0 },
                if format.is_srgb() { 0.0 } else { 1.0 },
            ],
        }
    }
}

/// Tone maps the HDR scene (plus bloom) onto the swapchain image.
pub(super) struct OutputPass {
    bgl: wgpu::BindGroupLayout,
    pipeline_format: Option<wgpu::TextureFormat>,
    pipeline: Option<wgpu::RenderPipeline>,
    sampler: wgpu::Sampler,
    ubo: wgpu::Buffer,
    no_bloom: wgpu::TextureView,
    bind_group: Option<wgpu::BindGroup>,
    bound_bloom: bool,
}

impl OutputPass {
    pub fn new(device: &wgpu::Device, queue: &wgpu::Queue) -> Self {
        let frag = wgpu::ShaderStages::FRAGMENT;
        let bgl = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("lumen output bgl"),
            entries: &[
                uniform_entry(0, frag, false, std::mem::size_of::<OutputUniform>() as u64),
                sampler_entry(1, frag),
                texture_entry(2, frag),
                texture_entry(3, frag),
            ],
        });

        let ubo = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("lumen output ubo"),
            size: std::mem::size_of::<OutputUniform>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        Self {
            bgl,
            pipeline_format: None,
            pipeline: None,
            sampler: linear_sampler(
                device,
                "lumen output sampler",
                wgpu::AddressMode::ClampToEdge,
                wgpu::AddressMode::ClampToEdge,
            ),
            ubo,
            no_bloom: solid_texture(device, queue, "lumen no bloom", HDR_FORMAT, bytemuck::cast_slice(&[0u16; 4])),
            bind_group: None,
            bound_bloom: false,
        }
    }

    /// Drops the bind group so it is rebuilt against new source views.
    pub fn invalidate(&mut self) {
        self.bind_group = None;
    }

    fn ensure_pipeline(&mut self, device: &wgpu::Device, format: wgpu::TextureFormat) {
        if self.pipeline_format == Some(format) && self.pipeline.is_some() {
            return;
        }
        self.pipeline = Some(fullscreen_pipeline(device, "lumen output pass", OUTPUT_WGSL, &self.bgl, format));
        self.pipeline_format = Some(format);
    }

    fn ensure_bindings(&mut self, device: &wgpu::Device, scene: &wgpu::TextureView, bloom: Option<&wgpu::TextureView>) {
        if self.bind_group.is_some() && self.bound_bloom == bloom.is_some() {
            return;
        }
        let bloom_view = bloom.unwrap_or(&self.no_bloom);

        self.bind_group = Some(device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("lumen output bind group"),
            layout: &self.bgl,
            entries: &[
                wgpu::BindGroupEntry { binding: 0, resource: self.ubo.as_entire_binding() },
                wgpu::BindGroupEntry { binding: 1, resource: wgpu::BindingResource::Sampler(&self.sampler) },
                wgpu::BindGroupEntry { binding: 2, resource: wgpu::BindingResource::TextureView(scene) },
                wgpu::BindGroupEntry { binding: 3, resource: wgpu::BindingResource::TextureView(bloom_view) },
            ],
        }));
        self.bound_bloom = bloom.is_some();
    }

    #[allow(clippy::too_many_arguments)]
    pub fn render(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        encoder: &mut wgpu::CommandEncoder,
        target: &wgpu::TextureView,
        format: wgpu::TextureFormat,
        scene: &wgpu::TextureView,
        bloom: Option<&wgpu::TextureView>,
        params: OutputUniform,
    ) {
        self.ensure_pipeline(device, format);
        self.ensure_bindings(device, scene, bloom);
        queue.write_buffer(&self.ubo, 0, bytemuck::bytes_of(&params));

        let Some(pipeline) = self.pipeline.as_ref() else { return };
        let Some(bind_group) = self.bind_group.as_ref() else { return };
        draw_fullscreen(encoder, "lumen output pass", target, pipeline, bind_group);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::BloomSettings;

    #[test]
    fn params_follow_post_and_surface() {
        let post = PostProcessing::with_bloom(BloomSettings { strength: 3.5, threshold: 0.4, radius: 1.2 }, 1.2);
        let settings = RenderSettings::default();

        let srgb = OutputUniform::new(&post, &settings, true, wgpu::TextureFormat::Bgra8UnormSrgb);
        assert_eq!(srgb.params, [1.2, 1.0, 1.0, 0.0]);

        let linear = OutputUniform::new(&PostProcessing::direct(), &settings, false, wgpu::TextureFormat::Bgra8Unorm);
        assert_eq!(linear.params, [1.0, 1.0, 0.0, 1.0]);
    }
}
