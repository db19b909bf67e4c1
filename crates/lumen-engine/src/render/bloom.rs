//! GPU side of the bloom chain: luminosity high pass, separable blur per
//! level, weighted composite.

use bytemuck::{Pod, Zeroable};

use super::common::{
    draw_fullscreen, fullscreen_pipeline, linear_sampler, sampler_entry, texture_entry,
    uniform_entry, BLUR_WGSL, COMPOSITE_WGSL, HIGH_PASS_WGSL,
};
use super::post::{
    bloom_factors, bloom_mip_sizes, gaussian_coefficients, BloomSettings, BLOOM_KERNEL_RADII,
    BLOOM_MIPS, BLOOM_SMOOTH_WIDTH,
};
use super::targets::{color_texture, HDR_FORMAT};

const MAX_BLUR_TAPS: usize = 12;

#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
struct HighPassUniform {
    params: [f32; 4],
}

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
struct BlurUniform {
    dir_inv_size: [f32; 4],
    kernel: [f32; 4],
    coefficients: [[f32; 4]; 3],
}

impl BlurUniform {
    fn new(direction: [f32; 2], size: (u32, u32), kernel_radius: u32) -> Self {
        let mut packed = [0.0f32; MAX_BLUR_TAPS];
        let taps = gaussian_coefficients(kernel_radius);
        for (slot, c) in packed.iter_mut().zip(&taps) {
            *slot = *c;
        }
        let radius = taps.len().min(MAX_BLUR_TAPS);

        let mut coefficients = [[0.0; 4]; 3];
        for (i, c) in packed.iter().enumerate() {
            coefficients[i / 4][i % 4] = *c;
        }

        Self {
            dir_inv_size: [
                direction[0],
                direction[1],
                1.0 / size.0.max(1) as f32,
                1.0 / size.1.max(1) as f32,
            ],
            kernel: [radius as f32, 0.0, 0.0, 0.0],
            coefficients,
        }
    }
}

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
struct CompositeUniform {
    strength: [f32; 4],
    factors_lo: [f32; 4],
    factors_hi: [f32; 4],
}

impl CompositeUniform {
    fn new(settings: &BloomSettings) -> Self {
        let f = bloom_factors(settings.radius);
        Self {
            strength: [settings.strength, 0.0, 0.0, 0.0],
            factors_lo: [f[0], f[1], f[2], f[3]],
            factors_hi: [f[4], 0.0, 0.0, 0.0],
        }
    }
}

/// Size-dependent textures and the bind groups that read them.
struct BloomTargets {
    scene_size: (u32, u32),
    bright: wgpu::TextureView,
    horizontal: Vec<wgpu::TextureView>,
    vertical: Vec<wgpu::TextureView>,
    composite: wgpu::TextureView,

    high_pass_bind_group: wgpu::BindGroup,
    /// `[h0, v0, h1, v1, ...]`
    blur_bind_groups: Vec<wgpu::BindGroup>,
    composite_bind_group: wgpu::BindGroup,
}

pub(super) struct BloomPass {
    high_pass_bgl: wgpu::BindGroupLayout,
    blur_bgl: wgpu::BindGroupLayout,
    composite_bgl: wgpu::BindGroupLayout,

    high_pass_pipeline: wgpu::RenderPipeline,
    blur_pipeline: wgpu::RenderPipeline,
    composite_pipeline: wgpu::RenderPipeline,

    sampler: wgpu::Sampler,
    high_pass_ubo: wgpu::Buffer,
    blur_ubos: Vec<wgpu::Buffer>,
    composite_ubo: wgpu::Buffer,

    targets: Option<BloomTargets>,
}

impl BloomPass {
    pub fn new(device: &wgpu::Device) -> Self {
        let frag = wgpu::ShaderStages::FRAGMENT;

        let high_pass_bgl = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("lumen bloom high pass bgl"),
            entries: &[
                uniform_entry(0, frag, false, std::mem::size_of::<HighPassUniform>() as u64),
                sampler_entry(1, frag),
                texture_entry(2, frag),
            ],
        });
        let blur_bgl = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("lumen bloom blur bgl"),
            entries: &[
                uniform_entry(0, frag, false, std::mem::size_of::<BlurUniform>() as u64),
                sampler_entry(1, frag),
                texture_entry(2, frag),
            ],
        });
        let composite_bgl = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("lumen bloom composite bgl"),
            entries: &[
                uniform_entry(0, frag, false, std::mem::size_of::<CompositeUniform>() as u64),
                sampler_entry(1, frag),
                texture_entry(2, frag),
                texture_entry(3, frag),
                texture_entry(4, frag),
                texture_entry(5, frag),
                texture_entry(6, frag),
            ],
        });

        let high_pass_pipeline =
            fullscreen_pipeline(device, "lumen bloom high pass", HIGH_PASS_WGSL, &high_pass_bgl, HDR_FORMAT);
        let blur_pipeline = fullscreen_pipeline(device, "lumen bloom blur", BLUR_WGSL, &blur_bgl, HDR_FORMAT);
        let composite_pipeline =
            fullscreen_pipeline(device, "lumen bloom composite", COMPOSITE_WGSL, &composite_bgl, HDR_FORMAT);

        let sampler = linear_sampler(
            device,
            "lumen bloom sampler",
            wgpu::AddressMode::ClampToEdge,
            wgpu::AddressMode::ClampToEdge,
        );

        let uniform = |label: &str, size: usize| {
            device.create_buffer(&wgpu::BufferDescriptor {
                label: Some(label),
                size: size as u64,
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            })
        };

        let high_pass_ubo = uniform("lumen bloom high pass ubo", std::mem::size_of::<HighPassUniform>());
        let blur_ubos = (0..BLOOM_MIPS * 2)
            .map(|_| uniform("lumen bloom blur ubo", std::mem::size_of::<BlurUniform>()))
            .collect();
        let composite_ubo = uniform("lumen bloom composite ubo", std::mem::size_of::<CompositeUniform>());

        Self {
            high_pass_bgl,
            blur_bgl,
            composite_bgl,
            high_pass_pipeline,
            blur_pipeline,
            composite_pipeline,
            sampler,
            high_pass_ubo,
            blur_ubos,
            composite_ubo,
            targets: None,
        }
    }

    /// Drops size-dependent state so the next `render` reallocates it.
    pub fn invalidate(&mut self) {
        self.targets = None;
    }

    fn ensure_targets(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        scene_view: &wgpu::TextureView,
        scene_size: (u32, u32),
    ) {
        if self.targets.as_ref().is_some_and(|t| t.scene_size == scene_size) {
            return;
        }

        let sizes = bloom_mip_sizes(scene_size);
        let usage = wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING;
        let view = |label: &str, size: (u32, u32)| {
            color_texture(device, label, size, 1, usage).create_view(&wgpu::TextureViewDescriptor::default())
        };

        let bright = view("lumen bloom bright", sizes[0]);
        let horizontal: Vec<_> = sizes.iter().map(|&s| view("lumen bloom horizontal", s)).collect();
        let vertical: Vec<_> = sizes.iter().map(|&s| view("lumen bloom vertical", s)).collect();
        let composite = view("lumen bloom composite", sizes[0]);

        let high_pass_bind_group = self.source_bind_group(
            device,
            "lumen bloom high pass bind group",
            &self.high_pass_bgl,
            &self.high_pass_ubo,
            scene_view,
        );

        let mut blur_bind_groups = Vec::with_capacity(BLOOM_MIPS * 2);
        for level in 0..BLOOM_MIPS {
            let input = if level == 0 { &bright } else { &vertical[level - 1] };
            let radius = BLOOM_KERNEL_RADII[level];

            let h = 2 * level;
            let v = h + 1;
            queue.write_buffer(
                &self.blur_ubos[h],
                0,
                bytemuck::bytes_of(&BlurUniform::new([1.0, 0.0], sizes[level], radius)),
            );
            queue.write_buffer(
                &self.blur_ubos[v],
                0,
                bytemuck::bytes_of(&BlurUniform::new([0.0, 1.0], sizes[level], radius)),
            );

            blur_bind_groups.push(self.source_bind_group(
                device,
                "lumen bloom blur bind group",
                &self.blur_bgl,
                &self.blur_ubos[h],
                input,
            ));
            blur_bind_groups.push(self.source_bind_group(
                device,
                "lumen bloom blur bind group",
                &self.blur_bgl,
                &self.blur_ubos[v],
                &horizontal[level],
            ));
        }

        let mut entries = vec![
            wgpu::BindGroupEntry { binding: 0, resource: self.composite_ubo.as_entire_binding() },
            wgpu::BindGroupEntry { binding: 1, resource: wgpu::BindingResource::Sampler(&self.sampler) },
        ];
        for (i, mip) in vertical.iter().enumerate() {
            entries.push(wgpu::BindGroupEntry {
                binding: 2 + i as u32,
                resource: wgpu::BindingResource::TextureView(mip),
            });
        }
        let composite_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("lumen bloom composite bind group"),
            layout: &self.composite_bgl,
            entries: &entries,
        });

        log::debug!("bloom targets: {}x{} base", sizes[0].0, sizes[0].1);

        self.targets = Some(BloomTargets {
            scene_size,
            bright,
            horizontal,
            vertical,
            composite,
            high_pass_bind_group,
            blur_bind_groups,
            composite_bind_group,
        });
    }

    fn source_bind_group(
        &self,
        device: &wgpu::Device,
        label: &str,
        layout: &wgpu::BindGroupLayout,
        ubo: &wgpu::Buffer,
        source: &wgpu::TextureView,
    ) -> wgpu::BindGroup {
        device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(label),
            layout,
            entries: &[
                wgpu::BindGroupEntry { binding: 0, resource: ubo.as_entire_binding() },
                wgpu::BindGroupEntry { binding: 1, resource: wgpu::BindingResource::Sampler(&self.sampler) },
                wgpu::BindGroupEntry { binding: 2, resource: wgpu::BindingResource::TextureView(source) },
            ],
        })
    }

    /// Records the chain reading `scene_view`; returns the composite view.
    pub fn render(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        encoder: &mut wgpu::CommandEncoder,
        scene_view: &wgpu::TextureView,
        scene_size: (u32, u32),
        settings: &BloomSettings,
    ) -> Option<&wgpu::TextureView> {
        self.ensure_targets(device, queue, scene_view, scene_size);

        queue.write_buffer(
            &self.high_pass_ubo,
            0,
            bytemuck::bytes_of(&HighPassUniform {
                params: [settings.threshold, BLOOM_SMOOTH_WIDTH, 0.0, 0.0],
            }),
        );
        queue.write_buffer(&self.composite_ubo, 0, bytemuck::bytes_of(&CompositeUniform::new(settings)));

        let targets = self.targets.as_ref()?;

        draw_fullscreen(
            encoder,
            "lumen bloom high pass",
            &targets.bright,
            &self.high_pass_pipeline,
            &targets.high_pass_bind_group,
        );

        for level in 0..BLOOM_MIPS {
            draw_fullscreen(
                encoder,
                "lumen bloom blur pass",
                &targets.horizontal[level],
                &self.blur_pipeline,
                &targets.blur_bind_groups[2 * level],
            );
            draw_fullscreen(
                encoder,
                "lumen bloom blur pass",
                &targets.vertical[level],
                &self.blur_pipeline,
                &targets.blur_bind_groups[2 * level + 1],
            );
        }

        draw_fullscreen(
            encoder,
            "lumen bloom composite pass",
            &targets.composite,
            &self.composite_pipeline,
            &targets.composite_bind_group,
        );

        Some(&targets.composite)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ── uniform packing ──────────────────────────────────────────────────

    #[test]
    fn blur_block_matches_shader_layout() {
        assert_eq!(std::mem::size_of::<BlurUniform>(), 80);
        assert_eq!(std::mem::size_of::<CompositeUniform>(), 48);
        assert_eq!(std::mem::size_of::<HighPassUniform>(), 16);
    }

    #[test]
    fn blur_packs_every_tap_of_the_widest_kernel() {
        let u = BlurUniform::new([1.0, 0.0], (40, 23), 11);
        let taps = gaussian_coefficients(11);
        assert_eq!(u.kernel[0], 11.0);
        assert_eq!(u.coefficients[0][0], taps[0]);
        assert_eq!(u.coefficients[2][2], taps[10]);
        assert_eq!(u.coefficients[2][3], 0.0);
        assert_eq!(u.dir_inv_size, [1.0, 0.0, 1.0 / 40.0, 1.0 / 23.0]);
    }

    #[test]
    fn composite_carries_strength_and_factors() {
        let s = BloomSettings { strength: 3.5, threshold: 0.4, radius: 0.0 };
        let u = CompositeUniform::new(&s);
        assert_eq!(u.strength[0], 3.5);
        assert_eq!(u.factors_lo, [1.0, 0.8, 0.6, 0.4]);
        assert_eq!(u.factors_hi[0], 0.2);
    }
}
