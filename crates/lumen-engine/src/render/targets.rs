/// HDR color format of the scene and bloom targets.
pub const HDR_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba16Float;
pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// Offscreen scene targets at the internal render resolution.
pub(super) struct SceneTargets {
    pub size: (u32, u32),
    pub samples: u32,
    /// Multisampled color; `None` when `samples == 1`.
    pub msaa_view: Option<wgpu::TextureView>,
    /// Single-sample color read by post-processing.
    pub color_view: wgpu::TextureView,
    pub depth_view: wgpu::TextureView,
}

impl SceneTargets {
    pub fn new(device: &wgpu::Device, size: (u32, u32), samples: u32) -> Self {
        let samples = if samples >= 4 { 4 } else { 1 };

        let msaa_view = (samples > 1).then(|| {
            color_texture(device, "lumen scene msaa color", size, samples, wgpu::TextureUsages::RENDER_ATTACHMENT)
                .create_view(&wgpu::TextureViewDescriptor::default())
        });
        let color_view = color_texture(
            device,
            "lumen scene color",
            size,
            1,
            wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
        )
        .create_view(&wgpu::TextureViewDescriptor::default());

        let depth_view = device
            .create_texture(&wgpu::TextureDescriptor {
                label: Some("lumen scene depth"),
                size: extent(size),
                mip_level_count: 1,
                sample_count: samples,
                dimension: wgpu::TextureDimension::D2,
                format: DEPTH_FORMAT,
                usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
                view_formats: &[],
            })
            .create_view(&wgpu::TextureViewDescriptor::default());

        log::debug!("scene targets: {}x{} @ {}x MSAA", size.0, size.1, samples);

        Self { size, samples, msaa_view, color_view, depth_view }
    }

    pub fn matches(&self, size: (u32, u32), samples: u32) -> bool {
        self.size == size && self.samples == if samples >= 4 { 4 } else { 1 }
    }

    /// `(attachment view, resolve target)` for the color attachment.
    pub fn color_attachment(&self) -> (&wgpu::TextureView, Option<&wgpu::TextureView>) {
        match &self.msaa_view {
            Some(msaa) => (msaa, Some(&self.color_view)),
            None => (&self.color_view, None),
        }
    }
}

pub(super) fn color_texture(
    device: &wgpu::Device,
    label: &str,
    size: (u32, u32),
    samples: u32,
    usage: wgpu::TextureUsages,
) -> wgpu::Texture {
    device.create_texture(&wgpu::TextureDescriptor {
        label: Some(label),
        size: extent(size),
        mip_level_count: 1,
        sample_count: samples,
        dimension: wgpu::TextureDimension::D2,
        format: HDR_FORMAT,
        usage,
        view_formats: &[],
    })
}

pub(super) fn extent(size: (u32, u32)) -> wgpu::Extent3d {
    wgpu::Extent3d {
        width: size.0.max(1),
        height: size.1.max(1),
        depth_or_array_layers: 1,
    }
}
