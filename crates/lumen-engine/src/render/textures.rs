//! Uploads of scene-owned CPU textures, keyed by `Arc` identity.

use std::sync::Arc;

use crate::scene::{EnvironmentLevel, EnvironmentMap};
use crate::texture::NormalMap;

use super::targets::extent;

/// GPU copy of one `Arc`-shared CPU texture. Holding the `Arc` keeps the
/// pointer from being reused while the entry lives.
pub(super) struct Uploaded<T> {
    source: Arc<T>,
    pub view: wgpu::TextureView,
}

impl<T> Uploaded<T> {
    pub fn is(&self, other: &Arc<T>) -> bool {
        Arc::ptr_eq(&self.source, other)
    }
}

/// Index of the first level no larger than `max_dimension` on either axis.
/// The chain ends at 1×1, so the last level always qualifies.
pub(super) fn first_fitting_level(levels: &[EnvironmentLevel], max_dimension: u32) -> usize {
    levels
        .iter()
        .position(|l| l.width <= max_dimension && l.height <= max_dimension)
        .unwrap_or(levels.len().saturating_sub(1))
}

/// Uploads the environment, dropping leading mips that exceed the device's
/// texture size limit.
pub(super) fn upload_environment(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    env: &Arc<EnvironmentMap>,
) -> Uploaded<EnvironmentMap> {
    let max = device.limits().max_texture_dimension_2d;
    let first = first_fitting_level(env.levels(), max);
    let levels = &env.levels()[first..];
    let (width, height) = levels.first().map_or((1, 1), |l| (l.width, l.height));
    if first > 0 {
        log::warn!(
            "environment {}x{} exceeds the {max}px texture limit; uploading from {width}x{height}",
            env.width(),
            env.height()
        );
    }

    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("lumen environment"),
        size: extent((width, height)),
        mip_level_count: levels.len().max(1) as u32,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: wgpu::TextureFormat::Rgba16Float,
        usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
        view_formats: &[],
    });

    for (mip, level) in levels.iter().enumerate() {
        let halfs: Vec<u16> = level
            .texels
            .iter()
            .flat_map(|t| t.map(|c| half::f16::from_f32(c.clamp(0.0, 65_504.0)).to_bits()))
            .collect();
        write_level(queue, &texture, mip as u32, (level.width, level.height), 8, bytemuck::cast_slice(&halfs));
    }

    log::info!("environment uploaded: {width}x{height}, {} mips", levels.len());
    Uploaded {
        source: env.clone(),
        view: texture.create_view(&wgpu::TextureViewDescriptor::default()),
    }
}

pub(super) fn upload_normal_map(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    map: &Arc<NormalMap>,
) -> Uploaded<NormalMap> {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("lumen normal map"),
        size: extent((map.size(), map.size())),
        mip_level_count: map.mip_count(),
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: wgpu::TextureFormat::Rgba8Unorm,
        usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
        view_formats: &[],
    });

    let mut dim = map.size();
    for mip in 0..map.mip_count() {
        if let Some(texels) = map.level(mip) {
            write_level(queue, &texture, mip, (dim, dim), 4, texels);
        }
        dim = (dim / 2).max(1);
    }

    log::debug!("normal map uploaded: {}px, {} mips", map.size(), map.mip_count());
    Uploaded {
        source: map.clone(),
        view: texture.create_view(&wgpu::TextureViewDescriptor::default()),
    }
}

/// 1×1 texture of a single texel, used when a slot has no source.
pub(super) fn solid_texture(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    label: &str,
    format: wgpu::TextureFormat,
    texel: &[u8],
) -> wgpu::TextureView {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some(label),
        size: extent((1, 1)),
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format,
        usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
        view_formats: &[],
    });
    write_level(queue, &texture, 0, (1, 1), texel.len() as u32, texel);
    texture.create_view(&wgpu::TextureViewDescriptor::default())
}

fn write_level(
    queue: &wgpu::Queue,
    texture: &wgpu::Texture,
    mip_level: u32,
    size: (u32, u32),
    bytes_per_texel: u32,
    data: &[u8],
) {
    queue.write_texture(
        wgpu::TexelCopyTextureInfo {
            texture,
            mip_level,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        data,
        wgpu::TexelCopyBufferLayout {
            offset: 0,
            bytes_per_row: Some(size.0 * bytes_per_texel),
            rows_per_image: Some(size.1),
        },
        extent(size),
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    fn environment(width: u32, height: u32) -> EnvironmentMap {
        let texels = vec![[1.0; 4]; (width * height) as usize];
        EnvironmentMap::from_texels(width, height, texels).unwrap()
    }

    #[test]
    fn small_environment_uploads_every_level() {
        let env = environment(64, 32);
        assert_eq!(first_fitting_level(env.levels(), 8192), 0);
    }

    #[test]
    fn oversized_environment_starts_at_the_first_fitting_mip() {
        let env = environment(64, 32);
        let first = first_fitting_level(env.levels(), 16);
        let level = &env.levels()[first];
        assert_eq!((level.width, level.height), (16, 8));
        assert_eq!(env.levels().len() - first, 5);
    }

    #[test]
    fn tiny_limit_falls_back_to_the_last_level() {
        let env = environment(64, 32);
        assert_eq!(first_fitting_level(env.levels(), 0), env.levels().len() - 1);
    }
}
