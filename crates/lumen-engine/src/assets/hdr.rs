use image::ImageFormat;

use crate::scene::EnvironmentMap;

use super::error::AssetError;

/// Decodes a Radiance `.hdr` equirectangular image into an environment map.
pub fn decode_hdr(bytes: &[u8], location: &str) -> Result<EnvironmentMap, AssetError> {
    let image = image::load_from_memory_with_format(bytes, ImageFormat::Hdr).map_err(|source| {
        AssetError::Hdr { location: location.to_string(), source }
    })?;

    let rgba = image.into_rgba32f();
    let (width, height) = rgba.dimensions();
    let texels: Vec<[f32; 4]> = rgba.pixels().map(|p| p.0).collect();

    let env = EnvironmentMap::from_texels(width, height, texels).ok_or_else(|| {
        AssetError::EmptyImage { location: location.to_string(), width, height }
    })?;

    log::debug!("decoded environment {location}: {width}x{height}, {} mips", env.mip_count());
    Ok(env)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Flat (non-RLE) Radiance file; every texel is RGBE `(128, 128, 128, 129)` = 1.0.
    fn flat_hdr(width: u32, height: u32) -> Vec<u8> {
        let mut bytes = format!(
            "#?RADIANCE\nFORMAT=32-bit_rle_rgbe\n\n-Y {height} +X {width}\n"
        )
        .into_bytes();
        for _ in 0..width * height {
            bytes.extend_from_slice(&[128, 128, 128, 129]);
        }
        bytes
    }

    #[test]
    fn decodes_flat_radiance_file() {
        let env = decode_hdr(&flat_hdr(4, 2), "mem.hdr").unwrap();
        assert_eq!((env.width(), env.height()), (4, 2));
        assert_eq!(env.mip_count(), 3);
        let t = env.levels()[0].texels[0];
        assert!((t[0] - 1.0).abs() < 1e-3 && (t[3] - 1.0).abs() < 1e-6);
    }

    #[test]
    fn garbage_is_an_hdr_error() {
        let err = decode_hdr(b"not an image", "mem.hdr").unwrap_err();
        assert!(matches!(err, AssetError::Hdr { .. }));
    }
}
