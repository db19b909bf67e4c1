//! Post-processing description and the bloom math shared with the shaders.

/// Number of blur levels in the bloom chain.
pub const BLOOM_MIPS: usize = 5;

/// Gaussian kernel radius per bloom level, in texels of that level.
pub const BLOOM_KERNEL_RADII: [u32; BLOOM_MIPS] = [3, 5, 7, 9, 11];

/// Base weight per bloom level before `radius` is applied.
pub const BLOOM_FACTORS: [f32; BLOOM_MIPS] = [1.0, 0.8, 0.6, 0.4, 0.2];

/// Softness of the luminosity threshold.
pub const BLOOM_SMOOTH_WIDTH: f32 = 0.01;

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct BloomSettings {
    /// Overall bloom strength.
    pub strength: f32,
    /// Luminance above which pixels bloom.
    pub threshold: f32,
    /// Blend between tight (0) and wide (1) falloff across levels.
    pub radius: f32,
}

/// Final composite: `(scene + bloom) * exposure`, then tone mapping.
///
/// `bloom: None` is the direct path: no bloom targets are allocated and the
/// output equals `scene * exposure`.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct PostProcessing {
    pub bloom: Option<BloomSettings>,
    pub exposure: f32,
}

impl Default for PostProcessing {
    fn default() -> Self {
        Self::direct()
    }
}

impl PostProcessing {
    pub fn direct() -> Self {
        Self { bloom: None, exposure: 1.0 }
    }

    pub fn with_bloom(bloom: BloomSettings, exposure: f32) -> Self {
        Self { bloom: Some(bloom), exposure }
    }

    /// Pre-tone-mapping output for one pixel.
    pub fn composite(&self, scene: [f32; 3], bloom: [f32; 3]) -> [f32; 3] {
        let b = if self.bloom.is_some() { bloom } else { [0.0; 3] };
        [
            (scene[0] + b[0]) * self.exposure,
            (scene[1] + b[1]) * self.exposure,
            (scene[2] + b[2]) * self.exposure,
        ]
    }
}

/// Per-level weights: each factor `f` becomes `mix(f, 1.2 - f, radius)`.
pub fn bloom_factors(radius: f32) -> [f32; BLOOM_MIPS] {
    BLOOM_FACTORS.map(|f| f + (1.2 - f - f) * radius)
}

/// One side of a normalized-at-use gaussian, `kernel_radius` taps, sigma =
/// `kernel_radius`.
pub fn gaussian_coefficients(kernel_radius: u32) -> Vec<f32> {
    let sigma = kernel_radius.max(1) as f32;
    (0..kernel_radius)
        .map(|i| {
            let x = i as f32;
            0.39894 * (-0.5 * x * x / (sigma * sigma)).exp() / sigma
        })
        .collect()
}

/// Mip sizes of the bloom chain for a scene of `size` pixels. The first level
/// is half resolution.
pub fn bloom_mip_sizes(size: (u32, u32)) -> [(u32, u32); BLOOM_MIPS] {
    let mut w = (size.0 as f32 / 2.0).round().max(1.0) as u32;
    let mut h = (size.1 as f32 / 2.0).round().max(1.0) as u32;
    let mut out = [(1, 1); BLOOM_MIPS];
    for level in &mut out {
        *level = (w, h);
        w = (w as f32 / 2.0).round().max(1.0) as u32;
        h = (h as f32 / 2.0).round().max(1.0) as u32;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    // ── composite ────────────────────────────────────────────────────────

    #[test]
    fn zero_bloom_scales_scene_by_exposure() {
        let post = PostProcessing::with_bloom(
            BloomSettings { strength: 3.5, threshold: 0.4, radius: 1.2 },
            1.2,
        );
        let out = post.composite([0.5, 0.25, 1.0], [0.0; 3]);
        assert_eq!(out, [0.5 * 1.2, 0.25 * 1.2, 1.0 * 1.2]);
    }

    #[test]
    fn direct_path_ignores_bloom_input() {
        let post = PostProcessing::direct();
        assert_eq!(post.composite([0.3; 3], [9.0; 3]), [0.3; 3]);
    }

    // ── bloom math ───────────────────────────────────────────────────────

    #[test]
    fn factors_lerp_towards_mirrored_values() {
        assert_eq!(bloom_factors(0.0), BLOOM_FACTORS);
        let one = bloom_factors(1.0);
        for (a, b) in one.iter().zip([0.2, 0.4, 0.6, 0.8, 1.0]) {
            assert!((a - b).abs() < 1e-6);
        }
        let wide = bloom_factors(1.2);
        assert!((wide[0] - 0.04).abs() < 1e-5);
        assert!((wide[4] - 1.16).abs() < 1e-5);
    }

    #[test]
    fn gaussian_is_decreasing() {
        let c = gaussian_coefficients(5);
        assert_eq!(c.len(), 5);
        assert!(c.windows(2).all(|w| w[0] > w[1]));
        assert!((c[0] - 0.39894 / 5.0).abs() < 1e-6);
    }

    #[test]
    fn mip_chain_halves() {
        assert_eq!(
            bloom_mip_sizes((1280, 720)),
            [(640, 360), (320, 180), (160, 90), (80, 45), (40, 23)]
        );
        assert_eq!(bloom_mip_sizes((1, 1))[4], (1, 1));
    }
}
