//! Concrete-like surface detail as a tangent-space normal map.
//!
//! The surface is a fractal grain height field with sparse pores punched
//! into it; normals come from central differences on the tiled height field.

use glam::Vec3;

use super::noise::{fbm_tiled, value_noise_tiled};

/// Edge length of the generated map when no size is given.
pub const DEFAULT_CONCRETE_SIZE: u32 = 512;

const GRAIN_OCTAVES: u32 = 4;
const GRAIN_WEIGHT: f32 = 0.6;

/// Inputs of the generator. Any value is accepted.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ConcreteParams {
    /// Log-scale feature frequency.
    pub scale: f32,
    /// Pore threshold in `[0, 1]`; higher means fewer pores.
    pub density: f32,
    /// Height amplitude.
    pub bump: f32,
    pub seed: u32,
}

impl ConcreteParams {
    /// Lattice cells across one tile.
    pub fn period(&self) -> i32 {
        let p = (self.scale * 0.5 + 2.0).exp().round();
        if p.is_finite() { (p as i32).clamp(1, 4096) } else { 1 }
    }
}

/// RGBA8 tangent-space normal map with a full mip chain.
///
/// Texels encode `n * 0.5 + 0.5`; alpha carries the height in `[0, 1]`.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalMap {
    size: u32,
    mips: Vec<Vec<u8>>,
}

impl NormalMap {
    pub fn size(&self) -> u32 {
        self.size
    }

    pub fn mip_count(&self) -> u32 {
        self.mips.len() as u32
    }

    /// Texels of mip `level`, row-major, 4 bytes each.
    pub fn level(&self, level: u32) -> Option<&[u8]> {
        self.mips.get(level as usize).map(Vec::as_slice)
    }

    /// Decoded normal at texel `(x, y)` of the base level (wrapping).
    pub fn normal_at(&self, x: u32, y: u32) -> Vec3 {
        let s = self.size;
        let i = (((y % s) * s + (x % s)) * 4) as usize;
        decode(&self.mips[0][i..i + 3])
    }
}

/// Generates a `size × size` map. `size` is rounded up to a power of two.
pub fn generate_concrete_sized(params: &ConcreteParams, size: u32) -> NormalMap {
    let size = size.max(1).next_power_of_two();
    let period = params.period();
    let heights = height_field(params, size, period);

    // Per-texel slope scale: keeps tilt independent of resolution.
    let slope = 0.5 * size as f32 / period as f32;
    let s = size as i64;
    let h = |x: i64, y: i64| heights[(y.rem_euclid(s) * s + x.rem_euclid(s)) as usize];

    let mut base = vec![0u8; (size * size * 4) as usize];
    for y in 0..s {
        for x in 0..s {
            let dx = h(x + 1, y) - h(x - 1, y);
            let dy = h(x, y + 1) - h(x, y - 1);
            let n = Vec3::new(-dx * slope, -dy * slope, 1.0).normalize_or(Vec3::Z);

            let i = ((y * s + x) * 4) as usize;
            encode(n, &mut base[i..i + 3]);
            base[i + 3] = to_u8(h(x, y) / params.bump.abs().max(f32::EPSILON));
        }
    }

    let mut mips = vec![base];
    let mut dim = size;
    while dim > 1 {
        let next = downsample(&mips[mips.len() - 1], dim);
        dim /= 2;
        mips.push(next);
    }

    log::debug!(
        "concrete normal map: {size}x{size}, period {period}, {} mips, seed {}",
        mips.len(),
        params.seed
    );

    NormalMap { size, mips }
}

fn height_field(params: &ConcreteParams, size: u32, period: i32) -> Vec<f32> {
    let pore_period = period.saturating_mul(2);
    let pore_seed = params.seed.wrapping_add(0x5bd1);
    let pore_span = (1.0 - params.density).max(1e-3);
    let to_lattice = period as f32 / size as f32;

    let mut out = Vec::with_capacity((size * size) as usize);
    for y in 0..size {
        for x in 0..size {
            let u = (x as f32 + 0.5) * to_lattice;
            let v = (y as f32 + 0.5) * to_lattice;

            let grain = fbm_tiled(u, v, period, GRAIN_OCTAVES, params.seed);
            let pore = value_noise_tiled(u * 2.0, v * 2.0, pore_period, pore_seed);
            let pit = ((pore - params.density) / pore_span).clamp(0.0, 1.0);

            let height = GRAIN_WEIGHT * grain + (1.0 - GRAIN_WEIGHT) * (1.0 - pit);
            out.push(height * params.bump);
        }
    }
    out
}

fn downsample(src: &[u8], dim: u32) -> Vec<u8> {
    let half = (dim / 2).max(1);
    let mut out = vec![0u8; (half * half * 4) as usize];
    for y in 0..half {
        for x in 0..half {
            let mut n = Vec3::ZERO;
            let mut a = 0u32;
            for (ox, oy) in [(0, 0), (1, 0), (0, 1), (1, 1)] {
                let i = (((y * 2 + oy) * dim + (x * 2 + ox)) * 4) as usize;
                n += decode(&src[i..i + 3]);
                a += src[i + 3] as u32;
            }
            let o = ((y * half + x) * 4) as usize;
            encode(n.normalize_or(Vec3::Z), &mut out[o..o + 3]);
            out[o + 3] = ((a + 2) / 4) as u8;
        }
    }
    out
}

fn encode(n: Vec3, out: &mut [u8]) {
    out[0] = to_u8(n.x * 0.5 + 0.5);
    out[1] = to_u8(n.y * 0.5 + 0.5);
    out[2] = to_u8(n.z * 0.5 + 0.5);
}

fn decode(t: &[u8]) -> Vec3 {
    Vec3::new(t[0] as f32, t[1] as f32, t[2] as f32) / 255.0 * 2.0 - Vec3::ONE
}

fn to_u8(v: f32) -> u8 {
    (v.clamp(0.0, 1.0) * 255.0).round() as u8
}
