//! Tileable value noise.

/// 2D integer lattice hash → `[0, 1)`.
pub fn hash_i(i: i32, j: i32, seed: u32) -> f32 {
    let mut x = (i as u32 as u64).wrapping_mul(0x27d4_eb2d);
    x ^= (j as u32 as u64).wrapping_mul(0x1656_6791_9E37_79F9);
    x ^= (seed as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15);
    // splitmix64 finalizer
    x = (x ^ (x >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    x = (x ^ (x >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    x ^= x >> 31;
    (x >> 40) as f32 / (1u64 << 24) as f32
}

/// Value noise in `[0, 1)` whose lattice wraps every `period` cells.
pub fn value_noise_tiled(x: f32, y: f32, period: i32, seed: u32) -> f32 {
    let period = period.max(1);
    let xf = x.floor();
    let yf = y.floor();
    let tx = x - xf;
    let ty = y - yf;
    let xi = xf as i32;
    let yi = yf as i32;

    let x0 = xi.rem_euclid(period);
    let y0 = yi.rem_euclid(period);
    let x1 = (xi + 1).rem_euclid(period);
    let y1 = (yi + 1).rem_euclid(period);

    // quintic fade for C2 continuity
    let sx = tx * tx * tx * (tx * (tx * 6.0 - 15.0) + 10.0);
    let sy = ty * ty * ty * (ty * (ty * 6.0 - 15.0) + 10.0);

    let c00 = hash_i(x0, y0, seed);
    let c10 = hash_i(x1, y0, seed);
    let c01 = hash_i(x0, y1, seed);
    let c11 = hash_i(x1, y1, seed);

    let a = c00 + sx * (c10 - c00);
    let b = c01 + sx * (c11 - c01);
    a + sy * (b - a)
}

/// Fractal sum of [`value_noise_tiled`], normalized back to `[0, 1)`.
///
/// Each octave doubles frequency and period, so the result tiles with the
/// base period.
pub fn fbm_tiled(x: f32, y: f32, period: i32, octaves: u32, seed: u32) -> f32 {
    let mut value = 0.0;
    let mut amplitude = 0.5;
    let mut total = 0.0;
    let mut frequency = 1.0f32;
    let mut p = period.max(1);

    for octave in 0..octaves.max(1) {
        let n = value_noise_tiled(x * frequency, y * frequency, p, seed.wrapping_add(octave));
        value += amplitude * n;
        total += amplitude;
        amplitude *= 0.5;
        frequency *= 2.0;
        p = p.saturating_mul(2);
    }

    value / total
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn noise_is_deterministic() {
        let a = value_noise_tiled(12.34, 56.78, 16, 42);
        let b = value_noise_tiled(12.34, 56.78, 16, 42);
        assert_eq!(a.to_bits(), b.to_bits());
    }

    #[test]
    fn hash_stays_in_unit_range() {
        for i in -50..50 {
            for j in -50..50 {
                let h = hash_i(i, j, 7);
                assert!((0.0..1.0).contains(&h), "hash({i},{j}) = {h}");
            }
        }
    }

    #[test]
    fn noise_wraps_at_period() {
        let period = 8;
        for k in 0..20 {
            let x = k as f32 * 0.37;
            let y = k as f32 * 0.91;
            let a = value_noise_tiled(x, y, period, 3);
            let b = value_noise_tiled(x + period as f32, y + period as f32, period, 3);
            assert!((a - b).abs() < 1e-4, "{a} vs {b}");
        }
    }

    #[test]
    fn seeds_change_the_field() {
        let a: Vec<f32> = (0..16).map(|i| value_noise_tiled(i as f32 + 0.5, 0.5, 16, 1)).collect();
        let b: Vec<f32> = (0..16).map(|i| value_noise_tiled(i as f32 + 0.5, 0.5, 16, 2)).collect();
        assert_ne!(a, b);
    }

    #[test]
    fn fbm_is_normalized() {
        for k in 0..100 {
            let v = fbm_tiled(k as f32 * 0.173, k as f32 * 0.311, 4, 5, 9);
            assert!((0.0..1.0).contains(&v));
        }
    }
}
