/// One level of an [`EnvironmentMap`]: linear RGBA texels, row-major.
#[derive(Debug, Clone, PartialEq)]
pub struct EnvironmentLevel {
    pub width: u32,
    pub height: u32,
    pub texels: Vec<[f32; 4]>,
}

/// Equirectangular HDR radiance map with a box-filtered mip chain.
///
/// Rougher surfaces sample coarser levels.
#[derive(Debug, Clone, PartialEq)]
pub struct EnvironmentMap {
    levels: Vec<EnvironmentLevel>,
}

impl EnvironmentMap {
    /// Builds the chain from a base level. Returns `None` when `texels` does not
    /// hold `width * height` entries or either dimension is zero.
    pub fn from_texels(width: u32, height: u32, texels: Vec<[f32; 4]>) -> Option<Self> {
        if width == 0 || height == 0 || texels.len() != (width as usize) * (height as usize) {
            return None;
        }

        let mut levels = vec![EnvironmentLevel { width, height, texels }];
        loop {
            let last = &levels[levels.len() - 1];
            if last.width == 1 && last.height == 1 {
                break;
            }
            let next = downsample(last);
            levels.push(next);
        }
        Some(Self { levels })
    }

    pub fn width(&self) -> u32 {
        self.levels[0].width
    }

    pub fn height(&self) -> u32 {
        self.levels[0].height
    }

    pub fn levels(&self) -> &[EnvironmentLevel] {
        &self.levels
    }

    pub fn mip_count(&self) -> u32 {
        self.levels.len() as u32
    }
}

fn downsample(src: &EnvironmentLevel) -> EnvironmentLevel {
    let width = (src.width / 2).max(1);
    let height = (src.height / 2).max(1);
    let mut texels = Vec::with_capacity((width * height) as usize);

    for y in 0..height {
        for x in 0..width {
            let mut sum = [0.0f32; 4];
            let mut n = 0.0;
            for sy in (y * 2)..(y * 2 + 2).min(src.height) {
                for sx in (x * 2)..(x * 2 + 2).min(src.width) {
                    let t = src.texels[(sy * src.width + sx) as usize];
                    for c in 0..4 {
                        sum[c] += t[c];
                    }
                    n += 1.0;
                }
            }
            texels.push(sum.map(|v| v / n));
        }
    }

    EnvironmentLevel { width, height, texels }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chain_reaches_one_texel() {
        let env = EnvironmentMap::from_texels(8, 4, vec![[1.0; 4]; 32]).unwrap();
        let dims: Vec<(u32, u32)> = env.levels().iter().map(|l| (l.width, l.height)).collect();
        assert_eq!(dims, [(8, 4), (4, 2), (2, 1), (1, 1)]);
    }

    #[test]
    fn mips_preserve_average_radiance() {
        let texels: Vec<[f32; 4]> = (0..16).map(|i| [i as f32, 0.0, 0.0, 1.0]).collect();
        let env = EnvironmentMap::from_texels(4, 4, texels).unwrap();
        let top = env.levels().last().unwrap();
        assert!((top.texels[0][0] - 7.5).abs() < 1e-5);
    }

    #[test]
    fn mismatched_length_is_rejected() {
        assert!(EnvironmentMap::from_texels(4, 4, vec![[0.0; 4]; 3]).is_none());
        assert!(EnvironmentMap::from_texels(0, 4, vec![]).is_none());
    }
}
