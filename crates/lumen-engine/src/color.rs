//! Linear RGB color.

/// Linear (not sRGB-encoded) RGB color.
///
/// Hex and byte constructors decode sRGB, matching how CSS-style color
/// literals are interpreted by web renderers.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Color {
    pub const BLACK: Color = Color::linear(0.0, 0.0, 0.0);
    pub const WHITE: Color = Color::linear(1.0, 1.0, 1.0);

    #[inline]
    pub const fn linear(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    /// Decodes straight sRGB bytes.
    pub fn from_srgb_u8(r: u8, g: u8, b: u8) -> Self {
        Self {
            r: srgb_to_linear(r as f32 / 255.0),
            g: srgb_to_linear(g as f32 / 255.0),
            b: srgb_to_linear(b as f32 / 255.0),
        }
    }

    /// Parses `#rrggbb`, `rrggbb` or `#rgb`.
    pub fn from_hex(hex: &str) -> Option<Self> {
        let digits = hex.strip_prefix('#').unwrap_or(hex);
        if !digits.is_ascii() {
            return None;
        }
        let byte = |s: &str| u8::from_str_radix(s, 16).ok();

        match digits.len() {
            6 => Some(Self::from_srgb_u8(
                byte(&digits[0..2])?,
                byte(&digits[2..4])?,
                byte(&digits[4..6])?,
            )),
            3 => {
                let nib = |i: usize| byte(&digits[i..i + 1]).map(|v| v * 17);
                Some(Self::from_srgb_u8(nib(0)?, nib(1)?, nib(2)?))
            }
            _ => None,
        }
    }

    /// Parses a 0xRRGGBB integer, the form light colors are usually given in.
    pub fn from_u32(rgb: u32) -> Self {
        Self::from_srgb_u8((rgb >> 16) as u8, (rgb >> 8) as u8, rgb as u8)
    }

    #[inline]
    pub fn scaled(self, k: f32) -> Self {
        Self::linear(self.r * k, self.g * k, self.b * k)
    }

    #[inline]
    pub fn to_array(self) -> [f32; 3] {
        [self.r, self.g, self.b]
    }

    /// `[r, g, b, w]` for uniform packing.
    #[inline]
    pub fn to_vec4(self, w: f32) -> [f32; 4] {
        [self.r, self.g, self.b, w]
    }

    pub fn to_wgpu(self) -> wgpu::Color {
        wgpu::Color { r: self.r as f64, g: self.g as f64, b: self.b as f64, a: 1.0 }
    }
}

fn srgb_to_linear(c: f32) -> f32 {
    if c <= 0.04045 { c / 12.92 } else { ((c + 0.055) / 1.055).powf(2.4) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_white_and_black() {
        assert_eq!(Color::from_hex("#ffffff"), Some(Color::WHITE));
        assert_eq!(Color::from_hex("#000000"), Some(Color::BLACK));
        assert_eq!(Color::from_hex("fff"), Some(Color::WHITE));
    }

    #[test]
    fn hex_rejects_garbage() {
        assert_eq!(Color::from_hex("#12345"), None);
        assert_eq!(Color::from_hex("#gggggg"), None);
    }

    #[test]
    fn mid_grey_is_decoded_to_linear() {
        let c = Color::from_hex("#808080").unwrap();
        assert!((c.r - 0.2158).abs() < 1e-3, "got {}", c.r);
    }

    #[test]
    fn u32_matches_hex() {
        assert_eq!(Color::from_u32(0xffffff), Color::WHITE);
        assert_eq!(Color::from_u32(0x336699), Color::from_hex("#336699").unwrap());
    }
}
