use crate::color::Color;
use crate::coords::MAX_PIXEL_RATIO;

/// Renderer state owned by the application: output size, pixel ratio, clear
/// color and tone mapping exposure.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderSettings {
    /// Logical width.
    pub width: f32,
    /// Logical height.
    pub height: f32,
    pixel_ratio: f32,
    pub clear_color: Color,
    pub tone_mapping_exposure: f32,
    pub shadows: bool,
    /// 1 or 4.
    pub msaa_samples: u32,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            width: 1280.0,
            height: 720.0,
            pixel_ratio: 1.0,
            clear_color: Color::BLACK,
            tone_mapping_exposure: 1.0,
            shadows: true,
            msaa_samples: 4,
        }
    }
}

impl RenderSettings {
    pub fn set_size(&mut self, width: f32, height: f32) {
        self.width = width.max(0.0);
        self.height = height.max(0.0);
    }

    /// Stores `min(ratio, 2)`.
    pub fn set_pixel_ratio(&mut self, ratio: f32) {
        self.pixel_ratio = if ratio.is_finite() && ratio > 0.0 {
            ratio.min(MAX_PIXEL_RATIO)
        } else {
            1.0
        };
    }

    pub fn pixel_ratio(&self) -> f32 {
        self.pixel_ratio
    }

    /// Internal render resolution in pixels, at least 1×1.
    pub fn drawing_buffer_size(&self) -> (u32, u32) {
        let w = (self.width * self.pixel_ratio).round().max(1.0) as u32;
        let h = (self.height * self.pixel_ratio).round().max(1.0) as u32;
        (w, h)
    }
}
