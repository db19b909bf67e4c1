/// Upper bound applied to the device pixel ratio when sizing render targets.
///
/// Rendering above 2x costs fill rate without a visible gain on this scene.
pub const MAX_PIXEL_RATIO: f32 = 2.0;

/// Window viewport: logical size plus the device pixel ratio reported by the
/// platform (winit scale factor).
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
    pub device_pixel_ratio: f32,
}

impl Viewport {
    #[inline]
    pub const fn new(width: f32, height: f32, device_pixel_ratio: f32) -> Self {
        Self { width, height, device_pixel_ratio }
    }

    /// Builds a viewport from a physical size and scale factor.
    pub fn from_physical(width: u32, height: u32, scale_factor: f64) -> Self {
        let scale = if scale_factor.is_finite() && scale_factor > 0.0 { scale_factor } else { 1.0 };
        Self {
            width: (width as f64 / scale) as f32,
            height: (height as f64 / scale) as f32,
            device_pixel_ratio: scale as f32,
        }
    }

    /// Width over height. Zero-height viewports (minimized windows) report 1.
    #[inline]
    pub fn aspect(self) -> f32 {
        if self.height > 0.0 { self.width / self.height } else { 1.0 }
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(1280.0, 720.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_physical_divides_by_scale() {
        let v = Viewport::from_physical(2560, 1440, 2.0);
        assert_eq!(v.width, 1280.0);
        assert_eq!(v.height, 720.0);
        assert_eq!(v.device_pixel_ratio, 2.0);
    }

    #[test]
    fn from_physical_rejects_bogus_scale() {
        let v = Viewport::from_physical(800, 600, 0.0);
        assert_eq!(v.device_pixel_ratio, 1.0);
        assert_eq!(v.width, 800.0);
    }

    #[test]
    fn aspect_of_degenerate_viewport_is_one() {
        assert_eq!(Viewport::new(100.0, 0.0, 1.0).aspect(), 1.0);
    }
}
