use crate::color::Color;

/// Distance fog blending to `color` between `near` and `far` view depth.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct RangeFog {
    pub color: Color,
    pub near: f32,
    pub far: f32,
}

impl RangeFog {
    pub fn new(color: Color, near: f32, far: f32) -> Self {
        Self { color, near, far }
    }

    /// Linear fog amount at view depth `depth`: 0 at `near`, 1 at `far`.
    pub fn factor(&self, depth: f32) -> f32 {
        let span = self.far - self.near;
        if span <= 0.0 {
            return if depth >= self.far { 1.0 } else { 0.0 };
        }
        ((depth - self.near) / span).clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn factor_is_linear_between_near_and_far() {
        let fog = RangeFog::new(Color::BLACK, 10.0, 15.0);
        assert_eq!(fog.factor(10.0), 0.0);
        assert!((fog.factor(12.5) - 0.5).abs() < 1e-6);
        assert_eq!(fog.factor(15.0), 1.0);
    }

    #[test]
    fn factor_clamps_outside_range() {
        let fog = RangeFog::new(Color::BLACK, 10.0, 15.0);
        assert_eq!(fog.factor(0.0), 0.0);
        assert_eq!(fog.factor(99.0), 1.0);
    }

    #[test]
    fn degenerate_range_is_a_step() {
        let fog = RangeFog::new(Color::BLACK, 5.0, 5.0);
        assert_eq!(fog.factor(4.9), 0.0);
        assert_eq!(fog.factor(5.0), 1.0);
    }
}
