use glam::{Mat4, Vec3};

use crate::color::Color;

/// Handle returned by [`Scene::add_light`](super::Scene::add_light).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct LightId(pub(crate) usize);

/// Shadow map parameters for a directional light.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ShadowConfig {
    /// Square map edge in texels.
    pub map_size: u32,
    pub near: f32,
    pub far: f32,
    /// Half extent of the orthographic shadow frustum.
    pub extent: f32,
    /// Depth bias in light clip space.
    pub bias: f32,
    /// World-space offset along the surface normal before lookup.
    pub normal_bias: f32,
}

impl Default for ShadowConfig {
    fn default() -> Self {
        Self {
            map_size: 512,
            near: 0.5,
            far: 500.0,
            extent: 5.0,
            bias: 0.0,
            normal_bias: 0.0,
        }
    }
}

/// Parallel light shining from `position` towards `target`.
#[derive(Debug, Clone, PartialEq)]
pub struct DirectionalLight {
    pub color: Color,
    pub intensity: f32,
    pub position: Vec3,
    pub target: Vec3,
    pub cast_shadow: bool,
    pub shadow: ShadowConfig,
}

impl DirectionalLight {
    pub fn new(color: Color, intensity: f32) -> Self {
        Self {
            color,
            intensity,
            position: Vec3::Y,
            target: Vec3::ZERO,
            cast_shadow: false,
            shadow: ShadowConfig::default(),
        }
    }

    /// Unit vector from the surface towards the light.
    pub fn to_light(&self) -> Vec3 {
        (self.position - self.target).normalize_or(Vec3::Y)
    }

    /// Orthographic view-projection of the shadow camera.
    pub fn shadow_view_projection(&self) -> Mat4 {
        let dir = self.to_light();
        let up = if dir.abs_diff_eq(Vec3::Y, 1e-4) || dir.abs_diff_eq(-Vec3::Y, 1e-4) {
            Vec3::Z
        } else {
            Vec3::Y
        };
        let view = Mat4::look_at_rh(self.position, self.target, up);
        let e = self.shadow.extent;
        let proj = Mat4::orthographic_rh(-e, e, -e, e, self.shadow.near, self.shadow.far);
        proj * view
    }
}

/// Uniform light applied to every surface.
#[derive(Debug, Clone, PartialEq)]
pub struct AmbientLight {
    pub color: Color,
    pub intensity: f32,
}

impl AmbientLight {
    pub fn new(color: Color, intensity: f32) -> Self {
        Self { color, intensity }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Light {
    Directional(DirectionalLight),
    Ambient(AmbientLight),
}

impl Light {
    pub fn intensity(&self) -> f32 {
        match self {
            Light::Directional(l) => l.intensity,
            Light::Ambient(l) => l.intensity,
        }
    }

    pub fn set_intensity(&mut self, intensity: f32) {
        match self {
            Light::Directional(l) => l.intensity = intensity,
            Light::Ambient(l) => l.intensity = intensity,
        }
    }
}

impl From<DirectionalLight> for Light {
    fn from(l: DirectionalLight) -> Self {
        Light::Directional(l)
    }
}

impl From<AmbientLight> for Light {
    fn from(l: AmbientLight) -> Self {
        Light::Ambient(l)
    }
}
