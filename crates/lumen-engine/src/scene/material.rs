use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

use crate::color::Color;
use crate::texture::NormalMap;

/// Shared, mutable handle to a material. Meshes holding clones of the same
/// handle see every change.
pub type MaterialRef = Rc<RefCell<PhysicalMaterial>>;

/// Physically based material with clearcoat, sheen and transmission layers.
///
/// Values are not range-checked; the shader clamps where it has to.
#[derive(Debug, Clone, PartialEq)]
pub struct PhysicalMaterial {
    pub color: Color,
    pub roughness: f32,
    pub metalness: f32,

    pub clearcoat: f32,
    pub clearcoat_roughness: f32,

    pub sheen: f32,
    pub sheen_roughness: f32,
    pub sheen_color: Color,

    pub transmission: f32,
    pub thickness: f32,
    pub ior: f32,

    pub emissive: Color,
    pub emissive_intensity: f32,

    /// Scales a material-owned environment map. Meshes lit by the scene
    /// environment use `Scene::environment_intensity` alone.
    pub env_map_intensity: f32,

    pub normal_map: Option<Arc<NormalMap>>,
    pub normal_scale: [f32; 2],

    /// Carried for completeness; there is no bump map input.
    pub bump_scale: f32,
    /// Carried for completeness; there is no occlusion map input.
    pub ao_map_intensity: f32,
}

impl Default for PhysicalMaterial {
    fn default() -> Self {
        Self {
            color: Color::WHITE,
            roughness: 1.0,
            metalness: 0.0,
            clearcoat: 0.0,
            clearcoat_roughness: 0.0,
            sheen: 0.0,
            sheen_roughness: 1.0,
            sheen_color: Color::BLACK,
            transmission: 0.0,
            thickness: 0.0,
            ior: 1.5,
            emissive: Color::BLACK,
            emissive_intensity: 1.0,
            env_map_intensity: 1.0,
            normal_map: None,
            normal_scale: [1.0, 1.0],
            bump_scale: 1.0,
            ao_map_intensity: 1.0,
        }
    }
}

impl PhysicalMaterial {
    pub fn into_shared(self) -> MaterialRef {
        Rc::new(RefCell::new(self))
    }

    /// Emissive radiance (`emissive * emissive_intensity`).
    pub fn emissive_radiance(&self) -> Color {
        self.emissive.scaled(self.emissive_intensity)
    }
}
