//! Scene graph types.
//!
//! Everything here lives on the main thread. Meshes share materials through
//! [`MaterialRef`]; geometry is immutable and shared through `Arc`.

mod camera;
mod environment;
mod fog;
mod geometry;
mod graph;
mod light;
mod material;

pub use camera::PerspectiveCamera;
pub use environment::{EnvironmentLevel, EnvironmentMap};
pub use fog::RangeFog;
pub use geometry::{compute_vertex_normals, Geometry, GeometryId, Vertex};
pub use graph::{Mesh, Node};
pub use light::{AmbientLight, DirectionalLight, Light, LightId, ShadowConfig};
pub use material::{MaterialRef, PhysicalMaterial};

use std::sync::Arc;

use crate::color::Color;

/// Root container: background, fog, environment, lights and the node tree.
#[derive(Debug)]
pub struct Scene {
    /// Color the frame is cleared to. `None` falls back to the renderer's
    /// clear color.
    pub background: Option<Color>,
    pub fog: Option<RangeFog>,
    /// Used for lighting and reflections only, never drawn as background.
    pub environment: Option<Arc<EnvironmentMap>>,
    pub environment_intensity: f32,
    pub root: Node,
    lights: Vec<Light>,
}

impl Default for Scene {
    fn default() -> Self {
        Self {
            background: None,
            fog: None,
            environment: None,
            environment_intensity: 1.0,
            root: Node::new("root"),
            lights: Vec::new(),
        }
    }
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_light(&mut self, light: impl Into<Light>) -> LightId {
        self.lights.push(light.into());
        LightId(self.lights.len() - 1)
    }

    pub fn light(&self, id: LightId) -> Option<&Light> {
        self.lights.get(id.0)
    }

    pub fn light_mut(&mut self, id: LightId) -> Option<&mut Light> {
        self.lights.get_mut(id.0)
    }

    pub fn lights(&self) -> &[Light] {
        &self.lights
    }

    /// First shadow-casting directional light, if any.
    pub fn shadow_caster(&self) -> Option<&DirectionalLight> {
        self.lights.iter().find_map(|l| match l {
            Light::Directional(d) if d.cast_shadow => Some(d),
            _ => None,
        })
    }

    /// Attaches `node` under the root.
    pub fn add(&mut self, node: Node) {
        self.root.add_child(node);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn light_handles_address_their_light() {
        let mut scene = Scene::new();
        let sun = scene.add_light(DirectionalLight::new(Color::WHITE, 1.0));
        let amb = scene.add_light(AmbientLight::new(Color::WHITE, 0.5));

        if let Some(l) = scene.light_mut(amb) {
            l.set_intensity(0.2);
        }

        assert_eq!(scene.light(sun).map(Light::intensity), Some(1.0));
        assert_eq!(scene.light(amb).map(Light::intensity), Some(0.2));
        assert!(scene.light(LightId(9)).is_none());
    }

    #[test]
    fn shadow_caster_requires_cast_shadow() {
        let mut scene = Scene::new();
        let id = scene.add_light(DirectionalLight::new(Color::WHITE, 1.0));
        assert!(scene.shadow_caster().is_none());

        if let Some(Light::Directional(d)) = scene.light_mut(id) {
            d.cast_shadow = true;
        }
        assert!(scene.shadow_caster().is_some());
    }
}
