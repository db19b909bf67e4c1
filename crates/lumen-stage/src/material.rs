//! The scene's single physical material and the parameters it is built from.

use std::sync::Arc;

use lumen_engine::color::Color;
use lumen_engine::scene::{MaterialRef, PhysicalMaterial};
use lumen_engine::texture::{generate_concrete_sized, ConcreteParams, NormalMap, DEFAULT_CONCRETE_SIZE};

// Fixed for this scene, independent of the parameter record.
pub const METALNESS: f32 = 0.8;
pub const ENV_MAP_INTENSITY: f32 = 1.5;
pub const EMISSIVE: Color = Color::WHITE;
pub const EMISSIVE_INTENSITY: f32 = 0.5;

/// Knobs of the concrete material. Nothing is range-checked.
#[derive(Debug, Clone, PartialEq)]
pub struct MaterialParams {
    pub scale: f32,
    pub density: f32,
    pub bump: f32,
    pub seed: u32,
    pub color: Color,
    pub roughness_intensity: f32,
    pub normal_intensity: f32,
    pub ao_intensity: f32,
    pub bump_scale: f32,
    pub clearcoat: f32,
    pub clearcoat_roughness: f32,
    pub sheen: f32,
    pub sheen_roughness: f32,
    pub transmission: f32,
    pub thickness: f32,
    pub ior: f32,
}

impl Default for MaterialParams {
    fn default() -> Self {
        Self {
            scale: 3.0,
            density: 0.92,
            bump: 0.4,
            seed: 5026,
            color: Color::WHITE,
            roughness_intensity: 0.0,
            normal_intensity: 0.7,
            ao_intensity: 0.8,
            bump_scale: 0.15,
            clearcoat: 1.0,
            clearcoat_roughness: 0.0,
            sheen: 0.5,
            sheen_roughness: 0.8,
            transmission: 0.1,
            thickness: 0.2,
            ior: 1.5,
        }
    }
}

impl MaterialParams {
    /// Inputs of the procedural texture.
    pub fn concrete(&self) -> ConcreteParams {
        ConcreteParams {
            scale: self.scale,
            density: self.density,
            bump: self.bump,
            seed: self.seed,
        }
    }
}

/// Writes `params` into `material`, installing `texture` as its normal map.
pub fn configure_material(material: &mut PhysicalMaterial, params: &MaterialParams, texture: Arc<NormalMap>) {
    configure_plain_material(material, params);
    material.normal_map = Some(texture);
    material.normal_scale = [params.normal_intensity, params.normal_intensity];
    material.bump_scale = params.bump_scale;
    material.ao_map_intensity = params.ao_intensity;
}

/// The constant-only subset: no procedural texture and no texture scales.
pub fn configure_plain_material(material: &mut PhysicalMaterial, params: &MaterialParams) {
    material.color = params.color;
    material.roughness = params.roughness_intensity;
    material.metalness = METALNESS;
    material.env_map_intensity = ENV_MAP_INTENSITY;
    material.clearcoat = params.clearcoat;
    material.clearcoat_roughness = params.clearcoat_roughness;
    material.sheen = params.sheen;
    material.sheen_roughness = params.sheen_roughness;
    material.transmission = params.transmission;
    material.thickness = params.thickness;
    material.ior = params.ior;
    material.emissive = EMISSIVE;
    material.emissive_intensity = EMISSIVE_INTENSITY;
    material.normal_map = None;
}

/// Owns the shared material and keeps it in step with its parameters.
///
/// Every parameter change goes through [`set_params`](Self::set_params) or
/// [`update`](Self::update), both of which rebuild the material in place, so
/// every mesh holding the [`MaterialRef`] sees the new state.
#[derive(Debug)]
pub struct MaterialBuilder {
    material: MaterialRef,
    params: MaterialParams,
    procedural: bool,
    texture_size: u32,
    texture: Option<(ConcreteParams, Arc<NormalMap>)>,
    revision: u64,
}

impl MaterialBuilder {
    pub fn new(params: MaterialParams, procedural: bool) -> Self {
        Self::with_texture_size(params, procedural, DEFAULT_CONCRETE_SIZE)
    }

    pub fn with_texture_size(params: MaterialParams, procedural: bool, texture_size: u32) -> Self {
        let mut builder = Self {
            material: PhysicalMaterial::default().into_shared(),
            params,
            procedural,
            texture_size,
            texture: None,
            revision: 0,
        };
        builder.rebuild();
        builder
    }

    pub fn material(&self) -> &MaterialRef {
        &self.material
    }

    pub fn params(&self) -> &MaterialParams {
        &self.params
    }

    /// Number of rebuilds so far, starting at 1 after construction.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn set_params(&mut self, params: MaterialParams) {
        self.params = params;
        self.rebuild();
    }

    pub fn update(&mut self, f: impl FnOnce(&mut MaterialParams)) {
        f(&mut self.params);
        self.rebuild();
    }

    fn rebuild(&mut self) {
        let mut material = self.material.borrow_mut();
        if !self.procedural {
            configure_plain_material(&mut material, &self.params);
        } else {
            let inputs = self.params.concrete();
            let texture = match &self.texture {
                Some((built_from, map)) if *built_from == inputs => map.clone(),
                _ => {
                    log::debug!(
                        "generating concrete normals (scale {}, density {}, bump {}, seed {})",
                        inputs.scale,
                        inputs.density,
                        inputs.bump,
                        inputs.seed
                    );
                    let map = Arc::new(generate_concrete_sized(&inputs, self.texture_size));
                    self.texture = Some((inputs, map.clone()));
                    map
                }
            };
            configure_material(&mut material, &self.params, texture);
        }
        self.revision += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SIZE: u32 = 16;

    // ── configuration ────────────────────────────────────────────────────

    #[test]
    fn params_and_fixed_overrides_are_applied() {
        let b = MaterialBuilder::with_texture_size(MaterialParams::default(), true, SIZE);
        let m = b.material().borrow();
        assert_eq!(m.roughness, 0.0);
        assert_eq!(m.metalness, 0.8);
        assert_eq!(m.env_map_intensity, 1.5);
        assert_eq!(m.emissive, Color::WHITE);
        assert_eq!(m.emissive_intensity, 0.5);
        assert_eq!(m.clearcoat, 1.0);
        assert_eq!(m.sheen, 0.5);
        assert_eq!(m.sheen_roughness, 0.8);
        assert_eq!(m.transmission, 0.1);
        assert_eq!(m.thickness, 0.2);
        assert_eq!(m.ior, 1.5);
        assert_eq!(m.normal_scale, [0.7, 0.7]);
        assert_eq!(m.bump_scale, 0.15);
        assert_eq!(m.ao_map_intensity, 0.8);
        assert!(m.normal_map.is_some());
    }

    #[test]
    fn plain_profile_has_no_texture() {
        let b = MaterialBuilder::with_texture_size(MaterialParams::default(), false, SIZE);
        let m = b.material().borrow();
        assert!(m.normal_map.is_none());
        assert_eq!(m.metalness, 0.8);
        assert_eq!(m.normal_scale, PhysicalMaterial::default().normal_scale);
    }

    #[test]
    fn out_of_range_values_pass_through() {
        let params = MaterialParams { thickness: -1.0, roughness_intensity: -0.5, ..MaterialParams::default() };
        let b = MaterialBuilder::with_texture_size(params, true, SIZE);
        assert_eq!(b.material().borrow().thickness, -1.0);
        assert_eq!(b.material().borrow().roughness, -0.5);
    }

    // ── rebuild ──────────────────────────────────────────────────────────

    #[test]
    fn rebuild_with_same_params_is_identical() {
        let mut b = MaterialBuilder::with_texture_size(MaterialParams::default(), true, SIZE);
        let first = b.material().borrow().clone();
        b.set_params(MaterialParams::default());
        let second = b.material().borrow().clone();
        assert_eq!(first, second);
        assert_eq!(b.revision(), 2);

        let (Some(a), Some(c)) = (&first.normal_map, &second.normal_map) else {
            panic!("normal map missing");
        };
        assert!(Arc::ptr_eq(a, c), "texture regenerated for unchanged inputs");
    }

    #[test]
    fn rebuild_from_scratch_is_bit_identical() {
        let a = MaterialBuilder::with_texture_size(MaterialParams::default(), true, SIZE);
        let b = MaterialBuilder::with_texture_size(MaterialParams::default(), true, SIZE);
        assert_eq!(*a.material().borrow(), *b.material().borrow());
    }

    #[test]
    fn change_reaches_every_holder_of_the_handle() {
        let mut b = MaterialBuilder::with_texture_size(MaterialParams::default(), true, SIZE);
        let held = b.material().clone();
        let before = held.borrow().normal_map.clone();

        b.update(|p| {
            p.clearcoat = 0.25;
            p.seed = 7;
        });

        assert_eq!(held.borrow().clearcoat, 0.25);
        let after = held.borrow().normal_map.clone();
        assert_ne!(before, after, "seed change must regenerate the texture");
    }
}
