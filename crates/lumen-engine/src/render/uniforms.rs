//! CPU mirrors of the shader uniform blocks.
//!
//! Layouts match the WGSL structs field for field; every member is a vec4 or
//! mat4 so no implicit padding exists.

use bytemuck::{Pod, Zeroable};
use glam::{Mat3, Mat4};

use crate::scene::{Light, PerspectiveCamera, PhysicalMaterial, Scene};

/// Minimum dynamic uniform offset alignment guaranteed by wgpu.
pub const DRAW_UNIFORM_STRIDE: u64 = 256;

#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
pub struct FrameUniform {
    pub view_proj: [[f32; 4]; 4],
    pub view: [[f32; 4]; 4],
    pub shadow_view_proj: [[f32; 4]; 4],
    /// xyz camera position, w environment intensity.
    pub camera_pos: [f32; 4],
    /// xyz unit vector towards the light, w intensity.
    pub light_dir: [f32; 4],
    /// rgb light color, w 1 when shadows are sampled.
    pub light_color: [f32; 4],
    /// rgb ambient irradiance, w 1 when an environment is bound.
    pub ambient: [f32; 4],
    /// rgb fog color, w 1 when fog is on.
    pub fog_color: [f32; 4],
    /// fog near, fog far, shadow normal bias, shadow texel size.
    pub fog_shadow: [f32; 4],
}

impl FrameUniform {
    pub fn build(scene: &Scene, camera: &PerspectiveCamera, shadows: bool) -> Self {
        let mut light_dir = [0.0, 1.0, 0.0, 0.0];
        let mut light_color = [0.0; 4];
        let mut ambient = [0.0f32; 4];

        // One directional light is shaded; ambient lights accumulate.
        let mut have_sun = false;
        for light in scene.lights() {
            match light {
                Light::Directional(d) if !have_sun => {
                    have_sun = true;
                    let dir = d.to_light();
                    light_dir = [dir.x, dir.y, dir.z, d.intensity];
                    light_color = d.color.to_vec4(0.0);
                }
                Light::Directional(_) => {}
                Light::Ambient(a) => {
                    let c = a.color.scaled(a.intensity);
                    ambient[0] += c.r;
                    ambient[1] += c.g;
                    ambient[2] += c.b;
                }
            }
        }

        let caster = scene.shadow_caster().filter(|_| shadows);
        let (shadow_view_proj, normal_bias, texel) = match caster {
            Some(d) => {
                light_color[3] = 1.0;
                (
                    d.shadow_view_projection(),
                    d.shadow.normal_bias,
                    1.0 / d.shadow.map_size.max(1) as f32,
                )
            }
            None => (Mat4::IDENTITY, 0.0, 0.0),
        };

        ambient[3] = if scene.environment.is_some() { 1.0 } else { 0.0 };

        let (fog_color, fog_range) = match scene.fog {
            Some(f) => (f.color.to_vec4(1.0), [f.near, f.far]),
            None => ([0.0; 4], [0.0, 0.0]),
        };

        let p = camera.position;
        Self {
            view_proj: camera.view_projection().to_cols_array_2d(),
            view: camera.view_matrix().to_cols_array_2d(),
            shadow_view_proj: shadow_view_proj.to_cols_array_2d(),
            camera_pos: [p.x, p.y, p.z, scene.environment_intensity],
            light_dir,
            light_color,
            ambient,
            fog_color,
            fog_shadow: [fog_range[0], fog_range[1], normal_bias, texel],
        }
    }

    /// Radiance scale the shader applies to the scene environment.
    pub fn environment_intensity(&self) -> f32 {
        self.camera_pos[3]
    }
}

/// Per-draw block, addressed with a dynamic offset.
#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
pub struct DrawUniform {
    pub model: [[f32; 4]; 4],
    /// Inverse-transpose of the model matrix (upper 3×3 used).
    pub normal_matrix: [[f32; 4]; 4],
    pub material: MaterialUniform,
}

impl DrawUniform {
    pub fn new(model: Mat4, material: MaterialUniform) -> Self {
        let normal = Mat3::from_mat4(model).inverse().transpose();
        let normal = if normal.is_finite() { normal } else { Mat3::IDENTITY };
        Self {
            model: model.to_cols_array_2d(),
            normal_matrix: Mat4::from_mat3(normal).to_cols_array_2d(),
            material,
        }
    }
}

#[repr(C)]
#[derive(Debug, Copy, Clone, Default, PartialEq, Pod, Zeroable)]
pub struct MaterialUniform {
    /// rgb base color, a metalness.
    pub color: [f32; 4],
    /// roughness, clearcoat, clearcoat roughness, ior.
    pub surface: [f32; 4],
    /// rgb sheen color × sheen, a sheen roughness.
    pub sheen: [f32; 4],
    /// transmission, thickness, unused, normal map tiling.
    pub transmission: [f32; 4],
    /// rgb emissive radiance, a unused.
    pub emissive: [f32; 4],
    /// normal scale xy, z 1 with a normal map, w 1 when receiving shadows.
    pub normal: [f32; 4],
    pub _pad: [[f32; 4]; 2],
}

/// Object-space units per normal map tile.
pub const NORMAL_MAP_TILE: f32 = 1.0;

impl MaterialUniform {
    pub fn from_material(m: &PhysicalMaterial, receive_shadow: bool) -> Self {
        let sheen = m.sheen_color.scaled(m.sheen);
        let emissive = m.emissive_radiance();
        Self {
            color: m.color.to_vec4(m.metalness),
            surface: [m.roughness, m.clearcoat, m.clearcoat_roughness, m.ior],
            sheen: sheen.to_vec4(m.sheen_roughness),
            transmission: [m.transmission, m.thickness, 0.0, 1.0 / NORMAL_MAP_TILE],
            emissive: emissive.to_vec4(0.0),
            normal: [
                m.normal_scale[0],
                m.normal_scale[1],
                if m.normal_map.is_some() { 1.0 } else { 0.0 },
                if receive_shadow { 1.0 } else { 0.0 },
            ],
            _pad: [[0.0; 4]; 2],
        }
    }
}

/// Light-space matrix for the shadow pass.
#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
pub struct ShadowUniform {
    pub light_view_proj: [[f32; 4]; 4],
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Color;
    use crate::scene::{AmbientLight, DirectionalLight, RangeFog};
    use glam::Vec3;

    // ── layout ───────────────────────────────────────────────────────────

    #[test]
    fn sizes_match_shader_blocks() {
        assert_eq!(std::mem::size_of::<FrameUniform>(), 288);
        assert_eq!(std::mem::size_of::<MaterialUniform>(), 128);
        assert_eq!(std::mem::size_of::<DrawUniform>() as u64, DRAW_UNIFORM_STRIDE);
    }

    // ── packing ──────────────────────────────────────────────────────────

    #[test]
    fn frame_packs_lights_and_fog() {
        let mut scene = Scene::new();
        scene.fog = Some(RangeFog::new(Color::BLACK, 10.0, 15.0));
        scene.environment_intensity = 2.0;
        let mut sun = DirectionalLight::new(Color::WHITE, 0.5);
        sun.position = Vec3::new(5.0, 5.0, 5.0);
        sun.cast_shadow = true;
        sun.shadow.map_size = 2048;
        sun.shadow.normal_bias = 0.02;
        scene.add_light(sun);
        scene.add_light(AmbientLight::new(Color::WHITE, 0.2));

        let cam = PerspectiveCamera::new(25.0, 1.0, 0.1, 100.0);
        let u = FrameUniform::build(&scene, &cam, true);

        assert_eq!(u.light_dir[3], 0.5);
        assert!((u.light_dir[0] - 1.0 / 3f32.sqrt()).abs() < 1e-5);
        assert_eq!(u.light_color[3], 1.0);
        assert_eq!(u.ambient[..3], [0.2, 0.2, 0.2]);
        assert_eq!(u.camera_pos[3], 2.0);
        assert_eq!(u.fog_color[3], 1.0);
        assert_eq!(u.fog_shadow, [10.0, 15.0, 0.02, 1.0 / 2048.0]);

        let no_shadows = FrameUniform::build(&scene, &cam, false);
        assert_eq!(no_shadows.light_color[3], 0.0);
    }

    #[test]
    fn material_packs_sheen_and_emissive() {
        let m = PhysicalMaterial {
            sheen: 0.5,
            sheen_color: Color::WHITE,
            emissive: Color::WHITE,
            emissive_intensity: 0.5,
            ..PhysicalMaterial::default()
        };
        let u = MaterialUniform::from_material(&m, true);
        assert_eq!(u.sheen[..3], [0.5, 0.5, 0.5]);
        assert_eq!(u.emissive[..3], [0.5, 0.5, 0.5]);
        assert_eq!(u.normal[2], 0.0);
        assert_eq!(u.normal[3], 1.0);
    }

    #[test]
    fn scene_environment_ignores_material_env_intensity() {
        let mut scene = Scene::new();
        scene.environment_intensity = 1.0;
        let cam = PerspectiveCamera::new(25.0, 1.0, 0.1, 100.0);

        let m = PhysicalMaterial { env_map_intensity: 1.5, ..PhysicalMaterial::default() };
        let plain = MaterialUniform::from_material(&PhysicalMaterial::default(), true);
        assert_eq!(MaterialUniform::from_material(&m, true), plain);
        assert_eq!(FrameUniform::build(&scene, &cam, true).environment_intensity(), 1.0);
    }

    #[test]
    fn degenerate_model_matrix_falls_back() {
        let d = DrawUniform::new(Mat4::from_scale(Vec3::ZERO), MaterialUniform::default());
        assert_eq!(d.normal_matrix[0][0], 1.0);
    }
}
