//! Builds the logo scene and applies asset and resize events to it.

use std::sync::Arc;

use glam::Vec3;

use lumen_engine::assets::{AssetEvent, AssetKind, AssetLoader, ModelData};
use lumen_engine::color::Color;
use lumen_engine::controls::OrbitControls;
use lumen_engine::coords::Viewport;
use lumen_engine::render::{PostProcessing, RenderSettings};
use lumen_engine::scene::{
    AmbientLight, DirectionalLight, EnvironmentMap, LightId, PerspectiveCamera, RangeFog, Scene,
};

use crate::config::SceneConfig;
use crate::material::MaterialBuilder;
use crate::post::build_post_processing;

pub const FOG_NEAR: f32 = 10.0;
pub const FOG_FAR: f32 = 15.0;

pub const CAMERA_FOV_DEG: f32 = 25.0;
pub const CAMERA_NEAR: f32 = 0.1;
pub const CAMERA_FAR: f32 = 100.0;
pub const CAMERA_POSITION: Vec3 = Vec3::new(6.0, 3.0, 10.0);

pub const SUN_POSITION: Vec3 = Vec3::new(5.0, 5.0, 5.0);

// Lighting after the tune pass.
pub const TUNED_SUN_INTENSITY: f32 = 0.5;
pub const TUNED_AMBIENT_INTENSITY: f32 = 0.2;
pub const TUNED_ENVIRONMENT_INTENSITY: f32 = 2.0;

/// Scene intensity set when the environment map arrives.
pub const LOADED_ENVIRONMENT_INTENSITY: f32 = 1.0;

/// Everything the render loop needs, built once at startup.
pub struct SceneContext {
    pub scene: Scene,
    pub camera: PerspectiveCamera,
    pub controls: OrbitControls,
    pub settings: RenderSettings,
    pub post: PostProcessing,
    pub material: MaterialBuilder,
    pub sun: LightId,
    pub ambient: LightId,
    model_shadows: bool,
}

/// Builds the scene: background, fog, camera, controls, lights, post chain.
///
/// Assets are not requested here; see [`request_assets`].
pub fn build_scene(config: &SceneConfig, material: MaterialBuilder) -> SceneContext {
    let mut scene = Scene::new();
    scene.background = Some(Color::BLACK);
    scene.fog = Some(RangeFog::new(Color::BLACK, FOG_NEAR, FOG_FAR));

    let mut camera = PerspectiveCamera::new(CAMERA_FOV_DEG, 1.0, CAMERA_NEAR, CAMERA_FAR);
    camera.position = CAMERA_POSITION;
    camera.look_at(Vec3::ZERO);

    let mut controls = OrbitControls::new(&camera);
    controls.enable_damping = true;
    controls.damping_factor = 0.05;

    let mut sun = DirectionalLight::new(Color::from_u32(0xffffff), 1.0);
    sun.position = SUN_POSITION;
    sun.cast_shadow = true;
    sun.shadow.map_size = config.capabilities.shadow_map_size;
    sun.shadow.near = 0.1;
    sun.shadow.far = 100.0;
    sun.shadow.normal_bias = 0.02;
    let sun = scene.add_light(sun);
    let ambient = scene.add_light(AmbientLight::new(Color::from_u32(0xffffff), 0.5));

    let mut settings = RenderSettings::default();
    settings.clear_color = Color::BLACK;
    settings.tone_mapping_exposure = 1.0;
    settings.shadows = true;

    let post = if config.capabilities.post_processing {
        build_post_processing(&config.bloom)
    } else {
        PostProcessing::direct()
    };

    let mut ctx = SceneContext {
        scene,
        camera,
        controls,
        settings,
        post,
        material,
        sun,
        ambient,
        model_shadows: config.model_shadows,
    };
    apply_lighting_tune(&mut ctx);

    log::info!(
        "scene built ({:?} profile, post processing {})",
        config.profile,
        if config.capabilities.post_processing { "on" } else { "off" }
    );
    ctx
}

/// Final lighting levels, applied after construction in both profiles.
pub fn apply_lighting_tune(ctx: &mut SceneContext) {
    if let Some(sun) = ctx.scene.light_mut(ctx.sun) {
        sun.set_intensity(TUNED_SUN_INTENSITY);
    }
    if let Some(ambient) = ctx.scene.light_mut(ctx.ambient) {
        ambient.set_intensity(TUNED_AMBIENT_INTENSITY);
    }
    ctx.scene.environment_intensity = TUNED_ENVIRONMENT_INTENSITY;
}

/// Starts both loads. Their completion order is not assumed anywhere.
pub fn request_assets(config: &SceneConfig, loader: &AssetLoader) {
    loader.load_environment(config.asset_base.resolve(&config.environment));
    loader.load_model(config.asset_base.resolve(&config.model));
}

impl SceneContext {
    /// Applies one loader event. Failures are logged; the scene stays usable.
    pub fn apply_asset_event(&mut self, event: AssetEvent) {
        match event {
            AssetEvent::Progress { kind: AssetKind::Model, progress } => {
                log::info!("Loading model... {progress}");
            }
            AssetEvent::Progress { kind, progress } => {
                log::debug!("loading {}... {progress}", kind.label());
            }
            AssetEvent::EnvironmentLoaded(env) => self.install_environment(env),
            AssetEvent::ModelLoaded(model) => self.attach_model(model),
            AssetEvent::Failed { kind, location, error } => {
                log::error!("Error loading {} from {location}: {error}", kind.label());
            }
        }
    }

    /// Lighting and reflections only; the background stays black.
    pub fn install_environment(&mut self, env: EnvironmentMap) {
        log::info!("environment ready: {}x{}", env.width(), env.height());
        self.scene.environment = Some(Arc::new(env));
        self.scene.environment_intensity = LOADED_ENVIRONMENT_INTENSITY;
    }

    /// Puts the shared material on every mesh and attaches the model under
    /// the scene root.
    pub fn attach_model(&mut self, model: ModelData) {
        let shared = self.material.material().clone();
        let shadows = self.model_shadows;

        let mut node = model.into_node();
        if node.name.is_empty() {
            node.name = "model".to_string();
        }
        node.traverse_mut(&mut |n| {
            if let Some(mesh) = n.mesh.as_mut() {
                mesh.material = shared.clone();
                mesh.cast_shadow = shadows;
                mesh.receive_shadow = shadows;
            }
        });

        log::info!("model attached: {} meshes", node.mesh_count());
        self.scene.add(node);
    }

    /// Camera aspect and renderer size follow `viewport` in one step.
    pub fn handle_resize(&mut self, viewport: Viewport) {
        self.camera.aspect = viewport.aspect();
        self.camera.update_projection_matrix();
        self.settings.set_size(viewport.width, viewport.height);
        self.settings.set_pixel_ratio(viewport.device_pixel_ratio);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lumen_engine::assets::{AssetError, LoadProgress, MeshData, ModelNode};
    use lumen_engine::render::FrameUniform;
    use lumen_engine::scene::{Geometry, Light, Vertex};

    use crate::config::Profile;
    use crate::material::MaterialParams;

    fn context(profile: Profile) -> SceneContext {
        let config = SceneConfig::for_profile(profile);
        let material = MaterialBuilder::with_texture_size(MaterialParams::default(), false, 8);
        build_scene(&config, material)
    }

    fn triangle_mesh(material: Option<usize>) -> MeshData {
        let v = |x: f32, y: f32| Vertex { position: [x, y, 0.0], normal: [0.0, 0.0, 1.0], uv: [0.0, 0.0] };
        MeshData {
            geometry: Arc::new(Geometry::new(vec![v(0.0, 0.0), v(1.0, 0.0), v(0.0, 1.0)], vec![0, 1, 2])),
            material,
        }
    }

    fn two_mesh_model() -> ModelData {
        let child = ModelNode { name: "inner".into(), mesh: Some(triangle_mesh(Some(1))), ..ModelNode::default() };
        ModelData {
            root: ModelNode {
                name: "logo".into(),
                mesh: Some(triangle_mesh(Some(0))),
                children: vec![child],
                ..ModelNode::default()
            },
            materials: vec![Default::default(), Default::default()],
        }
    }

    fn flat_environment() -> EnvironmentMap {
        EnvironmentMap::from_texels(2, 1, vec![[1.0; 4]; 2]).unwrap()
    }

    // ── construction ─────────────────────────────────────────────────────

    #[test]
    fn scene_matches_the_logo_setup() {
        let ctx = context(Profile::Bundled);

        let fog = ctx.scene.fog.unwrap();
        assert_eq!((fog.near, fog.far), (10.0, 15.0));
        assert_eq!(fog.color, Color::BLACK);
        assert_eq!(ctx.scene.background, Some(Color::BLACK));

        assert_eq!(ctx.camera.fov_y_deg, 25.0);
        assert_eq!((ctx.camera.near, ctx.camera.far), (0.1, 100.0));
        assert_eq!(ctx.camera.position, Vec3::new(6.0, 3.0, 10.0));
        assert!(ctx.controls.enable_damping);
        assert_eq!(ctx.controls.damping_factor, 0.05);

        let Some(Light::Directional(sun)) = ctx.scene.light(ctx.sun) else {
            panic!("sun missing");
        };
        assert!(sun.cast_shadow);
        assert_eq!(sun.shadow.map_size, 2048);
        assert_eq!((sun.shadow.near, sun.shadow.far), (0.1, 100.0));
        assert_eq!(sun.shadow.normal_bias, 0.02);
        assert!(ctx.post.bloom.is_some());
    }

    #[test]
    fn tune_pass_sets_final_lighting() {
        let ctx = context(Profile::Embed);
        assert_eq!(ctx.scene.light(ctx.sun).map(Light::intensity), Some(0.5));
        assert_eq!(ctx.scene.light(ctx.ambient).map(Light::intensity), Some(0.2));
        assert_eq!(ctx.scene.environment_intensity, 2.0);
        assert_eq!(ctx.post, PostProcessing::direct());
    }

    #[test]
    fn fog_ramps_linearly_between_near_and_far() {
        let fog = context(Profile::Bundled).scene.fog.unwrap();
        assert_eq!(fog.factor(10.0), 0.0);
        assert!((fog.factor(12.5) - 0.5).abs() < 1e-6);
        assert_eq!(fog.factor(15.0), 1.0);
    }

    // ── asset events ─────────────────────────────────────────────────────

    #[test]
    fn model_meshes_share_the_one_material() {
        let mut ctx = context(Profile::Bundled);
        ctx.apply_asset_event(AssetEvent::ModelLoaded(two_mesh_model()));

        let shared = ctx.material.material().clone();
        let model = ctx.scene.root.find("logo").expect("model under root");
        let mut meshes = 0;
        model.traverse(&mut |n| {
            if let Some(mesh) = &n.mesh {
                meshes += 1;
                assert!(mesh.uses_material(&shared));
            }
        });
        assert_eq!(meshes, 2);

        ctx.material.update(|p| p.clearcoat = 0.3);
        ctx.scene.root.traverse(&mut |n| {
            if let Some(mesh) = &n.mesh {
                assert_eq!(mesh.material.borrow().clearcoat, 0.3);
            }
        });
    }

    #[test]
    fn environment_failure_does_not_block_the_model() {
        let mut ctx = context(Profile::Bundled);
        ctx.apply_asset_event(AssetEvent::Failed {
            kind: AssetKind::Environment,
            location: "missing.hdr".into(),
            error: AssetError::Read {
                location: "missing.hdr".into(),
                source: std::io::Error::from(std::io::ErrorKind::NotFound),
            },
        });
        ctx.apply_asset_event(AssetEvent::Progress {
            kind: AssetKind::Model,
            progress: LoadProgress { loaded: 50, total: Some(100) },
        });
        ctx.apply_asset_event(AssetEvent::ModelLoaded(two_mesh_model()));

        assert!(ctx.scene.environment.is_none());
        assert_eq!(ctx.scene.root.mesh_count(), 2);
    }

    #[test]
    fn environment_is_installed_in_either_order() {
        let mut first = context(Profile::Bundled);
        first.apply_asset_event(AssetEvent::EnvironmentLoaded(flat_environment()));
        first.apply_asset_event(AssetEvent::ModelLoaded(two_mesh_model()));

        let mut second = context(Profile::Bundled);
        second.apply_asset_event(AssetEvent::ModelLoaded(two_mesh_model()));
        second.apply_asset_event(AssetEvent::EnvironmentLoaded(flat_environment()));

        for ctx in [&first, &second] {
            assert!(ctx.scene.environment.is_some());
            assert_eq!(ctx.scene.environment_intensity, 1.0);
            assert_eq!(ctx.scene.background, Some(Color::BLACK));
            assert_eq!(ctx.scene.root.mesh_count(), 2);
        }
    }

    #[test]
    fn loaded_environment_lights_at_unit_intensity() {
        let mut ctx = context(Profile::Bundled);
        assert_eq!(FrameUniform::build(&ctx.scene, &ctx.camera, true).environment_intensity(), 2.0);

        ctx.apply_asset_event(AssetEvent::EnvironmentLoaded(flat_environment()));
        assert_eq!(ctx.material.material().borrow().env_map_intensity, 1.5);
        assert_eq!(FrameUniform::build(&ctx.scene, &ctx.camera, true).environment_intensity(), 1.0);
    }

    // ── resize ───────────────────────────────────────────────────────────

    #[test]
    fn resize_updates_camera_and_renderer_together() {
        let mut ctx = context(Profile::Bundled);
        for (w, h, dpr) in [(1280.0, 720.0, 1.0), (800.0, 1200.0, 3.0), (333.0, 111.0, 2.5)] {
            ctx.handle_resize(Viewport::new(w, h, dpr));
            assert_eq!(ctx.camera.aspect, w / h);
            assert_eq!((ctx.settings.width, ctx.settings.height), (w, h));
            assert!(ctx.settings.pixel_ratio() <= 2.0);
        }
        assert_eq!(ctx.settings.pixel_ratio(), 2.0);

        let expected = glam::Mat4::perspective_rh(25f32.to_radians(), 333.0 / 111.0, 0.1, 100.0);
        assert!(ctx.camera.projection_matrix().abs_diff_eq(expected, 1e-5));
    }
}
