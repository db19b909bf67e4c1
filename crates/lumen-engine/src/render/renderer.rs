use std::sync::Arc;

use glam::Mat4;

use crate::color::Color;
use crate::scene::{Geometry, PerspectiveCamera, Scene};
use crate::texture::NormalMap;

use super::bloom::BloomPass;
use super::ctx::{RenderCtx, RenderTarget};
use super::mesh::MeshCache;
use super::output::{OutputPass, OutputUniform};
use super::pbr::PbrPass;
use super::post::PostProcessing;
use super::settings::RenderSettings;
use super::shadow::ShadowPass;
use super::targets::SceneTargets;
use super::uniforms::{DrawUniform, FrameUniform, MaterialUniform};

/// One mesh instance flattened out of the scene graph for this frame.
pub(super) struct DrawItem {
    pub geometry: Arc<Geometry>,
    pub uniform: DrawUniform,
    pub normal_map: Option<Arc<NormalMap>>,
    pub cast_shadow: bool,
}

/// Scene background when set, otherwise the renderer clear color.
pub(super) fn clear_color(scene: &Scene, settings: &RenderSettings) -> Color {
    scene.background.unwrap_or(settings.clear_color)
}

/// Flattens the scene graph, snapshotting material state.
pub(super) fn collect_draws(scene: &Scene) -> Vec<DrawItem> {
    let mut draws = Vec::new();
    scene.root.visit_meshes(Mat4::IDENTITY, &mut |world, mesh| {
        if mesh.geometry.indices().is_empty() {
            return;
        }
        let material = mesh.material.borrow();
        draws.push(DrawItem {
            geometry: mesh.geometry.clone(),
            uniform: DrawUniform::new(world, MaterialUniform::from_material(&material, mesh.receive_shadow)),
            normal_map: material.normal_map.clone(),
            cast_shadow: mesh.cast_shadow,
        });
    });
    draws
}

/// Forward renderer for a [`Scene`]: shadow map, HDR scene pass with MSAA,
/// optional bloom, tone-mapped output to the surface.
///
/// GPU objects are created on first use and rebuilt when the surface format,
/// internal resolution or sample count changes.
#[derive(Default)]
pub struct SceneRenderer {
    pbr: Option<PbrPass>,
    shadow: Option<ShadowPass>,
    bloom: Option<BloomPass>,
    output: Option<OutputPass>,
    targets: Option<SceneTargets>,
    meshes: MeshCache,
}

impl SceneRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn render(
        &mut self,
        ctx: &RenderCtx<'_>,
        target: &mut RenderTarget<'_>,
        scene: &Scene,
        camera: &PerspectiveCamera,
        settings: &RenderSettings,
        post: &PostProcessing,
    ) {
        let device = ctx.device;
        let queue = ctx.queue;

        self.ensure_passes(ctx);
        let targets_changed = self.ensure_targets(device, settings);

        let (Some(pbr), Some(shadow), Some(output), Some(targets)) =
            (self.pbr.as_mut(), self.shadow.as_mut(), self.output.as_mut(), self.targets.as_ref())
        else {
            return;
        };

        if targets_changed {
            output.invalidate();
            if let Some(bloom) = self.bloom.as_mut() {
                bloom.invalidate();
            }
        }

        // ── scene data ───────────────────────────────────────────────────

        let draws = collect_draws(scene);
        self.meshes.begin_frame();
        for item in &draws {
            self.meshes.prepare(device, &item.geometry);
        }

        let caster = scene.shadow_caster().filter(|_| settings.shadows);
        if let Some(light) = caster {
            if shadow.ensure_size(device, light.shadow.map_size) {
                pbr.invalidate_frame_bindings();
            }
        }

        let frame = FrameUniform::build(scene, camera, caster.is_some());
        pbr.prepare_environment(device, queue, scene.environment.as_ref());
        pbr.prepare_normal_maps(device, queue, &draws);
        pbr.write_uniforms(device, queue, &frame, &draws);
        pbr.ensure_pipeline(device, targets.samples);

        // ── passes ───────────────────────────────────────────────────────

        if let Some(light) = caster {
            shadow.render(
                queue,
                target.encoder,
                light.shadow_view_projection(),
                &draws,
                pbr.draw_bind_group(),
                &self.meshes,
            );
        }

        pbr.render(
            device,
            target.encoder,
            targets,
            shadow.map_view(),
            clear_color(scene, settings).to_wgpu(),
            &draws,
            &self.meshes,
        );

        let bloom_view = match &post.bloom {
            Some(bloom_settings) => {
                let bloom = self.bloom.get_or_insert_with(|| BloomPass::new(device));
                bloom.render(device, queue, target.encoder, &targets.color_view, targets.size, bloom_settings)
            }
            None => None,
        };

        let params = OutputUniform::new(post, settings, bloom_view.is_some(), ctx.surface_format);
        output.render(
            device,
            queue,
            target.encoder,
            target.color_view,
            ctx.surface_format,
            &targets.color_view,
            bloom_view,
            params,
        );

        self.meshes.retain_used();
    }

    fn ensure_passes(&mut self, ctx: &RenderCtx<'_>) {
        if self.pbr.is_none() {
            log::debug!("creating scene renderer pipelines");
            self.pbr = Some(PbrPass::new(ctx.device, ctx.queue));
        }
        if self.shadow.is_none() {
            if let Some(pbr) = self.pbr.as_ref() {
                self.shadow = Some(ShadowPass::new(ctx.device, pbr.draw_bgl()));
            }
        }
        if self.output.is_none() {
            self.output = Some(OutputPass::new(ctx.device, ctx.queue));
        }
    }

    /// Returns whether the targets were (re)allocated.
    fn ensure_targets(&mut self, device: &wgpu::Device, settings: &RenderSettings) -> bool {
        let size = settings.drawing_buffer_size();
        let max = device.limits().max_texture_dimension_2d;
        let size = (size.0.min(max), size.1.min(max));

        if self.targets.as_ref().is_some_and(|t| t.matches(size, settings.msaa_samples)) {
            return false;
        }
        self.targets = Some(SceneTargets::new(device, size, settings.msaa_samples));
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{Mesh, Node, PhysicalMaterial, Vertex};
    use glam::Vec3;

    fn triangle() -> Arc<Geometry> {
        let v = |x: f32, y: f32| Vertex { position: [x, y, 0.0], normal: [0.0, 0.0, 1.0], uv: [0.0, 0.0] };
        Arc::new(Geometry::new(vec![v(0.0, 0.0), v(1.0, 0.0), v(0.0, 1.0)], vec![0, 1, 2]))
    }

    #[test]
    fn draws_accumulate_transforms_and_share_material_state() {
        let material = PhysicalMaterial { roughness: 0.25, ..PhysicalMaterial::default() }.into_shared();

        let mut parent = Node::new("parent").with_transform(Mat4::from_translation(Vec3::X));
        parent.add_child(
            Node::new("child")
                .with_transform(Mat4::from_translation(Vec3::Y))
                .with_mesh(Mesh::new(triangle(), material.clone())),
        );
        parent.mesh = Some(Mesh::new(triangle(), material.clone()));

        let mut scene = Scene::new();
        scene.add(parent);

        let draws = collect_draws(&scene);
        assert_eq!(draws.len(), 2);

        let child = Mat4::from_cols_array_2d(&draws[1].uniform.model);
        assert_eq!(child.w_axis.truncate(), Vec3::new(1.0, 1.0, 0.0));
        assert!(draws.iter().all(|d| d.uniform.material.surface[0] == 0.25));

        material.borrow_mut().roughness = 0.5;
        assert!(collect_draws(&scene).iter().all(|d| d.uniform.material.surface[0] == 0.5));
    }

    #[test]
    fn empty_scene_draws_nothing() {
        assert!(collect_draws(&Scene::new()).is_empty());
    }

    // ── clear color ──────────────────────────────────────────────────────

    #[test]
    fn background_overrides_renderer_clear_color() {
        let mut settings = RenderSettings::default();
        settings.clear_color = Color::WHITE;
        let mut scene = Scene::new();
        assert_eq!(clear_color(&scene, &settings), Color::WHITE);

        let navy = Color::linear(0.0, 0.0, 0.2);
        scene.background = Some(navy);
        assert_eq!(clear_color(&scene, &settings), navy);
    }
}
