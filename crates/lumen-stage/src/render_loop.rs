//! Per-frame driver: drain asset events, advance controls, render.

use winit::event::WindowEvent;
use winit::keyboard::{Key, NamedKey};

use lumen_engine::assets::AssetLoader;
use lumen_engine::core::{App, AppControl, FrameCtx};
use lumen_engine::coords::Viewport;
use lumen_engine::render::SceneRenderer;
use lumen_engine::time::FrameStats;

use crate::assembler::SceneContext;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum LoopState {
    /// No frame has run yet.
    Idle,
    /// Ticking once per display refresh until the window closes.
    Running,
}

/// Scene state plus the tick ordering, independent of any GPU.
pub struct LoopDriver {
    state: LoopState,
    frames: u64,
    pub context: SceneContext,
    loader: AssetLoader,
}

impl LoopDriver {
    pub fn new(context: SceneContext, loader: AssetLoader) -> Self {
        Self {
            state: LoopState::Idle,
            frames: 0,
            context,
            loader,
        }
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn loader(&self) -> &AssetLoader {
        &self.loader
    }

    /// One frame. `render` sees the scene after events and controls have
    /// been applied.
    pub fn tick<R>(&mut self, render: R)
    where
        R: FnOnce(&SceneContext),
    {
        if self.state == LoopState::Idle {
            log::debug!("render loop running");
            self.state = LoopState::Running;
        }

        for event in self.loader.poll() {
            self.context.apply_asset_event(event);
        }

        let ctx = &mut self.context;
        ctx.controls.update(&mut ctx.camera);

        render(&self.context);
        self.frames += 1;
    }
}

/// [`App`] implementation: routes input to the controls and renders each
/// tick through [`SceneRenderer`].
pub struct RenderLoop {
    driver: LoopDriver,
    renderer: SceneRenderer,
    stats: FrameStats,
}

const STATS_WINDOW: u32 = 240;

impl RenderLoop {
    pub fn new(context: SceneContext, loader: AssetLoader) -> Self {
        Self {
            driver: LoopDriver::new(context, loader),
            renderer: SceneRenderer::new(),
            stats: FrameStats::new(STATS_WINDOW),
        }
    }

    pub fn driver(&self) -> &LoopDriver {
        &self.driver
    }
}

impl App for RenderLoop {
    fn on_resize(&mut self, viewport: Viewport) {
        self.driver.context.handle_resize(viewport);
    }

    fn on_window_event(&mut self, event: &WindowEvent) -> AppControl {
        match event {
            WindowEvent::KeyboardInput { event, .. }
                if event.state.is_pressed() && event.logical_key == Key::Named(NamedKey::Escape) =>
            {
                log::info!("escape pressed after {} frames", self.driver.frames());
                AppControl::Exit
            }
            _ => AppControl::Continue,
        }
    }

    fn on_frame(&mut self, ctx: &mut FrameCtx<'_, '_>) -> AppControl {
        {
            let scene = &mut self.driver.context;
            let height = scene.settings.height;
            scene.controls.handle_input(&scene.camera, ctx.input, ctx.input_frame, height);
        }

        let renderer = &mut self.renderer;
        let mut control = AppControl::Continue;
        self.driver.tick(|scene| {
            control = ctx.render(|rctx, target| {
                renderer.render(rctx, target, &scene.scene, &scene.camera, &scene.settings, &scene.post);
            });
        });
        if self.stats.record(ctx.time.dt).is_some() {
            if let Some(fps) = self.stats.fps() {
                log::debug!("{fps:.1} fps");
            }
        }
        control
    }
}
