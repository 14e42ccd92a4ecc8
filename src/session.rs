//! The session controller.
//!
//! [`SceneSession`] owns the [`SceneContext`] together with the loader, the
//! animation binder and the render loop, and is the only thing hosts talk
//! to. Independent sessions share nothing, so several stages can coexist
//! and tests can run one without a window or a GPU.

use crate::{
    animation::{AnimationBinder, AnimationStatus, MotionPreference, ScrollSample},
    config::StageConfig,
    data_structures::model::ModelData,
    frame::{FrameClock, RenderLoop, Renderer},
    loader::{AssetLoader, AssetRequest, LoadReport, ModelSource, PendingLoad, Ticket},
    scene::{SceneContext, build_scene},
    viewport::{self, RenderSurface, ViewportHost},
};

#[derive(Debug)]
pub struct SceneSession {
    ctx: SceneContext,
    loader: AssetLoader,
    binder: AnimationBinder,
    render_loop: RenderLoop,
}

impl SceneSession {
    pub fn new(config: &StageConfig) -> Self {
        let mut ctx = build_scene(&config.scene);
        if let Some(reduce) = config.host.reduced_motion {
            ctx.motion = MotionPreference::from_reduce(reduce);
        }

        let worklist: Vec<AssetRequest> = config
            .assets
            .iter()
            .map(|spec| AssetRequest {
                source: spec.source.clone(),
                name: spec.name.clone(),
                container: ctx.graph.create_node(&spec.name),
            })
            .collect();

        let binder = AnimationBinder::new(config.bindings.clone());
        let on_complete = {
            let binder = binder.clone();
            move |ctx: &mut SceneContext, report: &LoadReport| {
                if !report.all_succeeded() {
                    log::warn!(
                        "{} of {} asset(s) failed to load",
                        report.failed.len(),
                        report.settled()
                    );
                }
                if let Err(e) = binder.bind(ctx) {
                    log::error!("{}", e);
                }
            }
        };

        Self {
            ctx,
            loader: AssetLoader::new(worklist, on_complete),
            binder,
            render_loop: RenderLoop::new(),
        }
    }

    pub fn context(&self) -> &SceneContext {
        &self.ctx
    }

    pub fn context_mut(&mut self) -> &mut SceneContext {
        &mut self.ctx
    }

    pub fn loader(&self) -> &AssetLoader {
        &self.loader
    }

    pub fn render_loop(&self) -> &RenderLoop {
        &self.render_loop
    }

    pub fn is_loaded(&self) -> bool {
        self.loader.is_complete()
    }

    pub fn animation_status(&self) -> &AnimationStatus {
        &self.ctx.animation
    }

    /// Returns the fetches the host has to poll; feed each outcome back with
    /// [`SceneSession::asset_settled`].
    pub fn start_loading(&mut self, source: &dyn ModelSource) -> Vec<PendingLoad> {
        self.loader.start(source, &mut self.ctx)
    }

    pub fn asset_settled(&mut self, ticket: Ticket, result: anyhow::Result<ModelData>) {
        self.loader.settle(ticket, result, &mut self.ctx);
    }

    /// Loads every asset on the current task.
    pub async fn load_all(&mut self, source: &dyn ModelSource) {
        self.loader.drive(source, &mut self.ctx).await;
    }

    pub fn resize(&mut self, host: &dyn ViewportHost, surface: &mut dyn RenderSurface) {
        viewport::resize(
            &mut self.ctx.viewport,
            &mut self.ctx.projection,
            surface,
            host,
        );
    }

    pub fn scroll(&mut self, sample: ScrollSample) {
        self.ctx.apply_scroll(sample);
    }

    /// Follows a change of the reduced-motion preference.
    ///
    /// Turning it on reverts any bindings. Turning it off binds again once
    /// loading has completed.
    pub fn set_reduced_motion(&mut self, reduce: bool) {
        let preference = MotionPreference::from_reduce(reduce);
        if preference == self.ctx.motion {
            return;
        }
        self.ctx.motion = preference;
        if reduce {
            self.ctx.timelines.revert(&mut self.ctx.graph);
            if self.loader.is_complete() {
                self.ctx.animation = AnimationStatus::Suppressed;
            }
        } else if self.loader.is_complete() {
            if let Err(e) = self.binder.bind(&mut self.ctx) {
                log::error!("{}", e);
            }
        }
    }

    pub fn start_render_loop(&mut self, clock: &mut dyn FrameClock) {
        self.render_loop.start(clock);
    }

    pub fn stop_render_loop(&mut self) {
        self.render_loop.stop();
    }

    /// Runs one render loop tick.
    pub fn frame(&mut self, renderer: &mut dyn Renderer, clock: &mut dyn FrameClock) -> bool {
        self.render_loop.tick(&mut self.ctx, renderer, clock)
    }
}
