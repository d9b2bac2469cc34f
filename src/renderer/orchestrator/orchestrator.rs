//! Scene Render Orchestrator (§4.D): multi-view, multi-stage frame driver.
//!
//! Generalizes this codebase's `Engine::render_active_scene` /
//! `RenderFrame::extract_and_prepare` single-view Extract→Prepare→Queue→
//! Render pipeline (`src/engine.rs`, `renderer/graph/frame.rs`) to a
//! collected list of views driven through the fixed 18-stage order in
//! [`super::view::STAGE_ORDER`].

use rustc_hash::FxHashMap;

use crate::errors::Result;
use crate::scene::Scene;

use super::system::RenderSystem;
use super::view::{RenderStage, View, STAGE_ORDER};
use crate::renderer::frame_ctx::FrameContext;
use crate::renderer::rg::RenderGraphBuilder;

/// Which of the two mutually-exclusive shading-path stages runs this frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShadingMode {
    Forward,
    Deferred,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HookKind {
    Pre,
    On,
    Post,
}

pub type StageHookFn = Box<dyn FnMut(&mut View, &FrameContext) + Send>;

/// The number of times to rerun `collect_views` looking for newly-added
/// views before giving up and running with whatever converged. A system
/// that keeps adding views past this is a bug, not a legitimate workload.
const MAX_VIEW_COLLECTION_PASSES: u32 = 8;

/// The number of TAA jitter samples views cycle through.
const DEFAULT_JITTER_PERIOD: u32 = 8;

#[derive(Default)]
pub struct Orchestrator {
    systems: Vec<Box<dyn RenderSystem>>,
    hooks: FxHashMap<(RenderStage, HookKind), Vec<StageHookFn>>,
    shading_mode: Option<ShadingMode>,
}

impl Orchestrator {
    #[must_use]
    pub fn new(shading_mode: ShadingMode) -> Self {
        Self {
            systems: Vec::new(),
            hooks: FxHashMap::default(),
            shading_mode: Some(shading_mode),
        }
    }

    pub fn register_system(&mut self, system: Box<dyn RenderSystem>) {
        self.systems.push(system);
    }

    pub fn register_hook(&mut self, stage: RenderStage, kind: HookKind, hook: StageHookFn) {
        self.hooks.entry((stage, kind)).or_default().push(hook);
    }

    fn fire_hooks(&mut self, stage: RenderStage, kind: HookKind, view: &mut View, frame: &FrameContext) {
        if let Some(hooks) = self.hooks.get_mut(&(stage, kind)) {
            for hook in hooks {
                hook(view, frame);
            }
        }
    }

    fn active_stage(&self, stage: RenderStage) -> bool {
        match (stage, self.shading_mode) {
            (RenderStage::ForwardOpaque, Some(ShadingMode::Deferred)) => false,
            (RenderStage::DeferredShading, Some(ShadingMode::Forward)) => false,
            _ => true,
        }
    }

    /// Iteratively collects views until a pass adds none, per the
    /// "views may add more views" invariant (§3). Seeded with `main_view`
    /// (§4.D step 2: "start with the main view"); every registered system
    /// then gets a chance to append more (shadow cascades, cube faces) until
    /// a full pass adds nothing new.
    fn collect_views(&mut self, scene: &Scene, main_view: View) -> Vec<View> {
        let mut views = vec![main_view];
        for _ in 0..MAX_VIEW_COLLECTION_PASSES {
            let mut fresh = Vec::new();
            for system in &mut self.systems {
                system.collect_views(scene, &views, &mut fresh);
            }
            if fresh.is_empty() {
                break;
            }
            views.extend(fresh);
        }
        views
    }

    /// Drives one full frame: view collection, the fixed stage order with
    /// Pre/On/Post hooks, and system finalization. Returns the views that
    /// were rendered, so the caller (e.g. the shadow allocator) can inspect
    /// per-view results.
    pub fn run_frame(
        &mut self,
        scene: &Scene,
        main_view: View,
        frame: &FrameContext,
        graph: &mut RenderGraphBuilder<'_>,
    ) -> Result<Vec<View>> {
        for system in &mut self.systems {
            system.update(scene, frame);
        }

        let mut views = self.collect_views(scene, main_view);

        for system in &mut self.systems {
            // Scene-wide work common to many views (§4.D step 3), e.g. a
            // global light upload or acceleration-structure build, recorded
            // once before any per-(stage, view) dispatch.
            if let Err(err) = system.render_scene_wide(&views, frame, graph) {
                log::warn!(
                    "system '{}' failed scene-wide recording, skipping: {err}",
                    system.name(),
                );
            }
        }

        for &stage in STAGE_ORDER {
            if !self.active_stage(stage) {
                continue;
            }
            for view in &mut views {
                if !view.supported_stages.supports(stage) {
                    continue;
                }
                self.fire_hooks(stage, HookKind::Pre, view, frame);
                for system in &mut self.systems {
                    if system.interested_stages().contains(&stage) {
                        // A per-system error only skips this system's stage for
                        // this view (§4.D); only a graph-build error surfaced at
                        // `finish()`/compile may abort the whole frame.
                        if let Err(err) = system.render_per_frame(stage, view, frame, graph) {
                            log::warn!(
                                "system '{}' failed stage {stage:?} for view {}, skipping: {err}",
                                system.name(),
                                view.id,
                            );
                        }
                    }
                }
                self.fire_hooks(stage, HookKind::On, view, frame);
                self.fire_hooks(stage, HookKind::Post, view, frame);
            }
        }

        for system in &mut self.systems {
            system.finish_frame();
        }
        for view in &mut views {
            view.advance_frame(DEFAULT_JITTER_PERIOD);
        }

        Ok(views)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::core::view::RenderView;
    use crate::renderer::orchestrator::view::StageMask;
    use crate::scene::camera::Frustum;
    use glam::Mat4;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct CountingSystem {
        stage_calls: Arc<AtomicUsize>,
    }

    impl RenderSystem for CountingSystem {
        fn name(&self) -> &'static str {
            "counting"
        }

        fn interested_stages(&self) -> &'static [RenderStage] {
            &[RenderStage::DepthPrepass, RenderStage::HDRResolve]
        }

        fn render_per_frame(
            &mut self,
            _stage: RenderStage,
            _view: &mut View,
            _frame: &FrameContext,
            _graph: &mut RenderGraphBuilder<'_>,
        ) -> Result<()> {
            self.stage_calls.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    fn main_view() -> View {
        View::new(
            0,
            RenderView::new_main_camera(Mat4::IDENTITY, Frustum::default(), (1920, 1080)),
            StageMask::main_camera(),
        )
    }

    #[test]
    fn only_interested_stages_are_dispatched() {
        use crate::renderer::rg::handle::ResourceRegistry;

        let calls = Arc::new(AtomicUsize::new(0));
        let mut orchestrator = Orchestrator::new(ShadingMode::Forward);
        orchestrator.register_system(Box::new(CountingSystem {
            stage_calls: calls.clone(),
        }));

        let scene = Scene::new();
        let frame = FrameContext::new();
        let mut registry = ResourceRegistry::new();
        let mut graph = RenderGraphBuilder::new(&mut registry, frame.gpu_finished_event());

        // The main view supports every stage, so both of CountingSystem's
        // interested stages (DepthPrepass, HDRResolve) should fire once.
        orchestrator
            .run_frame(&scene, main_view(), &frame, &mut graph)
            .unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn forward_and_deferred_are_mutually_exclusive() {
        let forward = Orchestrator::new(ShadingMode::Forward);
        assert!(forward.active_stage(RenderStage::ForwardOpaque));
        assert!(!forward.active_stage(RenderStage::DeferredShading));

        let deferred = Orchestrator::new(ShadingMode::Deferred);
        assert!(!deferred.active_stage(RenderStage::ForwardOpaque));
        assert!(deferred.active_stage(RenderStage::DeferredShading));
    }

    #[test]
    fn view_survives_stage_filtering_by_mask() {
        let view = View::new(
            1,
            RenderView::new_main_camera(Mat4::IDENTITY, Frustum::default(), (1920, 1080)),
            StageMask::shadow_only(),
        );
        assert!(view.supported_stages.supports(RenderStage::ShadowMap));
        assert!(!view.supported_stages.supports(RenderStage::HDRResolve));
    }
}
