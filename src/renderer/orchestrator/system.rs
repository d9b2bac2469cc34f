//! Render System capability set: the open-ended family of systems the
//! orchestrator drives each frame (§3, Polymorphism notes).
//!
//! Registered by name rather than matched as a closed tagged enum, since new
//! systems (SSAO, volumetric fog, a third-party plugin pass) are added
//! without touching the orchestrator itself. Every capability has a no-op
//! default so a system only implements what it needs, the same shape as
//! this codebase's existing `RenderNode` trait
//! (`renderer/graph/node.rs`) having both `prepare` and `run`.

use crate::errors::Result;
use crate::scene::Scene;

use super::view::{RenderStage, View};
use crate::renderer::frame_ctx::FrameContext;
use crate::renderer::rg::RenderGraphBuilder;

/// A named collaborator the orchestrator drives through the frame.
pub trait RenderSystem: Send {
    fn name(&self) -> &'static str;

    /// Per-frame, stage-independent bookkeeping (animation advance, GPU
    /// upload of CPU-side state). Runs once before view collection.
    fn update(&mut self, _scene: &Scene, _frame: &FrameContext) {}

    /// Appends any views this system wants rendered this frame (e.g. a
    /// shadow view per visible shadow-casting light). Called repeatedly
    /// until a full pass adds no new views (§3, iterative collection).
    fn collect_views(&mut self, _scene: &Scene, _existing: &[View], _out: &mut Vec<View>) {}

    /// Records work common to many views into `graph`, once per frame after
    /// view collection and before the per-(stage, view) dispatch loop (§4.D
    /// step 3): global light uploads, acceleration-structure builds, and
    /// similar work that isn't owned by any single view/stage pair.
    fn render_scene_wide(
        &mut self,
        _views: &[View],
        _frame: &FrameContext,
        _graph: &mut RenderGraphBuilder<'_>,
    ) -> Result<()> {
        Ok(())
    }

    /// Records this system's work for `stage` against `view` into `graph`.
    /// Only called for stages the system opted into via
    /// [`RenderSystem::interested_stages`].
    fn render_per_frame(
        &mut self,
        _stage: RenderStage,
        _view: &mut View,
        _frame: &FrameContext,
        _graph: &mut RenderGraphBuilder<'_>,
    ) -> Result<()> {
        Ok(())
    }

    /// The stages this system wants `render_per_frame` called for. Returning
    /// `&[]` (the default) means the system only participates via
    /// `update`/`collect_views`/`finish_frame`.
    fn interested_stages(&self) -> &'static [RenderStage] {
        &[]
    }

    /// End-of-frame cleanup (release transient CPU state, swap double
    /// buffers). Runs once after every stage has executed.
    fn finish_frame(&mut self) {}
}
