//! Scene Render Orchestrator (§4.D): view collection, fixed-stage dispatch,
//! and the per-view blackboard that carries data between stages.

pub mod blackboard;
pub mod orchestrator;
pub mod system;
pub mod view;

pub use blackboard::Blackboard;
pub use orchestrator::{HookKind, Orchestrator, ShadingMode, StageHookFn};
pub use system::RenderSystem;
pub use view::{RenderStage, StageMask, View, ViewId, STAGE_ORDER};
