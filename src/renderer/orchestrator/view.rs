//! The fixed render-stage order and the generalized multi-view type (§4.D).
//!
//! [`View`] generalizes [`crate::renderer::core::view::RenderView`]'s
//! "everything is a view" idea (main camera, shadow cascades, ...) with the
//! fields a multi-stage orchestrator needs: which stages a view participates
//! in, its target resolution, its TAA jitter slot, and the previous frame's
//! view-projection for motion vectors.

use bitflags::bitflags;
use glam::Mat4;

use crate::renderer::core::view::{RenderView, ViewTarget};

use super::blackboard::Blackboard;

/// The fixed per-frame stage order (§3). `ForwardOpaque` and
/// `DeferredShading` occupy the same position — a frame runs exactly one of
/// the two depending on the active shading path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RenderStage {
    PreRendering,
    GlobalIllumination,
    ShadowMap,
    DepthPrepass,
    VisibilityBuffer,
    MotionAndDepth,
    DownsampleGeometryTextures,
    AmbientOcclusion,
    DirectionalLightShadowMasks,
    ForwardOpaque,
    DeferredShading,
    SpecularReflections,
    ApplyAtmosphere,
    VolumetricFog,
    Transparency,
    PostProcessPreAA,
    AntiAliasing,
    HDRResolve,
}

/// The canonical execution order, both shading-path alternatives included.
/// [`Orchestrator::run_frame`](super::orchestrator::Orchestrator::run_frame)
/// filters out whichever of `ForwardOpaque`/`DeferredShading` the active
/// [`ShadingMode`](super::orchestrator::ShadingMode) does not select.
pub const STAGE_ORDER: &[RenderStage] = &[
    RenderStage::PreRendering,
    RenderStage::GlobalIllumination,
    RenderStage::ShadowMap,
    RenderStage::DepthPrepass,
    RenderStage::VisibilityBuffer,
    RenderStage::MotionAndDepth,
    RenderStage::DownsampleGeometryTextures,
    RenderStage::AmbientOcclusion,
    RenderStage::DirectionalLightShadowMasks,
    RenderStage::ForwardOpaque,
    RenderStage::DeferredShading,
    RenderStage::SpecularReflections,
    RenderStage::ApplyAtmosphere,
    RenderStage::VolumetricFog,
    RenderStage::Transparency,
    RenderStage::PostProcessPreAA,
    RenderStage::AntiAliasing,
    RenderStage::HDRResolve,
];

impl RenderStage {
    /// Position in the fixed frame order. `ForwardOpaque` and
    /// `DeferredShading` share a position since only one ever runs.
    #[must_use]
    pub const fn order(self) -> u8 {
        match self {
            Self::PreRendering => 0,
            Self::GlobalIllumination => 1,
            Self::ShadowMap => 2,
            Self::DepthPrepass => 3,
            Self::VisibilityBuffer => 4,
            Self::MotionAndDepth => 5,
            Self::DownsampleGeometryTextures => 6,
            Self::AmbientOcclusion => 7,
            Self::DirectionalLightShadowMasks => 8,
            Self::ForwardOpaque | Self::DeferredShading => 9,
            Self::SpecularReflections => 10,
            Self::ApplyAtmosphere => 11,
            Self::VolumetricFog => 12,
            Self::Transparency => 13,
            Self::PostProcessPreAA => 14,
            Self::AntiAliasing => 15,
            Self::HDRResolve => 16,
        }
    }

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::PreRendering => "PreRendering",
            Self::GlobalIllumination => "GlobalIllumination",
            Self::ShadowMap => "ShadowMap",
            Self::DepthPrepass => "DepthPrepass",
            Self::VisibilityBuffer => "VisibilityBuffer",
            Self::MotionAndDepth => "MotionAndDepth",
            Self::DownsampleGeometryTextures => "DownsampleGeometryTextures",
            Self::AmbientOcclusion => "AmbientOcclusion",
            Self::DirectionalLightShadowMasks => "DirectionalLightShadowMasks",
            Self::ForwardOpaque => "ForwardOpaque",
            Self::DeferredShading => "DeferredShading",
            Self::SpecularReflections => "SpecularReflections",
            Self::ApplyAtmosphere => "ApplyAtmosphere",
            Self::VolumetricFog => "VolumetricFog",
            Self::Transparency => "Transparency",
            Self::PostProcessPreAA => "PostProcessPreAA",
            Self::AntiAliasing => "AntiAliasing",
            Self::HDRResolve => "HDRResolve",
        }
    }

    #[must_use]
    const fn bit(self) -> u32 {
        match self {
            Self::PreRendering => 1 << 0,
            Self::GlobalIllumination => 1 << 1,
            Self::ShadowMap => 1 << 2,
            Self::DepthPrepass => 1 << 3,
            Self::VisibilityBuffer => 1 << 4,
            Self::MotionAndDepth => 1 << 5,
            Self::DownsampleGeometryTextures => 1 << 6,
            Self::AmbientOcclusion => 1 << 7,
            Self::DirectionalLightShadowMasks => 1 << 8,
            Self::ForwardOpaque => 1 << 9,
            Self::DeferredShading => 1 << 10,
            Self::SpecularReflections => 1 << 11,
            Self::ApplyAtmosphere => 1 << 12,
            Self::VolumetricFog => 1 << 13,
            Self::Transparency => 1 << 14,
            Self::PostProcessPreAA => 1 << 15,
            Self::AntiAliasing => 1 << 16,
            Self::HDRResolve => 1 << 17,
        }
    }
}

bitflags! {
    /// Which stages a view participates in. A shadow-map view, for example,
    /// only supports `ShadowMap`; the main camera view supports most stages.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
    pub struct StageMask: u32 {
        const NONE = 0;
    }
}

impl StageMask {
    #[must_use]
    pub fn with(mut self, stage: RenderStage) -> Self {
        self.insert(Self::from_bits_truncate(stage.bit()));
        self
    }

    #[must_use]
    pub fn supports(self, stage: RenderStage) -> bool {
        self.contains(Self::from_bits_truncate(stage.bit()))
    }

    #[must_use]
    pub fn main_camera() -> Self {
        STAGE_ORDER.iter().fold(Self::NONE, |mask, &s| mask.with(s))
    }

    #[must_use]
    pub fn shadow_only() -> Self {
        Self::NONE.with(RenderStage::ShadowMap)
    }
}

pub type ViewId = u64;

/// A multi-view frame's single rendering viewpoint: the legacy
/// [`RenderView`] plus the fields the orchestrator needs to drive stages and
/// TAA across frames.
pub struct View {
    pub id: ViewId,
    pub base: RenderView,
    pub supported_stages: StageMask,
    /// Render-target resolution for this view (distinct from
    /// `base.viewport_size`, which may be a sub-rect of an atlas).
    pub resolution: (u32, u32),
    /// TAA jitter sample index, advanced once per frame the view survives.
    pub jitter_index: u32,
    /// Previous frame's view-projection, for motion-vector reconstruction.
    /// `None` on a view's first frame.
    pub prev_view_projection: Option<Mat4>,
    pub blackboard: Blackboard,
}

impl View {
    #[must_use]
    pub fn new(id: ViewId, base: RenderView, supported_stages: StageMask) -> Self {
        let resolution = base.viewport_size;
        Self {
            id,
            base,
            supported_stages,
            resolution,
            jitter_index: 0,
            prev_view_projection: None,
            blackboard: Blackboard::new(),
        }
    }

    #[must_use]
    pub fn is_shadow(&self) -> bool {
        matches!(self.base.target, ViewTarget::ShadowLight { .. })
    }

    /// Advances the jitter slot and snapshots this frame's VP as "previous"
    /// for next frame's motion vectors.
    pub fn advance_frame(&mut self, jitter_period: u32) {
        self.jitter_index = (self.jitter_index + 1) % jitter_period.max(1);
        self.prev_view_projection = Some(self.base.view_projection);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_ordering() {
        let mut last = 0u8;
        for (i, stage) in STAGE_ORDER.iter().enumerate() {
            if i == 0 {
                continue;
            }
            assert!(stage.order() >= last, "stage order must be non-decreasing");
            last = stage.order();
        }
        assert_eq!(RenderStage::ForwardOpaque.order(), RenderStage::DeferredShading.order());
    }

    #[test]
    fn stage_mask_supports_only_added_stages() {
        let mask = StageMask::shadow_only();
        assert!(mask.supports(RenderStage::ShadowMap));
        assert!(!mask.supports(RenderStage::Transparency));
    }
}
