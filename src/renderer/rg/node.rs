//! RG node kinds and the per-node recording record.

use smallvec::SmallVec;

use crate::errors::{NyxError, Result};

use super::access::AccessDescriptor;
use super::handle::{BufferHandle, ByteRange, TextureHandle, ViewHandle};

pub type NodeId = u32;

/// Opaque command-recording callback. Boxed so the builder can store a
/// heterogeneous list of nodes; invoked by the Compiler/Executor during
/// submission (§4.C step 7).
pub type ExecuteFn = Box<dyn FnOnce(&mut wgpu::CommandEncoder) + Send>;

#[derive(Debug, Clone)]
pub struct RenderTarget {
    pub view: ViewHandle,
    pub clear: Option<wgpu::Color>,
}

#[derive(Debug, Clone)]
pub struct DepthTarget {
    pub view: ViewHandle,
    pub clear_depth: Option<f32>,
}

#[derive(Debug, Clone, Copy)]
pub struct CopyRegion {
    pub src_offset: (u32, u32, u32),
    pub dst_offset: (u32, u32, u32),
    pub extent: (u32, u32, u32),
}

/// The kind of GPU work a node performs.
pub enum NodeKind {
    Dispatch {
        group_count: (u32, u32, u32),
    },
    IndirectDispatch {
        args_view: ViewHandle,
    },
    RenderPass {
        area: (u32, u32),
        color_targets: SmallVec<[RenderTarget; 4]>,
        depth_target: Option<DepthTarget>,
        subpass_count: u32,
    },
    Copy {
        src: ViewHandle,
        dst: ViewHandle,
        region: CopyRegion,
    },
    Fill {
        view: ViewHandle,
        range: ByteRange,
        value: u32,
    },
    MipBuild {
        texture: TextureHandle,
        base_mip: u32,
        count: u32,
    },
    RayDispatch {
        group_count: (u32, u32, u32),
    },
    AccelerationStructureBuild {
        dst: BufferHandle,
    },
}

impl NodeKind {
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Dispatch { .. } => "dispatch",
            Self::IndirectDispatch { .. } => "indirect_dispatch",
            Self::RenderPass { .. } => "render_pass",
            Self::Copy { .. } => "copy",
            Self::Fill { .. } => "fill",
            Self::MipBuild { .. } => "mip_build",
            Self::RayDispatch { .. } => "ray_dispatch",
            Self::AccelerationStructureBuild { .. } => "as_build",
        }
    }
}

/// A single recorded unit of GPU work plus its declared access set.
pub struct RgNode {
    pub id: NodeId,
    pub name: String,
    pub kind: NodeKind,
    pub accesses: Vec<AccessDescriptor>,
    pub execute: Option<ExecuteFn>,
}

impl RgNode {
    /// Validates the "at most one write per subresource within a node"
    /// invariant (§3) by checking the view identities directly declared on
    /// this node (the Compiler additionally checks across the whole graph).
    pub fn validate_self(&self) -> Result<()> {
        let mut writers: SmallVec<[ViewHandle; 4]> = SmallVec::new();
        for access in &self.accesses {
            if access.kind.is_write() {
                if writers.contains(&access.view) {
                    return Err(NyxError::CycleDetected(format!(
                        "node '{}' declares more than one write access to the same view",
                        self.name
                    )));
                }
                writers.push(access.view);
            }
        }
        Ok(())
    }
}
