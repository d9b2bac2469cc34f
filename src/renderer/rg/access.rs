//! Access descriptors: `(view, access_kind, pipeline_stage_mask)`.

use bitflags::bitflags;

use super::handle::ViewHandle;

bitflags! {
    /// Pipeline stages at which an access occurs. A node may touch a view at
    /// more than one stage (e.g. a descriptor read in both vertex and fragment).
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    pub struct PipelineStageMask: u32 {
        const TOP_OF_PIPE      = 1 << 0;
        const DRAW_INDIRECT    = 1 << 1;
        const VERTEX_INPUT     = 1 << 2;
        const VERTEX_SHADER    = 1 << 3;
        const FRAGMENT_SHADER  = 1 << 4;
        const EARLY_FRAGMENT   = 1 << 5;
        const LATE_FRAGMENT    = 1 << 6;
        const COLOR_OUTPUT     = 1 << 7;
        const COMPUTE_SHADER   = 1 << 8;
        const TRANSFER         = 1 << 9;
        const RAY_TRACING      = 1 << 10;
        const AS_BUILD         = 1 << 11;
        const BOTTOM_OF_PIPE   = 1 << 12;
    }
}

/// The kind of access a node declares on a view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AccessKind {
    Read,
    Write,
    ReadWrite,
    ColorTarget,
    DepthTarget,
    IndirectRead,
    VertexRead,
    IndexRead,
}

impl AccessKind {
    #[must_use]
    pub const fn is_write(self) -> bool {
        matches!(
            self,
            Self::Write | Self::ReadWrite | Self::ColorTarget | Self::DepthTarget
        )
    }

    #[must_use]
    pub const fn is_read(self) -> bool {
        matches!(
            self,
            Self::Read
                | Self::ReadWrite
                | Self::IndirectRead
                | Self::VertexRead
                | Self::IndexRead
        )
    }

    /// The resulting layout a view transitions to after this access, per the
    /// Compiler's layout-transition table (§4.C step 4).
    #[must_use]
    pub const fn target_layout(self) -> super::handle::Layout {
        use super::handle::Layout;
        match self {
            Self::Read | Self::ReadWrite => Layout::General,
            Self::Write => Layout::General,
            Self::ColorTarget => Layout::ColorTarget,
            Self::DepthTarget => Layout::DepthTarget,
            Self::IndirectRead | Self::VertexRead | Self::IndexRead => Layout::General,
        }
    }
}

/// `(view, access_kind, pipeline_stage_mask)`.
#[derive(Debug, Clone, Copy)]
pub struct AccessDescriptor {
    pub view: ViewHandle,
    pub kind: AccessKind,
    pub stages: PipelineStageMask,
}
