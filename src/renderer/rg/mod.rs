//! Render Graph (§4, Components A-C): record-then-compile DAG of GPU passes
//! with barrier synthesis and transient aliasing.

pub mod access;
pub mod builder;
pub mod capture;
pub mod compiler;
pub mod descriptor;
pub mod handle;
pub mod node;

pub use access::{AccessDescriptor, AccessKind, PipelineStageMask};
pub use builder::{GpuStatisticsCollector, RenderGraphBuilder};
pub use capture::{CaptureRequest, CaptureSink, CapturedAccess, CapturedNode, GraphCapture};
pub use compiler::{AliasedPlacement, Barrier, CompiledGraph, CompiledNode, GraphPass, RenderGraphCompiler};
pub use descriptor::{Binding, DescriptorLifetime, DescriptorSetState};
pub use handle::{
    BufferDef, BufferHandle, ByteRange, Layout, MemoryDomain, ResourceRegistry, Slot,
    SubresourceRange, TextureAspect, TextureDef, TextureHandle, ViewHandle,
};
pub use node::{CopyRegion, DepthTarget, ExecuteFn, NodeId, NodeKind, RenderTarget, RgNode};
