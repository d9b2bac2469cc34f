//! Render Graph Builder (§4.B): records a DAG of nodes, each with its access
//! set and an opaque execute closure. Keeps this codebase's existing
//! `FrameBuilder` fluent collect-then-`build()` shape (stable sort over a
//! flat node list) but replaces the old two-phase `RenderNode::{prepare, run}`
//! trait with a recording API returning opaque [`NodeId`]s.

use smallvec::SmallVec;

use crate::errors::{NyxError, Result};

use super::access::{AccessDescriptor, AccessKind, PipelineStageMask};
use super::descriptor::DescriptorSetState;
use super::handle::{
    BufferDef, ByteRange, Layout, ResourceRegistry, SubresourceRange, TextureDef, ViewHandle,
};
use super::node::{CopyRegion, DepthTarget, ExecuteFn, NodeId, NodeKind, RenderTarget, RgNode};

/// Per-node timer sink installed via [`RenderGraphBuilder::bind_gpu_statistics_collector`].
pub trait GpuStatisticsCollector: Send {
    fn begin_node(&mut self, name: &str);
    fn end_node(&mut self, name: &str);
}

/// Records a frame's render graph. Not thread-safe: nodes are only ever added
/// from the single recording thread (§5).
pub struct RenderGraphBuilder<'a> {
    registry: &'a mut ResourceRegistry,
    nodes: Vec<RgNode>,
    next_id: NodeId,
    /// Stack of currently-bound descriptor sets; new nodes inherit the top of
    /// the stack, mirroring RAII scopes.
    bound_sets: Vec<&'a DescriptorSetState>,
    stats_collector: Option<Box<dyn GpuStatisticsCollector>>,
    gpu_finished: super::super::frame_ctx::Event,
    errors: Vec<NyxError>,
}

impl<'a> RenderGraphBuilder<'a> {
    #[must_use]
    pub fn new(registry: &'a mut ResourceRegistry, gpu_finished: super::super::frame_ctx::Event) -> Self {
        Self {
            registry,
            nodes: Vec::new(),
            next_id: 0,
            bound_sets: Vec::new(),
            stats_collector: None,
            gpu_finished,
            errors: Vec::new(),
        }
    }

    fn allocate_id(&mut self) -> NodeId {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn inherited_accesses(&self, stages: PipelineStageMask) -> SmallVec<[AccessDescriptor; 8]> {
        let mut out = SmallVec::new();
        for set in &self.bound_sets {
            for (view, kind, stage_mask) in set.implicit_accesses(stages) {
                out.push(AccessDescriptor {
                    view,
                    kind,
                    stages: stage_mask,
                });
            }
        }
        out
    }

    fn push_node(&mut self, name: &str, kind: NodeKind, mut accesses: Vec<AccessDescriptor>, execute: Option<ExecuteFn>) -> NodeId {
        let id = self.allocate_id();
        accesses = merge_read_accesses(accesses);
        let node = RgNode {
            id,
            name: name.to_string(),
            kind,
            accesses,
            execute,
        };
        if let Err(err) = node.validate_self() {
            self.errors.push(err);
        }
        self.nodes.push(node);
        id
    }

    pub fn create_texture_view(&mut self, name: &'static str, def: TextureDef) -> Result<ViewHandle> {
        let handle = self.registry.create_texture(def)?;
        self.registry
            .create_texture_view(handle, SubresourceRange::full(1, 1))
            .map_err(|e| {
                self.errors.push(match &e {
                    NyxError::OutOfRange(m) => NyxError::OutOfRange(format!("{name}: {m}")),
                    other => NyxError::InvalidDefinition(other.to_string()),
                });
                e
            })
    }

    pub fn create_buffer_view(&mut self, name: &'static str, def: BufferDef) -> Result<ViewHandle> {
        let size = def.size;
        let handle = self.registry.create_buffer(def)?;
        self.registry
            .create_buffer_view(handle, ByteRange { offset: 0, size })
            .map_err(|e| {
                self.errors.push(NyxError::InvalidDefinition(format!("{name}: {e}")));
                e
            })
    }

    /// Borrows an externally-owned resource for this frame's graph.
    pub fn acquire_external_view(&mut self, layout: Layout) -> Result<ViewHandle> {
        self.registry.adopt_external(layout)
    }

    /// Pushes descriptor sets onto the inheritance stack; new nodes inherit
    /// them until the returned guard is dropped.
    pub fn bind_descriptor_sets(&mut self, sets: &[&'a DescriptorSetState]) {
        self.bound_sets.extend_from_slice(sets);
    }

    pub fn unbind_descriptor_sets(&mut self, count: usize) {
        let new_len = self.bound_sets.len().saturating_sub(count);
        self.bound_sets.truncate(new_len);
    }

    pub fn bind_gpu_statistics_collector(&mut self, collector: Box<dyn GpuStatisticsCollector>) {
        self.stats_collector = Some(collector);
    }

    #[must_use]
    pub fn gpu_finished_event(&self) -> super::super::frame_ctx::Event {
        self.gpu_finished.clone()
    }

    pub fn add_dispatch(
        &mut self,
        name: &str,
        group_count: (u32, u32, u32),
        bindings: &[(ViewHandle, AccessKind, PipelineStageMask)],
        execute: ExecuteFn,
    ) -> NodeId {
        let mut accesses = self.inherited_accesses(PipelineStageMask::COMPUTE_SHADER);
        accesses.extend(bindings.iter().map(|(view, kind, stages)| AccessDescriptor {
            view: *view,
            kind: *kind,
            stages: *stages,
        }));
        self.push_node(name, NodeKind::Dispatch { group_count }, accesses.into_vec(), Some(execute))
    }

    pub fn add_indirect_dispatch(
        &mut self,
        name: &str,
        args_view: ViewHandle,
        bindings: &[(ViewHandle, AccessKind, PipelineStageMask)],
        execute: ExecuteFn,
    ) -> NodeId {
        let mut accesses = self.inherited_accesses(PipelineStageMask::COMPUTE_SHADER);
        accesses.push(AccessDescriptor {
            view: args_view,
            kind: AccessKind::IndirectRead,
            stages: PipelineStageMask::DRAW_INDIRECT,
        });
        accesses.extend(bindings.iter().map(|(view, kind, stages)| AccessDescriptor {
            view: *view,
            kind: *kind,
            stages: *stages,
        }));
        self.push_node(
            name,
            NodeKind::IndirectDispatch { args_view },
            accesses.into_vec(),
            Some(execute),
        )
    }

    pub fn add_render_pass(
        &mut self,
        name: &str,
        area: (u32, u32),
        color_targets: &[RenderTarget],
        depth_target: Option<DepthTarget>,
        subpass_count: u32,
        execute: ExecuteFn,
    ) -> NodeId {
        let mut accesses = self.inherited_accesses(
            PipelineStageMask::VERTEX_SHADER | PipelineStageMask::FRAGMENT_SHADER,
        );
        for target in color_targets {
            accesses.push(AccessDescriptor {
                view: target.view,
                kind: AccessKind::ColorTarget,
                stages: PipelineStageMask::COLOR_OUTPUT,
            });
        }
        if let Some(depth) = &depth_target {
            accesses.push(AccessDescriptor {
                view: depth.view,
                kind: AccessKind::DepthTarget,
                stages: PipelineStageMask::EARLY_FRAGMENT | PipelineStageMask::LATE_FRAGMENT,
            });
        }
        self.push_node(
            name,
            NodeKind::RenderPass {
                area,
                color_targets: color_targets.iter().cloned().collect(),
                depth_target,
                subpass_count,
            },
            accesses.into_vec(),
            Some(execute),
        )
    }

    pub fn add_copy(&mut self, name: &str, src: ViewHandle, dst: ViewHandle, region: CopyRegion) -> NodeId {
        let accesses = vec![
            AccessDescriptor {
                view: src,
                kind: AccessKind::Read,
                stages: PipelineStageMask::TRANSFER,
            },
            AccessDescriptor {
                view: dst,
                kind: AccessKind::Write,
                stages: PipelineStageMask::TRANSFER,
            },
        ];
        self.push_node(name, NodeKind::Copy { src, dst, region }, accesses, None)
    }

    pub fn fill_buffer(&mut self, name: &str, view: ViewHandle, range: super::handle::ByteRange, value: u32) -> NodeId {
        let accesses = vec![AccessDescriptor {
            view,
            kind: AccessKind::Write,
            stages: PipelineStageMask::TRANSFER,
        }];
        self.push_node(name, NodeKind::Fill { view, range, value }, accesses, None)
    }

    /// Repeated invocation over the same input with no intervening writes
    /// always produces the same recorded node shape (idempotence, §8).
    pub fn build_mips(&mut self, name: &str, texture: super::handle::TextureHandle, view: ViewHandle, base_mip: u32, count: u32) -> NodeId {
        let accesses = vec![AccessDescriptor {
            view,
            kind: AccessKind::ReadWrite,
            stages: PipelineStageMask::TRANSFER,
        }];
        self.push_node(
            name,
            NodeKind::MipBuild {
                texture,
                base_mip,
                count,
            },
            accesses,
            None,
        )
    }

    /// Consumes the builder, returning the recorded node list for the
    /// Compiler, or a `CycleDetected`/`AliasedViewRace` error if any node
    /// recording failed validation.
    pub fn finish(mut self) -> Result<Vec<RgNode>> {
        if let Some(err) = self.errors.pop() {
            return Err(err);
        }
        Ok(std::mem::take(&mut self.nodes))
    }
}

/// Merges multiple read accesses with different stages on the same view into
/// a single combined-stage read, per the Access Descriptor invariant (§3).
fn merge_read_accesses(accesses: Vec<AccessDescriptor>) -> Vec<AccessDescriptor> {
    let mut merged: Vec<AccessDescriptor> = Vec::with_capacity(accesses.len());
    for access in accesses {
        if access.kind.is_read() && !access.kind.is_write() {
            if let Some(existing) = merged
                .iter_mut()
                .find(|a| a.view == access.view && a.kind == access.kind)
            {
                existing.stages |= access.stages;
                continue;
            }
        }
        merged.push(access);
    }
    merged
}

