//! Render Graph Compiler (§4.C): turns a recorded node list into a scheduled,
//! barrier-annotated, alias-assigned [`CompiledGraph`] ready for submission.
//!
//! The six steps below run in order; each is a plain function over the
//! previous step's output so they can be unit-tested independently, the same
//! way this codebase's existing `FrameGraph::compile` staged its passes.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};

use rustc_hash::FxHashMap;

use crate::errors::{NyxError, Result};

use super::access::{AccessKind, PipelineStageMask};
use super::capture::{CapturedAccess, CapturedNode, CaptureRequest, CaptureSink, GraphCapture};
use super::handle::{Layout, ResourceRegistry, Slot, ViewHandle};
use super::node::RgNode;

/// A layout transition the executor must realize before a node runs. wgpu has
/// no explicit barrier call; the executor realizes this by ending whatever
/// render/compute pass is open before the node that needs it (§1, §4.C step 4).
#[derive(Debug, Clone, Copy)]
pub struct Barrier {
    pub view: ViewHandle,
    pub from: Layout,
    pub to: Layout,
    pub src_stages: PipelineStageMask,
    pub dst_stages: PipelineStageMask,
}

/// One node placed in the final schedule, with the barriers that must run
/// immediately before it.
pub struct CompiledNode {
    pub node: RgNode,
    pub barriers_before: Vec<Barrier>,
}

/// A transient resource's assigned offset within the shared aliasing pool.
#[derive(Debug, Clone, Copy)]
pub struct AliasedPlacement {
    pub resource: Slot,
    pub offset: u64,
    pub size: u64,
}

/// A contiguous run of nodes with no intervening barrier, realized as one
/// open render/compute pass by the executor (§4.C step 7).
pub struct GraphPass {
    pub node_indices: Vec<usize>,
}

/// The fully compiled, ready-to-submit graph.
pub struct CompiledGraph {
    pub nodes: Vec<CompiledNode>,
    pub aliasing: Vec<AliasedPlacement>,
    pub aliasing_pool_bytes: u64,
    pub passes: Vec<GraphPass>,
}

#[derive(Default)]
struct ResourceTrack {
    last_writer: Option<(ViewHandle, usize)>,
    readers_since_writer: Vec<(ViewHandle, usize)>,
    ever_written: bool,
}

pub struct RenderGraphCompiler;

impl RenderGraphCompiler {
    /// Compiles a recorded node list. `capture_request`/`capture_sink`, when
    /// both present and a capture is pending, receive a snapshot of this
    /// compilation exactly once.
    pub fn compile(
        nodes: Vec<RgNode>,
        registry: &mut ResourceRegistry,
        frame_index: u64,
        capture_request: Option<&CaptureRequest>,
        capture_sink: Option<&mut dyn CaptureSink>,
    ) -> Result<CompiledGraph> {
        let order = Self::schedule(&nodes, registry)?;
        let (ordered_nodes, barriers_by_index) = Self::synthesize_barriers(nodes, &order, registry)?;
        let aliasing = Self::assign_aliasing(&ordered_nodes, registry)?;
        let aliasing_pool_bytes = aliasing.iter().map(|p| p.offset + p.size).max().unwrap_or(0);
        let passes = Self::partition_passes(&ordered_nodes, &barriers_by_index);

        let mut compiled_nodes = Vec::with_capacity(ordered_nodes.len());
        for (i, node) in ordered_nodes.into_iter().enumerate() {
            compiled_nodes.push(CompiledNode {
                barriers_before: barriers_by_index.get(&i).cloned().unwrap_or_default(),
                node,
            });
        }

        let should_capture = capture_request.is_some_and(CaptureRequest::take);
        if should_capture {
            if let Some(sink) = capture_sink {
                let capture = GraphCapture {
                    frame_index,
                    total_barriers: compiled_nodes.iter().map(|n| n.barriers_before.len()).sum(),
                    aliased_region_count: aliasing.len(),
                    aliasing_pool_bytes,
                    nodes: compiled_nodes
                        .iter()
                        .map(|n| CapturedNode {
                            name: n.node.name.clone(),
                            kind: n.node.kind.name(),
                            accesses: n
                                .node
                                .accesses
                                .iter()
                                .map(|a| CapturedAccess {
                                    view_debug: format!("{:?}", a.view),
                                    kind_debug: format!("{:?}", a.kind),
                                })
                                .collect(),
                            barrier_count: n.barriers_before.len(),
                        })
                        .collect(),
                };
                sink.accept(capture);
            }
        }

        Ok(CompiledGraph {
            nodes: compiled_nodes,
            aliasing,
            aliasing_pool_bytes,
            passes,
        })
    }

    /// Step 1-3: derive write-after-write / write-after-read / read-after-
    /// write dependency edges per subresource, then a stable topological
    /// schedule that always prefers the lowest original index among ready
    /// nodes (determinism, §8).
    fn schedule(nodes: &[RgNode], registry: &ResourceRegistry) -> Result<Vec<usize>> {
        let n = nodes.len();
        let mut edges: Vec<Vec<usize>> = vec![Vec::new(); n];
        let mut in_degree = vec![0usize; n];
        let mut tracks: HashMap<Slot, ResourceTrack> = HashMap::new();

        for (i, node) in nodes.iter().enumerate() {
            for access in &node.accesses {
                let Some(resource) = registry.resource_key(access.view) else {
                    continue;
                };
                let track = tracks.entry(resource).or_default();

                if access.kind.is_write() {
                    let mut add_edge = |from: usize, to: usize| {
                        if from != to && !edges[from].contains(&to) {
                            edges[from].push(to);
                            in_degree[to] += 1;
                        }
                    };
                    if let Some((writer_view, writer_idx)) = track.last_writer {
                        if registry.views_overlap(access.view, writer_view)? {
                            add_edge(writer_idx, i);
                        }
                    }
                    for (reader_view, reader_idx) in track.readers_since_writer.clone() {
                        if registry.views_overlap(access.view, reader_view)? {
                            add_edge(reader_idx, i);
                        }
                    }
                    track.last_writer = Some((access.view, i));
                    track.readers_since_writer.clear();
                    track.ever_written = true;
                } else {
                    if !track.ever_written && registry.is_transient(resource)? {
                        return Err(NyxError::MissingBinding(format!(
                            "node '{}' reads a transient resource with no prior writer",
                            node.name
                        )));
                    }
                    if let Some((writer_view, writer_idx)) = track.last_writer {
                        if writer_idx != i && registry.views_overlap(access.view, writer_view)? {
                            if !edges[writer_idx].contains(&i) {
                                edges[writer_idx].push(i);
                                in_degree[i] += 1;
                            }
                        }
                    }
                    track.readers_since_writer.push((access.view, i));
                }
            }
        }

        // Kahn's algorithm, always picking the smallest ready original index.
        let mut ready: BinaryHeap<Reverse<usize>> = BinaryHeap::new();
        for (i, degree) in in_degree.iter().enumerate() {
            if *degree == 0 {
                ready.push(Reverse(i));
            }
        }
        let mut order = Vec::with_capacity(n);
        let mut remaining_in_degree = in_degree;
        while let Some(Reverse(i)) = ready.pop() {
            order.push(i);
            for &next in &edges[i] {
                remaining_in_degree[next] -= 1;
                if remaining_in_degree[next] == 0 {
                    ready.push(Reverse(next));
                }
            }
        }

        if order.len() != n {
            return Err(NyxError::CycleDetected(
                "render graph contains a dependency cycle".to_string(),
            ));
        }
        Ok(order)
    }

    /// Step 4: walks the schedule in order, tracking each resource's current
    /// layout, and emits a barrier whenever an access requires a different
    /// layout than the resource currently carries.
    fn synthesize_barriers(
        nodes: Vec<RgNode>,
        order: &[usize],
        registry: &mut ResourceRegistry,
    ) -> Result<(Vec<RgNode>, FxHashMap<usize, Vec<Barrier>>)> {
        let mut by_id: Vec<Option<RgNode>> = nodes.into_iter().map(Some).collect();
        let mut ordered = Vec::with_capacity(order.len());
        for &idx in order {
            ordered.push(by_id[idx].take().expect("schedule indices are a permutation"));
        }

        let mut current_layout: HashMap<Slot, Layout> = HashMap::new();
        let mut last_stage: HashMap<Slot, PipelineStageMask> = HashMap::new();
        let mut barriers: FxHashMap<usize, Vec<Barrier>> = FxHashMap::default();

        for (i, node) in ordered.iter().enumerate() {
            for access in &node.accesses {
                let Some(resource) = registry.resource_key(access.view) else {
                    continue;
                };
                let target = access.kind.target_layout();
                let existing = current_layout
                    .get(&resource)
                    .copied()
                    .unwrap_or(registry.layout_of(resource)?);
                if existing != target {
                    let src_stages = last_stage
                        .get(&resource)
                        .copied()
                        .unwrap_or(PipelineStageMask::TOP_OF_PIPE);
                    barriers.entry(i).or_default().push(Barrier {
                        view: access.view,
                        from: existing,
                        to: target,
                        src_stages,
                        dst_stages: access.stages,
                    });
                    current_layout.insert(resource, target);
                    registry.set_layout(resource, target)?;
                }
                last_stage.insert(resource, access.stages);
            }
        }

        Ok((ordered, barriers))
    }

    /// Step 5: assigns each transient resource a byte offset in a shared
    /// aliasing pool using a lowest-offset-free-region strategy: resources
    /// whose live ranges (by schedule position) never overlap may share
    /// memory, sized largest-first so big resources get first pick of gaps.
    fn assign_aliasing(ordered_nodes: &[RgNode], registry: &ResourceRegistry) -> Result<Vec<AliasedPlacement>> {
        let mut live_range: HashMap<Slot, (usize, usize)> = HashMap::new();
        for (i, node) in ordered_nodes.iter().enumerate() {
            for access in &node.accesses {
                let Some(resource) = registry.resource_key(access.view) else {
                    continue;
                };
                if !registry.is_transient(resource)? {
                    continue;
                }
                let entry = live_range.entry(resource).or_insert((i, i));
                entry.0 = entry.0.min(i);
                entry.1 = entry.1.max(i);
            }
        }

        let mut resources: Vec<(Slot, u64, usize, usize)> = Vec::new();
        for (resource, (start, end)) in live_range {
            let size = registry.resource_footprint(resource)?;
            if size > 0 {
                resources.push((resource, size, start, end));
            }
        }
        resources.sort_by(|a, b| b.1.cmp(&a.1));

        let mut placed: Vec<AliasedPlacement> = Vec::new();
        let mut placed_ranges: Vec<(usize, usize)> = Vec::new();

        for (resource, size, start, end) in resources {
            let mut candidates: Vec<u64> = vec![0];
            candidates.extend(placed.iter().map(|p| p.offset + p.size));
            candidates.sort_unstable();
            candidates.dedup();

            let mut chosen = None;
            for off in candidates {
                let conflicts = placed.iter().zip(placed_ranges.iter()).any(|(p, (p_start, p_end))| {
                    let offsets_overlap = off < p.offset + p.size && p.offset < off + size;
                    let times_overlap = start <= *p_end && *p_start <= end;
                    offsets_overlap && times_overlap
                });
                if !conflicts {
                    chosen = Some(off);
                    break;
                }
            }
            let offset = chosen.unwrap_or_else(|| {
                placed.iter().map(|p| p.offset + p.size).max().unwrap_or(0)
            });
            placed.push(AliasedPlacement { resource, offset, size });
            placed_ranges.push((start, end));
        }

        Ok(placed)
    }

    /// Step 7 (partitioning): groups the schedule into passes that split
    /// wherever a barrier is required, since wgpu realizes a layout
    /// transition by ending the currently open render/compute pass rather
    /// than through an explicit barrier call.
    fn partition_passes(ordered_nodes: &[RgNode], barriers: &FxHashMap<usize, Vec<Barrier>>) -> Vec<GraphPass> {
        let mut passes = Vec::new();
        let mut current = Vec::new();
        for i in 0..ordered_nodes.len() {
            if i > 0 && barriers.contains_key(&i) && !current.is_empty() {
                passes.push(GraphPass {
                    node_indices: std::mem::take(&mut current),
                });
            }
            current.push(i);
        }
        if !current.is_empty() {
            passes.push(GraphPass { node_indices: current });
        }
        passes
    }
}

impl CompiledGraph {
    /// Submits the compiled graph for real (§4.C step 7 / §6 GPU submission):
    /// opens one command encoder, runs each node's execute closure in
    /// schedule order, and submits to `queue`. Layout transitions need no
    /// explicit barrier call under wgpu; `passes` already records where one
    /// open render/compute pass must end and the next begin, and each node's
    /// own closure is responsible for opening whatever pass it needs.
    /// Nodes recorded with no closure (e.g. `Copy`/`Fill` stand-ins not yet
    /// backed by a real wgpu call) are skipped.
    pub fn execute(self, device: &wgpu::Device, queue: &wgpu::Queue) {
        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("rg::CompiledGraph::execute"),
        });
        for compiled in self.nodes {
            if let Some(execute) = compiled.node.execute {
                execute(&mut encoder);
            }
        }
        queue.submit(std::iter::once(encoder.finish()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::rg::access::AccessDescriptor;
    use crate::renderer::rg::handle::{MemoryDomain, SubresourceRange, TextureAspect, TextureDef};

    fn texture_def(label: &'static str) -> TextureDef {
        TextureDef {
            label,
            width: 64,
            height: 64,
            depth_or_array_layers: 1,
            mip_level_count: 1,
            format: wgpu::TextureFormat::Rgba8Unorm,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::RENDER_ATTACHMENT,
            aspect: TextureAspect::Color,
            domain: MemoryDomain::DeviceLocal,
        }
    }

    fn node(id: u32, name: &str, accesses: Vec<AccessDescriptor>) -> RgNode {
        RgNode {
            id,
            name: name.to_string(),
            kind: super::super::node::NodeKind::Fill {
                view: accesses[0].view,
                range: super::super::handle::ByteRange { offset: 0, size: 0 },
                value: 0,
            },
            accesses,
            execute: None,
        }
    }

    #[test]
    fn no_read_precedes_its_write() {
        let mut registry = ResourceRegistry::new();
        let handle = registry.create_texture(texture_def("t")).unwrap();
        let view = registry
            .create_texture_view(handle, SubresourceRange::full(1, 1))
            .unwrap();

        let write = node(
            0,
            "write",
            vec![AccessDescriptor {
                view,
                kind: AccessKind::Write,
                stages: PipelineStageMask::TRANSFER,
            }],
        );
        let read = node(
            1,
            "read",
            vec![AccessDescriptor {
                view,
                kind: AccessKind::Read,
                stages: PipelineStageMask::FRAGMENT_SHADER,
            }],
        );

        // Record read before write; the schedule must still place write first.
        let nodes = vec![read, write];
        let compiled = RenderGraphCompiler::compile(nodes, &mut registry, 1, None, None).unwrap();
        let names: Vec<&str> = compiled.nodes.iter().map(|n| n.node.name.as_str()).collect();
        assert_eq!(names, vec!["write", "read"]);
    }

    #[test]
    fn uninitialized_read_of_transient_resource_is_rejected() {
        let mut registry = ResourceRegistry::new();
        let handle = registry.create_texture(texture_def("t")).unwrap();
        let view = registry
            .create_texture_view(handle, SubresourceRange::full(1, 1))
            .unwrap();
        let read_only = vec![node(
            0,
            "read",
            vec![AccessDescriptor {
                view,
                kind: AccessKind::Read,
                stages: PipelineStageMask::FRAGMENT_SHADER,
            }],
        )];
        assert!(RenderGraphCompiler::compile(read_only, &mut registry, 1, None, None).is_err());
    }

    #[test]
    fn non_overlapping_transient_textures_may_alias() {
        let mut registry = ResourceRegistry::new();
        let a = registry.create_texture(texture_def("a")).unwrap();
        let av = registry
            .create_texture_view(a, SubresourceRange::full(1, 1))
            .unwrap();
        let b = registry.create_texture(texture_def("b")).unwrap();
        let bv = registry
            .create_texture_view(b, SubresourceRange::full(1, 1))
            .unwrap();

        let write_a = node(
            0,
            "write_a",
            vec![AccessDescriptor {
                view: av,
                kind: AccessKind::Write,
                stages: PipelineStageMask::TRANSFER,
            }],
        );
        let read_a = node(
            1,
            "read_a",
            vec![AccessDescriptor {
                view: av,
                kind: AccessKind::Read,
                stages: PipelineStageMask::FRAGMENT_SHADER,
            }],
        );
        let write_b = node(
            2,
            "write_b",
            vec![AccessDescriptor {
                view: bv,
                kind: AccessKind::Write,
                stages: PipelineStageMask::TRANSFER,
            }],
        );
        let read_b = node(
            3,
            "read_b",
            vec![AccessDescriptor {
                view: bv,
                kind: AccessKind::Read,
                stages: PipelineStageMask::FRAGMENT_SHADER,
            }],
        );

        let compiled =
            RenderGraphCompiler::compile(vec![write_a, read_a, write_b, read_b], &mut registry, 1, None, None)
                .unwrap();
        assert_eq!(compiled.aliasing.len(), 2);
        assert_eq!(compiled.aliasing[0].offset, compiled.aliasing[1].offset);
    }

    /// §8 seed scenario 1 (single-view depth prepass): one transient depth
    /// texture, cleared and drawn to as a depth target with no other access.
    /// Expected: a single `Undefined -> DepthTarget` transition and exactly
    /// one barrier total; removing it would leave the draw reading/writing
    /// through a stale layout.
    #[test]
    fn single_view_depth_prepass_produces_exactly_one_barrier() {
        let mut registry = ResourceRegistry::new();
        let handle = registry.create_texture(texture_def("depth")).unwrap();
        let view = registry
            .create_texture_view(handle, SubresourceRange::full(1, 1))
            .unwrap();

        let draw = node(
            0,
            "depth_prepass",
            vec![AccessDescriptor {
                view,
                kind: AccessKind::DepthTarget,
                stages: PipelineStageMask::EARLY_FRAGMENT | PipelineStageMask::LATE_FRAGMENT,
            }],
        );

        let compiled = RenderGraphCompiler::compile(vec![draw], &mut registry, 1, None, None).unwrap();
        let total_barriers: usize = compiled.nodes.iter().map(|n| n.barriers_before.len()).sum();
        assert_eq!(total_barriers, 1);
        assert_eq!(compiled.nodes[0].barriers_before[0].from, Layout::Undefined);
        assert_eq!(compiled.nodes[0].barriers_before[0].to, Layout::DepthTarget);
    }
}
