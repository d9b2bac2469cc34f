//! Benchmarks the Render Graph Compiler's dependency-build, scheduling, and
//! barrier-synthesis passes (§4.C) over chains of dependent nodes of
//! increasing length, the same shape as `rg::compiler`'s own unit tests but
//! scaled up.

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};

use nyx::renderer::rg::access::{AccessDescriptor, AccessKind, PipelineStageMask};
use nyx::renderer::rg::compiler::RenderGraphCompiler;
use nyx::renderer::rg::handle::{ByteRange, MemoryDomain, ResourceRegistry, SubresourceRange, TextureAspect, TextureDef};
use nyx::renderer::rg::node::{NodeKind, RgNode};

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

/// Builds a straight-line chain of `len` nodes alternating writes and reads
/// over the *same* view, so every node depends on exactly its predecessor:
/// the worst case for the compiler's last-writer/readers-since walk (every
/// subresource transitions at every step).
fn chain_of_nodes(len: usize, registry: &mut ResourceRegistry) -> Vec<RgNode> {
    let handle = registry.create_texture(texture_def("chain")).unwrap();
    let view = registry
        .create_texture_view(handle, SubresourceRange::full(1, 1))
        .unwrap();

    let mut nodes = Vec::with_capacity(len);
    for i in 0..len {
        let kind = if i % 2 == 0 {
            AccessKind::Write
        } else {
            AccessKind::Read
        };
        nodes.push(RgNode {
            id: i as u32,
            name: format!("node_{i}"),
            kind: NodeKind::Fill {
                view,
                range: ByteRange { offset: 0, size: 0 },
                value: 0,
            },
            accesses: vec![AccessDescriptor {
                view,
                kind,
                stages: PipelineStageMask::TRANSFER,
            }],
            execute: None,
        });
    }
    nodes
}

fn bench_compile(c: &mut Criterion) {
    let mut group = c.benchmark_group("rg_compile_chain");
    for &len in &[16usize, 64, 256] {
        group.bench_with_input(BenchmarkId::from_parameter(len), &len, |b, &len| {
            b.iter_batched(
                || {
                    let mut registry = ResourceRegistry::new();
                    let nodes = chain_of_nodes(len, &mut registry);
                    (nodes, registry)
                },
                |(nodes, mut registry)| {
                    RenderGraphCompiler::compile(nodes, &mut registry, 1, None, None).unwrap()
                },
                criterion::BatchSize::SmallInput,
            );
        });
    }
    group.finish();
}

criterion_group!(benches, bench_compile);
criterion_main!(benches);
