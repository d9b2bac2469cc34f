//! Shadow GPU-visible descriptor table (§4.E step 7).
//!
//! Grounded on the distilled source's `CreateShadowMapsDescriptorSet` /
//! `UpdateShadowMapsDSViewsData`: a bindless array of shadow-map 2D views, a
//! structured buffer of per-slot view-projection matrices, and a small
//! settings record giving each tier's contiguous index range so a shader can
//! classify a slot by tier without a lookup table. The per-slot uniform
//! follows this codebase's existing `bytemuck::{Pod, Zeroable}` derive idiom
//! for GPU-layout structs (e.g. `DynamicModelUniforms`).

use glam::Mat4;
use rustc_hash::FxHashMap;

use super::allocator::SlotId;
use super::quality::{ShadowMapQuality, TierCapacities};
use crate::renderer::rg::descriptor::{Binding, DescriptorSetState, DescriptorLifetime};
use crate::renderer::rg::handle::{BufferDef, ByteRange, Layout, MemoryDomain};
use crate::renderer::rg::RenderGraphBuilder;

/// One cube face's view-projection matrix as it lands in the GPU-visible
/// slot table, indexed by [`super::allocator::ShadowMapAllocator::first_face_index`].
#[repr(C)]
#[derive(Debug, Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ShadowSlotUniform {
    pub view_projection: [[f32; 4]; 4],
}

impl Default for ShadowSlotUniform {
    fn default() -> Self {
        Self {
            view_projection: Mat4::IDENTITY.to_cols_array_2d(),
        }
    }
}

/// Per-tier contiguous index ranges into the flattened face table, matching
/// the source's `high_quality_end_idx` / `medium_quality_end_idx` /
/// `low_quality_end_idx` settings record.
#[repr(C)]
#[derive(Debug, Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ShadowTableSettings {
    pub high_quality_end_idx: u32,
    pub medium_quality_end_idx: u32,
    pub low_quality_end_idx: u32,
    pub _pad: u32,
}

impl ShadowTableSettings {
    #[must_use]
    pub fn from_capacities(capacities: TierCapacities) -> Self {
        let high_end = capacities.high * 6;
        let medium_end = high_end + capacities.medium * 6;
        let low_end = medium_end + capacities.low * 6;
        Self {
            high_quality_end_idx: high_end,
            medium_quality_end_idx: medium_end,
            low_quality_end_idx: low_end,
            _pad: 0,
        }
    }
}

/// Caches the 6 per-face view-projection matrices for every currently
/// assigned (tier, slot), so the table can be re-uploaded every frame even
/// for lights that were not refreshed this frame (their shadow contents, and
/// therefore their matrices, are still valid).
#[derive(Default)]
pub struct ShadowSlotVpCache {
    by_slot: FxHashMap<(ShadowMapQuality, SlotId), [Mat4; 6]>,
}

impl ShadowSlotVpCache {
    pub fn update(&mut self, tier: ShadowMapQuality, slot: SlotId, faces: [Mat4; 6]) {
        self.by_slot.insert((tier, slot), faces);
    }

    /// Drops cached matrices for slots no longer held by any light, so a
    /// released-then-reacquired slot never briefly serves a stale matrix to
    /// the table builder.
    pub fn retain_assigned(&mut self, is_assigned: impl Fn(ShadowMapQuality, SlotId) -> bool) {
        self.by_slot.retain(|&(tier, slot), _| is_assigned(tier, slot));
    }

    #[must_use]
    pub fn faces(&self, tier: ShadowMapQuality, slot: SlotId) -> Option<&[Mat4; 6]> {
        self.by_slot.get(&(tier, slot))
    }
}

/// Builds the flattened per-face uniform table for every slot across every
/// assignable tier (§4.E step 7), in `first_face_index` order. Unassigned
/// slots fall back to the identity matrix, matching the default-uniform
/// idiom used elsewhere for unused buffer entries (`DynamicModelUniforms::default`).
#[must_use]
pub fn build_slot_table(
    allocator_first_face_index: impl Fn(ShadowMapQuality, SlotId) -> u32,
    capacities: TierCapacities,
    cache: &ShadowSlotVpCache,
) -> Vec<ShadowSlotUniform> {
    let total_faces = (capacities.total() * 6) as usize;
    let mut table = vec![ShadowSlotUniform::default(); total_faces];

    for tier in ShadowMapQuality::all_assignable() {
        for slot in 0..capacities.of(tier) {
            let Some(faces) = cache.faces(tier, slot) else { continue };
            let base = allocator_first_face_index(tier, slot) as usize;
            for (face, vp) in faces.iter().enumerate() {
                table[base + face] = ShadowSlotUniform {
                    view_projection: vp.to_cols_array_2d(),
                };
            }
        }
    }
    table
}

/// Records the per-slot VP buffer and settings buffer as graph resources and
/// assembles the bindless table's [`DescriptorSetState`] (§4.C step 6). The
/// actual byte upload is a write-access stand-in node with no execute
/// closure, the same "scheduling-only" shape this graph already uses for
/// `Fill`/`Copy` nodes recorded ahead of a real backend write.
pub fn upload_shadow_table(
    graph: &mut RenderGraphBuilder<'_>,
    table: &[ShadowSlotUniform],
    settings: ShadowTableSettings,
    max_bindless_faces: u32,
) -> crate::errors::Result<DescriptorSetState> {
    let vp_buffer_size = (table.len() * std::mem::size_of::<ShadowSlotUniform>()) as u64;
    let vp_view = graph.create_buffer_view(
        "shadow_table_vp_matrices",
        BufferDef {
            label: "shadow_table_vp_matrices",
            size: vp_buffer_size.max(1),
            usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_DST,
            domain: MemoryDomain::HostVisible,
        },
    )?;
    graph.fill_buffer(
        "upload_shadow_table_vp_matrices",
        vp_view,
        ByteRange { offset: 0, size: vp_buffer_size },
        0,
    );

    let settings_size = std::mem::size_of::<ShadowTableSettings>() as u64;
    let settings_view = graph.create_buffer_view(
        "shadow_table_settings",
        BufferDef {
            label: "shadow_table_settings",
            size: settings_size,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            domain: MemoryDomain::HostVisible,
        },
    )?;
    graph.fill_buffer(
        "upload_shadow_table_settings",
        settings_view,
        ByteRange { offset: 0, size: settings_size },
        0,
    );

    let mut face_views = Vec::with_capacity(max_bindless_faces as usize);
    for _ in 0..max_bindless_faces {
        face_views.push(graph.acquire_external_view(Layout::FragmentReadOnly)?);
    }

    let mut set = DescriptorSetState::new("shadow_table", DescriptorLifetime::Persistent);
    set.bind(0, Binding::Buffer { view: vp_view });
    set.bind(1, Binding::Constants { bytes: bytemuck::bytes_of(&settings).to_vec() });
    set.bind(2, Binding::BindlessArray { views: face_views });
    Ok(set)
}
