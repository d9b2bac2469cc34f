//! Bridges [`super::allocator::ShadowMapAllocator`] to the orchestrator's
//! [`RenderSystem`] capability set (§4.E step 3, §4.D integration).
//!
//! Follows this codebase's own `world_matrix.translation` /
//! `world_matrix.transform_vector3(-Vec3::Z)` idiom for deriving a world
//! position/direction from a node's transform (`scene/scene.rs`'s
//! `iter_active_lights` call sites), applied here to the active camera
//! instead of a light.

use glam::{Mat4, Vec3};
use rustc_hash::{FxHashMap, FxHashSet};

use crate::errors::Result;
use crate::scene::light::LightKind;
use crate::scene::Scene;

use super::allocator::{ShadowFrameReport, ShadowMapAllocator, SlotId};
use super::descriptor::{build_slot_table, upload_shadow_table, ShadowSlotVpCache, ShadowTableSettings};
use super::priority::LightSample;
use super::quality::ShadowMapQuality;
use super::views::build_point_light_cube_views;
use crate::renderer::frame_ctx::FrameContext;
use crate::renderer::orchestrator::system::RenderSystem;
use crate::renderer::orchestrator::view::{RenderStage, StageMask, View, ViewId};
use crate::renderer::rg::{DescriptorSetState, RenderGraphBuilder};

/// Reserves the high half of the `ViewId` space for shadow-cube faces, so
/// ids never collide with the main view's `0` or other systems' low-counter ids.
fn cube_face_view_id(light_id: u64, face_index: u32) -> ViewId {
    (1u64 << 63) | (light_id.wrapping_mul(8) << 3) | u64::from(face_index & 0x7)
}

/// Registers the shadow-map pool as a frame-driven [`RenderSystem`]:
/// `update` runs one allocator frame from the scene's point lights and main
/// camera, `collect_views` appends the 6 cube-face views for every light
/// refreshed this frame.
pub struct ShadowAllocatorSystem {
    allocator: ShadowMapAllocator,
    last_report: ShadowFrameReport,
    /// Snapshot of this frame's point lights, keyed by id, so
    /// `collect_views` doesn't need to re-walk the scene.
    last_lights: FxHashMap<u64, LightSample>,
    /// Per-slot cube-face view-projection matrices, kept across frames so a
    /// slot whose light wasn't refreshed this frame still has a valid entry
    /// in the uploaded table (§4.E step 7).
    vp_cache: ShadowSlotVpCache,
    /// The bindless shadow table built in `render_scene_wide`, kept alive
    /// for the rest of the frame so later stages can bind it.
    table_descriptor: Option<DescriptorSetState>,
}

impl ShadowAllocatorSystem {
    #[must_use]
    pub fn new(allocator: ShadowMapAllocator) -> Self {
        Self {
            allocator,
            last_report: ShadowFrameReport::default(),
            last_lights: FxHashMap::default(),
            vp_cache: ShadowSlotVpCache::default(),
            table_descriptor: None,
        }
    }

    #[must_use]
    pub fn allocator(&self) -> &ShadowMapAllocator {
        &self.allocator
    }

    #[must_use]
    pub fn last_report(&self) -> &ShadowFrameReport {
        &self.last_report
    }

    /// The bindless shadow descriptor set built by the last
    /// `render_scene_wide` call, if any, for systems that need to bind it
    /// explicitly rather than relying on the orchestrator's standing bind.
    #[must_use]
    pub fn table_descriptor(&self) -> Option<&DescriptorSetState> {
        self.table_descriptor.as_ref()
    }

    /// Drops cached per-slot matrices for any (tier, slot) no longer held by
    /// a tracked light, keyed off this frame's snapshot (§4.E step 7).
    fn prune_vp_cache(&mut self) {
        let assigned: FxHashSet<(ShadowMapQuality, SlotId)> = self
            .last_lights
            .keys()
            .filter_map(|&light_id| {
                let tier = self.allocator.tier_of(light_id);
                if tier == ShadowMapQuality::None {
                    return None;
                }
                self.allocator.slot_of(light_id).map(|slot| (tier, slot))
            })
            .collect();
        self.vp_cache.retain_assigned(|tier, slot| assigned.contains(&(tier, slot)));
    }

    fn collect_point_lights(scene: &Scene) -> Vec<LightSample> {
        scene
            .iter_active_lights()
            .filter_map(|(light, world_matrix)| match &light.kind {
                LightKind::Point(point) if light.cast_shadows => Some(LightSample {
                    light_id: light.id,
                    position: world_matrix.translation.to_vec3(),
                    radius: point.range,
                    intensity: light.intensity,
                }),
                _ => None,
            })
            .collect()
    }

    fn main_camera_position_and_forward(scene: &Scene) -> (Vec3, Vec3) {
        scene
            .main_camera_node()
            .map(|node| {
                let world = node.transform.world_matrix();
                (
                    world.translation.to_vec3(),
                    world.transform_vector3(-Vec3::Z).normalize_or_zero(),
                )
            })
            .unwrap_or((Vec3::ZERO, -Vec3::Z))
    }
}

impl RenderSystem for ShadowAllocatorSystem {
    fn name(&self) -> &'static str {
        "shadow_allocator"
    }

    fn update(&mut self, scene: &Scene, frame: &FrameContext) {
        let lights = Self::collect_point_lights(scene);
        let (position, forward) = Self::main_camera_position_and_forward(scene);
        self.last_report = self.allocator.run_frame(&lights, position, forward, frame.delta_time);
        self.last_lights = lights.into_iter().map(|l| (l.light_id, l)).collect();
        self.prune_vp_cache();
    }

    fn collect_views(&mut self, _scene: &Scene, _existing: &[View], out: &mut Vec<View>) {
        for &light_id in &self.last_report.refreshed {
            let tier = self.allocator.tier_of(light_id);
            let Some(slot) = self.allocator.slot_of(light_id) else { continue };
            if tier == ShadowMapQuality::None {
                continue;
            }
            let Some(sample) = self.last_lights.get(&light_id) else { continue };

            let first_face = self.allocator.first_face_index(tier, slot);
            let faces = build_point_light_cube_views(
                light_id,
                0,
                sample.position,
                sample.radius,
                self.allocator.projection_near_plane,
                tier.resolution(),
                first_face,
            );
            let mut vps = [Mat4::IDENTITY; 6];
            for (face, face_view) in faces.into_iter().enumerate() {
                vps[face] = face_view.view_projection;
                let id = cube_face_view_id(light_id, face as u32);
                out.push(View::new(id, face_view, StageMask::shadow_only()));
            }
            self.vp_cache.update(tier, slot, vps);
        }
    }

    fn render_scene_wide(
        &mut self,
        _views: &[View],
        _frame: &FrameContext,
        graph: &mut RenderGraphBuilder<'_>,
    ) -> Result<()> {
        let capacities = self.allocator.capacities();
        let table = build_slot_table(
            |tier, slot| self.allocator.first_face_index(tier, slot),
            capacities,
            &self.vp_cache,
        );
        let settings = ShadowTableSettings::from_capacities(capacities);
        let max_bindless_faces = capacities.total() * 6;

        let set = upload_shadow_table(graph, &table, settings, max_bindless_faces)?;
        self.table_descriptor = Some(set);
        graph.bind_descriptor_sets(&[self.table_descriptor.as_ref().unwrap()]);
        Ok(())
    }

    fn interested_stages(&self) -> &'static [RenderStage] {
        &[RenderStage::ShadowMap]
    }

    fn render_per_frame(
        &mut self,
        _stage: RenderStage,
        _view: &mut View,
        _frame: &FrameContext,
        _graph: &mut RenderGraphBuilder<'_>,
    ) -> Result<()> {
        // Depth rendering into the acquired cube faces is a separate
        // registered system's job (§1 Non-goals); this system owns
        // allocation, view construction, and the GPU-visible table upload.
        Ok(())
    }

    fn finish_frame(&mut self) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::config::ShadowMapsSettings;
    use crate::scene::light::Light;
    use glam::Vec3;

    fn settings() -> ShadowMapsSettings {
        ShadowMapsSettings {
            high_quality_shadow_maps: 2,
            medium_quality_shadow_maps: 2,
            low_quality_shadow_maps: 2,
            max_shadow_maps_upgraded_per_frame: 6,
            max_shadow_maps_updated_per_frame: 6,
            projection_near_plane: 0.04,
        }
    }

    #[test]
    fn frame_produces_six_views_per_refreshed_point_light() {
        let mut scene = Scene::new();
        let mut light = Light::new_point(Vec3::ONE, 50.0, 5.0);
        light.cast_shadows = true;
        scene.add_light(light);

        let mut system = ShadowAllocatorSystem::new(ShadowMapAllocator::new(&settings()));
        let frame = FrameContext::new();
        system.update(&scene, &frame);

        let mut out = Vec::new();
        system.collect_views(&scene, &[], &mut out);
        assert_eq!(out.len(), 6);
        for view in &out {
            assert!(view.supported_stages.supports(RenderStage::ShadowMap));
            assert!(!view.supported_stages.supports(RenderStage::ForwardOpaque));
        }
    }
}
