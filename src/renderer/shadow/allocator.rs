//! Shadow-Map Allocator (§4.E): priority-driven, budgeted assignment of a
//! finite pool of cube-face shadow-map slots to point lights.
//!
//! Grounded directly on the distilled source's `ShadowMapsManagerSystem`
//! (`AssignShadowMaps` / `UpdateShadowMaps` / `AcquireAvaialableShadowMap` /
//! `ReleaseShadowMap`), since this codebase's teacher has no point-light
//! cube-shadow support at all (`LightKind::Point(_) => {}` is a literal
//! no-op in `renderer/graph/passes/shadow.rs`). The reconciliation algorithm
//! below reproduces the source's LIFO free-list and upgrade/downgrade queue
//! behavior exactly (§9's resolved Open Question).

use rustc_hash::{FxHashMap, FxHashSet};

use super::priority::{compute_light_priority, LightSample};
use super::quality::{ShadowMapQuality, TierCapacities};
use crate::errors::NyxError;
use crate::renderer::config::ShadowMapsSettings;

/// Index of a cube (6 faces) within its tier's slot pool.
pub type SlotId = u32;

#[derive(Debug, Clone, Copy)]
struct Assignment {
    tier: ShadowMapQuality,
    slot: SlotId,
}

/// A light queued to donate its current slot to a higher-priority upgrade,
/// should no free slot be available in the desired tier.
struct ReleaseInfo {
    light_id: u64,
    desired_tier: ShadowMapQuality,
}

/// Per-frame summary: which lights were (re-)assigned and which are due a
/// GPU re-render this frame.
#[derive(Debug, Default, Clone)]
pub struct ShadowFrameReport {
    /// Lights that must be rendered this frame: either just (re-)assigned a
    /// slot (unconditional, since its contents are stale/garbage) or chosen
    /// by the refresh-priority budget.
    pub refreshed: Vec<u64>,
    /// Upgrades actually performed this frame (bounded by `max_upgrades`).
    pub upgrades_performed: u32,
    /// Lights that wanted a higher tier but found no free slot and no donor.
    pub tier_exhausted: Vec<u64>,
}

/// The priority-driven, budgeted shadow-map slot pool (§4.E).
pub struct ShadowMapAllocator {
    capacities: TierCapacities,
    free_slots: FxHashMap<ShadowMapQuality, Vec<SlotId>>,
    assigned: FxHashMap<u64, Assignment>,
    /// `running_priority` per currently-assigned light (§3, Light Priority Record).
    update_priorities: FxHashMap<u64, f32>,
    max_upgrades_per_frame: u32,
    max_refreshes_per_frame: u32,
    pub projection_near_plane: f32,
}

impl ShadowMapAllocator {
    /// Builds the pool from persisted settings (§6, `ShadowMapsSettings`
    /// file). Config-load failure is fatal at construction per §4.E/§7;
    /// callers load the settings themselves and pass the parsed struct so
    /// this constructor never touches disk.
    #[must_use]
    pub fn new(settings: &ShadowMapsSettings) -> Self {
        let capacities = TierCapacities {
            high: settings.high_quality_shadow_maps,
            medium: settings.medium_quality_shadow_maps,
            low: settings.low_quality_shadow_maps,
        };

        let mut free_slots = FxHashMap::default();
        free_slots.insert(ShadowMapQuality::High, (0..capacities.high).collect());
        free_slots.insert(ShadowMapQuality::Medium, (0..capacities.medium).collect());
        free_slots.insert(ShadowMapQuality::Low, (0..capacities.low).collect());

        Self {
            capacities,
            free_slots,
            assigned: FxHashMap::default(),
            update_priorities: FxHashMap::default(),
            max_upgrades_per_frame: settings.max_shadow_maps_upgraded_per_frame,
            max_refreshes_per_frame: settings.max_shadow_maps_updated_per_frame,
            projection_near_plane: settings.projection_near_plane,
        }
    }

    #[must_use]
    pub const fn capacities(&self) -> TierCapacities {
        self.capacities
    }

    /// First cube-face texture index for `tier`'s local `slot` (§4.E
    /// implementation notes: tier ranges are contiguous, `high_quality_end_idx
    /// = high_capacity * 6`, etc., so shaders can classify a slot index by
    /// tier without a lookup).
    #[must_use]
    pub fn first_face_index(&self, tier: ShadowMapQuality, slot: SlotId) -> u32 {
        let base = match tier {
            ShadowMapQuality::High => 0,
            ShadowMapQuality::Medium => self.capacities.high * 6,
            ShadowMapQuality::Low => (self.capacities.high + self.capacities.medium) * 6,
            ShadowMapQuality::None => 0,
        };
        base + slot * 6
    }

    #[must_use]
    pub fn tier_of(&self, light_id: u64) -> ShadowMapQuality {
        self.assigned
            .get(&light_id)
            .map_or(ShadowMapQuality::None, |a| a.tier)
    }

    #[must_use]
    pub fn slot_of(&self, light_id: u64) -> Option<SlotId> {
        self.assigned.get(&light_id).map(|a| a.slot)
    }

    #[must_use]
    pub fn assigned_count(&self, tier: ShadowMapQuality) -> u32 {
        self.assigned.values().filter(|a| a.tier == tier).count() as u32
    }

    #[must_use]
    pub fn free_count(&self, tier: ShadowMapQuality) -> u32 {
        self.free_slots.get(&tier).map_or(0, |v| v.len() as u32)
    }

    fn acquire_available(&mut self, tier: ShadowMapQuality) -> Option<SlotId> {
        self.free_slots.get_mut(&tier).and_then(Vec::pop)
    }

    fn release(&mut self, tier: ShadowMapQuality, slot: SlotId) {
        self.free_slots.entry(tier).or_default().push(slot);
    }

    /// Bucket a rank (0-based, highest priority first) into its desired
    /// tier given the pool's capacities (§4.E step 2).
    fn tier_for_rank(&self, rank: usize) -> ShadowMapQuality {
        let rank = rank as u32;
        if rank < self.capacities.high {
            ShadowMapQuality::High
        } else if rank < self.capacities.high + self.capacities.medium {
            ShadowMapQuality::Medium
        } else {
            ShadowMapQuality::Low
        }
    }

    /// Runs one frame of the allocator: priority scoring, tier
    /// reconciliation (upgrades/downgrades within budget), release of
    /// no-longer-visible lights, and refresh-budget selection (§4.E steps
    /// 1-5). `lights` need only include point lights; anything else is the
    /// caller's concern.
    pub fn run_frame(
        &mut self,
        lights: &[LightSample],
        view_position: glam::Vec3,
        view_forward: glam::Vec3,
        dt: f32,
    ) -> ShadowFrameReport {
        let total_capacity = self.capacities.total() as usize;
        let shadow_maps_in_use = total_capacity.min(lights.len());

        let mut ranked: Vec<(u64, f32)> = lights
            .iter()
            .map(|l| {
                let current_tier = self.tier_of(l.light_id);
                (l.light_id, compute_light_priority(view_position, view_forward, l, current_tier))
            })
            .collect();
        // Highest priority first; ties broken by light_id for determinism
        // (the source relies on `nth_element`/`sort` over a vector with no
        // explicit tie-break, which is still deterministic for a single
        // process but not guaranteed stable across unordered inputs here).
        ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal).then(a.0.cmp(&b.0)));

        let previous = std::mem::take(&mut self.assigned);
        let mut visible = FxHashSet::default();
        let mut new_assigned: FxHashMap<u64, Assignment> = FxHashMap::default();
        let mut upgrade_queue: Vec<(u64, ShadowMapQuality)> = Vec::new();
        let mut release_queue: FxHashMap<ShadowMapQuality, Vec<ReleaseInfo>> = FxHashMap::default();

        for (rank, &(light_id, _)) in ranked.iter().take(shadow_maps_in_use).enumerate() {
            visible.insert(light_id);
            let current = previous.get(&light_id).copied();
            let current_tier = current.map_or(ShadowMapQuality::None, |a| a.tier);
            let desired_tier = self.tier_for_rank(rank);

            match current_tier.cmp(&desired_tier) {
                std::cmp::Ordering::Less => {
                    if (upgrade_queue.len() as u32) < self.max_upgrades_per_frame {
                        if let Some(a) = current {
                            self.release(a.tier, a.slot);
                        }
                        upgrade_queue.push((light_id, desired_tier));
                    } else if let Some(a) = current {
                        new_assigned.insert(light_id, a);
                        release_queue
                            .entry(current_tier)
                            .or_default()
                            .push(ReleaseInfo { light_id, desired_tier });
                    }
                    // current == None and budget exhausted: gets nothing this frame.
                }
                std::cmp::Ordering::Greater => {
                    // current_tier > desired_tier, and `None` is the lowest
                    // tier, so `current` is always `Some` here.
                    if let Some(a) = current {
                        new_assigned.insert(light_id, a);
                        release_queue
                            .entry(current_tier)
                            .or_default()
                            .push(ReleaseInfo { light_id, desired_tier });
                    }
                }
                std::cmp::Ordering::Equal => {
                    if let Some(a) = current {
                        new_assigned.insert(light_id, a);
                    }
                }
            }
        }

        // Lights no longer in the candidate set release their slots unconditionally.
        for (&light_id, &a) in &previous {
            if !visible.contains(&light_id) {
                self.release(a.tier, a.slot);
            }
        }

        // Process the upgrade stack lowest-priority-first among the budgeted
        // set (reverse, then pop from the back), matching the source's
        // `std::reverse` + `pop_back` pairing.
        upgrade_queue.reverse();

        let mut report = ShadowFrameReport::default();
        let mut newly_slotted: Vec<u64> = Vec::new();

        while let Some((light_id, desired_tier)) = upgrade_queue.pop() {
            let slot = if let Some(slot) = self.acquire_available(desired_tier) {
                Some(slot)
            } else if let Some(info) = release_queue.get_mut(&desired_tier).and_then(Vec::pop) {
                let donor = new_assigned
                    .remove(&info.light_id)
                    .expect("release-queue entry always has a tracked assignment");
                if info.desired_tier != ShadowMapQuality::None {
                    upgrade_queue.push((info.light_id, info.desired_tier));
                }
                Some(donor.slot)
            } else {
                None
            };

            match slot {
                Some(slot) => {
                    new_assigned.insert(light_id, Assignment { tier: desired_tier, slot });
                    newly_slotted.push(light_id);
                    report.upgrades_performed += 1;
                }
                None => {
                    // TierExhausted (§7): recovered by leaving the light unassigned
                    // this frame; it remains a top candidate next frame.
                    report.tier_exhausted.push(light_id);
                }
            }
        }

        self.assigned = new_assigned;

        self.update_refresh_priorities(&newly_slotted, dt);
        report.refreshed = self.select_refreshes(&newly_slotted);
        report
    }

    fn update_refresh_priorities(&mut self, newly_slotted: &[u64], dt: f32) {
        let forced: FxHashSet<u64> = newly_slotted.iter().copied().collect();
        let assigned_ids: Vec<u64> = self.assigned.keys().copied().collect();
        for light_id in assigned_ids {
            let tier = self.assigned[&light_id].tier;
            if forced.contains(&light_id) {
                self.update_priorities.insert(light_id, 0.0);
                continue;
            }
            let entry = self.update_priorities.entry(light_id).or_insert(0.0);
            let next = *entry + dt * tier.tier_weight();
            // PriorityOverflow (§7): a non-finite accumulation is clamped to zero.
            *entry = if next.is_finite() { next } else { 0.0 };
        }
        self.update_priorities.retain(|id, _| self.assigned.contains_key(id));
    }

    /// Selects up to `max_refreshes_per_frame` lights for re-rendering:
    /// every newly-(re)assigned light unconditionally, then the highest
    /// `running_priority` lights up to the budget (§4.E step 5).
    fn select_refreshes(&mut self, newly_slotted: &[u64]) -> Vec<u64> {
        let mut refreshed: Vec<u64> = newly_slotted.to_vec();
        let forced: FxHashSet<u64> = refreshed.iter().copied().collect();

        if (refreshed.len() as u32) < self.max_refreshes_per_frame {
            let mut candidates: Vec<(u64, f32)> = self
                .update_priorities
                .iter()
                .filter(|(id, _)| !forced.contains(id))
                .map(|(&id, &p)| (id, p))
                .collect();
            candidates.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal).then(a.0.cmp(&b.0)));

            for (light_id, _) in candidates {
                if refreshed.len() as u32 >= self.max_refreshes_per_frame {
                    break;
                }
                refreshed.push(light_id);
                self.update_priorities.insert(light_id, 0.0);
            }
        }
        refreshed
    }
}

impl ShadowFrameReport {
    /// Surfaces `TierExhausted` for diagnostics without treating it as fatal
    /// (§7: shadow allocator errors are always recovered internally — a
    /// light that couldn't be upgraded this frame just stays a top
    /// candidate next frame).
    #[must_use]
    pub fn first_error(&self) -> Option<NyxError> {
        self.tier_exhausted
            .first()
            .map(|&light_id| NyxError::TierExhausted(format!("light {light_id}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    fn settings(high: u32, medium: u32, low: u32, max_upgrades: u32, max_refreshes: u32) -> ShadowMapsSettings {
        ShadowMapsSettings {
            high_quality_shadow_maps: high,
            medium_quality_shadow_maps: medium,
            low_quality_shadow_maps: low,
            max_shadow_maps_upgraded_per_frame: max_upgrades,
            max_shadow_maps_updated_per_frame: max_refreshes,
            projection_near_plane: 0.04,
        }
    }

    fn light(id: u64, x: f32, intensity: f32) -> LightSample {
        LightSample {
            light_id: id,
            position: Vec3::new(x, 0.0, 0.0),
            radius: 2.0,
            intensity,
        }
    }

    #[test]
    fn assigned_plus_free_equals_capacity_per_tier() {
        let mut alloc = ShadowMapAllocator::new(&settings(1, 1, 2, 10, 10));
        let lights = [light(1, 1.0, 90.0), light(2, 3.0, 70.0), light(3, 6.0, 10.0), light(4, 9.0, 5.0)];
        for _ in 0..5 {
            alloc.run_frame(&lights, Vec3::ZERO, -Vec3::Z, 0.1);
            for tier in ShadowMapQuality::all_assignable() {
                assert_eq!(
                    alloc.assigned_count(tier) + alloc.free_count(tier),
                    alloc.capacities().of(tier)
                );
            }
        }
    }

    #[test]
    fn upgrades_never_exceed_budget_in_a_single_frame() {
        let mut alloc = ShadowMapAllocator::new(&settings(2, 2, 2, 1, 10));
        let lights: Vec<LightSample> = (0..6).map(|i| light(i, i as f32, 100.0 - i as f32)).collect();
        for _ in 0..3 {
            let report = alloc.run_frame(&lights, Vec3::ZERO, -Vec3::Z, 0.1);
            assert!(report.upgrades_performed <= 1);
        }
    }

    #[test]
    fn a_light_holds_at_most_one_slot() {
        let mut alloc = ShadowMapAllocator::new(&settings(1, 2, 2, 10, 10));
        let lights: Vec<LightSample> = (0..5).map(|i| light(i, i as f32 * 2.0, 50.0)).collect();
        alloc.run_frame(&lights, Vec3::ZERO, -Vec3::Z, 0.1);
        alloc.run_frame(&lights, Vec3::ZERO, -Vec3::Z, 0.1);
        // Each assigned light_id maps to exactly one (tier, slot) pair by construction
        // (FxHashMap<light_id, Assignment>); this test guards against a future
        // refactor accidentally allowing duplicate entries via a Vec.
        let mut seen = FxHashSet::default();
        for light in &lights {
            if alloc.tier_of(light.light_id) != ShadowMapQuality::None {
                assert!(seen.insert(light.light_id));
            }
        }
    }

    #[test]
    fn with_ample_capacity_every_visible_light_converges_to_its_bucket_tier() {
        // 3 lights, capacity for all 3 at distinct tiers, generous budgets:
        // after enough frames every light reaches the tier its priority rank implies.
        let mut alloc = ShadowMapAllocator::new(&settings(1, 1, 1, 10, 10));
        let lights = [light(1, 0.5, 100.0), light(2, 5.0, 50.0), light(3, 12.0, 1.0)];
        for _ in 0..4 {
            alloc.run_frame(&lights, Vec3::ZERO, -Vec3::Z, 0.1);
        }
        assert_eq!(alloc.tier_of(1), ShadowMapQuality::High);
        assert_eq!(alloc.tier_of(2), ShadowMapQuality::Medium);
        assert_eq!(alloc.tier_of(3), ShadowMapQuality::Low);
    }

    #[test]
    fn refresh_budget_is_respected_and_all_lights_eventually_refresh() {
        let mut alloc = ShadowMapAllocator::new(&settings(8, 0, 0, 8, 2));
        let lights: Vec<LightSample> = (0..8).map(|i| light(i, i as f32, 50.0)).collect();
        // First frame: all 8 lights are newly assigned, so all 8 refresh
        // unconditionally (the budget only caps *additional* refresh-priority
        // picks beyond lights that just received a slot).
        let first = alloc.run_frame(&lights, Vec3::ZERO, -Vec3::Z, 0.1);
        assert_eq!(first.refreshed.len(), 8);

        // From here on no new slots are handed out, so each frame refreshes
        // exactly `max_refreshes` lights chosen by accumulated priority.
        let mut ever_refreshed: FxHashSet<u64> = first.refreshed.into_iter().collect();
        for _ in 0..4 {
            let report = alloc.run_frame(&lights, Vec3::ZERO, -Vec3::Z, 0.1);
            assert_eq!(report.refreshed.len(), 2);
            ever_refreshed.extend(report.refreshed);
        }
        assert_eq!(ever_refreshed.len(), 8);
    }

    #[test]
    fn lights_outside_the_candidate_set_release_their_slots() {
        let mut alloc = ShadowMapAllocator::new(&settings(1, 0, 0, 10, 10));
        let lone = [light(1, 0.0, 100.0)];
        alloc.run_frame(&lone, Vec3::ZERO, -Vec3::Z, 0.1);
        assert_eq!(alloc.tier_of(1), ShadowMapQuality::High);

        // A far more important light bumps light 1 out of the single High slot.
        let two = [light(1, 0.0, 100.0), light(2, 0.1, 100.0)];
        alloc.run_frame(&two, Vec3::ZERO, -Vec3::Z, 0.1);
        assert_eq!(alloc.free_count(ShadowMapQuality::High) + alloc.assigned_count(ShadowMapQuality::High), 1);
    }

    #[test]
    fn nan_priority_input_does_not_poison_the_pool() {
        let mut alloc = ShadowMapAllocator::new(&settings(1, 1, 1, 10, 10));
        let lights = [LightSample { light_id: 1, position: Vec3::NAN, radius: 1.0, intensity: 1.0 }];
        let report = alloc.run_frame(&lights, Vec3::ZERO, -Vec3::Z, 0.1);
        assert!(report.refreshed.iter().all(|id| *id == 1) || report.refreshed.is_empty());
    }
}
