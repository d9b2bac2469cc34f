//! Per-light shadow-map priority scoring (§4.E step 1).
//!
//! Reproduces `ComputeLocalLightShadowMapPriority` exactly: the named
//! constants and weighting below are normative, not tunable defaults, per
//! the grounding in the expanded spec's §4.E implementation notes.

use glam::Vec3;

use super::quality::ShadowMapQuality;

const MAX_DISTANCE_TO_LIGHT: f32 = 15.0;
const MAX_RADIUS: f32 = 5.0;
const MAX_Z_DIFFERENCE: f32 = 7.0;
const MAX_INTENSITY: f32 = 100.0;

const CURRENT_QUALITY_MULTIPLIER: f32 = 0.5;
const DOT_MULTIPLIER: f32 = 4.0;
const DISTANCE_MULTIPLIER: f32 = 1.7;
const RADIUS_MULTIPLIER: f32 = 0.6;
const Z_DIFFERENCE_MULTIPLIER: f32 = 0.7;
const INTENSITY_MULTIPLIER: f32 = 0.7;
const IN_RADIUS_PRIORITY: f32 = 10.0;

/// A point light's data as seen by the allocator, decoupled from [`crate::scene::Scene`]
/// so the priority formula and reconciliation algorithm can be unit-tested
/// without a scene graph.
#[derive(Debug, Clone, Copy)]
pub struct LightSample {
    pub light_id: u64,
    pub position: Vec3,
    /// The point light's influence radius (far plane of its shadow views).
    pub radius: f32,
    /// Luminous intensity/power, used for the `(g) luminous power` priority term.
    pub intensity: f32,
}

/// Computes a single light's shadow-map priority for this frame, given the
/// main view's position/forward and the light's *current* tier (so
/// already-assigned lights resist churn). A NaN result (e.g. a
/// zero-length view-to-light vector feeding the dot-product term) is
/// treated as zero per §4.E failure semantics.
#[must_use]
pub fn compute_light_priority(
    view_position: Vec3,
    view_forward: Vec3,
    light: &LightSample,
    current_tier: ShadowMapQuality,
) -> f32 {
    let distance_to_light = (light.position - (view_position + view_forward * 3.0)).length();
    let view_to_light = light.position - view_position;
    let view_and_light_dot = if distance_to_light >= MAX_RADIUS {
        let dir = view_to_light.normalize_or_zero();
        view_forward.dot(dir)
    } else {
        1.0
    };

    let z_difference = light.position.z - view_position.z;

    let mut priority = 0.0f32;

    if distance_to_light < light.radius {
        priority += IN_RADIUS_PRIORITY;
    }

    priority += (1.0 - (distance_to_light / MAX_DISTANCE_TO_LIGHT).clamp(0.0, 1.0)) * DISTANCE_MULTIPLIER;
    priority += (view_and_light_dot * 0.5 + 0.5) * DOT_MULTIPLIER;
    priority += (1.0 - (z_difference / MAX_Z_DIFFERENCE).clamp(0.0, 1.0)) * Z_DIFFERENCE_MULTIPLIER;
    priority += current_tier.current_tier_bonus_rank() * CURRENT_QUALITY_MULTIPLIER;
    priority += (light.radius / MAX_RADIUS).clamp(0.0, 1.0) * RADIUS_MULTIPLIER;
    priority += (light.intensity / MAX_INTENSITY).clamp(0.0, 1.0) * INTENSITY_MULTIPLIER;

    if priority.is_nan() { 0.0 } else { priority }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(id: u64, position: Vec3, radius: f32, intensity: f32) -> LightSample {
        LightSample {
            light_id: id,
            position,
            radius,
            intensity,
        }
    }

    #[test]
    fn light_inside_view_radius_gets_flat_bonus() {
        let view_pos = Vec3::ZERO;
        let forward = -Vec3::Z;
        let near = sample(1, Vec3::new(0.0, 0.0, -1.0), 5.0, 50.0);
        let far = sample(2, Vec3::new(0.0, 0.0, -20.0), 1.0, 50.0);
        let p_near = compute_light_priority(view_pos, forward, &near, ShadowMapQuality::None);
        let p_far = compute_light_priority(view_pos, forward, &far, ShadowMapQuality::None);
        assert!(p_near > p_far);
    }

    #[test]
    fn current_tier_adds_churn_resistance_bonus() {
        let view_pos = Vec3::ZERO;
        let forward = -Vec3::Z;
        let light = sample(1, Vec3::new(0.0, 0.0, -10.0), 1.0, 10.0);
        let p_none = compute_light_priority(view_pos, forward, &light, ShadowMapQuality::None);
        let p_high = compute_light_priority(view_pos, forward, &light, ShadowMapQuality::High);
        assert!(p_high > p_none);
    }

    #[test]
    fn degenerate_view_to_light_vector_does_not_propagate_nan() {
        let light = sample(1, Vec3::ZERO, 1.0, 10.0);
        // distance_to_light becomes (view + forward*3 - light).length(); still finite
        // here, so exercise the explicit zero-length normalize path directly too.
        let priority = compute_light_priority(Vec3::ZERO, Vec3::ZERO, &light, ShadowMapQuality::None);
        assert!(priority.is_finite());
        assert!(priority >= 0.0);
    }
}
