//! Shadow-map quality tiers (§3, Shadow-Map Slot; §4.E).
//!
//! Grounded on the distilled source's `EShadowMapQuality` enum
//! (`ShadowMapsManagerSystem.h`): three quality tiers plus `None` for an
//! unassigned light, each with a fixed resolution and a `tier_weight` used
//! by the refresh-priority accumulation in [`super::allocator`].

/// A point light's shadow-map quality tier, or no assignment at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ShadowMapQuality {
    None,
    Low,
    Medium,
    High,
}

impl ShadowMapQuality {
    /// Resolution (in texels) of one cube face at this tier. Fixed per the
    /// source's `constants::` table.
    #[must_use]
    pub const fn resolution(self) -> u32 {
        match self {
            Self::None => 0,
            Self::Low => 256,
            Self::Medium => 512,
            Self::High => 1024,
        }
    }

    /// Weight applied to `dt` when accumulating a light's refresh priority
    /// (`UpdateShadowMaps`'s `GetPriorityMultiplierForQuality`): higher tiers
    /// accumulate refresh urgency faster since stale high-resolution shadows
    /// are more visually noticeable.
    #[must_use]
    pub const fn tier_weight(self) -> f32 {
        match self {
            Self::None => 0.0,
            Self::Low => 0.5,
            Self::Medium => 1.0,
            Self::High => 2.0,
        }
    }

    /// Bonus applied in `ComputeLocalLightShadowMapPriority` for a light's
    /// *current* tier, so an already-assigned light resists churn from a
    /// momentarily-higher-priority newcomer.
    #[must_use]
    pub const fn current_tier_bonus_rank(self) -> f32 {
        match self {
            Self::None => 0.0,
            Self::Low => 0.25,
            Self::Medium => 0.5,
            Self::High => 1.0,
        }
    }

    #[must_use]
    pub const fn all_assignable() -> [Self; 3] {
        [Self::High, Self::Medium, Self::Low]
    }
}

/// One tier's slot count (a bucket of rank-contiguous candidates is
/// assigned this tier by [`super::allocator::ShadowMapAllocator`]).
#[derive(Debug, Clone, Copy, Default)]
pub struct TierCapacities {
    pub high: u32,
    pub medium: u32,
    pub low: u32,
}

impl TierCapacities {
    #[must_use]
    pub const fn total(self) -> u32 {
        self.high + self.medium + self.low
    }

    #[must_use]
    pub const fn of(self, tier: ShadowMapQuality) -> u32 {
        match tier {
            ShadowMapQuality::High => self.high,
            ShadowMapQuality::Medium => self.medium,
            ShadowMapQuality::Low => self.low,
            ShadowMapQuality::None => 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tiers_order_low_to_high() {
        assert!(ShadowMapQuality::None < ShadowMapQuality::Low);
        assert!(ShadowMapQuality::Low < ShadowMapQuality::Medium);
        assert!(ShadowMapQuality::Medium < ShadowMapQuality::High);
    }

    #[test]
    fn resolutions_match_fixed_table() {
        assert_eq!(ShadowMapQuality::High.resolution(), 1024);
        assert_eq!(ShadowMapQuality::Medium.resolution(), 512);
        assert_eq!(ShadowMapQuality::Low.resolution(), 256);
    }
}
