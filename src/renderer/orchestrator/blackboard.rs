//! Per-view blackboard: a typed heterogeneous map keyed by value type,
//! generalizing the old fixed-field `FrameBlackboard`
//! (`renderer/graph/frame.rs`) so new stage-result types do not require
//! editing a struct definition.

use std::any::{Any, TypeId};

use rustc_hash::FxHashMap;

/// Holds one boxed value per distinct `T`. Later stages read what earlier
/// stages wrote; a missing entry is a stage-skip condition for whatever
/// reads it (§3).
#[derive(Default)]
pub struct Blackboard {
    entries: FxHashMap<TypeId, Box<dyn Any + Send>>,
}

impl Blackboard {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert<T: Send + 'static>(&mut self, value: T) {
        self.entries.insert(TypeId::of::<T>(), Box::new(value));
    }

    #[must_use]
    pub fn get<T: Send + 'static>(&self) -> Option<&T> {
        self.entries.get(&TypeId::of::<T>()).and_then(|v| v.downcast_ref())
    }

    #[must_use]
    pub fn get_mut<T: Send + 'static>(&mut self) -> Option<&mut T> {
        self.entries
            .get_mut(&TypeId::of::<T>())
            .and_then(|v| v.downcast_mut())
    }

    #[must_use]
    pub fn contains<T: Send + 'static>(&self) -> bool {
        self.entries.contains_key(&TypeId::of::<T>())
    }

    pub fn remove<T: Send + 'static>(&mut self) -> Option<T> {
        self.entries
            .remove(&TypeId::of::<T>())
            .and_then(|v| v.downcast().ok())
            .map(|boxed| *boxed)
    }

    /// Cleared at the start of each view's frame; entries do not persist
    /// across frames (§3, Blackboard lifetime).
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct DepthPrepassData {
        min_depth: f32,
    }

    #[derive(Debug, PartialEq)]
    struct ViewSpecShadingParameters {
        roughness_bias: f32,
    }

    #[test]
    fn typed_entries_do_not_collide() {
        let mut board = Blackboard::new();
        board.insert(DepthPrepassData { min_depth: 0.1 });
        board.insert(ViewSpecShadingParameters { roughness_bias: 0.2 });

        assert_eq!(board.get::<DepthPrepassData>().unwrap().min_depth, 0.1);
        assert_eq!(
            board.get::<ViewSpecShadingParameters>().unwrap().roughness_bias,
            0.2
        );
    }

    #[test]
    fn missing_entry_is_none() {
        let board = Blackboard::new();
        assert!(board.get::<DepthPrepassData>().is_none());
    }

    #[test]
    fn clear_removes_all_entries() {
        let mut board = Blackboard::new();
        board.insert(DepthPrepassData { min_depth: 1.0 });
        board.clear();
        assert!(!board.contains::<DepthPrepassData>());
    }
}
