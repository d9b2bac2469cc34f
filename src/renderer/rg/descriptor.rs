//! Descriptor Set State: a typed binding collection resolved to concrete
//! descriptor writes at compile time (§3, §4.B, §4.C step 6).

use smallvec::SmallVec;

use super::access::{AccessKind, PipelineStageMask};
use super::handle::ViewHandle;

/// A single binding slot within a descriptor set.
#[derive(Debug, Clone)]
pub enum Binding {
    Constants { bytes: Vec<u8> },
    Texture { view: ViewHandle },
    Buffer { view: ViewHandle },
    Sampler { label: &'static str },
    BindlessArray { views: Vec<ViewHandle> },
}

impl Binding {
    /// The access kind implied by binding this slot, per the invariant that
    /// "a Descriptor Set State binding a view implicitly declares an access
    /// on that view in the stage it is bound to" (§3).
    #[must_use]
    pub fn implicit_access(&self) -> AccessKind {
        AccessKind::Read
    }
}

/// Lifetime class of a descriptor set: persistent sets are bound once across
/// frames, transient sets live until the GPU-finished event fires (§4.C step 6).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DescriptorLifetime {
    Persistent,
    Transient,
}

/// A typed binding collection created against the graph.
pub struct DescriptorSetState {
    pub label: &'static str,
    pub lifetime: DescriptorLifetime,
    pub bindings: SmallVec<[(u32, Binding); 8]>,
    /// Per-set write epoch: the frame index of the last write, used to
    /// decide whether a write may land directly or must target the set's
    /// next ring slot (Design Notes §9, write-epoch policy).
    pub last_write_frame: u64,
}

impl DescriptorSetState {
    #[must_use]
    pub fn new(label: &'static str, lifetime: DescriptorLifetime) -> Self {
        Self {
            label,
            lifetime,
            bindings: SmallVec::new(),
            last_write_frame: 0,
        }
    }

    pub fn bind(&mut self, slot: u32, binding: Binding) -> &mut Self {
        if let Some(existing) = self.bindings.iter_mut().find(|(s, _)| *s == slot) {
            existing.1 = binding;
        } else {
            self.bindings.push((slot, binding));
        }
        self
    }

    /// Returns `true` if a write issued during `frame_index` may land
    /// directly (no in-flight frame within `frames_in_flight` still
    /// references this set's previous contents).
    #[must_use]
    pub fn write_may_land_directly(&self, frame_index: u64, frames_in_flight: u64) -> bool {
        frame_index.saturating_sub(self.last_write_frame) >= frames_in_flight
    }

    /// The implicit accesses this descriptor set contributes to a node bound
    /// at `stages`.
    #[must_use]
    pub fn implicit_accesses(
        &self,
        stages: PipelineStageMask,
    ) -> SmallVec<[(ViewHandle, AccessKind, PipelineStageMask); 8]> {
        let mut out = SmallVec::new();
        for (_, binding) in &self.bindings {
            match binding {
                Binding::Texture { view } | Binding::Buffer { view } => {
                    out.push((*view, binding.implicit_access(), stages));
                }
                Binding::BindlessArray { views } => {
                    out.extend(views.iter().map(|&v| (v, binding.implicit_access(), stages)));
                }
                Binding::Constants { .. } | Binding::Sampler { .. } => {}
            }
        }
        out
    }
}
