//! Resource Registry: typed handles and arenas for render-graph resources.
//!
//! Mirrors the "Ensure -> Check -> Rebuild" capacity-growth idiom used by
//! [`crate::renderer::core::resources::ResourceManager`], generalized into an
//! arena + generation scheme so a handle is an index into an owning arena plus
//! an owner id checked on dereference (see Design Notes, "Cyclic / back-reference
//! graphs").

use std::sync::atomic::{AtomicU32, Ordering};

use crate::errors::{NyxError, Result};

static NEXT_OWNER_ID: AtomicU32 = AtomicU32::new(1);

fn next_owner_id() -> u32 {
    NEXT_OWNER_ID.fetch_add(1, Ordering::Relaxed)
}

/// Generational slot index into a [`Registry`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Slot {
    index: u32,
    generation: u32,
    owner: u32,
}

/// A generation-checked arena. Handles into it remain valid (but may point at
/// a freed, reused slot) until the generation is bumped on release.
pub struct Registry<T> {
    owner: u32,
    slots: Vec<Option<T>>,
    /// Current generation of each index, kept alive independently of
    /// `slots` so a removed slot's generation survives the tombstone and can
    /// be bumped before the index is ever handed back out by `insert`.
    generations: Vec<u32>,
    free: Vec<u32>,
}

impl<T> Default for Registry<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Registry<T> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            owner: next_owner_id(),
            slots: Vec::new(),
            generations: Vec::new(),
            free: Vec::new(),
        }
    }

    pub fn insert(&mut self, value: T) -> Slot {
        if let Some(index) = self.free.pop() {
            self.slots[index as usize] = Some(value);
            Slot {
                index,
                generation: self.generations[index as usize],
                owner: self.owner,
            }
        } else {
            let index = self.slots.len() as u32;
            self.slots.push(Some(value));
            self.generations.push(0);
            Slot {
                index,
                generation: 0,
                owner: self.owner,
            }
        }
    }

    pub fn get(&self, slot: Slot) -> Result<&T> {
        self.check(slot)?;
        Ok(self.slots[slot.index as usize].as_ref().unwrap())
    }

    pub fn get_mut(&mut self, slot: Slot) -> Result<&mut T> {
        self.check(slot)?;
        Ok(self.slots[slot.index as usize].as_mut().unwrap())
    }

    pub fn remove(&mut self, slot: Slot) -> Result<T> {
        self.check(slot)?;
        let value = self.slots[slot.index as usize].take().unwrap();
        // Bump the generation so a `Slot` captured before this `remove` no
        // longer passes `check` once this index is handed back out.
        self.generations[slot.index as usize] += 1;
        self.free.push(slot.index);
        Ok(value)
    }

    fn check(&self, slot: Slot) -> Result<()> {
        if slot.owner != self.owner {
            return Err(NyxError::OutOfRange(format!(
                "handle {:?} does not belong to this registry",
                slot
            )));
        }
        match (self.slots.get(slot.index as usize), self.generations.get(slot.index as usize)) {
            (Some(Some(_)), Some(generation)) if *generation == slot.generation => Ok(()),
            _ => Err(NyxError::OutOfRange(format!(
                "handle {:?} is stale or was released",
                slot
            ))),
        }
    }
}

macro_rules! typed_handle {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub struct $name(pub(crate) Slot);
    };
}

typed_handle!(TextureHandle);
typed_handle!(BufferHandle);
typed_handle!(ViewHandle);

/// Which aspect of a texture a view addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureAspect {
    Color,
    Depth,
    Stencil,
}

/// GPU memory domain for a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MemoryDomain {
    DeviceLocal,
    HostVisible,
}

/// Immutable creation parameters for a texture.
#[derive(Debug, Clone)]
pub struct TextureDef {
    pub label: &'static str,
    pub width: u32,
    pub height: u32,
    pub depth_or_array_layers: u32,
    pub mip_level_count: u32,
    pub format: wgpu::TextureFormat,
    pub usage: wgpu::TextureUsages,
    pub aspect: TextureAspect,
    pub domain: MemoryDomain,
}

/// Immutable creation parameters for a buffer.
#[derive(Debug, Clone)]
pub struct BufferDef {
    pub label: &'static str,
    pub size: u64,
    pub usage: wgpu::BufferUsages,
    pub domain: MemoryDomain,
}

/// Mutable layout/access state tracked per resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Layout {
    Undefined,
    General,
    ColorTarget,
    DepthTarget,
    TransferSrc,
    TransferDst,
    PresentSrc,
    FragmentReadOnly,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubresourceRange {
    pub base_mip: u32,
    pub mip_count: u32,
    pub base_layer: u32,
    pub layer_count: u32,
}

impl SubresourceRange {
    #[must_use]
    pub const fn full(mip_count: u32, layer_count: u32) -> Self {
        Self {
            base_mip: 0,
            mip_count,
            base_layer: 0,
            layer_count,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    pub offset: u64,
    pub size: u64,
}

enum ResourceKind {
    Texture { def: TextureDef, layout: Layout },
    Buffer { def: BufferDef },
    /// A resource borrowed from a long-lived owner for the duration of the frame.
    External { layout: Layout },
}

struct ResourceEntry {
    kind: ResourceKind,
    refcount: u32,
    transient: bool,
}

enum ViewKind {
    Texture(SubresourceRange),
    Buffer(ByteRange),
}

struct ViewEntry {
    resource: Slot,
    kind: ViewKind,
}

/// The per-frame (or persistent) resource registry: Component A of the core.
///
/// Handles are refcounted; the last holder releases the GPU allocation only
/// after the frame in which it was last used has signalled its GPU-finished
/// event (tracked by [`crate::renderer::frame_ctx::FrameContext`]).
#[derive(Default)]
pub struct ResourceRegistry {
    resources: Registry<ResourceEntry>,
    views: Registry<ViewEntry>,
}

impl ResourceRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create_texture(&mut self, def: TextureDef) -> Result<TextureHandle> {
        if def.usage.is_empty() {
            return Err(NyxError::InvalidDefinition(format!(
                "texture '{}' has an empty usage mask",
                def.label
            )));
        }
        if def.width == 0 || def.height == 0 {
            return Err(NyxError::OutOfMemory(format!(
                "texture '{}' requested with zero extent",
                def.label
            )));
        }
        let slot = self.resources.insert(ResourceEntry {
            kind: ResourceKind::Texture {
                def,
                layout: Layout::Undefined,
            },
            refcount: 1,
            transient: true,
        });
        Ok(TextureHandle(slot))
    }

    pub fn create_buffer(&mut self, def: BufferDef) -> Result<BufferHandle> {
        if def.usage.is_empty() {
            return Err(NyxError::InvalidDefinition(format!(
                "buffer '{}' has an empty usage mask",
                def.label
            )));
        }
        if def.size == 0 {
            return Err(NyxError::OutOfMemory(format!(
                "buffer '{}' requested with zero size",
                def.label
            )));
        }
        let slot = self.resources.insert(ResourceEntry {
            kind: ResourceKind::Buffer { def },
            refcount: 1,
            transient: true,
        });
        Ok(BufferHandle(slot))
    }

    pub fn create_texture_view(
        &mut self,
        handle: TextureHandle,
        range: SubresourceRange,
    ) -> Result<ViewHandle> {
        let entry = self.resources.get(handle.0)?;
        if let ResourceKind::Texture { def, .. } = &entry.kind {
            if range.base_mip + range.mip_count > def.mip_level_count
                || range.base_layer + range.layer_count > def.depth_or_array_layers
            {
                return Err(NyxError::OutOfRange(format!(
                    "subresource range exceeds texture '{}'",
                    def.label
                )));
            }
        }
        let slot = self.views.insert(ViewEntry {
            resource: handle.0,
            kind: ViewKind::Texture(range),
        });
        Ok(ViewHandle(slot))
    }

    pub fn create_buffer_view(
        &mut self,
        handle: BufferHandle,
        range: ByteRange,
    ) -> Result<ViewHandle> {
        let entry = self.resources.get(handle.0)?;
        if let ResourceKind::Buffer { def } = &entry.kind {
            if range.offset + range.size > def.size {
                return Err(NyxError::OutOfRange(format!(
                    "byte range exceeds buffer '{}'",
                    def.label
                )));
            }
        }
        let slot = self.views.insert(ViewEntry {
            resource: handle.0,
            kind: ViewKind::Buffer(range),
        });
        Ok(ViewHandle(slot))
    }

    /// Borrows a resource owned elsewhere (swapchain image, persistent atlas)
    /// for the duration of the current graph. The owner retains the lifetime.
    pub fn adopt_external(&mut self, initial_layout: Layout) -> Result<ViewHandle> {
        let resource = self.resources.insert(ResourceEntry {
            kind: ResourceKind::External {
                layout: initial_layout,
            },
            refcount: 1,
            transient: false,
        });
        let slot = self.views.insert(ViewEntry {
            resource,
            kind: ViewKind::Texture(SubresourceRange::full(1, 1)),
        });
        Ok(ViewHandle(slot))
    }

    pub fn view_resource(&self, view: ViewHandle) -> Result<Slot> {
        Ok(self.views.get(view.0)?.resource)
    }

    pub fn layout_of(&self, resource: Slot) -> Result<Layout> {
        match &self.resources.get(resource)?.kind {
            ResourceKind::Texture { layout, .. } | ResourceKind::External { layout } => {
                Ok(*layout)
            }
            ResourceKind::Buffer { .. } => Ok(Layout::General),
        }
    }

    pub fn set_layout(&mut self, resource: Slot, layout: Layout) -> Result<()> {
        match &mut self.resources.get_mut(resource)?.kind {
            ResourceKind::Texture { layout: l, .. } | ResourceKind::External { layout: l } => {
                *l = layout;
            }
            ResourceKind::Buffer { .. } => {}
        }
        Ok(())
    }

    pub fn is_transient(&self, resource: Slot) -> Result<bool> {
        Ok(self.resources.get(resource)?.transient)
    }

    /// Increment a resource's refcount (another holder retains it).
    pub fn retain(&mut self, resource: Slot) -> Result<()> {
        self.resources.get_mut(resource)?.refcount += 1;
        Ok(())
    }

    /// Decrement a resource's refcount; releases the GPU allocation once it
    /// reaches zero. Callers are expected to only call this once the owning
    /// frame's GPU-finished event has signalled.
    pub fn release(&mut self, resource: Slot) -> Result<bool> {
        let entry = self.resources.get_mut(resource)?;
        entry.refcount = entry.refcount.saturating_sub(1);
        if entry.refcount == 0 {
            self.resources.remove(resource)?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    /// Resolves the underlying resource slot a view addresses. Two views
    /// addressing the same resource share this key for dependency tracking
    /// (§4.C step 1).
    #[must_use]
    pub fn resource_key(&self, view: ViewHandle) -> Option<Slot> {
        self.views.get(view.0).ok().map(|v| v.resource)
    }

    /// `true` if `a` and `b` address overlapping bytes/subresources of the
    /// same underlying resource. Views on different resources never overlap.
    pub fn views_overlap(&self, a: ViewHandle, b: ViewHandle) -> Result<bool> {
        let ea = self.views.get(a.0)?;
        let eb = self.views.get(b.0)?;
        if ea.resource != eb.resource {
            return Ok(false);
        }
        Ok(match (&ea.kind, &eb.kind) {
            (ViewKind::Texture(ra), ViewKind::Texture(rb)) => subresource_ranges_overlap(ra, rb),
            (ViewKind::Buffer(ra), ViewKind::Buffer(rb)) => byte_ranges_overlap(ra, rb),
            _ => true,
        })
    }

    /// An approximate byte footprint for a resource, used by the transient
    /// aliasing pass to bucket resources by size (§4.C step 5). Textures are
    /// approximated at 4 bytes/texel, which is conservative for the smaller
    /// compressed/packed formats this codebase also uses.
    pub fn resource_footprint(&self, resource: Slot) -> Result<u64> {
        match &self.resources.get(resource)?.kind {
            ResourceKind::Texture { def, .. } => Ok(u64::from(def.width)
                * u64::from(def.height)
                * u64::from(def.depth_or_array_layers)
                * u64::from(def.mip_level_count.max(1))
                * 4),
            ResourceKind::Buffer { def } => Ok(def.size),
            ResourceKind::External { .. } => Ok(0),
        }
    }

    /// Label of the underlying resource, for diagnostics and capture export.
    pub fn resource_label(&self, resource: Slot) -> Result<&'static str> {
        match &self.resources.get(resource)?.kind {
            ResourceKind::Texture { def, .. } => Ok(def.label),
            ResourceKind::Buffer { def } => Ok(def.label),
            ResourceKind::External { .. } => Ok("<external>"),
        }
    }
}

fn subresource_ranges_overlap(a: &SubresourceRange, b: &SubresourceRange) -> bool {
    let mips_overlap = a.base_mip < b.base_mip + b.mip_count && b.base_mip < a.base_mip + a.mip_count;
    let layers_overlap =
        a.base_layer < b.base_layer + b.layer_count && b.base_layer < a.base_layer + a.layer_count;
    mips_overlap && layers_overlap
}

fn byte_ranges_overlap(a: &ByteRange, b: &ByteRange) -> bool {
    a.offset < b.offset + b.size && b.offset < a.offset + a.size
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tex_def(label: &'static str) -> TextureDef {
        TextureDef {
            label,
            width: 64,
            height: 64,
            depth_or_array_layers: 1,
            mip_level_count: 1,
            format: wgpu::TextureFormat::Rgba8Unorm,
            usage: wgpu::TextureUsages::TEXTURE_BINDING,
            aspect: TextureAspect::Color,
            domain: MemoryDomain::DeviceLocal,
        }
    }

    #[test]
    fn rejects_empty_usage() {
        let mut reg = ResourceRegistry::new();
        let mut def = tex_def("bad");
        def.usage = wgpu::TextureUsages::empty();
        assert!(matches!(
            reg.create_texture(def),
            Err(NyxError::InvalidDefinition(_))
        ));
    }

    #[test]
    fn view_out_of_range_is_rejected() {
        let mut reg = ResourceRegistry::new();
        let handle = reg.create_texture(tex_def("depth")).unwrap();
        let bad_range = SubresourceRange::full(2, 1); // only 1 mip exists
        assert!(matches!(
            reg.create_texture_view(handle, bad_range),
            Err(NyxError::OutOfRange(_))
        ));
    }

    #[test]
    fn handle_from_other_registry_is_rejected() {
        let mut reg_a = ResourceRegistry::new();
        let mut reg_b = ResourceRegistry::new();
        let handle = reg_a.create_texture(tex_def("a")).unwrap();
        let _ = reg_b.create_texture(tex_def("b")).unwrap();
        assert!(reg_b.create_texture_view(handle, SubresourceRange::full(1, 1)).is_err());
    }

    #[test]
    fn refcount_releases_on_last_holder() {
        let mut reg = ResourceRegistry::new();
        let handle = reg.create_texture(tex_def("shared")).unwrap();
        reg.retain(handle.0).unwrap();
        assert!(!reg.release(handle.0).unwrap());
        assert!(reg.release(handle.0).unwrap());
    }

    #[test]
    fn adopted_external_round_trips_layout() {
        let mut reg = ResourceRegistry::new();
        let view = reg.adopt_external(Layout::PresentSrc).unwrap();
        let resource = reg.view_resource(view).unwrap();
        assert_eq!(reg.layout_of(resource).unwrap(), Layout::PresentSrc);
        reg.set_layout(resource, Layout::FragmentReadOnly).unwrap();
        assert_eq!(reg.layout_of(resource).unwrap(), Layout::FragmentReadOnly);
    }

    #[test]
    fn stale_handle_after_slot_reuse_is_rejected() {
        let mut reg: Registry<u32> = Registry::new();
        let first = reg.insert(1);
        reg.remove(first).unwrap();
        // Reuses `first`'s index; must not reuse its generation.
        let second = reg.insert(2);
        assert_eq!(first.index, second.index);
        assert_ne!(first.generation, second.generation);

        assert!(matches!(reg.get(first), Err(NyxError::OutOfRange(_))));
        assert_eq!(*reg.get(second).unwrap(), 2);
    }
}
