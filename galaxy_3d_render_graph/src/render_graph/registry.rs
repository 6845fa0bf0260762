/// Resource registry
///
/// Owns every resource slot of a render graph. A slot is either temporary
/// (one graph lifetime), named (persists across frames, matched by name and
/// descriptor) or imported (externally owned object, never released by the
/// graph).
///
/// Named slots keep their GPU object and final access state when the graph
/// retires, so the next frame starts from exactly the state the previous
/// one left behind. Their generation is expired at retire time anyway:
/// a handle from frame N never validates in frame N+1, the next frame gets
/// a fresh handle to the same slot by registering the name again.

use rustc_hash::FxHashMap;
use crate::error::{Error, Result};
use crate::render_graph::handle::ResourceId;
use crate::render_graph::resource::{
    BackendResource, CompiledResource, ResourceBacking, ResourceDesc, RgResource,
};
use crate::render_graph::transient_cache::TransientResourceCache;
use crate::rhi::{RenderResourceAccessState, RhiDevice};
use crate::utils::SlotAllocator;
use crate::engine_warn;

#[derive(Debug)]
pub(crate) struct Slot {
    pub resource: RgResource,
    pub compiled: Option<CompiledResource>,
    /// Backing and final access carried over from the previous frame (named slots)
    pub persisted: Option<(BackendResource, RenderResourceAccessState)>,
    /// Registered during the current frame
    pub active: bool,
    pub last_active_frame: u64,
}

impl Slot {
    fn new(resource: RgResource, frame: u64) -> Self {
        Self {
            resource,
            compiled: None,
            persisted: None,
            active: true,
            last_active_frame: frame,
        }
    }
}

pub struct ResourceRegistry {
    allocator: SlotAllocator,
    slots: Vec<Option<Slot>>,
    named: FxHashMap<String, u32>,
    /// Slot of the swapchain back buffer imported this frame
    swapchain: Option<u32>,
    frame: u64,
}

impl ResourceRegistry {
    pub fn new() -> Self {
        Self {
            allocator: SlotAllocator::new(),
            slots: Vec::new(),
            named: FxHashMap::default(),
            swapchain: None,
            frame: 0,
        }
    }

    fn insert(&mut self, resource: RgResource) -> ResourceId {
        let (index, generation) = self.allocator.alloc();
        let slot = Slot::new(resource, self.frame);
        let position = index as usize;
        if position >= self.slots.len() {
            self.slots.resize_with(position + 1, || None);
        }
        self.slots[position] = Some(slot);
        ResourceId::new(index, generation)
    }

    fn remove(&mut self, index: u32) -> Option<Slot> {
        let slot = self.slots.get_mut(index as usize)?.take()?;
        self.allocator.free(index);
        Some(slot)
    }

    /// Fresh slot every call, never shared with another registration
    pub fn register_temporary(&mut self, desc: ResourceDesc) -> ResourceId {
        self.insert(RgResource::temporary(desc))
    }

    /// Look up a named slot, creating or recreating it as needed
    ///
    /// Same name and descriptor returns the current handle of the existing
    /// slot. A different descriptor recreates the slot: the new slot is
    /// allocated before the old one is freed, so old handles stop
    /// validating and the new handle never aliases them. The old GPU object
    /// goes back to `cache`.
    pub fn register_named(
        &mut self,
        name: &str,
        desc: ResourceDesc,
        cache: &mut TransientResourceCache,
    ) -> ResourceId {
        if let Some(&index) = self.named.get(name) {
            let frame = self.frame;
            let generation = self.allocator.generation(index);
            if let (Some(slot), Some(generation)) = (self.slot_mut(index), generation) {
                if slot.resource.desc == desc {
                    slot.active = true;
                    slot.last_active_frame = frame;
                    return ResourceId::new(index, generation);
                }
            }

            engine_warn!("galaxy3d::RenderGraph",
                "Named resource '{}' re-registered with a different descriptor, recreating it", name);
            let id = self.insert(RgResource::named(name, desc));
            if let Some(old) = self.remove(index) {
                Self::release_slot_backing(old, cache);
            }
            self.named.insert(name.to_string(), id.index);
            return id;
        }

        let id = self.insert(RgResource::named(name, desc));
        self.named.insert(name.to_string(), id.index);
        id
    }

    pub fn import(
        &mut self,
        resource: BackendResource,
        access: RenderResourceAccessState,
    ) -> ResourceId {
        let desc = resource.desc();
        self.insert(RgResource::imported(desc, Some(resource), access))
    }

    /// Import the swapchain back buffer, bound to a concrete texture at present time
    ///
    /// Only one swapchain slot exists per frame; importing again returns it.
    pub fn import_swapchain(&mut self, desc: ResourceDesc) -> ResourceId {
        if let Some(index) = self.swapchain {
            if let Some(generation) = self.allocator.generation(index) {
                return ResourceId::new(index, generation);
            }
        }
        let id = self.insert(RgResource::imported(desc, None, RenderResourceAccessState::UNDEFINED));
        self.swapchain = Some(id.index);
        id
    }

    /// Check that `id` names a live slot at its current generation
    pub fn validate(&self, id: ResourceId) -> Result<()> {
        if !id.is_valid() {
            return Err(Error::InvalidHandle("invalid resource id".to_string()));
        }
        if !self.allocator.is_live(id.index, id.generation) {
            return Err(Error::InvalidHandle(format!("stale resource id {}", id)));
        }
        Ok(())
    }

    pub fn is_valid(&self, id: ResourceId) -> bool {
        self.validate(id).is_ok()
    }

    pub(crate) fn slot(&self, index: u32) -> Option<&Slot> {
        self.slots.get(index as usize)?.as_ref()
    }

    pub(crate) fn slot_mut(&mut self, index: u32) -> Option<&mut Slot> {
        self.slots.get_mut(index as usize)?.as_mut()
    }

    pub fn resource(&self, id: ResourceId) -> Option<&RgResource> {
        self.validate(id).ok()?;
        self.slot(id.index).map(|slot| &slot.resource)
    }

    pub fn compiled(&self, id: ResourceId) -> Option<&CompiledResource> {
        self.validate(id).ok()?;
        self.slot(id.index)?.compiled.as_ref()
    }

    pub fn compiled_mut(&mut self, id: ResourceId) -> Option<&mut CompiledResource> {
        self.validate(id).ok()?;
        self.slot_mut(id.index)?.compiled.as_mut()
    }

    /// Current id of a named resource
    pub fn named_id(&self, name: &str) -> Option<ResourceId> {
        let index = *self.named.get(name)?;
        let generation = self.allocator.generation(index)?;
        Some(ResourceId::new(index, generation))
    }

    /// Current id of the swapchain slot, if imported this frame
    pub fn swapchain_id(&self) -> Option<ResourceId> {
        let index = self.swapchain?;
        let generation = self.allocator.generation(index)?;
        Some(ResourceId::new(index, generation))
    }

    /// Indices of slots registered during the current frame, ascending
    pub(crate) fn active_indices(&self) -> Vec<u32> {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.as_ref().is_some_and(|slot| slot.active))
            .map(|(index, _)| index as u32)
            .collect()
    }

    /// Number of allocated slots, including idle named slots
    pub fn slot_count(&self) -> u32 {
        self.allocator.len()
    }

    pub fn named_count(&self) -> usize {
        self.named.len()
    }

    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// Drop the backing of a removed slot: transient objects return to the
    /// cache, imported objects are left to their owner
    fn release_slot_backing(slot: Slot, cache: &mut TransientResourceCache) {
        if let ResourceBacking::Imported { .. } = slot.resource.backing {
            return;
        }
        let desc = slot.resource.desc;
        if let Some(resource) = slot.compiled.and_then(|compiled| compiled.resource) {
            cache.release(desc, resource);
        }
        if let Some((resource, _)) = slot.persisted {
            cache.release(desc, resource);
        }
    }

    /// End-of-frame cleanup
    ///
    /// Temporary and imported slots are freed, temporary objects go to
    /// `cache`. Active named slots persist their object and have their
    /// generation expired; the persisted access is the final compiled one
    /// when the frame was `executed`, and the pre-frame one otherwise. Named
    /// slots idle for more than `retention` frames are freed.
    pub fn retire(&mut self, cache: &mut TransientResourceCache, retention: u64, executed: bool) {
        let frame = self.frame;
        for index in 0..self.slots.len() as u32 {
            let Some(slot) = self.slot_mut(index) else { continue };

            if !slot.resource.is_named() {
                if let Some(slot) = self.remove(index) {
                    Self::release_slot_backing(slot, cache);
                }
                continue;
            }

            if slot.active {
                if let Some(compiled) = slot.compiled.take() {
                    let access = if executed { compiled.current_access } else { compiled.initial_access };
                    if let Some(resource) = compiled.resource {
                        slot.persisted = Some((resource, access));
                    }
                }
                slot.active = false;
                self.allocator.expire(index);
            } else if frame.saturating_sub(slot.last_active_frame) > retention {
                if let Some(slot) = self.remove(index) {
                    if let Some(name) = &slot.resource.name {
                        self.named.remove(name);
                    }
                    Self::release_slot_backing(slot, cache);
                }
            }
        }
        self.swapchain = None;
        self.frame += 1;
    }

    /// Destroy every object the registry still owns and free all slots
    pub fn destroy_all(&mut self, device: &mut dyn RhiDevice) {
        for index in 0..self.slots.len() as u32 {
            let Some(slot) = self.remove(index) else { continue };
            if slot.resource.is_imported() {
                continue;
            }
            if let Some(resource) = slot.compiled.and_then(|compiled| compiled.resource) {
                resource.destroy(device);
            }
            if let Some((resource, _)) = slot.persisted {
                resource.destroy(device);
            }
        }
        self.named.clear();
        self.swapchain = None;
    }
}

impl Default for ResourceRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
