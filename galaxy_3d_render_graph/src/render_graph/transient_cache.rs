/// Transient resource cache
///
/// Pools GPU objects released by retired graphs so later frames asking for
/// the same descriptor reuse them instead of creating new ones. Matching is
/// exact descriptor equality. Entries that sit unused for longer than the
/// retention window are destroyed by an explicit eviction pass.

use rustc_hash::FxHashMap;
use slotmap::SlotMap;
use crate::engine_trace;
use crate::render_graph::resource::{BackendResource, ResourceDesc};
use crate::rhi::RhiDevice;

slotmap::new_key_type! {
    /// Key of a pooled entry
    pub struct CacheEntryKey;
}

#[derive(Debug)]
struct CacheEntry {
    desc: ResourceDesc,
    resource: BackendResource,
    /// Frame the entry was released in
    last_used: u64,
}

/// Hit/miss/eviction counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
}

#[derive(Debug, Default)]
pub struct TransientResourceCache {
    entries: SlotMap<CacheEntryKey, CacheEntry>,
    /// Pooled entries per descriptor, most recently released last
    free: FxHashMap<ResourceDesc, Vec<CacheEntryKey>>,
    /// Object address to entry, to catch double releases
    by_address: FxHashMap<usize, CacheEntryKey>,
    frame: u64,
    stats: CacheStats,
}

impl TransientResourceCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take a pooled object matching `desc`, None on a miss
    ///
    /// The most recently released match is returned first.
    pub fn acquire(&mut self, desc: &ResourceDesc) -> Option<BackendResource> {
        let Some(key) = self.free.get_mut(desc).and_then(Vec::pop) else {
            self.stats.misses += 1;
            return None;
        };
        let entry = self.entries.remove(key)?;
        self.by_address.remove(&entry.resource.address());
        self.stats.hits += 1;
        Some(entry.resource)
    }

    /// Return an object to the pool, tagged with the current frame
    ///
    /// # Panics
    ///
    /// Panics if the same object is already pooled.
    pub fn release(&mut self, desc: ResourceDesc, resource: BackendResource) {
        let address = resource.address();
        assert!(
            !self.by_address.contains_key(&address),
            "resource released twice into the transient cache"
        );
        debug_assert_eq!(desc, resource.desc(), "released resource does not match its descriptor");

        let key = self.entries.insert(CacheEntry {
            desc,
            resource,
            last_used: self.frame,
        });
        self.free.entry(desc).or_default().push(key);
        self.by_address.insert(address, key);
    }

    pub fn begin_frame(&mut self, frame: u64) {
        self.frame = frame;
    }

    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// Destroy entries released more than `retention` frames ago
    ///
    /// Returns the number of destroyed entries.
    pub fn evict_unused(&mut self, device: &mut dyn RhiDevice, retention: u64) -> usize {
        let frame = self.frame;
        let expired: Vec<CacheEntryKey> = self
            .entries
            .iter()
            .filter(|(_, entry)| frame.saturating_sub(entry.last_used) > retention)
            .map(|(key, _)| key)
            .collect();

        for key in &expired {
            if let Some(entry) = self.entries.remove(*key) {
                if let Some(list) = self.free.get_mut(&entry.desc) {
                    list.retain(|k| k != key);
                    if list.is_empty() {
                        self.free.remove(&entry.desc);
                    }
                }
                self.by_address.remove(&entry.resource.address());
                entry.resource.destroy(device);
            }
        }

        if !expired.is_empty() {
            engine_trace!("galaxy3d::TransientResourceCache",
                "Evicted {} unused resource(s) at frame {}", expired.len(), frame);
        }
        self.stats.evictions += expired.len() as u64;
        expired.len()
    }

    /// Destroy every pooled object
    pub fn destroy_all(&mut self, device: &mut dyn RhiDevice) {
        for (_, entry) in self.entries.drain() {
            entry.resource.destroy(device);
        }
        self.free.clear();
        self.by_address.clear();
    }

    /// Whether this exact object is pooled
    pub fn contains(&self, resource: &BackendResource) -> bool {
        self.by_address.contains_key(&resource.address())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn stats(&self) -> CacheStats {
        self.stats
    }
}

#[cfg(test)]
#[path = "transient_cache_tests.rs"]
mod tests;
