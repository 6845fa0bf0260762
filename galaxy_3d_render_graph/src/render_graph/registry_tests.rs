//! Unit tests for the resource registry

use std::sync::Arc;
use super::*;
use crate::render_graph::resource::ResourceLifetime;
use crate::rhi::mock_device::{MockBuffer, MockDevice};
use crate::rhi::{BarrierState, BufferDesc, TextureDesc, TextureFormat};

fn buffer_desc(size: u64) -> ResourceDesc {
    ResourceDesc::Buffer(BufferDesc::new_size(size))
}

/// Give a slot a backing object and a final state, as compile would
fn fake_compile(registry: &mut ResourceRegistry, id: ResourceId, device: &mut MockDevice, state: BarrierState) {
    let desc = registry.resource(id).unwrap().desc;
    let resource = BackendResource::create(device, &desc).unwrap();
    let mut lifetime = ResourceLifetime::default();
    lifetime.touch(0);
    registry.slot_mut(id.index).unwrap().compiled = Some(CompiledResource {
        resource: Some(resource),
        initial_access: RenderResourceAccessState::UNDEFINED,
        current_access: state.into(),
        lifetime,
    });
}

// ============================================================================
// TEMPORARY RESOURCES
// ============================================================================

#[test]
fn test_temporary_registrations_never_alias() {
    let mut registry = ResourceRegistry::new();
    let a = registry.register_temporary(buffer_desc(512));
    let b = registry.register_temporary(buffer_desc(512));

    assert_ne!(a.index, b.index);
    assert!(registry.is_valid(a) && registry.is_valid(b));
    assert_eq!(registry.slot_count(), 2);
    assert_eq!(registry.active_indices(), vec![a.index, b.index]);
}

#[test]
fn test_validate_rejects_invalid_and_stale() {
    let mut registry = ResourceRegistry::new();
    let mut cache = TransientResourceCache::new();
    assert!(matches!(registry.validate(ResourceId::INVALID), Err(Error::InvalidHandle(_))));

    let id = registry.register_temporary(buffer_desc(64));
    registry.retire(&mut cache, 3, true);
    assert!(matches!(registry.validate(id), Err(Error::InvalidHandle(_))));
    assert!(registry.resource(id).is_none());
}

#[test]
fn test_retire_returns_temporaries_to_cache() {
    let mut device = MockDevice::new();
    let mut registry = ResourceRegistry::new();
    let mut cache = TransientResourceCache::new();

    let id = registry.register_temporary(buffer_desc(256));
    fake_compile(&mut registry, id, &mut device, BarrierState::ComputeShaderWrite);
    registry.retire(&mut cache, 3, true);

    assert_eq!(registry.slot_count(), 0);
    assert_eq!(cache.len(), 1);
    assert!(cache.acquire(&buffer_desc(256)).is_some());
    assert_eq!(registry.frame(), 1);
}

// ============================================================================
// NAMED RESOURCES
// ============================================================================

#[test]
fn test_named_same_descriptor_returns_same_handle() {
    let mut registry = ResourceRegistry::new();
    let mut cache = TransientResourceCache::new();

    let a = registry.register_named("history", buffer_desc(512), &mut cache);
    let b = registry.register_named("history", buffer_desc(512), &mut cache);
    assert_eq!(a, b);
    assert_eq!(registry.named_count(), 1);
    assert_eq!(registry.named_id("history"), Some(a));
}

#[test]
fn test_named_mismatch_recreates_slot() {
    let mut registry = ResourceRegistry::new();
    let mut cache = TransientResourceCache::new();

    let old = registry.register_named("history", buffer_desc(512), &mut cache);
    let new = registry.register_named("history", buffer_desc(256), &mut cache);

    assert_ne!(old.index, new.index);
    assert!(!registry.is_valid(old));
    assert!(registry.is_valid(new));
    assert_eq!(registry.named_id("history"), Some(new));
    assert_eq!(registry.resource(new).unwrap().desc, buffer_desc(256));
}

#[test]
fn test_named_mismatch_releases_old_backing_to_cache() {
    let mut device = MockDevice::new();
    let mut registry = ResourceRegistry::new();
    let mut cache = TransientResourceCache::new();

    let old = registry.register_named("history", buffer_desc(512), &mut cache);
    fake_compile(&mut registry, old, &mut device, BarrierState::ComputeShaderWrite);
    registry.retire(&mut cache, 3, true);
    assert!(cache.is_empty());

    registry.register_named("history", buffer_desc(256), &mut cache);
    assert_eq!(cache.len(), 1);
    assert!(cache.acquire(&buffer_desc(512)).is_some());
}

#[test]
fn test_named_persists_backing_and_state_across_retire() {
    let mut device = MockDevice::new();
    let mut registry = ResourceRegistry::new();
    let mut cache = TransientResourceCache::new();

    let frame0 = registry.register_named("history", buffer_desc(512), &mut cache);
    fake_compile(&mut registry, frame0, &mut device, BarrierState::ComputeShaderWrite);
    registry.retire(&mut cache, 3, true);

    assert!(!registry.is_valid(frame0));
    assert!(cache.is_empty());

    let frame1 = registry.register_named("history", buffer_desc(512), &mut cache);
    assert_eq!(frame1.index, frame0.index);
    assert_ne!(frame1.generation, frame0.generation);

    let slot = registry.slot(frame1.index).unwrap();
    let (_, access) = slot.persisted.as_ref().unwrap();
    assert_eq!(access.barrier, BarrierState::ComputeShaderWrite);
}

#[test]
fn test_named_keeps_pre_frame_state_when_not_executed() {
    let mut device = MockDevice::new();
    let mut registry = ResourceRegistry::new();
    let mut cache = TransientResourceCache::new();

    let frame0 = registry.register_named("history", buffer_desc(512), &mut cache);
    fake_compile(&mut registry, frame0, &mut device, BarrierState::ComputeShaderWrite);
    registry.retire(&mut cache, 3, false);

    let frame1 = registry.register_named("history", buffer_desc(512), &mut cache);
    let slot = registry.slot(frame1.index).unwrap();
    let (_, access) = slot.persisted.as_ref().unwrap();
    assert_eq!(access.barrier, BarrierState::Undefined);
    assert!(cache.is_empty());
}

#[test]
fn test_idle_named_resource_is_freed_after_retention() {
    let mut device = MockDevice::new();
    let mut registry = ResourceRegistry::new();
    let mut cache = TransientResourceCache::new();

    let id = registry.register_named("history", buffer_desc(512), &mut cache);
    fake_compile(&mut registry, id, &mut device, BarrierState::ComputeShaderWrite);
    registry.retire(&mut cache, 1, true);

    // Idle for one frame: kept
    registry.retire(&mut cache, 1, true);
    assert_eq!(registry.named_count(), 1);

    // Idle for two frames: freed
    registry.retire(&mut cache, 1, true);
    assert_eq!(registry.named_count(), 0);
    assert_eq!(registry.slot_count(), 0);
    assert_eq!(cache.len(), 1);
}

// ============================================================================
// IMPORTS
// ============================================================================

#[test]
fn test_imported_objects_are_not_released() {
    let mut registry = ResourceRegistry::new();
    let mut cache = TransientResourceCache::new();
    let buffer: Arc<dyn crate::rhi::Buffer> = Arc::new(MockBuffer {
        id: 1,
        desc: BufferDesc::new_vertex_buffer(1024),
    });

    let id = registry.import(BackendResource::Buffer(buffer), BarrierState::VertexBuffer.into());
    assert!(registry.resource(id).unwrap().is_imported());

    registry.retire(&mut cache, 3, true);
    assert!(cache.is_empty());
    assert_eq!(registry.slot_count(), 0);
}

#[test]
fn test_swapchain_import_is_unique_per_frame() {
    let mut registry = ResourceRegistry::new();
    let mut cache = TransientResourceCache::new();
    let desc = ResourceDesc::Texture(TextureDesc::new_2d(800, 600, TextureFormat::B8G8R8A8_UNORM));

    let a = registry.import_swapchain(desc);
    let b = registry.import_swapchain(desc);
    assert_eq!(a, b);
    assert_eq!(registry.swapchain_id(), Some(a));
    assert!(registry.resource(a).unwrap().is_swapchain());

    registry.retire(&mut cache, 3, true);
    assert_eq!(registry.swapchain_id(), None);
}

// ============================================================================
// SHUTDOWN
// ============================================================================

#[test]
fn test_destroy_all_destroys_persisted_objects() {
    let mut device = MockDevice::new();
    let mut registry = ResourceRegistry::new();
    let mut cache = TransientResourceCache::new();

    let id = registry.register_named("history", buffer_desc(512), &mut cache);
    fake_compile(&mut registry, id, &mut device, BarrierState::ComputeShaderWrite);
    registry.retire(&mut cache, 3, true);

    registry.destroy_all(&mut device);
    assert_eq!(device.count("destroy_buffer:512"), 1);
    assert_eq!(registry.slot_count(), 0);
    assert_eq!(registry.named_count(), 0);
}
