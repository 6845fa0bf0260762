/// Render graph resource records: descriptors, backing and compiled state

use std::sync::Arc;
use crate::error::Result;
use crate::render_graph::handle::ResourceKind;
use crate::rhi::{Buffer, BufferDesc, RenderResourceAccessState, RhiDevice, Texture, TextureDesc};

// ============================================================================
// ResourceDesc
// ============================================================================

/// Descriptor of a graph resource, also the transient cache key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceDesc {
    Buffer(BufferDesc),
    Texture(TextureDesc),
}

impl ResourceDesc {
    pub fn kind(&self) -> ResourceKind {
        match self {
            ResourceDesc::Buffer(_) => ResourceKind::Buffer,
            ResourceDesc::Texture(_) => ResourceKind::Texture,
        }
    }

    pub fn is_valid(&self) -> bool {
        match self {
            ResourceDesc::Buffer(desc) => desc.is_valid(),
            ResourceDesc::Texture(desc) => desc.is_valid(),
        }
    }

    pub fn as_buffer(&self) -> Option<&BufferDesc> {
        match self {
            ResourceDesc::Buffer(desc) => Some(desc),
            ResourceDesc::Texture(_) => None,
        }
    }

    pub fn as_texture(&self) -> Option<&TextureDesc> {
        match self {
            ResourceDesc::Texture(desc) => Some(desc),
            ResourceDesc::Buffer(_) => None,
        }
    }
}

// ============================================================================
// BackendResource
// ============================================================================

/// Concrete GPU object backing a graph resource
#[derive(Debug, Clone)]
pub enum BackendResource {
    Buffer(Arc<dyn Buffer>),
    Texture(Arc<dyn Texture>),
}

impl BackendResource {
    /// Create the object described by `desc` on `device`
    pub fn create(device: &mut dyn RhiDevice, desc: &ResourceDesc) -> Result<Self> {
        match desc {
            ResourceDesc::Buffer(desc) => Ok(BackendResource::Buffer(device.create_buffer(desc)?)),
            ResourceDesc::Texture(desc) => Ok(BackendResource::Texture(device.create_texture(desc)?)),
        }
    }

    pub fn kind(&self) -> ResourceKind {
        match self {
            BackendResource::Buffer(_) => ResourceKind::Buffer,
            BackendResource::Texture(_) => ResourceKind::Texture,
        }
    }

    pub fn desc(&self) -> ResourceDesc {
        match self {
            BackendResource::Buffer(buffer) => ResourceDesc::Buffer(*buffer.desc()),
            BackendResource::Texture(texture) => ResourceDesc::Texture(*texture.desc()),
        }
    }

    /// Identity of the underlying object
    pub fn address(&self) -> usize {
        match self {
            BackendResource::Buffer(buffer) => Arc::as_ptr(buffer) as *const () as usize,
            BackendResource::Texture(texture) => Arc::as_ptr(texture) as *const () as usize,
        }
    }

    pub fn as_buffer(&self) -> Option<&Arc<dyn Buffer>> {
        match self {
            BackendResource::Buffer(buffer) => Some(buffer),
            BackendResource::Texture(_) => None,
        }
    }

    pub fn as_texture(&self) -> Option<&Arc<dyn Texture>> {
        match self {
            BackendResource::Texture(texture) => Some(texture),
            BackendResource::Buffer(_) => None,
        }
    }

    pub fn destroy(self, device: &mut dyn RhiDevice) {
        match self {
            BackendResource::Buffer(buffer) => device.destroy_buffer(buffer),
            BackendResource::Texture(texture) => device.destroy_texture(texture),
        }
    }
}

// ============================================================================
// RgResource
// ============================================================================

/// Where a resource's GPU object comes from
#[derive(Debug, Clone)]
pub enum ResourceBacking {
    /// Resolved at compile time from the persisted backing, the cache or the device
    LazyCreate,
    /// Externally owned object in a known state
    ///
    /// `resource` is None for the swapchain back buffer, which is bound at present time.
    Imported {
        resource: Option<BackendResource>,
        access: RenderResourceAccessState,
    },
}

/// Pre-compile record of a registered resource
#[derive(Debug, Clone)]
pub struct RgResource {
    /// Set for named (persistent) resources
    pub name: Option<String>,
    pub desc: ResourceDesc,
    pub backing: ResourceBacking,
}

impl RgResource {
    pub fn temporary(desc: ResourceDesc) -> Self {
        Self {
            name: None,
            desc,
            backing: ResourceBacking::LazyCreate,
        }
    }

    pub fn named(name: &str, desc: ResourceDesc) -> Self {
        Self {
            name: Some(name.to_string()),
            desc,
            backing: ResourceBacking::LazyCreate,
        }
    }

    pub fn imported(
        desc: ResourceDesc,
        resource: Option<BackendResource>,
        access: RenderResourceAccessState,
    ) -> Self {
        Self {
            name: None,
            desc,
            backing: ResourceBacking::Imported { resource, access },
        }
    }

    pub fn is_named(&self) -> bool {
        self.name.is_some()
    }

    pub fn is_imported(&self) -> bool {
        matches!(self.backing, ResourceBacking::Imported { .. })
    }

    pub fn is_swapchain(&self) -> bool {
        matches!(self.backing, ResourceBacking::Imported { resource: None, .. })
    }

    /// Name for log messages
    pub fn display_name(&self) -> &str {
        match (&self.name, &self.backing) {
            (Some(name), _) => name,
            (None, ResourceBacking::Imported { resource: None, .. }) => "<swapchain>",
            (None, ResourceBacking::Imported { .. }) => "<imported>",
            (None, ResourceBacking::LazyCreate) => "<temporary>",
        }
    }
}

// ============================================================================
// Compiled state
// ============================================================================

/// First and last position of a resource in the execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ResourceLifetime {
    pub start: Option<usize>,
    pub end: Option<usize>,
}

impl ResourceLifetime {
    pub fn touch(&mut self, time: usize) {
        self.start = Some(self.start.map_or(time, |start| start.min(time)));
        self.end = Some(self.end.map_or(time, |end| end.max(time)));
    }

    pub fn is_valid(&self) -> bool {
        matches!((self.start, self.end), (Some(start), Some(end)) if start <= end)
    }
}

/// Post-compile state of a resource
#[derive(Debug, Clone)]
pub struct CompiledResource {
    /// None only for the swapchain before present binds it
    pub resource: Option<BackendResource>,
    /// State the resource was in before the frame's first access
    pub initial_access: RenderResourceAccessState,
    /// Tracked state, advanced access by access during compilation
    pub current_access: RenderResourceAccessState,
    pub lifetime: ResourceLifetime,
}

#[cfg(test)]
#[path = "resource_tests.rs"]
mod tests;
