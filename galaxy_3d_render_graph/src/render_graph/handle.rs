/// Logical resource handles and per-node resource references
///
/// A handle names a registry slot together with the generation it was
/// issued at. Handles are plain values: copying one never keeps the
/// underlying GPU object alive, and once the slot is retired or recreated
/// the handle stops validating.

use std::fmt::{self, Debug};
use std::marker::PhantomData;
use crate::engine_error;
use crate::render_graph::resource::ResourceDesc;
use crate::rhi::{BarrierState, BufferDesc, RhiBinding, TextureDesc, TextureLayout, TextureViewDesc};

// ============================================================================
// ResourceId
// ============================================================================

/// Registry slot index plus generation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ResourceId {
    pub index: u32,
    pub generation: u32,
}

impl ResourceId {
    pub const INVALID: Self = Self {
        index: u32::MAX,
        generation: 0,
    };

    pub const fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }

    /// False only for the `INVALID` sentinel. A valid id may still be stale.
    pub fn is_valid(&self) -> bool {
        self.index != u32::MAX
    }

    /// Advance the generation, wrapping `u32::MAX` back to 0
    pub fn expire(&mut self) {
        self.generation = self.generation.wrapping_add(1);
    }
}

impl Default for ResourceId {
    fn default() -> Self {
        Self::INVALID
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_valid() {
            write!(f, "#{}v{}", self.index, self.generation)
        } else {
            f.write_str("#invalid")
        }
    }
}

// ============================================================================
// Resource kind tags
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Buffer,
    Texture,
}

/// Compile-time resource kind carried by handles and references
pub trait ResourceTag: Copy + Debug + Send + Sync + 'static {
    type Desc: Copy + Debug + PartialEq + Send + Sync;

    const KIND: ResourceKind;

    fn wrap(desc: Self::Desc) -> ResourceDesc;

    /// View used when an access does not name one
    fn default_view(desc: &Self::Desc) -> Option<TextureViewDesc>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BufferTag;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureTag;

impl ResourceTag for BufferTag {
    type Desc = BufferDesc;

    const KIND: ResourceKind = ResourceKind::Buffer;

    fn wrap(desc: BufferDesc) -> ResourceDesc {
        ResourceDesc::Buffer(desc)
    }

    fn default_view(_desc: &BufferDesc) -> Option<TextureViewDesc> {
        None
    }
}

impl ResourceTag for TextureTag {
    type Desc = TextureDesc;

    const KIND: ResourceKind = ResourceKind::Texture;

    fn wrap(desc: TextureDesc) -> ResourceDesc {
        ResourceDesc::Texture(desc)
    }

    fn default_view(desc: &TextureDesc) -> Option<TextureViewDesc> {
        Some(desc.full_view())
    }
}

/// Maps a descriptor type to its tag so creation functions can infer the handle type
pub trait TaggedDesc: Copy {
    type Tag: ResourceTag<Desc = Self>;
}

impl TaggedDesc for BufferDesc {
    type Tag = BufferTag;
}

impl TaggedDesc for TextureDesc {
    type Tag = TextureTag;
}

// ============================================================================
// RgResourceHandle
// ============================================================================

/// Typed handle to a render graph resource
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RgResourceHandle<Tag: ResourceTag> {
    id: ResourceId,
    desc: Tag::Desc,
    _tag: PhantomData<Tag>,
}

pub type RgBufferHandle = RgResourceHandle<BufferTag>;
pub type RgTextureHandle = RgResourceHandle<TextureTag>;

impl<Tag: ResourceTag> RgResourceHandle<Tag> {
    pub(crate) fn new(id: ResourceId, desc: Tag::Desc) -> Self {
        Self {
            id,
            desc,
            _tag: PhantomData,
        }
    }

    pub fn id(&self) -> ResourceId {
        self.id
    }

    pub fn desc(&self) -> &Tag::Desc {
        &self.desc
    }

    pub fn kind(&self) -> ResourceKind {
        Tag::KIND
    }

    /// False for handles returned by a failed registration
    pub fn is_valid(&self) -> bool {
        self.id.is_valid()
    }
}

// ============================================================================
// NodeResourceRef
// ============================================================================

/// How a node's access to a resource is viewed by shaders
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ViewType {
    /// Shader resource view (read)
    Srv,
    /// Unordered access view (write)
    Uav,
    /// Render target (attachment)
    Rt,
}

impl ViewType {
    pub fn from_state(state: BarrierState) -> Self {
        if state.is_attachment() {
            ViewType::Rt
        } else if state.is_write() {
            ViewType::Uav
        } else {
            ViewType::Srv
        }
    }
}

/// A node's declared access to a resource, returned by the node builder
///
/// Used inside the node callback to fetch the concrete object or to
/// produce a pipeline binding.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NodeResourceRef<Tag: ResourceTag> {
    id: ResourceId,
    desc: Tag::Desc,
    state: BarrierState,
    view_type: ViewType,
    view: Option<TextureViewDesc>,
}

pub type NodeBufferRef = NodeResourceRef<BufferTag>;
pub type NodeTextureRef = NodeResourceRef<TextureTag>;

impl<Tag: ResourceTag> NodeResourceRef<Tag> {
    pub(crate) fn new(
        id: ResourceId,
        desc: Tag::Desc,
        state: BarrierState,
        view: Option<TextureViewDesc>,
    ) -> Self {
        Self {
            id,
            desc,
            state,
            view_type: ViewType::from_state(state),
            view,
        }
    }

    /// Reference returned when a declaration was rejected; binds to `Unknown`
    pub(crate) fn rejected(desc: Tag::Desc, state: BarrierState) -> Self {
        Self::new(ResourceId::INVALID, desc, state, None)
    }

    pub fn id(&self) -> ResourceId {
        self.id
    }

    pub fn desc(&self) -> &Tag::Desc {
        &self.desc
    }

    pub fn state(&self) -> BarrierState {
        self.state
    }

    pub fn view_type(&self) -> ViewType {
        self.view_type
    }

    pub fn is_valid(&self) -> bool {
        self.id.is_valid()
    }
}

impl NodeResourceRef<BufferTag> {
    pub fn bind(&self) -> PipelineBinding {
        if !self.is_valid() {
            engine_error!("galaxy3d::RenderGraph", "Binding a rejected buffer reference");
            return PipelineBinding::Unknown;
        }
        match self.view_type {
            ViewType::Rt => {
                engine_error!("galaxy3d::RenderGraph", "Buffer can NOT bind with RT view type");
                PipelineBinding::Unknown
            }
            ViewType::Srv | ViewType::Uav => PipelineBinding::Buffer(self.id),
        }
    }

    /// Bind as a dynamic uniform/storage buffer at `dynamic_offset`
    pub fn bind_dynamic(&self, dynamic_offset: u32) -> PipelineBinding {
        match self.bind() {
            PipelineBinding::Buffer(id) => PipelineBinding::DynamicBuffer { id, dynamic_offset },
            other => other,
        }
    }
}

impl NodeResourceRef<TextureTag> {
    /// Sub-resource range of the access
    pub fn view(&self) -> TextureViewDesc {
        self.view.unwrap_or_else(|| self.desc.full_view())
    }

    pub fn bind(&self) -> PipelineBinding {
        match self.binding_parts() {
            Some((id, view, layout)) => PipelineBinding::Texture { id, view, layout },
            None => PipelineBinding::Unknown,
        }
    }

    fn binding_parts(&self) -> Option<(ResourceId, TextureViewDesc, TextureLayout)> {
        if !self.is_valid() {
            engine_error!("galaxy3d::RenderGraph", "Binding a rejected texture reference");
            return None;
        }
        let layout = match self.view_type {
            ViewType::Rt => {
                engine_error!("galaxy3d::RenderGraph", "Texture should be bound inside renderpass");
                return None;
            }
            ViewType::Srv => match self.state.access_info().layout {
                TextureLayout::Undefined => TextureLayout::ShaderReadOnly,
                layout => layout,
            },
            ViewType::Uav => TextureLayout::General,
        };
        Some((self.id, self.view(), layout))
    }
}

// ============================================================================
// PipelineBinding
// ============================================================================

/// Resource bound to a pipeline slot, expressed against graph resources
///
/// Resolved to an [`RhiBinding`] when recorded.
#[derive(Debug, Clone)]
pub enum PipelineBinding {
    Buffer(ResourceId),
    DynamicBuffer {
        id: ResourceId,
        dynamic_offset: u32,
    },
    Texture {
        id: ResourceId,
        view: TextureViewDesc,
        layout: TextureLayout,
    },
    TextureArray(Vec<(ResourceId, TextureViewDesc, TextureLayout)>),
    /// Degraded binding produced by a declaration error, skipped when recorded
    Unknown,
    /// Backend object bound directly, bypassing the graph
    Raw(RhiBinding),
}

impl PipelineBinding {
    /// Bind several textures to one array slot. Any unbindable element degrades the whole binding.
    pub fn texture_array(textures: &[NodeTextureRef]) -> PipelineBinding {
        let mut elements = Vec::with_capacity(textures.len());
        for texture in textures {
            match texture.binding_parts() {
                Some(parts) => elements.push(parts),
                None => return PipelineBinding::Unknown,
            }
        }
        PipelineBinding::TextureArray(elements)
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, PipelineBinding::Unknown)
    }
}

#[cfg(test)]
#[path = "handle_tests.rs"]
mod tests;
