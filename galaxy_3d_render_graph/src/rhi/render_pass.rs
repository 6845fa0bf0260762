/// Render pass trait and descriptor

use std::fmt::Debug;
use crate::rhi::TextureFormat;

/// Render pass trait
///
/// Describes how attachments are loaded and stored during rendering.
pub trait RenderPass: Send + Sync + Debug {
    fn desc(&self) -> &RenderPassDesc;
}

/// Descriptor for creating a render pass
///
/// Hashable so render passes can be cached and shared between nodes that
/// render to attachments of the same shape.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct RenderPassDesc {
    pub color_attachments: Vec<AttachmentDesc>,
    pub depth_attachment: Option<AttachmentDesc>,
}

/// Descriptor for a single attachment in a render pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AttachmentDesc {
    pub format: TextureFormat,
    /// Number of samples (1 = no MSAA)
    pub samples: u32,
    pub load_op: LoadOp,
    pub store_op: StoreOp,
}

impl AttachmentDesc {
    /// Single-sampled color attachment that clears and stores
    pub fn trivial_color(format: TextureFormat) -> Self {
        Self {
            format,
            samples: 1,
            load_op: LoadOp::Clear,
            store_op: StoreOp::Store,
        }
    }

    /// Single-sampled depth attachment, cleared and discarded after the pass
    pub fn trivial_depth(format: TextureFormat) -> Self {
        Self {
            store_op: StoreOp::DontCare,
            ..Self::trivial_color(format)
        }
    }

    pub fn with_store_op(mut self, store_op: StoreOp) -> Self {
        self.store_op = store_op;
        self
    }

    pub fn with_load_op(mut self, load_op: LoadOp) -> Self {
        self.load_op = load_op;
        self
    }
}

/// Load operation for an attachment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LoadOp {
    /// Load existing content
    Load,
    /// Clear the content
    Clear,
    /// Don't care about existing content
    DontCare,
}

/// Store operation for an attachment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOp {
    /// Store the rendered content
    Store,
    /// Don't care about storing the content
    DontCare,
}
