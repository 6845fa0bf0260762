/// Render graph nodes and their compiled form

use std::fmt;
use crate::error::Result;
use crate::pipeline::PipelineHandle;
use crate::render_graph::context::NodeContext;
use crate::render_graph::handle::{ResourceId, ResourceKind};
use crate::rhi::{RenderResourceAccessState, TextureViewDesc};

/// Commands recorded by a node, run once when the graph executes
pub type NodeCallback = Box<dyn FnOnce(&mut NodeContext<'_>) -> Result<()> + Send>;

/// One declared access of a node to a resource
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResourceAccess {
    pub id: ResourceId,
    pub kind: ResourceKind,
    pub state: RenderResourceAccessState,
    /// Texture sub-resource range, None for buffers
    pub view: Option<TextureViewDesc>,
}

/// A declared pass: resource accesses, attachments, pipeline and callback
pub struct RenderGraphNode {
    pub name: String,
    pub accesses: Vec<ResourceAccess>,
    pub color_attachments: Vec<ResourceId>,
    pub depth_attachment: Option<ResourceId>,
    pub pipeline: PipelineHandle,
    pub callback: Option<NodeCallback>,
}

impl RenderGraphNode {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            accesses: Vec::new(),
            color_attachments: Vec::new(),
            depth_attachment: None,
            pipeline: PipelineHandle::INVALID,
            callback: None,
        }
    }

    /// Whether the node declares an access to the slot `index`
    pub fn touches(&self, index: u32) -> bool {
        self.accesses.iter().any(|access| access.id.index == index)
    }

    pub fn access_of(&self, id: ResourceId) -> Option<&ResourceAccess> {
        self.accesses.iter().find(|access| access.id.index == id.index)
    }
}

impl fmt::Debug for RenderGraphNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RenderGraphNode")
            .field("name", &self.name)
            .field("accesses", &self.accesses)
            .field("color_attachments", &self.color_attachments)
            .field("depth_attachment", &self.depth_attachment)
            .field("pipeline", &self.pipeline)
            .field("has_callback", &self.callback.is_some())
            .finish()
    }
}

/// State change a resource needs before a node runs
///
/// State is tracked per resource, so a transition always covers every mip
/// and layer of a texture. Declared views only narrow what the node binds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transition {
    pub id: ResourceId,
    pub kind: ResourceKind,
    pub previous: RenderResourceAccessState,
    pub next: RenderResourceAccessState,
}

/// A node placed in an execution sequence with the transitions it needs
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledNode {
    /// Index into the graph's declared nodes
    pub node: usize,
    pub transitions: Vec<Transition>,
}
