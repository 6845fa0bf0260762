//! Render graph
//!
//! Passes ("nodes") declare the resources they read and write against
//! logical handles. Compiling the graph resolves the handles to GPU objects
//! (reusing earlier frames' allocations where possible), computes each
//! resource's lifetime and the barriers between consecutive accesses, and
//! orders swapchain work last. Executing replays the nodes with one
//! batched barrier per node.

mod builder;
mod compiler;
mod context;
mod handle;
mod node;
mod registry;
mod render_graph;
mod resource;
mod transient_cache;

pub use builder::NodeBuilder;
pub use context::{NodeContext, RenderCommandContext};
pub use handle::{
    BufferTag, NodeBufferRef, NodeResourceRef, NodeTextureRef, PipelineBinding, ResourceId,
    ResourceKind, ResourceTag, RgBufferHandle, RgResourceHandle, RgTextureHandle, TaggedDesc,
    TextureTag, ViewType,
};
pub use node::{CompiledNode, NodeCallback, RenderGraphNode, ResourceAccess, Transition};
pub use registry::ResourceRegistry;
pub use render_graph::{GraphPhase, RenderGraph};
pub use resource::{
    BackendResource, CompiledResource, ResourceBacking, ResourceDesc, ResourceLifetime, RgResource,
};
pub use transient_cache::{CacheStats, TransientResourceCache};
