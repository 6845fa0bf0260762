/// Node builder
///
/// Returned by [`RenderGraph::add_node`]. Declares the node's resource
/// accesses, attachments, pipeline and callback. The node is committed to
/// the graph when the builder is dropped or [`finish`](NodeBuilder::finish)ed.
///
/// Declaration mistakes never abort the frame: they are logged, the access
/// is ignored and the returned reference binds to `PipelineBinding::Unknown`.

use crate::error::Result;
use crate::pipeline::PipelineHandle;
use crate::render_graph::context::NodeContext;
use crate::render_graph::handle::{
    NodeResourceRef, ResourceTag, RgResourceHandle, RgTextureHandle, TextureTag,
};
use crate::render_graph::node::{RenderGraphNode, ResourceAccess};
use crate::render_graph::render_graph::RenderGraph;
use crate::rhi::{
    BarrierState, ComputePipelineDesc, RasterPipelineDesc, RenderResourceAccessState,
    TextureViewDesc,
};
use crate::engine_error;

pub struct NodeBuilder<'g> {
    graph: &'g mut RenderGraph,
    node: Option<RenderGraphNode>,
}

impl<'g> NodeBuilder<'g> {
    pub(crate) fn new(graph: &'g mut RenderGraph, name: &str) -> Self {
        Self {
            graph,
            node: Some(RenderGraphNode::new(name)),
        }
    }

    pub fn name(&self) -> &str {
        self.node.as_ref().map_or("", |node| node.name.as_str())
    }

    fn reject<Tag: ResourceTag>(
        &self,
        handle: &RgResourceHandle<Tag>,
        state: BarrierState,
        reason: &str,
    ) -> NodeResourceRef<Tag> {
        engine_error!("galaxy3d::RenderGraph",
            "Node '{}': {:?} access to {} rejected: {}", self.name(), state, handle.id(), reason);
        NodeResourceRef::rejected(*handle.desc(), state)
    }

    /// Declare an access with an explicit tracked state
    pub fn access<Tag: ResourceTag>(
        &mut self,
        handle: RgResourceHandle<Tag>,
        state: RenderResourceAccessState,
    ) -> NodeResourceRef<Tag> {
        let view = Tag::default_view(handle.desc());
        self.declare(handle, state, view)
    }

    fn declare<Tag: ResourceTag>(
        &mut self,
        handle: RgResourceHandle<Tag>,
        state: RenderResourceAccessState,
        view: Option<TextureViewDesc>,
    ) -> NodeResourceRef<Tag> {
        if let Err(e) = self.graph.validate_id(handle.id()) {
            return self.reject(&handle, state.barrier, &e.to_string());
        }
        if state.barrier == BarrierState::Undefined {
            return self.reject(&handle, state.barrier, "Undefined is not an access state");
        }
        let Some(node) = self.node.as_mut() else {
            return NodeResourceRef::rejected(*handle.desc(), state.barrier);
        };
        if node.touches(handle.id().index) {
            return self.reject(&handle, state.barrier, "resource already declared by this node");
        }

        node.accesses.push(ResourceAccess {
            id: handle.id(),
            kind: Tag::KIND,
            state,
            view,
        });
        NodeResourceRef::new(handle.id(), *handle.desc(), state.barrier, view)
    }

    /// Read from any pipeline stage
    pub fn common_read<Tag: ResourceTag>(
        &mut self,
        handle: RgResourceHandle<Tag>,
        state: BarrierState,
    ) -> NodeResourceRef<Tag> {
        if state.is_write() {
            return self.reject(&handle, state, "write state passed to a read");
        }
        self.access(handle, state.into())
    }

    /// Write from any pipeline stage
    pub fn common_write<Tag: ResourceTag>(
        &mut self,
        handle: RgResourceHandle<Tag>,
        state: BarrierState,
    ) -> NodeResourceRef<Tag> {
        if !state.is_write() {
            return self.reject(&handle, state, "read state passed to a write");
        }
        self.access(handle, state.into())
    }

    /// Read from a raster (draw) stage
    pub fn raster_read<Tag: ResourceTag>(
        &mut self,
        handle: RgResourceHandle<Tag>,
        state: BarrierState,
    ) -> NodeResourceRef<Tag> {
        if !state.is_raster_compatible() {
            return self.reject(&handle, state, "not a raster stage state");
        }
        self.common_read(handle, state)
    }

    /// Write from a raster (draw) stage
    pub fn raster_write<Tag: ResourceTag>(
        &mut self,
        handle: RgResourceHandle<Tag>,
        state: BarrierState,
    ) -> NodeResourceRef<Tag> {
        if !state.is_raster_compatible() {
            return self.reject(&handle, state, "not a raster stage state");
        }
        self.common_write(handle, state)
    }

    /// Read a sub-resource range of a texture
    pub fn read_texture_view(
        &mut self,
        handle: RgTextureHandle,
        state: BarrierState,
        view: TextureViewDesc,
    ) -> NodeResourceRef<TextureTag> {
        if state.is_write() {
            return self.reject(&handle, state, "write state passed to a read");
        }
        if !view.fits(handle.desc()) {
            return self.reject(&handle, state, "view is outside the texture");
        }
        self.declare(handle, state.into(), Some(view))
    }

    /// Render to `texture` as the next color attachment
    pub fn bind_color_attachment(&mut self, texture: RgTextureHandle) -> NodeResourceRef<TextureTag> {
        let state = BarrierState::ColorAttachmentWrite;
        if texture.desc().format.is_depth() {
            return self.reject(&texture, state, "depth format bound as color attachment");
        }
        let resource = self.access(texture, state.into());
        if resource.is_valid() {
            if let Some(node) = self.node.as_mut() {
                node.color_attachments.push(texture.id());
            }
        }
        resource
    }

    /// Render to `texture` as the depth/stencil attachment
    pub fn bind_depth_stencil(&mut self, texture: RgTextureHandle) -> NodeResourceRef<TextureTag> {
        let state = BarrierState::DepthStencilAttachmentWrite;
        if !texture.desc().format.is_depth() {
            return self.reject(&texture, state, "color format bound as depth attachment");
        }
        if self.node.as_ref().is_some_and(|node| node.depth_attachment.is_some()) {
            return self.reject(&texture, state, "node already has a depth attachment");
        }
        let resource = self.access(texture, state.into());
        if resource.is_valid() {
            if let Some(node) = self.node.as_mut() {
                node.depth_attachment = Some(texture.id());
            }
        }
        resource
    }

    /// Register the node's raster pipeline with the attached pipeline registry
    pub fn register_raster_pipeline(&mut self, desc: &RasterPipelineDesc) -> PipelineHandle {
        let handle = self.graph.register_pipeline(|registry| registry.register_raster_pipeline(desc));
        if let Some(node) = self.node.as_mut() {
            node.pipeline = handle;
        }
        handle
    }

    /// Register the node's compute pipeline with the attached pipeline registry
    pub fn register_compute_pipeline(&mut self, desc: &ComputePipelineDesc) -> PipelineHandle {
        let handle = self.graph.register_pipeline(|registry| registry.register_compute_pipeline(desc));
        if let Some(node) = self.node.as_mut() {
            node.pipeline = handle;
        }
        handle
    }

    /// Set the commands the node records when the graph executes
    pub fn execute<F>(&mut self, callback: F)
    where
        F: FnOnce(&mut NodeContext<'_>) -> Result<()> + Send + 'static,
    {
        if let Some(node) = self.node.as_mut() {
            node.callback = Some(Box::new(callback));
        }
    }

    /// Commit the node, returning its index in declaration order
    pub fn finish(mut self) -> usize {
        match self.node.take() {
            Some(node) => self.graph.commit_node(node),
            None => self.graph.node_count().saturating_sub(1),
        }
    }
}

impl Drop for NodeBuilder<'_> {
    fn drop(&mut self) {
        if let Some(node) = self.node.take() {
            self.graph.commit_node(node);
        }
    }
}

#[cfg(test)]
#[path = "builder_tests.rs"]
mod tests;
