/// Command recording contexts
///
/// [`RenderCommandContext`] is the per-frame-in-flight recording state: the
/// command list plus the barrier scratch vectors reused by every node.
/// [`NodeContext`] is the view handed to a node callback while it runs.

use std::sync::Arc;
use rustc_hash::FxHashMap;
use crate::error::{Error, Result};
use crate::render_graph::handle::{
    BufferTag, NodeResourceRef, PipelineBinding, ResourceId, ResourceKind, TextureTag,
};
use crate::render_graph::node::Transition;
use crate::render_graph::registry::ResourceRegistry;
use crate::rhi::{
    AttachmentDesc, BarrierState, Buffer, BufferBarrier, ClearValue, CommandList, IndexType, LoadOp,
    PipelineState, Rect2D, RenderPass, RenderPassDesc, RhiBinding, RhiDevice, ShaderStage,
    StoreOp, Texture, TextureBarrier, Viewport,
};
use crate::{engine_error, engine_warn};

// ============================================================================
// RenderCommandContext
// ============================================================================

#[derive(Debug)]
pub struct RenderCommandContext {
    command_list: Box<dyn CommandList>,
    buffer_barriers: Vec<BufferBarrier>,
    texture_barriers: Vec<TextureBarrier>,
}

impl RenderCommandContext {
    pub fn new(command_list: Box<dyn CommandList>) -> Self {
        Self {
            command_list,
            buffer_barriers: Vec::new(),
            texture_barriers: Vec::new(),
        }
    }

    pub fn command_list(&mut self) -> &mut dyn CommandList {
        self.command_list.as_mut()
    }

    /// Record all transitions of one node as a single barrier batch
    ///
    /// Nothing is recorded when `transitions` is empty.
    pub fn record_transitions(
        &mut self,
        transitions: &[Transition],
        registry: &ResourceRegistry,
    ) -> Result<()> {
        self.buffer_barriers.clear();
        self.texture_barriers.clear();

        for transition in transitions {
            let resource = registry
                .compiled(transition.id)
                .and_then(|compiled| compiled.resource.as_ref())
                .ok_or_else(|| {
                    Error::InvalidResource(format!(
                        "transition of {} has no backing resource",
                        transition.id
                    ))
                })?;

            match transition.kind {
                ResourceKind::Buffer => {
                    let buffer = resource.as_buffer().ok_or_else(|| {
                        Error::InvalidResource(format!("{} is not a buffer", transition.id))
                    })?;
                    self.buffer_barriers.push(BufferBarrier {
                        buffer: buffer.clone(),
                        previous: transition.previous,
                        next: transition.next,
                    });
                }
                ResourceKind::Texture => {
                    let texture = resource.as_texture().ok_or_else(|| {
                        Error::InvalidResource(format!("{} is not a texture", transition.id))
                    })?;
                    let view = texture.desc().full_view();
                    self.texture_barriers.push(TextureBarrier {
                        texture: texture.clone(),
                        previous: transition.previous,
                        next: transition.next,
                        view,
                        discard_contents: transition.previous.barrier == BarrierState::Undefined,
                    });
                }
            }
        }

        if self.buffer_barriers.is_empty() && self.texture_barriers.is_empty() {
            return Ok(());
        }
        self.command_list
            .pipeline_barrier(&self.buffer_barriers, &self.texture_barriers)
    }
}

// ============================================================================
// NodeContext
// ============================================================================

/// Recording view given to a node callback
///
/// Resolves the node's resource references to concrete objects and records
/// into the frame's command list.
pub struct NodeContext<'a> {
    node_name: &'a str,
    commands: &'a mut RenderCommandContext,
    registry: &'a ResourceRegistry,
    device: &'a mut dyn RhiDevice,
    render_passes: &'a mut FxHashMap<RenderPassDesc, Arc<dyn RenderPass>>,
    color_attachments: &'a [ResourceId],
    depth_attachment: Option<ResourceId>,
    pipeline: Option<Arc<dyn PipelineState>>,
    in_render_pass: bool,
}

impl<'a> NodeContext<'a> {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        node_name: &'a str,
        commands: &'a mut RenderCommandContext,
        registry: &'a ResourceRegistry,
        device: &'a mut dyn RhiDevice,
        render_passes: &'a mut FxHashMap<RenderPassDesc, Arc<dyn RenderPass>>,
        color_attachments: &'a [ResourceId],
        depth_attachment: Option<ResourceId>,
        pipeline: Option<Arc<dyn PipelineState>>,
    ) -> Self {
        Self {
            node_name,
            commands,
            registry,
            device,
            render_passes,
            color_attachments,
            depth_attachment,
            pipeline,
            in_render_pass: false,
        }
    }

    pub fn node_name(&self) -> &str {
        self.node_name
    }

    pub(crate) fn is_in_render_pass(&self) -> bool {
        self.in_render_pass
    }

    fn buffer_by_id(&self, id: ResourceId) -> Result<Arc<dyn Buffer>> {
        self.registry.validate(id)?;
        self.registry
            .compiled(id)
            .and_then(|compiled| compiled.resource.as_ref())
            .and_then(|resource| resource.as_buffer())
            .cloned()
            .ok_or_else(|| Error::InvalidResource(format!("{} has no buffer bound", id)))
    }

    fn texture_by_id(&self, id: ResourceId) -> Result<Arc<dyn Texture>> {
        self.registry.validate(id)?;
        self.registry
            .compiled(id)
            .and_then(|compiled| compiled.resource.as_ref())
            .and_then(|resource| resource.as_texture())
            .cloned()
            .ok_or_else(|| Error::InvalidResource(format!("{} has no texture bound", id)))
    }

    /// Concrete buffer behind a reference declared by this node
    pub fn buffer(&self, resource: &NodeResourceRef<BufferTag>) -> Result<Arc<dyn Buffer>> {
        self.buffer_by_id(resource.id())
    }

    /// Concrete texture behind a reference declared by this node
    pub fn texture(&self, resource: &NodeResourceRef<TextureTag>) -> Result<Arc<dyn Texture>> {
        self.texture_by_id(resource.id())
    }

    /// Bind the pipeline registered by this node
    ///
    /// Returns false when the pipeline is not visible yet; the caller should
    /// skip its draws or substitute a fallback.
    pub fn bind_pipeline(&mut self) -> Result<bool> {
        match &self.pipeline {
            Some(pipeline) => {
                self.commands.command_list.bind_pipeline_state(pipeline)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    pub fn has_pipeline(&self) -> bool {
        self.pipeline.is_some()
    }

    /// Resolve graph bindings and bind them to `set_index`
    ///
    /// `Unknown` bindings were already reported when they were produced and
    /// are skipped.
    pub fn bind_resources(&mut self, set_index: u32, bindings: &[PipelineBinding]) -> Result<()> {
        let mut resolved = Vec::with_capacity(bindings.len());
        for binding in bindings {
            let rhi = match binding {
                PipelineBinding::Buffer(id) => RhiBinding::Buffer(self.buffer_by_id(*id)?),
                PipelineBinding::DynamicBuffer { id, dynamic_offset } => RhiBinding::DynamicBuffer {
                    buffer: self.buffer_by_id(*id)?,
                    dynamic_offset: *dynamic_offset,
                },
                PipelineBinding::Texture { id, view, layout } => RhiBinding::Texture {
                    texture: self.texture_by_id(*id)?,
                    view: *view,
                    layout: *layout,
                },
                PipelineBinding::TextureArray(elements) => {
                    let mut textures = Vec::with_capacity(elements.len());
                    for (id, view, layout) in elements {
                        textures.push((self.texture_by_id(*id)?, *view, *layout));
                    }
                    RhiBinding::TextureArray(textures)
                }
                PipelineBinding::Raw(binding) => binding.clone(),
                PipelineBinding::Unknown => continue,
            };
            resolved.push(rhi);
        }
        self.commands.command_list.bind_resources(set_index, &resolved)
    }

    /// Begin a render pass over the node's attachments
    ///
    /// Attachments are cleared when `clear_values` is non-empty and loaded
    /// otherwise. Render pass objects are shared between nodes with the same
    /// attachment layout.
    pub fn begin_render_pass(&mut self, clear_values: &[ClearValue]) -> Result<()> {
        if self.in_render_pass {
            engine_warn!("galaxy3d::RenderGraph",
                "Node '{}' began a render pass while one is open", self.node_name);
            self.end_render_pass()?;
        }

        let mut color_targets = Vec::with_capacity(self.color_attachments.len());
        for id in self.color_attachments {
            color_targets.push(self.texture_by_id(*id)?);
        }
        let depth_target = match self.depth_attachment {
            Some(id) => Some(self.texture_by_id(id)?),
            None => None,
        };
        if color_targets.is_empty() && depth_target.is_none() {
            engine_error!("galaxy3d::RenderGraph",
                "Node '{}' began a render pass without attachments", self.node_name);
            return Err(Error::InvalidResource(format!(
                "node '{}' has no attachments",
                self.node_name
            )));
        }

        let load_op = if clear_values.is_empty() { LoadOp::Load } else { LoadOp::Clear };
        let desc = RenderPassDesc {
            color_attachments: color_targets
                .iter()
                .map(|texture| AttachmentDesc::trivial_color(texture.desc().format).with_load_op(load_op))
                .collect(),
            depth_attachment: depth_target.as_ref().map(|texture| {
                AttachmentDesc::trivial_depth(texture.desc().format)
                    .with_load_op(load_op)
                    .with_store_op(StoreOp::Store)
            }),
        };

        let render_pass = match self.render_passes.get(&desc) {
            Some(render_pass) => render_pass.clone(),
            None => {
                let render_pass = self.device.create_render_pass(&desc)?;
                self.render_passes.insert(desc, render_pass.clone());
                render_pass
            }
        };

        self.commands.command_list.begin_render_pass(
            &render_pass,
            &color_targets,
            depth_target.as_ref(),
            clear_values,
        )?;
        self.in_render_pass = true;
        Ok(())
    }

    pub fn end_render_pass(&mut self) -> Result<()> {
        self.in_render_pass = false;
        self.commands.command_list.end_render_pass()
    }

    pub fn set_viewport(&mut self, viewport: Viewport) -> Result<()> {
        self.commands.command_list.set_viewport(viewport)
    }

    pub fn set_scissor(&mut self, scissor: Rect2D) -> Result<()> {
        self.commands.command_list.set_scissor(scissor)
    }

    pub fn push_constants(&mut self, stages: &[ShaderStage], offset: u32, data: &[u8]) -> Result<()> {
        self.commands.command_list.push_constants(stages, offset, data)
    }

    pub fn bind_vertex_buffer(&mut self, buffer: &NodeResourceRef<BufferTag>, offset: u64) -> Result<()> {
        let buffer = self.buffer(buffer)?;
        self.commands.command_list.bind_vertex_buffer(&buffer, offset)
    }

    pub fn bind_index_buffer(
        &mut self,
        buffer: &NodeResourceRef<BufferTag>,
        offset: u64,
        index_type: IndexType,
    ) -> Result<()> {
        let buffer = self.buffer(buffer)?;
        self.commands.command_list.bind_index_buffer(&buffer, offset, index_type)
    }

    pub fn draw(&mut self, vertex_count: u32, first_vertex: u32) -> Result<()> {
        self.commands.command_list.draw(vertex_count, first_vertex)
    }

    pub fn draw_indexed(&mut self, index_count: u32, first_index: u32, vertex_offset: i32) -> Result<()> {
        self.commands.command_list.draw_indexed(index_count, first_index, vertex_offset)
    }

    pub fn dispatch(&mut self, group_x: u32, group_y: u32, group_z: u32) -> Result<()> {
        self.commands.command_list.dispatch(group_x, group_y, group_z)
    }

    /// Direct access to the command list for commands the context does not wrap
    pub fn command_list(&mut self) -> &mut dyn CommandList {
        self.commands.command_list.as_mut()
    }
}

#[cfg(test)]
#[path = "context_tests.rs"]
mod tests;
