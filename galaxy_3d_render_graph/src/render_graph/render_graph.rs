/// Render graph: per-frame declaration, compilation and execution of passes
///
/// A frame goes through
///
/// ```text
/// Building --compile--> Compiled --execute--> Executed --present--> Presented
///     ^                                                                 |
///     +------------------------------ retire ---------------------------+
/// ```
///
/// `retire` is valid from any phase (including after a failed compile) and
/// must run once per frame: it returns transient objects to the cache,
/// expires every handle of the frame and clears the node list.

use std::sync::{Arc, Mutex};
use rustc_hash::FxHashMap;
use crate::config::RenderGraphConfig;
use crate::engine::Engine;
use crate::error::Result;
use crate::pipeline::{PipelineHandle, PipelineRegistry};
use crate::render_graph::builder::NodeBuilder;
use crate::render_graph::compiler::{compile_graph, execution_order};
use crate::render_graph::context::{NodeContext, RenderCommandContext};
use crate::render_graph::handle::{
    BufferTag, ResourceId, ResourceTag, RgBufferHandle, RgResourceHandle, RgTextureHandle,
    TaggedDesc, TextureTag,
};
use crate::render_graph::node::{CompiledNode, RenderGraphNode, Transition};
use crate::render_graph::registry::ResourceRegistry;
use crate::render_graph::resource::{BackendResource, ResourceDesc, ResourceLifetime};
use crate::render_graph::transient_cache::TransientResourceCache;
use crate::rhi::{
    BarrierState, Buffer, FrameRenderTarget, PipelineState, RenderPass, RenderPassDesc,
    RenderResourceAccessState, RhiDevice, Texture, TextureDesc,
};
use crate::{engine_bail, engine_debug, engine_error, engine_trace, engine_warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GraphPhase {
    /// Accepting resources and nodes
    Building,
    Compiled,
    Executed,
    Presented,
    /// Compile or execution failed; only retire is allowed
    Failed,
}

pub struct RenderGraph {
    name: String,
    config: RenderGraphConfig,
    registry: ResourceRegistry,
    cache: TransientResourceCache,
    nodes: Vec<RenderGraphNode>,
    phase: GraphPhase,
    execute_sequence: Vec<CompiledNode>,
    present_sequence: Vec<CompiledNode>,
    /// One recording context per frame in flight, created on first use
    command_contexts: Vec<Option<RenderCommandContext>>,
    render_passes: FxHashMap<RenderPassDesc, Arc<dyn RenderPass>>,
    pipeline_registry: Option<Arc<Mutex<PipelineRegistry>>>,
    /// The execute sequence reached the GPU this frame
    submitted: bool,
    frame: u64,
}

impl RenderGraph {
    pub fn new(name: &str, config: RenderGraphConfig) -> Self {
        let frames_in_flight = config.frames_in_flight() as usize;
        Self {
            name: name.to_string(),
            config,
            registry: ResourceRegistry::new(),
            cache: TransientResourceCache::new(),
            nodes: Vec::new(),
            phase: GraphPhase::Building,
            execute_sequence: Vec::new(),
            present_sequence: Vec::new(),
            command_contexts: (0..frames_in_flight).map(|_| None).collect(),
            render_passes: FxHashMap::default(),
            pipeline_registry: None,
            submitted: false,
            frame: 0,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn config(&self) -> &RenderGraphConfig {
        &self.config
    }

    pub fn phase(&self) -> GraphPhase {
        self.phase
    }

    /// Frames retired so far
    pub fn frame(&self) -> u64 {
        self.frame
    }

    pub fn registry(&self) -> &ResourceRegistry {
        &self.registry
    }

    pub fn cache(&self) -> &TransientResourceCache {
        &self.cache
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn nodes(&self) -> &[RenderGraphNode] {
        &self.nodes
    }

    pub fn execute_sequence(&self) -> &[CompiledNode] {
        &self.execute_sequence
    }

    pub fn present_sequence(&self) -> &[CompiledNode] {
        &self.present_sequence
    }

    /// Pipelines registered by nodes go to `registry`
    pub fn attach_pipeline_registry(&mut self, registry: Arc<Mutex<PipelineRegistry>>) {
        self.pipeline_registry = Some(registry);
    }

    // ===== BUILDING =====

    fn check_building(&self, operation: &str) -> bool {
        if self.config.enforce_main_thread {
            assert!(
                Engine::is_main_thread(),
                "render graph '{}': {} called off the main thread",
                self.name,
                operation
            );
        }
        if self.phase != GraphPhase::Building {
            engine_error!("galaxy3d::RenderGraph",
                "Render graph '{}': {} called in phase {:?}, retire the frame first",
                self.name, operation, self.phase);
            return false;
        }
        true
    }

    pub(crate) fn validate_id(&self, id: ResourceId) -> Result<()> {
        self.registry.validate(id)
    }

    /// Whether `handle` still refers to a live resource
    pub fn is_handle_valid<Tag: ResourceTag>(&self, handle: &RgResourceHandle<Tag>) -> bool {
        self.registry.is_valid(handle.id())
    }

    /// Register a resource living for this frame only
    pub fn create_temporary_resource<D: TaggedDesc>(&mut self, desc: D) -> RgResourceHandle<D::Tag> {
        if !self.check_building("create_temporary_resource") {
            return RgResourceHandle::new(ResourceId::INVALID, desc);
        }
        let id = self.registry.register_temporary(D::Tag::wrap(desc));
        RgResourceHandle::new(id, desc)
    }

    /// Register or look up a resource persisting across frames under `name`
    pub fn get_or_create_named_resource<D: TaggedDesc>(
        &mut self,
        name: &str,
        desc: D,
    ) -> RgResourceHandle<D::Tag> {
        if !self.check_building("get_or_create_named_resource") {
            return RgResourceHandle::new(ResourceId::INVALID, desc);
        }
        let id = self.registry.register_named(name, D::Tag::wrap(desc), &mut self.cache);
        RgResourceHandle::new(id, desc)
    }

    /// Wrap an externally owned buffer currently in `access`
    pub fn import_buffer(&mut self, buffer: Arc<dyn Buffer>, access: RenderResourceAccessState) -> RgBufferHandle {
        let desc = *buffer.desc();
        if !self.check_building("import_buffer") {
            return RgResourceHandle::<BufferTag>::new(ResourceId::INVALID, desc);
        }
        let id = self.registry.import(BackendResource::Buffer(buffer), access);
        RgResourceHandle::new(id, desc)
    }

    /// Wrap an externally owned buffer whose state is guessed from its usage
    ///
    /// Vertex and index buffers are assumed to sit in their binding state,
    /// anything else starts Undefined.
    pub fn import_buffer_with_usage_state(&mut self, buffer: Arc<dyn Buffer>) -> RgBufferHandle {
        let state = BarrierState::speculate_from_buffer_usage(buffer.desc().usage);
        self.import_buffer(buffer, state.into())
    }

    /// Wrap an externally owned texture currently in `access`
    pub fn import_texture(&mut self, texture: Arc<dyn Texture>, access: RenderResourceAccessState) -> RgTextureHandle {
        let desc = *texture.desc();
        if !self.check_building("import_texture") {
            return RgResourceHandle::<TextureTag>::new(ResourceId::INVALID, desc);
        }
        let id = self.registry.import(BackendResource::Texture(texture), access);
        RgResourceHandle::new(id, desc)
    }

    /// Import the swapchain back buffer, bound to the acquired image at present
    ///
    /// Nodes touching it run in the present sequence.
    pub fn import_swapchain_texture(&mut self, desc: TextureDesc) -> RgTextureHandle {
        if !self.check_building("import_swapchain_texture") {
            return RgResourceHandle::new(ResourceId::INVALID, desc);
        }
        let id = self.registry.import_swapchain(ResourceDesc::Texture(desc));
        RgResourceHandle::new(id, desc)
    }

    /// Start declaring a node
    pub fn add_node(&mut self, name: &str) -> NodeBuilder<'_> {
        self.check_building("add_node");
        NodeBuilder::new(self, name)
    }

    pub(crate) fn commit_node(&mut self, node: RenderGraphNode) -> usize {
        if self.phase != GraphPhase::Building {
            engine_error!("galaxy3d::RenderGraph",
                "Node '{}' dropped: graph '{}' is not building", node.name, self.name);
            return self.nodes.len();
        }
        self.nodes.push(node);
        self.nodes.len() - 1
    }

    pub(crate) fn register_pipeline<F>(&self, register: F) -> PipelineHandle
    where
        F: FnOnce(&mut PipelineRegistry) -> PipelineHandle,
    {
        let Some(registry) = &self.pipeline_registry else {
            engine_error!("galaxy3d::RenderGraph",
                "Render graph '{}' has no pipeline registry attached", self.name);
            return PipelineHandle::INVALID;
        };
        match registry.lock() {
            Ok(mut registry) => register(&mut registry),
            Err(_) => {
                engine_error!("galaxy3d::RenderGraph", "Pipeline registry lock poisoned");
                PipelineHandle::INVALID
            }
        }
    }

    fn resolve_pipeline(&self, handle: PipelineHandle) -> Option<Arc<dyn PipelineState>> {
        if !handle.is_valid() {
            return None;
        }
        let registry = self.pipeline_registry.as_ref()?.lock().ok()?;
        registry.try_get_rhi_pipeline_state(handle)
    }

    // ===== QUERIES =====

    /// Declaration index of the first node touching the swapchain
    ///
    /// None when the graph has no swapchain output.
    pub fn find_present_node_index(&self) -> Option<usize> {
        let (_, present) = execution_order(&self.nodes, self.registry.swapchain_id());
        present.first().copied()
    }

    /// Tracked state of a resource after compilation
    pub fn compiled_access<Tag: ResourceTag>(&self, handle: &RgResourceHandle<Tag>) -> Option<RenderResourceAccessState> {
        self.registry.compiled(handle.id()).map(|compiled| compiled.current_access)
    }

    pub fn lifetime<Tag: ResourceTag>(&self, handle: &RgResourceHandle<Tag>) -> Option<ResourceLifetime> {
        self.registry.compiled(handle.id()).map(|compiled| compiled.lifetime)
    }

    /// Dump nodes and their accesses at debug severity
    pub fn log_graph_nodes(&self) {
        engine_debug!("galaxy3d::RenderGraph",
            "Render graph '{}' frame {}: {} node(s)", self.name, self.frame, self.nodes.len());
        for (index, node) in self.nodes.iter().enumerate() {
            engine_debug!("galaxy3d::RenderGraph", "  [{}] '{}' pipeline {}", index, node.name, node.pipeline);
            for access in &node.accesses {
                let name = self
                    .registry
                    .resource(access.id)
                    .map_or("<stale>", |resource| resource.display_name());
                engine_debug!("galaxy3d::RenderGraph",
                    "      {:?} {} '{}' {:?}", access.kind, access.id, name, access.state.barrier);
            }
        }
    }

    // ===== COMPILE =====

    /// Resolve resources and compute lifetimes and transitions
    ///
    /// On failure nothing may be executed this frame; retire still runs.
    pub fn compile(&mut self, device: &mut dyn RhiDevice) -> Result<()> {
        if self.phase != GraphPhase::Building {
            engine_bail!("galaxy3d::RenderGraph",
                "Render graph '{}' compiled in phase {:?}", self.name, self.phase);
        }
        if self.config.log_graph_nodes {
            self.log_graph_nodes();
        }

        match compile_graph(&self.nodes, &mut self.registry, &mut self.cache, device) {
            Ok(compiled) => {
                self.execute_sequence = compiled.execute;
                self.present_sequence = compiled.present;
                self.phase = GraphPhase::Compiled;
                Ok(())
            }
            Err(e) => {
                self.phase = GraphPhase::Failed;
                Err(e)
            }
        }
    }

    // ===== EXECUTE =====

    /// Record and submit the execute sequence
    pub fn execute(&mut self, device: &mut dyn RhiDevice) -> Result<()> {
        if self.phase != GraphPhase::Compiled {
            engine_bail!("galaxy3d::RenderGraph",
                "Render graph '{}' executed in phase {:?}", self.name, self.phase);
        }
        let sequence = std::mem::take(&mut self.execute_sequence);
        let result = self.run_sequence(device, &sequence, None);
        self.execute_sequence = sequence;
        self.submitted = result.is_ok();
        self.phase = if result.is_ok() { GraphPhase::Executed } else { GraphPhase::Failed };
        result
    }

    /// Record the present sequence against the acquired image and present it
    ///
    /// A graph without present nodes does nothing.
    pub fn present(&mut self, device: &mut dyn RhiDevice, target: &FrameRenderTarget) -> Result<()> {
        if self.present_sequence.is_empty() {
            if self.phase == GraphPhase::Executed {
                self.phase = GraphPhase::Presented;
            }
            return Ok(());
        }
        if self.phase != GraphPhase::Executed {
            engine_bail!("galaxy3d::RenderGraph",
                "Render graph '{}' presented in phase {:?}", self.name, self.phase);
        }

        if let Some(swapchain) = self.registry.swapchain_id() {
            if let Some(compiled) = self.registry.compiled_mut(swapchain) {
                compiled.resource = Some(BackendResource::Texture(target.texture.clone()));
            }
        }

        let sequence = std::mem::take(&mut self.present_sequence);
        let result = self
            .run_sequence(device, &sequence, Some(target))
            .and_then(|()| device.present(target));
        self.present_sequence = sequence;
        self.phase = if result.is_ok() { GraphPhase::Presented } else { GraphPhase::Failed };
        result
    }

    fn run_sequence(
        &mut self,
        device: &mut dyn RhiDevice,
        sequence: &[CompiledNode],
        target: Option<&FrameRenderTarget>,
    ) -> Result<()> {
        let slot = (self.frame % self.command_contexts.len() as u64) as usize;
        let mut context = match self.command_contexts[slot].take() {
            Some(context) => context,
            None => RenderCommandContext::new(device.create_command_list()?),
        };
        let result = self.record_and_submit(device, &mut context, sequence, target);
        self.command_contexts[slot] = Some(context);
        result
    }

    fn record_and_submit(
        &mut self,
        device: &mut dyn RhiDevice,
        context: &mut RenderCommandContext,
        sequence: &[CompiledNode],
        target: Option<&FrameRenderTarget>,
    ) -> Result<()> {
        context.command_list().begin()?;
        for compiled in sequence {
            self.run_node(device, context, compiled)?;
        }
        if target.is_some() {
            self.transition_swapchain_to_present(context)?;
        }
        context.command_list().end()?;
        device.submit(context.command_list(), target)
    }

    fn run_node(
        &mut self,
        device: &mut dyn RhiDevice,
        context: &mut RenderCommandContext,
        compiled: &CompiledNode,
    ) -> Result<()> {
        context.record_transitions(&compiled.transitions, &self.registry)?;

        let pipeline = self.resolve_pipeline(self.nodes[compiled.node].pipeline);
        let Some(callback) = self.nodes[compiled.node].callback.take() else {
            return Ok(());
        };

        let node = &self.nodes[compiled.node];
        let mut node_context = NodeContext::new(
            &node.name,
            context,
            &self.registry,
            device,
            &mut self.render_passes,
            &node.color_attachments,
            node.depth_attachment,
            pipeline,
        );

        if let Err(e) = callback(&mut node_context) {
            engine_error!("galaxy3d::RenderGraph", "Node '{}' failed: {}", node.name, e);
        }
        if node_context.is_in_render_pass() {
            engine_warn!("galaxy3d::RenderGraph",
                "Node '{}' left its render pass open, ending it", node.name);
            node_context.end_render_pass()?;
        }
        Ok(())
    }

    fn transition_swapchain_to_present(&mut self, context: &mut RenderCommandContext) -> Result<()> {
        let Some(id) = self.registry.swapchain_id() else { return Ok(()) };
        let Some(compiled) = self.registry.compiled_mut(id) else { return Ok(()) };
        let next = RenderResourceAccessState::new(BarrierState::Present);
        if !compiled.current_access.needs_transition_to(&next) {
            return Ok(());
        }
        let transition = Transition {
            id,
            kind: TextureTag::KIND,
            previous: compiled.current_access,
            next,
        };
        compiled.current_access = next;
        context.record_transitions(&[transition], &self.registry)
    }

    // ===== RETIRE =====

    /// End the frame
    ///
    /// Returns transient objects to the cache, expires the frame's handles,
    /// clears the nodes and evicts cache entries idle for longer than the
    /// retention window. Always callable. Named resources carry their final
    /// state into the next frame only if the frame was submitted.
    pub fn retire(&mut self, device: &mut dyn RhiDevice) {
        let retention = self.config.transient_retention_frames;
        self.registry.retire(&mut self.cache, retention, self.submitted);
        self.submitted = false;
        self.nodes.clear();
        self.execute_sequence.clear();
        self.present_sequence.clear();
        self.phase = GraphPhase::Building;
        self.frame += 1;

        self.cache.begin_frame(self.frame);
        let evicted = self.cache.evict_unused(device, retention);
        engine_trace!("galaxy3d::RenderGraph",
            "Render graph '{}' retired frame {}, {} cached, {} evicted",
            self.name, self.frame - 1, self.cache.len(), evicted);
    }

    /// Destroy every object owned by the graph and its cache
    ///
    /// Shutdown path. The caller waits for the device to be idle first.
    pub fn destroy_all_resources(&mut self, device: &mut dyn RhiDevice) {
        self.registry.destroy_all(device);
        self.cache.destroy_all(device);
        for (_, render_pass) in self.render_passes.drain() {
            device.destroy_render_pass(render_pass);
        }
        self.command_contexts.iter_mut().for_each(|context| *context = None);
        self.submitted = false;
        self.nodes.clear();
        self.execute_sequence.clear();
        self.present_sequence.clear();
        self.phase = GraphPhase::Building;
    }
}

#[cfg(test)]
#[path = "render_graph_tests.rs"]
mod tests;
