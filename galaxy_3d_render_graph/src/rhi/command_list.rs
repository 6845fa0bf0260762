/// CommandList trait - for recording GPU commands

use std::fmt::Debug;
use std::sync::Arc;
use crate::error::Result;
use crate::rhi::{
    Buffer, BufferBarrier, IndexType, PipelineState, RenderPass, RhiBinding, ShaderStage,
    Texture, TextureBarrier,
};

/// Command list for recording commands
///
/// Commands are recorded and later submitted with `RhiDevice::submit()`.
pub trait CommandList: Send + Debug {
    fn begin(&mut self) -> Result<()>;

    fn end(&mut self) -> Result<()>;

    /// Record every transition a node needs in one call
    fn pipeline_barrier(
        &mut self,
        buffer_barriers: &[BufferBarrier],
        texture_barriers: &[TextureBarrier],
    ) -> Result<()>;

    /// Begin a render pass
    ///
    /// # Arguments
    ///
    /// * `render_pass` - The render pass to begin
    /// * `color_targets` - One texture per color attachment of the pass
    /// * `depth_target` - Depth attachment, if the pass has one
    /// * `clear_values` - Clear values for attachments, in attachment order
    fn begin_render_pass(
        &mut self,
        render_pass: &Arc<dyn RenderPass>,
        color_targets: &[Arc<dyn Texture>],
        depth_target: Option<&Arc<dyn Texture>>,
        clear_values: &[ClearValue],
    ) -> Result<()>;

    fn end_render_pass(&mut self) -> Result<()>;

    fn bind_pipeline_state(&mut self, pipeline: &Arc<dyn PipelineState>) -> Result<()>;

    /// Bind a set of resources to the currently bound pipeline
    fn bind_resources(&mut self, set_index: u32, bindings: &[RhiBinding]) -> Result<()>;

    fn set_viewport(&mut self, viewport: Viewport) -> Result<()>;

    fn set_scissor(&mut self, scissor: Rect2D) -> Result<()>;

    fn push_constants(&mut self, stages: &[ShaderStage], offset: u32, data: &[u8]) -> Result<()>;

    fn bind_vertex_buffer(&mut self, buffer: &Arc<dyn Buffer>, offset: u64) -> Result<()>;

    fn bind_index_buffer(
        &mut self,
        buffer: &Arc<dyn Buffer>,
        offset: u64,
        index_type: IndexType,
    ) -> Result<()>;

    /// Draw vertices
    ///
    /// # Arguments
    ///
    /// * `vertex_count` - Number of vertices to draw
    /// * `first_vertex` - Index of first vertex
    fn draw(&mut self, vertex_count: u32, first_vertex: u32) -> Result<()>;

    /// Draw indexed vertices
    ///
    /// # Arguments
    ///
    /// * `index_count` - Number of indices to draw
    /// * `first_index` - Index of first index
    /// * `vertex_offset` - Value added to vertex index before indexing into the vertex buffer
    fn draw_indexed(&mut self, index_count: u32, first_index: u32, vertex_offset: i32) -> Result<()>;

    fn dispatch(&mut self, group_x: u32, group_y: u32, group_z: u32) -> Result<()>;
}

/// Viewport dimensions and depth range
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub min_depth: f32,
    pub max_depth: f32,
}

impl Viewport {
    /// Full-size viewport with a [0, 1] depth range
    pub fn from_extent(width: u32, height: u32) -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            width: width as f32,
            height: height as f32,
            min_depth: 0.0,
            max_depth: 1.0,
        }
    }
}

/// 2D rectangle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect2D {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

/// Clear value for an attachment
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ClearValue {
    /// Color clear value (RGBA)
    Color([f32; 4]),
    /// Depth/stencil clear value
    DepthStencil { depth: f32, stencil: u32 },
}
