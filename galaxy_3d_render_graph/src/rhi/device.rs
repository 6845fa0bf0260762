/// RhiDevice trait - backend-agnostic GPU device

use std::sync::Arc;
use crate::error::Result;
use crate::rhi::{
    Buffer, BufferDesc, CommandList, ComputePipelineDesc, FrameRenderTarget, PipelineState,
    RasterPipelineDesc, RenderPass, RenderPassDesc, Shader, Texture, TextureDesc,
};

/// Backend implementing the device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RhiBackend {
    Vulkan,
    Dx11,
    /// In-memory recording device used by tests and tools
    Mock,
}

/// Device interface consumed by the render graph and the pipeline registry
///
/// Object creation is synchronous and cheap (no GPU work). Destruction
/// takes ownership of the caller's reference; the backend frees the object
/// once the GPU is done with it.
pub trait RhiDevice: Send {
    fn backend(&self) -> RhiBackend;

    fn create_buffer(&mut self, desc: &BufferDesc) -> Result<Arc<dyn Buffer>>;

    fn destroy_buffer(&mut self, buffer: Arc<dyn Buffer>);

    fn create_texture(&mut self, desc: &TextureDesc) -> Result<Arc<dyn Texture>>;

    fn destroy_texture(&mut self, texture: Arc<dyn Texture>);

    fn create_render_pass(&mut self, desc: &RenderPassDesc) -> Result<Arc<dyn RenderPass>>;

    fn destroy_render_pass(&mut self, render_pass: Arc<dyn RenderPass>);

    /// Build a raster pipeline-state object
    ///
    /// May fail with `Error::DeviceBusy`, in which case the caller retries later.
    fn create_raster_pipeline_state(
        &mut self,
        desc: &RasterPipelineDesc,
        vertex_shader: &Arc<dyn Shader>,
        pixel_shader: &Arc<dyn Shader>,
    ) -> Result<Arc<dyn PipelineState>>;

    fn create_compute_pipeline_state(
        &mut self,
        desc: &ComputePipelineDesc,
        compute_shader: &Arc<dyn Shader>,
    ) -> Result<Arc<dyn PipelineState>>;

    fn destroy_pipeline_state(&mut self, pipeline: Arc<dyn PipelineState>);

    fn create_command_list(&mut self) -> Result<Box<dyn CommandList>>;

    /// Submit recorded commands
    ///
    /// With a frame target the submission waits on its acquire semaphore and
    /// signals its complete semaphore.
    fn submit(
        &mut self,
        command_list: &mut dyn CommandList,
        frame_target: Option<&FrameRenderTarget>,
    ) -> Result<()>;

    /// Acquire the next swapchain image
    ///
    /// An out-of-date swapchain is recreated internally and the acquire
    /// retried, callers never see `Error::SwapchainOutOfDate` from here.
    fn acquire_next_frame_render_target(&mut self) -> Result<FrameRenderTarget>;

    fn present(&mut self, frame_target: &FrameRenderTarget) -> Result<()>;

    /// Block until the GPU is idle
    fn wait_idle(&mut self) -> Result<()>;

    /// Index of the frame currently being recorded, increases by one per present
    fn frame_index(&self) -> u64;
}
