/// Mock device for unit tests (no GPU required)
///
/// Every device call and every recorded command is appended, as a short
/// string, to one shared call log so tests can assert on backend traffic
/// and its ordering.

use std::sync::{Arc, Mutex};
use crate::error::{Error, Result};
use crate::rhi::{
    Buffer, BufferBarrier, BufferDesc, ClearValue, CommandList, ComputePipelineDesc,
    FrameRenderTarget, IndexType, PipelineState, PipelineType, RasterPipelineDesc, Rect2D,
    RenderPass, RenderPassDesc, RhiBackend, RhiBinding, RhiDevice, Semaphore, Shader,
    ShaderPath, ShaderStage, Texture, TextureBarrier, TextureDesc, TextureFormat, Viewport,
};

pub type CallLog = Arc<Mutex<Vec<String>>>;

// ============================================================================
// Mock resources
// ============================================================================

#[derive(Debug)]
pub struct MockBuffer {
    pub id: u64,
    pub desc: BufferDesc,
}

impl Buffer for MockBuffer {
    fn desc(&self) -> &BufferDesc {
        &self.desc
    }
}

#[derive(Debug)]
pub struct MockTexture {
    pub id: u64,
    pub desc: TextureDesc,
}

impl Texture for MockTexture {
    fn desc(&self) -> &TextureDesc {
        &self.desc
    }
}

#[derive(Debug)]
pub struct MockRenderPass {
    pub desc: RenderPassDesc,
}

impl RenderPass for MockRenderPass {
    fn desc(&self) -> &RenderPassDesc {
        &self.desc
    }
}

#[derive(Debug)]
pub struct MockPipelineState {
    pub id: u64,
    pub pipeline_type: PipelineType,
}

impl PipelineState for MockPipelineState {
    fn pipeline_type(&self) -> PipelineType {
        self.pipeline_type
    }
}

#[derive(Debug)]
pub struct MockShader {
    pub stage: ShaderStage,
    pub path: ShaderPath,
}

impl MockShader {
    pub fn new(stage: ShaderStage, path: impl Into<ShaderPath>) -> Self {
        Self { stage, path: path.into() }
    }
}

impl Shader for MockShader {
    fn stage(&self) -> ShaderStage {
        self.stage
    }

    fn path(&self) -> &ShaderPath {
        &self.path
    }
}

#[derive(Debug)]
pub struct MockSemaphore;

impl Semaphore for MockSemaphore {}

// ============================================================================
// Mock CommandList
// ============================================================================

#[derive(Debug)]
pub struct MockCommandList {
    log: CallLog,
}

impl MockCommandList {
    pub fn new(log: CallLog) -> Self {
        Self { log }
    }

    fn push(&self, command: String) {
        self.log.lock().unwrap().push(command);
    }
}

impl CommandList for MockCommandList {
    fn begin(&mut self) -> Result<()> {
        self.push("cmd:begin".to_string());
        Ok(())
    }

    fn end(&mut self) -> Result<()> {
        self.push("cmd:end".to_string());
        Ok(())
    }

    fn pipeline_barrier(
        &mut self,
        buffer_barriers: &[BufferBarrier],
        texture_barriers: &[TextureBarrier],
    ) -> Result<()> {
        self.push(format!(
            "cmd:pipeline_barrier:{}:{}",
            buffer_barriers.len(),
            texture_barriers.len()
        ));
        for barrier in buffer_barriers {
            self.push(format!(
                "barrier:buffer:{}:{:?}->{:?}",
                barrier.buffer.desc().size,
                barrier.previous.barrier,
                barrier.next.barrier
            ));
        }
        for barrier in texture_barriers {
            self.push(format!(
                "barrier:texture:{:?}:mip{}x{}:{:?}->{:?}",
                barrier.texture.desc().format,
                barrier.view.base_mip,
                barrier.view.mip_count,
                barrier.previous.barrier,
                barrier.next.barrier
            ));
        }
        Ok(())
    }

    fn begin_render_pass(
        &mut self,
        _render_pass: &Arc<dyn RenderPass>,
        color_targets: &[Arc<dyn Texture>],
        depth_target: Option<&Arc<dyn Texture>>,
        _clear_values: &[ClearValue],
    ) -> Result<()> {
        self.push(format!(
            "cmd:begin_render_pass:{}:{}",
            color_targets.len(),
            depth_target.is_some()
        ));
        Ok(())
    }

    fn end_render_pass(&mut self) -> Result<()> {
        self.push("cmd:end_render_pass".to_string());
        Ok(())
    }

    fn bind_pipeline_state(&mut self, pipeline: &Arc<dyn PipelineState>) -> Result<()> {
        self.push(format!("cmd:bind_pipeline_state:{:?}", pipeline.pipeline_type()));
        Ok(())
    }

    fn bind_resources(&mut self, set_index: u32, bindings: &[RhiBinding]) -> Result<()> {
        self.push(format!("cmd:bind_resources:{}:{}", set_index, bindings.len()));
        Ok(())
    }

    fn set_viewport(&mut self, _viewport: Viewport) -> Result<()> {
        self.push("cmd:set_viewport".to_string());
        Ok(())
    }

    fn set_scissor(&mut self, _scissor: Rect2D) -> Result<()> {
        self.push("cmd:set_scissor".to_string());
        Ok(())
    }

    fn push_constants(&mut self, _stages: &[ShaderStage], _offset: u32, data: &[u8]) -> Result<()> {
        self.push(format!("cmd:push_constants:{}", data.len()));
        Ok(())
    }

    fn bind_vertex_buffer(&mut self, _buffer: &Arc<dyn Buffer>, _offset: u64) -> Result<()> {
        self.push("cmd:bind_vertex_buffer".to_string());
        Ok(())
    }

    fn bind_index_buffer(&mut self, _buffer: &Arc<dyn Buffer>, _offset: u64, _index_type: IndexType) -> Result<()> {
        self.push("cmd:bind_index_buffer".to_string());
        Ok(())
    }

    fn draw(&mut self, vertex_count: u32, _first_vertex: u32) -> Result<()> {
        self.push(format!("cmd:draw:{}", vertex_count));
        Ok(())
    }

    fn draw_indexed(&mut self, index_count: u32, _first_index: u32, _vertex_offset: i32) -> Result<()> {
        self.push(format!("cmd:draw_indexed:{}", index_count));
        Ok(())
    }

    fn dispatch(&mut self, group_x: u32, group_y: u32, group_z: u32) -> Result<()> {
        self.push(format!("cmd:dispatch:{}x{}x{}", group_x, group_y, group_z));
        Ok(())
    }
}

// ============================================================================
// Mock Device
// ============================================================================

/// Mock device that records its traffic without a GPU
#[derive(Debug)]
pub struct MockDevice {
    pub log: CallLog,
    next_id: u64,
    frame_index: u64,
    /// Make every buffer creation fail with OutOfMemory
    pub fail_buffer_creation: bool,
    /// Make every texture creation fail with OutOfMemory
    pub fail_texture_creation: bool,
    /// Number of upcoming pipeline builds that fail with DeviceBusy
    pub busy_pipeline_builds: u32,
    pub swapchain_format: TextureFormat,
}

impl MockDevice {
    pub fn new() -> Self {
        Self {
            log: Arc::new(Mutex::new(Vec::new())),
            next_id: 1,
            frame_index: 0,
            fail_buffer_creation: false,
            fail_texture_creation: false,
            busy_pipeline_builds: 0,
            swapchain_format: TextureFormat::B8G8R8A8_UNORM,
        }
    }

    fn push(&self, call: String) {
        self.log.lock().unwrap().push(call);
    }

    fn next_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Snapshot of the whole call log
    pub fn calls(&self) -> Vec<String> {
        self.log.lock().unwrap().clone()
    }

    /// Calls starting with `prefix`, in order
    pub fn calls_with_prefix(&self, prefix: &str) -> Vec<String> {
        self.log
            .lock()
            .unwrap()
            .iter()
            .filter(|call| call.starts_with(prefix))
            .cloned()
            .collect()
    }

    pub fn count(&self, prefix: &str) -> usize {
        self.calls_with_prefix(prefix).len()
    }

    pub fn clear_calls(&self) {
        self.log.lock().unwrap().clear();
    }

    pub fn swapchain_desc(&self) -> TextureDesc {
        TextureDesc::new_2d(800, 600, self.swapchain_format)
    }
}

impl Default for MockDevice {
    fn default() -> Self {
        Self::new()
    }
}

impl RhiDevice for MockDevice {
    fn backend(&self) -> RhiBackend {
        RhiBackend::Mock
    }

    fn create_buffer(&mut self, desc: &BufferDesc) -> Result<Arc<dyn Buffer>> {
        if self.fail_buffer_creation {
            self.push(format!("create_buffer_failed:{}", desc.size));
            return Err(Error::OutOfMemory);
        }
        let id = self.next_id();
        self.push(format!("create_buffer:{}", desc.size));
        Ok(Arc::new(MockBuffer { id, desc: *desc }))
    }

    fn destroy_buffer(&mut self, buffer: Arc<dyn Buffer>) {
        self.push(format!("destroy_buffer:{}", buffer.desc().size));
    }

    fn create_texture(&mut self, desc: &TextureDesc) -> Result<Arc<dyn Texture>> {
        if self.fail_texture_creation {
            self.push(format!("create_texture_failed:{}x{}", desc.width, desc.height));
            return Err(Error::OutOfMemory);
        }
        let id = self.next_id();
        self.push(format!("create_texture:{}x{}", desc.width, desc.height));
        Ok(Arc::new(MockTexture { id, desc: *desc }))
    }

    fn destroy_texture(&mut self, texture: Arc<dyn Texture>) {
        let desc = texture.desc();
        self.push(format!("destroy_texture:{}x{}", desc.width, desc.height));
    }

    fn create_render_pass(&mut self, desc: &RenderPassDesc) -> Result<Arc<dyn RenderPass>> {
        self.push(format!("create_render_pass:{}", desc.color_attachments.len()));
        Ok(Arc::new(MockRenderPass { desc: desc.clone() }))
    }

    fn destroy_render_pass(&mut self, _render_pass: Arc<dyn RenderPass>) {
        self.push("destroy_render_pass".to_string());
    }

    fn create_raster_pipeline_state(
        &mut self,
        desc: &RasterPipelineDesc,
        _vertex_shader: &Arc<dyn Shader>,
        _pixel_shader: &Arc<dyn Shader>,
    ) -> Result<Arc<dyn PipelineState>> {
        if self.busy_pipeline_builds > 0 {
            self.busy_pipeline_builds -= 1;
            self.push(format!("create_raster_pipeline_state_busy:{}", desc.vertex_shader));
            return Err(Error::DeviceBusy);
        }
        let id = self.next_id();
        self.push(format!("create_raster_pipeline_state:{}", desc.vertex_shader));
        Ok(Arc::new(MockPipelineState { id, pipeline_type: PipelineType::Raster }))
    }

    fn create_compute_pipeline_state(
        &mut self,
        desc: &ComputePipelineDesc,
        _compute_shader: &Arc<dyn Shader>,
    ) -> Result<Arc<dyn PipelineState>> {
        if self.busy_pipeline_builds > 0 {
            self.busy_pipeline_builds -= 1;
            self.push(format!("create_compute_pipeline_state_busy:{}", desc.compute_shader));
            return Err(Error::DeviceBusy);
        }
        let id = self.next_id();
        self.push(format!("create_compute_pipeline_state:{}", desc.compute_shader));
        Ok(Arc::new(MockPipelineState { id, pipeline_type: PipelineType::Compute }))
    }

    fn destroy_pipeline_state(&mut self, pipeline: Arc<dyn PipelineState>) {
        self.push(format!("destroy_pipeline_state:{:?}", pipeline.pipeline_type()));
    }

    fn create_command_list(&mut self) -> Result<Box<dyn CommandList>> {
        self.push("create_command_list".to_string());
        Ok(Box::new(MockCommandList::new(self.log.clone())))
    }

    fn submit(
        &mut self,
        _command_list: &mut dyn CommandList,
        frame_target: Option<&FrameRenderTarget>,
    ) -> Result<()> {
        match frame_target {
            Some(target) => self.push(format!("submit:frame{}", target.frame_index)),
            None => self.push("submit".to_string()),
        }
        Ok(())
    }

    fn acquire_next_frame_render_target(&mut self) -> Result<FrameRenderTarget> {
        let id = self.next_id();
        self.push(format!("acquire:frame{}", self.frame_index));
        Ok(FrameRenderTarget {
            texture: Arc::new(MockTexture { id, desc: self.swapchain_desc() }),
            acquire_semaphore: Arc::new(MockSemaphore),
            complete_semaphore: Arc::new(MockSemaphore),
            frame_index: self.frame_index,
        })
    }

    fn present(&mut self, frame_target: &FrameRenderTarget) -> Result<()> {
        self.push(format!("present:frame{}", frame_target.frame_index));
        self.frame_index += 1;
        Ok(())
    }

    fn wait_idle(&mut self) -> Result<()> {
        self.push("wait_idle".to_string());
        Ok(())
    }

    fn frame_index(&self) -> u64 {
        self.frame_index
    }
}

#[cfg(test)]
#[path = "mock_device_tests.rs"]
mod tests;
