//! Render hardware interface
//!
//! Backend-agnostic description of GPU objects and the device that creates
//! them. The render graph and the pipeline registry only talk to the GPU
//! through these traits.

pub mod barrier;
pub mod buffer;
pub mod command_list;
pub mod device;
pub mod pipeline;
pub mod render_pass;
pub mod shader;
pub mod swapchain;
pub mod texture;

#[cfg(test)]
pub mod mock_device;

pub use barrier::{
    AccessFlags, AccessInfo, BarrierState, BufferBarrier, PipelineStage,
    RenderResourceAccessState, TextureBarrier, TextureLayout,
};
pub use buffer::{Buffer, BufferDesc, BufferUsage, MemoryUsage};
pub use command_list::{ClearValue, CommandList, Rect2D, Viewport};
pub use device::{RhiBackend, RhiDevice};
pub use pipeline::{
    BlendFactor, BlendOp, BlendState, ComputePipelineDesc, CullMode, FrontFace, IndexType,
    PipelineState, PipelineType, PolygonMode, PrimitiveTopology, RasterPipelineDesc,
    RasterizerState, RhiBinding,
};
pub use render_pass::{AttachmentDesc, LoadOp, RenderPass, RenderPassDesc, StoreOp};
pub use shader::{Shader, ShaderPath, ShaderStage};
pub use swapchain::{FrameRenderTarget, Semaphore};
pub use texture::{
    Texture, TextureAspect, TextureDesc, TextureFlags, TextureFormat, TextureKind, TextureUsage,
    TextureViewDesc,
};
