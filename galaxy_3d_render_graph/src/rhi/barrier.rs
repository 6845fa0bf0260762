//! Resource barrier model
//!
//! Every access a node makes to a buffer or texture is expressed as a
//! [`BarrierState`]. A state expands to the pipeline stage, memory access
//! and image layout a backend needs to build a real barrier. The render
//! graph only compares states; backends translate them.

use std::sync::Arc;
use crate::rhi::{Buffer, BufferUsage, Texture, TextureViewDesc};

bitflags::bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct PipelineStage: u32 {
        const TOP_OF_PIPE = 1 << 0;
        const DRAW_INDIRECT = 1 << 1;
        const VERTEX_INPUT = 1 << 2;
        const VERTEX_SHADER = 1 << 3;
        const FRAGMENT_SHADER = 1 << 4;
        const EARLY_FRAGMENT_TESTS = 1 << 5;
        const LATE_FRAGMENT_TESTS = 1 << 6;
        const COLOR_ATTACHMENT_OUTPUT = 1 << 7;
        const COMPUTE_SHADER = 1 << 8;
        const TRANSFER = 1 << 9;
        const BOTTOM_OF_PIPE = 1 << 10;
        const HOST = 1 << 11;
        const ALL_COMMANDS = 1 << 12;
    }
}

bitflags::bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct AccessFlags: u32 {
        const INDIRECT_COMMAND_READ = 1 << 0;
        const INDEX_READ = 1 << 1;
        const VERTEX_ATTRIBUTE_READ = 1 << 2;
        const UNIFORM_READ = 1 << 3;
        const INPUT_ATTACHMENT_READ = 1 << 4;
        const SHADER_READ = 1 << 5;
        const SHADER_WRITE = 1 << 6;
        const COLOR_ATTACHMENT_READ = 1 << 7;
        const COLOR_ATTACHMENT_WRITE = 1 << 8;
        const DEPTH_STENCIL_ATTACHMENT_READ = 1 << 9;
        const DEPTH_STENCIL_ATTACHMENT_WRITE = 1 << 10;
        const TRANSFER_READ = 1 << 11;
        const TRANSFER_WRITE = 1 << 12;
        const HOST_READ = 1 << 13;
        const HOST_WRITE = 1 << 14;
        const MEMORY_READ = 1 << 15;
        const MEMORY_WRITE = 1 << 16;
    }
}

impl AccessFlags {
    const WRITES: AccessFlags = AccessFlags::SHADER_WRITE
        .union(AccessFlags::COLOR_ATTACHMENT_WRITE)
        .union(AccessFlags::DEPTH_STENCIL_ATTACHMENT_WRITE)
        .union(AccessFlags::TRANSFER_WRITE)
        .union(AccessFlags::HOST_WRITE)
        .union(AccessFlags::MEMORY_WRITE);
}

/// Image layout a texture must be in for an access
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureLayout {
    Undefined,
    General,
    ColorAttachment,
    DepthStencilAttachment,
    DepthStencilReadOnly,
    ShaderReadOnly,
    TransferSrc,
    TransferDst,
    PresentSrc,
}

/// Stage, access and layout of a barrier state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccessInfo {
    pub stage: PipelineStage,
    pub access: AccessFlags,
    /// Only meaningful for textures
    pub layout: TextureLayout,
}

impl AccessInfo {
    const fn new(stage: PipelineStage, access: AccessFlags, layout: TextureLayout) -> Self {
        Self { stage, access, layout }
    }
}

/// How a resource is used by a node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BarrierState {
    /// Contents are not needed (first use, discard)
    #[default]
    Undefined,
    IndirectBuffer,
    IndexBuffer,
    VertexBuffer,
    VertexShaderReadUniformBuffer,
    VertexShaderReadSampledImageOrUniformTexelBuffer,
    VertexShaderReadOther,
    FragmentShaderReadUniformBuffer,
    FragmentShaderReadSampledImageOrUniformTexelBuffer,
    FragmentShaderReadColorInputAttachment,
    FragmentShaderReadDepthStencilInputAttachment,
    FragmentShaderReadOther,
    ColorAttachmentRead,
    DepthStencilAttachmentRead,
    ComputeShaderReadUniformBuffer,
    ComputeShaderReadSampledImageOrUniformTexelBuffer,
    ComputeShaderReadOther,
    AnyShaderReadUniformBuffer,
    AnyShaderReadSampledImageOrUniformTexelBuffer,
    AnyShaderReadOther,
    TransferRead,
    HostRead,
    Present,
    VertexShaderWrite,
    FragmentShaderWrite,
    ColorAttachmentWrite,
    DepthStencilAttachmentWrite,
    ComputeShaderWrite,
    AnyShaderWrite,
    TransferWrite,
    HostWrite,
    General,
}

impl BarrierState {
    pub fn access_info(&self) -> AccessInfo {
        use AccessFlags as A;
        use PipelineStage as S;
        use TextureLayout as L;

        let fragment_tests = S::EARLY_FRAGMENT_TESTS.union(S::LATE_FRAGMENT_TESTS);
        match self {
            BarrierState::Undefined => AccessInfo::new(S::TOP_OF_PIPE, A::empty(), L::Undefined),
            BarrierState::IndirectBuffer => {
                AccessInfo::new(S::DRAW_INDIRECT, A::INDIRECT_COMMAND_READ, L::Undefined)
            }
            BarrierState::IndexBuffer => AccessInfo::new(S::VERTEX_INPUT, A::INDEX_READ, L::Undefined),
            BarrierState::VertexBuffer => {
                AccessInfo::new(S::VERTEX_INPUT, A::VERTEX_ATTRIBUTE_READ, L::Undefined)
            }
            BarrierState::VertexShaderReadUniformBuffer => {
                AccessInfo::new(S::VERTEX_SHADER, A::UNIFORM_READ, L::Undefined)
            }
            BarrierState::VertexShaderReadSampledImageOrUniformTexelBuffer => {
                AccessInfo::new(S::VERTEX_SHADER, A::SHADER_READ, L::ShaderReadOnly)
            }
            BarrierState::VertexShaderReadOther => {
                AccessInfo::new(S::VERTEX_SHADER, A::SHADER_READ, L::General)
            }
            BarrierState::FragmentShaderReadUniformBuffer => {
                AccessInfo::new(S::FRAGMENT_SHADER, A::UNIFORM_READ, L::Undefined)
            }
            BarrierState::FragmentShaderReadSampledImageOrUniformTexelBuffer => {
                AccessInfo::new(S::FRAGMENT_SHADER, A::SHADER_READ, L::ShaderReadOnly)
            }
            BarrierState::FragmentShaderReadColorInputAttachment => {
                AccessInfo::new(S::FRAGMENT_SHADER, A::INPUT_ATTACHMENT_READ, L::ShaderReadOnly)
            }
            BarrierState::FragmentShaderReadDepthStencilInputAttachment => {
                AccessInfo::new(S::FRAGMENT_SHADER, A::INPUT_ATTACHMENT_READ, L::DepthStencilReadOnly)
            }
            BarrierState::FragmentShaderReadOther => {
                AccessInfo::new(S::FRAGMENT_SHADER, A::SHADER_READ, L::General)
            }
            BarrierState::ColorAttachmentRead => {
                AccessInfo::new(S::COLOR_ATTACHMENT_OUTPUT, A::COLOR_ATTACHMENT_READ, L::ColorAttachment)
            }
            BarrierState::DepthStencilAttachmentRead => {
                AccessInfo::new(fragment_tests, A::DEPTH_STENCIL_ATTACHMENT_READ, L::DepthStencilReadOnly)
            }
            BarrierState::ComputeShaderReadUniformBuffer => {
                AccessInfo::new(S::COMPUTE_SHADER, A::UNIFORM_READ, L::Undefined)
            }
            BarrierState::ComputeShaderReadSampledImageOrUniformTexelBuffer => {
                AccessInfo::new(S::COMPUTE_SHADER, A::SHADER_READ, L::ShaderReadOnly)
            }
            BarrierState::ComputeShaderReadOther => {
                AccessInfo::new(S::COMPUTE_SHADER, A::SHADER_READ, L::General)
            }
            BarrierState::AnyShaderReadUniformBuffer => {
                AccessInfo::new(S::ALL_COMMANDS, A::UNIFORM_READ, L::Undefined)
            }
            BarrierState::AnyShaderReadSampledImageOrUniformTexelBuffer => {
                AccessInfo::new(S::ALL_COMMANDS, A::SHADER_READ, L::ShaderReadOnly)
            }
            BarrierState::AnyShaderReadOther => {
                AccessInfo::new(S::ALL_COMMANDS, A::SHADER_READ, L::General)
            }
            BarrierState::TransferRead => AccessInfo::new(S::TRANSFER, A::TRANSFER_READ, L::TransferSrc),
            BarrierState::HostRead => AccessInfo::new(S::HOST, A::HOST_READ, L::General),
            BarrierState::Present => AccessInfo::new(S::BOTTOM_OF_PIPE, A::empty(), L::PresentSrc),
            BarrierState::VertexShaderWrite => {
                AccessInfo::new(S::VERTEX_SHADER, A::SHADER_WRITE, L::General)
            }
            BarrierState::FragmentShaderWrite => {
                AccessInfo::new(S::FRAGMENT_SHADER, A::SHADER_WRITE, L::General)
            }
            BarrierState::ColorAttachmentWrite => {
                AccessInfo::new(S::COLOR_ATTACHMENT_OUTPUT, A::COLOR_ATTACHMENT_WRITE, L::ColorAttachment)
            }
            BarrierState::DepthStencilAttachmentWrite => AccessInfo::new(
                fragment_tests,
                A::DEPTH_STENCIL_ATTACHMENT_WRITE,
                L::DepthStencilAttachment,
            ),
            BarrierState::ComputeShaderWrite => {
                AccessInfo::new(S::COMPUTE_SHADER, A::SHADER_WRITE, L::General)
            }
            BarrierState::AnyShaderWrite => AccessInfo::new(S::ALL_COMMANDS, A::SHADER_WRITE, L::General),
            BarrierState::TransferWrite => AccessInfo::new(S::TRANSFER, A::TRANSFER_WRITE, L::TransferDst),
            BarrierState::HostWrite => AccessInfo::new(S::HOST, A::HOST_WRITE, L::General),
            BarrierState::General => AccessInfo::new(
                S::ALL_COMMANDS,
                A::MEMORY_READ.union(A::MEMORY_WRITE),
                L::General,
            ),
        }
    }

    pub fn is_write(&self) -> bool {
        self.access_info().access.intersects(AccessFlags::WRITES)
    }

    /// Color or depth/stencil attachment access, only legal inside a render pass
    pub fn is_attachment(&self) -> bool {
        matches!(
            self,
            BarrierState::ColorAttachmentRead
                | BarrierState::ColorAttachmentWrite
                | BarrierState::DepthStencilAttachmentRead
                | BarrierState::DepthStencilAttachmentWrite
        )
    }

    /// States a raster (draw) node may request
    pub fn is_raster_compatible(&self) -> bool {
        let stage = self.access_info().stage;
        let raster = PipelineStage::DRAW_INDIRECT
            | PipelineStage::VERTEX_INPUT
            | PipelineStage::VERTEX_SHADER
            | PipelineStage::FRAGMENT_SHADER
            | PipelineStage::EARLY_FRAGMENT_TESTS
            | PipelineStage::LATE_FRAGMENT_TESTS
            | PipelineStage::COLOR_ATTACHMENT_OUTPUT
            | PipelineStage::ALL_COMMANDS;
        raster.contains(stage)
    }

    /// Initial state of a buffer created outside the graph, guessed from its usage
    pub fn speculate_from_buffer_usage(usage: BufferUsage) -> BarrierState {
        if usage.contains(BufferUsage::VERTEX) {
            BarrierState::VertexBuffer
        } else if usage.contains(BufferUsage::INDEX) {
            BarrierState::IndexBuffer
        } else {
            BarrierState::Undefined
        }
    }
}

/// Tracked or requested state of a resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RenderResourceAccessState {
    pub barrier: BarrierState,
    /// When two consecutive accesses share a write state, do not insert a
    /// write-after-write barrier between them
    pub skip_sync_if_continuous: bool,
}

impl RenderResourceAccessState {
    pub const UNDEFINED: Self = Self::new(BarrierState::Undefined);

    pub const fn new(barrier: BarrierState) -> Self {
        Self {
            barrier,
            skip_sync_if_continuous: true,
        }
    }

    /// Force a barrier between consecutive writes in the same state
    pub const fn synchronized(barrier: BarrierState) -> Self {
        Self {
            barrier,
            skip_sync_if_continuous: false,
        }
    }

    /// Whether moving from `self` to `next` needs a barrier
    pub fn needs_transition_to(&self, next: &RenderResourceAccessState) -> bool {
        if self.barrier != next.barrier {
            return true;
        }
        next.barrier.is_write() && !next.skip_sync_if_continuous
    }
}

impl Default for RenderResourceAccessState {
    fn default() -> Self {
        Self::UNDEFINED
    }
}

impl From<BarrierState> for RenderResourceAccessState {
    fn from(barrier: BarrierState) -> Self {
        Self::new(barrier)
    }
}

/// Buffer transition recorded into a command list
#[derive(Debug, Clone)]
pub struct BufferBarrier {
    pub buffer: Arc<dyn Buffer>,
    pub previous: RenderResourceAccessState,
    pub next: RenderResourceAccessState,
}

/// Texture transition recorded into a command list
#[derive(Debug, Clone)]
pub struct TextureBarrier {
    pub texture: Arc<dyn Texture>,
    pub previous: RenderResourceAccessState,
    pub next: RenderResourceAccessState,
    pub view: TextureViewDesc,
    /// Previous contents may be dropped (transition from Undefined)
    pub discard_contents: bool,
}

#[cfg(test)]
#[path = "barrier_tests.rs"]
mod tests;
