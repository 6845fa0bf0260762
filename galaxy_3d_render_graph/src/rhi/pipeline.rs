/// Pipeline-state trait and pipeline descriptors

use std::fmt::Debug;
use std::sync::Arc;
use crate::rhi::{Buffer, ShaderPath, Texture, TextureFormat, TextureLayout, TextureViewDesc};

/// Kind of pipeline-state object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PipelineType {
    Raster,
    Compute,
}

/// Primitive topology
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveTopology {
    TriangleList,
    TriangleStrip,
    LineList,
    PointList,
}

/// Index buffer element type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndexType {
    U16,
    U32,
}

impl IndexType {
    /// Size in bytes of one index element
    pub fn size_bytes(&self) -> u32 {
        match self {
            IndexType::U16 => 2,
            IndexType::U32 => 4,
        }
    }
}

// ===== RASTERIZATION =====

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CullMode {
    None,
    Front,
    Back,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FrontFace {
    CounterClockwise,
    Clockwise,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PolygonMode {
    Fill,
    Line,
    Point,
}

/// Rasterization fixed-function state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RasterizerState {
    pub cull_mode: CullMode,
    pub front_face: FrontFace,
    pub polygon_mode: PolygonMode,
}

impl RasterizerState {
    pub fn no_culling() -> Self {
        Self {
            cull_mode: CullMode::None,
            ..Self::default()
        }
    }
}

impl Default for RasterizerState {
    fn default() -> Self {
        Self {
            cull_mode: CullMode::Back,
            front_face: FrontFace::CounterClockwise,
            polygon_mode: PolygonMode::Fill,
        }
    }
}

// ===== BLENDING =====

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlendFactor {
    Zero,
    One,
    SrcColor,
    OneMinusSrcColor,
    DstColor,
    OneMinusDstColor,
    SrcAlpha,
    OneMinusSrcAlpha,
    DstAlpha,
    OneMinusDstAlpha,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlendOp {
    Add,
    Subtract,
    ReverseSubtract,
    Min,
    Max,
}

/// Color blending state, shared by every color attachment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BlendState {
    pub blend_enable: bool,
    pub src_color_factor: BlendFactor,
    pub dst_color_factor: BlendFactor,
    pub color_blend_op: BlendOp,
    pub src_alpha_factor: BlendFactor,
    pub dst_alpha_factor: BlendFactor,
    pub alpha_blend_op: BlendOp,
}

impl BlendState {
    /// Opaque output
    pub fn no_blend() -> Self {
        Self {
            blend_enable: false,
            src_color_factor: BlendFactor::One,
            dst_color_factor: BlendFactor::Zero,
            color_blend_op: BlendOp::Add,
            src_alpha_factor: BlendFactor::One,
            dst_alpha_factor: BlendFactor::Zero,
            alpha_blend_op: BlendOp::Add,
        }
    }

    /// Classic alpha blending (UI overlays)
    pub fn color_additive_alpha() -> Self {
        Self {
            blend_enable: true,
            src_color_factor: BlendFactor::SrcAlpha,
            dst_color_factor: BlendFactor::OneMinusSrcAlpha,
            color_blend_op: BlendOp::Add,
            src_alpha_factor: BlendFactor::One,
            dst_alpha_factor: BlendFactor::OneMinusSrcAlpha,
            alpha_blend_op: BlendOp::Add,
        }
    }
}

impl Default for BlendState {
    fn default() -> Self {
        Self::no_blend()
    }
}

// ===== PIPELINE DESCRIPTORS =====

/// Descriptor of a raster pipeline
///
/// Shaders are referenced by path, so two descriptors built independently
/// from the same paths and states compare equal and share one pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RasterPipelineDesc {
    pub vertex_shader: ShaderPath,
    pub pixel_shader: ShaderPath,
    pub topology: PrimitiveTopology,
    pub rasterizer: RasterizerState,
    pub blend: BlendState,
    pub depth_test: bool,
    pub depth_write: bool,
    /// Formats of the color attachments the pipeline renders to
    pub color_formats: Vec<TextureFormat>,
    pub depth_format: Option<TextureFormat>,
}

impl RasterPipelineDesc {
    pub fn new(vertex_shader: impl Into<ShaderPath>, pixel_shader: impl Into<ShaderPath>) -> Self {
        Self {
            vertex_shader: vertex_shader.into(),
            pixel_shader: pixel_shader.into(),
            topology: PrimitiveTopology::TriangleList,
            rasterizer: RasterizerState::default(),
            blend: BlendState::default(),
            depth_test: true,
            depth_write: true,
            color_formats: Vec::new(),
            depth_format: None,
        }
    }

    pub fn with_rasterizer(mut self, rasterizer: RasterizerState) -> Self {
        self.rasterizer = rasterizer;
        self
    }

    pub fn with_blend(mut self, blend: BlendState) -> Self {
        self.blend = blend;
        self
    }

    pub fn with_topology(mut self, topology: PrimitiveTopology) -> Self {
        self.topology = topology;
        self
    }

    pub fn with_depth(mut self, depth_test: bool, depth_write: bool) -> Self {
        self.depth_test = depth_test;
        self.depth_write = depth_write;
        self
    }

    pub fn with_color_format(mut self, format: TextureFormat) -> Self {
        self.color_formats.push(format);
        self
    }

    pub fn with_depth_format(mut self, format: TextureFormat) -> Self {
        self.depth_format = Some(format);
        self
    }

    pub fn is_valid(&self) -> bool {
        self.vertex_shader.is_valid() && self.pixel_shader.is_valid()
    }
}

/// Descriptor of a compute pipeline
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ComputePipelineDesc {
    pub compute_shader: ShaderPath,
}

impl ComputePipelineDesc {
    pub fn new(compute_shader: impl Into<ShaderPath>) -> Self {
        Self {
            compute_shader: compute_shader.into(),
        }
    }

    pub fn is_valid(&self) -> bool {
        self.compute_shader.is_valid()
    }
}

/// Backend pipeline-state object
pub trait PipelineState: Send + Sync + Debug {
    fn pipeline_type(&self) -> PipelineType;
}

/// Concrete resource bound to a pipeline slot
#[derive(Debug, Clone)]
pub enum RhiBinding {
    Buffer(Arc<dyn Buffer>),
    DynamicBuffer {
        buffer: Arc<dyn Buffer>,
        dynamic_offset: u32,
    },
    Texture {
        texture: Arc<dyn Texture>,
        view: TextureViewDesc,
        layout: TextureLayout,
    },
    TextureArray(Vec<(Arc<dyn Texture>, TextureViewDesc, TextureLayout)>),
}

#[cfg(test)]
#[path = "pipeline_tests.rs"]
mod tests;
