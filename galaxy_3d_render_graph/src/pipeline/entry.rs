/// Pipeline registry entries

use std::sync::Arc;
use crate::error::{Error, Result};
use crate::pipeline::PipelineHandle;
use crate::rhi::{
    ComputePipelineDesc, PipelineState, PipelineType, RasterPipelineDesc, RhiDevice, Shader,
    ShaderPath, ShaderStage,
};

/// Lifecycle of a pipeline entry
///
/// `Requested -> ShaderLoading -> ReadyToLink -> Visible`. A build that
/// fails transiently moves the entry to `RetryQueue`, retried on the next
/// update. `Failed` entries never become visible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PipelineEntryState {
    Requested,
    ShaderLoading,
    ReadyToLink,
    Visible,
    RetryQueue,
    Failed,
}

impl PipelineEntryState {
    /// Still waiting on shaders or on a build
    pub fn is_pending(&self) -> bool {
        matches!(
            self,
            PipelineEntryState::Requested
                | PipelineEntryState::ShaderLoading
                | PipelineEntryState::ReadyToLink
                | PipelineEntryState::RetryQueue
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PipelineEntryDesc {
    Raster(RasterPipelineDesc),
    Compute(ComputePipelineDesc),
}

impl PipelineEntryDesc {
    pub fn pipeline_type(&self) -> PipelineType {
        match self {
            PipelineEntryDesc::Raster(_) => PipelineType::Raster,
            PipelineEntryDesc::Compute(_) => PipelineType::Compute,
        }
    }

    /// Shaders the pipeline needs, in binding order
    pub fn shaders(&self) -> Vec<(ShaderPath, ShaderStage)> {
        match self {
            PipelineEntryDesc::Raster(desc) => vec![
                (desc.vertex_shader.clone(), ShaderStage::Vertex),
                (desc.pixel_shader.clone(), ShaderStage::Pixel),
            ],
            PipelineEntryDesc::Compute(desc) => {
                vec![(desc.compute_shader.clone(), ShaderStage::Compute)]
            }
        }
    }
}

#[derive(Debug)]
pub struct PipelineEntry {
    pub handle: PipelineHandle,
    pub desc: PipelineEntryDesc,
    pub state: PipelineEntryState,
    /// Parallel to `desc.shaders()`, filled as loads complete
    pub shaders: Vec<Option<Arc<dyn Shader>>>,
    pub pipeline_state: Option<Arc<dyn PipelineState>>,
    pub build_attempts: u32,
    /// Shader loads requested and not yet released
    pub loads_requested: bool,
}

impl PipelineEntry {
    pub fn new(handle: PipelineHandle, desc: PipelineEntryDesc) -> Self {
        let shader_count = desc.shaders().len();
        Self {
            handle,
            desc,
            state: PipelineEntryState::Requested,
            shaders: vec![None; shader_count],
            pipeline_state: None,
            build_attempts: 0,
            loads_requested: false,
        }
    }

    pub fn all_shaders_loaded(&self) -> bool {
        self.shaders.iter().all(Option::is_some)
    }

    fn shader(&self, slot: usize) -> Result<&Arc<dyn Shader>> {
        self.shaders
            .get(slot)
            .and_then(Option::as_ref)
            .ok_or_else(|| Error::InvalidResource(format!("pipeline {} shader {} not loaded", self.handle, slot)))
    }

    /// Create the backend pipeline-state object from the loaded shaders
    pub fn build(&self, device: &mut dyn RhiDevice) -> Result<Arc<dyn PipelineState>> {
        match &self.desc {
            PipelineEntryDesc::Raster(desc) => {
                device.create_raster_pipeline_state(desc, self.shader(0)?, self.shader(1)?)
            }
            PipelineEntryDesc::Compute(desc) => {
                device.create_compute_pipeline_state(desc, self.shader(0)?)
            }
        }
    }
}
