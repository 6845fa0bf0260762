/// Opaque pipeline handles

use std::fmt;
use crate::rhi::PipelineType;

/// Handle to a registered pipeline, usable before the pipeline is built
///
/// Ids start at 1 and double as the shader load request id of the entry.
/// 0 and `u32::MAX` are reserved invalid values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PipelineHandle {
    pub kind: PipelineType,
    pub id: u32,
}

impl PipelineHandle {
    pub const INVALID: Self = Self {
        kind: PipelineType::Raster,
        id: 0,
    };

    pub const fn new(kind: PipelineType, id: u32) -> Self {
        Self { kind, id }
    }

    pub fn is_valid(&self) -> bool {
        self.id != 0 && self.id != u32::MAX
    }
}

impl Default for PipelineHandle {
    fn default() -> Self {
        Self::INVALID
    }
}

impl fmt::Display for PipelineHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}#{}", self.kind, self.id)
    }
}
