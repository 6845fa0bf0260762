/// Shader trait and shader identifiers

use std::fmt::{self, Debug};

/// Shader stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    Vertex,
    Pixel,
    Compute,
}

/// Resource path of a compiled shader (e.g. "data://shaders/imgui/imgui.vsdr")
///
/// Two pipelines referencing the same path share the same shader resource.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ShaderPath(String);

impl ShaderPath {
    pub fn new(path: impl Into<String>) -> Self {
        Self(path.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_valid(&self) -> bool {
        !self.0.is_empty()
    }
}

impl fmt::Display for ShaderPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ShaderPath {
    fn from(path: &str) -> Self {
        Self::new(path)
    }
}

/// Loaded shader module
///
/// Produced by the shader loading collaborator and consumed by the device
/// when it builds pipeline-state objects.
pub trait Shader: Send + Sync + Debug {
    fn stage(&self) -> ShaderStage;
    fn path(&self) -> &ShaderPath;
}
