/// Shader loading collaborator consumed by the pipeline registry

use std::sync::Arc;
use crate::rhi::{Shader, ShaderPath, ShaderStage};

/// Load status of a shader resource
#[derive(Debug, Clone)]
pub enum ShaderLoadStatus {
    Pending,
    Loaded(Arc<dyn Shader>),
    Failed(String),
}

/// Asynchronous shader resource loader
///
/// `request_load` starts a load and returns immediately; the registry polls
/// `status` until the shader is loaded or failed. Every request is paired
/// with one `unload` carrying the same request id.
pub trait ShaderLoader: Send {
    fn request_load(&mut self, request_id: u32, path: &ShaderPath, stage: ShaderStage);

    fn status(&self, path: &ShaderPath) -> ShaderLoadStatus;

    fn unload(&mut self, request_id: u32, path: &ShaderPath);
}
