//! Pipeline-state registry
//!
//! Deduplicates pipeline descriptors, loads their shaders asynchronously
//! and builds backend pipeline-state objects without stalling frames.

mod entry;
mod handle;
mod loader;
mod registry;

#[cfg(test)]
pub mod mock_shader_loader;

pub use entry::{PipelineEntryDesc, PipelineEntryState};
pub use handle::PipelineHandle;
pub use loader::{ShaderLoadStatus, ShaderLoader};
pub use registry::PipelineRegistry;
