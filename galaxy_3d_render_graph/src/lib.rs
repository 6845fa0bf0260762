/*!
# Galaxy 3D Render Graph

Render hardware interface and frame graph execution engine for the Galaxy
3D engine.

Backends (Vulkan, DX11) implement the `RhiDevice` trait family; rendering
code declares each frame as a render graph of nodes reading and writing
logical resources, and never touches barriers or allocation directly.

## Architecture

- **rhi**: Backend-agnostic device, resources, barrier model and command lists
- **rg**: Render graph (resource registry, transient cache, node builder,
  compiler, execution)
- **pipeline**: Pipeline-state registry with asynchronous shader loading
- **log**: Engine logging facility

A frame runs `build -> compile -> execute -> present -> retire`.
*/

// Internal modules
mod error;
mod engine;
pub mod log;
pub mod config;
pub mod utils;
pub mod rhi;
pub mod render_graph;
pub mod pipeline;

// Main galaxy3d namespace module
pub mod galaxy3d {
    // Error types
    pub use crate::error::{Error, Result};

    // Engine singleton
    pub use crate::engine::Engine;

    // Configuration
    pub use crate::config::{PipelineRegistryConfig, RenderGraphConfig};

    // Logging sub-module (types only, NOT macros)
    pub mod log {
        pub use crate::log::{Logger, LogEntry, LogSeverity, DefaultLogger};
        // Note: engine_* macros are NOT re-exported here - they are internal only
    }

    // Render hardware interface
    pub mod rhi {
        pub use crate::rhi::*;
    }

    // Render graph
    pub mod rg {
        pub use crate::render_graph::*;
    }

    // Pipeline registry
    pub mod pipeline {
        pub use crate::pipeline::*;
    }
}
