/// Runtime configuration for the render graph and the pipeline registry

use std::time::Duration;

/// Render graph configuration
#[derive(Debug, Clone)]
pub struct RenderGraphConfig {
    /// Number of command contexts cycled by frame index (clamped to at least 1)
    pub frames_in_flight: u32,
    /// Cached transient resources unused for more frames than this are destroyed
    pub transient_retention_frames: u64,
    /// Dump every node and its accesses at debug severity when compiling
    pub log_graph_nodes: bool,
    /// Assert that graph building happens on the engine main thread
    pub enforce_main_thread: bool,
}

impl RenderGraphConfig {
    pub fn frames_in_flight(&self) -> u32 {
        self.frames_in_flight.max(1)
    }
}

impl Default for RenderGraphConfig {
    fn default() -> Self {
        Self {
            frames_in_flight: 2,
            transient_retention_frames: 3,
            log_graph_nodes: cfg!(debug_assertions),
            enforce_main_thread: true,
        }
    }
}

/// Pipeline registry configuration
#[derive(Debug, Clone)]
pub struct PipelineRegistryConfig {
    /// How long the blocking startup routine waits for pending pipelines
    pub update_block_timeout: Duration,
    /// Sleep between two passes of the blocking startup routine
    pub update_block_poll_interval: Duration,
    /// Build attempts before an entry is marked failed, None retries forever
    pub max_build_attempts: Option<u32>,
}

impl Default for PipelineRegistryConfig {
    fn default() -> Self {
        Self {
            update_block_timeout: Duration::from_secs(30),
            update_block_poll_interval: Duration::from_millis(1),
            max_build_attempts: None,
        }
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
