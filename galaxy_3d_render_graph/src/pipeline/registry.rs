/// Pipeline registry
///
/// Caches pipeline-state objects by descriptor. Registering returns a handle
/// immediately; the shaders are loaded asynchronously through the
/// [`ShaderLoader`] and the backend object is built on a later
/// [`update`](PipelineRegistry::update). Frames keep running meanwhile and
/// simply see the pipeline as not ready.
///
/// `update` is the non-blocking steady-state poll. `update_block` is the
/// startup routine that spins until nothing is pending.

use std::sync::Arc;
use std::time::Instant;
use rustc_hash::FxHashMap;
use crate::config::PipelineRegistryConfig;
use crate::error::{Error, Result};
use crate::pipeline::entry::{PipelineEntry, PipelineEntryDesc, PipelineEntryState};
use crate::pipeline::loader::{ShaderLoadStatus, ShaderLoader};
use crate::pipeline::PipelineHandle;
use crate::rhi::{ComputePipelineDesc, PipelineState, RasterPipelineDesc, RhiDevice};
use crate::{engine_debug, engine_error, engine_warn};

pub struct PipelineRegistry {
    config: PipelineRegistryConfig,
    loader: Box<dyn ShaderLoader>,
    /// Entry of handle id `n` lives at `n - 1`
    entries: Vec<PipelineEntry>,
    lookup: FxHashMap<PipelineEntryDesc, PipelineHandle>,
    /// Entries whose build failed transiently, retried by the next update
    retry_queue: Vec<u32>,
    initialized: bool,
}

impl PipelineRegistry {
    pub fn new(loader: Box<dyn ShaderLoader>, config: PipelineRegistryConfig) -> Self {
        Self {
            config,
            loader,
            entries: Vec::new(),
            lookup: FxHashMap::default(),
            retry_queue: Vec::new(),
            initialized: false,
        }
    }

    pub fn initialize(&mut self) -> Result<()> {
        if self.initialized {
            engine_warn!("galaxy3d::PipelineRegistry", "Pipeline registry already initialized");
            return Ok(());
        }
        self.initialized = true;
        engine_debug!("galaxy3d::PipelineRegistry", "Pipeline registry initialized");
        Ok(())
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Release every shader request and forget all entries
    ///
    /// Pipeline states must have been destroyed first with
    /// [`destroy_all_pipeline_states`](Self::destroy_all_pipeline_states).
    pub fn shutdown(&mut self) {
        for entry in &self.entries {
            if entry.pipeline_state.is_some() {
                engine_error!("galaxy3d::PipelineRegistry",
                    "Pipeline {} still has a live pipeline state at shutdown", entry.handle);
            }
            if entry.loads_requested {
                for (path, _) in entry.desc.shaders() {
                    self.loader.unload(entry.handle.id, &path);
                }
            }
        }
        self.entries.clear();
        self.lookup.clear();
        self.retry_queue.clear();
        self.initialized = false;
    }

    // ===== REGISTRATION =====

    pub fn register_raster_pipeline(&mut self, desc: &RasterPipelineDesc) -> PipelineHandle {
        if !desc.is_valid() {
            engine_error!("galaxy3d::PipelineRegistry",
                "Rejected raster pipeline with empty shader path ('{}', '{}')",
                desc.vertex_shader, desc.pixel_shader);
            return PipelineHandle::INVALID;
        }
        self.register(PipelineEntryDesc::Raster(desc.clone()))
    }

    pub fn register_compute_pipeline(&mut self, desc: &ComputePipelineDesc) -> PipelineHandle {
        if !desc.is_valid() {
            engine_error!("galaxy3d::PipelineRegistry", "Rejected compute pipeline with empty shader path");
            return PipelineHandle::INVALID;
        }
        self.register(PipelineEntryDesc::Compute(desc.clone()))
    }

    /// Structurally equal descriptors share one entry
    fn register(&mut self, desc: PipelineEntryDesc) -> PipelineHandle {
        if let Some(handle) = self.lookup.get(&desc) {
            return *handle;
        }
        let id = self.entries.len() as u32 + 1;
        let handle = PipelineHandle::new(desc.pipeline_type(), id);
        if !handle.is_valid() {
            engine_error!("galaxy3d::PipelineRegistry", "Pipeline id space exhausted");
            return PipelineHandle::INVALID;
        }
        self.lookup.insert(desc.clone(), handle);
        self.entries.push(PipelineEntry::new(handle, desc));
        handle
    }

    fn entry(&self, handle: PipelineHandle) -> Option<&PipelineEntry> {
        if !handle.is_valid() {
            return None;
        }
        self.entries
            .get(handle.id as usize - 1)
            .filter(|entry| entry.handle == handle)
    }

    // ===== QUERIES =====

    /// Non-blocking, safe to poll every frame
    pub fn is_pipeline_ready(&self, handle: PipelineHandle) -> bool {
        self.entry_state(handle) == Some(PipelineEntryState::Visible)
    }

    pub fn entry_state(&self, handle: PipelineHandle) -> Option<PipelineEntryState> {
        self.entry(handle).map(|entry| entry.state)
    }

    /// Backend object of a visible pipeline, None while it is not ready
    pub fn try_get_rhi_pipeline_state(&self, handle: PipelineHandle) -> Option<Arc<dyn PipelineState>> {
        let entry = self.entry(handle)?;
        if entry.state != PipelineEntryState::Visible {
            return None;
        }
        entry.pipeline_state.clone()
    }

    /// Any entry still waiting on shaders or a build
    pub fn is_busy(&self) -> bool {
        self.entries.iter().any(|entry| entry.state.is_pending())
    }

    pub fn pipeline_count(&self) -> usize {
        self.entries.len()
    }

    // ===== UPDATE =====

    /// One non-blocking pass: request loads, poll shaders, build pipelines
    ///
    /// Entries queued for retry by the previous pass are rebuilt first.
    pub fn update(&mut self, device: &mut dyn RhiDevice) -> Result<()> {
        if !self.initialized {
            engine_error!("galaxy3d::PipelineRegistry", "update called before initialize");
            return Err(Error::InitializationFailed(
                "pipeline registry not initialized".to_string(),
            ));
        }

        self.request_shader_loads();
        self.poll_shader_loads();

        let retries = std::mem::take(&mut self.retry_queue);
        let ready: Vec<u32> = self
            .entries
            .iter()
            .filter(|entry| entry.state == PipelineEntryState::ReadyToLink)
            .map(|entry| entry.handle.id)
            .collect();
        for id in retries.into_iter().chain(ready) {
            self.build_entry(id, device);
        }
        Ok(())
    }

    fn request_shader_loads(&mut self) {
        for entry in &mut self.entries {
            if entry.state != PipelineEntryState::Requested {
                continue;
            }
            for (path, stage) in entry.desc.shaders() {
                self.loader.request_load(entry.handle.id, &path, stage);
            }
            entry.loads_requested = true;
            entry.state = PipelineEntryState::ShaderLoading;
        }
    }

    fn poll_shader_loads(&mut self) {
        for entry in &mut self.entries {
            if entry.state != PipelineEntryState::ShaderLoading {
                continue;
            }
            let shaders = entry.desc.shaders();
            let mut failure = None;
            for (slot, (path, _)) in shaders.iter().enumerate() {
                if entry.shaders[slot].is_some() {
                    continue;
                }
                match self.loader.status(path) {
                    ShaderLoadStatus::Loaded(shader) => entry.shaders[slot] = Some(shader),
                    ShaderLoadStatus::Pending => {}
                    ShaderLoadStatus::Failed(reason) => {
                        failure = Some(format!("'{}': {}", path, reason));
                        break;
                    }
                }
            }

            if let Some(reason) = failure {
                engine_error!("galaxy3d::PipelineRegistry",
                    "Pipeline {} shader load failed {}", entry.handle, reason);
                for (path, _) in &shaders {
                    self.loader.unload(entry.handle.id, path);
                }
                entry.shaders.iter_mut().for_each(|shader| *shader = None);
                entry.loads_requested = false;
                entry.state = PipelineEntryState::Failed;
            } else if entry.all_shaders_loaded() {
                entry.state = PipelineEntryState::ReadyToLink;
            }
        }
    }

    fn build_entry(&mut self, id: u32, device: &mut dyn RhiDevice) {
        let max_attempts = self.config.max_build_attempts;
        let Some(entry) = self.entries.get_mut(id as usize - 1) else { return };
        if !matches!(entry.state, PipelineEntryState::ReadyToLink | PipelineEntryState::RetryQueue) {
            return;
        }

        match entry.build(device) {
            Ok(pipeline_state) => {
                entry.pipeline_state = Some(pipeline_state);
                entry.state = PipelineEntryState::Visible;
                engine_debug!("galaxy3d::PipelineRegistry", "Pipeline {} is visible", entry.handle);
            }
            Err(e) => {
                entry.build_attempts += 1;
                let exhausted = max_attempts.is_some_and(|max| entry.build_attempts >= max);
                if e.is_transient() && !exhausted {
                    engine_warn!("galaxy3d::PipelineRegistry",
                        "Pipeline {} build failed ({}), retrying next update", entry.handle, e);
                    entry.state = PipelineEntryState::RetryQueue;
                    self.retry_queue.push(id);
                } else {
                    engine_error!("galaxy3d::PipelineRegistry",
                        "Pipeline {} build failed after {} attempt(s): {}",
                        entry.handle, entry.build_attempts, e);
                    entry.state = PipelineEntryState::Failed;
                }
            }
        }
    }

    /// Update until no entry is pending
    ///
    /// Startup only. Sleeps `update_block_poll_interval` between passes and
    /// fails if entries are still pending after `update_block_timeout`.
    pub fn update_block(&mut self, device: &mut dyn RhiDevice) -> Result<()> {
        let start = Instant::now();
        while self.is_busy() {
            self.update(device)?;
            if !self.is_busy() {
                break;
            }
            if start.elapsed() >= self.config.update_block_timeout {
                engine_error!("galaxy3d::PipelineRegistry",
                    "Pipelines still pending after {:?}", self.config.update_block_timeout);
                return Err(Error::InitializationFailed(format!(
                    "pipelines still pending after {:?}",
                    self.config.update_block_timeout
                )));
            }
            std::thread::sleep(self.config.update_block_poll_interval);
        }
        Ok(())
    }

    /// Destroy every backend pipeline state after waiting for the GPU
    ///
    /// Entries go back to `ReadyToLink` and are rebuilt by the next update.
    pub fn destroy_all_pipeline_states(&mut self, device: &mut dyn RhiDevice) -> Result<()> {
        device.wait_idle()?;
        for entry in &mut self.entries {
            if let Some(pipeline_state) = entry.pipeline_state.take() {
                device.destroy_pipeline_state(pipeline_state);
                entry.state = PipelineEntryState::ReadyToLink;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
