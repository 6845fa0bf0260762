/// Mock shader loader for unit tests
///
/// Shaders stay pending until the test completes them (or immediately
/// loaded in auto mode). The state is shared so a test keeps a handle to it
/// after the loader is boxed into a registry.

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use rustc_hash::{FxHashMap, FxHashSet};
use crate::pipeline::loader::{ShaderLoadStatus, ShaderLoader};
use crate::rhi::mock_device::MockShader;
use crate::rhi::{ShaderPath, ShaderStage};

#[derive(Debug, Default)]
pub struct MockLoaderState {
    /// Load immediately on request
    pub auto_complete: bool,
    /// With auto mode, a request only reports loaded after this long
    pub load_delay: Option<Duration>,
    pub requested_at: FxHashMap<ShaderPath, Instant>,
    pub stages: FxHashMap<ShaderPath, ShaderStage>,
    pub loaded: FxHashSet<ShaderPath>,
    pub failing: FxHashSet<ShaderPath>,
    pub requests: Vec<(u32, ShaderPath)>,
    pub unloads: Vec<(u32, ShaderPath)>,
}

#[derive(Debug, Clone, Default)]
pub struct MockShaderLoader {
    pub state: Arc<Mutex<MockLoaderState>>,
}

impl MockShaderLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn auto_complete() -> Self {
        let loader = Self::new();
        loader.state.lock().unwrap().auto_complete = true;
        loader
    }

    /// Auto mode where every shader takes `delay` to load
    pub fn delayed(delay: Duration) -> Self {
        let loader = Self::auto_complete();
        loader.state.lock().unwrap().load_delay = Some(delay);
        loader
    }

    /// Finish every requested load
    pub fn complete_all(&self) {
        let mut state = self.state.lock().unwrap();
        let requested: Vec<ShaderPath> = state.stages.keys().cloned().collect();
        state.loaded.extend(requested);
    }

    pub fn fail(&self, path: &str) {
        self.state.lock().unwrap().failing.insert(ShaderPath::new(path));
    }

    pub fn request_count(&self) -> usize {
        self.state.lock().unwrap().requests.len()
    }

    pub fn unload_count(&self) -> usize {
        self.state.lock().unwrap().unloads.len()
    }
}

impl ShaderLoader for MockShaderLoader {
    fn request_load(&mut self, request_id: u32, path: &ShaderPath, stage: ShaderStage) {
        let mut state = self.state.lock().unwrap();
        state.requests.push((request_id, path.clone()));
        state.stages.insert(path.clone(), stage);
        state.requested_at.insert(path.clone(), Instant::now());
        if state.auto_complete && state.load_delay.is_none() {
            state.loaded.insert(path.clone());
        }
    }

    fn status(&self, path: &ShaderPath) -> ShaderLoadStatus {
        let state = self.state.lock().unwrap();
        if state.failing.contains(path) {
            return ShaderLoadStatus::Failed("mock failure".to_string());
        }
        let elapsed = match (state.load_delay, state.requested_at.get(path)) {
            (Some(delay), Some(requested)) => requested.elapsed() >= delay,
            _ => false,
        };
        match (state.loaded.contains(path) || elapsed, state.stages.get(path)) {
            (true, Some(stage)) => ShaderLoadStatus::Loaded(Arc::new(MockShader::new(*stage, path.clone()))),
            _ => ShaderLoadStatus::Pending,
        }
    }

    fn unload(&mut self, request_id: u32, path: &ShaderPath) {
        self.state.lock().unwrap().unloads.push((request_id, path.clone()));
    }
}
