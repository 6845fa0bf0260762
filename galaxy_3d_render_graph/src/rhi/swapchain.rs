/// Swapchain frame targets and synchronization primitives

use std::fmt::Debug;
use std::sync::Arc;
use crate::rhi::Texture;

/// GPU-GPU synchronization primitive (binary semaphore)
pub trait Semaphore: Send + Sync + Debug {}

/// The swapchain image acquired for the current frame
///
/// Only known once the device has acquired it, so the render graph binds it
/// to the imported swapchain slot at present time.
#[derive(Debug, Clone)]
pub struct FrameRenderTarget {
    pub texture: Arc<dyn Texture>,
    /// Signaled when the image is ready to be rendered to
    pub acquire_semaphore: Arc<dyn Semaphore>,
    /// Signaled when rendering completes, waited on by present
    pub complete_semaphore: Arc<dyn Semaphore>,
    pub frame_index: u64,
}
