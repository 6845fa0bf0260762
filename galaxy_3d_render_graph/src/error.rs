//! Error types for the Galaxy3D render graph
//!
//! This module defines the error types used throughout the RHI layer,
//! the render graph compiler/executor and the pipeline registry.

use std::fmt;

/// Result type for Galaxy3D render graph operations
pub type Result<T> = std::result::Result<T, Error>;

/// Galaxy3D render graph errors
#[derive(Debug, Clone)]
pub enum Error {
    /// Backend-specific error (Vulkan, DX11, etc.)
    BackendError(String),

    /// Out of GPU memory
    OutOfMemory,

    /// Invalid resource (texture, buffer, shader, etc.)
    InvalidResource(String),

    /// Initialization failed (engine, device, registries)
    InitializationFailed(String),

    /// Graph compilation aborted, the frame must not be executed
    CompilationFailed(String),

    /// A handle whose generation no longer matches its slot
    InvalidHandle(String),

    /// Swapchain is stale and must be recreated
    SwapchainOutOfDate,

    /// Device could not service the request right now, retry later
    DeviceBusy,
}

impl Error {
    /// Device-transient errors are recovered locally (recreate or retry)
    pub fn is_transient(&self) -> bool {
        matches!(self, Error::SwapchainOutOfDate | Error::DeviceBusy)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::BackendError(msg) => write!(f, "Backend error: {}", msg),
            Error::OutOfMemory => write!(f, "Out of GPU memory"),
            Error::InvalidResource(msg) => write!(f, "Invalid resource: {}", msg),
            Error::InitializationFailed(msg) => write!(f, "Initialization failed: {}", msg),
            Error::CompilationFailed(msg) => write!(f, "Render graph compilation failed: {}", msg),
            Error::InvalidHandle(msg) => write!(f, "Invalid handle: {}", msg),
            Error::SwapchainOutOfDate => write!(f, "Swapchain out of date"),
            Error::DeviceBusy => write!(f, "Device busy"),
        }
    }
}

impl std::error::Error for Error {}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
