/// Buffer trait and buffer descriptor

use std::fmt::Debug;

bitflags::bitflags! {
    /// Buffer usage flags, combinable (e.g. `VERTEX | TRANSFER_DST`)
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct BufferUsage: u32 {
        const VERTEX = 1 << 0;
        const INDEX = 1 << 1;
        const UNIFORM = 1 << 2;
        const STORAGE = 1 << 3;
        const INDIRECT = 1 << 4;
        const TRANSFER_SRC = 1 << 5;
        const TRANSFER_DST = 1 << 6;
        const DEVICE_ADDRESS = 1 << 7;
    }
}

/// Where the buffer memory lives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MemoryUsage {
    /// Device local, not host visible
    GpuOnly,
    /// Host visible, written by the CPU every frame
    CpuToGpu,
    /// Host visible, read back by the CPU
    GpuToCpu,
}

/// Descriptor for creating a buffer
///
/// Descriptors are plain values compared field by field: the transient
/// cache only hands a buffer back for a structurally equal descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BufferDesc {
    /// Size in bytes
    pub size: u64,
    pub usage: BufferUsage,
    pub memory: MemoryUsage,
    /// Keep the buffer mapped for its whole lifetime
    pub persistent_mapping: bool,
}

impl BufferDesc {
    /// Generic device-local buffer usable as storage and copy destination
    pub fn new_size(size: u64) -> Self {
        Self {
            size,
            usage: BufferUsage::STORAGE | BufferUsage::TRANSFER_DST,
            memory: MemoryUsage::GpuOnly,
            persistent_mapping: false,
        }
    }

    /// Same as `new_size` with `size` rounded up to a multiple of `alignment`
    pub fn new_aligned_size(size: u64, alignment: u64) -> Self {
        let alignment = alignment.max(1);
        Self::new_size(size.div_ceil(alignment) * alignment)
    }

    pub fn new_device_addressable(size: u64) -> Self {
        Self {
            usage: BufferUsage::STORAGE | BufferUsage::DEVICE_ADDRESS | BufferUsage::TRANSFER_DST,
            ..Self::new_size(size)
        }
    }

    pub fn new_vertex_buffer(size: u64) -> Self {
        Self {
            usage: BufferUsage::VERTEX | BufferUsage::TRANSFER_DST,
            ..Self::new_size(size)
        }
    }

    pub fn new_index_buffer(size: u64) -> Self {
        Self {
            usage: BufferUsage::INDEX | BufferUsage::TRANSFER_DST,
            ..Self::new_size(size)
        }
    }

    pub fn new_uniform_buffer(size: u64) -> Self {
        Self {
            size,
            usage: BufferUsage::UNIFORM,
            memory: MemoryUsage::CpuToGpu,
            persistent_mapping: false,
        }
    }

    pub fn new_uniform_buffer_persistent_mapping(size: u64) -> Self {
        let mut desc = Self::new_uniform_buffer(size);
        desc.as_persistent_mapping();
        desc
    }

    pub fn new_storage_buffer(size: u64) -> Self {
        Self {
            usage: BufferUsage::STORAGE,
            ..Self::new_size(size)
        }
    }

    /// Request a persistently mapped, host visible buffer
    pub fn as_persistent_mapping(&mut self) {
        self.persistent_mapping = true;
        if self.memory == MemoryUsage::GpuOnly {
            self.memory = MemoryUsage::CpuToGpu;
        }
    }

    /// A buffer needs a size, at least one usage, and host visible memory
    /// when it is persistently mapped
    pub fn is_valid(&self) -> bool {
        self.size > 0
            && !self.usage.is_empty()
            && !(self.persistent_mapping && self.memory == MemoryUsage::GpuOnly)
    }
}

/// Buffer resource trait
///
/// Implemented by backend-specific buffer types.
pub trait Buffer: Send + Sync + Debug {
    /// Descriptor the buffer was created with
    fn desc(&self) -> &BufferDesc;
}

#[cfg(test)]
#[path = "buffer_tests.rs"]
mod tests;
