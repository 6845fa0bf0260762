/// Texture trait, texture descriptor, and texture views

use std::fmt::Debug;

/// Texture pixel format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(non_camel_case_types)]
pub enum TextureFormat {
    R8G8B8A8_SRGB,
    R8G8B8A8_UNORM,
    B8G8R8A8_SRGB,
    B8G8R8A8_UNORM,
    R16G16B16A16_SFLOAT,
    R32_SFLOAT,
    R32G32B32A32_SFLOAT,
    D16_UNORM,
    D32_FLOAT,
    D24_UNORM_S8_UINT,
    D32_FLOAT_S8_UINT,
}

impl TextureFormat {
    pub fn is_depth(&self) -> bool {
        matches!(
            self,
            TextureFormat::D16_UNORM
                | TextureFormat::D32_FLOAT
                | TextureFormat::D24_UNORM_S8_UINT
                | TextureFormat::D32_FLOAT_S8_UINT
        )
    }

    pub fn has_stencil(&self) -> bool {
        matches!(self, TextureFormat::D24_UNORM_S8_UINT | TextureFormat::D32_FLOAT_S8_UINT)
    }

    /// Aspects covered by a view of the whole format
    pub fn aspect(&self) -> TextureAspect {
        if self.has_stencil() {
            TextureAspect::DEPTH | TextureAspect::STENCIL
        } else if self.is_depth() {
            TextureAspect::DEPTH
        } else {
            TextureAspect::COLOR
        }
    }
}

bitflags::bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct TextureUsage: u32 {
        const SAMPLED = 1 << 0;
        const STORAGE = 1 << 1;
        const COLOR_ATTACHMENT = 1 << 2;
        const DEPTH_STENCIL_ATTACHMENT = 1 << 3;
        const INPUT_ATTACHMENT = 1 << 4;
        const TRANSFER_SRC = 1 << 5;
        const TRANSFER_DST = 1 << 6;
    }
}

bitflags::bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct TextureFlags: u32 {
        const CUBE_COMPATIBLE = 1 << 0;
        /// Depth texture sampled with a comparison sampler
        const SHADOW_MAP = 1 << 1;
    }
}

bitflags::bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct TextureAspect: u32 {
        const COLOR = 1 << 0;
        const DEPTH = 1 << 1;
        const STENCIL = 1 << 2;
    }
}

/// Texture dimensionality
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureKind {
    Tex1D,
    Tex2D,
    Tex3D,
    Cube,
}

// ===== TEXTURE DESC =====

/// Descriptor for creating a texture
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureDesc {
    pub kind: TextureKind,
    pub width: u32,
    pub height: u32,
    /// Depth in texels, 1 for anything but 3D textures
    pub depth: u32,
    /// 6 per cube for cubemaps
    pub array_layers: u32,
    pub mip_levels: u32,
    pub format: TextureFormat,
    pub usage: TextureUsage,
    pub flags: TextureFlags,
}

impl TextureDesc {
    fn base(kind: TextureKind, width: u32, height: u32, format: TextureFormat) -> Self {
        let attachment = if format.is_depth() {
            TextureUsage::DEPTH_STENCIL_ATTACHMENT
        } else {
            TextureUsage::COLOR_ATTACHMENT
        };
        Self {
            kind,
            width,
            height,
            depth: 1,
            array_layers: 1,
            mip_levels: 1,
            format,
            usage: TextureUsage::SAMPLED | TextureUsage::TRANSFER_DST | attachment,
            flags: TextureFlags::empty(),
        }
    }

    pub fn new_1d(width: u32, format: TextureFormat) -> Self {
        Self::base(TextureKind::Tex1D, width, 1, format)
    }

    pub fn new_1d_array(width: u32, format: TextureFormat, array_layers: u32) -> Self {
        Self {
            array_layers,
            ..Self::new_1d(width, format)
        }
    }

    pub fn new_2d(width: u32, height: u32, format: TextureFormat) -> Self {
        Self::base(TextureKind::Tex2D, width, height, format)
    }

    pub fn new_2d_array(width: u32, height: u32, format: TextureFormat, array_layers: u32) -> Self {
        Self {
            array_layers,
            ..Self::new_2d(width, height, format)
        }
    }

    pub fn new_3d(width: u32, height: u32, depth: u32, format: TextureFormat) -> Self {
        Self {
            depth,
            ..Self::base(TextureKind::Tex3D, width, height, format)
        }
    }

    pub fn new_cubemap(width: u32, format: TextureFormat) -> Self {
        Self {
            array_layers: 6,
            flags: TextureFlags::CUBE_COMPATIBLE,
            ..Self::base(TextureKind::Cube, width, width, format)
        }
    }

    /// Mark as a sampled depth target. Only valid on depth formats.
    pub fn as_shadow_map(&mut self) {
        self.flags |= TextureFlags::SHADOW_MAP;
        self.usage |= TextureUsage::DEPTH_STENCIL_ATTACHMENT | TextureUsage::SAMPLED;
    }

    pub fn is_valid(&self) -> bool {
        if self.width == 0 || self.height == 0 || self.depth == 0 {
            return false;
        }
        if self.array_layers == 0 || self.mip_levels == 0 || self.usage.is_empty() {
            return false;
        }
        let shape_ok = match self.kind {
            TextureKind::Tex1D => self.height == 1 && self.depth == 1,
            TextureKind::Tex2D => self.depth == 1,
            TextureKind::Tex3D => self.array_layers == 1,
            TextureKind::Cube => {
                self.width == self.height && self.depth == 1 && self.array_layers % 6 == 0
            }
        };
        let depth_usage = self.usage.contains(TextureUsage::DEPTH_STENCIL_ATTACHMENT)
            || self.flags.contains(TextureFlags::SHADOW_MAP);
        let color_usage = self.usage.contains(TextureUsage::COLOR_ATTACHMENT);
        shape_ok
            && (!depth_usage || self.format.is_depth())
            && (!color_usage || !self.format.is_depth())
    }

    /// View covering every mip and layer of the texture
    pub fn full_view(&self) -> TextureViewDesc {
        TextureViewDesc {
            aspect: self.format.aspect(),
            base_mip: 0,
            mip_count: self.mip_levels,
            base_layer: 0,
            layer_count: self.array_layers,
        }
    }
}

/// Sub-resource range of a texture access
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureViewDesc {
    pub aspect: TextureAspect,
    pub base_mip: u32,
    pub mip_count: u32,
    pub base_layer: u32,
    pub layer_count: u32,
}

impl TextureViewDesc {
    /// Whether the range fits inside the texture
    pub fn fits(&self, desc: &TextureDesc) -> bool {
        self.mip_count > 0
            && self.layer_count > 0
            && self.base_mip + self.mip_count <= desc.mip_levels
            && self.base_layer + self.layer_count <= desc.array_layers
            && desc.format.aspect().contains(self.aspect)
    }
}

// ===== TEXTURE TRAIT =====

/// Texture resource trait
///
/// Implemented by backend-specific texture types.
pub trait Texture: Send + Sync + Debug {
    fn desc(&self) -> &TextureDesc;
}

#[cfg(test)]
#[path = "texture_tests.rs"]
mod tests;
