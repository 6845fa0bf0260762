//! Unit tests for pipeline descriptors

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use crate::rhi::{
    BlendFactor, BlendState, ComputePipelineDesc, CullMode, IndexType, RasterPipelineDesc,
    RasterizerState, TextureFormat,
};

fn hash_of<T: Hash>(value: &T) -> u64 {
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    hasher.finish()
}

fn imgui_desc() -> RasterPipelineDesc {
    RasterPipelineDesc::new("data://shaders/imgui/imgui.vsdr", "data://shaders/imgui/imgui.psdr")
        .with_rasterizer(RasterizerState::no_culling())
        .with_blend(BlendState::color_additive_alpha())
        .with_depth(false, false)
        .with_color_format(TextureFormat::B8G8R8A8_UNORM)
}

// ============================================================================
// RASTER DESCRIPTORS
// ============================================================================

#[test]
fn test_structurally_equal_descs_hash_equal() {
    let a = imgui_desc();
    let b = imgui_desc();
    assert_eq!(a, b);
    assert_eq!(hash_of(&a), hash_of(&b));
}

#[test]
fn test_different_shader_paths_differ() {
    let a = imgui_desc();
    let mut b = imgui_desc();
    b.pixel_shader = "data://shaders/imgui/other.psdr".into();
    assert_ne!(a, b);
}

#[test]
fn test_builder_methods() {
    let desc = imgui_desc().with_depth_format(TextureFormat::D32_FLOAT);
    assert_eq!(desc.rasterizer.cull_mode, CullMode::None);
    assert!(desc.blend.blend_enable);
    assert_eq!(desc.blend.src_color_factor, BlendFactor::SrcAlpha);
    assert!(!desc.depth_test);
    assert_eq!(desc.color_formats, vec![TextureFormat::B8G8R8A8_UNORM]);
    assert_eq!(desc.depth_format, Some(TextureFormat::D32_FLOAT));
    assert!(desc.is_valid());
}

#[test]
fn test_empty_shader_path_is_invalid() {
    assert!(!RasterPipelineDesc::new("", "ps").is_valid());
    assert!(!ComputePipelineDesc::new("").is_valid());
    assert!(ComputePipelineDesc::new("data://shaders/cull.csdr").is_valid());
}

#[test]
fn test_defaults() {
    assert_eq!(RasterizerState::default().cull_mode, CullMode::Back);
    assert!(!BlendState::default().blend_enable);
    assert_eq!(IndexType::U16.size_bytes(), 2);
    assert_eq!(IndexType::U32.size_bytes(), 4);
}
