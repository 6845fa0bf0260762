//! Unit tests for the node builder

use std::sync::{Arc, Mutex};
use super::*;
use crate::config::{PipelineRegistryConfig, RenderGraphConfig};
use crate::pipeline::mock_shader_loader::MockShaderLoader;
use crate::pipeline::PipelineRegistry;
use crate::rhi::mock_device::MockDevice;
use crate::rhi::{BufferDesc, TextureAspect, TextureDesc, TextureFormat};

fn test_graph() -> RenderGraph {
    RenderGraph::new("builder test", RenderGraphConfig {
        enforce_main_thread: false,
        log_graph_nodes: false,
        ..RenderGraphConfig::default()
    })
}

fn color_desc() -> TextureDesc {
    TextureDesc::new_2d(256, 256, TextureFormat::R8G8B8A8_UNORM)
}

fn depth_desc() -> TextureDesc {
    TextureDesc::new_2d(256, 256, TextureFormat::D32_FLOAT)
}

// ============================================================================
// ACCESS DECLARATION
// ============================================================================

#[test]
fn test_valid_accesses_are_recorded_in_order() {
    let mut graph = test_graph();
    let a = graph.create_temporary_resource(BufferDesc::new_size(512));
    let b = graph.create_temporary_resource(BufferDesc::new_size(256));

    let mut node = graph.add_node("Clear Color RT");
    let read = node.common_read(a, BarrierState::ComputeShaderReadOther);
    let vertices = node.raster_read(b, BarrierState::VertexBuffer);
    assert!(read.is_valid());
    assert!(vertices.is_valid());
    assert_eq!(node.finish(), 0);

    let declared = &graph.nodes()[0];
    assert_eq!(declared.name, "Clear Color RT");
    assert_eq!(declared.accesses.len(), 2);
    assert_eq!(declared.accesses[0].id, a.id());
    assert_eq!(declared.accesses[0].state.barrier, BarrierState::ComputeShaderReadOther);
    assert_eq!(declared.accesses[1].id, b.id());
}

#[test]
fn test_read_rejects_write_state() {
    let mut graph = test_graph();
    let a = graph.create_temporary_resource(BufferDesc::new_size(64));

    let mut node = graph.add_node("Bad Read");
    let resource = node.common_read(a, BarrierState::ComputeShaderWrite);
    assert!(!resource.is_valid());
    assert!(resource.bind().is_unknown());
    node.finish();

    assert!(graph.nodes()[0].accesses.is_empty());
}

#[test]
fn test_write_rejects_read_state() {
    let mut graph = test_graph();
    let a = graph.create_temporary_resource(BufferDesc::new_size(64));

    let mut node = graph.add_node("Bad Write");
    assert!(!node.common_write(a, BarrierState::VertexBuffer).is_valid());
    node.finish();
    assert!(graph.nodes()[0].accesses.is_empty());
}

#[test]
fn test_raster_rejects_compute_stage() {
    let mut graph = test_graph();
    let a = graph.create_temporary_resource(BufferDesc::new_size(64));

    let mut node = graph.add_node("Draw");
    assert!(!node.raster_read(a, BarrierState::ComputeShaderReadOther).is_valid());
    assert!(!node.raster_write(a, BarrierState::ComputeShaderWrite).is_valid());
    assert!(node.raster_write(a, BarrierState::FragmentShaderWrite).is_valid());
}

#[test]
fn test_undefined_state_is_rejected() {
    let mut graph = test_graph();
    let a = graph.create_temporary_resource(BufferDesc::new_size(64));

    let mut node = graph.add_node("Undefined");
    assert!(!node.access(a, RenderResourceAccessState::UNDEFINED).is_valid());
}

#[test]
fn test_second_access_to_same_resource_is_rejected() {
    let mut graph = test_graph();
    let a = graph.create_temporary_resource(BufferDesc::new_size(64));

    let mut node = graph.add_node("Twice");
    assert!(node.common_write(a, BarrierState::ComputeShaderWrite).is_valid());
    assert!(!node.common_read(a, BarrierState::ComputeShaderReadOther).is_valid());
    node.finish();
    assert_eq!(graph.nodes()[0].accesses.len(), 1);
}

#[test]
fn test_stale_handle_is_rejected() {
    let mut device = MockDevice::new();
    let mut graph = test_graph();
    let stale = graph.create_temporary_resource(BufferDesc::new_size(64));
    graph.retire(&mut device);

    let mut node = graph.add_node("Stale");
    assert!(!node.common_read(stale, BarrierState::VertexBuffer).is_valid());
}

#[test]
fn test_texture_view_must_fit() {
    let mut graph = test_graph();
    let texture = graph.create_temporary_resource(color_desc());
    let mut view = color_desc().full_view();

    let mut node = graph.add_node("Views");
    view.mip_count = 4;
    assert!(!node
        .read_texture_view(texture, BarrierState::FragmentShaderReadSampledImageOrUniformTexelBuffer, view)
        .is_valid());

    view.mip_count = 1;
    view.aspect = TextureAspect::COLOR;
    let accepted = node.read_texture_view(
        texture,
        BarrierState::FragmentShaderReadSampledImageOrUniformTexelBuffer,
        view,
    );
    assert!(accepted.is_valid());
    assert_eq!(accepted.view(), view);
}

// ============================================================================
// ATTACHMENTS
// ============================================================================

#[test]
fn test_attachments_are_recorded() {
    let mut graph = test_graph();
    let color = graph.create_temporary_resource(color_desc());
    let depth = graph.create_temporary_resource(depth_desc());

    let mut node = graph.add_node("Forward");
    assert!(node.bind_color_attachment(color).is_valid());
    assert!(node.bind_depth_stencil(depth).is_valid());
    node.finish();

    let declared = &graph.nodes()[0];
    assert_eq!(declared.color_attachments, vec![color.id()]);
    assert_eq!(declared.depth_attachment, Some(depth.id()));
    assert_eq!(
        declared.access_of(color.id()).unwrap().state.barrier,
        BarrierState::ColorAttachmentWrite
    );
    assert_eq!(
        declared.access_of(depth.id()).unwrap().state.barrier,
        BarrierState::DepthStencilAttachmentWrite
    );
}

#[test]
fn test_attachment_formats_are_checked() {
    let mut graph = test_graph();
    let color = graph.create_temporary_resource(color_desc());
    let depth = graph.create_temporary_resource(depth_desc());

    let mut node = graph.add_node("Swapped");
    assert!(!node.bind_color_attachment(depth).is_valid());
    assert!(!node.bind_depth_stencil(color).is_valid());
    node.finish();

    let declared = &graph.nodes()[0];
    assert!(declared.color_attachments.is_empty());
    assert!(declared.depth_attachment.is_none());
}

#[test]
fn test_only_one_depth_attachment() {
    let mut graph = test_graph();
    let first = graph.create_temporary_resource(depth_desc());
    let second = graph.create_temporary_resource(depth_desc());

    let mut node = graph.add_node("Depth");
    assert!(node.bind_depth_stencil(first).is_valid());
    assert!(!node.bind_depth_stencil(second).is_valid());
    node.finish();
    assert_eq!(graph.nodes()[0].depth_attachment, Some(first.id()));
}

// ============================================================================
// PIPELINES AND COMMIT
// ============================================================================

#[test]
fn test_pipeline_without_registry_is_invalid() {
    let mut graph = test_graph();
    let mut node = graph.add_node("No Registry");
    let handle = node.register_compute_pipeline(&ComputePipelineDesc::new("shaders/clear.comp"));
    assert!(!handle.is_valid());
}

#[test]
fn test_nodes_share_deduplicated_pipeline() {
    let mut graph = test_graph();
    let registry = Arc::new(Mutex::new(PipelineRegistry::new(
        Box::new(MockShaderLoader::new()),
        PipelineRegistryConfig::default(),
    )));
    graph.attach_pipeline_registry(registry.clone());
    let desc = RasterPipelineDesc::new("shaders/imgui.vert", "shaders/imgui.frag");

    let first = graph.add_node("UI 1").register_raster_pipeline(&desc);
    let second = graph.add_node("UI 2").register_raster_pipeline(&desc);

    assert!(first.is_valid());
    assert_eq!(first, second);
    assert_eq!(registry.lock().unwrap().pipeline_count(), 1);
    assert_eq!(graph.nodes()[0].pipeline, first);
    assert_eq!(graph.nodes()[1].pipeline, first);
}

#[test]
fn test_drop_commits_node_with_callback() {
    let mut graph = test_graph();
    {
        let mut node = graph.add_node("Dropped");
        assert_eq!(node.name(), "Dropped");
        node.execute(|_ctx| Ok(()));
    }
    assert_eq!(graph.node_count(), 1);
    assert!(graph.nodes()[0].callback.is_some());
}
