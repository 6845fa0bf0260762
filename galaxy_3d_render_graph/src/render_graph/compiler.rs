/// Render graph compiler
///
/// Turns the declared node list into two execution sequences and resolves
/// every active resource to a GPU object:
///
/// 1. Every access must reference a live slot.
/// 2. Nodes touching the swapchain are moved to the present sequence, after
///    all other nodes. Both sequences keep declaration order.
/// 3. Lifetimes are measured over that execution order.
/// 4. Lazy resources are resolved from their persisted backing, then the
///    transient cache, then the device.
/// 5. Accesses are walked in execution order; each state change becomes a
///    transition attached to the node that needs it.

use rustc_hash::FxHashMap;
use crate::error::{Error, Result};
use crate::render_graph::handle::ResourceId;
use crate::render_graph::node::{CompiledNode, RenderGraphNode, Transition};
use crate::render_graph::registry::ResourceRegistry;
use crate::render_graph::resource::{
    BackendResource, CompiledResource, ResourceBacking, ResourceLifetime,
};
use crate::render_graph::transient_cache::TransientResourceCache;
use crate::rhi::{RenderResourceAccessState, RhiDevice};
use crate::engine_error;

/// Output of a successful compile
#[derive(Debug, Default)]
pub struct CompiledGraph {
    pub execute: Vec<CompiledNode>,
    pub present: Vec<CompiledNode>,
}

fn fail(message: String) -> Error {
    engine_error!("galaxy3d::RenderGraph", "Compilation failed: {}", message);
    Error::CompilationFailed(message)
}

/// Execution order: execute nodes then present nodes, each in declaration order
pub fn execution_order(nodes: &[RenderGraphNode], swapchain: Option<ResourceId>) -> (Vec<usize>, Vec<usize>) {
    let is_present = |node: &RenderGraphNode| {
        swapchain.is_some_and(|id| node.touches(id.index))
    };
    let execute = (0..nodes.len()).filter(|&i| !is_present(&nodes[i])).collect();
    let present = (0..nodes.len()).filter(|&i| is_present(&nodes[i])).collect();
    (execute, present)
}

pub fn compile_graph(
    nodes: &[RenderGraphNode],
    registry: &mut ResourceRegistry,
    cache: &mut TransientResourceCache,
    device: &mut dyn RhiDevice,
) -> Result<CompiledGraph> {
    for node in nodes {
        for access in &node.accesses {
            registry
                .validate(access.id)
                .map_err(|e| fail(format!("node '{}' references {}: {}", node.name, access.id, e)))?;
        }
    }

    let (execute_order, present_order) = execution_order(nodes, registry.swapchain_id());

    // Lifetimes over the full execution order
    let mut lifetimes: FxHashMap<u32, ResourceLifetime> = FxHashMap::default();
    for (time, &node_index) in execute_order.iter().chain(present_order.iter()).enumerate() {
        for access in &nodes[node_index].accesses {
            lifetimes.entry(access.id.index).or_default().touch(time);
        }
    }

    for index in registry.active_indices() {
        let lifetime = lifetimes.get(&index).copied().unwrap_or_default();
        resolve_slot(registry, cache, device, index, lifetime)?;
    }

    let mut compiled = CompiledGraph::default();
    for &node_index in &execute_order {
        compiled.execute.push(compile_node(nodes, node_index, registry)?);
    }
    for &node_index in &present_order {
        compiled.present.push(compile_node(nodes, node_index, registry)?);
    }
    Ok(compiled)
}

/// Attach a GPU object and starting state to an active slot
fn resolve_slot(
    registry: &mut ResourceRegistry,
    cache: &mut TransientResourceCache,
    device: &mut dyn RhiDevice,
    index: u32,
    lifetime: ResourceLifetime,
) -> Result<()> {
    let Some(slot) = registry.slot_mut(index) else {
        return Err(fail(format!("active slot {} vanished", index)));
    };
    let name = slot.resource.display_name().to_string();
    if !lifetime.is_valid() {
        return Err(fail(format!(
            "resource '{}' (slot {}) is not accessed by any node",
            name, index
        )));
    }

    let desc = slot.resource.desc;
    let (resource, current_access) = match &slot.resource.backing {
        ResourceBacking::Imported { resource, access } => (resource.clone(), *access),
        ResourceBacking::LazyCreate => match slot.persisted.take() {
            Some((resource, access)) => (Some(resource), access),
            None => match cache.acquire(&desc) {
                Some(resource) => (Some(resource), RenderResourceAccessState::UNDEFINED),
                None => {
                    let resource = BackendResource::create(device, &desc).map_err(|e| {
                        fail(format!("could not create {:?} for '{}': {}", desc.kind(), name, e))
                    })?;
                    (Some(resource), RenderResourceAccessState::UNDEFINED)
                }
            },
        },
    };

    slot.compiled = Some(CompiledResource {
        resource,
        initial_access: current_access,
        current_access,
        lifetime,
    });
    Ok(())
}

/// Walk a node's accesses against the tracked states
fn compile_node(
    nodes: &[RenderGraphNode],
    node_index: usize,
    registry: &mut ResourceRegistry,
) -> Result<CompiledNode> {
    let node = &nodes[node_index];
    let mut transitions = Vec::new();
    for access in &node.accesses {
        let Some(compiled) = registry.compiled_mut(access.id) else {
            return Err(fail(format!(
                "node '{}' accesses {} which was not resolved",
                node.name, access.id
            )));
        };
        assert!(
            compiled.lifetime.is_valid(),
            "accessed resource {} has no lifetime",
            access.id
        );
        if compiled.current_access.needs_transition_to(&access.state) {
            transitions.push(Transition {
                id: access.id,
                kind: access.kind,
                previous: compiled.current_access,
                next: access.state,
            });
        }
        compiled.current_access = access.state;
    }
    Ok(CompiledNode {
        node: node_index,
        transitions,
    })
}

#[cfg(test)]
#[path = "compiler_tests.rs"]
mod tests;
