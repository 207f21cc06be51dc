//! Orchestrator node name -> compute node resolution

use crate::error::{CloudError, Result};
use crate::model::ComputeNode;
use crate::service::VolumeService;

/// Find the compute node backing an orchestrator node name
///
/// Node names normally equal the provider's node name. When hostnames and
/// provider naming diverge, the name is matched against each node's private
/// and then public address, but only after the whole fleet was scanned by
/// name.
pub async fn resolve_node(service: &dyn VolumeService, node_name: &str) -> Result<ComputeNode> {
    let nodes = service.list_compute_nodes().await?;
    tracing::debug!(
        "Resolving node {} among {} compute nodes",
        node_name,
        nodes.len()
    );
    find_node(nodes, node_name).ok_or_else(|| CloudError::NodeNotFound(node_name.to_string()))
}

fn find_node(nodes: Vec<ComputeNode>, node_name: &str) -> Option<ComputeNode> {
    if let Some(idx) = nodes.iter().position(|n| n.name == node_name) {
        return nodes.into_iter().nth(idx);
    }

    let node = nodes.into_iter().find(|n| n.has_address(node_name));
    if let Some(ref n) = node {
        tracing::info!(
            "Node {} matched compute node {} ({}) by address",
            node_name,
            n.name,
            n.id
        );
    }
    node
}
