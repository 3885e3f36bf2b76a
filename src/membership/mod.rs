// src/membership/mod.rs
//
// Pool membership is always written back as the complete node list; there
// is no per-node primitive.
//
use crate::control_plane::ControlPlane;
use crate::error::Result;
use crate::metrics::MetricsCollector;
use crate::model::{LoadBalancer, Lookup, Node, Pool};
use std::sync::Arc;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Change {
    Applied,
    Unchanged,
}

/// Position of the first node equal to `node`.
pub fn find_node(nodes: &[Node], node: &Node) -> Lookup<usize> {
    nodes.iter().position(|n| n == node).into()
}

/// The list with `node` appended, or `None` if it is already a member.
pub fn with_node_added(nodes: &[Node], node: Node) -> Option<Vec<Node>> {
    match find_node(nodes, &node) {
        Lookup::Found(_) => None,
        Lookup::NotFound => {
            let mut updated = Vec::with_capacity(nodes.len() + 1);
            updated.extend_from_slice(nodes);
            updated.push(node);
            Some(updated)
        }
    }
}

/// The list without the first entry equal to `node`, or `None` if there is
/// no such entry.
pub fn with_node_removed(nodes: &[Node], node: &Node) -> Option<Vec<Node>> {
    match find_node(nodes, node) {
        Lookup::Found(index) => {
            let mut updated = nodes.to_vec();
            updated.remove(index);
            Some(updated)
        }
        Lookup::NotFound => None,
    }
}

pub struct MembershipReconciler {
    control_plane: Arc<dyn ControlPlane>,
    metrics: Option<Arc<MetricsCollector>>,
}

impl MembershipReconciler {
    pub fn new(control_plane: Arc<dyn ControlPlane>, metrics: Option<Arc<MetricsCollector>>) -> Self {
        Self {
            control_plane,
            metrics,
        }
    }

    pub async fn add(&self, dc: &str, lb: &LoadBalancer, pool: &Pool, node: Node) -> Result<Change> {
        let Some(nodes) = with_node_added(&pool.nodes, node.clone()) else {
            info!(
                %node,
                lb = %lb.name,
                "A node with this IP address and port already exists in the load balancer"
            );
            return Ok(Change::Unchanged);
        };

        debug!(pool = %pool.id, count = nodes.len(), "Updating pool nodes");
        self.control_plane
            .update_nodes(dc, &lb.id, &pool.id, &nodes)
            .await?;
        info!(%node, pool = %pool.id, "Added node to pool");
        if let Some(metrics) = &self.metrics {
            metrics.record_node_update("added");
        }
        Ok(Change::Applied)
    }

    pub async fn remove(&self, dc: &str, lb: &LoadBalancer, pool: &Pool, node: &Node) -> Result<Change> {
        let Some(nodes) = with_node_removed(&pool.nodes, node) else {
            debug!(%node, pool = %pool.id, "Node not in pool, nothing to remove");
            return Ok(Change::Unchanged);
        };

        self.control_plane
            .update_nodes(dc, &lb.id, &pool.id, &nodes)
            .await?;
        info!(%node, pool = %pool.id, "Removed node from pool");
        if let Some(metrics) = &self.metrics {
            metrics.record_node_update("removed");
        }
        Ok(Change::Applied)
    }
}
