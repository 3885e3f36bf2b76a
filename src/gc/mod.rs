// src/gc/mod.rs
use crate::control_plane::ControlPlane;
use crate::error::Result;
use crate::metrics::MetricsCollector;
use crate::model::LoadBalancer;
use std::sync::Arc;
use tracing::{debug, info};

/// What a collection pass deleted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Collected {
    Nothing,
    Pools(Vec<String>),
    LoadBalancer(String),
}

pub struct GarbageCollector {
    control_plane: Arc<dyn ControlPlane>,
    metrics: Option<Arc<MetricsCollector>>,
}

impl GarbageCollector {
    pub fn new(control_plane: Arc<dyn ControlPlane>, metrics: Option<Arc<MetricsCollector>>) -> Self {
        Self {
            control_plane,
            metrics,
        }
    }

    /// Re-reads the load balancer, then either deletes it outright (all
    /// pools empty) or deletes its empty pools. Never both.
    pub async fn collect(&self, dc: &str, lb_id: &str) -> Result<Collected> {
        let lb = self.control_plane.get_load_balancer(dc, lb_id).await?;

        if lb.all_pools_empty() {
            self.control_plane.delete_load_balancer(dc, &lb.id).await?;
            info!(lb = %lb.name, id = %lb.id, "Deleted load balancer as all pools are empty");
            if let Some(metrics) = &self.metrics {
                metrics.load_balancers_deleted_total.inc();
            }
            return Ok(Collected::LoadBalancer(lb.id));
        }

        self.delete_empty_pools(dc, &lb).await
    }

    async fn delete_empty_pools(&self, dc: &str, lb: &LoadBalancer) -> Result<Collected> {
        let mut deleted = Vec::new();
        for pool in lb.pools.iter().filter(|pool| pool.is_empty()) {
            self.control_plane.delete_pool(dc, &lb.id, &pool.id).await?;
            info!(pool = %pool.id, lb = %lb.name, "Deleted pool as it contained no nodes");
            if let Some(metrics) = &self.metrics {
                metrics.pools_deleted_total.inc();
            }
            deleted.push(pool.id.clone());
        }

        if deleted.is_empty() {
            debug!(lb = %lb.name, "No empty pools to collect");
            return Ok(Collected::Nothing);
        }
        Ok(Collected::Pools(deleted))
    }
}
