// src/provision/pool.rs
use super::Provisioner;
use crate::error::Result;
use crate::model::{LoadBalancer, Lookup, NewPool, Pool};
use tracing::info;

/// First pool bound to `port`. Ports are assumed unique per load balancer;
/// duplicates are not detected here.
pub fn find_pool(lb: &LoadBalancer, port: u16) -> Lookup<&Pool> {
    lb.pools.iter().find(|pool| pool.port == port).into()
}

impl Provisioner {
    /// Looks only at `lb.pools` as already fetched.
    pub async fn find_or_create_pool(&self, dc: &str, lb: &LoadBalancer, port: u16) -> Result<Pool> {
        if let Lookup::Found(pool) = find_pool(lb, port) {
            return Ok(pool.clone());
        }

        let request = NewPool {
            port,
            method: self.pool_method.clone(),
            persistence: self.pool_persistence.clone(),
        };
        let created = self.control_plane.create_pool(dc, &lb.id, &request).await?;
        info!(
            lb = %lb.name,
            pool = %created.id,
            port,
            "Created new pool"
        );
        if let Some(metrics) = &self.metrics {
            metrics.pools_created_total.inc();
        }

        Ok(created)
    }
}
