// src/provision/load_balancer.rs
use super::Provisioner;
use crate::error::Result;
use crate::model::{LoadBalancer, Lookup, NewLoadBalancer};
use chrono::Local;
use tracing::{debug, info};

impl Provisioner {
    /// First load balancer in `dc` whose name equals `name` exactly.
    pub async fn find_load_balancer(&self, dc: &str, name: &str) -> Result<Lookup<LoadBalancer>> {
        let balancers = self.control_plane.list_load_balancers(dc).await?;
        debug!(dc, count = balancers.len(), "Listed load balancers");

        Ok(balancers.into_iter().find(|lb| lb.name == name).into())
    }

    pub async fn find_or_create_load_balancer(&self, dc: &str, name: &str) -> Result<LoadBalancer> {
        if let Lookup::Found(lb) = self.find_load_balancer(dc, name).await? {
            return Ok(lb);
        }

        let request = NewLoadBalancer {
            name: name.to_string(),
            description: format!(
                "Created by registrator at {}",
                Local::now().format("%Y-%m-%d %H:%M:%S")
            ),
            status: "enabled".to_string(),
        };
        let created = self.control_plane.create_load_balancer(dc, &request).await?;
        info!(
            lb = %created.name,
            id = %created.id,
            ip = created.ip_address.as_deref().unwrap_or("pending"),
            "Created new load balancer"
        );
        if let Some(metrics) = &self.metrics {
            metrics.load_balancers_created_total.inc();
        }

        self.wait
            .until_visible(&created.id, || {
                self.control_plane.get_load_balancer(dc, &created.id)
            })
            .await
    }
}
