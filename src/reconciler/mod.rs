// src/reconciler/mod.rs
//
// Entry points the host calls once per instance lifecycle event. Every call
// re-reads remote state; nothing is cached between calls.
//
mod locks;

pub use locks::{KeyGuard, KeyedLocks};

use crate::config::{Config, PolicyConfig};
use crate::control_plane::ControlPlane;
use crate::error::{Error, Result};
use crate::gc::{Collected, GarbageCollector};
use crate::membership::{Change, MembershipReconciler};
use crate::metrics::{MetricsCollector, Timer};
use crate::model::{Deregistration, LoadBalancer, Lookup, Node, Registration, ServiceInstance};
use crate::provision::Provisioner;
use crate::resolver::AddressResolver;
use std::sync::Arc;
use tracing::{debug, info, info_span, warn, Instrument};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpOutcome {
    /// Instance did not opt in.
    Skipped,
    Registered,
    AlreadyRegistered,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownOutcome {
    /// Nothing to deregister from.
    NoLoadBalancer,
    Deregistered { removed: usize, collected: Collected },
}

pub struct Reconciler {
    control_plane: Arc<dyn ControlPlane>,
    datacenter: String,
    policy: PolicyConfig,
    resolver: AddressResolver,
    provisioner: Provisioner,
    membership: MembershipReconciler,
    gc: GarbageCollector,
    locks: Option<KeyedLocks>,
    metrics: Option<Arc<MetricsCollector>>,
}

impl Reconciler {
    pub fn new(
        config: &Config,
        control_plane: Arc<dyn ControlPlane>,
        metrics: Option<Arc<MetricsCollector>>,
    ) -> Self {
        debug!(
            datacenter = %config.datacenter,
            username = config.control_plane.username.as_deref().unwrap_or("<unset>"),
            alias = config.control_plane.account_alias.as_deref().unwrap_or("<from login>"),
            password_set = config.control_plane.password.is_some(),
            serialize = config.reconciler.serialize_per_service,
            "Reconciler environment"
        );

        Self {
            resolver: AddressResolver::new(control_plane.clone(), config.directory.clone()),
            provisioner: Provisioner::new(
                control_plane.clone(),
                &config.control_plane,
                config.convergence.clone(),
                metrics.clone(),
            ),
            membership: MembershipReconciler::new(control_plane.clone(), metrics.clone()),
            gc: GarbageCollector::new(control_plane.clone(), metrics.clone()),
            locks: config
                .reconciler
                .serialize_per_service
                .then(KeyedLocks::new),
            control_plane,
            datacenter: config.datacenter.clone(),
            policy: config.policy.clone(),
            metrics,
        }
    }

    /// Connectivity check: fetch the configured datacenter.
    pub async fn probe(&self) -> Result<()> {
        let dc = self.control_plane.get_datacenter(&self.datacenter).await?;
        info!(datacenter = %dc.id, "Ping successful, data center details retrieved");
        Ok(())
    }

    pub async fn on_instance_up(&self, instance: &ServiceInstance) -> Result<UpOutcome> {
        let span = info_span!(
            "reconcile",
            id = %Uuid::new_v4(),
            event = "up",
            service = %instance.name
        );
        let timer = Timer::new();
        let result = self.register(instance).instrument(span).await;

        let outcome = match &result {
            Ok(UpOutcome::Skipped) => "skipped",
            Ok(UpOutcome::Registered) => "registered",
            Ok(UpOutcome::AlreadyRegistered) => "unchanged",
            Err(_) => "failed",
        };
        self.record("up", outcome, &timer);
        result
    }

    pub async fn on_instance_down(&self, instance: &ServiceInstance) -> Result<DownOutcome> {
        let span = info_span!(
            "reconcile",
            id = %Uuid::new_v4(),
            event = "down",
            service = %instance.name
        );
        let timer = Timer::new();
        let result = self.deregister(instance).instrument(span).await;

        let outcome = match &result {
            Ok(DownOutcome::NoLoadBalancer) => "no_load_balancer",
            Ok(DownOutcome::Deregistered { removed: 0, .. }) => "unchanged",
            Ok(DownOutcome::Deregistered { .. }) => "deregistered",
            Err(_) => "failed",
        };
        self.record("down", outcome, &timer);
        result
    }

    /// Periodic refresh from the host. Membership is already converged by
    /// up/down events, so there is nothing to do.
    pub async fn on_instance_refresh(&self, instance: &ServiceInstance) -> Result<()> {
        debug!(service = %instance.name, "Refresh requested, nothing to do");
        Ok(())
    }

    /// Reverse enumeration of managed instances is not supported.
    pub fn list_managed_instances(&self) -> Vec<ServiceInstance> {
        Vec::new()
    }

    async fn register(&self, instance: &ServiceInstance) -> Result<UpOutcome> {
        dump_instance(instance);

        if !instance.opted_in(&self.policy.opt_in_attribute) {
            info!(
                "Service {} not marked for load balancing ({}=true)",
                instance.name, self.policy.opt_in_attribute
            );
            return Ok(UpOutcome::Skipped);
        }

        let Registration {
            service,
            host_ip,
            pool_port,
            node_port,
        } = instance.registration(&self.policy.allowed_ports)?;
        let dc = self.datacenter.as_str();
        let _guard = self.lock(&service).await;

        let internal = match self.resolver.resolve(dc, host_ip).await? {
            Lookup::Found(internal) => internal,
            Lookup::NotFound => return Err(Error::UnresolvedAddress(host_ip)),
        };
        info!(%internal, public = %host_ip, "Found internal IP for docker host");

        let lb = self.provisioner.find_or_create_load_balancer(dc, &service).await?;
        let pool = self.provisioner.find_or_create_pool(dc, &lb, pool_port).await?;

        match self
            .membership
            .add(dc, &lb, &pool, Node::new(internal, node_port))
            .await?
        {
            Change::Applied => Ok(UpOutcome::Registered),
            Change::Unchanged => Ok(UpOutcome::AlreadyRegistered),
        }
    }

    async fn deregister(&self, instance: &ServiceInstance) -> Result<DownOutcome> {
        dump_instance(instance);

        let Deregistration {
            service,
            host_ip,
            node_port,
        } = instance.deregistration()?;
        let dc = self.datacenter.as_str();
        let _guard = self.lock(&service).await;

        let lb = match self.provisioner.find_load_balancer(dc, &service).await? {
            Lookup::Found(lb) => lb,
            Lookup::NotFound => {
                info!("No load balancer named {}, nothing to deregister", service);
                return Ok(DownOutcome::NoLoadBalancer);
            }
        };

        let removed = match self.resolver.resolve(dc, host_ip).await? {
            Lookup::Found(internal) => {
                self.remove_from_pools(dc, &lb, Node::new(internal, node_port))
                    .await?
            }
            Lookup::NotFound => {
                warn!(public = %host_ip, "No internal IP for docker host, no node to remove");
                0
            }
        };

        let collected = self.gc.collect(dc, &lb.id).await?;
        Ok(DownOutcome::Deregistered { removed, collected })
    }

    async fn remove_from_pools(&self, dc: &str, lb: &LoadBalancer, node: Node) -> Result<usize> {
        let mut removed = 0;
        for pool in &lb.pools {
            if self.membership.remove(dc, lb, pool, &node).await? == Change::Applied {
                removed += 1;
            }
        }
        Ok(removed)
    }

    async fn lock(&self, service: &str) -> Option<KeyGuard<'_>> {
        match &self.locks {
            Some(locks) => Some(locks.lock(&format!("{}/{}", self.datacenter, service)).await),
            None => None,
        }
    }

    fn record(&self, event: &str, outcome: &str, timer: &Timer) {
        if let Some(metrics) = &self.metrics {
            metrics.record_reconciliation(event, outcome, timer.elapsed());
        }
    }
}

fn dump_instance(instance: &ServiceInstance) {
    debug!(
        id = %instance.id,
        name = %instance.name,
        tags = ?instance.tags,
        attrs = ?instance.attrs,
        container_id = %instance.origin.container_id,
        container_name = %instance.origin.container_name,
        container_hostname = %instance.origin.container_hostname,
        host_ip = %instance.origin.host_ip,
        host_port = %instance.origin.host_port,
        exposed_ip = %instance.origin.exposed_ip,
        exposed_port = %instance.origin.exposed_port,
        port_type = %instance.origin.port_type,
        "Service instance"
    );
}
