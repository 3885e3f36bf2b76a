// src/provision/mod.rs
mod convergence;
mod load_balancer;
mod pool;

pub use convergence::ConvergenceWait;
pub use pool::find_pool;

use crate::config::{ControlPlaneConfig, ConvergenceConfig};
use crate::control_plane::ControlPlane;
use crate::metrics::MetricsCollector;
use std::sync::Arc;

/// Locates load balancers and pools, creating them on demand.
pub struct Provisioner {
    control_plane: Arc<dyn ControlPlane>,
    wait: ConvergenceWait,
    pool_method: String,
    pool_persistence: String,
    metrics: Option<Arc<MetricsCollector>>,
}

impl Provisioner {
    pub fn new(
        control_plane: Arc<dyn ControlPlane>,
        remote: &ControlPlaneConfig,
        convergence: ConvergenceConfig,
        metrics: Option<Arc<MetricsCollector>>,
    ) -> Self {
        Self {
            control_plane,
            wait: ConvergenceWait::new(convergence),
            pool_method: remote.pool_method.clone(),
            pool_persistence: remote.pool_persistence.clone(),
            metrics,
        }
    }
}
