// src/metrics/collector.rs
use anyhow::Result;
use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts, Registry, TextEncoder,
};
use std::sync::Arc;
use std::time::Instant;

pub struct MetricsRegistry {
    registry: Registry,
    collector: Arc<MetricsCollector>,
}

impl MetricsRegistry {
    pub fn new() -> Result<Self> {
        let registry = Registry::new();
        let collector = Arc::new(MetricsCollector::new(&registry)?);

        Ok(Self {
            registry,
            collector,
        })
    }

    pub fn collector(&self) -> Arc<MetricsCollector> {
        self.collector.clone()
    }

    pub fn gather(&self) -> Result<Vec<u8>> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        Ok(buffer)
    }
}

pub struct MetricsCollector {
    // Reconciliation metrics
    pub reconciliations_total: IntCounterVec,
    pub reconcile_duration_seconds: HistogramVec,

    // Remote mutation metrics
    pub load_balancers_created_total: IntCounter,
    pub load_balancers_deleted_total: IntCounter,
    pub pools_created_total: IntCounter,
    pub pools_deleted_total: IntCounter,
    pub node_updates_total: IntCounterVec,
}

impl MetricsCollector {
    pub fn new(registry: &Registry) -> Result<Self> {
        let reconciliations_total = IntCounterVec::new(
            Opts::new(
                "registrator_reconciliations_total",
                "Lifecycle events reconciled, by event and outcome",
            ),
            &["event", "outcome"],
        )?;
        registry.register(Box::new(reconciliations_total.clone()))?;

        let reconcile_duration_seconds = HistogramVec::new(
            HistogramOpts::new(
                "registrator_reconcile_duration_seconds",
                "Time spent reconciling one lifecycle event",
            ),
            &["event"],
        )?;
        registry.register(Box::new(reconcile_duration_seconds.clone()))?;

        let load_balancers_created_total = IntCounter::new(
            "registrator_load_balancers_created_total",
            "Load balancers provisioned",
        )?;
        registry.register(Box::new(load_balancers_created_total.clone()))?;

        let load_balancers_deleted_total = IntCounter::new(
            "registrator_load_balancers_deleted_total",
            "Load balancers deleted after their last pool emptied",
        )?;
        registry.register(Box::new(load_balancers_deleted_total.clone()))?;

        let pools_created_total =
            IntCounter::new("registrator_pools_created_total", "Pools provisioned")?;
        registry.register(Box::new(pools_created_total.clone()))?;

        let pools_deleted_total =
            IntCounter::new("registrator_pools_deleted_total", "Empty pools deleted")?;
        registry.register(Box::new(pools_deleted_total.clone()))?;

        let node_updates_total = IntCounterVec::new(
            Opts::new(
                "registrator_node_updates_total",
                "Pool node list replacements, by change",
            ),
            &["change"],
        )?;
        registry.register(Box::new(node_updates_total.clone()))?;

        Ok(Self {
            reconciliations_total,
            reconcile_duration_seconds,
            load_balancers_created_total,
            load_balancers_deleted_total,
            pools_created_total,
            pools_deleted_total,
            node_updates_total,
        })
    }

    pub fn record_reconciliation(&self, event: &str, outcome: &str, duration: std::time::Duration) {
        self.reconciliations_total
            .with_label_values(&[event, outcome])
            .inc();

        self.reconcile_duration_seconds
            .with_label_values(&[event])
            .observe(duration.as_secs_f64());
    }

    pub fn record_node_update(&self, change: &str) {
        self.node_updates_total.with_label_values(&[change]).inc();
    }
}

// Helper for timing operations
pub struct Timer {
    start: Instant,
}

impl Timer {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    pub fn elapsed(&self) -> std::time::Duration {
        self.start.elapsed()
    }
}

impl Default for Timer {
    fn default() -> Self {
        Self::new()
    }
}
