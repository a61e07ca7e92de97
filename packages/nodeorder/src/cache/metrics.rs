//! Prometheus metrics for the weighted list manager

use nodeorder_storage::{Result, StorageError};
use prometheus::{register_int_counter_with_registry, IntCounter, Opts, Registry};

/// Range cache and rebalancing counters
#[derive(Clone)]
pub struct ManagerMetrics {
    pub range_hits: IntCounter,
    pub range_misses: IntCounter,
    pub invalidations: IntCounter,
    pub top_run_shifts: IntCounter,
    pub compactions: IntCounter,
}

fn counter(registry: &Registry, name: &str, help: &str) -> Result<IntCounter> {
    register_int_counter_with_registry!(Opts::new(name, help), registry)
        .map_err(|e| StorageError::metrics(format!("cannot register {}: {}", name, e)).with_source(e))
}

impl ManagerMetrics {
    pub fn new(registry: &Registry) -> Result<Self> {
        Ok(Self {
            range_hits: counter(registry, "nodeorder_range_hits_total", "Range cache hits")?,
            range_misses: counter(
                registry,
                "nodeorder_range_misses_total",
                "Range cache misses",
            )?,
            invalidations: counter(
                registry,
                "nodeorder_range_invalidations_total",
                "Range cache invalidations",
            )?,
            top_run_shifts: counter(
                registry,
                "nodeorder_top_run_shifts_total",
                "Insertions that shifted the top run back into range",
            )?,
            compactions: counter(
                registry,
                "nodeorder_compactions_total",
                "Groups renumbered after a removal",
            )?,
        })
    }

    pub fn hit_rate(&self) -> f64 {
        let hits = self.range_hits.get() as f64;
        let total = hits + self.range_misses.get() as f64;
        if total > 0.0 {
            hits / total
        } else {
            0.0
        }
    }
}
