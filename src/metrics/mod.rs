// Private module declaration
mod server;

use prometheus::{
    HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts, Registry,
};

// Re-export for public API
pub use server::start_metrics_server;

// ============================================================================
// Metrics Module - Prometheus metrics for observability
// ============================================================================
//
// Provides metrics for:
// - Order placements (throughput, latency, failure kinds)
// - Stock conflicts caught by the conditional decrement
// - Read-only order lookups
//
// All metrics are registered with Prometheus and can be scraped via /metrics
// ============================================================================

/// Central metrics registry for the entire application
pub struct Metrics {
    registry: Registry,

    // Placement metrics
    pub orders_placed: IntCounter,
    pub orders_failed: IntCounterVec,
    pub placement_duration: HistogramVec,

    // Inventory metrics
    pub stock_conflicts: IntCounter,

    // Lookup metrics
    pub order_lookups: IntCounterVec,
}

impl Metrics {
    pub fn new() -> anyhow::Result<Self> {
        let registry = Registry::new();

        let orders_placed = IntCounter::new(
            "orders_placed_total",
            "Total orders successfully placed",
        )?;
        registry.register(Box::new(orders_placed.clone()))?;

        let orders_failed = IntCounterVec::new(
            Opts::new("orders_failed_total", "Total failed order placements"),
            &["kind"],
        )?;
        registry.register(Box::new(orders_failed.clone()))?;

        let placement_duration = HistogramVec::new(
            HistogramOpts::new(
                "order_placement_duration_seconds",
                "Order placement duration",
            )
            .buckets(vec![0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 5.0]),
            &["outcome"],
        )?;
        registry.register(Box::new(placement_duration.clone()))?;

        let stock_conflicts = IntCounter::new(
            "stock_conflicts_total",
            "Placements rejected because stock ran out",
        )?;
        registry.register(Box::new(stock_conflicts.clone()))?;

        let order_lookups = IntCounterVec::new(
            Opts::new("order_lookups_total", "Read-only order lookups"),
            &["endpoint", "found"],
        )?;
        registry.register(Box::new(order_lookups.clone()))?;

        Ok(Self {
            registry,
            orders_placed,
            orders_failed,
            placement_duration,
            stock_conflicts,
            order_lookups,
        })
    }

    /// Get the Prometheus registry for exposing metrics via HTTP
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Record one placement attempt. `failure_kind` is `None` on success.
    pub fn record_placement(&self, duration_secs: f64, failure_kind: Option<&str>) {
        match failure_kind {
            None => {
                self.orders_placed.inc();
                self.placement_duration
                    .with_label_values(&["success"])
                    .observe(duration_secs);
            }
            Some(kind) => {
                self.orders_failed.with_label_values(&[kind]).inc();
                self.placement_duration
                    .with_label_values(&["failure"])
                    .observe(duration_secs);
                if kind == "insufficient_stock" {
                    self.stock_conflicts.inc();
                }
            }
        }
    }

    /// Record a read-only lookup
    pub fn record_lookup(&self, endpoint: &str, found: bool) {
        self.order_lookups
            .with_label_values(&[endpoint, if found { "yes" } else { "no" }])
            .inc();
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new().expect("Failed to create metrics")
    }
}
