//! Prometheus metrics for the Provenance-Chain contracts.
//!
//! All metrics follow the naming convention: `pc_<contract>_<metric>_<unit>`

use lazy_static::lazy_static;
use prometheus::{
    exponential_buckets, Counter, CounterVec, Encoder, Histogram, HistogramOpts, HistogramVec,
    Opts, Registry, TextEncoder,
};

use crate::TelemetryError;

lazy_static! {
    /// Global metrics registry
    pub static ref REGISTRY: Registry = Registry::new();

    // =========================================================================
    // SHARED
    // =========================================================================

    /// Entry point invocations by contract, operation and outcome
    pub static ref OPERATIONS: CounterVec = CounterVec::new(
        Opts::new("pc_operations_total", "Contract operations by outcome"),
        &["contract", "operation", "outcome"]  // outcome: ok/flagged/error
    ).expect("metric creation failed");

    /// Entry point latency
    pub static ref OPERATION_DURATION: HistogramVec = HistogramVec::new(
        HistogramOpts::new(
            "pc_operation_duration_seconds",
            "Time spent executing one contract operation"
        ).buckets(exponential_buckets(0.00001, 2.0, 16).expect("bucket layout")),
        &["operation"]
    ).expect("metric creation failed");

    // =========================================================================
    // ASSET PROVENANCE (pc-02)
    // =========================================================================

    /// Audit flags raised, by reason
    pub static ref FLAGS_RAISED: CounterVec = CounterVec::new(
        Opts::new("pc_provenance_flags_raised_total", "Policy violations recorded as flags"),
        &["reason"]
    ).expect("metric creation failed");

    /// Shipments published
    pub static ref SHIPMENTS_CREATED: Counter = Counter::new(
        "pc_provenance_shipments_created_total",
        "Shipments published to the shared collection"
    ).expect("metric creation failed");

    /// Shipments claimed after a matching commitment
    pub static ref SHIPMENTS_CLAIMED: Counter = Counter::new(
        "pc_provenance_shipments_claimed_total",
        "Shipments claimed by a buyer"
    ).expect("metric creation failed");

    /// Deletion queue entries processed by drains
    pub static ref DELETION_QUEUE_DRAINED: Counter = Counter::new(
        "pc_provenance_deletion_queue_drained_total",
        "Shipment ids removed from the deletion queue"
    ).expect("metric creation failed");

    // =========================================================================
    // EMISSIONS AUDIT (pc-03)
    // =========================================================================

    /// Emissions submissions by audit outcome
    pub static ref AUDITS: CounterVec = CounterVec::new(
        Opts::new("pc_emissions_audits_total", "Emissions submissions by outcome"),
        &["outcome"]  // outcome: unchecked/accepted/rejected/error
    ).expect("metric creation failed");
}

/// Register all metrics with the global registry.
pub fn register_metrics() -> Result<(), TelemetryError> {
    let metrics: Vec<Box<dyn prometheus::core::Collector>> = vec![
        Box::new(OPERATIONS.clone()),
        Box::new(OPERATION_DURATION.clone()),
        Box::new(FLAGS_RAISED.clone()),
        Box::new(SHIPMENTS_CREATED.clone()),
        Box::new(SHIPMENTS_CLAIMED.clone()),
        Box::new(DELETION_QUEUE_DRAINED.clone()),
        Box::new(AUDITS.clone()),
    ];

    for metric in metrics {
        REGISTRY
            .register(metric)
            .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    }
    Ok(())
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> Result<String, TelemetryError> {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    String::from_utf8(buffer).map_err(|e| TelemetryError::MetricsInit(e.to_string()))
}

/// Timer guard for automatic histogram observation.
pub struct HistogramTimer {
    histogram: Histogram,
    start: std::time::Instant,
}

impl HistogramTimer {
    /// Start a new timer for the given histogram.
    pub fn new(histogram: &Histogram) -> Self {
        Self {
            histogram: histogram.clone(),
            start: std::time::Instant::now(),
        }
    }
}

impl Drop for HistogramTimer {
    fn drop(&mut self) {
        let duration = self.start.elapsed().as_secs_f64();
        self.histogram.observe(duration);
    }
}

/// Start timing for a histogram. Observation happens on drop.
#[macro_export]
macro_rules! time_histogram {
    ($histogram:expr) => {
        $crate::HistogramTimer::new(&$histogram)
    };
}
