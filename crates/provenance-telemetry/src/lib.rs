//! # Provenance Telemetry
//!
//! Observability for the Provenance-Chain contracts.
//!
//! ## Components
//!
//! - **Logging**: `tracing` subscriber with env-driven filtering, JSON or
//!   human-readable output
//! - **Metrics**: Prometheus counters and histograms in a crate-local registry
//!
//! ## Usage
//!
//! ```rust,ignore
//! use provenance_telemetry::{init_telemetry, TelemetryConfig};
//!
//! let config = TelemetryConfig::from_env();
//! init_telemetry(&config)?;
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `PC_SERVICE_NAME` | `provenance-chain` | Service name in logs |
//! | `PC_LOG_LEVEL` / `RUST_LOG` | `info` | Log level filter |
//! | `PC_CONSOLE_OUTPUT` | `true` | Write logs to stdout |
//! | `PC_JSON_LOGS` | `false` | JSON log lines |

mod config;
mod logging;
mod metrics;

pub use config::TelemetryConfig;
pub use logging::init_logging;
pub use metrics::{
    encode_metrics, register_metrics, HistogramTimer, AUDITS, DELETION_QUEUE_DRAINED,
    FLAGS_RAISED, OPERATIONS, OPERATION_DURATION, REGISTRY, SHIPMENTS_CLAIMED,
    SHIPMENTS_CREATED,
};

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("Global subscriber already installed: {0}")]
    AlreadyInitialized(String),

    #[error("Failed to initialize Prometheus metrics: {0}")]
    MetricsInit(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Initialise logging and register metrics.
pub fn init_telemetry(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    register_metrics()?;
    init_logging(config)
}

/// Convenience macro for recording a metric increment.
#[macro_export]
macro_rules! metric_inc {
    ($metric:expr) => {
        $metric.inc()
    };
    ($metric:expr, $labels:expr) => {
        $metric.with_label_values($labels).inc()
    };
}

/// Convenience macro for adding to a counter.
#[macro_export]
macro_rules! metric_add {
    ($metric:expr, $value:expr) => {
        $metric.inc_by($value)
    };
    ($metric:expr, $labels:expr, $value:expr) => {
        $metric.with_label_values($labels).inc_by($value)
    };
}
