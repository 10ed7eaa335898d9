//! Telemetry configuration from environment variables.

use std::env;

/// Configuration for logging and metrics.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    /// Service name attached to every log line
    pub service_name: String,

    /// Log level filter (trace, debug, info, warn, error) or a full
    /// `EnvFilter` directive
    pub log_level: String,

    /// Whether to write logs to stdout at all
    pub console_output: bool,

    /// Whether to emit JSON instead of human-readable lines
    pub json_logs: bool,

    /// Prefix of every Prometheus metric name
    pub metrics_namespace: String,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            service_name: "provenance-chain".to_string(),
            log_level: "info".to_string(),
            console_output: true,
            json_logs: false,
            metrics_namespace: "pc".to_string(),
        }
    }
}

impl TelemetryConfig {
    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `PC_SERVICE_NAME`: Service name (default: provenance-chain)
    /// - `PC_LOG_LEVEL` or `RUST_LOG`: Log level (default: info)
    /// - `PC_CONSOLE_OUTPUT`: Enable console output (default: true)
    /// - `PC_JSON_LOGS`: Enable JSON logs (default: false, true in containers)
    pub fn from_env() -> Self {
        let is_container =
            env::var("KUBERNETES_SERVICE_HOST").is_ok() || env::var("DOCKER_CONTAINER").is_ok();

        Self {
            service_name: env::var("PC_SERVICE_NAME")
                .unwrap_or_else(|_| "provenance-chain".to_string()),

            log_level: env::var("PC_LOG_LEVEL")
                .or_else(|_| env::var("RUST_LOG"))
                .unwrap_or_else(|_| "info".to_string()),

            console_output: env::var("PC_CONSOLE_OUTPUT")
                .map(|v| v.to_lowercase() != "false" && v != "0")
                .unwrap_or(true),

            json_logs: env::var("PC_JSON_LOGS")
                .map(|v| v.to_lowercase() == "true" || v == "1")
                .unwrap_or(is_container),

            metrics_namespace: "pc".to_string(),
        }
    }

    /// Configuration for one contract, e.g. `pc-02-asset-provenance`.
    pub fn for_contract(contract_id: &str, contract_name: &str) -> Self {
        let mut config = Self::from_env();
        config.service_name = format!("pc-{}-{}", contract_id, contract_name);
        config
    }
}
