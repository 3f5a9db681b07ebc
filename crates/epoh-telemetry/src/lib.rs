//! # EPOH Telemetry
//!
//! Process-wide observability for the Leader, the verifier and the operator
//! tool: a `tracing-subscriber` pipeline (human readable or JSON) and a
//! Prometheus registry with the ledger's counters.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use epoh_telemetry::{init_tracing, TelemetryConfig};
//!
//! let config = TelemetryConfig::from_env().with_service_name("epoh-leader");
//! init_tracing(&config)?;
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `EPOH_LOG_LEVEL` | `info` | Log filter, falls back to `RUST_LOG` |
//! | `EPOH_JSON_LOGS` | `false` (`true` in containers) | JSON log lines |
//! | `EPOH_SERVICE_NAME` | `uav-epoh` | Service name attached to startup logs |

mod config;
mod metrics;
mod tracing_setup;

pub use config::TelemetryConfig;
pub use metrics::{
    gather_metrics, register_metrics, ACTIVE_SESSIONS, BLOCKS_MINTED, CHAIN_LENGTH,
    HANDSHAKES, PERSISTENCE_FAILURES, REGISTRY, SUBMISSIONS, SUBMIT_DURATION,
};
pub use tracing_setup::init_tracing;

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("failed to initialize tracing subscriber: {0}")]
    TracingInit(String),

    #[error("failed to register metric: {0}")]
    MetricsInit(String),

    #[error("failed to encode metrics: {0}")]
    Encode(String),
}

/// Increment a counter, optionally by label values.
#[macro_export]
macro_rules! metric_inc {
    ($metric:expr) => {
        $metric.inc()
    };
    ($metric:expr, $labels:expr) => {
        $metric.with_label_values($labels).inc()
    };
}

/// Set a gauge to a value.
#[macro_export]
macro_rules! metric_set {
    ($metric:expr, $value:expr) => {
        $metric.set($value as f64)
    };
}
