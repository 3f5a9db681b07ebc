//! Prometheus metrics for the EPOH Leader.
//!
//! Naming convention: `epoh_<area>_<metric>_<unit>`.

use lazy_static::lazy_static;
use prometheus::{
    exponential_buckets, Counter, CounterVec, Encoder, Gauge, Histogram, HistogramOpts, Opts,
    Registry, TextEncoder,
};

use crate::TelemetryError;

lazy_static! {
    /// Process-wide metrics registry
    pub static ref REGISTRY: Registry = Registry::new();

    /// Handshakes by outcome (`established` or an `AuthError` label)
    pub static ref HANDSHAKES: CounterVec = CounterVec::new(
        Opts::new("epoh_auth_handshakes_total", "Mutual authentication attempts by outcome"),
        &["outcome"]
    ).expect("metric creation failed");

    /// Telemetry submissions by outcome (`minted` or a `LedgerError` label)
    pub static ref SUBMISSIONS: CounterVec = CounterVec::new(
        Opts::new("epoh_ledger_submissions_total", "Telemetry submissions by outcome"),
        &["outcome"]
    ).expect("metric creation failed");

    /// Blocks appended to the chain, audit blocks included
    pub static ref BLOCKS_MINTED: Counter = Counter::new(
        "epoh_ledger_blocks_minted_total",
        "Blocks durably appended to the chain"
    ).expect("metric creation failed");

    /// Current chain length
    pub static ref CHAIN_LENGTH: Gauge = Gauge::new(
        "epoh_ledger_chain_length",
        "Number of blocks in the published chain"
    ).expect("metric creation failed");

    /// Fatal persistence failures (engine halts on each)
    pub static ref PERSISTENCE_FAILURES: Counter = Counter::new(
        "epoh_ledger_persistence_failures_total",
        "Appends that failed and halted the engine"
    ).expect("metric creation failed");

    /// Sessions currently live
    pub static ref ACTIVE_SESSIONS: Gauge = Gauge::new(
        "epoh_auth_active_sessions",
        "Sessions registered and not yet expired or logged out"
    ).expect("metric creation failed");

    /// Submit round trip inside the Leader, MAC check through durable append
    pub static ref SUBMIT_DURATION: Histogram = Histogram::with_opts(
        HistogramOpts::new(
            "epoh_ledger_submit_duration_seconds",
            "Time from Submit frame to acknowledgment"
        ).buckets(exponential_buckets(0.0001, 2.0, 14).expect("valid bucket layout"))
    ).expect("metric creation failed");
}

/// Register every EPOH metric with [`REGISTRY`].
///
/// Safe to call more than once; metrics already registered are skipped.
pub fn register_metrics() -> Result<(), TelemetryError> {
    let metrics: Vec<Box<dyn prometheus::core::Collector>> = vec![
        Box::new(HANDSHAKES.clone()),
        Box::new(SUBMISSIONS.clone()),
        Box::new(BLOCKS_MINTED.clone()),
        Box::new(CHAIN_LENGTH.clone()),
        Box::new(PERSISTENCE_FAILURES.clone()),
        Box::new(ACTIVE_SESSIONS.clone()),
        Box::new(SUBMIT_DURATION.clone()),
    ];

    for metric in metrics {
        match REGISTRY.register(metric) {
            Ok(()) | Err(prometheus::Error::AlreadyReg) => {}
            Err(e) => return Err(TelemetryError::MetricsInit(e.to_string())),
        }
    }
    Ok(())
}

/// Render the registry in the Prometheus text exposition format.
pub fn gather_metrics() -> Result<String, TelemetryError> {
    register_metrics()?;
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| TelemetryError::Encode(e.to_string()))?;
    String::from_utf8(buffer).map_err(|e| TelemetryError::Encode(e.to_string()))
}
