//! # EPOH Leader
//!
//! ## Startup Sequence
//!
//! 1. Initialize logging
//! 2. Load and validate `NodeConfig` from the environment
//! 3. Load keyring and Leader key, select the scheme the keyring names
//! 4. Open the ledger file (recovering a torn trailing record) and the engine
//!    (minting genesis into an empty ledger)
//! 5. Serve TCP until Ctrl-C

use std::sync::Arc;

use anyhow::{Context, Result};
use epoh_telemetry::{gather_metrics, init_tracing, register_metrics, TelemetryConfig};
use node_runtime::{LeaderContainer, LeaderRuntime, NodeConfig};
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    let telemetry = TelemetryConfig::from_env().with_service_name("epoh-leader");
    init_tracing(&telemetry).context("initializing logging")?;
    register_metrics().context("registering metrics")?;

    let config = NodeConfig::from_env().context("reading configuration")?;
    config.validate().context("validating configuration")?;
    info!(
        node_id = %config.node_id,
        listen = %config.listen_addr,
        ledger = %config.ledger_path.display(),
        audit_sessions = config.audit_sessions,
        "starting EPOH leader"
    );

    let node = LeaderContainer::open(config)?;
    let runtime = Arc::new(LeaderRuntime::new(node));
    let listener = runtime.bind().await?;

    let server = {
        let runtime = Arc::clone(&runtime);
        tokio::spawn(async move { runtime.run(listener).await })
    };

    tokio::signal::ctrl_c()
        .await
        .context("waiting for Ctrl-C")?;
    info!("shutdown requested");
    runtime.shutdown();

    match server.await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => error!(error = %e, "server stopped with an error"),
        Err(e) => error!(error = %e, "server task failed"),
    }

    match gather_metrics() {
        Ok(snapshot) => info!(metrics = %snapshot, "final metrics snapshot"),
        Err(e) => warn!(error = %e, "could not render metrics"),
    }
    Ok(())
}
