//! # Leader Runtime
//!
//! TCP accept loop, housekeeping and graceful shutdown.
//!
//! ```text
//! accept ──→ spawn(serve_connection) ── one task per client
//! interval ──→ purge expired sessions and replay entries
//! shutdown (watch) ──→ stop accepting, close idle connections
//! ```

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use epoh_01_authentication::TcpTransport;
use epoh_02_ledger::{LedgerApi, LedgerStore, TimeSource};
use epoh_telemetry::{metric_set, ACTIVE_SESSIONS, CHAIN_LENGTH};
use tokio::net::TcpListener;
use tokio::sync::watch;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::container::NodeContainer;
use crate::handlers::serve_connection;

/// The running Leader.
pub struct LeaderRuntime<S: LedgerStore, C: TimeSource> {
    node: Arc<NodeContainer<S, C>>,
    shutdown_tx: watch::Sender<bool>,
    shutdown_rx: watch::Receiver<bool>,
}

impl<S, C> LeaderRuntime<S, C>
where
    S: LedgerStore + 'static,
    C: TimeSource + 'static,
{
    pub fn new(node: NodeContainer<S, C>) -> Self {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        Self {
            node: Arc::new(node),
            shutdown_tx,
            shutdown_rx,
        }
    }

    /// Shared handle to the subsystems.
    pub fn node(&self) -> Arc<NodeContainer<S, C>> {
        Arc::clone(&self.node)
    }

    /// Bind the configured listen address.
    pub async fn bind(&self) -> Result<TcpListener> {
        let addr = self.node.config.listen_addr;
        TcpListener::bind(addr)
            .await
            .with_context(|| format!("binding {addr}"))
    }

    /// Serve `listener` until [`shutdown`](Self::shutdown) is called.
    pub async fn run(&self, listener: TcpListener) -> Result<()> {
        let local: SocketAddr = listener.local_addr().context("reading listen address")?;
        metric_set!(CHAIN_LENGTH, self.node.engine.chain_len());
        info!(
            addr = %local,
            chain_len = self.node.engine.chain_len(),
            "leader listening"
        );

        let housekeeping = tokio::spawn(housekeeping(self.node(), self.shutdown_rx.clone()));
        let mut connections = JoinSet::new();
        let mut shutdown = self.shutdown_rx.clone();

        loop {
            tokio::select! {
                accepted = listener.accept() => {
                    let (stream, peer) = match accepted {
                        Ok(accepted) => accepted,
                        Err(e) => {
                            warn!(error = %e, "accept failed");
                            continue;
                        }
                    };
                    if let Err(e) = stream.set_nodelay(true) {
                        debug!(%peer, error = %e, "set_nodelay failed");
                    }
                    let node = self.node();
                    let conn_shutdown = self.shutdown_rx.clone();
                    connections.spawn(async move {
                        let mut transport = TcpTransport::new(stream);
                        serve_connection(&node, &mut transport, Uuid::new_v4(), conn_shutdown).await;
                    });
                }
                Some(finished) = connections.join_next(), if !connections.is_empty() => {
                    if let Err(e) = finished {
                        error!(error = %e, "connection task failed");
                    }
                }
                _ = shutdown.changed() => break,
            }
        }

        info!(open = connections.len(), "draining connections");
        while let Some(finished) = connections.join_next().await {
            if let Err(e) = finished {
                error!(error = %e, "connection task failed");
            }
        }
        if let Err(e) = housekeeping.await {
            error!(error = %e, "housekeeping task failed");
        }
        info!("leader stopped");
        Ok(())
    }

    /// Signal every task to stop.
    pub fn shutdown(&self) {
        if self.shutdown_tx.send(true).is_err() {
            debug!("no task was listening for shutdown");
        }
    }
}

async fn housekeeping<S, C>(node: Arc<NodeContainer<S, C>>, mut shutdown: watch::Receiver<bool>)
where
    S: LedgerStore + 'static,
    C: TimeSource + 'static,
{
    let mut ticker = tokio::time::interval(node.config.housekeeping_interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let sessions = node.engine.purge_expired_sessions();
                let nonces = node.authenticator.replay_guard().purge_expired();
                metric_set!(ACTIVE_SESSIONS, node.engine.active_sessions());
                if sessions + nonces > 0 {
                    debug!(sessions, nonces, "housekeeping purged entries");
                }
                if node.engine.is_halted() {
                    error!("ledger engine is halted; writes are refused until the Leader restarts");
                }
            }
            _ = shutdown.changed() => break,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use epoh_01_authentication::{ClientHandshake, TcpTransport, Transport};
    use shared_types::{ClientId, Frame};

    use crate::container::NodeConfig;
    use crate::test_utils::{deployment, memory_node, uav};

    #[tokio::test]
    async fn test_tcp_round_trip_and_shutdown() {
        let d = deployment();
        let (node, _store) = memory_node(&d, NodeConfig::default());
        let runtime = Arc::new(LeaderRuntime::new(node));
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = {
            let runtime = Arc::clone(&runtime);
            tokio::spawn(async move { runtime.run(listener).await })
        };

        let mut client = TcpTransport::connect(addr).await.unwrap();
        let session = uav(&d).authenticate(&mut client).await.unwrap();
        let payload = b"{\"status\":\"LANDING_FINAL\"}".to_vec();
        let mac = session.session_key.mac(&payload).to_vec();
        client
            .send(&Frame::Submit {
                client_id: ClientId::new("UAV_A1"),
                payload,
                mac,
            })
            .await
            .unwrap();
        let reply = client.recv().await.unwrap();
        assert!(matches!(reply, Frame::SubmitAck { index: 2, .. }), "{reply:?}");
        assert_eq!(runtime.node().engine.chain_len(), 3);

        runtime.shutdown();
        tokio::time::timeout(Duration::from_secs(5), server)
            .await
            .unwrap()
            .unwrap()
            .unwrap();
    }
}
