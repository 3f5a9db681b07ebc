use epoh_01_authentication::{LeaderHandshake, Transport, TransportError};
use epoh_02_ledger::{LedgerApi, LedgerError, LedgerStore, SessionEvent, TimeSource};
use epoh_telemetry::{
    metric_inc, metric_set, ACTIVE_SESSIONS, BLOCKS_MINTED, CHAIN_LENGTH, HANDSHAKES,
    PERSISTENCE_FAILURES,
};
use shared_types::{ClientId, Frame, Nonce};
use tokio::sync::watch;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::container::NodeContainer;

/// Serve one client connection until it closes or shutdown is signalled.
///
/// A `Hello` runs the handshake on this connection; every other frame gets
/// exactly one reply. Handshakes are not interrupted by shutdown, they are
/// bounded by the round-trip timeout.
pub async fn serve_connection<S, C>(
    node: &NodeContainer<S, C>,
    transport: &mut dyn Transport,
    conn_id: Uuid,
    mut shutdown: watch::Receiver<bool>,
) where
    S: LedgerStore + 'static,
    C: TimeSource + 'static,
{
    let peer = transport.peer();
    debug!(%conn_id, %peer, "connection opened");

    loop {
        let received = tokio::select! {
            received = transport.recv() => received,
            _ = shutdown.changed() => {
                debug!(%conn_id, "closing connection for shutdown");
                break;
            }
        };

        let frame = match received {
            Ok(frame) => frame,
            Err(TransportError::Closed) => break,
            Err(TransportError::Frame(reason)) => {
                warn!(%conn_id, %peer, %reason, "unreadable frame, closing connection");
                let reply = Frame::Error {
                    kind: "bad_frame".to_string(),
                    message: reason,
                };
                if let Err(send_err) = transport.send(&reply).await {
                    debug!(%conn_id, %peer, error = %send_err, "could not deliver bad_frame reply");
                }
                break;
            }
            Err(err) => {
                warn!(%conn_id, %peer, error = %err, "connection failed");
                break;
            }
        };

        match frame {
            Frame::Hello {
                client_id,
                client_nonce,
            } => node.handshake(transport, client_id, client_nonce).await,
            request => {
                let kind = request.kind();
                let reply = node.handle_request(request).await;
                if let Err(err) = send_reply(transport, &reply).await {
                    warn!(%conn_id, request = kind, error = %err, "reply not delivered");
                    break;
                }
            }
        }
    }

    debug!(%conn_id, %peer, "connection closed");
}

/// Send `reply`, substituting an error frame if it cannot be encoded.
async fn send_reply(transport: &mut dyn Transport, reply: &Frame) -> Result<(), TransportError> {
    match transport.send(reply).await {
        Err(TransportError::Frame(reason)) => {
            transport
                .send(&Frame::Error {
                    kind: "reply_too_large".to_string(),
                    message: reason,
                })
                .await
        }
        other => other,
    }
}

impl<S, C> NodeContainer<S, C>
where
    S: LedgerStore + 'static,
    C: TimeSource + 'static,
{
    /// Run the Leader side of the handshake and, on success, the audit block.
    pub async fn handshake(&self, transport: &mut dyn Transport, client_id: ClientId, nonce: Nonce) {
        let session = match self.authenticator.accept(transport, client_id, nonce).await {
            Ok(session) => session,
            Err(err) => {
                metric_inc!(HANDSHAKES, &[err.label()]);
                return;
            }
        };
        metric_inc!(HANDSHAKES, &["established"]);
        metric_set!(ACTIVE_SESSIONS, self.engine.active_sessions());

        if !self.config.audit_sessions {
            return;
        }
        let event = SessionEvent::established(session.client_id.clone(), session.expires_at_micros);
        match self.engine.record_session_event(&event).await {
            Ok(block) => {
                metric_inc!(BLOCKS_MINTED);
                metric_set!(CHAIN_LENGTH, self.engine.chain_len());
                info!(client_id = %session.client_id, index = block.index, "session audit block minted");
            }
            Err(err) => {
                if matches!(err, LedgerError::PersistenceFailure(_)) {
                    metric_inc!(PERSISTENCE_FAILURES);
                }
                error!(client_id = %session.client_id, error = %err, "session audit block not recorded");
            }
        }
    }
}
