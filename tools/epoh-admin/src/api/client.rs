//! Request/response client for the Leader's line protocol.

use std::time::Duration;

use epoh_01_authentication::{
    AuthError, ClientAuthenticator, ClientHandshake, EstablishedSession, TcpTransport, Transport,
    TransportError,
};
use shared_types::{logout_message, AuthStatus, ClientId, Frame, Hash, HashChainBlock};
use thiserror::Error;

/// Upper bound on waiting for any single reply.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Errors that can occur when talking to the Leader.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Connection failed: {0}")]
    Transport(#[from] TransportError),
    #[error("Authentication failed: {0}")]
    Auth(#[from] AuthError),
    /// The Leader answered with an `Error` frame.
    #[error("Leader refused request ({kind}): {message}")]
    Leader { kind: String, message: String },
    #[error("Unexpected reply: {0}")]
    Unexpected(&'static str),
    #[error("No reply within {0:?}")]
    Timeout(Duration),
}

impl ApiError {
    /// Error kind reported by the Leader, if the Leader produced this error.
    pub fn leader_kind(&self) -> Option<&str> {
        match self {
            ApiError::Leader { kind, .. } => Some(kind),
            _ => None,
        }
    }
}

/// One connection to the Leader.
///
/// Requests are strictly sequential: each call sends one frame and waits for
/// exactly one reply.
pub struct LeaderClient {
    transport: Box<dyn Transport>,
    timeout: Duration,
}

impl LeaderClient {
    /// Connect over TCP.
    pub async fn connect(addr: &str) -> Result<Self, ApiError> {
        let transport = TcpTransport::connect(addr).await?;
        tracing::debug!(leader = addr, "connected");
        Ok(Self::new(transport))
    }

    /// Wrap an existing transport.
    pub fn new(transport: impl Transport + 'static) -> Self {
        Self {
            transport: Box::new(transport),
            timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    /// Override the reply timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Run the mutual handshake on this connection.
    pub async fn authenticate(
        &mut self,
        authenticator: &ClientAuthenticator,
    ) -> Result<EstablishedSession, ApiError> {
        let session = authenticator.authenticate(self.transport.as_mut()).await?;
        tracing::info!(
            client_id = %session.client_id,
            expires_at_micros = session.expires_at_micros,
            "session established"
        );
        Ok(session)
    }

    /// Submit one payload under `session`; returns the new block's index and hash.
    pub async fn submit(
        &mut self,
        session: &EstablishedSession,
        payload: Vec<u8>,
    ) -> Result<(u64, Hash), ApiError> {
        let mac = session.session_key.mac(&payload).to_vec();
        let request = Frame::Submit {
            client_id: session.client_id.clone(),
            payload,
            mac,
        };
        match self.call(&request).await? {
            Frame::SubmitAck { index, block_hash } => Ok((index, block_hash)),
            _ => Err(ApiError::Unexpected("expected submit_ack")),
        }
    }

    /// Newest `n` blocks, oldest first.
    pub async fn tail(&mut self, n: usize) -> Result<Vec<HashChainBlock>, ApiError> {
        match self.call(&Frame::Tail { n }).await? {
            Frame::TailResult { blocks } => Ok(blocks),
            _ => Err(ApiError::Unexpected("expected tail_result")),
        }
    }

    /// Session state of `client_id`.
    pub async fn auth_status(&mut self, client_id: &ClientId) -> Result<AuthStatus, ApiError> {
        let request = Frame::AuthStatusQuery {
            client_id: client_id.clone(),
        };
        match self.call(&request).await? {
            Frame::AuthStatusResult { status, .. } => Ok(status),
            _ => Err(ApiError::Unexpected("expected auth_status_result")),
        }
    }

    /// End `session` before it expires.
    pub async fn logout(&mut self, session: &EstablishedSession) -> Result<(), ApiError> {
        let mac = session
            .session_key
            .mac(&logout_message(&session.client_id))
            .to_vec();
        let request = Frame::Logout {
            client_id: session.client_id.clone(),
            mac,
        };
        match self.call(&request).await? {
            Frame::LoggedOut { .. } => Ok(()),
            _ => Err(ApiError::Unexpected("expected logged_out")),
        }
    }

    /// Prometheus text exposition of the Leader's metrics.
    pub async fn metrics(&mut self) -> Result<String, ApiError> {
        match self.call(&Frame::Metrics).await? {
            Frame::MetricsResult { text } => Ok(text),
            _ => Err(ApiError::Unexpected("expected metrics_result")),
        }
    }

    async fn call(&mut self, request: &Frame) -> Result<Frame, ApiError> {
        self.transport.send(request).await?;
        let reply = tokio::time::timeout(self.timeout, self.transport.recv())
            .await
            .map_err(|_| ApiError::Timeout(self.timeout))??;
        match reply {
            Frame::Error { kind, message } => Err(ApiError::Leader { kind, message }),
            other => Ok(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use epoh_01_authentication::MemoryTransport;
    use shared_types::BlockTimestamp;

    /// Answers each request with the next scripted reply.
    fn scripted_leader(replies: Vec<Frame>) -> (LeaderClient, tokio::task::JoinHandle<Vec<Frame>>) {
        let (client_end, mut leader_end) = MemoryTransport::pair();
        let handle = tokio::spawn(async move {
            let mut seen = Vec::new();
            for reply in replies {
                seen.push(leader_end.recv().await.unwrap());
                leader_end.send(&reply).await.unwrap();
            }
            seen
        });
        (LeaderClient::new(client_end), handle)
    }

    #[tokio::test]
    async fn test_tail_returns_blocks() {
        let block = HashChainBlock {
            index: 0,
            timestamp: BlockTimestamp {
                wall_micros: 1,
                monotonic_micros: 0,
            },
            client_id: ClientId::new("Leader_Node_1"),
            telemetry_payload: b"System Initialized".to_vec(),
            prev_hash: [0; 32],
            block_hash: [1; 32],
            mac_or_sig: shared_types::BlockSeal {
                signer: ClientId::new("Leader_Node_1"),
                signature: vec![1],
            },
        };
        let (mut client, leader) = scripted_leader(vec![Frame::TailResult {
            blocks: vec![block.clone()],
        }]);

        assert_eq!(client.tail(5).await.unwrap(), vec![block]);
        assert_eq!(leader.await.unwrap(), vec![Frame::Tail { n: 5 }]);
    }

    #[tokio::test]
    async fn test_error_frame_becomes_leader_error() {
        let (mut client, _leader) = scripted_leader(vec![Frame::Error {
            kind: "no_active_session".into(),
            message: "no active session for UAV_A1".into(),
        }]);

        let err = client
            .auth_status(&ClientId::new("UAV_A1"))
            .await
            .unwrap_err();
        assert_eq!(err.leader_kind(), Some("no_active_session"));
    }

    #[tokio::test]
    async fn test_mismatched_reply_is_unexpected() {
        let (mut client, _leader) = scripted_leader(vec![Frame::LoggedOut {
            client_id: ClientId::new("UAV_A1"),
        }]);

        assert!(matches!(
            client.metrics().await,
            Err(ApiError::Unexpected(_))
        ));
    }

    #[tokio::test]
    async fn test_silent_leader_times_out() {
        let (client_end, _leader_end) = MemoryTransport::pair();
        let mut client = LeaderClient::new(client_end).with_timeout(Duration::from_millis(20));

        assert!(matches!(client.tail(1).await, Err(ApiError::Timeout(_))));
    }
}
