//! # Handshake Service
//!
//! The two state machines of the mutual challenge-response protocol. Neither
//! holds per-connection state between calls, so one instance serves any number
//! of concurrent handshakes; a stalled peer only blocks its own future.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use shared_crypto::{AuthScheme, PublicIdentity, SecretKeyBytes};
use shared_types::{ClientId, Frame, Nonce};
use tracing::{debug, info, warn};

use crate::domain::entities::{EstablishedSession, HandshakeConfig};
use crate::domain::errors::AuthError;
use crate::domain::keyring::Keyring;
use crate::domain::replay::{NonceCheck, ReplayGuard};
use crate::domain::transcript::{client_proof_message, derive_session_key, leader_proof_message};
use crate::ports::inbound::{ClientHandshake, LeaderHandshake};
use crate::ports::outbound::{SessionRegistrar, Transport};

/// Receive one frame or fail with `Timeout`.
async fn recv_within(transport: &mut dyn Transport, limit: Duration) -> Result<Frame, AuthError> {
    match tokio::time::timeout(limit, transport.recv()).await {
        Ok(frame) => Ok(frame?),
        Err(_) => Err(AuthError::Timeout),
    }
}

/// Tell the peer why; the error being reported matters more than this send.
async fn refuse(transport: &mut dyn Transport, err: &AuthError) {
    if matches!(err, AuthError::Transport(_) | AuthError::Rejected(_)) {
        return;
    }
    let frame = Frame::Rejected {
        reason: err.label().to_string(),
    };
    if let Err(send_err) = transport.send(&frame).await {
        debug!(peer = %transport.peer(), error = %send_err, "could not deliver refusal");
    }
}

// =============================================================================
// LEADER
// =============================================================================

/// Leader role: verifies registered clients and hands sessions to the engine.
pub struct LeaderAuthenticator<R: SessionRegistrar> {
    scheme: Arc<dyn AuthScheme>,
    keyring: Arc<Keyring>,
    leader_secret: SecretKeyBytes,
    replay: ReplayGuard,
    registrar: R,
    config: HandshakeConfig,
}

impl<R: SessionRegistrar> LeaderAuthenticator<R> {
    /// Create the Leader authenticator.
    pub fn new(
        scheme: Arc<dyn AuthScheme>,
        keyring: Arc<Keyring>,
        leader_secret: SecretKeyBytes,
        registrar: R,
        config: HandshakeConfig,
    ) -> Self {
        let replay = ReplayGuard::new(config.replay_window, config.max_nonces_per_client);
        Self {
            scheme,
            keyring,
            leader_secret,
            replay,
            registrar,
            config,
        }
    }

    /// Replay guard, for housekeeping.
    pub fn replay_guard(&self) -> &ReplayGuard {
        &self.replay
    }

    /// Keyring in use.
    pub fn keyring(&self) -> &Keyring {
        &self.keyring
    }

    async fn run(
        &self,
        transport: &mut dyn Transport,
        client_id: ClientId,
        client_nonce: Nonce,
    ) -> Result<EstablishedSession, AuthError> {
        let client_public = self
            .keyring
            .client_public(&client_id)
            .cloned()
            .ok_or_else(|| AuthError::UnknownClient(client_id.clone()))?;

        // Burn the nonce before any proof work so that even a failed attempt
        // cannot be replayed.
        match self.replay.check_and_insert(&client_id, &client_nonce) {
            NonceCheck::Fresh => {}
            NonceCheck::Replayed => return Err(AuthError::ReplayDetected(client_id)),
            NonceCheck::Saturated => return Err(AuthError::Busy(client_id)),
        }

        let leader_nonce = Nonce::generate();
        let proof = self.scheme.sign(
            &self.leader_secret,
            &leader_proof_message(&leader_nonce, &client_nonce, &client_id),
        )?;
        transport
            .send(&Frame::Challenge {
                leader_nonce,
                proof,
            })
            .await?;

        let client_proof = match recv_within(transport, self.config.round_trip_timeout).await? {
            Frame::Response { proof } => proof,
            Frame::Rejected { reason } => return Err(AuthError::Rejected(reason)),
            other => {
                return Err(AuthError::Protocol(format!(
                    "expected response, got {}",
                    other.kind()
                )))
            }
        };

        self.scheme
            .verify(
                &client_public,
                &client_proof_message(&client_nonce, &leader_nonce, &client_id),
                &client_proof,
            )
            .map_err(|_| AuthError::ClientUnverified(client_id.clone()))?;

        let shared = self
            .scheme
            .derive_shared_secret(&self.leader_secret, &client_public)?;
        let session_key = derive_session_key(&client_nonce, &leader_nonce, &shared);

        let expires_at_micros = self
            .registrar
            .register_session(&client_id, session_key.clone());
        transport
            .send(&Frame::Established { expires_at_micros })
            .await?;

        Ok(EstablishedSession {
            client_id,
            client_nonce,
            leader_nonce,
            session_key,
            expires_at_micros,
        })
    }
}

#[async_trait]
impl<R: SessionRegistrar> LeaderHandshake for LeaderAuthenticator<R> {
    async fn accept(
        &self,
        transport: &mut dyn Transport,
        client_id: ClientId,
        client_nonce: Nonce,
    ) -> Result<EstablishedSession, AuthError> {
        let peer = transport.peer();
        match self.run(transport, client_id.clone(), client_nonce).await {
            Ok(session) => {
                info!(%client_id, %peer, "client authenticated");
                Ok(session)
            }
            Err(err) => {
                warn!(%client_id, %peer, error = %err, "handshake refused");
                refuse(transport, &err).await;
                Err(err)
            }
        }
    }
}

// =============================================================================
// CLIENT
// =============================================================================

/// Client role: proves its identity and checks the Leader's.
pub struct ClientAuthenticator {
    scheme: Arc<dyn AuthScheme>,
    client_id: ClientId,
    client_secret: SecretKeyBytes,
    leader_public: PublicIdentity,
    config: HandshakeConfig,
}

impl ClientAuthenticator {
    /// Create the client authenticator.
    pub fn new(
        scheme: Arc<dyn AuthScheme>,
        client_id: ClientId,
        client_secret: SecretKeyBytes,
        leader_public: PublicIdentity,
        config: HandshakeConfig,
    ) -> Self {
        Self {
            scheme,
            client_id,
            client_secret,
            leader_public,
            config,
        }
    }

    /// Authenticating identity.
    pub fn client_id(&self) -> &ClientId {
        &self.client_id
    }

    /// Run the handshake with a caller-chosen nonce.
    pub async fn authenticate_with_nonce(
        &self,
        transport: &mut dyn Transport,
        client_nonce: Nonce,
    ) -> Result<EstablishedSession, AuthError> {
        match self.run(transport, client_nonce).await {
            Ok(session) => Ok(session),
            Err(err) => {
                refuse(transport, &err).await;
                Err(err)
            }
        }
    }

    async fn run(
        &self,
        transport: &mut dyn Transport,
        client_nonce: Nonce,
    ) -> Result<EstablishedSession, AuthError> {
        let limit = self.config.round_trip_timeout;
        transport
            .send(&Frame::Hello {
                client_id: self.client_id.clone(),
                client_nonce,
            })
            .await?;

        let (leader_nonce, leader_proof) = match recv_within(transport, limit).await? {
            Frame::Challenge {
                leader_nonce,
                proof,
            } => (leader_nonce, proof),
            Frame::Rejected { reason } => return Err(AuthError::Rejected(reason)),
            other => {
                return Err(AuthError::Protocol(format!(
                    "expected challenge, got {}",
                    other.kind()
                )))
            }
        };

        self.scheme
            .verify(
                &self.leader_public,
                &leader_proof_message(&leader_nonce, &client_nonce, &self.client_id),
                &leader_proof,
            )
            .map_err(|_| AuthError::LeaderUnverified)?;

        let proof = self.scheme.sign(
            &self.client_secret,
            &client_proof_message(&client_nonce, &leader_nonce, &self.client_id),
        )?;
        transport.send(&Frame::Response { proof }).await?;

        let expires_at_micros = match recv_within(transport, limit).await? {
            Frame::Established { expires_at_micros } => expires_at_micros,
            Frame::Rejected { reason } => return Err(AuthError::Rejected(reason)),
            other => {
                return Err(AuthError::Protocol(format!(
                    "expected established, got {}",
                    other.kind()
                )))
            }
        };

        let shared = self
            .scheme
            .derive_shared_secret(&self.client_secret, &self.leader_public)?;
        let session_key = derive_session_key(&client_nonce, &leader_nonce, &shared);
        debug!(client_id = %self.client_id, expires_at_micros, "session established");

        Ok(EstablishedSession {
            client_id: self.client_id.clone(),
            client_nonce,
            leader_nonce,
            session_key,
            expires_at_micros,
        })
    }
}

#[async_trait]
impl ClientHandshake for ClientAuthenticator {
    async fn authenticate(&self, transport: &mut dyn Transport) -> Result<EstablishedSession, AuthError> {
        self.authenticate_with_nonce(transport, Nonce::generate()).await
    }
}
