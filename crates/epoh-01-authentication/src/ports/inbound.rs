//! # Inbound Ports (Driving Ports / API)

use async_trait::async_trait;
use shared_types::{ClientId, Nonce};

use crate::domain::entities::EstablishedSession;
use crate::domain::errors::AuthError;
use crate::ports::outbound::Transport;

/// Leader side of the handshake.
///
/// The caller has already read the client's `Hello` off the transport and
/// hands over its contents; everything after that happens here.
#[async_trait]
pub trait LeaderHandshake: Send + Sync {
    /// Run round trips 1 (challenge) and 2 (response) for one client.
    ///
    /// On success the session has been registered and `Established` sent.
    /// On failure no session exists and a best-effort `Rejected` was sent.
    async fn accept(
        &self,
        transport: &mut dyn Transport,
        client_id: ClientId,
        client_nonce: Nonce,
    ) -> Result<EstablishedSession, AuthError>;
}

/// Client side of the handshake.
#[async_trait]
pub trait ClientHandshake: Send + Sync {
    /// Authenticate to the Leader and derive the session key.
    async fn authenticate(&self, transport: &mut dyn Transport) -> Result<EstablishedSession, AuthError>;
}
