//! # Shared Fixtures
//!
//! A small secp256k1 deployment (one Leader, two UAVs) plus helpers to run
//! handshakes over in-memory transports and open engines on any store.

use std::sync::Arc;
use std::time::Duration;

use epoh_01_authentication::{
    AuthError, ClientAuthenticator, EstablishedSession, HandshakeConfig, Keyring, KeyringEntry,
    LeaderAuthenticator, LeaderHandshake, MemoryTransport, SessionRegistrar, Transport,
};
use epoh_02_ledger::{BlockSealer, LedgerConfig, LedgerEngine, LedgerStore, ManualClock, TimeSource};
use epoh_03_chain_verifier::ChainVerifier;
use shared_crypto::{scheme_for, AuthScheme, SchemeKind, SecretKeyBytes};
use shared_types::{ClientId, Frame, Nonce};

/// 2023-11-14T22:13:20Z in µs.
pub const T0: u64 = 1_700_000_000_000_000;

pub const LEADER: &str = "Leader_Node_1";
pub const UAV_A: &str = "UAV_A1";
pub const UAV_B: &str = "UAV_B2";

/// Key material of one test deployment.
pub struct Deployment {
    pub scheme: Arc<dyn AuthScheme>,
    pub keyring: Arc<Keyring>,
    pub leader_secret: SecretKeyBytes,
    pub uav_a_secret: SecretKeyBytes,
    pub uav_b_secret: SecretKeyBytes,
}

impl Deployment {
    pub fn new() -> Self {
        let scheme = scheme_for(SchemeKind::Secp256k1);
        let leader = scheme.generate();
        let uav_a = scheme.generate();
        let uav_b = scheme.generate();

        let mut keyring = Keyring::new(
            SchemeKind::Secp256k1,
            KeyringEntry {
                id: ClientId::new(LEADER),
                public_key: leader.public,
            },
        );
        keyring
            .add_client(ClientId::new(UAV_A), uav_a.public)
            .expect("fresh keyring");
        keyring
            .add_client(ClientId::new(UAV_B), uav_b.public)
            .expect("fresh keyring");

        Self {
            scheme,
            keyring: Arc::new(keyring),
            leader_secret: leader.secret,
            uav_a_secret: uav_a.secret,
            uav_b_secret: uav_b.secret,
        }
    }

    pub fn sealer(&self) -> BlockSealer {
        BlockSealer::new(
            self.scheme.clone(),
            ClientId::new(LEADER),
            self.leader_secret.clone(),
        )
    }

    pub fn ledger_config(&self, session_ttl: Duration) -> LedgerConfig {
        let mut config = LedgerConfig::new(ClientId::new(LEADER));
        config.session_ttl = session_ttl;
        config
    }

    /// Engine with a one-hour session lifetime.
    pub fn engine<S: LedgerStore, C: TimeSource>(&self, store: S, clock: C) -> LedgerEngine<S, C> {
        LedgerEngine::open(
            self.ledger_config(Duration::from_secs(3600)),
            store,
            clock,
            self.sealer(),
        )
        .expect("engine opens")
    }

    pub fn leader<R: SessionRegistrar>(
        &self,
        registrar: R,
        config: HandshakeConfig,
    ) -> LeaderAuthenticator<R> {
        LeaderAuthenticator::new(
            self.scheme.clone(),
            self.keyring.clone(),
            self.leader_secret.clone(),
            registrar,
            config,
        )
    }

    pub fn uav(&self, id: &str) -> ClientAuthenticator {
        let secret = match id {
            UAV_A => self.uav_a_secret.clone(),
            UAV_B => self.uav_b_secret.clone(),
            other => panic!("no key for {other}"),
        };
        self.uav_with_secret(id, secret)
    }

    /// A client claiming `id` but holding `secret`.
    pub fn uav_with_secret(&self, id: &str, secret: SecretKeyBytes) -> ClientAuthenticator {
        ClientAuthenticator::new(
            self.scheme.clone(),
            ClientId::new(id),
            secret,
            self.keyring.leader_public().clone(),
            HandshakeConfig::default(),
        )
    }

    /// Verifier holding this deployment's keyring.
    pub fn verifier(&self) -> ChainVerifier {
        ChainVerifier::with_keyring((*self.keyring).clone())
    }
}

impl Default for Deployment {
    fn default() -> Self {
        Self::new()
    }
}

/// Outcome of one handshake as seen by `(client, leader)`.
pub type HandshakeOutcome = (
    Result<EstablishedSession, AuthError>,
    Result<EstablishedSession, AuthError>,
);

/// Run a full handshake with a chosen client nonce.
pub async fn handshake<R: SessionRegistrar>(
    leader: &LeaderAuthenticator<R>,
    client: &ClientAuthenticator,
    client_nonce: Nonce,
) -> HandshakeOutcome {
    let (mut client_end, mut leader_end) = MemoryTransport::pair();

    let leader_side = async {
        match leader_end.recv().await {
            Ok(Frame::Hello {
                client_id,
                client_nonce,
            }) => leader.accept(&mut leader_end, client_id, client_nonce).await,
            Ok(other) => Err(AuthError::Protocol(format!(
                "expected hello, got {}",
                other.kind()
            ))),
            Err(e) => Err(AuthError::Transport(e)),
        }
    };
    let client_side = client.authenticate_with_nonce(&mut client_end, client_nonce);

    tokio::join!(client_side, leader_side)
}

/// Handshake that must succeed; returns the client's view.
pub async fn login<R: SessionRegistrar>(
    leader: &LeaderAuthenticator<R>,
    client: &ClientAuthenticator,
) -> EstablishedSession {
    let (client_view, leader_view) = handshake(leader, client, Nonce::generate()).await;
    leader_view.expect("leader accepts");
    client_view.expect("client completes")
}

/// Engine clock starting at [`T0`].
pub fn clock() -> ManualClock {
    ManualClock::new(T0)
}
