//! # Leader Container
//!
//! Holds the subsystem instances of one Leader process, wired in dependency
//! order:
//!
//! ```text
//! keyring + leader key ──→ AuthScheme ──→ BlockSealer ──→ LedgerEngine
//!                                                            │ (SessionRegistrar)
//!                                     LeaderAuthenticator ←──┘
//! ```

pub mod config;

use std::sync::Arc;

use anyhow::{bail, Context, Result};
use epoh_01_authentication::{load_secret_key, Keyring, LeaderAuthenticator};
use epoh_02_ledger::{
    BlockSealer, JsonLinesStore, LedgerEngine, LedgerStore, SystemClock, TimeSource,
};
use shared_crypto::{scheme_for, SecretKeyBytes};
use tracing::info;

pub use config::{ConfigError, NodeConfig};

/// Production container: JSON-lines file and the system clock.
pub type LeaderContainer = NodeContainer<JsonLinesStore, SystemClock>;

/// Central container holding the Leader's subsystems.
pub struct NodeContainer<S: LedgerStore, C: TimeSource> {
    /// Runtime configuration.
    pub config: NodeConfig,
    /// The single writer of the chain.
    pub engine: Arc<LedgerEngine<S, C>>,
    /// Leader side of the handshake; registers sessions with `engine`.
    pub authenticator: LeaderAuthenticator<Arc<LedgerEngine<S, C>>>,
}

impl LeaderContainer {
    /// Load key material from disk and open the ledger file.
    pub fn open(config: NodeConfig) -> Result<Self> {
        let keyring = Keyring::load(&config.keyring_path)
            .with_context(|| format!("loading keyring {}", config.keyring_path.display()))?;
        let secret = load_secret_key(&config.leader_key_path).with_context(|| {
            format!("loading leader key {}", config.leader_key_path.display())
        })?;
        let store = JsonLinesStore::open(&config.ledger_path)
            .with_context(|| format!("opening ledger {}", config.ledger_path.display()))?;
        Self::assemble(config, keyring, secret, store, SystemClock::new())
    }
}

impl<S: LedgerStore, C: TimeSource> NodeContainer<S, C> {
    /// Wire the subsystems around an already opened store.
    ///
    /// Fails if the keyring's Leader is not `config.node_id` or the secret
    /// does not belong to the keyring's Leader identity.
    pub fn assemble(
        config: NodeConfig,
        keyring: Keyring,
        leader_secret: SecretKeyBytes,
        store: S,
        clock: C,
    ) -> Result<Self> {
        let leader_id = config.leader_id();
        if *keyring.leader_id() != leader_id {
            bail!(
                "keyring names Leader {} but this node is {}",
                keyring.leader_id(),
                leader_id
            );
        }

        let scheme = scheme_for(keyring.scheme());
        let public = scheme
            .public_identity(&leader_secret)
            .context("deriving leader public identity")?;
        if public != *keyring.leader_public() {
            bail!("leader key does not match the keyring entry for {leader_id}");
        }

        let sealer = BlockSealer::new(scheme.clone(), leader_id, leader_secret.clone());
        let engine = Arc::new(
            LedgerEngine::open(config.ledger_config(), store, clock, sealer)
                .context("opening ledger engine")?,
        );
        let authenticator = LeaderAuthenticator::new(
            scheme,
            Arc::new(keyring),
            leader_secret,
            Arc::clone(&engine),
            config.handshake_config(),
        );

        info!(
            node_id = %config.node_id,
            scheme = %authenticator.keyring().scheme(),
            clients = authenticator.keyring().client_ids().count(),
            "leader container assembled"
        );

        Ok(Self {
            config,
            engine,
            authenticator,
        })
    }
}
