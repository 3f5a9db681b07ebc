//! # Ledger Engine Service
//!
//! ## Locking
//!
//! ```text
//! submit ──→ store: tokio::Mutex (FIFO) ──→ sessions: RwLock ──→ chain: RwLock (write, push only)
//! reads ───────────────────────────────────→ sessions / chain: RwLock (read)
//! ```
//!
//! The store mutex is the mint critical section. Waiters are served in
//! arrival order, so queued submissions mint first-come first-served. The
//! published chain is only ever extended after a durable append, which keeps
//! every read a consistent prefix of the on-disk ledger.

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use parking_lot::RwLock;
use shared_crypto::SessionKey;
use shared_types::{
    logout_message, AuthStatus, BlockTimestamp, ClientId, HashChainBlock, GENESIS_PAYLOAD,
    GENESIS_PREV_HASH,
};
use tokio::sync::Mutex;
use tracing::{error, info, warn};

use crate::domain::entities::{LedgerConfig, SessionEvent};
use crate::domain::errors::{LedgerError, StoreError};
use crate::domain::minting::{check_linkage, mint_block, BlockSealer};
use crate::domain::sessions::SessionTable;
use crate::ports::inbound::LedgerApi;
use crate::ports::outbound::{LedgerStore, TimeSource};

/// The single writer of the EPOH chain.
pub struct LedgerEngine<S: LedgerStore, C: TimeSource> {
    config: LedgerConfig,
    store: Mutex<S>,
    chain: RwLock<Vec<HashChainBlock>>,
    sessions: RwLock<SessionTable>,
    sealer: BlockSealer,
    clock: C,
    halted: AtomicBool,
}

impl<S: LedgerStore, C: TimeSource> LedgerEngine<S, C> {
    /// Load the persisted chain, or mint genesis into an empty store.
    pub fn open(
        config: LedgerConfig,
        mut store: S,
        clock: C,
        sealer: BlockSealer,
    ) -> Result<Self, LedgerError> {
        let mut blocks = store
            .load()
            .map_err(|e| LedgerError::PersistenceFailure(e.to_string()))?;

        if let Err((index, reason)) = check_linkage(&blocks) {
            return Err(LedgerError::CorruptLedger { index, reason });
        }

        if blocks.is_empty() {
            let timestamp = BlockTimestamp {
                wall_micros: clock.wall_micros(),
                monotonic_micros: clock.monotonic_micros(),
            };
            let genesis = mint_block(
                0,
                timestamp,
                config.leader_id.clone(),
                GENESIS_PAYLOAD.to_vec(),
                GENESIS_PREV_HASH,
                &sealer,
            )?;
            store
                .append(&genesis)
                .map_err(|e| LedgerError::PersistenceFailure(e.to_string()))?;
            info!(hash = %genesis.short_hash(), "minted genesis block");
            blocks.push(genesis);
        } else {
            info!(blocks = blocks.len(), "resumed existing ledger");
        }

        Ok(Self {
            config,
            store: Mutex::new(store),
            chain: RwLock::new(blocks),
            sessions: RwLock::new(SessionTable::new()),
            sealer,
            clock,
            halted: AtomicBool::new(false),
        })
    }

    /// Engine configuration.
    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    /// Install a freshly authenticated session; returns its expiry (µs).
    pub fn register_session(&self, client_id: &ClientId, session_key: SessionKey) -> u64 {
        let now = self.clock.wall_micros();
        let expires = self
            .sessions
            .write()
            .insert(client_id, session_key, now, self.config.session_ttl);
        info!(%client_id, expires_at_micros = expires, "session registered");
        expires
    }

    /// Retire expired sessions; returns how many.
    pub fn purge_expired_sessions(&self) -> usize {
        let now = self.clock.wall_micros();
        let purged = self.sessions.write().purge_expired(now);
        if purged > 0 {
            info!(purged, "expired sessions purged");
        }
        purged
    }

    /// Sessions live right now.
    pub fn active_sessions(&self) -> usize {
        self.sessions.read().active_count(self.clock.wall_micros())
    }

    /// Mint a Leader-authored audit block recording a session event.
    pub async fn record_session_event(&self, event: &SessionEvent) -> Result<HashChainBlock, LedgerError> {
        let payload = serde_json::to_vec(event)
            .map_err(|e| LedgerError::PersistenceFailure(format!("encode audit record: {e}")))?;
        let mut store = self.store.lock().await;
        self.ensure_running()?;
        self.mint_locked(&mut *store, event.client_id.clone(), payload)
    }

    /// Copy of the whole published chain.
    pub fn snapshot(&self) -> Vec<HashChainBlock> {
        self.chain.read().clone()
    }

    /// Last published block.
    pub fn last_block(&self) -> Option<HashChainBlock> {
        self.chain.read().last().cloned()
    }

    fn ensure_running(&self) -> Result<(), LedgerError> {
        if self.halted.load(Ordering::Acquire) {
            return Err(LedgerError::EngineHalted);
        }
        Ok(())
    }

    fn halt(&self) {
        self.halted.store(true, Ordering::Release);
    }

    /// Mint, persist and publish one block. Caller holds the store lock.
    fn mint_locked(
        &self,
        store: &mut S,
        client_id: ClientId,
        payload: Vec<u8>,
    ) -> Result<HashChainBlock, LedgerError> {
        let (index, prev_hash, prev_wall) = {
            let chain = self.chain.read();
            match chain.last() {
                Some(last) => (chain.len() as u64, last.block_hash, last.timestamp.wall_micros),
                None => (0, GENESIS_PREV_HASH, 0),
            }
        };

        let wall = self.clock.wall_micros();
        if wall < prev_wall {
            warn!(wall, prev_wall, "clock behind chain head, clamping timestamp");
        }
        let timestamp = BlockTimestamp {
            wall_micros: wall.max(prev_wall),
            monotonic_micros: self.clock.monotonic_micros(),
        };

        let block = mint_block(index, timestamp, client_id, payload, prev_hash, &self.sealer)?;

        match store.append(&block) {
            Ok(()) => {
                self.chain.write().push(block.clone());
                info!(
                    index,
                    client_id = %block.client_id,
                    hash = %block.short_hash(),
                    "block minted"
                );
                Ok(block)
            }
            Err(StoreError::OutOfSequence { expected, found }) => {
                self.halt();
                error!(expected, found, "store disagrees with chain head, engine halted");
                Err(LedgerError::ConcurrentMintConflict {
                    expected: found,
                    found: expected,
                })
            }
            Err(err) => {
                self.halt();
                if let Err(rollback) = store.truncate(index) {
                    error!(error = %rollback, index, "rollback after failed append also failed");
                }
                error!(
                    error = %err,
                    index,
                    "durable append failed, engine halted; restart the Leader to resume"
                );
                Err(LedgerError::PersistenceFailure(err.to_string()))
            }
        }
    }
}

#[async_trait]
impl<S: LedgerStore, C: TimeSource> LedgerApi for LedgerEngine<S, C> {
    async fn submit(
        &self,
        client_id: &ClientId,
        payload: Vec<u8>,
        mac: &[u8],
    ) -> Result<HashChainBlock, LedgerError> {
        if payload.len() > self.config.max_payload_bytes {
            return Err(LedgerError::PayloadTooLarge {
                size: payload.len(),
                max: self.config.max_payload_bytes,
            });
        }
        self.ensure_running()?;

        let mut store = self.store.lock().await;
        self.ensure_running()?;

        let now = self.clock.wall_micros();
        let key = self
            .sessions
            .write()
            .active_key(client_id, now)
            .ok_or_else(|| LedgerError::NoActiveSession(client_id.clone()))?;
        if key.verify(&payload, mac).is_err() {
            warn!(%client_id, "submission MAC mismatch");
            return Err(LedgerError::AuthenticationFailed(client_id.clone()));
        }

        self.mint_locked(&mut *store, client_id.clone(), payload)
    }

    fn get_chain_tail(&self, n: usize) -> Vec<HashChainBlock> {
        let chain = self.chain.read();
        let start = chain.len().saturating_sub(n);
        chain[start..].to_vec()
    }

    fn get_auth_status(&self, client_id: &ClientId) -> AuthStatus {
        self.sessions.read().status(client_id, self.clock.wall_micros())
    }

    fn logout(&self, client_id: &ClientId, mac: &[u8]) -> Result<(), LedgerError> {
        let now = self.clock.wall_micros();
        let mut sessions = self.sessions.write();
        let key = sessions
            .active_key(client_id, now)
            .ok_or_else(|| LedgerError::NoActiveSession(client_id.clone()))?;
        key.verify(&logout_message(client_id), mac)
            .map_err(|_| LedgerError::AuthenticationFailed(client_id.clone()))?;
        sessions.remove(client_id);
        info!(%client_id, "session ended by client");
        Ok(())
    }

    fn chain_len(&self) -> u64 {
        self.chain.read().len() as u64
    }

    fn is_halted(&self) -> bool {
        self.halted.load(Ordering::Acquire)
    }
}
