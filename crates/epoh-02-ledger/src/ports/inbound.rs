//! # Inbound Ports (Driving Ports / API)

use async_trait::async_trait;
use shared_types::{AuthStatus, ClientId, HashChainBlock};

use crate::domain::errors::LedgerError;

/// Public API of the ledger engine.
///
/// Reads never block on a mint in progress and always observe a prefix of the
/// durable chain.
#[async_trait]
pub trait LedgerApi: Send + Sync {
    /// Admit one telemetry record from an authenticated client.
    ///
    /// Returns the minted block once it is durably appended.
    ///
    /// # Errors
    /// * `NoActiveSession` - no live session for `client_id`
    /// * `AuthenticationFailed` - `mac` is not the session MAC of `payload`
    /// * `PersistenceFailure` - durable append failed; engine now halted
    /// * `EngineHalted` - an earlier fatal failure stopped writes
    async fn submit(
        &self,
        client_id: &ClientId,
        payload: Vec<u8>,
        mac: &[u8],
    ) -> Result<HashChainBlock, LedgerError>;

    /// Last `n` blocks, oldest first.
    fn get_chain_tail(&self, n: usize) -> Vec<HashChainBlock>;

    /// Session state of a client.
    fn get_auth_status(&self, client_id: &ClientId) -> AuthStatus;

    /// End a session; `mac` is the session MAC over `logout_message(client_id)`.
    fn logout(&self, client_id: &ClientId, mac: &[u8]) -> Result<(), LedgerError>;

    /// Number of durable blocks.
    fn chain_len(&self) -> u64;

    /// Whether a fatal failure has stopped writes.
    fn is_halted(&self) -> bool;
}
