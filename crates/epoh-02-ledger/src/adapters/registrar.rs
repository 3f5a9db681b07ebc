//! Session hand-off from the authentication subsystem.

use epoh_01_authentication::SessionRegistrar;
use shared_crypto::SessionKey;
use shared_types::ClientId;

use crate::ports::outbound::{LedgerStore, TimeSource};
use crate::service::LedgerEngine;

impl<S: LedgerStore, C: TimeSource> SessionRegistrar for LedgerEngine<S, C> {
    fn register_session(&self, client_id: &ClientId, session_key: SessionKey) -> u64 {
        LedgerEngine::register_session(self, client_id, session_key)
    }
}
