//! # Replay Guard
//!
//! Remembers every `(client_id, client_nonce)` the Leader has accepted into a
//! handshake. The window is independent of session lifetime, so a nonce stays
//! burned after the session it opened has expired.
//!
//! Each client id has its own bounded nonce set. Flooding `Hello`s under one
//! id can saturate that id's set only; other clients keep authenticating.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use shared_types::{ClientId, Nonce};

use crate::domain::entities::{DEFAULT_MAX_NONCES_PER_CLIENT, DEFAULT_REPLAY_WINDOW};

/// Outcome of offering a client nonce to the guard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NonceCheck {
    /// First use inside the window; the nonce is now burned.
    Fresh,
    /// Already used by this client inside the window.
    Replayed,
    /// This client's nonce set is full of unexpired entries.
    Saturated,
}

/// Thread-safe per-client nonce cache for replay prevention.
#[derive(Debug)]
pub struct ReplayGuard {
    seen: Mutex<HashMap<ClientId, HashMap<Nonce, Instant>>>,
    window: Duration,
    max_per_client: usize,
}

impl ReplayGuard {
    /// Create a guard with the given retention window and per-client bound.
    pub fn new(window: Duration, max_per_client: usize) -> Self {
        Self {
            seen: Mutex::new(HashMap::new()),
            window,
            max_per_client,
        }
    }

    /// Record a nonce as used by `client_id`.
    ///
    /// A full set is pruned of expired entries first. If it is still full the
    /// nonce is refused as `Saturated` rather than evicting a live entry.
    pub fn check_and_insert(&self, client_id: &ClientId, nonce: &Nonce) -> NonceCheck {
        let now = Instant::now();
        let mut seen = self.seen.lock();
        let nonces = seen.entry(client_id.clone()).or_default();

        if let Some(expiry) = nonces.get(nonce) {
            if *expiry > now {
                return NonceCheck::Replayed;
            }
        }

        if nonces.len() >= self.max_per_client {
            nonces.retain(|_, expiry| *expiry > now);
            if nonces.len() >= self.max_per_client {
                tracing::warn!(
                    client_id = %client_id,
                    entries = nonces.len(),
                    "replay guard saturated for client, refusing new nonce"
                );
                return NonceCheck::Saturated;
            }
        }

        nonces.insert(*nonce, now + self.window);
        NonceCheck::Fresh
    }

    /// Drop entries whose window has passed.
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut seen = self.seen.lock();
        let mut removed = 0;
        seen.retain(|_, nonces| {
            let before = nonces.len();
            nonces.retain(|_, expiry| *expiry > now);
            removed += before - nonces.len();
            !nonces.is_empty()
        });
        removed
    }

    /// Number of remembered nonces across all clients.
    pub fn len(&self) -> usize {
        self.seen.lock().values().map(HashMap::len).sum()
    }

    /// Number of remembered nonces for one client.
    pub fn len_for(&self, client_id: &ClientId) -> usize {
        self.seen.lock().get(client_id).map_or(0, HashMap::len)
    }

    /// Whether no nonce is remembered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for ReplayGuard {
    fn default() -> Self {
        Self::new(DEFAULT_REPLAY_WINDOW, DEFAULT_MAX_NONCES_PER_CLIENT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_use_is_replay() {
        let guard = ReplayGuard::default();
        let id = ClientId::new("UAV_A1");
        let nonce = Nonce::generate();

        assert_eq!(guard.check_and_insert(&id, &nonce), NonceCheck::Fresh);
        assert_eq!(guard.check_and_insert(&id, &nonce), NonceCheck::Replayed);
    }

    #[test]
    fn test_nonce_is_scoped_per_client() {
        let guard = ReplayGuard::default();
        let nonce = Nonce::from_bytes([9; 32]);

        assert_eq!(guard.check_and_insert(&ClientId::new("UAV_A1"), &nonce), NonceCheck::Fresh);
        assert_eq!(guard.check_and_insert(&ClientId::new("UAV_B2"), &nonce), NonceCheck::Fresh);
    }

    #[test]
    fn test_window_expiry_allows_reuse() {
        let guard = ReplayGuard::new(Duration::from_millis(20), 16);
        let id = ClientId::new("UAV_A1");
        let nonce = Nonce::generate();

        assert_eq!(guard.check_and_insert(&id, &nonce), NonceCheck::Fresh);
        std::thread::sleep(Duration::from_millis(40));
        assert_eq!(guard.purge_expired(), 1);
        assert!(guard.is_empty());
        assert_eq!(guard.check_and_insert(&id, &nonce), NonceCheck::Fresh);
    }

    #[test]
    fn test_saturation_is_confined_to_one_client() {
        let guard = ReplayGuard::new(Duration::from_secs(60), 2);
        let flooded = ClientId::new("UAV_B2");

        assert_eq!(guard.check_and_insert(&flooded, &Nonce::generate()), NonceCheck::Fresh);
        assert_eq!(guard.check_and_insert(&flooded, &Nonce::generate()), NonceCheck::Fresh);
        assert_eq!(
            guard.check_and_insert(&flooded, &Nonce::generate()),
            NonceCheck::Saturated
        );
        assert_eq!(guard.len_for(&flooded), 2);

        let other = ClientId::new("UAV_A1");
        assert_eq!(guard.check_and_insert(&other, &Nonce::generate()), NonceCheck::Fresh);
        assert_eq!(guard.len(), 3);
    }

    #[test]
    fn test_saturated_client_still_reports_replays() {
        let guard = ReplayGuard::new(Duration::from_secs(60), 1);
        let id = ClientId::new("UAV_A1");
        let used = Nonce::generate();

        assert_eq!(guard.check_and_insert(&id, &used), NonceCheck::Fresh);
        assert_eq!(guard.check_and_insert(&id, &used), NonceCheck::Replayed);
        assert_eq!(guard.check_and_insert(&id, &Nonce::generate()), NonceCheck::Saturated);
    }

    #[test]
    fn test_saturated_client_recovers_after_window() {
        let guard = ReplayGuard::new(Duration::from_millis(20), 1);
        let id = ClientId::new("UAV_A1");

        assert_eq!(guard.check_and_insert(&id, &Nonce::generate()), NonceCheck::Fresh);
        assert_eq!(guard.check_and_insert(&id, &Nonce::generate()), NonceCheck::Saturated);
        std::thread::sleep(Duration::from_millis(40));
        assert_eq!(guard.check_and_insert(&id, &Nonce::generate()), NonceCheck::Fresh);
    }
}
