//! # Session Table
//!
//! Live sessions keyed by client, plus the expiry time of the last lapsed
//! session so that `get_auth_status` can tell "expired" from "never".

use std::collections::HashMap;
use std::time::Duration;

use shared_crypto::SessionKey;
use shared_types::{AuthStatus, ClientId};

use crate::domain::entities::Session;

/// Sessions owned by the engine.
#[derive(Debug, Default)]
pub struct SessionTable {
    live: HashMap<ClientId, Session>,
    lapsed: HashMap<ClientId, u64>,
}

impl SessionTable {
    /// Empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Install a session, replacing any previous one for the client.
    pub fn insert(&mut self, client_id: &ClientId, session_key: SessionKey, now_micros: u64, ttl: Duration) -> u64 {
        let ttl_micros = u64::try_from(ttl.as_micros()).unwrap_or(u64::MAX);
        let expires_at_micros = now_micros.saturating_add(ttl_micros);
        self.lapsed.remove(client_id);
        self.live.insert(
            client_id.clone(),
            Session {
                client_id: client_id.clone(),
                session_key,
                established_at_micros: now_micros,
                expires_at_micros,
            },
        );
        expires_at_micros
    }

    /// Key of the client's live session. An expired entry is retired here.
    pub fn active_key(&mut self, client_id: &ClientId, now_micros: u64) -> Option<SessionKey> {
        let session = self.live.get(client_id)?;
        if session.is_live(now_micros) {
            return Some(session.session_key.clone());
        }
        let expired_at = session.expires_at_micros;
        self.live.remove(client_id);
        self.lapsed.insert(client_id.clone(), expired_at);
        None
    }

    /// Read-only status at `now`.
    pub fn status(&self, client_id: &ClientId, now_micros: u64) -> AuthStatus {
        match self.live.get(client_id) {
            Some(s) if s.is_live(now_micros) => AuthStatus::Active {
                established_at_micros: s.established_at_micros,
                expires_at_micros: s.expires_at_micros,
            },
            Some(s) => AuthStatus::Expired {
                expired_at_micros: s.expires_at_micros,
            },
            None => match self.lapsed.get(client_id) {
                Some(&expired_at_micros) => AuthStatus::Expired { expired_at_micros },
                None => AuthStatus::NotAuthenticated,
            },
        }
    }

    /// End a session explicitly. Returns whether one existed.
    pub fn remove(&mut self, client_id: &ClientId) -> bool {
        self.lapsed.remove(client_id);
        self.live.remove(client_id).is_some()
    }

    /// Retire every session expired at `now`; returns how many.
    pub fn purge_expired(&mut self, now_micros: u64) -> usize {
        let expired: Vec<ClientId> = self
            .live
            .values()
            .filter(|s| !s.is_live(now_micros))
            .map(|s| s.client_id.clone())
            .collect();
        for id in &expired {
            if let Some(session) = self.live.remove(id) {
                self.lapsed.insert(id.clone(), session.expires_at_micros);
            }
        }
        expired.len()
    }

    /// Number of sessions live at `now`.
    pub fn active_count(&self, now_micros: u64) -> usize {
        self.live.values().filter(|s| s.is_live(now_micros)).count()
    }
}
