//! # Keyring
//!
//! Out-of-band trust bootstrap: the deployment's scheme, the Leader's public
//! identity and every registered client's public identity. The file is JSON:
//!
//! ```json
//! {
//!   "scheme": "secp256k1",
//!   "leader": { "id": "Leader_Node_1", "public_key": "02ab..." },
//!   "clients": [ { "id": "UAV_A1", "public_key": "03cd..." } ]
//! }
//! ```
//!
//! Secret keys live in separate one-line hex files, one per identity.

use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::Path;

use serde::{Deserialize, Serialize};
use shared_crypto::{PublicIdentity, SchemeKind, SecretKeyBytes};
use shared_types::ClientId;

use crate::domain::errors::KeyringError;

/// One identity in the keyring file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyringEntry {
    /// Identity name.
    pub id: ClientId,
    /// Hex encoded public identity.
    pub public_key: PublicIdentity,
}

#[derive(Serialize, Deserialize)]
struct KeyringFile {
    scheme: SchemeKind,
    leader: KeyringEntry,
    #[serde(default)]
    clients: Vec<KeyringEntry>,
}

/// Public identities known to a deployment.
#[derive(Debug, Clone)]
pub struct Keyring {
    scheme: SchemeKind,
    leader: KeyringEntry,
    clients: BTreeMap<ClientId, PublicIdentity>,
}

impl Keyring {
    /// Keyring with a Leader and no clients.
    pub fn new(scheme: SchemeKind, leader: KeyringEntry) -> Self {
        Self {
            scheme,
            leader,
            clients: BTreeMap::new(),
        }
    }

    /// Register a client. Names must be unique across clients and the Leader.
    pub fn add_client(&mut self, id: ClientId, public_key: PublicIdentity) -> Result<(), KeyringError> {
        if id == self.leader.id || self.clients.contains_key(&id) {
            return Err(KeyringError::DuplicateIdentity(id));
        }
        self.clients.insert(id, public_key);
        Ok(())
    }

    /// Parse a keyring document.
    pub fn from_json(text: &str) -> Result<Self, KeyringError> {
        let file: KeyringFile =
            serde_json::from_str(text).map_err(|e| KeyringError::Parse(e.to_string()))?;
        ClientId::parse(file.leader.id.as_str()).map_err(|e| KeyringError::InvalidKey {
            id: file.leader.id.to_string(),
            reason: e.to_string(),
        })?;

        let mut keyring = Keyring::new(file.scheme, file.leader);
        for entry in file.clients {
            let id = ClientId::parse(entry.id.as_str()).map_err(|e| KeyringError::InvalidKey {
                id: entry.id.to_string(),
                reason: e.to_string(),
            })?;
            keyring.add_client(id, entry.public_key)?;
        }
        Ok(keyring)
    }

    /// Render as a pretty-printed keyring document.
    pub fn to_json(&self) -> Result<String, KeyringError> {
        let file = KeyringFile {
            scheme: self.scheme,
            leader: self.leader.clone(),
            clients: self
                .clients
                .iter()
                .map(|(id, public_key)| KeyringEntry {
                    id: id.clone(),
                    public_key: public_key.clone(),
                })
                .collect(),
        };
        serde_json::to_string_pretty(&file).map_err(|e| KeyringError::Parse(e.to_string()))
    }

    /// Load from a file.
    pub fn load(path: &Path) -> Result<Self, KeyringError> {
        let text = fs::read_to_string(path).map_err(|source| KeyringError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&text)
    }

    /// Write to a file.
    pub fn save(&self, path: &Path) -> Result<(), KeyringError> {
        let mut text = self.to_json()?;
        text.push('\n');
        fs::write(path, text).map_err(|source| KeyringError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Scheme selected for this deployment.
    pub fn scheme(&self) -> SchemeKind {
        self.scheme
    }

    /// Leader identity name.
    pub fn leader_id(&self) -> &ClientId {
        &self.leader.id
    }

    /// Leader public identity.
    pub fn leader_public(&self) -> &PublicIdentity {
        &self.leader.public_key
    }

    /// Registered public identity of a client.
    pub fn client_public(&self, id: &ClientId) -> Option<&PublicIdentity> {
        self.clients.get(id)
    }

    /// Whether `id` names the Leader or a registered client.
    pub fn is_known(&self, id: &ClientId) -> bool {
        *id == self.leader.id || self.clients.contains_key(id)
    }

    /// Registered client names, sorted.
    pub fn client_ids(&self) -> impl Iterator<Item = &ClientId> {
        self.clients.keys()
    }
}

/// Read a one-line hex secret key file.
pub fn load_secret_key(path: &Path) -> Result<SecretKeyBytes, KeyringError> {
    let text = fs::read_to_string(path).map_err(|source| KeyringError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    SecretKeyBytes::from_hex(&text).map_err(|e| KeyringError::InvalidKey {
        id: path.display().to_string(),
        reason: e.to_string(),
    })
}

/// Write a secret key file, owner-readable only on Unix.
pub fn save_secret_key(path: &Path, secret: &SecretKeyBytes) -> Result<(), KeyringError> {
    let io_err = |source| KeyringError::Io {
        path: path.to_path_buf(),
        source,
    };

    let mut options = fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }

    let mut file = options.open(path).map_err(io_err)?;
    writeln!(file, "{}", secret.to_hex()).map_err(io_err)?;
    file.sync_all().map_err(io_err)
}
