//! Out-of-band trust bootstrap: one keyring plus one secret key per identity.

use std::fs;
use std::path::{Path, PathBuf};

use epoh_01_authentication::{save_secret_key, Keyring, KeyringEntry, KeyringError};
use shared_crypto::{scheme_for, SchemeKind};
use shared_types::ClientId;

/// File name of the shared public keyring inside the output directory.
pub const KEYRING_FILE: &str = "keyring.json";

/// What [`generate_deployment`] wrote.
#[derive(Debug)]
pub struct GeneratedDeployment {
    pub keyring: Keyring,
    pub keyring_path: PathBuf,
    /// Secret key file per identity, Leader first.
    pub key_paths: Vec<(ClientId, PathBuf)>,
}

/// Path of the secret key file for `id` under `dir`.
pub fn key_path(dir: &Path, id: &ClientId) -> PathBuf {
    dir.join(format!("{id}.key"))
}

/// Generate fresh identities for the Leader and `clients` and write them to `out`.
///
/// Existing files are left alone unless `overwrite` is set, so a deployment
/// cannot be re-keyed by accident.
pub fn generate_deployment(
    kind: SchemeKind,
    leader: &ClientId,
    clients: &[ClientId],
    out: &Path,
    overwrite: bool,
) -> Result<GeneratedDeployment, KeyringError> {
    fs::create_dir_all(out).map_err(|source| KeyringError::Io {
        path: out.to_path_buf(),
        source,
    })?;
    let keyring_path = out.join(KEYRING_FILE);

    let mut identities = vec![leader.clone()];
    identities.extend(clients.iter().cloned());
    if !overwrite {
        let targets = std::iter::once(keyring_path.clone())
            .chain(identities.iter().map(|id| key_path(out, id)));
        for path in targets {
            if path.exists() {
                return Err(KeyringError::Io {
                    source: std::io::Error::new(
                        std::io::ErrorKind::AlreadyExists,
                        "refusing to overwrite existing key material",
                    ),
                    path,
                });
            }
        }
    }

    let scheme = scheme_for(kind);
    let leader_pair = scheme.generate();
    let mut keyring = Keyring::new(
        kind,
        KeyringEntry {
            id: leader.clone(),
            public_key: leader_pair.public.clone(),
        },
    );

    let mut secrets = vec![(leader.clone(), leader_pair.secret)];
    for client in clients {
        let pair = scheme.generate();
        keyring.add_client(client.clone(), pair.public)?;
        secrets.push((client.clone(), pair.secret));
    }

    let mut key_paths = Vec::with_capacity(secrets.len());
    for (id, secret) in &secrets {
        let path = key_path(out, id);
        save_secret_key(&path, secret)?;
        key_paths.push((id.clone(), path));
    }
    keyring.save(&keyring_path)?;

    tracing::info!(
        scheme = %kind,
        leader = %leader,
        clients = clients.len(),
        dir = %out.display(),
        "generated deployment keys"
    );
    Ok(GeneratedDeployment {
        keyring,
        keyring_path,
        key_paths,
    })
}
