//! Fixtures shared by the runtime's unit tests.

use std::sync::Arc;

use epoh_01_authentication::{ClientAuthenticator, HandshakeConfig, Keyring, KeyringEntry};
use epoh_02_ledger::{MemoryStore, SystemClock};
use shared_crypto::{scheme_for, AuthScheme, SchemeKind, SecretKeyBytes};
use shared_types::ClientId;

use crate::container::{NodeConfig, NodeContainer};

pub struct Deployment {
    pub scheme: Arc<dyn AuthScheme>,
    pub keyring: Keyring,
    pub leader_secret: SecretKeyBytes,
    pub uav_secret: SecretKeyBytes,
}

pub fn deployment() -> Deployment {
    let scheme = scheme_for(SchemeKind::Simulated);
    let leader = scheme.generate();
    let uav = scheme.generate();
    let mut keyring = Keyring::new(
        SchemeKind::Simulated,
        KeyringEntry {
            id: ClientId::new("Leader_Node_1"),
            public_key: leader.public.clone(),
        },
    );
    keyring
        .add_client(ClientId::new("UAV_A1"), uav.public.clone())
        .unwrap();
    Deployment {
        scheme,
        keyring,
        leader_secret: leader.secret.clone(),
        uav_secret: uav.secret.clone(),
    }
}

pub fn memory_node(
    d: &Deployment,
    config: NodeConfig,
) -> (NodeContainer<MemoryStore, SystemClock>, MemoryStore) {
    let store = MemoryStore::new();
    let node = NodeContainer::assemble(
        config,
        d.keyring.clone(),
        d.leader_secret.clone(),
        store.clone(),
        SystemClock::new(),
    )
    .unwrap();
    (node, store)
}

pub fn uav(d: &Deployment) -> ClientAuthenticator {
    ClientAuthenticator::new(
        d.scheme.clone(),
        ClientId::new("UAV_A1"),
        d.uav_secret.clone(),
        d.keyring.leader_public().clone(),
        HandshakeConfig::default(),
    )
}
