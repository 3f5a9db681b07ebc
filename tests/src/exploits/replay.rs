//! # Nonce Replay
//!
//! An attacker who recorded a client's `Hello` (and everything after it)
//! tries to open a new session by replaying the same client nonce.

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use epoh_01_authentication::{AuthError, HandshakeConfig, LeaderHandshake, MemoryTransport};
    use epoh_02_ledger::{LedgerApi, LedgerEngine, MemoryStore};
    use shared_types::{AuthStatus, ClientId, Nonce};

    use crate::fixtures::{clock, handshake, Deployment, UAV_A, UAV_B};

    #[tokio::test]
    async fn test_replayed_nonce_refused_while_session_live() {
        let deployment = Deployment::new();
        let engine = Arc::new(deployment.engine(MemoryStore::new(), clock()));
        let leader = deployment.leader(engine.clone(), HandshakeConfig::default());
        let uav = deployment.uav(UAV_A);
        let nonce = Nonce::generate();

        let (first, _) = handshake(&leader, &uav, nonce).await;
        let first = first.unwrap();
        let (client_view, leader_view) = handshake(&leader, &uav, nonce).await;

        assert_eq!(
            leader_view.unwrap_err(),
            AuthError::ReplayDetected(ClientId::new(UAV_A))
        );
        assert!(client_view.is_err());
        // The original session is untouched by the failed attempt.
        let payload = b"still mine".to_vec();
        let mac = first.session_key.mac(&payload);
        assert!(engine.submit(&first.client_id, payload, &mac).await.is_ok());
    }

    #[tokio::test]
    async fn test_replayed_nonce_refused_after_session_expired() {
        let deployment = Deployment::new();
        let clock = clock();
        let engine = Arc::new(
            LedgerEngine::open(
                deployment.ledger_config(Duration::from_secs(2)),
                MemoryStore::new(),
                clock.clone(),
                deployment.sealer(),
            )
            .unwrap(),
        );
        let leader = deployment.leader(engine.clone(), HandshakeConfig::default());
        let uav = deployment.uav(UAV_A);
        let id = ClientId::new(UAV_A);
        let nonce = Nonce::generate();

        let (first, _) = handshake(&leader, &uav, nonce).await;
        first.unwrap();
        clock.advance(Duration::from_secs(3));
        assert!(matches!(
            engine.get_auth_status(&id),
            AuthStatus::Expired { .. }
        ));

        let (_, leader_view) = handshake(&leader, &uav, nonce).await;
        assert_eq!(leader_view.unwrap_err(), AuthError::ReplayDetected(id.clone()));
        assert!(!engine.get_auth_status(&id).is_active());

        // A fresh nonce is the legitimate way back in.
        let (client_view, leader_view) = handshake(&leader, &uav, Nonce::generate()).await;
        assert!(client_view.is_ok() && leader_view.is_ok());
        assert!(engine.get_auth_status(&id).is_active());
    }

    #[tokio::test]
    async fn test_failed_attempt_still_burns_nonce() {
        let deployment = Deployment::new();
        let engine = Arc::new(deployment.engine(MemoryStore::new(), clock()));
        let leader = deployment.leader(engine.clone(), HandshakeConfig::default());
        let nonce = Nonce::generate();

        let impostor = deployment.uav_with_secret(UAV_A, deployment.scheme.generate().secret);
        let (_, leader_view) = handshake(&leader, &impostor, nonce).await;
        assert_eq!(
            leader_view.unwrap_err(),
            AuthError::ClientUnverified(ClientId::new(UAV_A))
        );

        let (_, leader_view) = handshake(&leader, &deployment.uav(UAV_A), nonce).await;
        assert_eq!(
            leader_view.unwrap_err(),
            AuthError::ReplayDetected(ClientId::new(UAV_A))
        );
    }

    #[tokio::test]
    async fn test_nonce_scope_is_per_client() {
        let deployment = Deployment::new();
        let engine = Arc::new(deployment.engine(MemoryStore::new(), clock()));
        let leader = deployment.leader(engine, HandshakeConfig::default());
        let nonce = Nonce::generate();

        let (a, _) = handshake(&leader, &deployment.uav(UAV_A), nonce).await;
        let (b, _) = handshake(&leader, &deployment.uav(UAV_B), nonce).await;
        assert!(a.is_ok());
        assert!(b.is_ok());
    }

    #[tokio::test]
    async fn test_flooding_one_client_leaves_others_served() {
        let deployment = Deployment::new();
        let engine = Arc::new(deployment.engine(MemoryStore::new(), clock()));
        let config = HandshakeConfig {
            max_nonces_per_client: 2,
            ..HandshakeConfig::default()
        };
        let leader = deployment.leader(engine.clone(), config);
        let victim = ClientId::new(UAV_B);

        // Keyless hellos under UAV_B2's name, each dropped after the challenge.
        for _ in 0..2 {
            let (client_end, mut leader_end) = MemoryTransport::pair();
            drop(client_end);
            let result = leader.accept(&mut leader_end, victim.clone(), Nonce::generate()).await;
            assert!(matches!(result, Err(AuthError::Transport(_))));
        }

        let (client_view, leader_view) =
            handshake(&leader, &deployment.uav(UAV_B), Nonce::generate()).await;
        assert_eq!(leader_view.unwrap_err(), AuthError::Busy(victim.clone()));
        assert_eq!(client_view.unwrap_err(), AuthError::Rejected("busy".into()));

        let (client_view, leader_view) =
            handshake(&leader, &deployment.uav(UAV_A), Nonce::generate()).await;
        assert!(client_view.is_ok() && leader_view.is_ok());
        assert!(engine.get_auth_status(&ClientId::new(UAV_A)).is_active());
        assert!(!engine.get_auth_status(&victim).is_active());
    }
}
