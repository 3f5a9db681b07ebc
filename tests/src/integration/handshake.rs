//! # Handshake Properties
//!
//! Key agreement, all-or-nothing session creation and round-trip timeouts,
//! checked against a real ledger engine as the session registrar.

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use epoh_01_authentication::{
        AuthError, HandshakeConfig, LeaderHandshake, MemoryTransport, Transport,
    };
    use epoh_02_ledger::{LedgerApi, MemoryStore};
    use shared_types::{AuthStatus, ClientId, Frame, Nonce};

    use crate::fixtures::{clock, handshake, login, Deployment, UAV_A, UAV_B};

    #[tokio::test]
    async fn test_both_sides_derive_identical_keys() {
        let deployment = Deployment::new();
        let engine = Arc::new(deployment.engine(MemoryStore::new(), clock()));
        let leader = deployment.leader(engine.clone(), HandshakeConfig::default());

        for id in [UAV_A, UAV_B] {
            let (client_view, leader_view) =
                handshake(&leader, &deployment.uav(id), Nonce::generate()).await;
            let (client_view, leader_view) = (client_view.unwrap(), leader_view.unwrap());

            assert_eq!(
                client_view.session_key.as_bytes(),
                leader_view.session_key.as_bytes()
            );
            assert_eq!(client_view.expires_at_micros, leader_view.expires_at_micros);
            assert!(engine.get_auth_status(&ClientId::new(id)).is_active());
        }
    }

    #[tokio::test]
    async fn test_fresh_handshakes_derive_fresh_keys() {
        let deployment = Deployment::new();
        let engine = Arc::new(deployment.engine(MemoryStore::new(), clock()));
        let leader = deployment.leader(engine, HandshakeConfig::default());
        let uav = deployment.uav(UAV_A);

        let first = login(&leader, &uav).await;
        let second = login(&leader, &uav).await;
        assert_ne!(first.session_key.as_bytes(), second.session_key.as_bytes());
    }

    #[tokio::test]
    async fn test_impostor_client_gets_no_session() {
        let deployment = Deployment::new();
        let engine = Arc::new(deployment.engine(MemoryStore::new(), clock()));
        let leader = deployment.leader(engine.clone(), HandshakeConfig::default());

        let stolen_name = deployment.uav_with_secret(UAV_A, deployment.scheme.generate().secret);
        let (client_view, leader_view) = handshake(&leader, &stolen_name, Nonce::generate()).await;

        assert_eq!(
            leader_view.unwrap_err(),
            AuthError::ClientUnverified(ClientId::new(UAV_A))
        );
        assert!(client_view.is_err());
        assert_eq!(
            engine.get_auth_status(&ClientId::new(UAV_A)),
            AuthStatus::NotAuthenticated
        );
    }

    #[tokio::test]
    async fn test_unregistered_client_gets_no_session() {
        let deployment = Deployment::new();
        let engine = Arc::new(deployment.engine(MemoryStore::new(), clock()));
        let leader = deployment.leader(engine.clone(), HandshakeConfig::default());

        let stranger = deployment.uav_with_secret("UAV_Z9", deployment.scheme.generate().secret);
        let (client_view, leader_view) = handshake(&leader, &stranger, Nonce::generate()).await;

        assert_eq!(
            leader_view.unwrap_err(),
            AuthError::UnknownClient(ClientId::new("UAV_Z9"))
        );
        assert!(client_view.is_err());
        assert_eq!(engine.active_sessions(), 0);
    }

    #[tokio::test]
    async fn test_fake_leader_is_detected_by_client() {
        let deployment = Deployment::new();
        let impostor = Deployment::new();
        let engine = Arc::new(impostor.engine(MemoryStore::new(), clock()));
        // The impostor knows UAV_A's public key but not the real Leader's secret.
        let fake_leader = epoh_01_authentication::LeaderAuthenticator::new(
            impostor.scheme.clone(),
            deployment.keyring.clone(),
            impostor.leader_secret.clone(),
            engine.clone(),
            HandshakeConfig::default(),
        );

        let (client_view, leader_view) =
            handshake(&fake_leader, &deployment.uav(UAV_A), Nonce::generate()).await;

        assert_eq!(client_view.unwrap_err(), AuthError::LeaderUnverified);
        assert!(leader_view.is_err());
        assert_eq!(engine.active_sessions(), 0);
    }

    #[tokio::test]
    async fn test_silent_client_times_out_without_session() {
        let deployment = Deployment::new();
        let engine = Arc::new(deployment.engine(MemoryStore::new(), clock()));
        let config = HandshakeConfig {
            round_trip_timeout: Duration::from_millis(50),
            ..HandshakeConfig::default()
        };
        let leader = deployment.leader(engine.clone(), config);

        let (mut client_end, mut leader_end) = MemoryTransport::pair();
        let result = leader
            .accept(&mut leader_end, ClientId::new(UAV_A), Nonce::generate())
            .await;

        assert_eq!(result.unwrap_err(), AuthError::Timeout);
        assert_eq!(
            engine.get_auth_status(&ClientId::new(UAV_A)),
            AuthStatus::NotAuthenticated
        );
        // The client saw the challenge, then the refusal.
        assert!(matches!(client_end.recv().await, Ok(Frame::Challenge { .. })));
        assert!(matches!(client_end.recv().await, Ok(Frame::Rejected { .. })));
    }

    #[tokio::test]
    async fn test_silent_leader_times_out_client() {
        let deployment = Deployment::new();
        let uav = epoh_01_authentication::ClientAuthenticator::new(
            deployment.scheme.clone(),
            ClientId::new(UAV_A),
            deployment.uav_a_secret.clone(),
            deployment.keyring.leader_public().clone(),
            HandshakeConfig {
                round_trip_timeout: Duration::from_millis(50),
                ..HandshakeConfig::default()
            },
        );

        let (mut client_end, _leader_end) = MemoryTransport::pair();
        let err = uav
            .authenticate_with_nonce(&mut client_end, Nonce::generate())
            .await
            .unwrap_err();
        assert_eq!(err, AuthError::Timeout);
    }
}
