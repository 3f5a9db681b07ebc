//! # Ledger Write Path
//!
//! Persistence failures, restart and retry, and index assignment under
//! concurrent writers.

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::fs::OpenOptions;
    use std::io::Write;
    use std::sync::Arc;

    use epoh_01_authentication::HandshakeConfig;
    use epoh_02_ledger::{JsonLinesStore, LedgerApi, LedgerError, LedgerStore, MemoryStore};
    use shared_crypto::SessionKey;
    use shared_types::ClientId;

    use crate::fixtures::{clock, login, Deployment, UAV_A, UAV_B};

    fn key_for(id: &str) -> SessionKey {
        SessionKey::from_bytes(shared_crypto::sha256(id.as_bytes()))
    }

    #[tokio::test]
    async fn test_retry_after_persistence_failure_mints_once() {
        let deployment = Deployment::new();
        let store = MemoryStore::new();
        let id = ClientId::new(UAV_A);
        let payload = br#"{"x_pos":10.0,"y_pos":0.0,"z_alt":-10.0,"vel_mag":5.0}"#.to_vec();
        let mac = key_for(UAV_A).mac(&payload);

        let engine = deployment.engine(store.clone(), clock());
        engine.register_session(&id, key_for(UAV_A));
        store.fail_next_appends(1);

        let err = engine.submit(&id, payload.clone(), &mac).await.unwrap_err();
        assert!(matches!(err, LedgerError::PersistenceFailure(_)));
        assert!(engine.is_halted());
        assert_eq!(store.len(), 1, "partial append rolled back");
        assert_eq!(
            engine.submit(&id, payload.clone(), &mac).await.unwrap_err(),
            LedgerError::EngineHalted
        );
        assert_eq!(engine.get_chain_tail(5).len(), 1, "reads still served");
        drop(engine);

        // Operator restarts the Leader; the client re-authenticates and retries.
        let engine = deployment.engine(store.clone(), clock());
        engine.register_session(&id, key_for(UAV_A));
        let block = engine.submit(&id, payload.clone(), &mac).await.unwrap();

        assert_eq!(block.index, 1);
        let stored = store.blocks();
        assert_eq!(stored.len(), 2);
        assert_eq!(
            stored.iter().filter(|b| b.telemetry_payload == payload).count(),
            1
        );
        assert!(deployment.verifier().verify_blocks(&stored).unwrap().is_valid());
    }

    #[tokio::test]
    async fn test_unacknowledged_torn_write_is_dropped_on_restart() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("epoh_ledger.jsonl");
        let deployment = Deployment::new();
        drop(deployment.engine(JsonLinesStore::open(&path).unwrap(), clock()));

        // Crash mid-append: half a record, no newline.
        let mut file = OpenOptions::new().append(true).open(&path).unwrap();
        file.write_all(br#"{"index":1,"timestamp":{"wall_mic"#).unwrap();
        drop(file);

        let report = deployment.verifier().verify_path(&path).unwrap();
        assert!(report.is_valid());
        assert_eq!(report.notes.len(), 1, "{:?}", report.notes);

        let engine = deployment.engine(JsonLinesStore::open(&path).unwrap(), clock());
        assert_eq!(engine.chain_len(), 1);
        let id = ClientId::new(UAV_A);
        engine.register_session(&id, key_for(UAV_A));
        let block = engine.submit(&id, b"retry".to_vec(), &key_for(UAV_A).mac(b"retry")).await.unwrap();
        assert_eq!(block.index, 1);
        drop(engine);

        let report = deployment.verifier().verify_path(&path).unwrap();
        assert!(report.is_valid(), "{report}");
        assert!(report.notes.is_empty());
        assert_eq!(report.blocks_checked, 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_writers_get_contiguous_indices() {
        const PER_CLIENT: usize = 25;
        let deployment = Deployment::new();
        let engine = Arc::new(deployment.engine(MemoryStore::new(), clock()));
        let leader = deployment.leader(engine.clone(), HandshakeConfig::default());
        let sessions = vec![
            login(&leader, &deployment.uav(UAV_A)).await,
            login(&leader, &deployment.uav(UAV_B)).await,
        ];

        let mut tasks = Vec::new();
        for session in sessions {
            let engine = engine.clone();
            tasks.push(tokio::spawn(async move {
                let mut indices = Vec::new();
                for seq in 0..PER_CLIENT {
                    let payload = format!(r#"{{"client":"{}","seq":{seq}}}"#, session.client_id)
                        .into_bytes();
                    let mac = session.session_key.mac(&payload);
                    let block = engine
                        .submit(&session.client_id, payload, &mac)
                        .await
                        .unwrap();
                    indices.push(block.index);
                }
                indices
            }));
        }

        let mut all = HashSet::new();
        for task in tasks {
            let indices = task.await.unwrap();
            assert!(indices.windows(2).all(|w| w[0] < w[1]), "per-client order kept");
            for index in indices {
                assert!(all.insert(index), "index {index} minted twice");
            }
        }

        let expected: HashSet<u64> = (1..=(2 * PER_CLIENT) as u64).collect();
        assert_eq!(all, expected);

        let chain = engine.get_chain_tail(usize::MAX);
        assert_eq!(chain.len(), 2 * PER_CLIENT + 1);
        assert!(deployment.verifier().verify_blocks(&chain).unwrap().is_valid());
    }
}
