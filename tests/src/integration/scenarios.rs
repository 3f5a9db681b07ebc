//! # End-to-End Scenarios
//!
//! Handshake → engine → JSONL file → offline verifier, with nothing shared
//! between the writer and the auditor except the file and the keyring.

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::Path;
    use std::sync::Arc;

    use epoh_01_authentication::HandshakeConfig;
    use epoh_02_ledger::{JsonLinesStore, LedgerApi, LedgerError, LedgerStore};
    use epoh_03_chain_verifier::ViolationKind;
    use shared_types::{ClientId, HashChainBlock, TelemetrySample};

    use crate::fixtures::{clock, login, Deployment, UAV_A, UAV_B};

    fn sample(x: f64) -> Vec<u8> {
        TelemetrySample {
            x_pos: x,
            y_pos: 0.0,
            z_alt: -10.0,
            vel_mag: 5.0,
            status: None,
        }
        .to_payload()
        .unwrap()
    }

    fn read_blocks(path: &Path) -> Vec<HashChainBlock> {
        fs::read_to_string(path)
            .unwrap()
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect()
    }

    fn write_blocks(path: &Path, blocks: &[HashChainBlock]) {
        let mut text = String::new();
        for block in blocks {
            text.push_str(&serde_json::to_string(block).unwrap());
            text.push('\n');
        }
        fs::write(path, text).unwrap();
    }

    #[test]
    fn scenario_a_fresh_ledger_is_valid() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("epoh_ledger.jsonl");
        let deployment = Deployment::new();

        let engine = deployment.engine(JsonLinesStore::open(&path).unwrap(), clock());
        assert_eq!(engine.chain_len(), 1);
        drop(engine);

        let report = deployment.verifier().verify_path(&path).unwrap();
        assert!(report.is_valid());
        assert_eq!(report.blocks_checked, 1);
        assert_eq!(report.to_string(), "chain valid, 1 block");
    }

    #[tokio::test]
    async fn scenario_b_payload_tamper_is_located() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("epoh_ledger.jsonl");
        let deployment = Deployment::new();

        let engine = Arc::new(deployment.engine(JsonLinesStore::open(&path).unwrap(), clock()));
        let leader = deployment.leader(engine.clone(), HandshakeConfig::default());
        let session = login(&leader, &deployment.uav(UAV_A)).await;
        for x in 1..=4 {
            let payload = sample(x as f64);
            let mac = session.session_key.mac(&payload);
            engine.submit(&session.client_id, payload, &mac).await.unwrap();
        }
        assert_eq!(engine.chain_len(), 5);
        drop(leader);
        drop(engine);

        assert!(deployment.verifier().verify_path(&path).unwrap().is_valid());

        let mut blocks = read_blocks(&path);
        blocks[2].telemetry_payload[0] ^= 0x01;
        write_blocks(&path, &blocks);

        let report = deployment.verifier().verify_path(&path).unwrap();
        assert_eq!(
            report.summary(),
            vec![(2, ViolationKind::HashMismatch), (3, ViolationKind::BrokenLink)]
        );
        assert_eq!(report.violations_of(ViolationKind::HashMismatch).count(), 1);
        assert_eq!(report.blocks_checked, 5);
    }

    #[tokio::test]
    async fn scenario_c_submit_without_handshake_is_refused() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("epoh_ledger.jsonl");
        let deployment = Deployment::new();
        let engine = deployment.engine(JsonLinesStore::open(&path).unwrap(), clock());
        let before = fs::read(&path).unwrap();

        let err = engine
            .submit(&ClientId::new(UAV_A), sample(1.0), &[0u8; 32])
            .await
            .unwrap_err();

        assert_eq!(err, LedgerError::NoActiveSession(ClientId::new(UAV_A)));
        assert_eq!(engine.chain_len(), 1);
        assert_eq!(fs::read(&path).unwrap(), before);
    }

    #[tokio::test]
    async fn scenario_d_concurrent_clients_share_one_chain() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("epoh_ledger.jsonl");
        let deployment = Deployment::new();

        let engine = Arc::new(deployment.engine(JsonLinesStore::open(&path).unwrap(), clock()));
        let leader = deployment.leader(engine.clone(), HandshakeConfig::default());
        let session_a = login(&leader, &deployment.uav(UAV_A)).await;
        let session_b = login(&leader, &deployment.uav(UAV_B)).await;

        let mut tasks = Vec::new();
        for (session, x) in [(session_a.clone(), 1.0), (session_b.clone(), 2.0)] {
            let engine = engine.clone();
            tasks.push(tokio::spawn(async move {
                let payload = sample(x);
                let mac = session.session_key.mac(&payload);
                let result = engine.submit(&session.client_id, payload, &mac).await;
                (session.client_id, mac, result)
            }));
        }
        let mut submitted = Vec::new();
        for task in tasks {
            let (client_id, mac, result) = task.await.unwrap();
            result.unwrap();
            submitted.push((client_id, mac));
        }

        let blocks = engine.get_chain_tail(10);
        let indices: Vec<u64> = blocks.iter().map(|b| b.index).collect();
        assert_eq!(indices, vec![0, 1, 2]);
        for pair in blocks.windows(2) {
            assert_eq!(pair[1].prev_hash, pair[0].block_hash);
        }

        // The MAC each client sent matches its stored payload under its own
        // session key only.
        for (own, other) in [(&session_a, &session_b), (&session_b, &session_a)] {
            let block = blocks
                .iter()
                .find(|b| b.client_id == own.client_id)
                .unwrap();
            let (_, sent_mac) = submitted
                .iter()
                .find(|(id, _)| *id == own.client_id)
                .unwrap();
            assert!(own.session_key.verify(&block.telemetry_payload, sent_mac).is_ok());
            assert!(other.session_key.verify(&block.telemetry_payload, sent_mac).is_err());
        }
        drop(leader);
        drop(engine);

        let store = JsonLinesStore::open(&path).unwrap();
        assert_eq!(store.len(), 3);
        let report = deployment.verifier().verify_path(&path).unwrap();
        assert!(report.is_valid(), "{report}");
        assert!(report.signatures_checked);
    }
}
