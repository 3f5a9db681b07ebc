//! # Ledger Tampering
//!
//! Offline edits to a persisted chain by someone without the Leader's
//! signing key, and what the verifier makes of each.

#[cfg(test)]
mod tests {
    use epoh_02_ledger::{mint_block, BlockSealer};
    use epoh_03_chain_verifier::ViolationKind;
    use shared_types::{
        compute_block_hash, BlockTimestamp, ClientId, HashChainBlock, GENESIS_PAYLOAD,
        GENESIS_PREV_HASH,
    };

    use crate::fixtures::{Deployment, LEADER, T0, UAV_A, UAV_B};

    const LEN: u64 = 6;

    fn ts(i: u64) -> BlockTimestamp {
        BlockTimestamp {
            wall_micros: T0 + i * 2_000_000,
            monotonic_micros: i * 2_000_000,
        }
    }

    fn chain_with(sealer: &BlockSealer, stamps: &[BlockTimestamp]) -> Vec<HashChainBlock> {
        let mut blocks: Vec<HashChainBlock> = Vec::new();
        for (i, stamp) in stamps.iter().enumerate() {
            let i = i as u64;
            let (client, payload) = if i == 0 {
                (ClientId::new(LEADER), GENESIS_PAYLOAD.to_vec())
            } else {
                let client = if i % 2 == 0 { UAV_B } else { UAV_A };
                let payload = format!(r#"{{"x_pos":{i}.0,"y_pos":0.0,"z_alt":-10.0,"vel_mag":5.0}}"#);
                (ClientId::new(client), payload.into_bytes())
            };
            let prev = blocks.last().map_or(GENESIS_PREV_HASH, |b| b.block_hash);
            blocks.push(mint_block(i, *stamp, client, payload, prev, sealer).unwrap());
        }
        blocks
    }

    fn chain(sealer: &BlockSealer) -> Vec<HashChainBlock> {
        let stamps: Vec<_> = (0..LEN).map(ts).collect();
        chain_with(sealer, &stamps)
    }

    #[test]
    fn test_any_single_payload_byte_flip_is_located() {
        let deployment = Deployment::new();
        let verifier = deployment.verifier();
        let original = chain(&deployment.sealer());
        assert!(verifier.verify_blocks(&original).unwrap().is_valid());

        for target in 0..LEN {
            let len = original[target as usize].telemetry_payload.len();
            for offset in [0, len / 2, len - 1] {
                let mut blocks = original.clone();
                blocks[target as usize].telemetry_payload[offset] ^= 0x20;

                let report = verifier.verify_blocks(&blocks).unwrap();
                let mut expected = vec![(target, ViolationKind::HashMismatch)];
                if target + 1 < LEN {
                    expected.push((target + 1, ViolationKind::BrokenLink));
                }
                assert_eq!(
                    report.summary(),
                    expected,
                    "flip at block {target} offset {offset}"
                );
            }
        }
    }

    #[test]
    fn test_rehashed_forgery_fails_seals() {
        let deployment = Deployment::new();
        let mut blocks = chain(&deployment.sealer());

        // Rewrite block 2 and patch every hash after it so all links hold.
        blocks[2].telemetry_payload = br#"{"x_pos":999.0,"y_pos":0.0,"z_alt":-10.0,"vel_mag":5.0}"#.to_vec();
        for i in 2..blocks.len() {
            if i > 2 {
                blocks[i].prev_hash = blocks[i - 1].block_hash;
            }
            let b = &blocks[i];
            let hash =
                compute_block_hash(b.index, &b.timestamp, &b.client_id, &b.telemetry_payload, &b.prev_hash);
            blocks[i].block_hash = hash;
        }

        let report = deployment.verifier().verify_blocks(&blocks).unwrap();
        let expected: Vec<_> = (2..LEN).map(|i| (i, ViolationKind::SignatureInvalid)).collect();
        assert_eq!(report.summary(), expected);
    }

    #[test]
    fn test_deleted_block_leaves_gap() {
        let deployment = Deployment::new();
        let mut blocks = chain(&deployment.sealer());
        blocks.remove(3);

        let report = deployment.verifier().verify_blocks(&blocks).unwrap();
        assert!(report.violations_of(ViolationKind::IndexGap).any(|v| v.index == 4));
        assert!(report.violations_of(ViolationKind::BrokenLink).any(|v| v.index == 4));
        assert_eq!(report.violations_of(ViolationKind::HashMismatch).count(), 0);
        assert_eq!(report.violations_of(ViolationKind::SignatureInvalid).count(), 0);
    }

    #[test]
    fn test_backdated_block_is_time_regression() {
        let deployment = Deployment::new();
        let mut stamps: Vec<_> = (0..LEN).map(ts).collect();
        stamps[4] = BlockTimestamp {
            wall_micros: T0,
            monotonic_micros: stamps[4].monotonic_micros,
        };

        let blocks = chain_with(&deployment.sealer(), &stamps);
        let report = deployment.verifier().verify_blocks(&blocks).unwrap();
        assert_eq!(report.summary(), vec![(4, ViolationKind::TimeRegression)]);
    }

    #[test]
    fn test_chain_sealed_by_other_leader_rejected() {
        let deployment = Deployment::new();
        let rogue = Deployment::new();
        let blocks = chain(&rogue.sealer());

        let report = deployment.verifier().verify_blocks(&blocks).unwrap();
        assert_eq!(
            report.violations_of(ViolationKind::SignatureInvalid).count(),
            LEN as usize
        );
        assert_eq!(report.violations.len(), LEN as usize);
    }
}
