//! # Block Minting
//!
//! Pure construction of the next block. Sequencing (which index, which
//! predecessor) is the caller's job and happens under the engine's write lock.

use std::sync::Arc;

use shared_crypto::{AuthScheme, CryptoError, SecretKeyBytes};
use shared_types::{compute_block_hash, BlockSeal, BlockTimestamp, ClientId, Hash, HashChainBlock};

/// Produces `mac_or_sig` with the Leader's long-term key.
#[derive(Debug, Clone)]
pub struct BlockSealer {
    scheme: Arc<dyn AuthScheme>,
    leader_id: ClientId,
    secret: SecretKeyBytes,
}

impl BlockSealer {
    /// Sealer for the given Leader identity.
    pub fn new(scheme: Arc<dyn AuthScheme>, leader_id: ClientId, secret: SecretKeyBytes) -> Self {
        Self {
            scheme,
            leader_id,
            secret,
        }
    }

    /// Identity named in every seal.
    pub fn leader_id(&self) -> &ClientId {
        &self.leader_id
    }

    /// Sign `block_hash ‖ client_id`.
    pub fn seal(&self, block_hash: &Hash, client_id: &ClientId) -> Result<BlockSeal, CryptoError> {
        let signature = self
            .scheme
            .sign(&self.secret, &HashChainBlock::seal_message(block_hash, client_id))?;
        Ok(BlockSeal {
            signer: self.leader_id.clone(),
            signature,
        })
    }
}

/// Build and seal a block.
pub fn mint_block(
    index: u64,
    timestamp: BlockTimestamp,
    client_id: ClientId,
    telemetry_payload: Vec<u8>,
    prev_hash: Hash,
    sealer: &BlockSealer,
) -> Result<HashChainBlock, CryptoError> {
    let block_hash = compute_block_hash(index, &timestamp, &client_id, &telemetry_payload, &prev_hash);
    let mac_or_sig = sealer.seal(&block_hash, &client_id)?;
    Ok(HashChainBlock {
        index,
        timestamp,
        client_id,
        telemetry_payload,
        prev_hash,
        block_hash,
        mac_or_sig,
    })
}

/// Check that `blocks` form an unbroken chain from genesis.
///
/// This is the Leader's startup sanity check, not an audit: payload hashes
/// and seals are left to the independent verifier.
pub fn check_linkage(blocks: &[HashChainBlock]) -> Result<(), (u64, String)> {
    let mut prev: Option<&HashChainBlock> = None;
    for (position, block) in blocks.iter().enumerate() {
        let position = position as u64;
        if block.index != position {
            return Err((position, format!("index {} at position {position}", block.index)));
        }
        let expected_prev = prev.map_or(shared_types::GENESIS_PREV_HASH, |p| p.block_hash);
        if block.prev_hash != expected_prev {
            return Err((position, "prev_hash does not link".to_string()));
        }
        if let Some(p) = prev {
            if !block.timestamp.is_not_before(&p.timestamp) {
                return Err((position, "timestamp regresses".to_string()));
            }
        }
        prev = Some(block);
    }
    Ok(())
}
