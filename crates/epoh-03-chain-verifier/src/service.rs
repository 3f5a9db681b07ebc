//! # Chain Verifier Service
//!
//! Walks the ledger record by record, keeping only the previous block's
//! recomputed hash, index and timestamp.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::sync::Arc;

use epoh_01_authentication::Keyring;
use shared_crypto::{scheme_for, AuthScheme};
use shared_types::{BlockTimestamp, Hash, HashChainBlock, GENESIS_PREV_HASH};
use tracing::{debug, warn};

use crate::adapters::reader::{LedgerReader, Record};
use crate::domain::errors::VerifierError;
use crate::domain::report::{IntegrityViolation, VerificationReport, ViolationKind};

const NO_KEYRING_NOTE: &str = "signatures not checked: no keyring supplied";

/// Read-only auditor for persisted ledgers.
#[derive(Debug, Default)]
pub struct ChainVerifier {
    keys: Option<(Keyring, Arc<dyn AuthScheme>)>,
}

impl ChainVerifier {
    /// Verifier that checks structure only.
    pub fn new() -> Self {
        Self::default()
    }

    /// Verifier that also checks block seals and client registration.
    pub fn with_keyring(keyring: Keyring) -> Self {
        let scheme = scheme_for(keyring.scheme());
        Self {
            keys: Some((keyring, scheme)),
        }
    }

    /// Verify the ledger file at `path`.
    pub fn verify_path(&self, path: &Path) -> Result<VerificationReport, VerifierError> {
        let origin = path.display().to_string();
        let file = File::open(path).map_err(|source| VerifierError::Io {
            path: origin.clone(),
            source,
        })?;
        self.verify_reader(BufReader::new(file), &origin)
    }

    /// Verify a ledger streamed from `reader`; `origin` names it in errors.
    pub fn verify_reader<R: BufRead>(
        &self,
        reader: R,
        origin: &str,
    ) -> Result<VerificationReport, VerifierError> {
        let mut walk = ChainWalk::new(self);
        for record in LedgerReader::new(reader) {
            let record = record.map_err(|source| VerifierError::Io {
                path: origin.to_string(),
                source,
            })?;
            walk.push(record);
        }
        walk.finish(origin)
    }

    /// Verify blocks already in memory.
    pub fn verify_blocks(
        &self,
        blocks: &[HashChainBlock],
    ) -> Result<VerificationReport, VerifierError> {
        let mut walk = ChainWalk::new(self);
        for (pos, block) in blocks.iter().enumerate() {
            walk.push(Record::Block {
                line: pos as u64 + 1,
                block: block.clone(),
            });
        }
        walk.finish("<memory>")
    }

    fn check_seal(&self, block: &HashChainBlock) -> Option<String> {
        let (keyring, scheme) = self.keys.as_ref()?;
        let seal = &block.mac_or_sig;
        if seal.signer != *keyring.leader_id() {
            return Some(format!(
                "sealed by {}, expected Leader {}",
                seal.signer,
                keyring.leader_id()
            ));
        }
        if !keyring.is_known(&block.client_id) {
            return Some(format!("client {} is not registered", block.client_id));
        }
        let message = HashChainBlock::seal_message(&block.block_hash, &block.client_id);
        match scheme.verify(keyring.leader_public(), &message, &seal.signature) {
            Ok(()) => None,
            Err(e) => Some(format!("seal does not verify: {e}")),
        }
    }
}

/// What the next block is compared against.
struct Predecessor {
    index: u64,
    recomputed: Hash,
    timestamp: BlockTimestamp,
}

struct ChainWalk<'a> {
    verifier: &'a ChainVerifier,
    report: VerificationReport,
    /// Records seen so far, malformed lines included.
    position: u64,
    /// `None` at the start and right after a malformed record.
    prev: Option<Predecessor>,
}

impl<'a> ChainWalk<'a> {
    fn new(verifier: &'a ChainVerifier) -> Self {
        let mut report = VerificationReport {
            signatures_checked: verifier.keys.is_some(),
            ..Default::default()
        };
        if verifier.keys.is_none() {
            report.notes.push(NO_KEYRING_NOTE.to_string());
        }
        Self {
            verifier,
            report,
            position: 0,
            prev: None,
        }
    }

    fn push(&mut self, record: Record) {
        match record {
            Record::Block { line, block } => self.check_block(line, &block),
            Record::Malformed { line, reason } => {
                self.violate(self.position, line, ViolationKind::MalformedRecord, reason);
                self.position += 1;
                self.prev = None;
            }
            Record::TruncatedTail { line, bytes } => {
                self.report.notes.push(format!(
                    "line {line}: truncated trailing record ({bytes} bytes), likely an append in progress"
                ));
            }
        }
    }

    fn check_block(&mut self, line: u64, block: &HashChainBlock) {
        let index = block.index;
        let recomputed = block.recompute_hash();

        if self.position == 0 {
            if index != 0 {
                self.violate(
                    index,
                    line,
                    ViolationKind::GenesisMismatch,
                    format!("first block has index {index}"),
                );
            }
            if block.prev_hash != GENESIS_PREV_HASH {
                self.violate(
                    index,
                    line,
                    ViolationKind::GenesisMismatch,
                    format!("genesis prev_hash is {}", hex::encode(block.prev_hash)),
                );
            }
        }

        if recomputed != block.block_hash {
            self.violate(
                index,
                line,
                ViolationKind::HashMismatch,
                format!(
                    "stored {} recomputed {}",
                    hex::encode(block.block_hash),
                    hex::encode(recomputed)
                ),
            );
        }

        if let Some(prev) = &self.prev {
            let (prev_index, prev_hash, prev_time) = (prev.index, prev.recomputed, prev.timestamp);
            if block.prev_hash != prev_hash {
                self.violate(
                    index,
                    line,
                    ViolationKind::BrokenLink,
                    format!(
                        "prev_hash {} does not match block {prev_index} ({})",
                        hex::encode(block.prev_hash),
                        hex::encode(prev_hash)
                    ),
                );
            }
            if prev_index.checked_add(1) != Some(index) {
                self.violate(
                    index,
                    line,
                    ViolationKind::IndexGap,
                    format!("follows index {prev_index}"),
                );
            }
            if !block.timestamp.is_not_before(&prev_time) {
                self.violate(
                    index,
                    line,
                    ViolationKind::TimeRegression,
                    format!(
                        "wall time {} before predecessor {}",
                        block.timestamp.wall_micros, prev_time.wall_micros
                    ),
                );
            }
        }

        if let Some(reason) = self.verifier.check_seal(block) {
            self.violate(index, line, ViolationKind::SignatureInvalid, reason);
        }

        debug!(index, line, "checked block");
        self.report.blocks_checked += 1;
        self.position += 1;
        self.prev = Some(Predecessor {
            index,
            recomputed,
            timestamp: block.timestamp,
        });
    }

    fn violate(&mut self, index: u64, line: u64, kind: ViolationKind, detail: String) {
        warn!(index, line, kind = %kind, detail = %detail, "integrity violation");
        self.report.violations.push(IntegrityViolation {
            index,
            line,
            kind,
            detail,
        });
    }

    fn finish(self, origin: &str) -> Result<VerificationReport, VerifierError> {
        if self.position == 0 {
            return Err(VerifierError::Empty {
                origin: origin.to_string(),
            });
        }
        Ok(self.report)
    }
}
