//! Verification results.

use std::fmt;

use serde::Serialize;

/// Kind of integrity failure found at one record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ViolationKind {
    /// Stored `block_hash` differs from the recomputed hash.
    HashMismatch,
    /// `index` is not the predecessor's index plus one.
    IndexGap,
    /// Wall time is earlier than the predecessor's.
    TimeRegression,
    /// Seal missing, from the wrong signer, unverifiable, or for an unknown client.
    SignatureInvalid,
    /// First record is not a genesis block.
    GenesisMismatch,
    /// `prev_hash` does not match the predecessor's recomputed hash.
    BrokenLink,
    /// A complete line that is not a block record.
    MalformedRecord,
}

impl fmt::Display for ViolationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::HashMismatch => "HashMismatch",
            Self::IndexGap => "IndexGap",
            Self::TimeRegression => "TimeRegression",
            Self::SignatureInvalid => "SignatureInvalid",
            Self::GenesisMismatch => "GenesisMismatch",
            Self::BrokenLink => "BrokenLink",
            Self::MalformedRecord => "MalformedRecord",
        };
        f.write_str(name)
    }
}

/// One failed check, tagged with the offending block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IntegrityViolation {
    /// Block index as stored, or the record position for malformed lines.
    pub index: u64,
    /// 1-based line number in the ledger file.
    pub line: u64,
    pub kind: ViolationKind,
    pub detail: String,
}

impl fmt::Display for IntegrityViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "index {} (line {}): {}: {}",
            self.index, self.line, self.kind, self.detail
        )
    }
}

/// Outcome of one verification pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct VerificationReport {
    /// Block records examined, malformed lines excluded.
    pub blocks_checked: u64,
    /// Whether seals were checked against a keyring.
    pub signatures_checked: bool,
    pub violations: Vec<IntegrityViolation>,
    /// Observations that are not violations (skipped checks, truncated tail).
    pub notes: Vec<String>,
}

impl VerificationReport {
    /// `true` when no violation was found.
    pub fn is_valid(&self) -> bool {
        self.violations.is_empty()
    }

    /// Violations of one kind.
    pub fn violations_of(&self, kind: ViolationKind) -> impl Iterator<Item = &IntegrityViolation> {
        self.violations.iter().filter(move |v| v.kind == kind)
    }

    /// `(index, kind)` pairs in report order.
    pub fn summary(&self) -> Vec<(u64, ViolationKind)> {
        self.violations.iter().map(|v| (v.index, v.kind)).collect()
    }
}

fn blocks(n: u64) -> String {
    if n == 1 {
        "1 block".to_string()
    } else {
        format!("{n} blocks")
    }
}

impl fmt::Display for VerificationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_valid() {
            return write!(f, "chain valid, {}", blocks(self.blocks_checked));
        }
        for violation in &self.violations {
            writeln!(f, "{violation}")?;
        }
        let count = self.violations.len();
        write!(
            f,
            "chain INVALID: {count} violation{} in {}",
            if count == 1 { "" } else { "s" },
            blocks(self.blocks_checked)
        )
    }
}
