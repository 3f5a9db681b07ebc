use epoh_01_authentication::KeyringError;
use thiserror::Error;

/// Reasons a ledger could not be audited at all.
///
/// Integrity problems inside a readable ledger are not errors; they are
/// [`IntegrityViolation`](crate::IntegrityViolation)s in the report.
#[derive(Debug, Error)]
pub enum VerifierError {
    #[error("cannot read ledger {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("ledger {origin} contains no blocks")]
    Empty { origin: String },

    #[error("cannot load keyring: {0}")]
    Keyring(#[from] KeyringError),
}
