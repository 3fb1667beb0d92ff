use ledgerctl_store::{DocumentStoreError, DocumentStoreErrorKind};
use thiserror::Error;

/// Errors that can occur in this crate.
#[derive(Clone, Debug, Error)]
pub enum Error {
    /// A fenced put observed a different version than expected.
    #[error("version conflict: expected {expected}, found {found}")]
    VersionConflict {
        /// The version the caller expected.
        expected: u64,

        /// The version actually stored (0 if absent).
        found: u64,
    },
}

impl DocumentStoreError for Error {
    fn kind(&self) -> DocumentStoreErrorKind {
        match self {
            Self::VersionConflict { .. } => DocumentStoreErrorKind::VersionConflict,
        }
    }
}
