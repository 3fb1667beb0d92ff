use ledgerctl_store::{DocumentStoreError, DocumentStoreErrorKind};
use thiserror::Error;

/// Errors that can occur in this crate.
#[derive(Debug, Error)]
pub enum Error {
    /// Failed to decode an on-disk document envelope.
    #[error("error decoding document: {0}")]
    Decode(#[from] ciborium::de::Error<std::io::Error>),

    /// Failed to encode a document envelope.
    #[error("error encoding document: {0}")]
    Encode(#[from] ciborium::ser::Error<std::io::Error>),

    /// IO operation failed.
    #[error("{0}: {1}")]
    Io(&'static str, #[source] std::io::Error),

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
            Self::Io(..) => DocumentStoreErrorKind::Io,
            Self::Decode(_) | Self::Encode(_) => DocumentStoreErrorKind::Other,
        }
    }
}
