use crate::identity::HolderIdentity;
use thiserror::Error;

/// Result type for lease operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in this crate.
#[derive(Debug, Error)]
pub enum Error {
    /// The lease is held by a live process belonging to someone else.
    #[error("lease on '{scope}' is held by {holder} (held for {held_for_secs}s)")]
    Conflict {
        /// The scope the lease guards.
        scope: String,

        /// The identity currently holding the lease.
        holder: HolderIdentity,

        /// How long the holder has held the lease, in seconds.
        held_for_secs: i64,
    },

    /// Failed to (de)serialize a lease record.
    #[error("error encoding lease record: {0}")]
    Codec(#[from] serde_json::Error),

    /// A required identity field was empty or zero.
    #[error("missing identity field: {0}")]
    MissingField(&'static str),

    /// The lease was lost to another holder between renewals.
    #[error("lease on '{scope}' is no longer held by this process")]
    NotHeld {
        /// The scope the lease guards.
        scope: String,
    },

    /// The underlying document store failed.
    #[error("store error: {0}")]
    Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}
