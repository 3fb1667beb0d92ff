use ledgerctl_registry::{ComponentState, ComponentType};
use thiserror::Error;

/// Result type for coordination operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in this crate.
#[derive(Debug, Error)]
pub enum Error {
    /// The registry document changed under us. Persisting is fenced on
    /// the version read at load time, so this means a mutation was
    /// attempted without holding the deployment's lease.
    #[error("registry was modified concurrently; a mutation ran without the lease")]
    Concurrency,

    /// Failed to (de)serialize the registry document.
    #[error("error encoding registry document: {0}")]
    Codec(#[from] serde_json::Error),

    /// A component's current state violates the operation's
    /// constraints.
    #[error(
        "{component_type} component {id} is {current}, which is not permitted here ({constraints})"
    )]
    InvalidState {
        /// The component's type.
        component_type: ComponentType,

        /// The offending component id.
        id: u32,

        /// The component's current state.
        current: ComponentState,

        /// Rendered accepted/excluded constraint sets.
        constraints: String,
    },

    /// A lease operation failed.
    #[error(transparent)]
    Lease(#[from] ledgerctl_lease::Error),

    /// The registry document does not exist yet for this scope.
    #[error("no registry document exists for this deployment")]
    NotInitialized,

    /// A registry mutation was rejected.
    #[error(transparent)]
    Registry(#[from] ledgerctl_registry::Error),

    /// The underlying document store failed.
    #[error("store error: {0}")]
    Store(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// A task-supplied mutator failed for its own reasons.
    #[error("{0}")]
    Task(String),
}
