use crate::component::ComponentType;
use crate::state::ComponentState;
use thiserror::Error;

/// Result type for registry operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in this crate.
#[derive(Clone, Debug, Error)]
pub enum Error {
    /// A record with this id already exists for the type.
    #[error("{component_type} component {id} already exists")]
    AlreadyExists {
        /// The component's type.
        component_type: ComponentType,

        /// The duplicate id.
        id: u32,
    },

    /// A state change was requested that the lifecycle does not allow.
    #[error("{component_type} component {id} cannot move from {from} to {to}")]
    IllegalTransition {
        /// The component's type.
        component_type: ComponentType,

        /// The offending id.
        id: u32,

        /// The component's current state.
        from: ComponentState,

        /// The requested state.
        to: ComponentState,
    },

    /// No record with this id exists for the type.
    #[error("{component_type} component {id} not found")]
    NotFound {
        /// The component's type.
        component_type: ComponentType,

        /// The missing id.
        id: u32,
    },

    /// The record references a cluster the registry does not know.
    #[error("cluster '{0}' is not registered")]
    UnknownCluster(String),
}
