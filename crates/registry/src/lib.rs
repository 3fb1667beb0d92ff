//! The component registry: the authoritative, versioned inventory of
//! everything deployed for a ledger network.
//!
//! The registry is one document per deployment. Component records are a
//! tagged union keyed by component type, with ids unique per type and
//! deterministic rendered names, so repeated topology computation is
//! idempotent.
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

mod component;
mod error;
mod factory;
mod registry;
mod state;

pub use component::{
    BaseComponent, BlockNodeComponent, ComponentRecord, ComponentType, ConsensusNodeComponent,
    EnvoyProxyComponent, HaProxyComponent, MirrorNodeComponent, MirrorNodeExplorerComponent,
    RelayComponent,
};
pub use error::{Error, Result};
pub use factory::ComponentFactory;
pub use registry::{ClusterMetadata, ComponentRegistry, SCHEMA_VERSION};
pub use state::ComponentState;
