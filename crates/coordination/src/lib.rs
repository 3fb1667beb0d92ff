//! Control-plane coordination for deployment operations.
//!
//! Ties the lease subsystem to the registry document: a task acquires
//! the deployment's lease, runs its mutations through
//! [`RegistryManager::modify`], and releases the lease on every exit
//! path. Mutations are all-or-nothing and persists are version-fenced,
//! so a crash mid-operation leaves the registry exactly as last
//! successfully written and a stale lease for the next invocation to
//! reclaim.
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

mod error;
mod manager;
mod task;
mod validator;

pub use error::{Error, Result};
pub use manager::{REGISTRY_KEY, RegistryManager};
pub use task::LeaseTask;
pub use validator::{StateConstraints, StateValidator};
