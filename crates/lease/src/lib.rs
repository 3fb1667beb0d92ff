//! Lease-based distributed mutual exclusion for deployment operations.
//!
//! Multiple CLI invocations, possibly on different hosts, may target the
//! same deployment concurrently. A lease is a single named record in the
//! shared document store; whoever holds it may mutate that deployment's
//! configuration. Staleness is decided by probing the recorded holder
//! process, so a crashed invocation never wedges the deployment.
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

mod error;
mod identity;
mod manager;
mod probe;
mod record;

pub use error::{Error, Result};
pub use identity::HolderIdentity;
pub use manager::{LEASE_KEY, Lease, LeaseManager, LeaseManagerConfig};
pub use probe::{ProcessProbe, SignalProbe};
pub use record::LeaseRecord;
