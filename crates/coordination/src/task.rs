//! Adapter for slotting lease acquisition into a sequential task
//! pipeline.
//!
//! The wider CLI runs operations as ordered task lists with their own
//! progress rendering. This adapter exposes plain `acquire`/`release`
//! functions with no pipeline-framework types in the signature, so the
//! first task of a mutating operation can take the lease and the
//! cleanup path can always drop it.

use ledgerctl_lease::{Lease, LeaseManager, ProcessProbe};
use ledgerctl_store::ScopedDocumentStore;
use tokio::sync::Mutex;
use tracing::warn;

use crate::error::Result;

/// Holds at most one lease for a deployment scope on behalf of a task
/// pipeline.
pub struct LeaseTask<S, P>
where
    S: ScopedDocumentStore,
    P: ProcessProbe + Clone,
{
    manager: LeaseManager<S, P>,
    scope: String,
    lease: Mutex<Option<Lease<S::Scoped>>>,
}

impl<S, P> LeaseTask<S, P>
where
    S: ScopedDocumentStore,
    P: ProcessProbe + Clone,
{
    /// Creates a task for the given scope.
    pub fn new(manager: LeaseManager<S, P>, scope: impl Into<String>) -> Self {
        Self {
            manager,
            scope: scope.into(),
            lease: Mutex::new(None),
        }
    }

    /// The scope this task guards.
    #[must_use]
    pub fn scope(&self) -> &str {
        &self.scope
    }

    /// Whether a lease is currently held.
    pub async fn is_held(&self) -> bool {
        self.lease.lock().await.is_some()
    }

    /// Acquires the lease. A no-op when already held.
    ///
    /// # Errors
    ///
    /// Propagates lease acquisition failures, conflicts included.
    pub async fn acquire(&self) -> Result<()> {
        let mut slot = self.lease.lock().await;
        if slot.is_none() {
            *slot = Some(self.manager.acquire(self.scope.clone()).await?);
        }
        Ok(())
    }

    /// Releases the held lease, if any. Safe to call from every exit
    /// path; release failures are logged and swallowed so they never
    /// mask the operation's primary outcome.
    pub async fn release(&self) {
        let lease = self.lease.lock().await.take();
        if let Some(lease) = lease {
            if let Err(e) = lease.release().await {
                warn!(scope = %self.scope, error = %e, "failed to release lease");
            }
        }
    }
}
