//! Lease acquisition, renewal, and release against the shared store.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use ledgerctl_store::{
    DocumentStore, DocumentStoreError, DocumentStoreErrorKind, ScopedDocumentStore,
};
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::identity::HolderIdentity;
use crate::probe::ProcessProbe;
use crate::record::LeaseRecord;

/// Key the lease record is stored under within a scope.
pub const LEASE_KEY: &str = "lease";

/// Retry policy for lease acquisition.
#[derive(Clone, Debug)]
pub struct LeaseManagerConfig {
    /// Maximum acquisition attempts before surfacing a conflict.
    pub max_attempts: u32,

    /// Backoff before the second attempt; doubles per attempt.
    pub initial_backoff: Duration,

    /// Upper bound on the backoff between attempts.
    pub max_backoff: Duration,
}

impl Default for LeaseManagerConfig {
    fn default() -> Self {
        Self {
            max_attempts: 10,
            initial_backoff: Duration::from_millis(250),
            max_backoff: Duration::from_secs(5),
        }
    }
}

/// Factory for deployment-scoped leases.
///
/// Acquisition is race-free across processes: every write of the lease
/// record is fenced on the version observed during the read, so of any
/// number of concurrent acquirers exactly one wins and the rest observe
/// a conflict naming the winner.
#[derive(Clone, Debug)]
pub struct LeaseManager<S, P>
where
    S: ScopedDocumentStore,
    P: ProcessProbe + Clone,
{
    store: S,
    identity: HolderIdentity,
    probe: P,
    config: LeaseManagerConfig,
}

enum Attempt<S: DocumentStore> {
    Acquired(Lease<S>),
    /// Lost a fenced write to a concurrent acquirer; worth retrying
    /// immediately.
    LostRace,
}

impl<S, P> LeaseManager<S, P>
where
    S: ScopedDocumentStore,
    P: ProcessProbe + Clone,
{
    /// Creates a new `LeaseManager`.
    pub const fn new(
        store: S,
        identity: HolderIdentity,
        probe: P,
        config: LeaseManagerConfig,
    ) -> Self {
        Self {
            store,
            identity,
            probe,
            config,
        }
    }

    /// The identity leases acquired through this manager are stamped
    /// with.
    #[must_use]
    pub const fn identity(&self) -> &HolderIdentity {
        &self.identity
    }

    /// Acquires the lease for a deployment scope, retrying with bounded
    /// backoff while it is held by a live competing process.
    ///
    /// A lease whose recorded holder is no longer running is reclaimed
    /// regardless of its age. Acquiring a lease this process already
    /// holds renews it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Conflict`] naming the competing holder once the
    /// retry budget is exhausted, or [`Error::Store`] if the store
    /// fails.
    pub async fn acquire(&self, scope: impl Into<String>) -> Result<Lease<S::Scoped>> {
        let scope = scope.into();
        let store = self.store.scope(scope.clone());

        let mut backoff = self.config.initial_backoff;
        let mut last_conflict = None;

        for attempt in 1..=self.config.max_attempts {
            match self.try_acquire(&scope, &store).await {
                Ok(Attempt::Acquired(lease)) => return Ok(lease),
                Ok(Attempt::LostRace) => {
                    debug!(%scope, attempt, "lost lease acquisition race, retrying");
                    continue;
                }
                Err(conflict @ Error::Conflict { .. }) => {
                    debug!(%scope, attempt, %conflict, "lease busy");
                    last_conflict = Some(conflict);
                }
                Err(e) => return Err(e),
            }

            if attempt < self.config.max_attempts {
                tokio::time::sleep(backoff).await;
                backoff = (backoff * 2).min(self.config.max_backoff);
            }
        }

        Err(last_conflict.unwrap_or(Error::NotHeld { scope }))
    }

    async fn try_acquire(&self, scope: &str, store: &S::Scoped) -> Result<Attempt<S::Scoped>> {
        let existing = read_record(store).await?;

        let expected = match existing {
            None => 0,
            Some((record, version)) => {
                if record.holder == self.identity {
                    // Re-entrant: refresh our own record
                    version
                } else if self.holder_alive(&record.holder) {
                    let held_for_secs = record.age().num_seconds();
                    return Err(Error::Conflict {
                        scope: scope.to_string(),
                        holder: record.holder,
                        held_for_secs,
                    });
                } else {
                    info!(
                        scope,
                        holder = %record.holder,
                        "reclaiming stale lease from dead process"
                    );
                    version
                }
            }
        };

        let record = LeaseRecord::new(scope, self.identity.clone());
        let bytes = Bytes::from(serde_json::to_vec(&record)?);

        match store.put(LEASE_KEY, bytes, Some(expected)).await {
            Ok(_) => Ok(Attempt::Acquired(Lease {
                scope: scope.to_string(),
                holder: self.identity.clone(),
                acquired_at: record.acquired_at,
                store: store.clone(),
                released: Arc::new(AtomicBool::new(false)),
            })),
            Err(e) if e.kind() == DocumentStoreErrorKind::VersionConflict => {
                Ok(Attempt::LostRace)
            }
            Err(e) => Err(Error::Store(Box::new(e))),
        }
    }

    /// Liveness can only be probed on the host the holder recorded;
    /// remote holders are conservatively treated as alive.
    fn holder_alive(&self, holder: &HolderIdentity) -> bool {
        if holder.hostname() == self.identity.hostname() {
            holder.is_process_alive(&self.probe)
        } else {
            true
        }
    }
}

/// A held lease. Release it on every exit path; a handle dropped while
/// still held only logs a warning, leaving the record for the liveness
/// probe to classify.
#[derive(Debug)]
pub struct Lease<S: DocumentStore> {
    scope: String,
    holder: HolderIdentity,
    acquired_at: DateTime<Utc>,
    store: S,
    released: Arc<AtomicBool>,
}

impl<S: DocumentStore> Lease<S> {
    /// The scope this lease guards.
    #[must_use]
    pub fn scope(&self) -> &str {
        &self.scope
    }

    /// The identity holding this lease.
    #[must_use]
    pub const fn holder(&self) -> &HolderIdentity {
        &self.holder
    }

    /// When this lease was acquired.
    #[must_use]
    pub const fn acquired_at(&self) -> DateTime<Utc> {
        self.acquired_at
    }

    /// Re-stamps the stored record so observers of a conflict see
    /// recent activity.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotHeld`] if the record is gone or now names a
    /// different holder, or [`Error::Store`] if the store fails.
    pub async fn renew(&self) -> Result<()> {
        let Some((mut record, version)) = read_record(&self.store).await? else {
            return Err(Error::NotHeld {
                scope: self.scope.clone(),
            });
        };

        if record.holder != self.holder {
            return Err(Error::NotHeld {
                scope: self.scope.clone(),
            });
        }

        record.touch();
        let bytes = Bytes::from(serde_json::to_vec(&record)?);
        self.store
            .put(LEASE_KEY, bytes, Some(version))
            .await
            .map_err(|e| Error::Store(Box::new(e)))?;

        Ok(())
    }

    /// Releases the lease. Idempotent: releasing an unheld lease is a
    /// no-op, and a record now held by someone else is left untouched.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Store`] if the store fails; callers on cleanup
    /// paths should log this rather than let it mask the primary
    /// outcome.
    pub async fn release(&self) -> Result<()> {
        if self.released.swap(true, Ordering::SeqCst) {
            return Ok(());
        }

        match read_record(&self.store).await {
            Ok(Some((record, _))) if record.holder == self.holder => {
                self.store
                    .del(LEASE_KEY)
                    .await
                    .map_err(|e| Error::Store(Box::new(e)))?;
                debug!(scope = %self.scope, "released lease");
                Ok(())
            }
            Ok(Some((record, _))) => {
                // Never delete a lease we do not own
                warn!(
                    scope = %self.scope,
                    holder = %record.holder,
                    "lease now held by someone else; leaving it in place"
                );
                Ok(())
            }
            Ok(None) => Ok(()),
            Err(e) => {
                self.released.store(false, Ordering::SeqCst);
                Err(e)
            }
        }
    }
}

impl<S: DocumentStore> Drop for Lease<S> {
    fn drop(&mut self) {
        if !self.released.load(Ordering::SeqCst) {
            warn!(
                scope = %self.scope,
                "lease handle dropped without release; the record remains until reclaimed"
            );
        }
    }
}

async fn read_record<S: DocumentStore>(store: &S) -> Result<Option<(LeaseRecord, u64)>> {
    let Some(document) = store
        .get(LEASE_KEY)
        .await
        .map_err(|e| Error::Store(Box::new(e)))?
    else {
        return Ok(None);
    };

    let record: LeaseRecord = serde_json::from_slice(&document.bytes)?;
    Ok(Some((record, document.version)))
}
