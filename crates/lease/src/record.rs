//! The persisted lease record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::identity::HolderIdentity;

/// The document written to the shared store while a lease is held.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct LeaseRecord {
    /// The deployment scope this lease guards.
    pub scope: String,

    /// Who holds the lease.
    pub holder: HolderIdentity,

    /// When the lease was first acquired.
    pub acquired_at: DateTime<Utc>,

    /// When the lease was last renewed.
    pub renewed_at: DateTime<Utc>,
}

impl LeaseRecord {
    /// Creates a fresh record stamped with the current time.
    #[must_use]
    pub fn new(scope: impl Into<String>, holder: HolderIdentity) -> Self {
        let now = Utc::now();
        Self {
            scope: scope.into(),
            holder,
            acquired_at: now,
            renewed_at: now,
        }
    }

    /// How long ago the lease was acquired.
    #[must_use]
    pub fn age(&self) -> chrono::Duration {
        Utc::now() - self.acquired_at
    }

    /// Re-stamps the renewal time.
    pub fn touch(&mut self) {
        self.renewed_at = Utc::now();
    }
}
