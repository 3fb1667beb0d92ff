//! Abstract interface for the shared versioned document store backing
//! deployment coordination.
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

use std::error::Error;
use std::fmt::{self, Debug};

use async_trait::async_trait;
use bytes::Bytes;

/// Marker trait for `DocumentStore` errors.
pub trait DocumentStoreError: Debug + Error + Send + Sync + 'static {
    /// Returns the kind of this error.
    fn kind(&self) -> DocumentStoreErrorKind;
}

/// The kind of document store error.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum DocumentStoreErrorKind {
    /// A fenced `put` found a different version than expected.
    VersionConflict,

    /// Underlying I/O failure (possibly transient).
    Io,

    /// Other/unknown error.
    Other,
}

impl fmt::Display for DocumentStoreErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

/// A stored document together with its current version.
///
/// Versions start at 1 on first write and increase by 1 on every
/// successful `put`. Version 0 is reserved to mean "absent" in fenced
/// writes.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Document {
    /// The document payload.
    pub bytes: Bytes,

    /// The version assigned by the store.
    pub version: u64,
}

/// A trait representing a versioned key-value document store with
/// asynchronous operations.
///
/// Absence is modeled as `None`, never as an error. Writes are atomic:
/// a reader observes either the previous document or the new one in
/// full, never a partial write.
#[async_trait]
pub trait DocumentStore: Clone + Send + Sync + 'static {
    /// The error type for store operations.
    type Error: DocumentStoreError;

    /// Deletes a document. Deleting an absent key is a no-op.
    async fn del<K: Into<String> + Send>(&self, key: K) -> Result<(), Self::Error>;

    /// Retrieves the document stored under a key, if any.
    async fn get<K: Into<String> + Send>(&self, key: K)
        -> Result<Option<Document>, Self::Error>;

    /// Retrieves all keys in the store (within the current scope).
    async fn keys(&self) -> Result<Vec<String>, Self::Error>;

    /// Stores a document, returning the newly assigned version.
    ///
    /// `expected` fences the write: `Some(0)` succeeds only if the key
    /// is absent, `Some(n)` only if the stored version is exactly `n`,
    /// and `None` writes unconditionally. A failed fence surfaces as an
    /// error of kind [`DocumentStoreErrorKind::VersionConflict`].
    async fn put<K: Into<String> + Send>(
        &self,
        key: K,
        bytes: Bytes,
        expected: Option<u64>,
    ) -> Result<u64, Self::Error>;
}

/// A trait representing a scoped document store: adding a deployment
/// scope yields a usable [`DocumentStore`] whose keys are isolated from
/// other scopes.
pub trait ScopedDocumentStore: Clone + Send + Sync + 'static {
    /// The error type for the scoped store.
    type Error: DocumentStoreError;

    /// The scoped store type.
    type Scoped: DocumentStore<Error = Self::Error>;

    /// Creates a store scoped to the given deployment.
    fn scope<S: Into<String> + Send>(&self, scope: S) -> Self::Scoped;
}
