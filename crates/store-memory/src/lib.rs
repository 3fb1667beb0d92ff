//! In-memory (single process) implementation of the versioned document
//! store, for local development and tests.
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

mod error;

pub use error::Error;

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use ledgerctl_store::{Document, DocumentStore, ScopedDocumentStore};
use tokio::sync::Mutex;

/// In-memory versioned document store.
///
/// Clones share the same underlying map, so two "processes" in a test
/// can coordinate through one instance the way real invocations
/// coordinate through the cluster.
#[derive(Clone, Debug, Default)]
pub struct MemoryDocumentStore {
    map: Arc<Mutex<HashMap<String, Document>>>,
    prefix: Option<String>,
}

impl MemoryDocumentStore {
    /// Creates a new `MemoryDocumentStore`.
    #[must_use]
    pub fn new() -> Self {
        Self {
            map: Arc::new(Mutex::new(HashMap::new())),
            prefix: None,
        }
    }

    fn get_key<K: Into<String>>(&self, key: K) -> String {
        match &self.prefix {
            Some(prefix) => format!("{}:{}", prefix, key.into()),
            None => key.into(),
        }
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    type Error = Error;

    async fn del<K: Into<String> + Send>(&self, key: K) -> Result<(), Self::Error> {
        self.map.lock().await.remove(&self.get_key(key));
        Ok(())
    }

    async fn get<K: Into<String> + Send>(
        &self,
        key: K,
    ) -> Result<Option<Document>, Self::Error> {
        let map = self.map.lock().await;
        Ok(map.get(&self.get_key(key)).cloned())
    }

    async fn keys(&self) -> Result<Vec<String>, Self::Error> {
        let map = self.map.lock().await;
        Ok(map
            .keys()
            .filter(|&key| {
                self.prefix
                    .as_ref()
                    .is_none_or(|prefix| key.starts_with(prefix))
            })
            .cloned()
            .collect())
    }

    async fn put<K: Into<String> + Send>(
        &self,
        key: K,
        bytes: Bytes,
        expected: Option<u64>,
    ) -> Result<u64, Self::Error> {
        let key = self.get_key(key);
        let mut map = self.map.lock().await;

        let found = map.get(&key).map_or(0, |doc| doc.version);
        if let Some(expected) = expected {
            if expected != found {
                return Err(Error::VersionConflict { expected, found });
            }
        }

        let version = found + 1;
        map.insert(key, Document { bytes, version });
        Ok(version)
    }
}

impl ScopedDocumentStore for MemoryDocumentStore {
    type Error = Error;
    type Scoped = Self;

    fn scope<S: Into<String> + Send>(&self, scope: S) -> Self::Scoped {
        let new_scope = match &self.prefix {
            Some(existing_scope) => format!("{}:{}", existing_scope, scope.into()),
            None => scope.into(),
        };
        Self {
            map: self.map.clone(),
            prefix: Some(new_scope),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_put_and_get() {
        let store = MemoryDocumentStore::new();
        let value = Bytes::from_static(b"test_value");

        let version = store.put("test_key", value.clone(), None).await.unwrap();
        assert_eq!(version, 1);

        let result = store.get("test_key").await.unwrap();
        assert_eq!(
            result,
            Some(Document {
                bytes: value,
                version: 1
            })
        );
    }

    #[tokio::test]
    async fn test_del() {
        let store = MemoryDocumentStore::new();

        store
            .put("test_key", Bytes::from_static(b"test_value"), None)
            .await
            .unwrap();
        store.del("test_key").await.unwrap();

        assert_eq!(store.get("test_key").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_versions_increment() {
        let store = MemoryDocumentStore::new();

        let v1 = store
            .put("test_key", Bytes::from_static(b"a"), None)
            .await
            .unwrap();
        let v2 = store
            .put("test_key", Bytes::from_static(b"b"), None)
            .await
            .unwrap();

        assert_eq!(v1, 1);
        assert_eq!(v2, 2);
    }

    #[tokio::test]
    async fn test_create_only_put() {
        let store = MemoryDocumentStore::new();

        // Some(0) succeeds only while the key is absent
        store
            .put("test_key", Bytes::from_static(b"a"), Some(0))
            .await
            .unwrap();

        let err = store
            .put("test_key", Bytes::from_static(b"b"), Some(0))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            Error::VersionConflict {
                expected: 0,
                found: 1
            }
        ));
    }

    #[tokio::test]
    async fn test_fenced_put() {
        let store = MemoryDocumentStore::new();

        store
            .put("test_key", Bytes::from_static(b"a"), None)
            .await
            .unwrap();

        // Correct fence succeeds, stale fence fails
        store
            .put("test_key", Bytes::from_static(b"b"), Some(1))
            .await
            .unwrap();
        let err = store
            .put("test_key", Bytes::from_static(b"c"), Some(1))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::VersionConflict { .. }));
    }

    #[tokio::test]
    async fn test_scope_isolation() {
        let store = MemoryDocumentStore::new();
        let scoped = store.scope("ns1");

        scoped
            .put("test_key", Bytes::from_static(b"test_value"), None)
            .await
            .unwrap();

        // Not visible without the scope
        assert_eq!(store.get("test_key").await.unwrap(), None);
        assert!(scoped.get("test_key").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_scopes_share_backing_map() {
        let store = MemoryDocumentStore::new();
        let a = store.scope("ns1");
        let b = store.scope("ns1");

        a.put("test_key", Bytes::from_static(b"test_value"), None)
            .await
            .unwrap();

        // A second scope handle over the same store sees the write
        assert!(b.get("test_key").await.unwrap().is_some());
    }
}
