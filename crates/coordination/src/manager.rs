//! Load → mutate → validate → persist cycles over the registry
//! document.

use std::sync::Mutex;

use bytes::Bytes;
use ledgerctl_registry::ComponentRegistry;
use ledgerctl_store::{DocumentStore, DocumentStoreError, DocumentStoreErrorKind};
use tracing::debug;

use crate::error::{Error, Result};

/// Key the registry document is stored under within a scope.
pub const REGISTRY_KEY: &str = "remote-config";

/// Orchestrates transactions against one deployment's registry
/// document.
///
/// `modify` assumes the caller already holds the deployment's lease;
/// because only the lease holder may begin a mutation, concurrent
/// `modify` calls across processes never interleave. Every persist is
/// still fenced on the version read at load time, so a violated lease
/// discipline surfaces as [`Error::Concurrency`] instead of a lost
/// update.
#[derive(Debug)]
pub struct RegistryManager<S: DocumentStore> {
    store: S,
    last_version: Mutex<Option<u64>>,
}

impl<S: DocumentStore> RegistryManager<S> {
    /// Creates a manager over a store already scoped to one deployment.
    pub const fn new(store: S) -> Self {
        Self {
            store,
            last_version: Mutex::new(None),
        }
    }

    /// Whether this manager has successfully loaded or persisted the
    /// document during the current invocation.
    pub fn is_loaded(&self) -> bool {
        self.last_version
            .lock()
            .expect("version lock poisoned")
            .is_some()
    }

    async fn read(&self) -> Result<Option<(ComponentRegistry, u64)>> {
        let Some(document) = self
            .store
            .get(REGISTRY_KEY)
            .await
            .map_err(|e| Error::Store(Box::new(e)))?
        else {
            return Ok(None);
        };

        let registry: ComponentRegistry = serde_json::from_slice(&document.bytes)?;
        Ok(Some((registry, document.version)))
    }

    fn note_version(&self, version: u64) {
        *self.last_version.lock().expect("version lock poisoned") = Some(version);
    }

    /// Loads the current registry, if the document exists. Pure reads
    /// may run without a lease.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Store`] or [`Error::Codec`] on failure.
    pub async fn try_load(&self) -> Result<Option<ComponentRegistry>> {
        match self.read().await? {
            Some((registry, version)) => {
                self.note_version(version);
                Ok(Some(registry))
            }
            None => Ok(None),
        }
    }

    /// Loads the current registry.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotInitialized`] if no document exists yet.
    pub async fn load(&self) -> Result<ComponentRegistry> {
        self.try_load().await?.ok_or(Error::NotInitialized)
    }

    /// Runs a transaction: loads the document (initializing an empty
    /// registry on first use), applies `mutator`, and persists the
    /// result with the document version bumped.
    ///
    /// If `mutator` fails, nothing is written — the persisted document
    /// is left byte-for-byte as it was.
    ///
    /// # Errors
    ///
    /// Propagates the mutator's error, [`Error::Concurrency`] if the
    /// fenced write loses, or [`Error::Store`]/[`Error::Codec`] on I/O
    /// and serialization failure.
    pub async fn modify<T, F>(&self, mutator: F) -> Result<T>
    where
        F: FnOnce(&mut ComponentRegistry) -> Result<T>,
    {
        let (mut registry, stored_version) = match self.read().await? {
            Some((registry, version)) => (registry, version),
            None => (ComponentRegistry::new(), 0),
        };

        let value = mutator(&mut registry)?;

        registry.bump_version();
        let bytes = Bytes::from(serde_json::to_vec(&registry)?);

        match self
            .store
            .put(REGISTRY_KEY, bytes, Some(stored_version))
            .await
        {
            Ok(version) => {
                self.note_version(version);
                debug!(
                    document_version = registry.version(),
                    "persisted registry document"
                );
                Ok(value)
            }
            Err(e) if e.kind() == DocumentStoreErrorKind::VersionConflict => {
                Err(Error::Concurrency)
            }
            Err(e) => Err(Error::Store(Box::new(e))),
        }
    }

    /// Deletes the registry document. Only full teardown calls this.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Store`] on failure.
    pub async fn delete(&self) -> Result<()> {
        self.store
            .del(REGISTRY_KEY)
            .await
            .map_err(|e| Error::Store(Box::new(e)))?;
        *self.last_version.lock().expect("version lock poisoned") = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ledgerctl_registry::{ClusterMetadata, ComponentFactory, ComponentType};
    use ledgerctl_store::ScopedDocumentStore;
    use ledgerctl_store_memory::MemoryDocumentStore;

    fn scoped() -> MemoryDocumentStore {
        MemoryDocumentStore::new().scope("ns1")
    }

    fn add_cluster(registry: &mut ComponentRegistry) {
        registry.register_cluster(ClusterMetadata {
            name: "cluster-1".to_string(),
            api_endpoint: None,
        });
    }

    #[tokio::test]
    async fn test_modify_initializes_on_first_use() {
        let manager = RegistryManager::new(scoped());
        assert!(!manager.is_loaded());

        manager
            .modify(|registry| {
                add_cluster(registry);
                Ok(())
            })
            .await
            .unwrap();

        assert!(manager.is_loaded());
        let registry = manager.load().await.unwrap();
        assert!(registry.cluster("cluster-1").is_some());
        assert_eq!(registry.version(), 1);
    }

    #[tokio::test]
    async fn test_load_absent_is_not_initialized() {
        let manager = RegistryManager::new(scoped());

        assert!(matches!(
            manager.load().await.unwrap_err(),
            Error::NotInitialized
        ));
        assert!(manager.try_load().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_failed_mutator_writes_nothing() {
        let store = scoped();
        let manager = RegistryManager::new(store.clone());

        manager
            .modify(|registry| {
                add_cluster(registry);
                Ok(())
            })
            .await
            .unwrap();

        let before = store.get(REGISTRY_KEY).await.unwrap().unwrap();

        let err = manager
            .modify(|registry| {
                add_cluster(registry);
                // Mutations made above must be discarded
                Err::<(), _>(Error::Task("boom".to_string()))
            })
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Task(_)));

        let after = store.get(REGISTRY_KEY).await.unwrap().unwrap();
        assert_eq!(before, after);
    }

    #[tokio::test]
    async fn test_versions_increment_per_modify() {
        let manager = RegistryManager::new(scoped());

        for _ in 0..3 {
            manager
                .modify(|registry| {
                    add_cluster(registry);
                    Ok(())
                })
                .await
                .unwrap();
        }

        assert_eq!(manager.load().await.unwrap().version(), 3);
    }

    #[tokio::test]
    async fn test_mutations_survive_round_trip() {
        let store = scoped();
        let writer = RegistryManager::new(store.clone());

        writer
            .modify(|registry| {
                add_cluster(registry);
                let node = ComponentFactory::new_consensus_node(registry, "cluster-1", "ns1")?;
                registry.add(node)?;
                Ok(())
            })
            .await
            .unwrap();

        // A second manager (another invocation) sees the same records
        let reader = RegistryManager::new(store);
        let registry = reader.load().await.unwrap();
        assert!(registry.get(ComponentType::ConsensusNode, 0).is_ok());
    }

    #[tokio::test]
    async fn test_delete_removes_document() {
        let manager = RegistryManager::new(scoped());

        manager
            .modify(|registry| {
                add_cluster(registry);
                Ok(())
            })
            .await
            .unwrap();

        manager.delete().await.unwrap();
        assert!(!manager.is_loaded());
        assert!(manager.try_load().await.unwrap().is_none());
    }
}
