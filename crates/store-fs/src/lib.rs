//! Implementation of the versioned document store using files on disk,
//! for single-host deployments and local development.
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

mod error;

pub use error::Error;

use std::os::fd::AsRawFd;
use std::path::PathBuf;

use async_trait::async_trait;
use bytes::Bytes;
use ledgerctl_store::{Document, DocumentStore, ScopedDocumentStore};
use nix::fcntl::{flock, FlockArg};
use serde::{Deserialize, Serialize};
use tokio::fs;
use tokio::io::{self, AsyncWriteExt};

/// Advisory lock file guarding mutations within a store directory.
const LOCK_FILE: &str = ".lock";

/// On-disk envelope carrying the payload and its store-assigned version.
#[derive(Debug, Deserialize, Serialize)]
struct Envelope {
    version: u64,
    bytes: Vec<u8>,
}

/// Document store using files on disk. Scoping maps to subdirectories.
#[derive(Clone, Debug)]
pub struct FsDocumentStore {
    dir: PathBuf,
}

impl FsDocumentStore {
    /// Creates a new `FsDocumentStore` rooted at the given directory.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn get_file_path(&self, key: &str) -> PathBuf {
        self.dir.join(key)
    }

    async fn read_envelope(&self, key: &str) -> Result<Option<Envelope>, Error> {
        let path = self.get_file_path(key);
        match fs::read(path).await {
            Ok(data) => Ok(Some(ciborium::from_reader(data.as_slice())?)),
            Err(ref e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(Error::Io("error reading file", e)),
        }
    }

    /// Takes an exclusive advisory lock on the store directory, held
    /// until the returned file is dropped. Mutations run their whole
    /// read-check-write sequence under this lock, so the version fence
    /// holds across tasks and processes alike.
    async fn lock_exclusive(&self) -> Result<std::fs::File, Error> {
        fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| Error::Io("error creating directory", e))?;

        let path = self.dir.join(LOCK_FILE);
        tokio::task::spawn_blocking(move || {
            let file = std::fs::File::create(&path)
                .map_err(|e| Error::Io("error opening lock file", e))?;
            flock(file.as_raw_fd(), FlockArg::LockExclusive)
                .map_err(|e| Error::Io("error locking store", e.into()))?;
            Ok(file)
        })
        .await
        .map_err(|e| Error::Io("lock task aborted", io::Error::other(e)))?
    }
}

#[async_trait]
impl DocumentStore for FsDocumentStore {
    type Error = Error;

    async fn del<K: Into<String> + Send>(&self, key: K) -> Result<(), Self::Error> {
        let _guard = self.lock_exclusive().await?;

        let path = self.get_file_path(&key.into());
        match fs::remove_file(path).await {
            Ok(()) => Ok(()),
            Err(ref e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(Error::Io("error deleting file", e)),
        }
    }

    async fn get<K: Into<String> + Send>(
        &self,
        key: K,
    ) -> Result<Option<Document>, Self::Error> {
        Ok(self.read_envelope(&key.into()).await?.map(|e| Document {
            bytes: Bytes::from(e.bytes),
            version: e.version,
        }))
    }

    async fn keys(&self) -> Result<Vec<String>, Self::Error> {
        let mut entries = match fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(ref e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(Error::Io("error reading directory", e)),
        };
        let mut keys = Vec::new();

        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| Error::Io("error reading directory entry", e))?
        {
            let is_file = entry
                .file_type()
                .await
                .map_err(|e| Error::Io("error reading file type", e))?
                .is_file();
            if is_file {
                if let Some(key) = entry.file_name().to_str() {
                    // The lock file is store bookkeeping, and a crash
                    // between write and rename can leave a temp file
                    // behind; neither is a document.
                    if key != LOCK_FILE && !key.ends_with(".tmp") {
                        keys.push(key.to_string());
                    }
                }
            }
        }

        Ok(keys)
    }

    async fn put<K: Into<String> + Send>(
        &self,
        key: K,
        bytes: Bytes,
        expected: Option<u64>,
    ) -> Result<u64, Self::Error> {
        let key = key.into();

        // The fence check and the write must be one critical section;
        // the lock drops with the guard once the rename lands.
        let _guard = self.lock_exclusive().await?;

        let found = self
            .read_envelope(&key)
            .await?
            .map_or(0, |envelope| envelope.version);
        if let Some(expected) = expected {
            if expected != found {
                return Err(Error::VersionConflict { expected, found });
            }
        }

        let version = found + 1;
        let envelope = Envelope {
            version,
            bytes: bytes.to_vec(),
        };
        let mut encoded = Vec::new();
        ciborium::into_writer(&envelope, &mut encoded)?;

        let path = self.get_file_path(&key);

        // Write to a temp file then rename so a crash mid-write never
        // leaves a truncated document behind.
        let tmp_path = path.with_extension("tmp");
        let mut file = fs::File::create(&tmp_path)
            .await
            .map_err(|e| Error::Io("error creating file", e))?;
        file.write_all(&encoded)
            .await
            .map_err(|e| Error::Io("error writing file", e))?;
        file.sync_all()
            .await
            .map_err(|e| Error::Io("error syncing file", e))?;
        fs::rename(&tmp_path, &path)
            .await
            .map_err(|e| Error::Io("error renaming file", e))?;

        Ok(version)
    }
}

impl ScopedDocumentStore for FsDocumentStore {
    type Error = Error;
    type Scoped = Self;

    fn scope<S: Into<String> + Send>(&self, scope: S) -> Self::Scoped {
        Self {
            dir: self.dir.join(scope.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_put_and_get() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsDocumentStore::new(dir.path());
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
    async fn test_get_absent() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsDocumentStore::new(dir.path());

        assert_eq!(store.get("missing").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_del_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsDocumentStore::new(dir.path());

        store
            .put("test_key", Bytes::from_static(b"test_value"), None)
            .await
            .unwrap();
        store.del("test_key").await.unwrap();
        store.del("test_key").await.unwrap();

        assert_eq!(store.get("test_key").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_fenced_put() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsDocumentStore::new(dir.path());

        store
            .put("test_key", Bytes::from_static(b"a"), Some(0))
            .await
            .unwrap();
        store
            .put("test_key", Bytes::from_static(b"b"), Some(1))
            .await
            .unwrap();

        let err = store
            .put("test_key", Bytes::from_static(b"c"), Some(1))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            Error::VersionConflict {
                expected: 1,
                found: 2
            }
        ));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_concurrent_create_only_put_admits_one() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsDocumentStore::new(dir.path());

        let mut writers = Vec::new();
        for i in 0..16u8 {
            let store = store.clone();
            writers.push(tokio::spawn(async move {
                store.put("test_key", Bytes::from(vec![i]), Some(0)).await
            }));
        }

        let mut winners = 0;
        for writer in writers {
            match writer.await.unwrap() {
                Ok(version) => {
                    assert_eq!(version, 1);
                    winners += 1;
                }
                Err(Error::VersionConflict {
                    expected: 0,
                    found: 1,
                }) => {}
                Err(other) => panic!("unexpected error: {other:?}"),
            }
        }
        assert_eq!(winners, 1);

        let document = store.get("test_key").await.unwrap().unwrap();
        assert_eq!(document.version, 1);
    }

    #[tokio::test]
    async fn test_scope_maps_to_subdirectory() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsDocumentStore::new(dir.path());
        let scoped = store.scope("ns1");

        scoped
            .put("test_key", Bytes::from_static(b"test_value"), None)
            .await
            .unwrap();

        assert_eq!(store.get("test_key").await.unwrap(), None);
        assert!(dir.path().join("ns1").join("test_key").is_file());
    }

    #[tokio::test]
    async fn test_keys_skips_directories() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsDocumentStore::new(dir.path());

        store
            .put("test_key", Bytes::from_static(b"test_value"), None)
            .await
            .unwrap();
        store
            .scope("ns1")
            .put("nested", Bytes::from_static(b"x"), None)
            .await
            .unwrap();

        let keys = store.keys().await.unwrap();
        assert_eq!(keys, vec!["test_key".to_string()]);
    }
}
