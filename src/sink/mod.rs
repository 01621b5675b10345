//! Payload sink for fetched resources
//! Uses Apache Arrow object_store crate

use bytes::Bytes;
use object_store::{ObjectStore, local::LocalFileSystem, path::Path as StoragePath};
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

use crate::fetch::BatchResult;

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("failed to prepare output directory {path}: {source}")]
    OutputDir {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Object store error: {0}")]
    ObjectStoreError(#[from] object_store::Error),
}

/// Sink result type
pub type Result<T> = std::result::Result<T, SinkError>;

/// How stored objects are named: `<prefix><index + 1><extension>`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyNaming {
    pub prefix: String,
    pub extension: String,
}

impl Default for KeyNaming {
    fn default() -> Self {
        Self {
            prefix: String::new(),
            extension: ".bin".to_string(),
        }
    }
}

impl KeyNaming {
    /// Keys are 1-based so the first resource lands at `1<extension>`
    pub fn key_for(&self, index: usize) -> String {
        format!("{}{}{}", self.prefix, index + 1, self.extension)
    }
}

/// Metadata returned after a payload is stored
#[derive(Debug, Clone)]
pub struct StoredObject {
    pub index: usize,
    pub key: String,
    pub etag: Option<String>,
    pub size: usize,
}

/// Sink writing payloads through any object_store backend
#[derive(Clone)]
pub struct PayloadSink {
    store: Arc<dyn ObjectStore>,
    naming: KeyNaming,
}

impl PayloadSink {
    pub fn new(store: Arc<dyn ObjectStore>, naming: KeyNaming) -> Self {
        Self { store, naming }
    }

    /// Sink rooted at a local directory, created if missing
    pub fn local(dir: &Path, naming: KeyNaming) -> Result<Self> {
        std::fs::create_dir_all(dir).map_err(|source| SinkError::OutputDir {
            path: dir.display().to_string(),
            source,
        })?;

        let store = LocalFileSystem::new_with_prefix(dir)?;
        Ok(Self::new(Arc::new(store), naming))
    }

    /// Create in-memory sink for testing/development
    pub fn in_memory(naming: KeyNaming) -> Self {
        Self::new(Arc::new(object_store::memory::InMemory::new()), naming)
    }

    /// Store one payload under the key for `index`
    pub async fn persist(&self, index: usize, payload: &Bytes) -> Result<StoredObject> {
        let key = self.naming.key_for(index);
        let path = StoragePath::from(key.as_str());
        let size = payload.len();

        let put_result = self.store.put(&path, payload.clone().into()).await?;

        tracing::info!(key, size, "Stored payload");

        Ok(StoredObject {
            index,
            key,
            etag: put_result.e_tag,
            size,
        })
    }

    /// Store every successful payload of a batch.
    ///
    /// Failed outcomes are skipped. Each write reports independently, so one
    /// bad write does not stop the rest.
    pub async fn persist_batch(&self, result: &BatchResult) -> Vec<(usize, Result<StoredObject>)> {
        let mut written = Vec::with_capacity(result.succeeded());

        for (index, payload) in result.payloads() {
            let outcome = self.persist(index, payload).await;
            if let Err(e) = &outcome {
                tracing::warn!(index, error = %e, "Failed to store payload");
            }
            written.push((index, outcome));
        }

        written
    }

    /// Read a stored object back
    pub async fn read(&self, key: &str) -> Result<Bytes> {
        let path = StoragePath::from(key);
        let result = self.store.get(&path).await?;
        Ok(result.bytes().await?)
    }

    /// Check if key exists
    pub async fn exists(&self, key: &str) -> Result<bool> {
        let path = StoragePath::from(key);

        match self.store.head(&path).await {
            Ok(_) => Ok(true),
            Err(object_store::Error::NotFound { .. }) => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}
