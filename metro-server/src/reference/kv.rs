//! Persistent key-value storage for serialized reference data.

use std::collections::HashMap;
use std::future::Future;
use std::io::ErrorKind;
use std::path::PathBuf;

use tokio::sync::RwLock;

/// Errors from the key-value store.
#[derive(Debug, thiserror::Error)]
pub enum KvError {
    /// Reading or writing the backing file failed
    #[error("cache I/O error for {key}: {source}")]
    Io {
        key: String,
        #[source]
        source: std::io::Error,
    },

    /// A value could not be serialized
    #[error("cache serialization error for {key}: {message}")]
    Serialize { key: String, message: String },
}

/// String values stored under string keys, surviving restarts.
pub trait KeyValueStore: Send + Sync + 'static {
    /// Read the value under `key`; `None` if absent.
    fn get(&self, key: &str) -> impl Future<Output = Result<Option<String>, KvError>> + Send;

    /// Store `value` under `key`, replacing any previous value.
    fn set(&self, key: &str, value: String) -> impl Future<Output = Result<(), KvError>> + Send;
}

/// Key-value store keeping one JSON file per key in a directory.
#[derive(Debug, Clone)]
pub struct FileKvStore {
    dir: PathBuf,
}

impl FileKvStore {
    /// Create a store rooted at `dir`. The directory is created on first write.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl KeyValueStore for FileKvStore {
    async fn get(&self, key: &str) -> Result<Option<String>, KvError> {
        match tokio::fs::read_to_string(self.path_for(key)).await {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(source) => Err(KvError::Io {
                key: key.to_string(),
                source,
            }),
        }
    }

    async fn set(&self, key: &str, value: String) -> Result<(), KvError> {
        let io_err = |source| KvError::Io {
            key: key.to_string(),
            source,
        };

        tokio::fs::create_dir_all(&self.dir).await.map_err(io_err)?;
        tokio::fs::write(self.path_for(key), value)
            .await
            .map_err(io_err)
    }
}

/// Key-value store held in memory; lost on restart.
#[derive(Debug, Default)]
pub struct MemoryKvStore {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryKvStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored keys.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

impl KeyValueStore for MemoryKvStore {
    async fn get(&self, key: &str) -> Result<Option<String>, KvError> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: String) -> Result<(), KvError> {
        self.entries.write().await.insert(key.to_string(), value);
        Ok(())
    }
}
