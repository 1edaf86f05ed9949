//! Key-value persistence for the pushed node set.
//!
//! The service stores one opaque string per key. Two backends exist: an in-process
//! map that lives as long as the server, and a directory of files that survives
//! restarts. [`NodeStore`] picks one at startup.

pub mod file;
pub mod memory;

use std::future::Future;

use thiserror::Error;

pub use file::FileKvStore;
pub use memory::MemoryKvStore;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Invalid key: {0}")]
    InvalidKey(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

pub trait KvStore {
    fn get(&self, key: &str) -> impl Future<Output = Result<Option<String>, StoreError>>;
    fn put(&self, key: &str, value: String) -> impl Future<Output = Result<(), StoreError>>;
}

/// Storage backend selected from settings.
#[derive(Debug)]
pub enum NodeStore {
    Memory(MemoryKvStore),
    File(FileKvStore),
}

impl NodeStore {
    pub fn backend_name(&self) -> &'static str {
        match self {
            NodeStore::Memory(_) => "memory",
            NodeStore::File(_) => "file",
        }
    }
}

impl KvStore for NodeStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        match self {
            NodeStore::Memory(store) => store.get(key).await,
            NodeStore::File(store) => store.get(key).await,
        }
    }

    async fn put(&self, key: &str, value: String) -> Result<(), StoreError> {
        match self {
            NodeStore::Memory(store) => store.put(key, value).await,
            NodeStore::File(store) => store.put(key, value).await,
        }
    }
}
