use std::sync::Arc;

use log::info;

use crate::models::Node;
use crate::settings::{Settings, StorageBackend};
use crate::vfs::{FileKvStore, KvStore, MemoryKvStore, NodeStore, StoreError};

/// Application state structure for the web server
#[derive(Debug)]
pub struct AppState {
    /// Global application settings
    pub config: Arc<Settings>,

    /// Where the last pushed node set lives
    pub store: NodeStore,
}

impl AppState {
    /// Create a new AppState instance, opening the configured store
    pub fn new(config: Arc<Settings>) -> Self {
        let store = match config.storage_backend {
            StorageBackend::Memory => NodeStore::Memory(MemoryKvStore::new()),
            StorageBackend::File => NodeStore::File(FileKvStore::new(&config.storage_path)),
        };
        info!("Using {} node store", store.backend_name());
        Self { config, store }
    }

    pub fn with_store(config: Arc<Settings>, store: NodeStore) -> Self {
        Self { config, store }
    }

    /// Read the persisted node set. `Ok(None)` when nothing was pushed yet.
    pub async fn load_nodes(&self) -> Result<Option<Vec<Node>>, StoreError> {
        match self.store.get(&self.config.nodes_key).await? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    /// Replace the persisted node set, returning how many nodes were stored.
    pub async fn save_nodes(&self, nodes: &[Node]) -> Result<usize, StoreError> {
        let raw = serde_json::to_string(nodes)?;
        self.store.put(&self.config.nodes_key, raw).await?;
        Ok(nodes.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ProxyProtocol;

    #[tokio::test]
    async fn test_save_then_load_preserves_order() {
        let state = AppState::new(Arc::new(Settings::default()));
        assert!(state.load_nodes().await.unwrap().is_none());

        let nodes = vec![
            Node::new("b", "b.example", 443, ProxyProtocol::Trojan { password: None }),
            Node::new("a", "a.example", 443, ProxyProtocol::Trojan { password: None }),
        ];
        assert_eq!(state.save_nodes(&nodes).await.unwrap(), 2);
        assert_eq!(state.load_nodes().await.unwrap().unwrap(), nodes);
    }

    #[tokio::test]
    async fn test_corrupt_blob_is_an_error() {
        let store = MemoryKvStore::new();
        store
            .put("default_nodes", "not json".to_string())
            .await
            .unwrap();
        let state = AppState::with_store(Arc::new(Settings::default()), NodeStore::Memory(store));
        assert!(matches!(
            state.load_nodes().await,
            Err(StoreError::Serialization(_))
        ));
    }
}
