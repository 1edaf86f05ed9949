use serde::Deserialize;

use crate::constants::DEFAULT_NODES_KEY;

fn default_listen_address() -> String {
    "127.0.0.1".to_string()
}

fn default_listen_port() -> u16 {
    25500
}

fn default_max_concurrent_threads() -> usize {
    4
}

fn default_info_log_level() -> String {
    "info".to_string()
}

fn default_nodes_key() -> String {
    DEFAULT_NODES_KEY.to_string()
}

fn default_backend() -> String {
    "memory".to_string()
}

fn default_storage_path() -> String {
    "./data".to_string()
}

/// Server section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub listen_address: String,
    pub listen_port: u16,
    pub max_concur_threads: usize,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            listen_address: default_listen_address(),
            listen_port: default_listen_port(),
            max_concur_threads: default_max_concurrent_threads(),
        }
    }
}

/// Common settings section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CommonSettings {
    /// Shared secret expected in the `Authorization` header of pushes
    pub api_secret: String,
    pub log_level: String,
    /// Store key the node set is kept under
    pub nodes_key: String,
}

impl Default for CommonSettings {
    fn default() -> Self {
        Self {
            api_secret: String::new(),
            log_level: default_info_log_level(),
            nodes_key: default_nodes_key(),
        }
    }
}

/// Storage section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageSettings {
    pub backend: String,
    pub path: String,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            path: default_storage_path(),
        }
    }
}

/// On-disk settings layout, shared by the TOML and YAML forms.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct FileSettings {
    pub server: ServerSettings,
    pub common: CommonSettings,
    pub storage: StorageSettings,
}
