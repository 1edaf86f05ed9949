use std::net::{IpAddr, SocketAddr};
use std::path::Path;
use std::sync::{Arc, LazyLock, RwLock};

use super::file_settings::FileSettings;
use super::SettingsError;

/// Where pushed nodes are kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Memory,
    File,
}

impl StorageBackend {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "memory" => Some(StorageBackend::Memory),
            "file" => Some(StorageBackend::File),
            _ => None,
        }
    }
}

/// Settings structure to hold global configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub pref_path: String,

    // Server
    pub listen_address: String,
    pub listen_port: u16,
    pub max_concur_threads: usize,

    // Common
    pub api_secret: String,
    pub log_level: String,
    pub nodes_key: String,

    // Storage
    pub storage_backend: StorageBackend,
    pub storage_path: String,
}

impl Default for Settings {
    fn default() -> Self {
        let file = FileSettings::default();
        Settings {
            pref_path: String::new(),
            listen_address: file.server.listen_address,
            listen_port: file.server.listen_port,
            max_concur_threads: file.server.max_concur_threads,
            api_secret: file.common.api_secret,
            log_level: file.common.log_level,
            nodes_key: file.common.nodes_key,
            storage_backend: StorageBackend::Memory,
            storage_path: file.storage.path,
        }
    }
}

impl Settings {
    /// Create a new settings instance with default values
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current() -> Arc<Settings> {
        GLOBAL.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// `address:port` to bind, tolerating an address that already carries a port.
    /// Bare IPv6 addresses are bracketed.
    pub fn listen_target(&self) -> String {
        let address = self.listen_address.trim();
        if address.is_empty() {
            return format!("127.0.0.1:{}", self.listen_port);
        }
        if address.parse::<SocketAddr>().is_ok() {
            return address.to_string();
        }
        match address.parse::<IpAddr>() {
            Ok(IpAddr::V6(ip)) => return format!("[{}]:{}", ip, self.listen_port),
            Ok(IpAddr::V4(ip)) => return format!("{}:{}", ip, self.listen_port),
            Err(_) => {}
        }
        if address.starts_with('[') && address.ends_with(']') {
            return format!("{}:{}", address, self.listen_port);
        }
        match address.rsplit_once(':') {
            Some((host, port)) if !host.contains(':') && port.parse::<u16>().is_ok() => {
                address.to_string()
            }
            _ => format!("{}:{}", address, self.listen_port),
        }
    }

    fn from_file_settings(file: FileSettings) -> Result<Self, SettingsError> {
        let storage_backend = StorageBackend::from_str(&file.storage.backend)
            .ok_or_else(|| SettingsError::UnknownBackend(file.storage.backend.clone()))?;

        Ok(Settings {
            pref_path: String::new(),
            listen_address: file.server.listen_address,
            listen_port: file.server.listen_port,
            max_concur_threads: file.server.max_concur_threads.max(1),
            api_secret: file.common.api_secret,
            log_level: file.common.log_level,
            nodes_key: file.common.nodes_key,
            storage_backend,
            storage_path: file.storage.path,
        })
    }

    /// Parse settings from TOML or YAML text.
    ///
    /// `extension` is a hint from the file name; without one TOML is tried first.
    pub fn from_content(content: &str, extension: Option<&str>) -> Result<Self, SettingsError> {
        let file: FileSettings = match extension.map(|ext| ext.to_lowercase()).as_deref() {
            Some("yaml") | Some("yml") => serde_yaml::from_str(content)?,
            Some("toml") => toml::from_str(content)?,
            _ => match toml::from_str(content) {
                Ok(file) => file,
                Err(_) => serde_yaml::from_str(content)?,
            },
        };
        Settings::from_file_settings(file)
    }

    pub fn load_from_file(path: &str) -> Result<Self, SettingsError> {
        let content = std::fs::read_to_string(path).map_err(|source| SettingsError::Read {
            path: path.to_string(),
            source,
        })?;
        let extension = Path::new(path).extension().and_then(|ext| ext.to_str());
        let mut settings = Settings::from_content(&content, extension)?;
        settings.pref_path = path.to_owned();
        Ok(settings)
    }
}

// Global settings instance
pub static GLOBAL: LazyLock<RwLock<Arc<Settings>>> =
    LazyLock::new(|| RwLock::new(Arc::new(Settings::new())));

/// Load settings from `path` into the global instance. An empty path keeps defaults.
pub fn init_settings(path: &str) -> Result<(), SettingsError> {
    if path.is_empty() {
        return Ok(());
    }
    let settings = Settings::load_from_file(path)?;
    *GLOBAL.write().unwrap_or_else(|e| e.into_inner()) = Arc::new(settings);
    Ok(())
}

pub fn update_settings_from_content(content: &str) -> Result<(), SettingsError> {
    let settings = Settings::from_content(content, None)?;
    *GLOBAL.write().unwrap_or_else(|e| e.into_inner()) = Arc::new(settings);
    Ok(())
}

/// Apply in-place overrides, e.g. from command line flags.
pub fn update_settings(apply: impl FnOnce(&mut Settings)) {
    let mut guard = GLOBAL.write().unwrap_or_else(|e| e.into_inner());
    apply(Arc::make_mut(&mut *guard));
}
