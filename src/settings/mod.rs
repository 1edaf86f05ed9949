//! Settings module for subhub
//!
//! This module contains all the configuration settings and utilities

pub mod file_settings;
pub mod settings_struct;

use thiserror::Error;

pub use file_settings::FileSettings;
pub use settings_struct::{
    init_settings, update_settings, update_settings_from_content, Settings, StorageBackend,
    GLOBAL,
};

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("Failed to read settings file '{path}': {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid TOML settings: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Invalid YAML settings: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Unknown storage backend '{0}', expected 'memory' or 'file'")]
    UnknownBackend(String),
}
