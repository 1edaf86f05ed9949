pub mod api;
pub mod constants;
pub mod generator;
pub mod models;
pub mod settings;
pub mod utils;
pub mod vfs;
#[cfg(feature = "web-api")]
pub mod web_handlers;

// Re-export the node model and the encoders for easier access
pub use generator::{encode_document, encode_link_bundle, render, select_encoder};
pub use models::{Node, SubscriptionTarget};
pub use settings::Settings;
