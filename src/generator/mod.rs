//! Node to subscription encoders.
//!
//! Two formats are produced from the same ordered node list: a Clash document
//! ([`encode_document`]) and a base64 bundle of share links ([`encode_link_bundle`]).
//! [`select_encoder`] picks one from a format token.

pub mod config;
pub mod yaml;

use crate::models::{Node, SubscriptionTarget};

// Re-export format converters
pub use config::formats::{
    proxy_to_clash, proxy_to_links, proxy_to_single, proxy_to_uri,
    HYSTERIA2_LINK_EMITS_FINGERPRINT, VLESS_LINK_KEEPS_DUPLICATE_SECURITY,
};

/// Render nodes as a Clash configuration document.
pub fn encode_document(nodes: &[Node]) -> String {
    proxy_to_clash(nodes)
}

/// Render nodes as a base64 wrapped bundle of share links.
pub fn encode_link_bundle(nodes: &[Node]) -> String {
    proxy_to_single(nodes)
}

/// Pick the encoder for a requested format. Total: unknown tokens get the link bundle.
pub fn select_encoder(format: &str) -> SubscriptionTarget {
    SubscriptionTarget::from_format(format)
}

/// A rendered subscription and the content type it should be served with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedSubscription {
    pub content: String,
    pub content_type: &'static str,
}

/// Select the encoder for `format` and run it over `nodes`.
pub fn render(nodes: &[Node], format: &str) -> RenderedSubscription {
    let target = select_encoder(format);
    RenderedSubscription {
        content: target.encode(nodes),
        content_type: target.content_type(),
    }
}
