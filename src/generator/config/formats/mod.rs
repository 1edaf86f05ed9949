pub mod clash;
pub mod single;

// Re-export all format converters
pub use clash::proxy_to_clash;
pub use single::{
    proxy_to_links, proxy_to_single, proxy_to_uri, HYSTERIA2_LINK_EMITS_FINGERPRINT,
    VLESS_LINK_KEEPS_DUPLICATE_SECURITY,
};
