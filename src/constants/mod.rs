//! Fixed values shared by the encoders and the service layer.

/// Display name used when a node was pushed without one.
pub const DEFAULT_NODE_NAME: &str = "Unnamed";

/// Store key holding the last pushed node set.
pub const DEFAULT_NODES_KEY: &str = "default_nodes";

/// Clash document preamble: listening parameters, mode and log level.
pub const CLASH_MIXED_PORT: u16 = 7890;
pub const CLASH_ALLOW_LAN: bool = true;
pub const CLASH_MODE: &str = "rule";
pub const CLASH_LOG_LEVEL: &str = "info";

/// The single selection group every node is listed in.
pub const CLASH_SELECT_GROUP: &str = "🚀 Proxy";
/// Built-in direct connection, always the first member of the group.
pub const CLASH_DIRECT: &str = "DIRECT";

pub const CONTENT_TYPE_YAML: &str = "text/yaml; charset=utf-8";
pub const CONTENT_TYPE_TEXT: &str = "text/plain; charset=utf-8";
pub const CONTENT_TYPE_HTML: &str = "text/html; charset=utf-8";
