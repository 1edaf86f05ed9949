pub mod base64;
pub mod url;
pub mod useragent;

// Re-export common utilities
pub use useragent::{match_user_agent, ClientKind};
