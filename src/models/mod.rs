//! Core data models for the application
//!
//! This module contains the primary data structures used throughout the application,
//! separated from the logic that operates on them.
//!
//! # Usage
//!
//! ```rust
//! use subhub::models::{Node, ProxyProtocol};
//!
//! let node = Node::new(
//!     "HK 01",
//!     "hk.example.com",
//!     443,
//!     ProxyProtocol::Trojan { password: Some("secret".to_string()) },
//! );
//! assert_eq!(node.password(), Some("secret"));
//! ```
//!
//! Nodes usually arrive as JSON and are parsed through their wire form:
//!
//! ```rust
//! use subhub::models::Node;
//!
//! let node: Node = serde_json::from_str(
//!     r#"{"name":"A","type":"trojan","server":"s1.example","port":443,"password":"pw"}"#,
//! ).unwrap();
//! assert_eq!(node.display_name(), "A");
//! ```

mod app_state;
mod node;
mod raw_node;
mod target;

pub use app_state::AppState;
pub use node::*;
pub use raw_node::RawNode;
pub use target::SubscriptionTarget;
