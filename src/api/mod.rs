//! Client side of the push endpoint.

pub mod push;

pub use push::{parse_node_file, push_nodes, read_node_file, PushError, PushReceipt};
