use std::path::Path;
use std::time::Duration;

use log::{debug, info};
use reqwest::{header, Client, StatusCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::Node;

/// Default timeout for push requests in seconds
const DEFAULT_TIMEOUT: u64 = 15;

#[derive(Error, Debug)]
pub enum PushError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid node file: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Push rejected with {status}: {body}")]
    Rejected { status: StatusCode, body: String },
}

/// What `/update` answers after storing a node set.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct PushReceipt {
    pub status: String,
    pub count: usize,
}

impl PushReceipt {
    pub fn ok(count: usize) -> Self {
        PushReceipt {
            status: "ok".to_string(),
            count,
        }
    }
}

/// Node files come either as a bare list or wrapped like the push body.
#[derive(Deserialize)]
#[serde(untagged)]
enum NodeFile {
    Wrapped { nodes: Vec<Node> },
    List(Vec<Node>),
}

#[derive(Serialize)]
struct PushBody<'a> {
    nodes: &'a [Node],
}

/// Parse a JSON node list, accepting `[...]` or `{"nodes": [...]}`.
pub fn parse_node_file(content: &str) -> Result<Vec<Node>, PushError> {
    match serde_json::from_str(content)? {
        NodeFile::Wrapped { nodes } | NodeFile::List(nodes) => Ok(nodes),
    }
}

pub fn read_node_file(path: impl AsRef<Path>) -> Result<Vec<Node>, PushError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|source| PushError::Read {
        path: path.display().to_string(),
        source,
    })?;
    let nodes = parse_node_file(&content)?;
    debug!("Read {} nodes from {}", nodes.len(), path.display());
    Ok(nodes)
}

/// Address of the push endpoint for a service base URL.
pub fn update_url(endpoint: &str) -> String {
    let base = endpoint.trim_end_matches('/');
    if base.ends_with("/update") {
        base.to_string()
    } else {
        format!("{}/update", base)
    }
}

/// Replace the node set held by a running service.
///
/// # Arguments
/// * `endpoint` - Base URL of the service, or its `/update` URL
/// * `secret` - Value sent in the `Authorization` header
/// * `nodes` - Nodes to store, in serving order
pub async fn push_nodes(
    endpoint: &str,
    secret: &str,
    nodes: &[Node],
) -> Result<PushReceipt, PushError> {
    let client = Client::builder()
        .timeout(Duration::from_secs(DEFAULT_TIMEOUT))
        .user_agent(concat!("subhub/", env!("CARGO_PKG_VERSION")))
        .build()?;

    let url = update_url(endpoint);
    info!("Pushing {} nodes to {}", nodes.len(), url);

    let response = client
        .post(&url)
        .header(header::AUTHORIZATION, secret)
        .json(&PushBody { nodes })
        .send()
        .await?;

    let status = response.status();
    if status != StatusCode::OK {
        let body = response.text().await.unwrap_or_default();
        return Err(PushError::Rejected { status, body });
    }

    Ok(response.json::<PushReceipt>().await?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_node_file_both_shapes() {
        let list = r#"[{"name":"A","type":"trojan","server":"s1","port":443}]"#;
        let wrapped = r#"{"nodes":[{"name":"A","type":"trojan","server":"s1","port":443}]}"#;
        assert_eq!(parse_node_file(list).unwrap(), parse_node_file(wrapped).unwrap());
        assert_eq!(parse_node_file("[]").unwrap().len(), 0);
    }

    #[test]
    fn test_parse_node_file_rejects_garbage() {
        assert!(matches!(parse_node_file("{}"), Err(PushError::Parse(_))));
        assert!(matches!(parse_node_file("nope"), Err(PushError::Parse(_))));
    }

    #[test]
    fn test_update_url() {
        assert_eq!(update_url("http://hub.local"), "http://hub.local/update");
        assert_eq!(update_url("http://hub.local/"), "http://hub.local/update");
        assert_eq!(update_url("http://hub.local/update"), "http://hub.local/update");
    }

    #[test]
    fn test_read_node_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nodes.json");
        std::fs::write(&path, r#"{"nodes":[{"type":"vless","server":"v","port":"8443"}]}"#)
            .unwrap();
        let nodes = read_node_file(&path).unwrap();
        assert_eq!(nodes[0].port, 8443);

        assert!(matches!(
            read_node_file(dir.path().join("missing.json")),
            Err(PushError::Read { .. })
        ));
    }
}
