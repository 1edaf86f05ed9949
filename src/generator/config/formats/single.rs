use std::borrow::Cow;

use log::debug;
use serde::Serialize;

use crate::models::{Node, ProtocolKind, ProxyProtocol};
use crate::utils::base64::base64_encode;
use crate::utils::url::url_encode;

/// v2rayN rejects hysteria2 links carrying a fingerprint, so they are never written,
/// even though the Clash document keeps them for every protocol.
pub const HYSTERIA2_LINK_EMITS_FINGERPRINT: bool = false;

/// A vless node with both `tls` and a Reality block gets `security=tls` and
/// `security=reality`. Clients take the last value; kept as-is pending confirmation
/// against more parsers.
pub const VLESS_LINK_KEEPS_DUPLICATE_SECURITY: bool = true;

/// One query parameter of a share link. `None` leaves the parameter out.
struct QueryRule {
    key: &'static str,
    value: fn(&Node) -> Option<Cow<'_, str>>,
}

/// Layout of a `scheme://credential@host:port?query#label` link.
struct UriLink {
    kind: ProtocolKind,
    scheme: &'static str,
    credential: fn(&Node) -> Option<&str>,
    query: &'static [QueryRule],
}

const URI_LINKS: &[UriLink] = &[
    UriLink {
        kind: ProtocolKind::Vless,
        scheme: "vless",
        credential: Node::uuid,
        query: VLESS_QUERY,
    },
    UriLink {
        kind: ProtocolKind::Hysteria2,
        scheme: "hysteria2",
        credential: Node::password,
        query: HYSTERIA2_QUERY,
    },
    UriLink {
        kind: ProtocolKind::Trojan,
        scheme: "trojan",
        credential: Node::password,
        query: TROJAN_QUERY,
    },
];

const VLESS_QUERY: &[QueryRule] = &[
    QueryRule { key: "security", value: vless_security_tls },
    QueryRule { key: "security", value: vless_security_reality },
    QueryRule { key: "pbk", value: reality_public_key },
    QueryRule { key: "sid", value: reality_short_id },
    QueryRule { key: "sni", value: servername },
    QueryRule { key: "flow", value: flow },
    QueryRule { key: "fp", value: client_fingerprint },
    QueryRule { key: "type", value: network },
    QueryRule { key: "path", value: ws_path },
    QueryRule { key: "host", value: ws_host },
];

const HYSTERIA2_QUERY: &[QueryRule] = &[
    QueryRule { key: "sni", value: hysteria2_sni },
    QueryRule { key: "obfs", value: hysteria2_obfs },
    QueryRule { key: "obfs-password", value: hysteria2_obfs_password },
    QueryRule { key: "fp", value: hysteria2_fingerprint },
];

const TROJAN_QUERY: &[QueryRule] = &[QueryRule { key: "sni", value: servername }];

fn vless_security_tls(node: &Node) -> Option<Cow<'_, str>> {
    if !node.tls.is_enabled() {
        return None;
    }
    if node.reality().is_some() && !VLESS_LINK_KEEPS_DUPLICATE_SECURITY {
        return None;
    }
    Some(Cow::Borrowed("tls"))
}

fn vless_security_reality(node: &Node) -> Option<Cow<'_, str>> {
    node.reality().map(|_| Cow::Borrowed("reality"))
}

fn reality_public_key(node: &Node) -> Option<Cow<'_, str>> {
    node.reality()
        .and_then(|reality| reality.public_key())
        .map(Cow::Borrowed)
}

fn reality_short_id(node: &Node) -> Option<Cow<'_, str>> {
    node.reality()
        .and_then(|reality| reality.short_id())
        .map(Cow::Borrowed)
}

fn servername(node: &Node) -> Option<Cow<'_, str>> {
    node.tls.servername().map(Cow::Borrowed)
}

fn flow(node: &Node) -> Option<Cow<'_, str>> {
    node.flow().map(Cow::Borrowed)
}

fn client_fingerprint(node: &Node) -> Option<Cow<'_, str>> {
    node.tls.client_fingerprint().map(Cow::Borrowed)
}

fn network(node: &Node) -> Option<Cow<'_, str>> {
    node.transport.network().map(Cow::Borrowed)
}

fn ws_path(node: &Node) -> Option<Cow<'_, str>> {
    node.ws()
        .and_then(|ws| ws.path())
        .map(|path| Cow::Owned(url_encode(path)))
}

fn ws_host(node: &Node) -> Option<Cow<'_, str>> {
    node.ws().and_then(|ws| ws.host()).map(Cow::Borrowed)
}

fn hysteria2_sni(node: &Node) -> Option<Cow<'_, str>> {
    match &node.protocol {
        ProxyProtocol::Hysteria2 { sni, .. } => sni
            .as_deref()
            .filter(|sni| !sni.is_empty())
            .map(Cow::Borrowed),
        _ => None,
    }
}

fn hysteria2_obfs(node: &Node) -> Option<Cow<'_, str>> {
    match &node.protocol {
        ProxyProtocol::Hysteria2 { obfs: Some(obfs), .. } => {
            Some(Cow::Borrowed(obfs.method.as_str()))
        }
        _ => None,
    }
}

fn hysteria2_obfs_password(node: &Node) -> Option<Cow<'_, str>> {
    match &node.protocol {
        ProxyProtocol::Hysteria2 { obfs: Some(obfs), .. } => obfs.password().map(Cow::Borrowed),
        _ => None,
    }
}

fn hysteria2_fingerprint(node: &Node) -> Option<Cow<'_, str>> {
    if !HYSTERIA2_LINK_EMITS_FINGERPRINT {
        return None;
    }
    node.tls.client_fingerprint().map(Cow::Borrowed)
}

/// The JSON record carried by a `vmess://` link, in v2rayN's field order.
#[derive(Debug, Serialize)]
struct VMessShareLink<'a> {
    v: &'static str,
    ps: &'a str,
    add: &'a str,
    port: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<&'a str>,
    aid: &'static str,
    net: &'a str,
    #[serde(rename = "type")]
    header_type: &'static str,
    host: &'a str,
    path: &'a str,
    tls: &'static str,
}

fn vmess_to_uri(node: &Node) -> Option<String> {
    let ws = node.ws();
    let record = VMessShareLink {
        v: "2",
        ps: node.display_name(),
        add: &node.server,
        port: node.port,
        id: node.uuid(),
        aid: "0",
        net: node.transport.network().unwrap_or("tcp"),
        header_type: "none",
        host: ws.and_then(|ws| ws.host()).unwrap_or(""),
        path: ws.and_then(|ws| ws.path()).unwrap_or("/"),
        tls: if node.tls.is_enabled() { "tls" } else { "" },
    };

    match serde_json::to_string(&record) {
        Ok(json) => Some(format!("vmess://{}", base64_encode(&json))),
        Err(e) => {
            debug!("Failed to serialize vmess link for '{}': {}", node.display_name(), e);
            None
        }
    }
}

/// IPv6 literals need brackets inside a URI authority.
fn uri_host(server: &str) -> Cow<'_, str> {
    if server.contains(':') && !server.starts_with('[') {
        Cow::Owned(format!("[{}]", server))
    } else {
        Cow::Borrowed(server)
    }
}

fn uri_link(node: &Node, link: &UriLink) -> String {
    let mut uri = format!(
        "{}://{}@{}:{}",
        link.scheme,
        (link.credential)(node).unwrap_or_default(),
        uri_host(&node.server),
        node.port
    );

    let params: Vec<String> = link
        .query
        .iter()
        .filter_map(|rule| (rule.value)(node).map(|value| format!("{}={}", rule.key, value)))
        .collect();
    if !params.is_empty() {
        uri.push('?');
        uri.push_str(&params.join("&"));
    }

    uri.push('#');
    uri.push_str(&url_encode(node.display_name()));
    uri
}

/// Convert a node to its share link
///
/// Returns `None` for protocols without a link form; those nodes are left out of the
/// bundle.
pub fn proxy_to_uri(node: &Node) -> Option<String> {
    let kind = node.kind()?;
    if kind == ProtocolKind::VMess {
        return vmess_to_uri(node);
    }
    URI_LINKS
        .iter()
        .find(|link| link.kind == kind)
        .map(|link| uri_link(node, link))
}

/// Convert nodes to share links, in input order, skipping unsupported protocols.
pub fn proxy_to_links(nodes: &[Node]) -> Vec<String> {
    nodes
        .iter()
        .filter_map(|node| {
            let link = proxy_to_uri(node);
            if link.is_none() {
                debug!(
                    "Skipping node '{}' with unsupported type '{}'",
                    node.display_name(),
                    node.protocol.type_token()
                );
            }
            link
        })
        .collect()
}

/// Convert nodes to a base64 link bundle
///
/// Links are joined with a single `\n` and the whole text is base64 encoded. An empty
/// node list, or one with only unsupported protocols, yields an empty string.
///
/// # Arguments
/// * `nodes` - Nodes to render, in the order they should appear
pub fn proxy_to_single(nodes: &[Node]) -> String {
    base64_encode(&proxy_to_links(nodes).join("\n"))
}
