use log::{debug, error};
use serde_yaml::{Mapping, Value};

use crate::constants::{
    CLASH_ALLOW_LAN, CLASH_DIRECT, CLASH_LOG_LEVEL, CLASH_MIXED_PORT, CLASH_MODE,
    CLASH_SELECT_GROUP,
};
use crate::generator::yaml::{block, key, number_or_string, string};
use crate::models::{Node, ProxyProtocol};

/// One row of the proxy entry layout: the output key and how to read it off a node.
/// `None` leaves the key out.
struct FieldRule {
    key: &'static str,
    value: fn(&Node) -> Option<Value>,
}

/// Keys of a proxy entry after `name`, in output order.
const PROXY_FIELDS: &[FieldRule] = &[
    FieldRule { key: "type", value: proxy_type },
    FieldRule { key: "server", value: server },
    FieldRule { key: "port", value: port },
    FieldRule { key: "skip-cert-verify", value: always_true },
    FieldRule { key: "udp", value: always_true },
    FieldRule { key: "uuid", value: uuid },
    FieldRule { key: "password", value: password },
    FieldRule { key: "cipher", value: cipher },
    FieldRule { key: "alterId", value: alter_id },
    FieldRule { key: "tls", value: tls },
    FieldRule { key: "servername", value: servername },
    FieldRule { key: "client-fingerprint", value: client_fingerprint },
    FieldRule { key: "fingerprint", value: fingerprint },
    FieldRule { key: "reality-opts", value: reality_opts },
    FieldRule { key: "flow", value: flow },
    FieldRule { key: "obfs", value: hysteria2_obfs },
    FieldRule { key: "obfs-password", value: hysteria2_obfs_password },
    FieldRule { key: "sni", value: hysteria2_sni },
    FieldRule { key: "up", value: hysteria2_up },
    FieldRule { key: "down", value: hysteria2_down },
    FieldRule { key: "network", value: network },
    FieldRule { key: "ws-opts", value: ws_opts },
];

fn proxy_type(node: &Node) -> Option<Value> {
    Some(string(node.protocol.type_token()))
}

fn server(node: &Node) -> Option<Value> {
    Some(string(&node.server))
}

fn port(node: &Node) -> Option<Value> {
    Some(Value::Number(node.port.into()))
}

fn always_true(_: &Node) -> Option<Value> {
    Some(Value::Bool(true))
}

fn uuid(node: &Node) -> Option<Value> {
    node.uuid().map(string)
}

fn password(node: &Node) -> Option<Value> {
    node.password().map(string)
}

fn cipher(node: &Node) -> Option<Value> {
    node.cipher().map(string)
}

fn alter_id(node: &Node) -> Option<Value> {
    node.alter_id().map(number_or_string)
}

fn tls(node: &Node) -> Option<Value> {
    node.tls.is_enabled().then_some(Value::Bool(true))
}

// Only meaningful inside the TLS block.
fn servername(node: &Node) -> Option<Value> {
    if !node.tls.is_enabled() {
        return None;
    }
    node.tls.servername().map(string)
}

fn client_fingerprint(node: &Node) -> Option<Value> {
    node.tls.client_fingerprint().map(string)
}

fn fingerprint(node: &Node) -> Option<Value> {
    node.tls.fingerprint().map(string)
}

fn reality_opts(node: &Node) -> Option<Value> {
    let reality = node.reality()?;
    block([
        ("public-key", reality.public_key().map(string)),
        ("short-id", reality.short_id().map(string)),
    ])
}

fn flow(node: &Node) -> Option<Value> {
    node.flow().map(string)
}

fn hysteria2_obfs(node: &Node) -> Option<Value> {
    match &node.protocol {
        ProxyProtocol::Hysteria2 { obfs: Some(obfs), .. } => Some(string(&obfs.method)),
        _ => None,
    }
}

fn hysteria2_obfs_password(node: &Node) -> Option<Value> {
    match &node.protocol {
        ProxyProtocol::Hysteria2 { obfs: Some(obfs), .. } => obfs.password().map(string),
        _ => None,
    }
}

fn hysteria2_sni(node: &Node) -> Option<Value> {
    match &node.protocol {
        ProxyProtocol::Hysteria2 { sni, .. } => non_empty(sni).map(string),
        _ => None,
    }
}

fn hysteria2_up(node: &Node) -> Option<Value> {
    match &node.protocol {
        ProxyProtocol::Hysteria2 { up, .. } => non_empty(up).map(number_or_string),
        _ => None,
    }
}

fn hysteria2_down(node: &Node) -> Option<Value> {
    match &node.protocol {
        ProxyProtocol::Hysteria2 { down, .. } => non_empty(down).map(number_or_string),
        _ => None,
    }
}

fn network(node: &Node) -> Option<Value> {
    node.transport.network().map(string)
}

fn ws_opts(node: &Node) -> Option<Value> {
    let ws = node.ws()?;
    block([
        ("path", ws.path().map(string)),
        ("headers", block([("Host", ws.host().map(string))])),
    ])
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

/// One proxy entry: `name` first, then the [`PROXY_FIELDS`] that apply.
fn proxy_entry(node: &Node) -> Mapping {
    let mut proxy = Mapping::new();
    proxy.insert(key("name"), string(node.display_name()));
    for rule in PROXY_FIELDS {
        if let Some(value) = (rule.value)(node) {
            proxy.insert(key(rule.key), value);
        }
    }
    proxy
}

/// Convert nodes to a Clash configuration document
///
/// The document has a fixed preamble, one proxy entry per node in input order, a single
/// `select` group listing `DIRECT` followed by every node name, and one catch-all rule
/// pointing at that group. Nothing is validated: a node without a `type` renders an
/// empty type token.
///
/// # Arguments
/// * `nodes` - Nodes to render, in the order they should appear
pub fn proxy_to_clash(nodes: &[Node]) -> String {
    let mut proxies = Vec::with_capacity(nodes.len());
    let mut members = vec![string(CLASH_DIRECT)];

    for node in nodes {
        if node.kind().is_none() {
            debug!(
                "Passing through node '{}' with unrecognized type '{}'",
                node.display_name(),
                node.protocol.type_token()
            );
        }
        proxies.push(Value::Mapping(proxy_entry(node)));
        members.push(string(node.display_name()));
    }

    let mut group = Mapping::new();
    group.insert(key("name"), string(CLASH_SELECT_GROUP));
    group.insert(key("type"), string("select"));
    group.insert(key("proxies"), Value::Sequence(members));

    let mut yaml_node = Mapping::new();
    yaml_node.insert(key("mixed-port"), Value::Number(CLASH_MIXED_PORT.into()));
    yaml_node.insert(key("allow-lan"), Value::Bool(CLASH_ALLOW_LAN));
    yaml_node.insert(key("mode"), string(CLASH_MODE));
    yaml_node.insert(key("log-level"), string(CLASH_LOG_LEVEL));
    yaml_node.insert(key("proxies"), Value::Sequence(proxies));
    yaml_node.insert(key("proxy-groups"), Value::Sequence(vec![Value::Mapping(group)]));
    yaml_node.insert(
        key("rules"),
        Value::Sequence(vec![string(&format!("MATCH, {}", CLASH_SELECT_GROUP))]),
    );

    match serde_yaml::to_string(&yaml_node) {
        Ok(result) => result,
        Err(e) => {
            error!("Failed to serialize Clash document: {}", e);
            String::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Obfuscation, RealityOptions};

    fn keys(node: &Node) -> Vec<String> {
        proxy_entry(node)
            .keys()
            .filter_map(|k| k.as_str().map(str::to_string))
            .collect()
    }

    fn parsed(nodes: &[Node]) -> Value {
        serde_yaml::from_str(&proxy_to_clash(nodes)).unwrap()
    }

    fn trojan(password: &str) -> Node {
        Node::new(
            "A",
            "s1.example",
            443,
            ProxyProtocol::Trojan {
                password: Some(password.to_string()),
            },
        )
    }

    #[test]
    fn test_minimal_trojan_fields() {
        assert_eq!(
            keys(&trojan("pw")),
            vec!["name", "type", "server", "port", "skip-cert-verify", "udp", "password"]
        );
    }

    #[test]
    fn test_servername_requires_tls() {
        let mut node = Node::new("A", "s1.example", 443, ProxyProtocol::Trojan { password: None });
        node.tls.servername = Some("s1.example".to_string());
        assert!(!keys(&node).contains(&"servername".to_string()));

        node.tls.enabled = Some(true);
        let keys = keys(&node);
        assert!(keys.contains(&"tls".to_string()));
        assert!(keys.contains(&"servername".to_string()));
    }

    #[test]
    fn test_hysteria2_block_only_for_hysteria2() {
        let hy2 = Node::new(
            "H",
            "h.example",
            8443,
            ProxyProtocol::Hysteria2 {
                password: Some("pw".to_string()),
                obfs: Some(Obfuscation {
                    method: "salamander".to_string(),
                    password: None,
                }),
                sni: Some("h.example".to_string()),
                up: None,
                down: Some("100".to_string()),
            },
        );
        assert_eq!(
            keys(&hy2),
            vec![
                "name",
                "type",
                "server",
                "port",
                "skip-cert-verify",
                "udp",
                "password",
                "obfs",
                "sni",
                "down"
            ]
        );
        assert_eq!(parsed(&[hy2])["proxies"][0]["down"].as_u64(), Some(100));
    }

    #[test]
    fn test_reality_renders_present_halves() {
        let mut node = Node::new(
            "R",
            "r.example",
            443,
            ProxyProtocol::Vless {
                uuid: Some("id".to_string()),
                flow: Some("xtls-rprx-vision".to_string()),
                reality: Some(RealityOptions::new("pbk", "sid")),
            },
        );
        let document = parsed(&[node.clone()]);
        let proxy = &document["proxies"][0];
        assert_eq!(proxy["reality-opts"]["public-key"].as_str(), Some("pbk"));
        assert_eq!(proxy["reality-opts"]["short-id"].as_str(), Some("sid"));
        assert_eq!(proxy["flow"].as_str(), Some("xtls-rprx-vision"));

        if let ProxyProtocol::Vless { reality, .. } = &mut node.protocol {
            *reality = Some(RealityOptions::new("pbk", ""));
        }
        let document = parsed(&[node.clone()]);
        let opts = document["proxies"][0]["reality-opts"].as_mapping().unwrap();
        assert_eq!(opts.len(), 1);
        assert_eq!(opts.get("public-key").and_then(Value::as_str), Some("pbk"));

        if let ProxyProtocol::Vless { reality, .. } = &mut node.protocol {
            *reality = Some(RealityOptions::new("", ""));
        }
        assert!(!keys(&node).contains(&"reality-opts".to_string()));
    }

    #[test]
    fn test_credentials_with_yaml_indicators() {
        for password in ["*pw", "abc #def", "&anchor", "- dash", "key: value", "'quoted'", "true", "443"] {
            let document = parsed(&[trojan(password)]);
            assert_eq!(document["proxies"][0]["password"].as_str(), Some(password));
        }
    }

    #[test]
    fn test_empty_document_shape() {
        let document = parsed(&[]);
        assert_eq!(document["mixed-port"].as_u64(), Some(7890));
        assert_eq!(document["allow-lan"].as_bool(), Some(true));
        assert_eq!(document["mode"].as_str(), Some("rule"));
        assert_eq!(document["log-level"].as_str(), Some("info"));
        assert_eq!(document["proxies"].as_sequence().map(Vec::len), Some(0));
        assert_eq!(document["proxy-groups"][0]["name"].as_str(), Some("🚀 Proxy"));
        assert_eq!(document["proxy-groups"][0]["type"].as_str(), Some("select"));
        assert_eq!(
            document["proxy-groups"][0]["proxies"],
            Value::Sequence(vec![string("DIRECT")])
        );
        assert_eq!(document["rules"][0].as_str(), Some("MATCH, 🚀 Proxy"));
    }
}
