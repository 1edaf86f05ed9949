use serde::de::{self, Deserializer, IgnoredAny, Visitor};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::node::{
    Node, Obfuscation, ProtocolKind, ProxyProtocol, RealityOptions, TlsOptions, TransportOptions,
    WsOptions,
};

// Fields such as alterId or bandwidth hints arrive as numbers from some pushers and as
// strings from others.
fn deserialize_string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    struct StringOrNumberVisitor;

    impl<'de> Visitor<'de> for StringOrNumberVisitor {
        type Value = Option<String>;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("string or number")
        }

        fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(Some(value.to_string()))
        }

        fn visit_i64<E>(self, value: i64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(Some(value.to_string()))
        }

        fn visit_u64<E>(self, value: u64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(Some(value.to_string()))
        }

        fn visit_f64<E>(self, value: f64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(Some(value.to_string()))
        }

        fn visit_none<E>(self) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(None)
        }

        fn visit_unit<E>(self) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(None)
        }
    }

    deserializer.deserialize_any(StringOrNumberVisitor)
}

// Pushers are not validated: a port that is missing, out of range or not a number
// becomes 0 and is rendered as such.
fn deserialize_port<'de, D>(deserializer: D) -> Result<u16, D::Error>
where
    D: Deserializer<'de>,
{
    struct PortVisitor;

    impl<'de> Visitor<'de> for PortVisitor {
        type Value = u16;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("a port number or numeric string")
        }

        fn visit_u64<E>(self, value: u64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(u16::try_from(value).unwrap_or_default())
        }

        fn visit_i64<E>(self, value: i64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(u16::try_from(value).unwrap_or_default())
        }

        fn visit_f64<E>(self, value: f64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            if value.fract() == 0.0 && (0.0..=f64::from(u16::MAX)).contains(&value) {
                Ok(value as u16)
            } else {
                Ok(0)
            }
        }

        fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(value.trim().parse::<u16>().unwrap_or_default())
        }

        fn visit_bool<E>(self, _: bool) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(0)
        }

        fn visit_none<E>(self) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(0)
        }

        fn visit_unit<E>(self) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(0)
        }

        fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
        where
            A: de::SeqAccess<'de>,
        {
            while seq.next_element::<IgnoredAny>()?.is_some() {}
            Ok(0)
        }

        fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
        where
            A: de::MapAccess<'de>,
        {
            while map.next_entry::<IgnoredAny, IgnoredAny>()?.is_some() {}
            Ok(0)
        }
    }

    deserializer.deserialize_any(PortVisitor)
}

// `tls` arrives as a boolean from most pushers, but some send the security layer
// name instead ("tls", "reality", "none").
fn deserialize_truthy<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    struct TruthyVisitor;

    impl<'de> Visitor<'de> for TruthyVisitor {
        type Value = Option<bool>;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("a boolean, string or number")
        }

        fn visit_bool<E>(self, value: bool) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(Some(value))
        }

        fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            let value = value.trim().to_lowercase();
            Ok(Some(!matches!(
                value.as_str(),
                "" | "none" | "false" | "0" | "off" | "no"
            )))
        }

        fn visit_i64<E>(self, value: i64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(Some(value != 0))
        }

        fn visit_u64<E>(self, value: u64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(Some(value != 0))
        }

        fn visit_f64<E>(self, value: f64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(Some(value != 0.0))
        }

        fn visit_none<E>(self) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(None)
        }

        fn visit_unit<E>(self) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(None)
        }
    }

    deserializer.deserialize_any(TruthyVisitor)
}

/// Flat wire form of a node, as pushed by clients and persisted in the store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct RawNode {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub proxy_type: Option<String>,
    #[serde(default)]
    pub server: String,
    #[serde(default, deserialize_with = "deserialize_port")]
    pub port: u16,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uuid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cipher: Option<String>,
    #[serde(
        rename = "alterId",
        default,
        deserialize_with = "deserialize_string_or_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub alter_id: Option<String>,

    #[serde(
        default,
        deserialize_with = "deserialize_truthy",
        skip_serializing_if = "Option::is_none"
    )]
    pub tls: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub servername: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sni: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_fingerprint: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fingerprint: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flow: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ws_opts: Option<WsOptions>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reality_opts: Option<RealityOptions>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub obfs: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub obfs_password: Option<String>,
    #[serde(
        default,
        deserialize_with = "deserialize_string_or_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub up: Option<String>,
    #[serde(
        default,
        deserialize_with = "deserialize_string_or_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub down: Option<String>,
}

impl From<RawNode> for Node {
    fn from(raw: RawNode) -> Self {
        let kind = raw.proxy_type.as_deref().and_then(ProtocolKind::from_type);
        // Fields outside the node's protocol are dropped here.
        let protocol = match kind {
            Some(ProtocolKind::VMess) => ProxyProtocol::VMess {
                uuid: raw.uuid,
                cipher: raw.cipher,
                alter_id: raw.alter_id,
            },
            Some(ProtocolKind::Vless) => ProxyProtocol::Vless {
                uuid: raw.uuid,
                flow: raw.flow,
                reality: raw.reality_opts,
            },
            Some(ProtocolKind::Hysteria2) => ProxyProtocol::Hysteria2 {
                password: raw.password,
                obfs: raw
                    .obfs
                    .filter(|method| !method.is_empty())
                    .map(|method| Obfuscation {
                        method,
                        password: raw.obfs_password,
                    }),
                sni: raw.sni,
                up: raw.up,
                down: raw.down,
            },
            Some(ProtocolKind::Trojan) => ProxyProtocol::Trojan {
                password: raw.password,
            },
            None => ProxyProtocol::Opaque {
                kind: raw.proxy_type,
                uuid: raw.uuid,
                password: raw.password,
                cipher: raw.cipher,
                alter_id: raw.alter_id,
                flow: raw.flow,
                reality: raw.reality_opts,
            },
        };

        Node {
            name: raw.name,
            server: raw.server,
            port: raw.port,
            tls: TlsOptions {
                enabled: raw.tls,
                servername: raw.servername,
                client_fingerprint: raw.client_fingerprint,
                fingerprint: raw.fingerprint,
            },
            transport: TransportOptions {
                network: raw.network,
                ws: raw.ws_opts,
            },
            protocol,
        }
    }
}

impl From<Node> for RawNode {
    fn from(node: Node) -> Self {
        let mut raw = RawNode {
            name: node.name,
            server: node.server,
            port: node.port,
            tls: node.tls.enabled,
            servername: node.tls.servername,
            client_fingerprint: node.tls.client_fingerprint,
            fingerprint: node.tls.fingerprint,
            network: node.transport.network,
            ws_opts: node.transport.ws,
            ..RawNode::default()
        };

        match node.protocol {
            ProxyProtocol::VMess {
                uuid,
                cipher,
                alter_id,
            } => {
                raw.proxy_type = Some(ProtocolKind::VMess.as_str().to_string());
                raw.uuid = uuid;
                raw.cipher = cipher;
                raw.alter_id = alter_id;
            }
            ProxyProtocol::Vless {
                uuid,
                flow,
                reality,
            } => {
                raw.proxy_type = Some(ProtocolKind::Vless.as_str().to_string());
                raw.uuid = uuid;
                raw.flow = flow;
                raw.reality_opts = reality;
            }
            ProxyProtocol::Hysteria2 {
                password,
                obfs,
                sni,
                up,
                down,
            } => {
                raw.proxy_type = Some(ProtocolKind::Hysteria2.as_str().to_string());
                raw.password = password;
                if let Some(obfs) = obfs {
                    raw.obfs = Some(obfs.method);
                    raw.obfs_password = obfs.password;
                }
                raw.sni = sni;
                raw.up = up;
                raw.down = down;
            }
            ProxyProtocol::Trojan { password } => {
                raw.proxy_type = Some(ProtocolKind::Trojan.as_str().to_string());
                raw.password = password;
            }
            ProxyProtocol::Opaque {
                kind,
                uuid,
                password,
                cipher,
                alter_id,
                flow,
                reality,
            } => {
                raw.proxy_type = kind;
                raw.uuid = uuid;
                raw.password = password;
                raw.cipher = cipher;
                raw.alter_id = alter_id;
                raw.flow = flow;
                raw.reality_opts = reality;
            }
        }

        raw
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_vless_reality() {
        let json = r#"{
            "name": "SG Reality",
            "type": "vless",
            "server": "sg.example.com",
            "port": 443,
            "uuid": "3b2f0c1e-0000-4000-8000-000000000001",
            "flow": "xtls-rprx-vision",
            "tls": true,
            "servername": "www.microsoft.com",
            "client-fingerprint": "chrome",
            "reality-opts": { "public-key": "pbk123", "short-id": "ab12" },
            "password": "ignored-for-vless"
        }"#;
        let node: Node = serde_json::from_str(json).unwrap();
        assert_eq!(node.kind(), Some(ProtocolKind::Vless));
        assert_eq!(node.flow(), Some("xtls-rprx-vision"));
        assert_eq!(node.tls.client_fingerprint(), Some("chrome"));
        assert_eq!(node.reality().unwrap().short_id(), Some("ab12"));
        assert_eq!(node.password(), None);
    }

    #[test]
    fn test_port_and_alter_id_accept_strings() {
        let json = r#"{"type":"vmess","server":"a.example","port":"8443","alterId":0}"#;
        let node: Node = serde_json::from_str(json).unwrap();
        assert_eq!(node.port, 8443);
        assert_eq!(node.alter_id(), Some("0"));
    }

    #[test]
    fn test_bad_port_degrades_to_zero() {
        for json in [
            r#"{"type":"trojan","server":"a.example","port":0}"#,
            r#"{"type":"trojan","server":"a.example","port":70000}"#,
            r#"{"type":"trojan","server":"a.example","port":-1}"#,
            r#"{"type":"trojan","server":"a.example","port":"https"}"#,
            r#"{"type":"trojan","server":"a.example","port":null}"#,
            r#"{"type":"trojan","server":"a.example","port":[443]}"#,
            r#"{"type":"trojan","server":"a.example"}"#,
        ] {
            let node: Node = serde_json::from_str(json).unwrap();
            assert_eq!(node.port, 0, "{}", json);
        }
    }

    #[test]
    fn test_missing_server_is_empty() {
        let node: Node = serde_json::from_str(r#"{"type":"trojan","port":443,"password":"pw"}"#).unwrap();
        assert_eq!(node.server, "");
        assert_eq!(node.password(), Some("pw"));
    }

    #[test]
    fn test_tls_accepts_truthy_values() {
        let cases = [
            (r#"true"#, Some(true)),
            (r#"false"#, Some(false)),
            (r#""tls""#, Some(true)),
            (r#""reality""#, Some(true)),
            (r#""none""#, Some(false)),
            (r#""False""#, Some(false)),
            (r#""""#, Some(false)),
            (r#"1"#, Some(true)),
            (r#"0"#, Some(false)),
            (r#"null"#, None),
        ];
        for (tls, expected) in cases {
            let json = format!(r#"{{"type":"vless","server":"a","port":1,"tls":{}}}"#, tls);
            let node: Node = serde_json::from_str(&json).unwrap();
            assert_eq!(node.tls.enabled, expected, "{}", tls);
        }
    }

    #[test]
    fn test_reality_halves_are_optional() {
        let json = r#"{"type":"vless","server":"a","port":1,"reality-opts":{"public-key":"pbk"}}"#;
        let node: Node = serde_json::from_str(json).unwrap();
        let reality = node.reality().unwrap();
        assert_eq!(reality.public_key(), Some("pbk"));
        assert_eq!(reality.short_id(), None);

        let json = r#"{"type":"vless","server":"a","port":1,"reality-opts":{"public-key":"","short-id":""}}"#;
        let node: Node = serde_json::from_str(json).unwrap();
        assert!(node.reality().is_none());
    }

    #[test]
    fn test_wrong_shapes_are_still_errors() {
        assert!(serde_json::from_str::<Node>("42").is_err());
        assert!(serde_json::from_str::<Node>(r#"{"server":"a","port":1,"tls":{}}"#).is_err());
    }

    #[test]
    fn test_unknown_and_missing_type_are_opaque() {
        let json = r#"{"type":"ss","server":"a.example","port":8388,"cipher":"aes-128-gcm","password":"pw"}"#;
        let node: Node = serde_json::from_str(json).unwrap();
        assert_eq!(node.kind(), None);
        assert_eq!(node.protocol.type_token(), "ss");
        assert_eq!(node.cipher(), Some("aes-128-gcm"));

        let json = r#"{"server":"a.example","port":8388}"#;
        let node: Node = serde_json::from_str(json).unwrap();
        assert_eq!(node.protocol.type_token(), "");
    }

    #[test]
    fn test_round_trip_through_wire_form() {
        let json = r#"{"name":"HY2","type":"hysteria2","server":"h.example","port":8443,"password":"pw","obfs":"salamander","obfs-password":"secret","sni":"h.example","up":"50 Mbps","down":200}"#;
        let node: Node = serde_json::from_str(json).unwrap();
        let persisted = serde_json::to_string(&node).unwrap();
        let again: Node = serde_json::from_str(&persisted).unwrap();
        assert_eq!(node, again);
        assert!(persisted.contains(r#""obfs-password":"secret""#));
        assert!(persisted.contains(r#""down":"200""#));
    }
}
