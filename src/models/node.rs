//! Node model definitions
//!
//! A [`Node`] is one proxy endpoint, independent of any output format. The protocol
//! specific part lives in [`ProxyProtocol`], one variant per supported protocol, so a
//! trojan node cannot carry hysteria2 fields and vice versa.
//!
//! Nodes are (de)serialized through their wire form, [`RawNode`](super::RawNode),
//! which is the flat JSON object pushed by clients and persisted in the store.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::raw_node::RawNode;
use crate::constants::DEFAULT_NODE_NAME;

/// Tag for the protocols the encoders know about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProtocolKind {
    VMess,
    Vless,
    Hysteria2,
    Trojan,
}

impl ProtocolKind {
    /// The `type` token used on the wire and in the Clash document.
    pub fn as_str(self) -> &'static str {
        match self {
            ProtocolKind::VMess => "vmess",
            ProtocolKind::Vless => "vless",
            ProtocolKind::Hysteria2 => "hysteria2",
            ProtocolKind::Trojan => "trojan",
        }
    }

    pub fn from_type(token: &str) -> Option<Self> {
        match token {
            "vmess" => Some(ProtocolKind::VMess),
            "vless" => Some(ProtocolKind::Vless),
            "hysteria2" => Some(ProtocolKind::Hysteria2),
            "trojan" => Some(ProtocolKind::Trojan),
            _ => None,
        }
    }
}

/// Reality handshake credentials. Either half may be missing or empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct RealityOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub short_id: Option<String>,
}

impl RealityOptions {
    pub fn new(public_key: &str, short_id: &str) -> Self {
        RealityOptions {
            public_key: Some(public_key.to_string()),
            short_id: Some(short_id.to_string()),
        }
    }

    pub fn public_key(&self) -> Option<&str> {
        non_empty(&self.public_key)
    }

    pub fn short_id(&self) -> Option<&str> {
        non_empty(&self.short_id)
    }

    pub fn is_empty(&self) -> bool {
        self.public_key().is_none() && self.short_id().is_none()
    }
}

/// Websocket transport options.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WsOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headers: Option<BTreeMap<String, String>>,
}

impl WsOptions {
    pub fn path(&self) -> Option<&str> {
        non_empty(&self.path)
    }

    /// The `Host` header, if the header map carries one.
    pub fn host(&self) -> Option<&str> {
        self.headers
            .as_ref()
            .and_then(|headers| headers.get("Host"))
            .map(String::as_str)
            .filter(|host| !host.is_empty())
    }
}

/// TLS settings shared by every protocol.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TlsOptions {
    pub enabled: Option<bool>,
    pub servername: Option<String>,
    pub client_fingerprint: Option<String>,
    pub fingerprint: Option<String>,
}

impl TlsOptions {
    pub fn is_enabled(&self) -> bool {
        self.enabled.unwrap_or(false)
    }

    pub fn servername(&self) -> Option<&str> {
        non_empty(&self.servername)
    }

    pub fn client_fingerprint(&self) -> Option<&str> {
        non_empty(&self.client_fingerprint)
    }

    pub fn fingerprint(&self) -> Option<&str> {
        non_empty(&self.fingerprint)
    }
}

/// Transport layer settings shared by every protocol.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransportOptions {
    pub network: Option<String>,
    pub ws: Option<WsOptions>,
}

impl TransportOptions {
    pub fn network(&self) -> Option<&str> {
        non_empty(&self.network)
    }
}

/// Hysteria2 obfuscation; the password is only meaningful next to a method.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Obfuscation {
    pub method: String,
    pub password: Option<String>,
}

impl Obfuscation {
    pub fn password(&self) -> Option<&str> {
        non_empty(&self.password)
    }
}

/// Protocol specific part of a node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProxyProtocol {
    VMess {
        uuid: Option<String>,
        cipher: Option<String>,
        alter_id: Option<String>,
    },
    Vless {
        uuid: Option<String>,
        flow: Option<String>,
        reality: Option<RealityOptions>,
    },
    Hysteria2 {
        password: Option<String>,
        obfs: Option<Obfuscation>,
        sni: Option<String>,
        up: Option<String>,
        down: Option<String>,
    },
    Trojan {
        password: Option<String>,
    },
    /// Unknown or missing `type`. Kept so the document encoder can pass it through.
    Opaque {
        kind: Option<String>,
        uuid: Option<String>,
        password: Option<String>,
        cipher: Option<String>,
        alter_id: Option<String>,
        flow: Option<String>,
        reality: Option<RealityOptions>,
    },
}

impl ProxyProtocol {
    pub fn kind(&self) -> Option<ProtocolKind> {
        match self {
            ProxyProtocol::VMess { .. } => Some(ProtocolKind::VMess),
            ProxyProtocol::Vless { .. } => Some(ProtocolKind::Vless),
            ProxyProtocol::Hysteria2 { .. } => Some(ProtocolKind::Hysteria2),
            ProxyProtocol::Trojan { .. } => Some(ProtocolKind::Trojan),
            ProxyProtocol::Opaque { .. } => None,
        }
    }

    /// The `type` token as rendered in the document. Empty when the node had none.
    pub fn type_token(&self) -> &str {
        match self {
            ProxyProtocol::Opaque { kind, .. } => kind.as_deref().unwrap_or_default(),
            other => other.kind().map(ProtocolKind::as_str).unwrap_or_default(),
        }
    }
}

/// A single proxy endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawNode", into = "RawNode")]
pub struct Node {
    pub name: Option<String>,
    /// Empty when the pushed node had none; rendered as an empty token.
    pub server: String,
    pub port: u16,
    pub tls: TlsOptions,
    pub transport: TransportOptions,
    pub protocol: ProxyProtocol,
}

impl Node {
    pub fn new(name: &str, server: &str, port: u16, protocol: ProxyProtocol) -> Self {
        Node {
            name: Some(name.to_string()),
            server: server.to_string(),
            port,
            tls: TlsOptions::default(),
            transport: TransportOptions::default(),
            protocol,
        }
    }

    /// Name shown to users, falling back to a placeholder.
    pub fn display_name(&self) -> &str {
        non_empty(&self.name).unwrap_or(DEFAULT_NODE_NAME)
    }

    pub fn kind(&self) -> Option<ProtocolKind> {
        self.protocol.kind()
    }

    pub fn uuid(&self) -> Option<&str> {
        match &self.protocol {
            ProxyProtocol::VMess { uuid, .. }
            | ProxyProtocol::Vless { uuid, .. }
            | ProxyProtocol::Opaque { uuid, .. } => non_empty(uuid),
            _ => None,
        }
    }

    pub fn password(&self) -> Option<&str> {
        match &self.protocol {
            ProxyProtocol::Hysteria2 { password, .. }
            | ProxyProtocol::Trojan { password }
            | ProxyProtocol::Opaque { password, .. } => non_empty(password),
            _ => None,
        }
    }

    pub fn cipher(&self) -> Option<&str> {
        match &self.protocol {
            ProxyProtocol::VMess { cipher, .. } | ProxyProtocol::Opaque { cipher, .. } => {
                non_empty(cipher)
            }
            _ => None,
        }
    }

    pub fn alter_id(&self) -> Option<&str> {
        match &self.protocol {
            ProxyProtocol::VMess { alter_id, .. } | ProxyProtocol::Opaque { alter_id, .. } => {
                non_empty(alter_id)
            }
            _ => None,
        }
    }

    pub fn flow(&self) -> Option<&str> {
        match &self.protocol {
            ProxyProtocol::Vless { flow, .. } | ProxyProtocol::Opaque { flow, .. } => {
                non_empty(flow)
            }
            _ => None,
        }
    }

    /// Reality block, `None` unless at least one half carries a value.
    pub fn reality(&self) -> Option<&RealityOptions> {
        match &self.protocol {
            ProxyProtocol::Vless { reality, .. } | ProxyProtocol::Opaque { reality, .. } => {
                reality.as_ref().filter(|reality| !reality.is_empty())
            }
            _ => None,
        }
    }

    pub fn ws(&self) -> Option<&WsOptions> {
        self.transport.ws.as_ref()
    }
}

/// Treats `Some("")` the same as `None`.
pub(crate) fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}
