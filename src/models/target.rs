use crate::constants::{CONTENT_TYPE_TEXT, CONTENT_TYPE_YAML};
use crate::generator::config::formats::{proxy_to_clash, proxy_to_single};
use crate::models::Node;

/// Output formats a subscription can be served in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SubscriptionTarget {
    /// Clash / Clash.Meta YAML document
    Clash,
    /// base64 bundle of share links (v2rayN and friends)
    V2Ray,
}

impl SubscriptionTarget {
    /// Map a format token to a target. Anything that is not `clash` falls back to the
    /// link bundle.
    pub fn from_format(token: &str) -> Self {
        if token.trim().eq_ignore_ascii_case("clash") {
            SubscriptionTarget::Clash
        } else {
            SubscriptionTarget::V2Ray
        }
    }

    pub fn to_str(self) -> &'static str {
        match self {
            SubscriptionTarget::Clash => "clash",
            SubscriptionTarget::V2Ray => "v2ray",
        }
    }

    pub fn content_type(self) -> &'static str {
        match self {
            SubscriptionTarget::Clash => CONTENT_TYPE_YAML,
            SubscriptionTarget::V2Ray => CONTENT_TYPE_TEXT,
        }
    }

    /// The encoder serving this target.
    pub fn encoder(self) -> fn(&[Node]) -> String {
        match self {
            SubscriptionTarget::Clash => proxy_to_clash,
            SubscriptionTarget::V2Ray => proxy_to_single,
        }
    }

    pub fn encode(self, nodes: &[Node]) -> String {
        (self.encoder())(nodes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_format() {
        assert_eq!(SubscriptionTarget::from_format("clash"), SubscriptionTarget::Clash);
        assert_eq!(SubscriptionTarget::from_format("Clash"), SubscriptionTarget::Clash);
        assert_eq!(SubscriptionTarget::from_format("v2ray"), SubscriptionTarget::V2Ray);
        assert_eq!(SubscriptionTarget::from_format(""), SubscriptionTarget::V2Ray);
        assert_eq!(SubscriptionTarget::from_format("surge"), SubscriptionTarget::V2Ray);
    }

    #[test]
    fn test_content_type() {
        assert_eq!(
            SubscriptionTarget::Clash.content_type(),
            "text/yaml; charset=utf-8"
        );
        assert_eq!(
            SubscriptionTarget::V2Ray.content_type(),
            "text/plain; charset=utf-8"
        );
    }
}
