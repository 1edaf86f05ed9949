//! Client detection from `User-Agent` strings.

/// What kind of client is asking for a subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientKind {
    /// A web browser; gets the status page.
    Browser,
    /// Clash and its forks; get the YAML document.
    Clash,
    /// Everything else; gets the link bundle.
    Other,
}

/// Classify a user agent.
///
/// Clash cores built on Go's HTTP client sometimes send a browser-like agent, so
/// `go-http` and `clash` both rule out the browser case.
pub fn match_user_agent(user_agent: &str) -> ClientKind {
    let ua = user_agent.to_lowercase();
    if ua.contains("mozilla") && !ua.contains("go-http") && !ua.contains("clash") {
        ClientKind::Browser
    } else if ua.contains("clash") {
        ClientKind::Clash
    } else {
        ClientKind::Other
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_match_user_agent() {
        assert_eq!(
            match_user_agent("Mozilla/5.0 (Windows NT 10.0; Win64; x64) Chrome/126.0"),
            ClientKind::Browser
        );
        assert_eq!(match_user_agent("clash.meta/v1.18.5"), ClientKind::Clash);
        assert_eq!(match_user_agent("ClashX Pro/1.118.0"), ClientKind::Clash);
        assert_eq!(
            match_user_agent("Mozilla/5.0 Clash for Windows"),
            ClientKind::Clash
        );
        assert_eq!(match_user_agent("Go-http-client/1.1 Mozilla"), ClientKind::Other);
        assert_eq!(match_user_agent("v2rayN/6.45"), ClientKind::Other);
        assert_eq!(match_user_agent(""), ClientKind::Other);
    }
}
