//! Derives the signaling service's HTTP base URL from the WebSocket URL the
//! user supplies via `--signaling`. The service answers both `/create` and
//! `/join/{code}` over HTTP and `/ws` over WebSocket on the same host:port.

use anyhow::{bail, Result};

pub fn http_base(signaling_ws_url: &str) -> Result<String> {
    if let Some(rest) = signaling_ws_url.strip_prefix("wss://") {
        Ok(format!("https://{rest}"))
    } else if let Some(rest) = signaling_ws_url.strip_prefix("ws://") {
        Ok(format!("http://{rest}"))
    } else {
        bail!("signaling URL must start with ws:// or wss://, got {signaling_ws_url:?}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn converts_ws_to_http() {
        assert_eq!(http_base("ws://localhost:8080").unwrap(), "http://localhost:8080");
    }

    #[test]
    fn converts_wss_to_https() {
        assert_eq!(http_base("wss://example.com").unwrap(), "https://example.com");
    }

    #[test]
    fn rejects_non_ws_scheme() {
        assert!(http_base("http://localhost:8080").is_err());
    }
}
