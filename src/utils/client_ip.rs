//! Client IP resolution for click metadata and rate limiting.

use axum::http::HeaderMap;
use std::net::{IpAddr, SocketAddr};

/// Resolves the client address of a request.
///
/// With `behind_proxy`, the first `X-Forwarded-For` entry wins, then
/// `X-Real-IP`. Without it, forwarding headers are ignored because any client
/// could set them. Falls back to the socket peer.
pub fn client_ip(headers: &HeaderMap, peer: Option<SocketAddr>, behind_proxy: bool) -> Option<IpAddr> {
    if behind_proxy {
        let forwarded = headers
            .get("x-forwarded-for")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .and_then(|v| v.trim().parse().ok());

        let real_ip = || {
            headers
                .get("x-real-ip")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.trim().parse().ok())
        };

        if let Some(ip) = forwarded.or_else(real_ip) {
            return Some(ip);
        }
    }

    peer.map(|addr| addr.ip())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn peer() -> Option<SocketAddr> {
        Some("10.0.0.1:54321".parse().unwrap())
    }

    fn headers(pairs: &[(&'static str, &'static str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.insert(*name, HeaderValue::from_static(value));
        }
        map
    }

    #[test]
    fn test_peer_address_without_proxy() {
        let h = headers(&[("x-forwarded-for", "203.0.113.7")]);
        assert_eq!(client_ip(&h, peer(), false), "10.0.0.1".parse().ok());
    }

    #[test]
    fn test_forwarded_for_first_entry_behind_proxy() {
        let h = headers(&[("x-forwarded-for", "203.0.113.7, 10.0.0.2")]);
        assert_eq!(client_ip(&h, peer(), true), "203.0.113.7".parse().ok());
    }

    #[test]
    fn test_real_ip_fallback() {
        let h = headers(&[("x-forwarded-for", "garbage"), ("x-real-ip", "198.51.100.4")]);
        assert_eq!(client_ip(&h, peer(), true), "198.51.100.4".parse().ok());
    }

    #[test]
    fn test_no_source() {
        assert_eq!(client_ip(&HeaderMap::new(), None, true), None);
    }
}
