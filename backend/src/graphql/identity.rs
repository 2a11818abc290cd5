//! Client identity used to key the mutation throttle
//!
//! The HTTP handler derives a [`ClientIdentity`] from proxy headers or the
//! peer address and attaches it to each GraphQL request as data.

use std::net::SocketAddr;

use async_graphql::Context;
use axum::http::HeaderMap;

/// Identity used when nothing better is known
pub const ANONYMOUS: &str = "anonymous";

/// Request-scoped identity of the caller
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientIdentity(pub String);

impl ClientIdentity {
    /// Resolve from `X-Forwarded-For` (first hop), then `X-Real-IP`, then the
    /// peer address.
    pub fn from_request(headers: &HeaderMap, peer: Option<SocketAddr>) -> Self {
        let forwarded = headers
            .get("x-forwarded-for")
            .and_then(|h| h.to_str().ok())
            .and_then(|h| h.split(',').next())
            .map(str::trim)
            .filter(|h| !h.is_empty());

        let real_ip = headers
            .get("x-real-ip")
            .and_then(|h| h.to_str().ok())
            .map(str::trim)
            .filter(|h| !h.is_empty());

        let identity = forwarded
            .or(real_ip)
            .map(str::to_string)
            .or_else(|| peer.map(|addr| addr.ip().to_string()))
            .unwrap_or_else(|| ANONYMOUS.to_string());

        Self(identity)
    }
}

/// Extension trait to read the caller identity from GraphQL context
pub trait IdentityExt {
    fn client_identity(&self) -> &str;
}

impl<'a> IdentityExt for Context<'a> {
    fn client_identity(&self) -> &str {
        self.data_opt::<ClientIdentity>()
            .map(|identity| identity.0.as_str())
            .unwrap_or(ANONYMOUS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_forwarded_for_wins() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_static(" 203.0.113.9, 10.0.0.1"));
        headers.insert("x-real-ip", HeaderValue::from_static("198.51.100.7"));

        let identity = ClientIdentity::from_request(&headers, "127.0.0.1:9000".parse().ok());
        assert_eq!(identity.0, "203.0.113.9");
    }

    #[test]
    fn test_falls_back_to_peer_then_anonymous() {
        let headers = HeaderMap::new();

        let identity = ClientIdentity::from_request(&headers, "192.0.2.4:5555".parse().ok());
        assert_eq!(identity.0, "192.0.2.4");

        assert_eq!(ClientIdentity::from_request(&headers, None).0, ANONYMOUS);
    }
}
