//! Client key extractor used by the admission middleware.

use std::convert::Infallible;
use std::net::SocketAddr;

use axum::extract::{ConnectInfo, FromRequestParts};
use axum::http::request::Parts;

use crate::state::AppState;

/// Header consulted when `admission.trust_forwarded_for` is enabled.
const FORWARDED_FOR: &str = "x-forwarded-for";

/// Key used when the peer address is unavailable.
const UNKNOWN_CLIENT: &str = "unknown";

/// The caller's address as used for admission control.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientKey(pub String);

impl ClientKey {
    /// Resolves the client key from request parts.
    ///
    /// Uses the first `X-Forwarded-For` hop when `trust_forwarded_for` is set
    /// and the header is present, otherwise the peer IP from `ConnectInfo`.
    pub fn resolve(parts: &Parts, trust_forwarded_for: bool) -> Self {
        if trust_forwarded_for {
            let forwarded = parts
                .headers
                .get(FORWARDED_FOR)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.split(',').next())
                .map(str::trim)
                .filter(|hop| !hop.is_empty());
            if let Some(hop) = forwarded {
                return Self(hop.to_string());
            }
        }

        parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| Self(addr.ip().to_string()))
            .unwrap_or_else(|| Self(UNKNOWN_CLIENT.to_string()))
    }

    /// Returns the key as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromRequestParts<AppState> for ClientKey {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        Ok(Self::resolve(parts, state.config.admission.trust_forwarded_for))
    }
}

#[cfg(test)]
mod tests {
    use axum::http::Request;

    use super::*;

    fn parts(forwarded: Option<&str>, peer: Option<&str>) -> Parts {
        let mut builder = Request::builder().uri("/");
        if let Some(value) = forwarded {
            builder = builder.header(FORWARDED_FOR, value);
        }
        let mut request = builder.body(()).expect("request");
        if let Some(addr) = peer {
            let addr: SocketAddr = addr.parse().expect("socket addr");
            request.extensions_mut().insert(ConnectInfo(addr));
        }
        request.into_parts().0
    }

    #[test]
    fn test_peer_address_by_default() {
        let p = parts(Some("203.0.113.9"), Some("10.0.0.1:5000"));
        assert_eq!(ClientKey::resolve(&p, false).as_str(), "10.0.0.1");
    }

    #[test]
    fn test_forwarded_for_when_trusted() {
        let p = parts(Some(" 203.0.113.9 , 10.0.0.2"), Some("10.0.0.1:5000"));
        assert_eq!(ClientKey::resolve(&p, true).as_str(), "203.0.113.9");

        let p = parts(None, Some("10.0.0.1:5000"));
        assert_eq!(ClientKey::resolve(&p, true).as_str(), "10.0.0.1");
    }

    #[test]
    fn test_unknown_without_peer() {
        let p = parts(None, None);
        assert_eq!(ClientKey::resolve(&p, false).as_str(), UNKNOWN_CLIENT);
    }
}
