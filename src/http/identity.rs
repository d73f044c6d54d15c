//! Client identity resolution
//!
//! Tool sessions are keyed by the identity attached here: the `Mcp-Session-Id`
//! header when present, otherwise the peer IP address.

use std::{fmt, net::SocketAddr};

use axum::{
    extract::{connect_info::ConnectInfo, Request},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};

pub const SESSION_ID_HEADER: &str = "mcp-session-id";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientIdentity {
    Session(String),
    Address(String),
    Anonymous,
}

impl ClientIdentity {
    pub fn from_parts(headers: &HeaderMap, peer: Option<SocketAddr>) -> Self {
        if let Some(session_id) = headers
            .get(SESSION_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty())
        {
            return Self::Session(session_id.to_string());
        }

        match peer {
            Some(addr) => Self::Address(addr.ip().to_string()),
            None => Self::Anonymous,
        }
    }

    pub fn has_session_id(&self) -> bool {
        matches!(self, Self::Session(_))
    }

    pub fn key(&self) -> &str {
        match self {
            Self::Session(id) | Self::Address(id) => id,
            Self::Anonymous => "anonymous",
        }
    }
}

impl fmt::Display for ClientIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl<B> From<&axum::http::Request<B>> for ClientIdentity {
    fn from(request: &axum::http::Request<B>) -> Self {
        let peer = request
            .extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| *addr);
        Self::from_parts(request.headers(), peer)
    }
}

pub async fn resolve_client_identity(mut request: Request, next: Next) -> Response {
    let identity = ClientIdentity::from(&request);
    request.extensions_mut().insert(identity);

    next.run(request).await
}
