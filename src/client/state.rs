//! Module `client::state`
//!
//! Defines the `ClientAddr` extractor and the `Actor` audit record.

use std::convert::Infallible;
use std::fmt;
use std::net::SocketAddr;

use axum::extract::{ConnectInfo, FromRequestParts};
use axum::http::request::Parts;

/// Source address of the request, `unknown` when the server was not started
/// with connection info (for example in router tests).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientAddr(pub String);

impl<S> FromRequestParts<S> for ClientAddr
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let addr = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.to_string())
            .unwrap_or_else(|| "unknown".to_string());
        Ok(ClientAddr(addr))
    }
}

impl fmt::Display for ClientAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The acting identity of a request, used for audit logging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    username: Option<String>,
    client_addr: ClientAddr,
}

impl Actor {
    pub fn anonymous(client_addr: ClientAddr) -> Self {
        Self {
            username: None,
            client_addr,
        }
    }

    pub fn user(username: impl Into<String>, client_addr: ClientAddr) -> Self {
        Self {
            username: Some(username.into()),
            client_addr,
        }
    }

    /// Returns the username if the request carried a valid session.
    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }

    pub fn client_addr(&self) -> &ClientAddr {
        &self.client_addr
    }
}

impl fmt::Display for Actor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "IP: {}, User: {}",
            self.client_addr,
            self.username.as_deref().unwrap_or("-")
        )
    }
}
