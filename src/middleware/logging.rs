//! Logging middleware
//!
//! Logs every request and its response status at debug level.

use axum::extract::{ConnectInfo, Request};
use axum::middleware::Next;
use axum::response::Response;
use log::debug;
use std::net::SocketAddr;

/// Log a request and the status it was answered with
pub async fn log_request(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let client_addr = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.to_string())
        .unwrap_or_else(|| "unknown".to_string());

    debug!("Request {} {} from {}", method, path, client_addr);
    let response = next.run(request).await;
    debug!(
        "Response {} for {} {} from {}",
        response.status().as_u16(),
        method,
        path,
        client_addr
    );
    response
}
