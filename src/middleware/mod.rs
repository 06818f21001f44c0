//! HTTP middleware
//!
//! Request logging and security response headers.

pub mod logging;
pub mod security;

pub use logging::log_request;
pub use security::add_security_headers;
