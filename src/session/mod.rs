//! Session management
//!
//! In-memory sessions keyed by an opaque token, and the cookie that carries
//! the token between requests.

pub mod cookie;
mod store;

pub use store::{Session, SessionStore};
