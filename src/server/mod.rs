//! Server core functionality
//!
//! Application state, the route table and the listener.

pub mod core;
pub mod router;
pub mod state;

pub use core::Server;
pub use router::build_router;
pub use state::{AppState, WebSettings};
