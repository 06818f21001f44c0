//! RAX file manager
//!
//! A web file manager: browse, upload, download, create and delete files
//! below one configured root directory, with session-cookie login.

pub mod archive;
pub mod auth;
pub mod cli;
pub mod client;
pub mod config;
pub mod error;
pub mod handlers;
pub mod listing;
pub mod middleware;
pub mod server;
pub mod session;
pub mod storage;
pub mod utils;

pub use server::{AppState, Server, build_router};
