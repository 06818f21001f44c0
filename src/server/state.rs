//! Shared application state
//!
//! Cloned into every handler. Everything behind it is either immutable or,
//! for the session store, internally synchronized.

use axum::extract::FromRef;
use std::path::PathBuf;
use std::sync::Arc;

use crate::auth::{AuthGate, Authenticator};
use crate::config::ServerConfig;
use crate::session::SessionStore;
use crate::storage::{FileSystem, LocalFs, PathResolver};

/// Request-independent settings used by the handlers and the router.
#[derive(Debug, Clone)]
pub struct WebSettings {
    /// Marks the session cookie `Secure`.
    pub secure_cookies: bool,
    pub static_dir: PathBuf,
    pub max_upload_bytes: usize,
}

#[derive(Clone, FromRef)]
pub struct AppState {
    pub resolver: Arc<PathResolver>,
    pub fs: Arc<dyn FileSystem>,
    pub sessions: Arc<SessionStore>,
    pub gate: AuthGate,
    pub authenticator: Arc<dyn Authenticator>,
    pub settings: Arc<WebSettings>,
}

impl AppState {
    /// State for a configured server backed by the local file system.
    pub fn from_config(config: &ServerConfig, authenticator: Arc<dyn Authenticator>) -> Self {
        let web = &config.web_server;
        Self::new(
            PathResolver::new(&web.base_dir),
            Arc::new(LocalFs),
            SessionStore::new(config.session.duration()),
            authenticator,
            WebSettings {
                secure_cookies: web.is_https(),
                static_dir: web.static_dir.clone(),
                max_upload_bytes: web.max_upload_bytes(),
            },
        )
    }

    pub fn new(
        resolver: PathResolver,
        fs: Arc<dyn FileSystem>,
        sessions: SessionStore,
        authenticator: Arc<dyn Authenticator>,
        settings: WebSettings,
    ) -> Self {
        let sessions = Arc::new(sessions);
        Self {
            resolver: Arc::new(resolver),
            fs,
            gate: AuthGate::new(Arc::clone(&sessions)),
            sessions,
            authenticator,
            settings: Arc::new(settings),
        }
    }
}
