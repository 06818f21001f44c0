//! Server core
//!
//! Binds the configured address over http or https and serves the router
//! until Ctrl-C or SIGTERM.

use axum_server::Handle;
use axum_server::tls_rustls::RustlsConfig;
use log::{error, info};
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;

use crate::auth::ConfigAuthenticator;
use crate::config::{Protocol, ServerConfig};
use crate::error::StartupError;
use crate::server::router::build_router;
use crate::server::state::AppState;

const SHUTDOWN_GRACE: Duration = Duration::from_secs(10);

pub struct Server {
    config: ServerConfig,
    state: AppState,
}

impl Server {
    pub fn new(config: ServerConfig) -> Result<Self, StartupError> {
        let authenticator = ConfigAuthenticator::new(&config.auth.users)?;
        if authenticator.user_count() == 0 {
            info!("No users configured; all mutating actions are unavailable");
        }
        let state = AppState::from_config(&config, Arc::new(authenticator));
        Ok(Self { config, state })
    }

    pub async fn start(self) -> Result<(), StartupError> {
        let web = &self.config.web_server;
        let addr = web.socket_addr().map_err(|e| {
            StartupError::Config(config::ConfigError::Message(format!(
                "invalid bind address {}:{}: {}",
                web.bind_address, web.port, e
            )))
        })?;

        info!("Base directory: {}", web.base_dir.display());
        let app = build_router(self.state.clone());
        let handle = Handle::new();
        tokio::spawn(shutdown_signal(handle.clone()));

        match web.protocol {
            Protocol::Https => {
                let tls = load_tls(web.ssl_cert_file.as_deref(), web.ssl_key_file.as_deref())
                    .await?;
                info!("Server started at https://{}", addr);
                axum_server::bind_rustls(addr, tls)
                    .handle(handle)
                    .serve(app.into_make_service_with_connect_info::<SocketAddr>())
                    .await?;
            }
            Protocol::Http => {
                info!("Server started at http://{}", addr);
                axum_server::bind(addr)
                    .handle(handle)
                    .serve(app.into_make_service_with_connect_info::<SocketAddr>())
                    .await?;
            }
        }

        info!("Server stopped");
        Ok(())
    }
}

async fn load_tls(
    cert: Option<&std::path::Path>,
    key: Option<&std::path::Path>,
) -> Result<RustlsConfig, StartupError> {
    let (Some(cert), Some(key)) = (cert, key) else {
        return Err(StartupError::Tls(io::Error::new(
            io::ErrorKind::InvalidInput,
            "For HTTPS, ssl_cert_file and ssl_key_file must be specified",
        )));
    };
    RustlsConfig::from_pem_file(cert, key)
        .await
        .map_err(StartupError::Tls)
}

async fn shutdown_signal(handle: Handle) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received, draining connections");
    handle.graceful_shutdown(Some(SHUTDOWN_GRACE));
}
