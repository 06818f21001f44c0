//! Configuration management for the RAX file manager
//!
//! Loaded once at startup from a YAML file with environment overrides
//! (`RAX_FM__<SECTION>__<KEY>`). Immutable afterwards.

use config::{Config, ConfigError, Environment, File, FileFormat, Map, Source};
use serde::Deserialize;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Complete server configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(rename = "web-server", alias = "web_server")]
    pub web_server: WebServerConfig,

    #[serde(default)]
    pub session: SessionConfig,

    #[serde(default)]
    pub auth: AuthConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Transport used by the listener.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    Http,
    Https,
}

#[derive(Debug, Deserialize, Clone)]
pub struct WebServerConfig {
    /// IP address to listen on
    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    pub port: u16,

    pub protocol: Protocol,

    /// PEM certificate chain, required for https
    #[serde(default)]
    pub ssl_cert_file: Option<PathBuf>,

    /// PEM private key, required for https
    #[serde(default)]
    pub ssl_key_file: Option<PathBuf>,

    /// Root directory served to clients
    pub base_dir: PathBuf,

    /// Stylesheets and other assets mounted under `/static/`
    #[serde(default = "default_static_dir")]
    pub static_dir: PathBuf,

    /// Request body limit for uploads
    #[serde(default = "default_max_upload_mb")]
    pub max_upload_mb: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SessionConfig {
    #[serde(default = "default_session_secs")]
    pub duration_secs: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            duration_secs: default_session_secs(),
        }
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct AuthConfig {
    #[serde(default)]
    pub users: Vec<UserConfig>,
}

/// A login account. `password_hash` is an argon2 PHC string as printed by
/// `rax-file-manager hash-password`.
#[derive(Debug, Deserialize, Clone)]
pub struct UserConfig {
    pub username: String,
    pub password_hash: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    /// Log file; stderr when absent or empty
    #[serde(default)]
    pub log_file: Option<PathBuf>,

    /// trace, debug, info, warning, error or fatal
    #[serde(default = "default_log_severity")]
    pub log_severity: String,

    /// Rotate once the file would exceed this many MiB (0 = never)
    #[serde(default = "default_log_max_size")]
    pub log_max_size: u64,

    /// Rotated files to keep (0 = all)
    #[serde(default)]
    pub log_max_files: usize,

    /// Days to keep rotated files (0 = forever)
    #[serde(default)]
    pub log_max_age: u64,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            log_file: None,
            log_severity: default_log_severity(),
            log_max_size: default_log_max_size(),
            log_max_files: 0,
            log_max_age: 0,
        }
    }
}

fn default_bind_address() -> String {
    "0.0.0.0".to_string()
}

fn default_static_dir() -> PathBuf {
    PathBuf::from("static")
}

fn default_max_upload_mb() -> u64 {
    100
}

fn default_session_secs() -> u64 {
    24 * 60 * 60
}

fn default_log_severity() -> String {
    "info".to_string()
}

fn default_log_max_size() -> u64 {
    100
}

const ENV_PREFIX: &str = "RAX_FM";

impl ServerConfig {
    /// Load configuration from a YAML file with environment overrides
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let file = File::from(path).format(FileFormat::Yaml).required(true);
        Self::build(file, None)
    }

    fn build<S>(file: S, env: Option<Map<String, String>>) -> Result<Self, ConfigError>
    where
        S: Source + Send + Sync + 'static,
    {
        let settings = Config::builder()
            .add_source(file)
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true)
                    .source(env),
            )
            .build()?;

        let mut config: ServerConfig = settings.try_deserialize()?;
        config.validate()?;
        config.web_server.base_dir = canonical_dir(&config.web_server.base_dir)?;
        Ok(config)
    }

    /// Validation for all configuration values
    fn validate(&self) -> Result<(), ConfigError> {
        let web = &self.web_server;
        if web.port == 0 {
            return Err(ConfigError::Message("port cannot be 0".into()));
        }

        if web.protocol == Protocol::Https && (web.ssl_cert_file.is_none() || web.ssl_key_file.is_none()) {
            return Err(ConfigError::Message(
                "For HTTPS, ssl_cert_file and ssl_key_file must be specified".into(),
            ));
        }

        if web.base_dir.as_os_str().is_empty() {
            return Err(ConfigError::Message("base_dir cannot be empty".into()));
        }

        if web.max_upload_mb == 0 {
            return Err(ConfigError::Message(
                "max_upload_mb must be greater than 0".into(),
            ));
        }

        if self.session.duration_secs == 0 {
            return Err(ConfigError::Message(
                "session duration_secs must be greater than 0".into(),
            ));
        }

        Ok(())
    }
}

fn canonical_dir(path: &Path) -> Result<PathBuf, ConfigError> {
    let canonical = path.canonicalize().map_err(|e| {
        ConfigError::Message(format!("base_dir {} is not accessible: {}", path.display(), e))
    })?;
    if !canonical.is_dir() {
        return Err(ConfigError::Message(format!(
            "base_dir {} is not a directory",
            path.display()
        )));
    }
    Ok(canonical)
}

impl WebServerConfig {
    /// Get bind address and port as socket address
    pub fn socket_addr(&self) -> Result<SocketAddr, std::net::AddrParseError> {
        format!("{}:{}", self.bind_address, self.port).parse()
    }

    /// Get upload limit in bytes
    pub fn max_upload_bytes(&self) -> usize {
        usize::try_from(self.max_upload_mb * 1024 * 1024).unwrap_or(usize::MAX)
    }

    pub fn is_https(&self) -> bool {
        self.protocol == Protocol::Https
    }
}

impl SessionConfig {
    pub fn duration(&self) -> Duration {
        Duration::from_secs(self.duration_secs)
    }
}
