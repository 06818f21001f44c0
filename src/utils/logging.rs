//! Logging utilities
//!
//! Sets up `env_logger` from the `logging` configuration section. Records
//! are written as one JSON object per line, to stderr or to a size-rotated
//! file.

use env_logger::{Builder, Target};
use log::{LevelFilter, Record};
use serde_json::json;
use std::io::Write;

use crate::config::LoggingConfig;
use crate::error::StartupError;
use crate::utils::rotating_file::{RotatingFile, RotationPolicy};

/// Maps the configured severity name onto a level filter.
pub fn severity_filter(severity: &str) -> LevelFilter {
    match severity.trim().to_ascii_lowercase().as_str() {
        "trace" => LevelFilter::Trace,
        "debug" => LevelFilter::Debug,
        "info" => LevelFilter::Info,
        "warn" | "warning" => LevelFilter::Warn,
        "error" | "fatal" | "panic" => LevelFilter::Error,
        _ => LevelFilter::Info,
    }
}

/// Renders one record as a JSON line.
pub fn json_line(record: &Record<'_>) -> String {
    json!({
        "time": chrono::Local::now().to_rfc3339(),
        "level": record.level().as_str().to_ascii_lowercase(),
        "target": record.target(),
        "msg": record.args().to_string(),
    })
    .to_string()
}

/// Setup logging for the server
pub fn setup_logging(config: &LoggingConfig) -> Result<(), StartupError> {
    let mut builder = Builder::new();
    builder.filter_level(severity_filter(&config.log_severity));
    if let Ok(filters) = std::env::var("RUST_LOG") {
        builder.parse_filters(&filters);
    }
    builder.format(|buf, record| writeln!(buf, "{}", json_line(record)));

    match config.log_file.as_ref().filter(|p| !p.as_os_str().is_empty()) {
        Some(path) => {
            let policy = RotationPolicy::new(
                config.log_max_size,
                config.log_max_files,
                config.log_max_age,
            );
            let file = RotatingFile::open(path, policy).map_err(|e| {
                StartupError::Logging(format!("cannot open log file {}: {}", path.display(), e))
            })?;
            builder.target(Target::Pipe(Box::new(file)));
        }
        None => {
            builder.target(Target::Stderr);
        }
    }

    builder
        .try_init()
        .map_err(|e| StartupError::Logging(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use log::Level;

    #[test]
    fn severities_map_to_filters() {
        assert_eq!(severity_filter("trace"), LevelFilter::Trace);
        assert_eq!(severity_filter("Warning"), LevelFilter::Warn);
        assert_eq!(severity_filter("fatal"), LevelFilter::Error);
        assert_eq!(severity_filter("verbose"), LevelFilter::Info);
        assert_eq!(severity_filter(""), LevelFilter::Info);
    }

    #[test]
    fn records_render_as_json() {
        let line = json_line(
            &Record::builder()
                .level(Level::Warn)
                .target("rax_file_manager::handlers")
                .args(format_args!("Deleting: {} by {}", "/srv/a", "IP: 1.2.3.4"))
                .build(),
        );
        let value: serde_json::Value = serde_json::from_str(&line).unwrap();
        assert_eq!(value["level"], "warn");
        assert_eq!(value["target"], "rax_file_manager::handlers");
        assert_eq!(value["msg"], "Deleting: /srv/a by IP: 1.2.3.4");
        assert!(value["time"].as_str().is_some());
    }
}
