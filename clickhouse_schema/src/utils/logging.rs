//! Logging utilities for clickhouse_schema
//!
//! This module provides logging setup and configuration.

use std::fs::File;
use std::path::Path;
use std::sync::Mutex;

use tracing::Level;
use tracing_subscriber::filter::Directive;
use tracing_subscriber::{fmt, EnvFilter};

use crate::config::LoggingConfig;
use crate::error::{Error, Result};

/// Initialize logging based on configuration.
///
/// Without a `[logging]` section, text logs at `info` go to stderr.
pub fn init_logging(config: &Option<LoggingConfig>) -> Result<()> {
    let config = match config {
        Some(cfg) => cfg,
        None => {
            let subscriber = fmt::Subscriber::builder()
                .with_env_filter(env_filter(Level::INFO)?)
                .with_writer(std::io::stderr)
                .finish();
            return install(subscriber);
        }
    };

    let filter = env_filter(parse_level(&config.level))?;
    let json = config.format.eq_ignore_ascii_case("json");

    if let Some(file_path) = &config.file {
        // Ensure directory exists
        if let Some(parent) = Path::new(file_path).parent() {
            std::fs::create_dir_all(parent)?;
        }
        let file = Mutex::new(File::create(file_path)?);

        if json {
            install(
                fmt::Subscriber::builder()
                    .json()
                    .with_env_filter(filter)
                    .with_writer(file)
                    .finish(),
            )
        } else {
            install(
                fmt::Subscriber::builder()
                    .with_env_filter(filter)
                    .with_writer(file)
                    .with_ansi(false)
                    .finish(),
            )
        }
    } else if config.stdout {
        if json {
            install(fmt::Subscriber::builder().json().with_env_filter(filter).finish())
        } else {
            install(fmt::Subscriber::builder().with_env_filter(filter).finish())
        }
    } else {
        Ok(())
    }
}

/// Map a configured level name; unknown names fall back to INFO
pub fn parse_level(level: &str) -> Level {
    match level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    }
}

fn env_filter(level: Level) -> Result<EnvFilter> {
    let directive = format!("clickhouse_schema={}", level)
        .parse::<Directive>()
        .map_err(|e| Error::ConfigError(format!("Invalid log directive: {}", e)))?;
    Ok(EnvFilter::from_default_env().add_directive(directive))
}

fn install<S>(subscriber: S) -> Result<()>
where
    S: tracing::Subscriber + Send + Sync + 'static,
{
    tracing::subscriber::set_global_default(subscriber).map_err(|e| Error::Unknown(e.to_string()))
}
