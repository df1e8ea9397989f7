//! Logging initialization.
//!
//! Installs a global `tracing-subscriber` with an `EnvFilter`. `RUST_LOG`
//! takes precedence over the configured default level.

use serde::{Deserialize, Serialize};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

/// Output format for log lines.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable single-line output.
    #[default]
    Compact,
    /// One JSON object per line.
    Json,
}

/// Logging settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    /// Default level (trace, debug, info, warn, error).
    pub default_level: String,
    pub format: LogFormat,
    /// Include the module path of each event.
    pub with_target: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            default_level: crate::DEFAULT_LOG_LEVEL.to_string(),
            format: LogFormat::Compact,
            with_target: true,
        }
    }
}

/// Install the global subscriber.
///
/// Returns false if a subscriber was already installed, in which case the
/// existing one is left in place.
pub fn init_logging(config: &LogConfig) -> bool {
    let level = parse_level(&config.default_level);
    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::from_level(level).into())
        .from_env_lossy();

    let installed = match config.format {
        LogFormat::Compact => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(config.with_target)
            .compact()
            .try_init()
            .is_ok(),
        LogFormat::Json => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(config.with_target)
            .json()
            .try_init()
            .is_ok(),
    };

    if installed {
        tracing::debug!(level = %level, format = ?config.format, "logging initialized");
    }
    installed
}

/// Parse a log level string into a tracing Level.
pub fn parse_level(level: &str) -> tracing::Level {
    match level.to_lowercase().as_str() {
        "trace" => tracing::Level::TRACE,
        "debug" => tracing::Level::DEBUG,
        "info" => tracing::Level::INFO,
        "warn" | "warning" => tracing::Level::WARN,
        "error" => tracing::Level::ERROR,
        _ => tracing::Level::INFO,
    }
}
