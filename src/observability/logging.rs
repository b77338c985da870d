//! Logging configuration and utilities.

use regex::Regex;
use std::sync::OnceLock;
use tracing_subscriber::{fmt, EnvFilter};

use crate::errors::{BridgeError, BridgeResult};

/// Log level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum LogLevel {
    /// Trace level.
    Trace,
    /// Debug level.
    Debug,
    /// Info level.
    #[default]
    Info,
    /// Warning level.
    Warn,
    /// Error level.
    Error,
}

impl LogLevel {
    fn as_directive(self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Minimum log level when `RUST_LOG` is not set.
    pub level: LogLevel,
    /// Emit JSON lines instead of human readable output.
    pub json: bool,
    /// Log request bodies at trace level.
    pub log_request_bodies: bool,
    /// Maximum body length to log.
    pub max_body_length: usize,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            json: false,
            log_request_bodies: false,
            max_body_length: 1024,
        }
    }
}

impl LogConfig {
    /// Creates a new log configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the log level.
    pub fn level(mut self, level: LogLevel) -> Self {
        self.level = level;
        self
    }

    /// Switches to JSON output.
    pub fn json(mut self) -> Self {
        self.json = true;
        self
    }

    /// Enables request body logging.
    pub fn log_bodies(mut self) -> Self {
        self.log_request_bodies = true;
        self
    }
}

/// Installs a global `tracing` subscriber for applications without one.
///
/// `RUST_LOG` takes precedence over [`LogConfig::level`]. Fails if a global
/// subscriber is already installed.
pub fn init_tracing(config: &LogConfig) -> BridgeResult<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.level.as_directive()));

    let result = if config.json {
        fmt().with_env_filter(filter).json().try_init()
    } else {
        fmt().with_env_filter(filter).try_init()
    };

    result.map_err(|e| BridgeError::configuration(format!("Failed to install logger: {e}")))
}

fn client_key_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r#""clientKey"\s*:\s*"[^"]*""#).ok())
        .as_ref()
}

/// Replaces the client key inside a serialized request body.
pub fn redact_client_key(body: &str) -> String {
    match client_key_pattern() {
        Some(re) => re.replace_all(body, r#""clientKey":"***""#).into_owned(),
        None => body.to_string(),
    }
}

/// Redacts and truncates a request body for logging.
pub fn loggable_body(body: &str, config: &LogConfig) -> String {
    let redacted = redact_client_key(body);
    if redacted.len() <= config.max_body_length {
        return redacted;
    }
    let mut end = config.max_body_length;
    while !redacted.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &redacted[..end])
}
