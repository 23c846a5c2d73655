//! Logging initialization
//!
//! Provides one-shot `tracing` setup for meshview binaries:
//! - `RUST_LOG` style filtering through `EnvFilter`, with a default when unset
//! - Human-readable output for terminals
//! - JSON structured output for log pipelines

use std::str::FromStr;

use thiserror::Error;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Directives used when `RUST_LOG` is not set
pub const DEFAULT_LOG_DIRECTIVES: &str = "warn,meshview=info";

/// Errors that can occur during logging initialization
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// Filter directives did not parse
    #[error("invalid log filter: {0}")]
    Filter(String),

    /// A global subscriber was already installed
    #[error("failed to initialize tracing subscriber: {0}")]
    SubscriberInit(String),
}

/// Log output format
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// Compact human-readable lines
    #[default]
    Text,
    /// One JSON object per event
    Json,
}

impl FromStr for LogFormat {
    type Err = TelemetryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            other => Err(TelemetryError::Filter(format!(
                "unknown log format '{}', expected text or json",
                other
            ))),
        }
    }
}

/// Configuration for logging initialization
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Output format
    pub format: LogFormat,
    /// Filter directives applied when `RUST_LOG` is unset
    pub default_directives: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::Text,
            default_directives: DEFAULT_LOG_DIRECTIVES.to_string(),
        }
    }
}

/// Build the filter: `RUST_LOG` wins, otherwise the configured defaults
pub fn build_filter(default_directives: &str) -> Result<EnvFilter, TelemetryError> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => EnvFilter::try_new(default_directives)
            .map_err(|e| TelemetryError::Filter(e.to_string())),
    }
}

/// Install the global subscriber.
///
/// Logs go to stderr so command output on stdout stays machine-readable.
pub fn init_logging(config: LogConfig) -> Result<(), TelemetryError> {
    let env_filter = build_filter(&config.default_directives)?;

    let (text_layer, json_layer) = match config.format {
        LogFormat::Text => (
            Some(
                tracing_subscriber::fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(false),
            ),
            None,
        ),
        LogFormat::Json => (
            None,
            Some(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr)
                    .with_current_span(true)
                    .with_span_list(false)
                    .with_target(true)
                    .with_file(false)
                    .with_line_number(false),
            ),
        ),
    };

    // Option<Layer> implements Layer, so only the selected format is active
    tracing_subscriber::registry()
        .with(env_filter)
        .with(text_layer)
        .with(json_layer)
        .try_init()
        .map_err(|e: tracing_subscriber::util::TryInitError| {
            TelemetryError::SubscriberInit(e.to_string())
        })?;

    Ok(())
}
