//! Error types for the CLI

use meshview_common::telemetry::TelemetryError;

/// CLI Result type
pub type Result<T> = std::result::Result<T, Error>;

/// CLI errors
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Common(#[from] meshview_common::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("logging error: {0}")]
    Telemetry(#[from] TelemetryError),

    #[error("invalid argument: {message}")]
    InvalidArgument { message: String },
}

impl Error {
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Error::InvalidArgument {
            message: message.into(),
        }
    }
}
