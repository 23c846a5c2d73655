//! Error types for meshview
//!
//! The policy engine itself is total and never returns these. Errors only
//! arise at the edges: reading snapshot files, parsing manifests, and loading
//! mesh configuration. Variants carry enough context (resource kind, config
//! path, field) to point the operator at the offending input.

use thiserror::Error;

/// Main error type for meshview operations
#[derive(Debug, Error)]
pub enum Error {
    /// Filesystem error while reading a snapshot or config file
    #[error("io error: {source}")]
    Io {
        /// The underlying I/O error
        #[from]
        source: std::io::Error,
    },

    /// Manifest could not be parsed or did not match the expected shape
    #[error("serialization error: {message}")]
    Serialization {
        /// Description of what failed
        message: String,
        /// The resource kind being deserialized (if known)
        kind: Option<String>,
    },

    /// Input was well-formed but semantically invalid
    #[error("validation error: {message}")]
    Validation {
        /// Description of what's invalid
        message: String,
        /// The invalid field path (e.g., "identityDomain")
        field: Option<String>,
    },

    /// Mesh configuration could not be loaded
    #[error("config error: {message}")]
    Config {
        /// Description of what failed
        message: String,
        /// Path of the config file (if loaded from disk)
        path: Option<String>,
    },
}

impl Error {
    /// Create a serialization error with the given message
    pub fn serialization(msg: impl Into<String>) -> Self {
        Self::Serialization {
            message: msg.into(),
            kind: None,
        }
    }

    /// Create a serialization error with resource kind context
    pub fn serialization_for_kind(kind: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Serialization {
            message: msg.into(),
            kind: Some(kind.into()),
        }
    }

    /// Create a validation error with a field path
    pub fn validation_for_field(field: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
            field: Some(field.into()),
        }
    }

    /// Create a config error with the given message
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
            path: None,
        }
    }

    /// Create a config error for a specific file
    pub fn config_at(path: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
            path: Some(path.into()),
        }
    }

    /// Get the resource kind if this error is tied to one
    pub fn kind(&self) -> Option<&str> {
        match self {
            Error::Serialization { kind, .. } => kind.as_deref(),
            _ => None,
        }
    }

    /// Get the field path if this is a validation error on a specific field
    pub fn field(&self) -> Option<&str> {
        match self {
            Error::Validation { field, .. } => field.as_deref(),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serialization_error_carries_kind() {
        let err = Error::serialization_for_kind("DestinationRule", "missing spec.host");
        assert_eq!(err.kind(), Some("DestinationRule"));
        assert_eq!(err.to_string(), "serialization error: missing spec.host");
    }

    #[test]
    fn plain_serialization_error_has_no_kind() {
        let err = Error::serialization("bad document");
        assert!(err.kind().is_none());
    }

    #[test]
    fn validation_error_carries_field() {
        let err = Error::validation_for_field("identityDomain", "must not be empty");
        assert_eq!(err.field(), Some("identityDomain"));
        assert!(err.to_string().contains("must not be empty"));
    }

    #[test]
    fn io_error_converts() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "snapshot.yaml");
        let err: Error = io.into();
        assert!(matches!(err, Error::Io { .. }));
        assert!(err.to_string().starts_with("io error:"));
    }

    #[test]
    fn config_error_display() {
        let err = Error::config_at("/etc/meshview/mesh.yaml", "unreadable");
        assert_eq!(err.to_string(), "config error: unreadable");
        match err {
            Error::Config { path, .. } => assert_eq!(path.as_deref(), Some("/etc/meshview/mesh.yaml")),
            _ => panic!("expected config error"),
        }
    }
}
