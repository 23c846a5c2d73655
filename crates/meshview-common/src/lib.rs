//! Common types for meshview: object model, configuration, errors, and utilities

#![deny(missing_docs)]

pub mod config;
pub mod error;
pub mod mesh;
pub mod meta;
pub mod policy;
pub mod service;
pub mod snapshot;
pub mod telemetry;
pub mod yaml;

pub use config::MeshConfig;
pub use error::Error;
pub use service::{ServiceDescriptor, ServicePort};
pub use snapshot::Snapshot;

/// Result type alias using our custom Error type
pub type Result<T> = std::result::Result<T, Error>;
