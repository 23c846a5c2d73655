//! Host visibility and mTLS policy resolution
//!
//! Pure functions over a point-in-time snapshot of Services and Istio policy
//! objects:
//!
//! - **Protocol**: classify a port protocol as http/tls/tcp and check port naming
//! - **exportTo**: decide whether a resource is visible from a namespace
//! - **Hosts**: index every hostname spelling of a Service to its visibility
//! - **mTLS**: resolve the effective mTLS status at workload, namespace and mesh scope
//!
//! Nothing here performs I/O or fails. The [`HostVisibilityIndex`] is
//! immutable once built and can be shared across threads; an
//! [`MtlsResolver`] borrows its inputs for the duration of one evaluation.

#![deny(missing_docs)]

pub mod export_to;
pub mod hosts;
pub mod mtls;
pub mod protocol;
pub mod selector;

pub use export_to::{is_exported_to, parse_export_to_annotation};
pub use hosts::{HostEntry, HostVisibilityIndex};
pub use mtls::{MtlsEvaluationContext, MtlsResolver, MtlsStatus, TlsStatus};
pub use protocol::{classify_protocol, matches_naming_convention, PortProtocol};
pub use selector::{LabelMatcher, Labels};
