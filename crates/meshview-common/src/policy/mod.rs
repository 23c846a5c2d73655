//! Policy type definitions read from the mesh
//!
//! Types for:
//! - Istio PeerAuthentication (mTLS mode required by receivers)
//! - Istio DestinationRule (TLS mode originated by clients)
//!
//! All policy types implement the `HasApiResource` trait for consistent
//! API version and kind handling.

mod istio;

pub use istio::{
    ClientTlsMode, ClientTlsSettings, DestinationRule, DestinationRuleSpec, MtlsConfig,
    PeerAuthentication, PeerAuthenticationMode, PeerAuthenticationSpec, TrafficPolicy,
    WorkloadSelector,
};
