//! Istio policy types
//!
//! Read-side projections of the two Istio objects that decide transport
//! security:
//! - PeerAuthentication: mTLS mode required by receiving workloads
//! - DestinationRule: TLS mode used by clients calling a host

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::meta::{HasApiResource, ObjectMeta};
use crate::mesh::MESH_WIDE_HOST;

// =============================================================================
// Modes
// =============================================================================

/// PeerAuthentication mTLS mode
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PeerAuthenticationMode {
    /// Inherit from the parent scope
    #[default]
    Unset,
    /// Plaintext only
    Disable,
    /// Plaintext and mTLS both accepted
    Permissive,
    /// mTLS required
    Strict,
}

impl PeerAuthenticationMode {
    /// Mode name as written in manifests
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unset => "UNSET",
            Self::Disable => "DISABLE",
            Self::Permissive => "PERMISSIVE",
            Self::Strict => "STRICT",
        }
    }
}

impl fmt::Display for PeerAuthenticationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// DestinationRule client TLS mode
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ClientTlsMode {
    /// Explicitly unset
    Unset,
    /// No TLS; also the proto default when `tls: {}` omits the mode
    #[default]
    Disable,
    /// One-way TLS to the upstream
    Simple,
    /// mTLS with user-supplied certificates
    Mutual,
    /// mTLS with mesh-issued certificates
    IstioMutual,
}

impl ClientTlsMode {
    /// Mode name as written in manifests
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unset => "UNSET",
            Self::Disable => "DISABLE",
            Self::Simple => "SIMPLE",
            Self::Mutual => "MUTUAL",
            Self::IstioMutual => "ISTIO_MUTUAL",
        }
    }

    /// Whether clients originate mTLS in this mode
    pub fn is_mutual(&self) -> bool {
        matches!(self, Self::Mutual | Self::IstioMutual)
    }
}

impl fmt::Display for ClientTlsMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// PeerAuthentication
// =============================================================================

/// Istio PeerAuthentication
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PeerAuthentication {
    /// API version
    #[serde(default = "PeerAuthentication::api_version")]
    pub api_version: String,
    /// Kind
    #[serde(default = "PeerAuthentication::kind")]
    pub kind: String,
    /// Metadata
    pub metadata: ObjectMeta,
    /// Spec
    #[serde(default)]
    pub spec: PeerAuthenticationSpec,
}

impl HasApiResource for PeerAuthentication {
    const API_VERSION: &'static str = "security.istio.io/v1";
    const KIND: &'static str = "PeerAuthentication";
}

impl PeerAuthentication {
    fn api_version() -> String {
        <Self as HasApiResource>::API_VERSION.to_string()
    }
    fn kind() -> String {
        <Self as HasApiResource>::KIND.to_string()
    }

    /// Create a new PeerAuthentication
    pub fn new(metadata: ObjectMeta, spec: PeerAuthenticationSpec) -> Self {
        Self {
            api_version: Self::api_version(),
            kind: Self::kind(),
            metadata,
            spec,
        }
    }

    /// Create a policy without a selector, applying to its whole namespace
    /// (or the whole mesh when placed in the root namespace).
    pub fn namespace_wide(
        name: impl Into<String>,
        namespace: impl Into<String>,
        mode: PeerAuthenticationMode,
    ) -> Self {
        Self::new(
            ObjectMeta::new(name, namespace),
            PeerAuthenticationSpec {
                selector: None,
                mtls: Some(MtlsConfig { mode }),
            },
        )
    }

    /// Create a policy targeting workloads by exact label match
    pub fn for_workload(
        name: impl Into<String>,
        namespace: impl Into<String>,
        match_labels: BTreeMap<String, String>,
        mode: PeerAuthenticationMode,
    ) -> Self {
        Self::new(
            ObjectMeta::new(name, namespace),
            PeerAuthenticationSpec {
                selector: Some(WorkloadSelector {
                    match_labels: Some(match_labels),
                }),
                mtls: Some(MtlsConfig { mode }),
            },
        )
    }

    /// Declared mTLS mode, `None` when the policy has no `mtls` block
    pub fn mtls_mode(&self) -> Option<PeerAuthenticationMode> {
        self.spec.mtls.as_ref().map(|m| m.mode)
    }

    /// Whether the policy carries a `selector` block at all.
    ///
    /// Any selector, even one with no match labels, marks the policy as
    /// workload-targeted.
    pub fn is_workload_targeted(&self) -> bool {
        self.spec.selector.is_some()
    }

    /// Mode this policy contributes as a namespace- or mesh-wide declaration.
    ///
    /// Workload-targeted policies never contribute.
    pub fn scope_mode(&self) -> Option<PeerAuthenticationMode> {
        if self.is_workload_targeted() {
            return None;
        }
        self.mtls_mode()
    }

    /// Selector match labels, `None` when absent or empty.
    ///
    /// An empty map must not be read as "select everything".
    pub fn match_labels(&self) -> Option<&BTreeMap<String, String>> {
        self.spec
            .selector
            .as_ref()
            .and_then(|s| s.match_labels.as_ref())
            .filter(|labels| !labels.is_empty())
    }
}

/// PeerAuthentication spec
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct PeerAuthenticationSpec {
    /// Workload selector; absent means namespace-wide
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selector: Option<WorkloadSelector>,
    /// mTLS configuration
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mtls: Option<MtlsConfig>,
}

/// Workload selector (exact label matches only)
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WorkloadSelector {
    /// Match labels
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub match_labels: Option<BTreeMap<String, String>>,
}

/// mTLS configuration
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct MtlsConfig {
    /// mTLS mode: UNSET, DISABLE, PERMISSIVE, STRICT
    #[serde(default)]
    pub mode: PeerAuthenticationMode,
}

// =============================================================================
// DestinationRule
// =============================================================================

/// Istio DestinationRule
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DestinationRule {
    /// API version
    #[serde(default = "DestinationRule::api_version")]
    pub api_version: String,
    /// Kind
    #[serde(default = "DestinationRule::kind")]
    pub kind: String,
    /// Metadata
    pub metadata: ObjectMeta,
    /// Spec
    pub spec: DestinationRuleSpec,
}

impl HasApiResource for DestinationRule {
    const API_VERSION: &'static str = "networking.istio.io/v1";
    const KIND: &'static str = "DestinationRule";
}

impl DestinationRule {
    fn api_version() -> String {
        <Self as HasApiResource>::API_VERSION.to_string()
    }
    fn kind() -> String {
        <Self as HasApiResource>::KIND.to_string()
    }

    /// Create a new DestinationRule
    pub fn new(metadata: ObjectMeta, spec: DestinationRuleSpec) -> Self {
        Self {
            api_version: Self::api_version(),
            kind: Self::kind(),
            metadata,
            spec,
        }
    }

    /// Create a rule setting the client TLS mode for a host
    pub fn with_tls(
        name: impl Into<String>,
        namespace: impl Into<String>,
        host: impl Into<String>,
        mode: ClientTlsMode,
    ) -> Self {
        Self::new(
            ObjectMeta::new(name, namespace),
            DestinationRuleSpec {
                host: host.into(),
                traffic_policy: Some(TrafficPolicy {
                    tls: Some(ClientTlsSettings { mode }),
                }),
                export_to: vec![],
            },
        )
    }

    /// Declared client TLS mode, `None` without a `trafficPolicy.tls` block
    pub fn tls_mode(&self) -> Option<ClientTlsMode> {
        self.spec
            .traffic_policy
            .as_ref()
            .and_then(|tp| tp.tls.as_ref())
            .map(|tls| tls.mode)
    }

    /// TLS mode when the rule's host is exactly `expected_host`
    pub fn tls_mode_for_host(&self, expected_host: &str) -> Option<ClientTlsMode> {
        if self.spec.host.is_empty() || self.spec.host != expected_host {
            return None;
        }
        self.tls_mode()
    }

    /// TLS mode declared for the whole mesh (`*.local`)
    pub fn mesh_wide_tls_mode(&self) -> Option<ClientTlsMode> {
        self.tls_mode_for_host(MESH_WIDE_HOST)
    }
}

/// DestinationRule spec
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DestinationRuleSpec {
    /// Target host (FQDN, short name, or wildcard)
    #[serde(default)]
    pub host: String,
    /// Traffic policy
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub traffic_policy: Option<TrafficPolicy>,
    /// Namespaces the rule is exported to
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub export_to: Vec<String>,
}

/// Traffic policy
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct TrafficPolicy {
    /// Client TLS settings
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tls: Option<ClientTlsSettings>,
}

/// Client TLS settings
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct ClientTlsSettings {
    /// TLS mode
    #[serde(default)]
    pub mode: ClientTlsMode,
}
