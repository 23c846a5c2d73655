//! Service mesh constants and hostname helpers
//!
//! Single source of truth for the Istio names meshview reads: annotation keys,
//! mode strings, wildcard hosts, and the three spellings a Kubernetes Service
//! hostname can take inside mesh configuration.

// =============================================================================
// Annotations
// =============================================================================

/// Service annotation restricting which namespaces may reference the service.
///
/// Value is a comma-separated list of namespaces, `.` (same namespace),
/// `*` (everyone) or `~` (no one).
pub const EXPORT_TO_ANNOTATION: &str = "networking.istio.io/exportTo";

// =============================================================================
// Domains and Namespaces
// =============================================================================

/// Identity domain used by clusters with the stock DNS suffix.
pub const DEFAULT_IDENTITY_DOMAIN: &str = "svc.cluster.local";

/// Short service suffix accepted by Istio alongside the full domain.
pub const SHORT_SERVICE_SUFFIX: &str = "svc";

/// Namespace holding mesh-scoped policies unless the mesh config overrides it.
pub const DEFAULT_ROOT_NAMESPACE: &str = "istio-system";

/// DestinationRule host used to declare a mesh-wide TLS mode.
pub const MESH_WIDE_HOST: &str = "*.local";

// =============================================================================
// ExportTo Tokens
// =============================================================================

/// Visible from every namespace.
pub const EXPORT_TO_ALL: &str = "*";

/// Visible only from the resource's own namespace.
pub const EXPORT_TO_SAME_NAMESPACE: &str = ".";

/// Visible from no namespace.
pub const EXPORT_TO_NONE: &str = "~";

// =============================================================================
// Hostname Helpers
// =============================================================================

/// Fully-qualified service hostname: `{name}.{namespace}.{identity_domain}`
pub fn service_fqdn(name: &str, namespace: &str, identity_domain: &str) -> String {
    format!("{}.{}.{}", name, namespace, identity_domain)
}

/// Short service hostname: `{name}.{namespace}.svc`
pub fn service_short_fqdn(name: &str, namespace: &str) -> String {
    format!("{}.{}.{}", name, namespace, SHORT_SERVICE_SUFFIX)
}

/// Two-part service hostname: `{name}.{namespace}`
pub fn service_two_part(name: &str, namespace: &str) -> String {
    format!("{}.{}", name, namespace)
}

/// DestinationRule host declaring a namespace-wide TLS mode:
/// `*.{namespace}.{identity_domain}`
pub fn namespace_wide_host(namespace: &str, identity_domain: &str) -> String {
    format!("*.{}.{}", namespace, identity_domain)
}
