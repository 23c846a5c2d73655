//! Service hostname visibility index
//!
//! Mesh resources refer to a Kubernetes Service by any of three hostnames:
//!
//! - `{name}.{namespace}.{identity_domain}` (full FQDN)
//! - `{name}.{namespace}.svc` (short FQDN)
//! - `{name}.{namespace}` (two-part)
//!
//! The index registers all three for every Service, pointing at one shared
//! [`HostEntry`].
//!
//! Visibility is a two-level fallback: the Service's exportTo annotation wins,
//! then the mesh-wide `defaultServiceExportTo`, then global visibility.

use std::collections::BTreeMap;
use std::sync::Arc;

use meshview_common::mesh::{service_fqdn, service_short_fqdn, service_two_part};
use meshview_common::policy::DestinationRule;
use meshview_common::{MeshConfig, ServiceDescriptor};
use serde::Serialize;
use tracing::debug;

use crate::export_to::{is_exported_to, parse_export_to_annotation};

/// Owning namespace and effective exportTo of one Service
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HostEntry {
    namespace: String,
    export_to: Vec<String>,
}

impl HostEntry {
    /// Namespace the Service lives in
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Effective exportTo list; empty means visible everywhere
    pub fn export_to(&self) -> &[String] {
        &self.export_to
    }

    /// Whether the Service may be referenced from `viewer_namespace`
    pub fn is_visible_from(&self, viewer_namespace: &str) -> bool {
        is_exported_to(&self.export_to, &self.namespace, viewer_namespace)
    }
}

/// Hostname → visibility lookup built from a snapshot of Services
#[derive(Clone, Debug, Default)]
pub struct HostVisibilityIndex {
    entries: BTreeMap<String, Arc<HostEntry>>,
}

impl HostVisibilityIndex {
    /// Build the index.
    ///
    /// `default_export_to` is the mesh-wide default applied to Services
    /// without an annotation. Pass `None` when the mesh config is unavailable
    /// to treat unannotated Services as visible everywhere.
    pub fn build(
        services: &[ServiceDescriptor],
        default_export_to: Option<&[String]>,
        identity_domain: &str,
    ) -> Self {
        let mut entries = BTreeMap::new();

        for svc in services {
            let export_to = match &svc.export_to {
                Some(annotation) => parse_export_to_annotation(annotation),
                None => default_export_to.map(<[String]>::to_vec).unwrap_or_default(),
            };
            let entry = Arc::new(HostEntry {
                namespace: svc.namespace.clone(),
                export_to,
            });

            entries.insert(
                service_fqdn(&svc.name, &svc.namespace, identity_domain),
                Arc::clone(&entry),
            );
            entries.insert(
                service_short_fqdn(&svc.name, &svc.namespace),
                Arc::clone(&entry),
            );
            entries.insert(service_two_part(&svc.name, &svc.namespace), entry);
        }

        debug!(
            services = services.len(),
            hosts = entries.len(),
            identity_domain,
            "built host visibility index"
        );

        Self { entries }
    }

    /// Build the index with the identity domain and default exportTo from
    /// the mesh config
    pub fn from_config(services: &[ServiceDescriptor], config: &MeshConfig) -> Self {
        Self::build(
            services,
            config.default_service_export_to.as_deref(),
            &config.identity_domain,
        )
    }

    /// Whether the hostname belongs to a known Service, ignoring visibility
    pub fn has_host(&self, host: &str) -> bool {
        self.entries.contains_key(host)
    }

    /// Whether the hostname exists and is exported to `viewer_namespace`
    pub fn is_visible_from(&self, host: &str, viewer_namespace: &str) -> bool {
        self.entries
            .get(host)
            .is_some_and(|entry| entry.is_visible_from(viewer_namespace))
    }

    /// Shared entry behind a hostname
    pub fn entry(&self, host: &str) -> Option<&Arc<HostEntry>> {
        self.entries.get(host)
    }

    /// All indexed hostnames with their entries, sorted by hostname
    pub fn iter(&self) -> impl Iterator<Item = (&str, &HostEntry)> {
        self.entries
            .iter()
            .map(|(host, entry)| (host.as_str(), entry.as_ref()))
    }

    /// Number of indexed hostnames (three per Service)
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no Service was indexed
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Whether a DestinationRule host (declared in `host_namespace`) refers to
/// the Service `service_name` in `service_namespace`.
///
/// A bare name only resolves inside the rule's own namespace. Wildcard hosts
/// are not expanded.
pub fn host_matches_service(
    host: &str,
    host_namespace: &str,
    service_name: &str,
    service_namespace: &str,
    identity_domain: &str,
) -> bool {
    if host == service_name && host_namespace == service_namespace {
        return true;
    }

    host == service_two_part(service_name, service_namespace)
        || host == service_short_fqdn(service_name, service_namespace)
        || host == service_fqdn(service_name, service_namespace, identity_domain)
}

/// DestinationRules whose host refers to the given Service
pub fn filter_destination_rules_by_service<'a>(
    rules: &'a [DestinationRule],
    service_name: &str,
    service_namespace: &str,
    identity_domain: &str,
) -> Vec<&'a DestinationRule> {
    rules
        .iter()
        .filter(|dr| {
            host_matches_service(
                &dr.spec.host,
                &dr.metadata.namespace,
                service_name,
                service_namespace,
                identity_domain,
            )
        })
        .collect()
}
