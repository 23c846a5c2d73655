//! Effective mTLS resolution
//!
//! Combines PeerAuthentication (server side) and DestinationRule (client side)
//! declarations into one of four statuses at workload, namespace and mesh
//! scope.
//!
//! Precedence is workload over namespace over mesh. A namespace that declares
//! only one of the two halves borrows the other half from the mesh before the
//! decision table is applied again. Missing or unusable policy data never
//! produces an error; it degrades to `MTLS_NOT_ENABLED` or
//! `MTLS_PARTIALLY_ENABLED`.

use std::collections::BTreeMap;
use std::fmt;

use meshview_common::mesh::namespace_wide_host;
use meshview_common::policy::{
    ClientTlsMode, DestinationRule, PeerAuthentication, PeerAuthenticationMode,
};
use meshview_common::{MeshConfig, ServiceDescriptor};
use serde::{Serialize, Serializer};
use tracing::trace;

use crate::hosts::filter_destination_rules_by_service;
use crate::selector::{LabelMatcher, Labels};

static NO_LABELS: Labels = BTreeMap::new();

// =============================================================================
// Status values
// =============================================================================

/// Effective mTLS enforcement level
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize)]
pub enum MtlsStatus {
    /// Traffic is mutually authenticated on both sides
    #[serde(rename = "MTLS_ENABLED")]
    Enabled,
    /// Some but not all of the required configuration is present
    #[serde(rename = "MTLS_PARTIALLY_ENABLED")]
    PartiallyEnabled,
    /// No mTLS configuration applies
    #[default]
    #[serde(rename = "MTLS_NOT_ENABLED")]
    NotEnabled,
    /// mTLS is explicitly turned off
    #[serde(rename = "MTLS_DISABLED")]
    Disabled,
}

impl MtlsStatus {
    /// Wire name
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Enabled => "MTLS_ENABLED",
            Self::PartiallyEnabled => "MTLS_PARTIALLY_ENABLED",
            Self::NotEnabled => "MTLS_NOT_ENABLED",
            Self::Disabled => "MTLS_DISABLED",
        }
    }

    /// Whether the status is conclusive (enabled or disabled)
    pub fn is_defined(&self) -> bool {
        matches!(self, Self::Enabled | Self::Disabled)
    }
}

impl fmt::Display for MtlsStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Namespace or mesh status together with the modes it was derived from.
///
/// Absent modes serialize as empty strings.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TlsStatus {
    /// Client TLS mode of the governing DestinationRule
    #[serde(serialize_with = "mode_or_empty")]
    pub destination_rule_status: Option<ClientTlsMode>,
    /// mTLS mode of the governing PeerAuthentication
    #[serde(serialize_with = "mode_or_empty")]
    pub peer_authentication_status: Option<PeerAuthenticationMode>,
    /// Status derived from the two modes
    pub overall_status: MtlsStatus,
}

fn mode_or_empty<M, S>(mode: &Option<M>, serializer: S) -> Result<S::Ok, S::Error>
where
    M: fmt::Display,
    S: Serializer,
{
    match mode {
        Some(mode) => serializer.collect_str(mode),
        None => serializer.serialize_str(""),
    }
}

impl TlsStatus {
    /// Overall status is ENABLED or DISABLED
    pub fn has_defined_tls(&self) -> bool {
        self.overall_status.is_defined()
    }

    /// Overall status is PARTIALLY_ENABLED
    pub fn has_partial_tls_config(&self) -> bool {
        self.overall_status == MtlsStatus::PartiallyEnabled
    }

    /// Neither half is declared
    pub fn has_no_config(&self) -> bool {
        self.peer_authentication_status.is_none() && self.destination_rule_status.is_none()
    }

    /// Exactly one half is declared and it is DISABLE
    pub fn has_partial_disabled_config(&self) -> bool {
        match (self.peer_authentication_status, self.destination_rule_status) {
            (Some(PeerAuthenticationMode::Disable), None) => true,
            (None, Some(ClientTlsMode::Disable)) => true,
            _ => false,
        }
    }

    /// One half declares mTLS and auto mTLS supplies the other.
    ///
    /// Accepted combinations: STRICT with no rule, a mutual rule with no
    /// peer policy, and PERMISSIVE with no rule when permissive counts.
    pub fn has_half_tls_config_defined(&self, auto_mtls: bool, allow_permissive: bool) -> bool {
        if !auto_mtls {
            return false;
        }
        match (self.peer_authentication_status, self.destination_rule_status) {
            (Some(PeerAuthenticationMode::Strict), None) => true,
            (None, Some(dr)) => dr.is_mutual(),
            (Some(PeerAuthenticationMode::Permissive), None) => allow_permissive,
            _ => false,
        }
    }
}

// =============================================================================
// Evaluation context
// =============================================================================

/// Inputs for one evaluation call.
///
/// Policy slices are expected to be pre-filtered by the caller to the scope
/// being evaluated: workload-scoped PeerAuthentications for
/// [`MtlsResolver::workload_status`], the namespace's own for
/// [`MtlsResolver::namespace_status`], the root namespace's for
/// [`MtlsResolver::mesh_status`].
#[derive(Clone, Copy, Debug)]
pub struct MtlsEvaluationContext<'a> {
    /// PeerAuthentications in evaluation order
    pub peer_authentications: &'a [PeerAuthentication],
    /// DestinationRules in evaluation order
    pub destination_rules: &'a [DestinationRule],
    /// Known Services, used to link a workload selector to rule hosts
    pub services: &'a [ServiceDescriptor],
    /// Labels of the workload under evaluation
    pub matching_labels: &'a Labels,
    /// Cluster DNS suffix
    pub identity_domain: &'a str,
    /// Control plane upgrades client traffic to mTLS when no rule says otherwise
    pub auto_mtls_enabled: bool,
    /// PERMISSIVE counts as enabled
    pub allow_permissive: bool,
}

impl<'a> MtlsEvaluationContext<'a> {
    /// Empty context carrying the mesh-wide settings
    pub fn new(config: &'a MeshConfig) -> Self {
        Self {
            peer_authentications: &[],
            destination_rules: &[],
            services: &[],
            matching_labels: &NO_LABELS,
            identity_domain: &config.identity_domain,
            auto_mtls_enabled: config.enable_auto_mtls,
            allow_permissive: config.allow_permissive,
        }
    }

    /// Set the PeerAuthentications
    pub fn with_peer_authentications(mut self, policies: &'a [PeerAuthentication]) -> Self {
        self.peer_authentications = policies;
        self
    }

    /// Set the DestinationRules
    pub fn with_destination_rules(mut self, rules: &'a [DestinationRule]) -> Self {
        self.destination_rules = rules;
        self
    }

    /// Set the known Services
    pub fn with_services(mut self, services: &'a [ServiceDescriptor]) -> Self {
        self.services = services;
        self
    }

    /// Set the workload labels
    pub fn with_matching_labels(mut self, labels: &'a Labels) -> Self {
        self.matching_labels = labels;
        self
    }
}

// =============================================================================
// Resolver
// =============================================================================

/// Evaluates a [`MtlsEvaluationContext`]. Every method is pure.
#[derive(Clone, Copy, Debug)]
pub struct MtlsResolver<'a> {
    ctx: MtlsEvaluationContext<'a>,
}

impl<'a> MtlsResolver<'a> {
    /// Create a resolver over the given inputs
    pub fn new(ctx: MtlsEvaluationContext<'a>) -> Self {
        Self { ctx }
    }

    /// Status of the workload carrying `matching_labels` in `namespace`.
    ///
    /// The first PeerAuthentication whose match labels select the workload
    /// and whose mode is STRICT, DISABLE or PERMISSIVE decides. Policies
    /// without match labels are skipped.
    pub fn workload_status(&self, namespace: &str) -> MtlsStatus {
        for pa in self.ctx.peer_authentications {
            let Some(selector) = pa.match_labels() else {
                trace!(policy = %pa.metadata.name, "skipping policy without match labels");
                continue;
            };
            if !selector.selects(self.ctx.matching_labels) {
                continue;
            }

            match pa.mtls_mode() {
                Some(PeerAuthenticationMode::Strict) => return MtlsStatus::Enabled,
                Some(PeerAuthenticationMode::Disable) => return MtlsStatus::Disabled,
                Some(PeerAuthenticationMode::Permissive) => {
                    return self.permissive_workload_status(namespace, selector)
                }
                _ => continue,
            }
        }
        MtlsStatus::NotEnabled
    }

    // PERMISSIVE accepts both; the client-side rule for a Service backing
    // the workload settles it
    fn permissive_workload_status(&self, namespace: &str, selector: &Labels) -> MtlsStatus {
        if self.ctx.destination_rules.is_empty() {
            return MtlsStatus::NotEnabled;
        }

        let candidates = self.ctx.services.iter().filter(|svc| {
            svc.namespace == namespace && !svc.selector.is_empty() && selector.selects(&svc.selector)
        });

        for svc in candidates {
            let rules = filter_destination_rules_by_service(
                self.ctx.destination_rules,
                &svc.name,
                &svc.namespace,
                self.ctx.identity_domain,
            );
            for dr in rules {
                match dr.tls_mode() {
                    Some(mode) if mode.is_mutual() => return MtlsStatus::Enabled,
                    Some(ClientTlsMode::Disable) => return MtlsStatus::Disabled,
                    _ => {}
                }
            }
        }
        MtlsStatus::NotEnabled
    }

    /// Namespace-wide status from `*.{namespace}.{identity_domain}` rules and
    /// selector-less PeerAuthentications
    pub fn namespace_status(&self, namespace: &str) -> TlsStatus {
        let host = namespace_wide_host(namespace, self.ctx.identity_domain);
        let dr_status = self
            .ctx
            .destination_rules
            .iter()
            .find_map(|dr| dr.tls_mode_for_host(&host));
        self.resolve(dr_status, self.scope_peer_authentication_mode())
    }

    /// Mesh-wide status from `*.local` rules and selector-less
    /// PeerAuthentications, normalized through the mesh fallback rules
    pub fn mesh_status(&self) -> TlsStatus {
        let dr_status = self
            .ctx
            .destination_rules
            .iter()
            .find_map(DestinationRule::mesh_wide_tls_mode);
        let resolved = self.resolve(dr_status, self.scope_peer_authentication_mode());
        TlsStatus {
            overall_status: self.mesh_fallback(&resolved),
            ..resolved
        }
    }

    // Workload-targeted policies never count as a scope-wide declaration
    fn scope_peer_authentication_mode(&self) -> Option<PeerAuthenticationMode> {
        self.ctx
            .peer_authentications
            .iter()
            .find_map(PeerAuthentication::scope_mode)
    }

    /// Decision table over a DestinationRule mode and a PeerAuthentication
    /// mode
    pub fn resolve(
        &self,
        dr_status: Option<ClientTlsMode>,
        pa_status: Option<PeerAuthenticationMode>,
    ) -> TlsStatus {
        let auto = self.ctx.auto_mtls_enabled;
        let mtls_enabled = dr_status.map_or(auto, |mode| mode.is_mutual());
        let mtls_disabled = dr_status.map_or(auto, |mode| mode == ClientTlsMode::Disable);

        let pa_accepts = match pa_status {
            Some(PeerAuthenticationMode::Strict) => true,
            Some(PeerAuthenticationMode::Permissive) => self.ctx.allow_permissive,
            _ => false,
        };

        let overall_status = if pa_accepts && mtls_enabled {
            MtlsStatus::Enabled
        } else if pa_status == Some(PeerAuthenticationMode::Disable) && mtls_disabled {
            MtlsStatus::Disabled
        } else if pa_status.is_none() && dr_status.is_none() {
            MtlsStatus::NotEnabled
        } else {
            MtlsStatus::PartiallyEnabled
        };

        TlsStatus {
            destination_rule_status: dr_status,
            peer_authentication_status: pa_status,
            overall_status,
        }
    }

    /// Combine a namespace status with the mesh status.
    ///
    /// A conclusive namespace status wins. A partial one has its missing
    /// halves filled from the mesh and is resolved once more; the result then
    /// goes through the same mesh fallback rules as the mesh status itself.
    pub fn overall(&self, ns_status: &TlsStatus, mesh_status: &TlsStatus) -> MtlsStatus {
        if ns_status.has_defined_tls() {
            return ns_status.overall_status;
        }

        let effective = if ns_status.has_partial_tls_config() {
            self.resolve(
                ns_status
                    .destination_rule_status
                    .or(mesh_status.destination_rule_status),
                ns_status
                    .peer_authentication_status
                    .or(mesh_status.peer_authentication_status),
            )
        } else {
            *mesh_status
        };

        self.mesh_fallback(&effective)
    }

    fn mesh_fallback(&self, status: &TlsStatus) -> MtlsStatus {
        if status.has_defined_tls() {
            status.overall_status
        } else if status.has_no_config() {
            MtlsStatus::NotEnabled
        } else if status.has_partial_disabled_config() {
            MtlsStatus::Disabled
        } else if status
            .has_half_tls_config_defined(self.ctx.auto_mtls_enabled, self.ctx.allow_permissive)
        {
            MtlsStatus::Enabled
        } else {
            MtlsStatus::PartiallyEnabled
        }
    }
}
