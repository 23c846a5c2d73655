//! Point-in-time snapshot of mesh objects loaded from manifests
//!
//! Accepts the output of `kubectl get ... -o yaml`: a stream of `---`
//! separated documents, each either a single object or a `kind: List`
//! wrapper with `items`. Services, PeerAuthentications and DestinationRules
//! are kept; everything else is skipped.

use std::collections::BTreeSet;
use std::path::Path;

use k8s_openapi::api::core::v1::Service;
use serde_json::Value;
use tracing::{debug, trace};

use crate::meta::HasApiResource;
use crate::policy::{DestinationRule, PeerAuthentication};
use crate::service::ServiceDescriptor;
use crate::{yaml, Error, Result};

const SERVICE_KIND: &str = "Service";
const LIST_KIND: &str = "List";

/// Objects read from one snapshot
#[derive(Clone, Debug, Default)]
pub struct Snapshot {
    /// Kubernetes Services
    pub services: Vec<ServiceDescriptor>,
    /// PeerAuthentications in every namespace
    pub peer_authentications: Vec<PeerAuthentication>,
    /// DestinationRules in every namespace
    pub destination_rules: Vec<DestinationRule>,
}

impl Snapshot {
    /// Parse a manifest stream
    pub fn from_yaml_str(input: &str) -> Result<Self> {
        let mut snapshot = Self::default();
        for doc in yaml::parse_documents(input)? {
            snapshot.push_object(doc)?;
        }
        debug!(
            services = snapshot.services.len(),
            peer_authentications = snapshot.peer_authentications.len(),
            destination_rules = snapshot.destination_rules.len(),
            "loaded snapshot"
        );
        Ok(snapshot)
    }

    /// Read and parse a manifest file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }

    fn push_object(&mut self, value: Value) -> Result<()> {
        let kind = value
            .get("kind")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        match kind.as_str() {
            LIST_KIND => {
                let items = match value {
                    Value::Object(mut map) => map.remove("items"),
                    _ => None,
                };
                if let Some(Value::Array(items)) = items {
                    for item in items {
                        self.push_object(item)?;
                    }
                }
            }
            SERVICE_KIND => {
                let svc: Service = serde_json::from_value(value)
                    .map_err(|e| Error::serialization_for_kind(SERVICE_KIND, e.to_string()))?;
                self.services.push(ServiceDescriptor::try_from(&svc)?);
            }
            k if k == PeerAuthentication::KIND => {
                let pa: PeerAuthentication = serde_json::from_value(value).map_err(|e| {
                    Error::serialization_for_kind(PeerAuthentication::KIND, e.to_string())
                })?;
                self.peer_authentications.push(pa);
            }
            k if k == DestinationRule::KIND => {
                let dr: DestinationRule = serde_json::from_value(value).map_err(|e| {
                    Error::serialization_for_kind(DestinationRule::KIND, e.to_string())
                })?;
                self.destination_rules.push(dr);
            }
            other => trace!(kind = other, "skipping object"),
        }
        Ok(())
    }

    /// PeerAuthentications living in the mesh root namespace
    pub fn mesh_peer_authentications(&self, root_namespace: &str) -> Vec<PeerAuthentication> {
        self.peer_authentications_in(root_namespace)
    }

    /// PeerAuthentications living in `namespace`
    pub fn namespace_peer_authentications(&self, namespace: &str) -> Vec<PeerAuthentication> {
        self.peer_authentications_in(namespace)
    }

    fn peer_authentications_in(&self, namespace: &str) -> Vec<PeerAuthentication> {
        self.peer_authentications
            .iter()
            .filter(|pa| pa.metadata.namespace == namespace)
            .cloned()
            .collect()
    }

    /// Every namespace any loaded object lives in, sorted
    pub fn namespaces(&self) -> BTreeSet<String> {
        self.services
            .iter()
            .map(|s| s.namespace.as_str())
            .chain(
                self.peer_authentications
                    .iter()
                    .map(|pa| pa.metadata.namespace.as_str()),
            )
            .chain(
                self.destination_rules
                    .iter()
                    .map(|dr| dr.metadata.namespace.as_str()),
            )
            .filter(|ns| !ns.is_empty())
            .map(String::from)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::{ClientTlsMode, PeerAuthenticationMode};

    const BOOKINFO: &str = r#"
apiVersion: v1
kind: Service
metadata:
  name: reviews
  namespace: bookinfo
spec:
  selector:
    app: reviews
  ports:
    - name: http
      port: 9080
---
apiVersion: security.istio.io/v1
kind: PeerAuthentication
metadata:
  name: default
  namespace: istio-system
spec:
  mtls:
    mode: STRICT
---
apiVersion: security.istio.io/v1
kind: PeerAuthentication
metadata:
  name: reviews
  namespace: bookinfo
spec:
  selector:
    matchLabels:
      app: reviews
  mtls:
    mode: PERMISSIVE
---
apiVersion: networking.istio.io/v1
kind: DestinationRule
metadata:
  name: default
  namespace: bookinfo
spec:
  host: "*.bookinfo.svc.cluster.local"
  trafficPolicy:
    tls:
      mode: ISTIO_MUTUAL
---
apiVersion: apps/v1
kind: Deployment
metadata:
  name: reviews-v1
  namespace: bookinfo
"#;

    #[test]
    fn loads_supported_kinds_and_skips_others() {
        let snapshot = Snapshot::from_yaml_str(BOOKINFO).unwrap();
        assert_eq!(snapshot.services.len(), 1);
        assert_eq!(snapshot.peer_authentications.len(), 2);
        assert_eq!(snapshot.destination_rules.len(), 1);
        assert_eq!(
            snapshot.destination_rules[0].tls_mode(),
            Some(ClientTlsMode::IstioMutual)
        );
    }

    #[test]
    fn scopes_peer_authentications_by_namespace() {
        let snapshot = Snapshot::from_yaml_str(BOOKINFO).unwrap();

        let mesh = snapshot.mesh_peer_authentications("istio-system");
        assert_eq!(mesh.len(), 1);
        assert_eq!(mesh[0].mtls_mode(), Some(PeerAuthenticationMode::Strict));

        let ns = snapshot.namespace_peer_authentications("bookinfo");
        assert_eq!(ns.len(), 1);
        assert!(ns[0].is_workload_targeted());
    }

    #[test]
    fn collects_namespaces() {
        let snapshot = Snapshot::from_yaml_str(BOOKINFO).unwrap();
        let namespaces: Vec<_> = snapshot.namespaces().into_iter().collect();
        assert_eq!(namespaces, vec!["bookinfo", "istio-system"]);
    }

    #[test]
    fn unwraps_list_documents() {
        let yaml = r#"
apiVersion: v1
kind: List
items:
  - apiVersion: v1
    kind: Service
    metadata:
      name: ratings
      namespace: bookinfo
  - apiVersion: v1
    kind: Service
    metadata:
      name: details
      namespace: bookinfo
"#;
        let snapshot = Snapshot::from_yaml_str(yaml).unwrap();
        assert_eq!(snapshot.services.len(), 2);
    }

    #[test]
    fn malformed_policy_reports_kind() {
        let yaml = r#"
kind: DestinationRule
metadata:
  name: broken
spec:
  trafficPolicy:
    tls:
      mode: SOMETIMES
"#;
        let err = Snapshot::from_yaml_str(yaml).unwrap_err();
        assert_eq!(err.kind(), Some("DestinationRule"));
    }

    #[test]
    fn empty_stream_is_empty_snapshot() {
        let snapshot = Snapshot::from_yaml_str("---\n").unwrap();
        assert!(snapshot.services.is_empty());
        assert!(snapshot.namespaces().is_empty());
    }
}
