//! End-to-end resolution over snapshots loaded from manifests

use meshview_common::policy::{ClientTlsMode, PeerAuthenticationMode};
use meshview_common::{MeshConfig, Snapshot};
use meshview_mtls::{
    classify_protocol, HostVisibilityIndex, Labels, MtlsEvaluationContext, MtlsResolver,
    MtlsStatus, PortProtocol,
};

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
apiVersion: v1
kind: Service
metadata:
  name: ratings
  namespace: bookinfo
  annotations:
    networking.istio.io/exportTo: "."
spec:
  selector:
    app: ratings
  ports:
    - name: grpc-api
      port: 9090
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
apiVersion: security.istio.io/v1
kind: PeerAuthentication
metadata:
  name: default
  namespace: bookinfo
spec:
  mtls:
    mode: STRICT
"#;

const MESH_STRICT: &str = r#"
apiVersion: security.istio.io/v1
kind: PeerAuthentication
metadata:
  name: default
  namespace: istio-system
spec:
  mtls:
    mode: STRICT
---
apiVersion: v1
kind: Service
metadata:
  name: productpage
  namespace: frontend
spec:
  selector:
    app: productpage
"#;

const PERMISSIVE_WORKLOAD: &str = r#"
apiVersion: v1
kind: Service
metadata:
  name: reviews
  namespace: bookinfo
spec:
  selector:
    app: reviews
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
  name: reviews
  namespace: bookinfo
spec:
  host: reviews
  trafficPolicy:
    tls:
      mode: ISTIO_MUTUAL
"#;

fn load(yaml: &str) -> Snapshot {
    Snapshot::from_yaml_str(yaml).expect("fixture should parse")
}

#[test]
fn unannotated_service_is_visible_everywhere() {
    let snapshot = load(BOOKINFO);
    let index = HostVisibilityIndex::from_config(&snapshot.services, &MeshConfig::default());

    assert!(index.has_host("reviews.bookinfo"));
    assert!(index.is_visible_from("reviews.bookinfo", "other-ns"));
    assert!(index.is_visible_from("reviews.bookinfo.svc.cluster.local", "other-ns"));
}

#[test]
fn dot_annotated_service_is_namespace_private() {
    let snapshot = load(BOOKINFO);
    let index = HostVisibilityIndex::from_config(&snapshot.services, &MeshConfig::default());

    assert!(index.is_visible_from("ratings.bookinfo", "bookinfo"));
    assert!(!index.is_visible_from("ratings.bookinfo", "other-ns"));
    assert!(!index.is_visible_from("ratings.bookinfo.svc", "other-ns"));
}

#[test]
fn mesh_default_export_applies_to_unannotated_services() {
    let snapshot = load(BOOKINFO);
    let config = MeshConfig {
        default_service_export_to: Some(vec!["~".to_string()]),
        ..Default::default()
    };
    let index = HostVisibilityIndex::from_config(&snapshot.services, &config);

    assert!(!index.is_visible_from("reviews.bookinfo", "bookinfo"));
    // annotation still wins
    assert!(index.is_visible_from("ratings.bookinfo", "bookinfo"));
}

#[test]
fn namespace_with_istio_mutual_and_strict_is_enabled() {
    let snapshot = load(BOOKINFO);
    let config = MeshConfig::default();
    let pas = snapshot.namespace_peer_authentications("bookinfo");
    let ctx = MtlsEvaluationContext::new(&config)
        .with_peer_authentications(&pas)
        .with_destination_rules(&snapshot.destination_rules)
        .with_services(&snapshot.services);

    let status = MtlsResolver::new(ctx).namespace_status("bookinfo");
    assert_eq!(status.destination_rule_status, Some(ClientTlsMode::IstioMutual));
    assert_eq!(
        status.peer_authentication_status,
        Some(PeerAuthenticationMode::Strict)
    );
    assert_eq!(status.overall_status, MtlsStatus::Enabled);
}

#[test]
fn namespace_without_policy_inherits_strict_mesh() {
    let snapshot = load(MESH_STRICT);
    let config = MeshConfig::default();

    let mesh_pas = snapshot.mesh_peer_authentications(&config.root_namespace);
    let mesh = MtlsResolver::new(
        MtlsEvaluationContext::new(&config)
            .with_peer_authentications(&mesh_pas)
            .with_destination_rules(&snapshot.destination_rules),
    );
    let mesh_status = mesh.mesh_status();
    assert_eq!(mesh_status.overall_status, MtlsStatus::Enabled);

    let ns_pas = snapshot.namespace_peer_authentications("frontend");
    let ns = MtlsResolver::new(
        MtlsEvaluationContext::new(&config)
            .with_peer_authentications(&ns_pas)
            .with_destination_rules(&snapshot.destination_rules),
    );
    let ns_status = ns.namespace_status("frontend");
    assert_eq!(ns_status.overall_status, MtlsStatus::NotEnabled);

    assert_eq!(ns.overall(&ns_status, &mesh_status), MtlsStatus::Enabled);
}

#[test]
fn mesh_strict_is_partial_without_auto_mtls() {
    let snapshot = load(MESH_STRICT);
    let config = MeshConfig {
        enable_auto_mtls: false,
        ..Default::default()
    };
    let mesh_pas = snapshot.mesh_peer_authentications(&config.root_namespace);
    let mesh = MtlsResolver::new(
        MtlsEvaluationContext::new(&config).with_peer_authentications(&mesh_pas),
    );
    assert_eq!(mesh.mesh_status().overall_status, MtlsStatus::PartiallyEnabled);
}

#[test]
fn permissive_workload_resolved_through_service_rule() {
    let snapshot = load(PERMISSIVE_WORKLOAD);
    let config = MeshConfig::default();
    let pas = snapshot.namespace_peer_authentications("bookinfo");
    let reviews = Labels::from([
        ("app".to_string(), "reviews".to_string()),
        ("version".to_string(), "v1".to_string()),
    ]);
    let ctx = MtlsEvaluationContext::new(&config)
        .with_peer_authentications(&pas)
        .with_destination_rules(&snapshot.destination_rules)
        .with_services(&snapshot.services)
        .with_matching_labels(&reviews);
    let resolver = MtlsResolver::new(ctx);

    assert_eq!(resolver.workload_status("bookinfo"), MtlsStatus::Enabled);

    // the workload-targeted policy is not a namespace-wide declaration
    let ns_status = resolver.namespace_status("bookinfo");
    assert_eq!(ns_status.peer_authentication_status, None);
    assert_eq!(ns_status.overall_status, MtlsStatus::NotEnabled);
}

#[test]
fn port_names_classify_through_snapshot() {
    let snapshot = load(BOOKINFO);
    let classes: Vec<_> = snapshot
        .services
        .iter()
        .flat_map(|svc| svc.ports.iter())
        .map(meshview_mtls::protocol::classify_service_port)
        .collect();
    assert_eq!(classes, vec![PortProtocol::Http, PortProtocol::Http]);
    assert_eq!(classify_protocol("TLS"), PortProtocol::Tls);
}
