//! `meshview mtls` - effective mTLS status at mesh, namespace and workload scope

use clap::Args;
use meshview_common::{MeshConfig, Snapshot};
use meshview_mtls::{Labels, MtlsEvaluationContext, MtlsResolver, MtlsStatus, TlsStatus};
use serde::Serialize;
use tracing::debug;

use super::format::render_table;
use super::{or_dash, render, OutputFormat, SnapshotArgs};
use crate::{Error, Result};

/// Show mTLS status
#[derive(Args, Debug)]
pub struct MtlsArgs {
    #[command(flatten)]
    pub source: SnapshotArgs,

    /// Only report this namespace (default: every namespace in the snapshot)
    #[arg(short, long)]
    pub namespace: Option<String>,

    /// Workload labels as k=v,k=v; requires --namespace
    #[arg(short, long, value_parser = parse_labels)]
    pub labels: Option<Labels>,
}

/// mTLS report
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MtlsReport {
    /// Mesh-wide status from the root namespace
    pub mesh: TlsStatus,
    /// Per-namespace statuses
    pub namespaces: Vec<NamespaceReport>,
    /// Set when workload labels were given
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workload: Option<WorkloadReport>,
}

/// Status of one namespace
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NamespaceReport {
    /// Namespace name
    pub namespace: String,
    /// Status from the namespace's own policies
    pub status: TlsStatus,
    /// Namespace status combined with the mesh status
    pub overall: MtlsStatus,
}

/// Status of one workload
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkloadReport {
    /// Workload namespace
    pub namespace: String,
    /// Workload labels
    pub labels: Labels,
    /// Effective mTLS status of the workload
    pub status: MtlsStatus,
}

/// Run `meshview mtls`
pub fn run(args: MtlsArgs, config: &MeshConfig, output: OutputFormat) -> Result<()> {
    let snapshot = args.source.load()?;
    let report = build_report(
        &snapshot,
        config,
        args.namespace.as_deref(),
        args.labels.as_ref(),
    )?;
    println!("{}", render(&report, output, render_text)?);
    Ok(())
}

/// Evaluate the snapshot.
///
/// Mesh-wide policies come from the root namespace, which is therefore not
/// listed as a namespace of its own.
pub fn build_report(
    snapshot: &Snapshot,
    config: &MeshConfig,
    namespace: Option<&str>,
    labels: Option<&Labels>,
) -> Result<MtlsReport> {
    if labels.is_some() && namespace.is_none() {
        return Err(Error::invalid_argument("--labels requires --namespace"));
    }

    let mesh_pas = snapshot.mesh_peer_authentications(&config.root_namespace);
    let mesh = MtlsResolver::new(
        MtlsEvaluationContext::new(config)
            .with_peer_authentications(&mesh_pas)
            .with_destination_rules(&snapshot.destination_rules),
    )
    .mesh_status();
    debug!(status = %mesh.overall_status, "mesh status");

    let namespaces: Vec<String> = match namespace {
        Some(ns) => vec![ns.to_string()],
        None => snapshot
            .namespaces()
            .into_iter()
            .filter(|ns| *ns != config.root_namespace)
            .collect(),
    };

    let namespaces = namespaces
        .into_iter()
        .map(|ns| {
            let pas = snapshot.namespace_peer_authentications(&ns);
            let resolver = MtlsResolver::new(
                MtlsEvaluationContext::new(config)
                    .with_peer_authentications(&pas)
                    .with_destination_rules(&snapshot.destination_rules),
            );
            let status = resolver.namespace_status(&ns);
            let overall = resolver.overall(&status, &mesh);
            debug!(namespace = %ns, status = %status.overall_status, %overall, "namespace status");
            NamespaceReport {
                namespace: ns,
                status,
                overall,
            }
        })
        .collect();

    let workload = match (namespace, labels) {
        (Some(ns), Some(labels)) => {
            let pas = snapshot.namespace_peer_authentications(ns);
            let status = MtlsResolver::new(
                MtlsEvaluationContext::new(config)
                    .with_peer_authentications(&pas)
                    .with_destination_rules(&snapshot.destination_rules)
                    .with_services(&snapshot.services)
                    .with_matching_labels(labels),
            )
            .workload_status(ns);
            Some(WorkloadReport {
                namespace: ns.to_string(),
                labels: labels.clone(),
                status,
            })
        }
        _ => None,
    };

    Ok(MtlsReport {
        mesh,
        namespaces,
        workload,
    })
}

fn render_text(report: &MtlsReport) -> String {
    let mut out = format!(
        "MESH  {}  (destination rule: {}, peer authentication: {})\n\n",
        report.mesh.overall_status,
        or_dash(report.mesh.destination_rule_status),
        or_dash(report.mesh.peer_authentication_status),
    );

    let rows: Vec<Vec<String>> = report
        .namespaces
        .iter()
        .map(|ns| {
            vec![
                ns.namespace.clone(),
                or_dash(ns.status.destination_rule_status),
                or_dash(ns.status.peer_authentication_status),
                ns.status.overall_status.to_string(),
                ns.overall.to_string(),
            ]
        })
        .collect();
    out.push_str(&render_table(
        &["NAMESPACE", "DESTINATION_RULE", "PEER_AUTHENTICATION", "STATUS", "OVERALL"],
        &rows,
    ));

    if let Some(workload) = &report.workload {
        let labels: Vec<String> = workload
            .labels
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect();
        out.push_str(&format!(
            "\n\nWORKLOAD  {}/{}  {}",
            workload.namespace,
            labels.join(","),
            workload.status
        ));
    }
    out
}

/// Parse `k=v,k=v` into a label set
fn parse_labels(input: &str) -> std::result::Result<Labels, String> {
    let mut labels = Labels::new();
    for pair in input.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let (key, value) = pair
            .split_once('=')
            .ok_or_else(|| format!("expected key=value, got '{}'", pair))?;
        if key.trim().is_empty() {
            return Err(format!("empty label key in '{}'", pair));
        }
        labels.insert(key.trim().to_string(), value.trim().to_string());
    }
    if labels.is_empty() {
        return Err("at least one label is required".to_string());
    }
    Ok(labels)
}
