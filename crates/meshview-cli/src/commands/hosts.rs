//! `meshview hosts` - service hostnames and their exportTo visibility

use clap::Args;
use meshview_common::{MeshConfig, Snapshot};
use meshview_mtls::HostVisibilityIndex;
use serde::Serialize;

use super::format::render_table;
use super::{or_dash, render, OutputFormat, SnapshotArgs};
use crate::Result;

/// List or check service hostnames
#[derive(Args, Debug)]
pub struct HostsArgs {
    #[command(flatten)]
    pub source: SnapshotArgs,

    /// Namespace the lookup is made from
    #[arg(long = "from")]
    pub from: Option<String>,

    /// Hostname to check (default: list every indexed hostname)
    pub host: Option<String>,
}

/// One hostname
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HostRow {
    /// Hostname as looked up
    pub host: String,
    /// Hostname belongs to an indexed Service
    pub exists: bool,
    /// Namespace of the owning Service
    #[serde(skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    /// Effective exportTo; empty means visible everywhere
    pub export_to: Vec<String>,
    /// Only set when a viewer namespace was given
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visible: Option<bool>,
}

/// Run `meshview hosts`
pub fn run(args: HostsArgs, config: &MeshConfig, output: OutputFormat) -> Result<()> {
    let snapshot = args.source.load()?;
    let rows = build_report(&snapshot, config, args.host.as_deref(), args.from.as_deref());
    println!("{}", render(&rows, output, |rows| render_text(rows))?);
    Ok(())
}

/// Rows for one hostname, or for every indexed hostname when `host` is `None`
pub fn build_report(
    snapshot: &Snapshot,
    config: &MeshConfig,
    host: Option<&str>,
    from: Option<&str>,
) -> Vec<HostRow> {
    let index = HostVisibilityIndex::from_config(&snapshot.services, config);
    let visible = |host: &str| from.map(|ns| index.is_visible_from(host, ns));

    match host {
        Some(host) => {
            let entry = index.entry(host);
            vec![HostRow {
                host: host.to_string(),
                exists: index.has_host(host),
                namespace: entry.map(|e| e.namespace().to_string()),
                export_to: entry.map(|e| e.export_to().to_vec()).unwrap_or_default(),
                visible: visible(host),
            }]
        }
        None => index
            .iter()
            .map(|(host, entry)| HostRow {
                host: host.to_string(),
                exists: true,
                namespace: Some(entry.namespace().to_string()),
                export_to: entry.export_to().to_vec(),
                visible: visible(host),
            })
            .collect(),
    }
}

fn render_text(rows: &[HostRow]) -> String {
    let with_visibility = rows.iter().any(|r| r.visible.is_some());
    let mut headers = vec!["HOST", "EXISTS", "NAMESPACE", "EXPORT_TO"];
    if with_visibility {
        headers.push("VISIBLE");
    }

    let cells: Vec<Vec<String>> = rows
        .iter()
        .map(|row| {
            let export_to = if row.export_to.is_empty() {
                "*".to_string()
            } else {
                row.export_to.join(",")
            };
            let mut cells = vec![
                row.host.clone(),
                row.exists.to_string(),
                or_dash(row.namespace.as_deref()),
                if row.exists { export_to } else { "-".to_string() },
            ];
            if with_visibility {
                cells.push(or_dash(row.visible));
            }
            cells
        })
        .collect();
    render_table(&headers, &cells)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SNAPSHOT: &str = r#"
apiVersion: v1
kind: Service
metadata:
  name: reviews
  namespace: bookinfo
---
apiVersion: v1
kind: Service
metadata:
  name: ratings
  namespace: bookinfo
  annotations:
    networking.istio.io/exportTo: "."
"#;

    fn snapshot() -> Snapshot {
        Snapshot::from_yaml_str(SNAPSHOT).unwrap()
    }

    #[test]
    fn lists_three_hosts_per_service() {
        let rows = build_report(&snapshot(), &MeshConfig::default(), None, None);
        assert_eq!(rows.len(), 6);
        assert!(rows.iter().all(|r| r.exists && r.visible.is_none()));
        assert!(rows.iter().any(|r| r.host == "ratings.bookinfo.svc.cluster.local"));
    }

    #[test]
    fn checks_single_host_visibility() {
        let config = MeshConfig::default();
        let rows = build_report(&snapshot(), &config, Some("ratings.bookinfo"), Some("other-ns"));
        assert_eq!(rows.len(), 1);
        assert!(rows[0].exists);
        assert_eq!(rows[0].export_to, vec![".".to_string()]);
        assert_eq!(rows[0].visible, Some(false));

        let rows = build_report(&snapshot(), &config, Some("reviews.bookinfo"), Some("other-ns"));
        assert_eq!(rows[0].visible, Some(true));
    }

    #[test]
    fn unknown_host_does_not_exist() {
        let rows = build_report(
            &snapshot(),
            &MeshConfig::default(),
            Some("reviews"),
            Some("bookinfo"),
        );
        assert!(!rows[0].exists);
        assert_eq!(rows[0].namespace, None);
        assert_eq!(rows[0].visible, Some(false));
    }

    #[test]
    fn text_output_shows_visibility_column_only_when_asked() {
        let rows = build_report(&snapshot(), &MeshConfig::default(), None, None);
        assert!(!render_text(&rows).contains("VISIBLE"));

        let rows = build_report(&snapshot(), &MeshConfig::default(), None, Some("bookinfo"));
        let text = render_text(&rows);
        assert!(text.lines().next().unwrap().ends_with("VISIBLE"));
    }
}
