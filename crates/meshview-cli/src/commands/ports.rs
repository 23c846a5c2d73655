//! `meshview ports` - protocol classification and port naming checks

use clap::Args;
use meshview_common::Snapshot;
use meshview_mtls::protocol::{
    classify_service_port, is_valid_app_protocol, matches_naming_convention,
    service_port_protocol, validate_service_port,
};
use meshview_mtls::PortProtocol;
use serde::Serialize;
use tracing::debug;

use super::format::render_table;
use super::{or_dash, render, OutputFormat, SnapshotArgs};
use crate::Result;

/// Classify service ports
#[derive(Args, Debug)]
pub struct PortsArgs {
    #[command(flatten)]
    pub source: SnapshotArgs,

    /// Only show ports that fail a naming check
    #[arg(long)]
    pub invalid: bool,
}

/// One service port
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PortRow {
    /// Namespace of the Service
    pub namespace: String,
    /// Service name
    pub service: String,
    /// Port name, empty for a single unnamed port
    pub name: String,
    /// Service port number
    pub port: i32,
    /// Protocol Istio selects, absent when neither appProtocol nor the name identify one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub protocol: Option<String>,
    /// Traffic class derived from the protocol
    pub class: PortProtocol,
    /// appProtocol or name identifies a protocol
    pub valid: bool,
    /// Name follows `<protocol>[-<suffix>]` for the selected protocol.
    /// Always true when a recognised appProtocol is set, since the name is then free-form.
    pub follows_convention: bool,
}

impl PortRow {
    fn is_flagged(&self) -> bool {
        !self.valid || !self.follows_convention
    }
}

/// Run `meshview ports`
pub fn run(args: PortsArgs, output: OutputFormat) -> Result<()> {
    let snapshot = args.source.load()?;
    let rows: Vec<PortRow> = build_report(&snapshot)
        .into_iter()
        .filter(|row| !args.invalid || row.is_flagged())
        .collect();
    println!("{}", render(&rows, output, |rows| render_text(rows))?);
    Ok(())
}

/// One row per port of every Service in the snapshot
pub fn build_report(snapshot: &Snapshot) -> Vec<PortRow> {
    snapshot
        .services
        .iter()
        .flat_map(|svc| svc.ports.iter().map(move |port| (svc, port)))
        .map(|(svc, port)| {
            let protocol = service_port_protocol(port);
            let declared = protocol.as_deref().unwrap_or(port.protocol.as_str());
            let follows_convention = is_valid_app_protocol(port.app_protocol.as_deref())
                || matches_naming_convention(&port.name, declared);
            let row = PortRow {
                namespace: svc.namespace.clone(),
                service: svc.name.clone(),
                name: port.name.clone(),
                port: port.port,
                class: classify_service_port(port),
                valid: validate_service_port(port),
                follows_convention,
                protocol,
            };
            debug!(service = %row.service, port = row.port, class = %row.class, "classified port");
            row
        })
        .collect()
}

fn render_text(rows: &[PortRow]) -> String {
    let cells: Vec<Vec<String>> = rows
        .iter()
        .map(|row| {
            vec![
                row.namespace.clone(),
                row.service.clone(),
                or_dash(Some(&row.name)),
                row.port.to_string(),
                or_dash(row.protocol.as_deref()),
                row.class.to_string(),
                row.valid.to_string(),
                row.follows_convention.to_string(),
            ]
        })
        .collect();
    render_table(
        &["NAMESPACE", "SERVICE", "NAME", "PORT", "PROTOCOL", "CLASS", "VALID", "CONVENTION"],
        &cells,
    )
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
spec:
  ports:
    - name: http-web
      port: 9080
    - name: metrics
      port: 15020
    - name: api
      port: 8443
      appProtocol: https
    - name: db
      port: 5432
      protocol: TCP
      appProtocol: tcp
"#;

    fn rows() -> Vec<PortRow> {
        build_report(&Snapshot::from_yaml_str(SNAPSHOT).unwrap())
    }

    #[test]
    fn classifies_by_name() {
        let rows = rows();
        assert_eq!(rows[0].protocol.as_deref(), Some("HTTP"));
        assert_eq!(rows[0].class, PortProtocol::Http);
        assert!(rows[0].valid && rows[0].follows_convention);
    }

    #[test]
    fn unidentified_port_is_tcp_and_invalid() {
        let rows = rows();
        assert_eq!(rows[1].protocol, None);
        assert_eq!(rows[1].class, PortProtocol::Tcp);
        assert!(!rows[1].valid);
        // falls back to the declared TCP protocol, which has no naming rule
        assert!(rows[1].follows_convention);
        assert!(rows[1].is_flagged());
    }

    #[test]
    fn app_protocol_makes_name_free_form() {
        let rows = rows();
        assert_eq!(rows[2].protocol.as_deref(), Some("HTTPS"));
        assert_eq!(rows[2].class, PortProtocol::Tls);
        assert!(rows[2].valid);
        assert!(rows[2].follows_convention);
        assert!(!rows[2].is_flagged());
    }

    #[test]
    fn unrecognised_app_protocol_falls_back_to_name() {
        let snapshot = Snapshot::from_yaml_str(
            r#"
apiVersion: v1
kind: Service
metadata:
  name: web
  namespace: shop
spec:
  ports:
    - name: api
      port: 80
      appProtocol: kafka
    - name: grpc-api
      port: 81
      appProtocol: kafka
"#,
        )
        .unwrap();
        let rows = build_report(&snapshot);
        assert_eq!(rows[0].protocol, None);
        assert!(!rows[0].valid);
        assert!(rows[0].is_flagged());

        assert_eq!(rows[1].protocol.as_deref(), Some("GRPC"));
        assert!(rows[1].valid && rows[1].follows_convention);
        assert!(!rows[1].is_flagged());
    }

    #[test]
    fn tcp_app_protocol_needs_no_naming() {
        let rows = rows();
        assert_eq!(rows[3].class, PortProtocol::Tcp);
        assert!(rows[3].valid && rows[3].follows_convention);
        assert!(!rows[3].is_flagged());
    }

    #[test]
    fn text_output_has_one_line_per_port() {
        let text = render_text(&rows());
        assert_eq!(text.lines().count(), 5);
        assert!(text.contains("http-web"));
    }
}
