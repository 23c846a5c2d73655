//! CLI commands
//!
//! Every command loads a snapshot, builds a serialisable report, and prints it
//! either as aligned text or as pretty JSON.

use std::path::PathBuf;

use clap::{Args, ValueEnum};
use meshview_common::Snapshot;
use serde::Serialize;
use tracing::info;

use crate::Result;

pub mod format;
pub mod hosts;
pub mod mtls;
pub mod ports;

/// Output format
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Aligned columns (default)
    #[default]
    Text,
    /// JSON
    Json,
}

/// Where to read cluster state from
#[derive(Args, Debug, Clone)]
pub struct SnapshotArgs {
    /// Multi-document YAML with Services, PeerAuthentications and DestinationRules
    #[arg(short = 'f', long = "snapshot", env = "MESHVIEW_SNAPSHOT")]
    pub snapshot: PathBuf,
}

impl SnapshotArgs {
    /// Load and parse the snapshot file
    pub fn load(&self) -> Result<Snapshot> {
        let snapshot = Snapshot::load(&self.snapshot)?;
        info!(
            path = %self.snapshot.display(),
            services = snapshot.services.len(),
            peer_authentications = snapshot.peer_authentications.len(),
            destination_rules = snapshot.destination_rules.len(),
            "loaded snapshot"
        );
        Ok(snapshot)
    }
}

/// Render a report in the requested format
pub fn render<T, F>(report: &T, output: OutputFormat, text: F) -> Result<String>
where
    T: Serialize,
    F: FnOnce(&T) -> String,
{
    match output {
        OutputFormat::Text => Ok(text(report)),
        OutputFormat::Json => Ok(serde_json::to_string_pretty(report)?),
    }
}

/// Placeholder for an absent value in text output
pub(crate) fn or_dash(value: Option<impl ToString>) -> String {
    value
        .map(|v| v.to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| "-".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Serialize)]
    struct Report {
        name: &'static str,
    }

    #[test]
    fn renders_json() {
        let out = render(&Report { name: "reviews" }, OutputFormat::Json, |_| String::new()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value["name"], "reviews");
    }

    #[test]
    fn renders_text_with_callback() {
        let out = render(&Report { name: "reviews" }, OutputFormat::Text, |r| {
            format!("name={}", r.name)
        })
        .unwrap();
        assert_eq!(out, "name=reviews");
    }

    #[test]
    fn dash_for_missing_values() {
        assert_eq!(or_dash(None::<&str>), "-");
        assert_eq!(or_dash(Some("")), "-");
        assert_eq!(or_dash(Some("STRICT")), "STRICT");
    }
}
