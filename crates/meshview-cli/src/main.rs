//! meshview CLI
//!
//! Inspects visibility and mTLS posture of a service mesh from a snapshot of
//! its manifests.

use clap::Parser;
use meshview_common::telemetry::{init_logging, LogConfig};

use meshview_cli::{Cli, Result};

fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(LogConfig {
        format: cli.global.log_format,
        ..Default::default()
    })?;

    cli.run()
}
