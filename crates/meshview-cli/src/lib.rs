//! meshview CLI library

pub mod commands;
pub mod error;

pub use error::{Error, Result};

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use meshview_common::telemetry::LogFormat;
use meshview_common::MeshConfig;
use tracing::debug;

use commands::OutputFormat;

/// meshview - service mesh visibility and mTLS inspector
#[derive(Parser, Debug)]
#[command(name = "meshview")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Commands,
}

/// Flags shared by every subcommand
#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    /// Mesh config file (camelCase YAML)
    #[arg(long, env = "MESHVIEW_MESH_CONFIG", global = true)]
    pub mesh_config: Option<PathBuf>,

    /// Cluster DNS suffix, overrides the mesh config
    #[arg(long, env = "MESHVIEW_IDENTITY_DOMAIN", global = true)]
    pub identity_domain: Option<String>,

    /// Namespace holding mesh-wide policies, overrides the mesh config
    #[arg(long, env = "MESHVIEW_ROOT_NAMESPACE", global = true)]
    pub root_namespace: Option<String>,

    /// Whether auto mTLS is on, overrides the mesh config
    #[arg(long, env = "MESHVIEW_AUTO_MTLS", global = true)]
    pub auto_mtls: Option<bool>,

    /// Whether PERMISSIVE counts as enabled, overrides the mesh config
    #[arg(long, env = "MESHVIEW_ALLOW_PERMISSIVE", global = true)]
    pub allow_permissive: Option<bool>,

    /// Output format
    #[arg(short, long, default_value = "text", global = true)]
    pub output: OutputFormat,

    /// Log format (text or json)
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,
}

impl GlobalArgs {
    /// Mesh config from file (or defaults) with flag overrides applied
    pub fn mesh_config(&self) -> Result<MeshConfig> {
        let mut config = match &self.mesh_config {
            Some(path) => MeshConfig::load(path)?,
            None => MeshConfig::default(),
        };

        if let Some(domain) = &self.identity_domain {
            config.identity_domain = domain.clone();
        }
        if let Some(namespace) = &self.root_namespace {
            config.root_namespace = namespace.clone();
        }
        if let Some(auto_mtls) = self.auto_mtls {
            config.enable_auto_mtls = auto_mtls;
        }
        if let Some(allow_permissive) = self.allow_permissive {
            config.allow_permissive = allow_permissive;
        }

        config.validate()?;
        debug!(
            identity_domain = %config.identity_domain,
            root_namespace = %config.root_namespace,
            auto_mtls = config.enable_auto_mtls,
            allow_permissive = config.allow_permissive,
            "resolved mesh config"
        );
        Ok(config)
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show mesh, namespace and workload mTLS status
    Mtls(commands::mtls::MtlsArgs),
    /// List service hostnames or check one host's visibility
    Hosts(commands::hosts::HostsArgs),
    /// Classify service ports and check their naming
    Ports(commands::ports::PortsArgs),
}

impl Cli {
    /// Run the CLI command
    pub fn run(self) -> Result<()> {
        let config = self.global.mesh_config()?;
        let output = self.global.output;
        match self.command {
            Commands::Mtls(args) => commands::mtls::run(args, &config, output),
            Commands::Hosts(args) => commands::hosts::run(args, &config, output),
            Commands::Ports(args) => commands::ports::run(args, output),
        }
    }
}
