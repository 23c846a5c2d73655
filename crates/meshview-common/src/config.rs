//! Mesh configuration consumed by the policy engine
//!
//! The handful of MeshConfig settings that change visibility and mTLS
//! answers. Loaded from a YAML file (camelCase keys, Istio MeshConfig style)
//! and optionally overridden by CLI flags.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::mesh::{DEFAULT_IDENTITY_DOMAIN, DEFAULT_ROOT_NAMESPACE};
use crate::{yaml, Error, Result};

/// Mesh-wide settings
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MeshConfig {
    /// DNS suffix of the cluster (`svc.cluster.local` unless customised)
    pub identity_domain: String,
    /// Whether the control plane upgrades client traffic to mTLS automatically
    pub enable_auto_mtls: bool,
    /// Whether PERMISSIVE peer authentication counts as mTLS-enabled
    pub allow_permissive: bool,
    /// Visibility applied to Services without an exportTo annotation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_service_export_to: Option<Vec<String>>,
    /// Namespace whose policies apply mesh-wide
    pub root_namespace: String,
}

impl Default for MeshConfig {
    fn default() -> Self {
        Self {
            identity_domain: DEFAULT_IDENTITY_DOMAIN.to_string(),
            enable_auto_mtls: true,
            allow_permissive: false,
            default_service_export_to: None,
            root_namespace: DEFAULT_ROOT_NAMESPACE.to_string(),
        }
    }
}

impl MeshConfig {
    /// Parse and validate a config document
    pub fn from_yaml_str(input: &str) -> Result<Self> {
        let value = yaml::parse_document(input)?;
        if value.is_null() {
            return Ok(Self::default());
        }
        let config: Self = serde_json::from_value(value)
            .map_err(|e| Error::config(format!("invalid mesh config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a config file
    pub fn load(path: &Path) -> Result<Self> {
        let path_str = path.display().to_string();
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::config_at(&path_str, format!("failed to read: {}", e)))?;
        let config = Self::from_yaml_str(&content).map_err(|e| match e {
            Error::Config { message, .. } => Error::config_at(&path_str, message),
            other => other,
        })?;
        debug!(path = %path_str, identity_domain = %config.identity_domain, "loaded mesh config");
        Ok(config)
    }

    /// Reject settings that would make every hostname lookup miss
    pub fn validate(&self) -> Result<()> {
        if self.identity_domain.trim().is_empty() {
            return Err(Error::validation_for_field(
                "identityDomain",
                "identity domain must not be empty",
            ));
        }
        if self.identity_domain.starts_with('.') || self.identity_domain.ends_with('.') {
            return Err(Error::validation_for_field(
                "identityDomain",
                format!(
                    "identity domain '{}' must not start or end with a dot",
                    self.identity_domain
                ),
            ));
        }
        if self.root_namespace.trim().is_empty() {
            return Err(Error::validation_for_field(
                "rootNamespace",
                "root namespace must not be empty",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_stock_istio() {
        let config = MeshConfig::default();
        assert_eq!(config.identity_domain, "svc.cluster.local");
        assert!(config.enable_auto_mtls);
        assert!(!config.allow_permissive);
        assert!(config.default_service_export_to.is_none());
        assert_eq!(config.root_namespace, "istio-system");
    }

    #[test]
    fn partial_document_keeps_defaults() {
        let config = MeshConfig::from_yaml_str("allowPermissive: true\n").unwrap();
        assert!(config.allow_permissive);
        assert!(config.enable_auto_mtls);
        assert_eq!(config.identity_domain, DEFAULT_IDENTITY_DOMAIN);
    }

    #[test]
    fn full_document() {
        let yaml = r#"
identityDomain: svc.corp.example
enableAutoMtls: false
defaultServiceExportTo:
  - "."
rootNamespace: mesh-root
"#;
        let config = MeshConfig::from_yaml_str(yaml).unwrap();
        assert_eq!(config.identity_domain, "svc.corp.example");
        assert!(!config.enable_auto_mtls);
        assert_eq!(config.default_service_export_to, Some(vec![".".to_string()]));
        assert_eq!(config.root_namespace, "mesh-root");
    }

    #[test]
    fn empty_document_is_default() {
        assert_eq!(MeshConfig::from_yaml_str("").unwrap(), MeshConfig::default());
    }

    #[test]
    fn empty_identity_domain_rejected() {
        let err = MeshConfig::from_yaml_str("identityDomain: \"\"\n").unwrap_err();
        assert_eq!(err.field(), Some("identityDomain"));
    }

    #[test]
    fn dotted_identity_domain_rejected() {
        let err = MeshConfig::from_yaml_str("identityDomain: .cluster.local\n").unwrap_err();
        assert_eq!(err.field(), Some("identityDomain"));
    }

    #[test]
    fn wrong_type_is_config_error() {
        let err = MeshConfig::from_yaml_str("enableAutoMtls: [1]\n").unwrap_err();
        assert!(matches!(err, Error::Config { .. }));
    }

    #[test]
    fn loads_file_from_disk() {
        let path = std::env::temp_dir().join(format!("meshview-config-{}.yaml", std::process::id()));
        std::fs::write(&path, "identityDomain: svc.corp.example\nrootNamespace: mesh-root\n")
            .unwrap();
        let loaded = MeshConfig::load(&path);
        std::fs::remove_file(&path).unwrap();

        let config = loaded.unwrap();
        assert_eq!(config.identity_domain, "svc.corp.example");
        assert_eq!(config.root_namespace, "mesh-root");
    }

    #[test]
    fn missing_file_reports_path() {
        let err = MeshConfig::load(Path::new("/nonexistent/meshview/mesh.yaml")).unwrap_err();
        match err {
            Error::Config { path, .. } => {
                assert_eq!(path.as_deref(), Some("/nonexistent/meshview/mesh.yaml"))
            }
            other => panic!("expected config error, got {other:?}"),
        }
    }
}
