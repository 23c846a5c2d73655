//! Service descriptors projected from Kubernetes Services
//!
//! The policy engine never touches `k8s_openapi` types directly. A
//! [`ServiceDescriptor`] keeps only what visibility and mTLS resolution need:
//! identity, labels, the pod selector, the raw exportTo annotation and the
//! declared ports.

use std::collections::BTreeMap;

use k8s_openapi::api::core::v1::Service;
use serde::{Deserialize, Serialize};

use crate::mesh::EXPORT_TO_ANNOTATION;
use crate::Error;

/// A declared service port
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServicePort {
    /// Port name (empty when the Service declares a single unnamed port)
    pub name: String,
    /// Port number
    pub port: i32,
    /// Transport protocol (TCP, UDP, SCTP)
    pub protocol: String,
    /// Application protocol hint
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_protocol: Option<String>,
}

impl ServicePort {
    /// Create a TCP port
    pub fn tcp(name: impl Into<String>, port: i32) -> Self {
        Self {
            name: name.into(),
            port,
            protocol: "TCP".to_string(),
            app_protocol: None,
        }
    }
}

/// Read-only view of a Kubernetes Service
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceDescriptor {
    /// Service name
    pub name: String,
    /// Service namespace
    pub namespace: String,
    /// Service labels
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,
    /// Pod selector
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub selector: BTreeMap<String, String>,
    /// Raw `networking.istio.io/exportTo` annotation value
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub export_to: Option<String>,
    /// Declared ports
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ports: Vec<ServicePort>,
}

impl ServiceDescriptor {
    /// Create a descriptor with no labels, selector, annotation or ports
    pub fn new(name: impl Into<String>, namespace: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            namespace: namespace.into(),
            ..Default::default()
        }
    }

    /// Add a pod selector entry
    pub fn with_selector(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.selector.insert(key.into(), value.into());
        self
    }

    /// Add a label
    pub fn with_label(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.labels.insert(key.into(), value.into());
        self
    }

    /// Set the raw exportTo annotation
    pub fn with_export_to(mut self, export_to: impl Into<String>) -> Self {
        self.export_to = Some(export_to.into());
        self
    }

    /// Add a declared port
    pub fn with_port(mut self, port: ServicePort) -> Self {
        self.ports.push(port);
        self
    }
}

impl TryFrom<&Service> for ServiceDescriptor {
    type Error = Error;

    fn try_from(svc: &Service) -> Result<Self, Self::Error> {
        let name = svc
            .metadata
            .name
            .clone()
            .ok_or_else(|| Error::serialization_for_kind("Service", "missing metadata.name"))?;
        let namespace = svc.metadata.namespace.clone().unwrap_or_default();

        let export_to = svc
            .metadata
            .annotations
            .as_ref()
            .and_then(|a| a.get(EXPORT_TO_ANNOTATION))
            .cloned();

        let spec = svc.spec.as_ref();
        let selector = spec.and_then(|s| s.selector.clone()).unwrap_or_default();
        let ports = spec
            .and_then(|s| s.ports.as_ref())
            .map(|ports| {
                ports
                    .iter()
                    .map(|p| ServicePort {
                        name: p.name.clone().unwrap_or_default(),
                        port: p.port,
                        protocol: p.protocol.clone().unwrap_or_else(|| "TCP".to_string()),
                        app_protocol: p.app_protocol.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default();

        Ok(Self {
            name,
            namespace,
            labels: svc.metadata.labels.clone().unwrap_or_default(),
            selector,
            export_to,
            ports,
        })
    }
}
