//! Kubernetes object metadata shared by the policy types
//!
//! Only the subset of `metadata` meshview reads is modelled. Unknown fields
//! (uid, resourceVersion, managedFields, ...) are ignored on deserialization.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Kubernetes ObjectMeta subset used by Istio policy objects.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ObjectMeta {
    /// Resource name
    pub name: String,
    /// Resource namespace (empty when the manifest omits it)
    #[serde(default)]
    pub namespace: String,
    /// Labels
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,
    /// Annotations
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub annotations: BTreeMap<String, String>,
}

impl ObjectMeta {
    /// Create metadata with a name and namespace
    pub fn new(name: impl Into<String>, namespace: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            namespace: namespace.into(),
            labels: BTreeMap::new(),
            annotations: BTreeMap::new(),
        }
    }

    /// Add a label
    pub fn with_label(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.labels.insert(key.into(), value.into());
        self
    }

    /// Add an annotation
    pub fn with_annotation(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.annotations.insert(key.into(), value.into());
        self
    }
}

/// Compile-time API version and kind for a resource type.
///
/// Used to stamp `apiVersion`/`kind` on construction and to dispatch
/// manifests by `kind` when loading a snapshot.
pub trait HasApiResource {
    /// Full API version (e.g., "security.istio.io/v1")
    const API_VERSION: &'static str;
    /// Resource kind (e.g., "PeerAuthentication")
    const KIND: &'static str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_adds_labels_and_annotations() {
        let meta = ObjectMeta::new("reviews", "bookinfo")
            .with_label("app", "reviews")
            .with_annotation("networking.istio.io/exportTo", ".");
        assert_eq!(meta.labels.get("app").map(String::as_str), Some("reviews"));
        assert_eq!(meta.annotations.len(), 1);
    }

    #[test]
    fn missing_namespace_deserializes_empty() {
        let meta: ObjectMeta = serde_json::from_str(r#"{"name":"default"}"#).unwrap();
        assert_eq!(meta.name, "default");
        assert!(meta.namespace.is_empty());
        assert!(meta.labels.is_empty());
    }
}
