//! Exact-match label selection
//!
//! Istio workload selectors and Kubernetes Service selectors are plain
//! `key: value` maps. Selection means "every pair in the selector is present
//! in the candidate label set". Set-based expressions (`In`, `NotIn`,
//! `Exists`) are not supported.

use std::collections::BTreeMap;

/// Label set attached to a workload, namespace, or Service selector
pub type Labels = BTreeMap<String, String>;

/// Something that can decide whether a label set is selected
pub trait LabelMatcher {
    /// True when `labels` carries every key/value pair this matcher requires
    fn selects(&self, labels: &Labels) -> bool;
}

impl LabelMatcher for Labels {
    /// An empty map selects everything; callers that must not treat an empty
    /// selector as a wildcard filter it out before matching.
    fn selects(&self, labels: &Labels) -> bool {
        self.iter().all(|(key, value)| labels.get(key) == Some(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(pairs: &[(&str, &str)]) -> Labels {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn subset_is_selected() {
        let selector = labels(&[("app", "reviews")]);
        assert!(selector.selects(&labels(&[("app", "reviews"), ("version", "v1")])));
    }

    #[test]
    fn differing_value_is_not_selected() {
        let selector = labels(&[("app", "reviews")]);
        assert!(!selector.selects(&labels(&[("app", "ratings")])));
    }

    #[test]
    fn missing_key_is_not_selected() {
        let selector = labels(&[("app", "reviews"), ("version", "v2")]);
        assert!(!selector.selects(&labels(&[("app", "reviews")])));
    }

    #[test]
    fn empty_selector_selects_everything() {
        assert!(Labels::new().selects(&labels(&[("app", "reviews")])));
        assert!(Labels::new().selects(&Labels::new()));
    }
}
