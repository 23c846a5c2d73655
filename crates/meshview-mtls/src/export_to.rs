//! exportTo visibility evaluation
//!
//! An exportTo list restricts which namespaces may reference a resource.
//! An empty list means the resource is visible everywhere.

use meshview_common::mesh::{EXPORT_TO_ALL, EXPORT_TO_NONE, EXPORT_TO_SAME_NAMESPACE};

/// Check whether a resource in `resource_namespace` with the given exportTo
/// list is visible from `viewer_namespace`.
///
/// Tokens are scanned in order and the first match wins: `*` matches
/// everyone, `.` matches the resource's own namespace, `~` never matches,
/// and anything else is compared literally against the viewer namespace.
pub fn is_exported_to<S: AsRef<str>>(
    export_to: &[S],
    resource_namespace: &str,
    viewer_namespace: &str,
) -> bool {
    if export_to.is_empty() {
        return true;
    }

    export_to.iter().any(|token| match token.as_ref() {
        EXPORT_TO_ALL => true,
        EXPORT_TO_SAME_NAMESPACE => resource_namespace == viewer_namespace,
        EXPORT_TO_NONE => false,
        namespace => namespace == viewer_namespace,
    })
}

/// Split a `networking.istio.io/exportTo` annotation value.
///
/// Segments are trimmed and empty ones dropped, so a blank annotation yields
/// an empty list (visible everywhere).
pub fn parse_export_to_annotation(annotation: &str) -> Vec<String> {
    annotation
        .split(',')
        .map(str::trim)
        .filter(|segment| !segment.is_empty())
        .map(String::from)
        .collect()
}
