//! Port protocol classification and naming rules
//!
//! Istio routes a port as HTTP, TLS or opaque TCP depending on its declared
//! protocol. For Kubernetes Services the protocol comes from `appProtocol`
//! or, failing that, from a `<protocol>[-<suffix>]` port name.

use std::fmt;

use meshview_common::ServicePort;
use serde::Serialize;

/// Protocol tokens Istio recognises in port names and `appProtocol`.
///
/// UDP is not proxied but is accepted so that UDP ports are not flagged.
pub const PORT_PROTOCOLS: [&str; 11] = [
    "grpc", "grpc-web", "http", "http2", "https", "mongo", "redis", "tcp", "tls", "udp", "mysql",
];

/// Routing class of a port
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PortProtocol {
    /// HTTP, HTTP2 and gRPC
    Http,
    /// HTTPS and TLS passthrough
    Tls,
    /// Everything else
    Tcp,
}

impl PortProtocol {
    /// Lower-case class name, as used by VirtualService route types
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Http => "http",
            Self::Tls => "tls",
            Self::Tcp => "tcp",
        }
    }
}

impl fmt::Display for PortProtocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classify an Istio port protocol (`HTTP`, `GRPC`, `TLS`, ...).
///
/// Matching is on the upper-case names Istio writes; unknown values are TCP.
pub fn classify_protocol(proto: &str) -> PortProtocol {
    match proto {
        "HTTP" | "HTTP2" | "GRPC" => PortProtocol::Http,
        "HTTPS" | "TLS" => PortProtocol::Tls,
        _ => PortProtocol::Tcp,
    }
}

/// Check that `port_name` follows `<protocol>[-<suffix>]` for `protocol`.
///
/// TCP and UDP ports may be named anything.
pub fn matches_naming_convention(port_name: &str, protocol: &str) -> bool {
    let protocol = protocol.to_lowercase();
    if protocol == "tcp" || protocol == "udp" {
        return true;
    }

    match port_name.strip_prefix(protocol.as_str()) {
        Some(rest) => is_valid_suffix(rest),
        None => false,
    }
}

/// Check that `port_name` is a recognised protocol, optionally suffixed
/// with `-<suffix>`.
pub fn matches_valid_protocol_name(port_name: &str) -> bool {
    PORT_PROTOCOLS.iter().any(|protocol| {
        port_name == *protocol
            || port_name
                .strip_prefix(protocol)
                .is_some_and(|rest| !rest.is_empty() && is_valid_suffix(rest))
    })
}

/// Check that `appProtocol` is a recognised protocol; absent or empty is not.
pub fn is_valid_app_protocol(app_protocol: Option<&str>) -> bool {
    match app_protocol {
        Some(proto) if !proto.is_empty() => PORT_PROTOCOLS
            .iter()
            .any(|known| proto.eq_ignore_ascii_case(known)),
        _ => false,
    }
}

/// A Service port is valid when either its `appProtocol` or its name
/// identifies a protocol.
pub fn validate_service_port(port: &ServicePort) -> bool {
    is_valid_app_protocol(port.app_protocol.as_deref()) || matches_valid_protocol_name(&port.name)
}

/// Protocol Istio selects for a Service port: `appProtocol` first, then the
/// port name prefix. `None` when neither identifies one.
pub fn service_port_protocol(port: &ServicePort) -> Option<String> {
    if let Some(app) = port
        .app_protocol
        .as_deref()
        .filter(|app| is_valid_app_protocol(Some(*app)))
    {
        return Some(app.to_uppercase());
    }

    PORT_PROTOCOLS
        .iter()
        .filter(|protocol| {
            port.name == **protocol
                || port
                    .name
                    .strip_prefix(**protocol)
                    .is_some_and(|rest| !rest.is_empty() && is_valid_suffix(rest))
        })
        // "grpc-web" and "grpc" both prefix "grpc-web-api"; take the longest
        .max_by_key(|protocol| protocol.len())
        .map(|protocol| protocol.to_uppercase())
}

/// Routing class of a Service port, TCP when the protocol is unidentified
pub fn classify_service_port(port: &ServicePort) -> PortProtocol {
    service_port_protocol(port)
        .map(|proto| classify_protocol(&proto))
        .unwrap_or(PortProtocol::Tcp)
}

// Remainder after the protocol token: empty, or a dash plus a non-empty suffix
fn is_valid_suffix(rest: &str) -> bool {
    rest.is_empty() || rest.strip_prefix('-').is_some_and(|suffix| !suffix.is_empty())
}
