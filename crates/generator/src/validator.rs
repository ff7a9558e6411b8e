//! Endpoint completeness checks

use apidoc_mcp_common::Endpoint;
use serde::Serialize;
use tracing::warn;

/// An endpoint that cannot be generated, with the reason why
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IncompleteEndpoint {
    pub endpoint: Endpoint,
    pub reason: String,
}

impl IncompleteEndpoint {
    /// `METHOD path` as shown in logs, comments and documentation
    pub fn label(&self) -> String {
        format!("{} {}", self.endpoint.method_label(), self.endpoint.path_label())
    }
}

/// Path placeholders with no matching `in = path` parameter, in path order
fn undefined_path_parameters(endpoint: &Endpoint) -> Vec<String> {
    let declared = endpoint.declared_path_parameters();
    endpoint
        .path_placeholders()
        .into_iter()
        .filter(|name| !declared.contains(&name.as_str()))
        .collect()
}

/// Whether the endpoint carries enough information to be generated
///
/// Requires a path, a method, and a path parameter for every `{name}`
/// placeholder of the path.
pub fn is_complete(endpoint: &Endpoint) -> bool {
    !endpoint.path.is_empty()
        && endpoint.method.is_some()
        && undefined_path_parameters(endpoint).is_empty()
}

/// Why `is_complete` rejects the endpoint
///
/// Checked in order: missing path, missing method, undefined path
/// parameters.
pub fn incompleteness_reason(endpoint: &Endpoint) -> String {
    if endpoint.path.is_empty() {
        return "Missing API path".to_string();
    }
    if endpoint.method.is_none() {
        return "Missing HTTP method".to_string();
    }
    let missing = undefined_path_parameters(endpoint);
    if !missing.is_empty() {
        return format!("Undefined path parameters: {}", missing.join(", "));
    }
    "Unknown reason".to_string()
}

/// Split endpoints into generatable ones and segregated incomplete ones
///
/// Both lists keep the input order.
pub fn partition(endpoints: Vec<Endpoint>) -> (Vec<Endpoint>, Vec<IncompleteEndpoint>) {
    let mut complete = Vec::new();
    let mut incomplete = Vec::new();

    for endpoint in endpoints {
        if is_complete(&endpoint) {
            complete.push(endpoint);
        } else {
            let reason = incompleteness_reason(&endpoint);
            let skipped = IncompleteEndpoint { endpoint, reason };
            warn!(endpoint = %skipped.label(), reason = %skipped.reason, "skipping incomplete endpoint");
            incomplete.push(skipped);
        }
    }

    (complete, incomplete)
}
