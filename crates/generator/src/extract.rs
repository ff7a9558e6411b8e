//! Endpoint extraction from a normalized document
//!
//! Walks `paths[path][method]` and rebuilds canonical `Endpoint` records.
//! Local `$ref`s into `components` are followed so that the synthesizer
//! sees concrete schemas.

use apidoc_mcp_common::{
    Document, Endpoint, HttpMethod, Parameter, ParameterLocation, RequestBody, Response, Schema,
};
use serde_json::{Map, Value};
use tracing::{debug, info};

const MAX_REF_DEPTH: usize = 8;

/// Every `(path, method)` operation of the document, in document order
pub fn extract_endpoints(document: &Document) -> Vec<Endpoint> {
    let Some(paths) = document.paths() else {
        return Vec::new();
    };

    let mut endpoints = Vec::new();
    for (path, item) in paths {
        let Some(item) = item.as_object() else {
            continue;
        };
        let shared = item
            .get("parameters")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or_default();

        for method in HttpMethod::ALL {
            let Some(operation) = item.get(method.as_str()).and_then(Value::as_object) else {
                continue;
            };
            endpoints.push(endpoint(document, path, method, operation, shared));
        }
    }

    info!(endpoints = endpoints.len(), "extracted endpoints from document");
    endpoints
}

fn endpoint(
    document: &Document,
    path: &str,
    method: HttpMethod,
    operation: &Map<String, Value>,
    shared: &[Value],
) -> Endpoint {
    let text = |key: &str| {
        operation
            .get(key)
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string()
    };

    let mut parameters: Vec<Parameter> = Vec::new();
    let declared = operation
        .get("parameters")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default();
    for raw in shared.iter().chain(declared) {
        let Some(param) = parameter(document, raw) else {
            continue;
        };
        // operation-level declarations override path-level ones
        match parameters
            .iter_mut()
            .find(|p| p.name == param.name && p.location == param.location)
        {
            Some(existing) => *existing = param,
            None => parameters.push(param),
        }
    }

    Endpoint {
        path: path.to_string(),
        method: Some(method),
        operation_id: Some(text("operationId")).filter(|id| !id.trim().is_empty()),
        summary: text("summary"),
        description: text("description"),
        parameters,
        request_body: operation
            .get("requestBody")
            .and_then(|body| request_body(document, body)),
        responses: responses(document, operation.get("responses")),
    }
}

fn parameter(document: &Document, raw: &Value) -> Option<Parameter> {
    let raw = follow_ref(document, raw, "#/components/parameters/")?;
    let name = raw.get("name").and_then(Value::as_str)?;
    if name.is_empty() {
        return None;
    }
    let Some(location) = raw
        .get("in")
        .and_then(Value::as_str)
        .and_then(ParameterLocation::parse)
    else {
        debug!(name, "skipping parameter with unsupported location");
        return None;
    };

    let schema = raw
        .get("schema")
        .map(|s| resolve_schema(document, s))
        .unwrap_or_else(Schema::string);

    Some(Parameter {
        name: name.to_string(),
        location,
        required: raw.get("required").and_then(Value::as_bool).unwrap_or(false)
            || location == ParameterLocation::Path,
        description: raw
            .get("description")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        schema,
    })
}

fn request_body(document: &Document, raw: &Value) -> Option<RequestBody> {
    let raw = follow_ref(document, raw, "#/components/requestBodies/")?;
    let (content_type, schema) = first_media(document, raw.get("content"))
        .unwrap_or_else(|| ("application/json".to_string(), Schema::default()));

    Some(RequestBody {
        content_type,
        schema,
        required: raw.get("required").and_then(Value::as_bool).unwrap_or(false),
    })
}

fn responses(document: &Document, raw: Option<&Value>) -> Vec<Response> {
    let Some(raw) = raw.and_then(Value::as_object) else {
        return Vec::new();
    };

    raw.iter()
        .filter_map(|(status, response)| {
            let response = follow_ref(document, response, "#/components/responses/")?;
            let media = first_media(document, response.get("content"));
            Some(Response {
                status_code: status.clone(),
                description: response
                    .get("description")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string(),
                content_type: media.as_ref().map(|(ct, _)| ct.clone()),
                schema: media.map(|(_, schema)| schema).unwrap_or_default(),
            })
        })
        .collect()
}

/// First declared media type and its resolved schema
fn first_media(document: &Document, content: Option<&Value>) -> Option<(String, Schema)> {
    let (content_type, media) = content?.as_object()?.iter().next()?;
    let schema = media
        .get("schema")
        .map(|s| resolve_schema(document, s))
        .unwrap_or_default();
    Some((content_type.clone(), schema))
}

/// Follow a `$ref` under `prefix`; non-reference values are returned as is
fn follow_ref<'a>(document: &'a Document, value: &'a Value, prefix: &str) -> Option<&'a Value> {
    let mut current = value;
    for _ in 0..MAX_REF_DEPTH {
        let Some(reference) = current.get("$ref").and_then(Value::as_str) else {
            return Some(current);
        };
        let name = reference.strip_prefix(prefix)?;
        let section = prefix
            .trim_start_matches("#/components/")
            .trim_end_matches('/');
        current = document.get("components")?.get(section)?.get(name)?;
    }
    debug!("reference chain too deep");
    None
}

/// Schema with its own `$ref` and those of its direct properties resolved
///
/// Unresolvable references are left in place.
fn resolve_schema(document: &Document, schema: &Value) -> Schema {
    let mut resolved = deref_schema(document, schema).clone();

    if let Some(properties) = resolved.get_mut("properties").and_then(Value::as_object_mut) {
        for property in properties.values_mut() {
            if property.get("$ref").is_some() {
                *property = deref_schema(document, property).clone();
            }
        }
    }
    Schema::new(resolved)
}

fn deref_schema<'a>(document: &'a Document, schema: &'a Value) -> &'a Value {
    let mut current = schema;
    for _ in 0..MAX_REF_DEPTH {
        match current
            .get("$ref")
            .and_then(Value::as_str)
            .and_then(|r| document.resolve_schema_ref(r))
        {
            Some(target) => current = target,
            None => break,
        }
    }
    current
}
