//! Path × method walk shared by the OpenAPI 3 and Swagger 2 parsers

use super::types::{first_media_type, lenient, Operation, Parameter as SpecParameter};
use super::types::{RequestBody as SpecRequestBody, Response as SpecResponse, SpecRoot};
use apidoc_mcp_common::{
    Endpoint, HttpMethod, Parameter, ParameterLocation, RequestBody, Response, Schema,
};
use serde_json::{Map, Value};
use tracing::debug;

const FORM_URLENCODED: &str = "application/x-www-form-urlencoded";
const MULTIPART: &str = "multipart/form-data";
const JSON: &str = "application/json";

/// Which generation of the specification a document follows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    OpenApi3,
    Swagger2,
}

/// Build one Endpoint per path × HTTP method, in document order
pub fn collect_endpoints(spec: &SpecRoot, dialect: Dialect) -> Vec<Endpoint> {
    let mut endpoints = Vec::new();

    for (path, item) in &spec.paths {
        let Some(item) = item.as_object() else {
            debug!(path, "skipping non-object path item");
            continue;
        };
        let shared_params = item
            .get("parameters")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();

        for (key, op_value) in item {
            let Some(method) = HttpMethod::parse(key) else {
                continue;
            };
            let operation: Operation = lenient(op_value);
            let endpoint = match dialect {
                Dialect::OpenApi3 => build_openapi3(spec, path, method, &operation, &shared_params),
                Dialect::Swagger2 => build_swagger2(spec, path, method, &operation, &shared_params),
            };
            endpoints.push(endpoint);
        }
    }

    endpoints
}

fn base_endpoint(path: &str, method: HttpMethod, operation: &Operation) -> Endpoint {
    Endpoint {
        path: path.to_string(),
        method: Some(method),
        operation_id: operation.operation_id.clone().filter(|id| !id.trim().is_empty()),
        summary: operation.summary.clone().unwrap_or_default(),
        description: operation.description.clone().unwrap_or_default(),
        ..Default::default()
    }
}

/// Path-level parameters overridden by operation-level ones with the same `(name, in)`
fn merged_parameters(spec: &SpecRoot, shared: &[Value], own: &[Value]) -> Vec<SpecParameter> {
    let mut merged: Vec<SpecParameter> = Vec::new();
    for value in shared.iter().chain(own.iter()) {
        let param: SpecParameter = lenient(spec.deref(value));
        if param.name.is_empty() {
            continue;
        }
        if let Some(existing) = merged
            .iter_mut()
            .find(|p| p.name == param.name && p.location == param.location)
        {
            *existing = param;
        } else {
            merged.push(param);
        }
    }
    merged
}

/// Convert a non-body parameter; unsupported locations such as `cookie` are dropped
fn convert_parameter(spec: &SpecRoot, param: &SpecParameter) -> Option<Parameter> {
    let location = match ParameterLocation::parse(&param.location) {
        Some(ParameterLocation::Body) | None => {
            debug!(name = %param.name, location = %param.location, "skipping parameter");
            return None;
        }
        Some(location) => location,
    };

    let schema = match param.schema {
        Some(ref schema) => spec.inline_schema(schema),
        None => param.inline_schema(),
    };

    Some(Parameter {
        name: param.name.clone(),
        location,
        required: param.required || location == ParameterLocation::Path,
        description: param.description.clone().unwrap_or_default(),
        schema: Schema::new(schema),
    })
}

fn build_openapi3(
    spec: &SpecRoot,
    path: &str,
    method: HttpMethod,
    operation: &Operation,
    shared: &[Value],
) -> Endpoint {
    let mut endpoint = base_endpoint(path, method, operation);

    endpoint.parameters = merged_parameters(spec, shared, &operation.parameters)
        .iter()
        .filter_map(|p| convert_parameter(spec, p))
        .collect();

    if let Some(ref body) = operation.request_body {
        let body: SpecRequestBody = lenient(spec.deref(body));
        let (content_type, schema) = first_media_type(&body.content)
            .unwrap_or_else(|| (JSON.to_string(), Value::Object(Map::new())));
        endpoint.request_body = Some(RequestBody {
            content_type,
            schema: Schema::new(spec.inline_schema(&schema)),
            required: body.required,
        });
    }

    for (status_code, value) in &operation.responses {
        let response: SpecResponse = lenient(spec.deref(value));
        let (content_type, schema) = match first_media_type(&response.content) {
            Some((media_type, schema)) => (Some(media_type), spec.inline_schema(&schema)),
            None => (None, Value::Object(Map::new())),
        };
        endpoint.responses.push(Response {
            status_code: status_code.clone(),
            description: response.description.unwrap_or_default(),
            content_type,
            schema: Schema::new(schema),
        });
    }

    endpoint
}

fn build_swagger2(
    spec: &SpecRoot,
    path: &str,
    method: HttpMethod,
    operation: &Operation,
    shared: &[Value],
) -> Endpoint {
    let mut endpoint = base_endpoint(path, method, operation);

    let consumes = if operation.consumes.is_empty() {
        &spec.consumes
    } else {
        &operation.consumes
    };
    let produces = if operation.produces.is_empty() {
        &spec.produces
    } else {
        &operation.produces
    };

    let mut form_properties = Map::new();
    let mut form_required = Vec::new();
    let mut has_file = false;

    for param in merged_parameters(spec, shared, &operation.parameters) {
        match param.location.as_str() {
            "body" => {
                let schema = param
                    .schema
                    .as_ref()
                    .map(|s| spec.inline_schema(s))
                    .unwrap_or_else(|| Value::Object(Map::new()));
                endpoint.request_body = Some(RequestBody {
                    content_type: consumes.first().cloned().unwrap_or_else(|| JSON.to_string()),
                    schema: Schema::new(schema),
                    required: param.required,
                });
            }
            "formData" => {
                has_file |= param.param_type.as_deref() == Some("file");
                let mut schema = param.inline_schema();
                if let (Some(description), Value::Object(map)) = (&param.description, &mut schema) {
                    map.insert("description".to_string(), Value::String(description.clone()));
                }
                if param.required {
                    form_required.push(Value::String(param.name.clone()));
                }
                form_properties.insert(param.name.clone(), schema);
            }
            _ => {
                if let Some(converted) = convert_parameter(spec, &param) {
                    endpoint.parameters.push(converted);
                }
            }
        }
    }

    if endpoint.request_body.is_none() && !form_properties.is_empty() {
        let content_type = if has_file || consumes.iter().any(|c| c == MULTIPART) {
            MULTIPART
        } else {
            FORM_URLENCODED
        };
        let required = !form_required.is_empty();
        let mut schema = Map::new();
        schema.insert("type".to_string(), Value::String("object".to_string()));
        schema.insert("properties".to_string(), Value::Object(form_properties));
        if required {
            schema.insert("required".to_string(), Value::Array(form_required));
        }
        endpoint.request_body = Some(RequestBody {
            content_type: content_type.to_string(),
            schema: Schema::new(Value::Object(schema)),
            required,
        });
    }

    for (status_code, value) in &operation.responses {
        let response: SpecResponse = lenient(spec.deref(value));
        let (content_type, schema) = match response.schema {
            Some(ref schema) => (
                Some(produces.first().cloned().unwrap_or_else(|| JSON.to_string())),
                spec.inline_schema(schema),
            ),
            None => (None, Value::Object(Map::new())),
        };
        endpoint.responses.push(Response {
            status_code: status_code.clone(),
            description: response.description.unwrap_or_default(),
            content_type,
            schema: Schema::new(schema),
        });
    }

    endpoint
}
