//! Canonical `{title, version, endpoints}` → OpenAPI 3.0 expansion

use serde_json::{json, Map, Value};
use tracing::debug;

const JSON: &str = "application/json";

/// Expand the canonical endpoint list into `paths[path][method]`
///
/// Endpoints without a path are skipped. Missing methods default to `get`,
/// parameter locations to `query` and parameter schemas to
/// `{type: string}`. Parameters located in `body` are folded into the
/// request body's object schema. Responses keep their declared order; an
/// operation that declares none gets a single `200`. A `servers` list is
/// carried over as is.
pub fn expand(canonical: &Map<String, Value>) -> Map<String, Value> {
    let text = |key: &str, default: &str| {
        canonical
            .get(key)
            .and_then(Value::as_str)
            .unwrap_or(default)
            .to_string()
    };

    let mut paths = Map::new();
    let endpoints = canonical
        .get("endpoints")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default();

    for endpoint in endpoints {
        let Some(path) = endpoint
            .get("path")
            .and_then(Value::as_str)
            .filter(|p| !p.is_empty())
        else {
            debug!("skipping endpoint without a path");
            continue;
        };
        let method = endpoint
            .get("method")
            .and_then(Value::as_str)
            .unwrap_or("get")
            .to_ascii_lowercase();

        let item = paths
            .entry(path.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        if let Value::Object(item) = item {
            item.insert(method, Value::Object(operation(endpoint)));
        }
    }

    let mut out = Map::new();
    out.insert("openapi".to_string(), json!("3.0.0"));
    out.insert(
        "info".to_string(),
        json!({
            "title": text("title", "API"),
            "version": text("version", "1.0.0"),
            "description": text("description", ""),
        }),
    );
    if let Some(servers) = servers(canonical.get("servers")) {
        out.insert("servers".to_string(), servers);
    }
    out.insert("paths".to_string(), Value::Object(paths));
    out
}

fn servers(declared: Option<&Value>) -> Option<Value> {
    let servers: Vec<Value> = declared
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter(|s| s.get("url").and_then(Value::as_str).is_some())
        .cloned()
        .collect();
    (!servers.is_empty()).then_some(Value::Array(servers))
}

fn operation(endpoint: &Value) -> Map<String, Value> {
    let field = |key: &str| {
        endpoint
            .get(key)
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string()
    };

    let mut op = Map::new();
    op.insert("summary".to_string(), Value::String(field("summary")));
    op.insert("description".to_string(), Value::String(field("description")));
    let operation_id = field("operationId");
    if !operation_id.is_empty() {
        op.insert("operationId".to_string(), Value::String(operation_id));
    }

    let mut parameters = Vec::new();
    let mut body_properties = Map::new();
    let mut body_required = Vec::new();

    for param in endpoint
        .get("parameters")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
    {
        let name = param.get("name").and_then(Value::as_str).unwrap_or_default();
        let location = param.get("in").and_then(Value::as_str).unwrap_or("query");
        let required = param.get("required").and_then(Value::as_bool).unwrap_or(false);
        let description = param.get("description").and_then(Value::as_str).unwrap_or_default();
        let schema = param
            .get("schema")
            .cloned()
            .unwrap_or_else(|| json!({"type": "string"}));

        if location == "body" || location == "formData" {
            let mut property = schema;
            if let (false, Value::Object(map)) = (description.is_empty(), &mut property) {
                map.entry("description".to_string())
                    .or_insert_with(|| Value::String(description.to_string()));
            }
            if required {
                body_required.push(Value::String(name.to_string()));
            }
            body_properties.insert(name.to_string(), property);
            continue;
        }

        parameters.push(json!({
            "name": name,
            "in": location,
            "description": description,
            "required": required,
            "schema": schema,
        }));
    }
    op.insert("parameters".to_string(), Value::Array(parameters));

    if let Some(body) = request_body(endpoint.get("requestBody"), body_properties, body_required) {
        op.insert("requestBody".to_string(), body);
    }

    let mut responses = Map::new();
    for response in endpoint
        .get("responses")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
    {
        let status = match response.get("status_code") {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Number(n)) => n.to_string(),
            _ => "200".to_string(),
        };
        let mut content = Map::new();
        let content_type = response.get("content_type").and_then(Value::as_str);
        let schema = response.get("schema").filter(|s| !is_empty_schema(s));
        if let (Some(content_type), Some(schema)) = (content_type, schema) {
            content.insert(content_type.to_string(), json!({"schema": schema}));
        }
        responses.insert(
            status,
            json!({
                "description": response.get("description").and_then(Value::as_str).unwrap_or_default(),
                "content": content,
            }),
        );
    }
    if responses.is_empty() {
        responses.insert(
            "200".to_string(),
            json!({"description": "Successful operation", "content": {}}),
        );
    }
    op.insert("responses".to_string(), Value::Object(responses));

    op
}

fn is_empty_schema(schema: &Value) -> bool {
    match schema {
        Value::Null => true,
        Value::Object(map) => map.is_empty(),
        _ => false,
    }
}

/// Declared request body merged with properties hoisted from body parameters
fn request_body(
    declared: Option<&Value>,
    hoisted: Map<String, Value>,
    hoisted_required: Vec<Value>,
) -> Option<Value> {
    let declared = declared.filter(|b| b.is_object());
    if declared.is_none() && hoisted.is_empty() {
        return None;
    }

    let content_type = declared
        .and_then(|b| b.get("content_type"))
        .and_then(Value::as_str)
        .unwrap_or(JSON)
        .to_string();
    let mut required = declared
        .and_then(|b| b.get("required"))
        .and_then(Value::as_bool)
        .unwrap_or(false);
    let mut schema = declared
        .and_then(|b| b.get("schema"))
        .cloned()
        .unwrap_or_else(|| json!({}));

    if !hoisted.is_empty() {
        if is_empty_schema(&schema) {
            schema = json!({"type": "object"});
        }
        let is_object = schema.get("type").and_then(Value::as_str) == Some("object");
        match (&mut schema, is_object) {
            (Value::Object(map), true) => {
                let properties = map
                    .entry("properties".to_string())
                    .or_insert_with(|| Value::Object(Map::new()));
                if let Value::Object(properties) = properties {
                    for (name, property) in hoisted {
                        properties.entry(name).or_insert(property);
                    }
                }
                if !hoisted_required.is_empty() {
                    let names = map
                        .entry("required".to_string())
                        .or_insert_with(|| Value::Array(Vec::new()));
                    if let Value::Array(names) = names {
                        for name in hoisted_required {
                            if !names.contains(&name) {
                                names.push(name);
                            }
                        }
                    }
                    required = true;
                }
            }
            _ => debug!("request body schema is not an object, body parameters dropped"),
        }
    }

    Some(json!({
        "content": {content_type: {"schema": schema}},
        "required": required,
    }))
}
