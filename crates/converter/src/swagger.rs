//! Swagger 2.0 → OpenAPI 3.0 structural conversion

use apidoc_mcp_common::HttpMethod;
use serde_json::{json, Map, Value};
use tracing::debug;

const JSON: &str = "application/json";
const FORM_URLENCODED: &str = "application/x-www-form-urlencoded";

/// Keys of a Swagger 2 non-body parameter that move under `schema`
const SCHEMA_KEYS: [&str; 8] = [
    "type",
    "format",
    "items",
    "enum",
    "default",
    "minimum",
    "maximum",
    "collectionFormat",
];

/// Convert a Swagger 2.0 document
///
/// `definitions`, `parameters` and `responses` move under `components`, and
/// local `$ref`s are rewritten to match. For each operation:
///
/// - a `body` parameter becomes `requestBody` (`application/json`) and the
///   remaining parameters are written back; the `parameters` key is removed
///   only when the operation declared parameters and none remain
/// - `formData` parameters, when there is no body parameter, become a
///   form-encoded object `requestBody`; next to a body parameter they stay
///   in `parameters`
/// - Swagger-style `type`/`format` on other parameters move under `schema`
/// - response `schema`s move under `content`
///
/// All other operation fields are kept.
pub fn convert(swagger: &Map<String, Value>) -> Map<String, Value> {
    let info = swagger
        .get("info")
        .filter(|info| info.is_object())
        .cloned()
        .unwrap_or_else(|| json!({"title": "API", "version": "1.0.0"}));

    let mut out = Map::new();
    out.insert("openapi".to_string(), json!("3.0.0"));
    out.insert("info".to_string(), info);
    if let Some(servers) = servers(swagger) {
        out.insert("servers".to_string(), servers);
    }

    let produces = string_list(swagger.get("produces"));
    let mut paths = Map::new();
    if let Some(source_paths) = swagger.get("paths").and_then(Value::as_object) {
        for (path, item) in source_paths {
            let Some(item) = item.as_object() else {
                debug!(path, "skipping non-object path item");
                continue;
            };
            paths.insert(path.clone(), Value::Object(convert_path_item(item, &produces)));
        }
    }
    out.insert("paths".to_string(), Value::Object(paths));

    let section = |key: &str| swagger.get(key).cloned().unwrap_or_else(|| json!({}));
    out.insert(
        "components".to_string(),
        json!({
            "schemas": section("definitions"),
            "parameters": section("parameters"),
            "responses": section("responses"),
        }),
    );

    for key in ["tags", "externalDocs", "security"] {
        if let Some(value) = swagger.get(key) {
            out.insert(key.to_string(), value.clone());
        }
    }

    let mut converted = Value::Object(out);
    rewrite_refs(&mut converted);
    match converted {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

/// `scheme://host/basePath` entries built from `schemes`, `host` and `basePath`
fn servers(swagger: &Map<String, Value>) -> Option<Value> {
    let host = swagger.get("host").and_then(Value::as_str)?;
    let base_path = swagger.get("basePath").and_then(Value::as_str).unwrap_or("");
    let mut schemes = string_list(swagger.get("schemes"));
    if schemes.is_empty() {
        schemes.push("https".to_string());
    }
    let servers: Vec<Value> = schemes
        .iter()
        .map(|scheme| json!({"url": format!("{}://{}{}", scheme, host, base_path)}))
        .collect();
    Some(Value::Array(servers))
}

fn string_list(value: Option<&Value>) -> Vec<String> {
    value
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(String::from)
                .collect()
        })
        .unwrap_or_default()
}

fn convert_path_item(item: &Map<String, Value>, produces: &[String]) -> Map<String, Value> {
    let mut out = Map::new();
    for (key, value) in item {
        match (HttpMethod::parse(key), value.as_object()) {
            (Some(_), Some(operation)) => {
                out.insert(
                    key.to_ascii_lowercase(),
                    Value::Object(convert_operation(operation, produces)),
                );
            }
            (Some(_), None) => debug!(method = %key, "skipping non-object operation"),
            (None, _) if key == "parameters" => {
                let params: Vec<Value> = value
                    .as_array()
                    .map(|ps| ps.iter().map(convert_parameter).collect())
                    .unwrap_or_default();
                out.insert(key.clone(), Value::Array(params));
            }
            (None, _) => {
                out.insert(key.clone(), value.clone());
            }
        }
    }
    out
}

fn convert_operation(operation: &Map<String, Value>, produces: &[String]) -> Map<String, Value> {
    let mut out = operation.clone();
    out.remove("consumes");
    out.remove("produces");

    let declared = operation.get("parameters").and_then(Value::as_array);
    let mut parameters = Vec::new();
    let mut form_fields = Vec::new();
    let mut request_body = None;

    for param in declared.into_iter().flatten() {
        match param.get("in").and_then(Value::as_str) {
            Some("body") => {
                let schema = param.get("schema").cloned().unwrap_or_else(|| json!({}));
                let required = param.get("required").and_then(Value::as_bool).unwrap_or(false);
                request_body = Some(json!({
                    "content": {JSON: {"schema": schema}},
                    "required": required,
                }));
            }
            Some("formData") => form_fields.push(param),
            _ => parameters.push(convert_parameter(param)),
        }
    }

    if !form_fields.is_empty() {
        if request_body.is_none() {
            request_body = Some(form_body(&form_fields));
        } else {
            debug!(
                fields = form_fields.len(),
                "operation has a body parameter, keeping formData fields as parameters"
            );
            parameters.extend(form_fields.into_iter().map(convert_parameter));
        }
    }

    if let Some(body) = request_body {
        out.insert("requestBody".to_string(), body);
    }

    if declared.is_some() && parameters.is_empty() {
        out.remove("parameters");
    } else {
        out.insert("parameters".to_string(), Value::Array(parameters));
    }

    if let Some(responses) = operation.get("responses").and_then(Value::as_object) {
        let own_produces = string_list(operation.get("produces"));
        let media_type = own_produces
            .first()
            .or_else(|| produces.first())
            .map(String::as_str)
            .unwrap_or(JSON);
        let converted: Map<String, Value> = responses
            .iter()
            .map(|(code, response)| (code.clone(), convert_response(response, media_type)))
            .collect();
        out.insert("responses".to_string(), Value::Object(converted));
    }

    out
}

/// Move Swagger-style inline type keys of a non-body parameter under `schema`
fn convert_parameter(param: &Value) -> Value {
    let Some(map) = param.as_object() else {
        return param.clone();
    };
    if map.contains_key("schema") || map.contains_key("$ref") {
        return param.clone();
    }

    let mut out = Map::new();
    let mut schema = Map::new();
    for (key, value) in map {
        if SCHEMA_KEYS.contains(&key.as_str()) {
            schema.insert(key.clone(), value.clone());
        } else {
            out.insert(key.clone(), value.clone());
        }
    }
    if !schema.is_empty() {
        out.insert("schema".to_string(), Value::Object(schema));
    }
    Value::Object(out)
}

fn form_body(fields: &[&Value]) -> Value {
    let mut properties = Map::new();
    let mut required = Vec::new();
    let mut has_file = false;

    for field in fields {
        let Some(name) = field.get("name").and_then(Value::as_str) else {
            continue;
        };
        let converted = convert_parameter(field);
        let mut schema = converted.get("schema").cloned().unwrap_or_else(|| json!({"type": "string"}));
        if schema.get("type").and_then(Value::as_str) == Some("file") {
            has_file = true;
            schema = json!({"type": "string", "format": "binary"});
        }
        if let (Some(description), Value::Object(map)) = (field.get("description"), &mut schema) {
            map.insert("description".to_string(), description.clone());
        }
        if field.get("required").and_then(Value::as_bool).unwrap_or(false) {
            required.push(json!(name));
        }
        properties.insert(name.to_string(), schema);
    }

    let media_type = if has_file { "multipart/form-data" } else { FORM_URLENCODED };
    let mut schema = json!({"type": "object", "properties": properties});
    if !required.is_empty() {
        schema["required"] = Value::Array(required.clone());
    }
    json!({
        "content": {media_type: {"schema": schema}},
        "required": !required.is_empty(),
    })
}

fn convert_response(response: &Value, media_type: &str) -> Value {
    let Some(map) = response.as_object() else {
        return response.clone();
    };
    let mut out = map.clone();
    if let Some(schema) = out.remove("schema") {
        out.insert("content".to_string(), json!({media_type: {"schema": schema}}));
    }
    Value::Object(out)
}

/// Point Swagger 2 local references at their `components` counterparts
fn rewrite_refs(value: &mut Value) {
    match value {
        Value::Object(map) => {
            for (key, child) in map.iter_mut() {
                if key == "$ref" {
                    if let Value::String(target) = child {
                        *target = rewrite_ref(target);
                    }
                } else {
                    rewrite_refs(child);
                }
            }
        }
        Value::Array(items) => items.iter_mut().for_each(rewrite_refs),
        _ => {}
    }
}

fn rewrite_ref(target: &str) -> String {
    const MAPPING: [(&str, &str); 3] = [
        ("#/definitions/", "#/components/schemas/"),
        ("#/parameters/", "#/components/parameters/"),
        ("#/responses/", "#/components/responses/"),
    ];
    for (from, to) in MAPPING {
        if let Some(name) = target.strip_prefix(from) {
            return format!("{}{}", to, name);
        }
    }
    target.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn as_map(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected an object"),
        }
    }

    #[test]
    fn test_body_only_operation_drops_parameters() {
        let swagger = as_map(json!({
            "swagger": "2.0",
            "paths": {"/pets": {"post": {
                "parameters": [{"name": "pet", "in": "body", "required": true,
                                "schema": {"$ref": "#/definitions/Pet"}}],
                "responses": {"201": {"description": "created"}}
            }}},
            "definitions": {"Pet": {"type": "object"}}
        }));

        let converted = convert(&swagger);
        let post = &converted["paths"]["/pets"]["post"];
        assert!(post.get("parameters").is_none());
        assert_eq!(
            post["requestBody"]["content"]["application/json"]["schema"]["$ref"],
            "#/components/schemas/Pet"
        );
        assert_eq!(post["requestBody"]["required"], true);
        assert_eq!(converted["components"]["schemas"]["Pet"]["type"], "object");
        assert_eq!(converted["info"]["title"], "API");
    }

    #[test]
    fn test_body_with_other_parameters_keeps_the_rest() {
        let swagger = as_map(json!({
            "swagger": "2.0",
            "info": {"title": "T", "version": "1"},
            "paths": {"/pets/{id}": {"put": {
                "parameters": [
                    {"name": "id", "in": "path", "required": true, "type": "integer", "format": "int64"},
                    {"name": "pet", "in": "body", "schema": {"type": "object"}}
                ]
            }}}
        }));

        let converted = convert(&swagger);
        let put = &converted["paths"]["/pets/{id}"]["put"];
        let params = put["parameters"].as_array().unwrap();
        assert_eq!(params.len(), 1);
        assert_eq!(params[0]["schema"], json!({"type": "integer", "format": "int64"}));
        assert!(params[0].get("type").is_none());
        assert_eq!(put["requestBody"]["required"], false);
    }

    #[test]
    fn test_form_data_next_to_body_stays_in_parameters() {
        let swagger = as_map(json!({
            "swagger": "2.0",
            "info": {"title": "T", "version": "1"},
            "paths": {"/pets": {"post": {
                "parameters": [
                    {"name": "pet", "in": "body", "schema": {"type": "object"}},
                    {"name": "note", "in": "formData", "type": "string"}
                ]
            }}}
        }));

        let converted = convert(&swagger);
        let post = &converted["paths"]["/pets"]["post"];
        let params = post["parameters"].as_array().unwrap();
        assert_eq!(params.len(), 1);
        assert_eq!(params[0]["name"], "note");
        assert_eq!(params[0]["in"], "formData");
        assert_eq!(params[0]["schema"], json!({"type": "string"}));
        assert!(post["requestBody"]["content"].get("application/json").is_some());
    }

    #[test]
    fn test_operation_without_parameters_gets_empty_list() {
        let swagger = as_map(json!({
            "swagger": "2.0",
            "paths": {"/health": {"get": {"responses": {"200": {"description": "ok"}}}}}
        }));
        let converted = convert(&swagger);
        assert_eq!(converted["paths"]["/health"]["get"]["parameters"], json!([]));
    }

    #[test]
    fn test_form_data_and_response_schemas() {
        let swagger = as_map(json!({
            "swagger": "2.0",
            "host": "api.example.com",
            "basePath": "/v2",
            "schemes": ["https"],
            "produces": ["application/xml"],
            "paths": {"/upload": {"post": {
                "parameters": [
                    {"name": "file", "in": "formData", "type": "file", "required": true},
                    {"name": "note", "in": "formData", "type": "string"}
                ],
                "responses": {"200": {"description": "ok", "schema": {"type": "string"}}}
            }}}
        }));

        let converted = convert(&swagger);
        assert_eq!(converted["servers"][0]["url"], "https://api.example.com/v2");

        let post = &converted["paths"]["/upload"]["post"];
        let form = &post["requestBody"]["content"]["multipart/form-data"]["schema"];
        assert_eq!(form["properties"]["file"]["format"], "binary");
        assert_eq!(form["required"], json!(["file"]));
        assert!(post.get("parameters").is_none());
        assert_eq!(
            post["responses"]["200"]["content"]["application/xml"]["schema"]["type"],
            "string"
        );
    }
}
