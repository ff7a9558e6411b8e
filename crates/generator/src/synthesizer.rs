//! Callable synthesis
//!
//! Turns one complete `Endpoint` into a `CallableSpec`: the function name,
//! the flattened parameter list with mapped types, and everything the
//! source template needs to build the request.

use apidoc_mcp_common::{Endpoint, Parameter, ParameterLocation, Schema};
use serde::Serialize;
use serde_json::{json, Map, Value};

const PYTHON_KEYWORDS: &[&str] = &[
    "False", "None", "True", "and", "as", "assert", "async", "await", "break", "class",
    "continue", "def", "del", "elif", "else", "except", "finally", "for", "from", "global", "if",
    "import", "in", "is", "lambda", "nonlocal", "not", "or", "pass", "raise", "return", "try",
    "while", "with", "yield",
];

/// Names the generated function body reads besides its arguments
const GENERATED_NAMES: &[&str] = &[
    "BASE_URL", "httpx", "str", "_url", "_params", "_headers", "_payload", "_data", "_json",
    "_client", "_response",
];

/// How the request payload is sent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BodyKind {
    None,
    Json,
    Form,
}

/// One argument of a synthesized callable
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CallableParameter {
    /// Name on the wire
    pub name: String,
    /// Identifier used in the generated source
    pub ident: String,
    pub location: ParameterLocation,
    pub required: bool,
    pub description: String,
    /// Abstract schema type, `string` when undeclared
    pub schema_type: String,
    pub python_type: String,
    pub json_type: String,
    /// Whole-payload parameter for a body that is not an object schema
    pub whole_body: bool,
}

/// Synthesized function signature and request template for one endpoint
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CallableSpec {
    /// Declared or derived operation id
    pub name: String,
    /// `name` as a valid identifier of the generated source
    pub function_name: String,
    pub description: String,
    /// Uppercase HTTP method
    pub method: String,
    pub path: String,
    /// Path with each `{placeholder}` rewritten to `{ident}`
    pub url_template: String,
    pub parameters: Vec<CallableParameter>,
    pub body_kind: BodyKind,
    pub content_type: Option<String>,
}

impl CallableSpec {
    fn located(&self, location: ParameterLocation) -> impl Iterator<Item = &CallableParameter> {
        self.parameters.iter().filter(move |p| p.location == location)
    }

    pub fn query_parameters(&self) -> Vec<&CallableParameter> {
        self.located(ParameterLocation::Query).collect()
    }

    pub fn header_parameters(&self) -> Vec<&CallableParameter> {
        self.located(ParameterLocation::Header).collect()
    }

    pub fn body_parameters(&self) -> Vec<&CallableParameter> {
        self.located(ParameterLocation::Body).collect()
    }

    /// Entry of the `functions` list in the service description
    ///
    /// Properties are keyed by the generated identifier, the name the tool
    /// is called with.
    pub fn to_function(&self) -> Value {
        let mut properties = Map::new();
        let mut required = Vec::new();
        for param in &self.parameters {
            properties.insert(
                param.ident.clone(),
                json!({"type": param.json_type, "description": param.description}),
            );
            if param.required {
                required.push(Value::String(param.ident.clone()));
            }
        }

        json!({
            "name": self.name,
            "description": self.description,
            "parameters": {
                "type": "object",
                "properties": properties,
                "required": required,
            }
        })
    }
}

/// Build the callable for a complete endpoint
pub fn synthesize(endpoint: &Endpoint) -> CallableSpec {
    let method = endpoint
        .method
        .map(|m| m.as_str())
        .unwrap_or_default();
    let name = endpoint
        .operation_id
        .clone()
        .filter(|id| !id.trim().is_empty())
        .unwrap_or_else(|| derive_operation_id(method, &endpoint.path));

    let mut parameters: Vec<CallableParameter> = Vec::new();
    for param in &endpoint.parameters {
        if param.location != ParameterLocation::Body {
            push_unique(&mut parameters, callable_parameter(param, false));
        }
    }

    let (body_kind, content_type) = match &endpoint.request_body {
        Some(body) => {
            for param in body_parameters(&body.schema, body.required) {
                push_unique(&mut parameters, param);
            }
            let kind = if body.content_type.contains("application/json") {
                BodyKind::Json
            } else {
                BodyKind::Form
            };
            (kind, Some(body.content_type.clone()))
        }
        None => (BodyKind::None, None),
    };

    let url_template = url_template(&endpoint.path, &parameters);

    CallableSpec {
        function_name: python_identifier(&name),
        name,
        description: endpoint.full_description(),
        method: method.to_ascii_uppercase(),
        path: endpoint.path.clone(),
        url_template,
        parameters,
        body_kind,
        content_type,
    }
}

/// `{method}_{path}` with `{`, `}` and `/` replaced by `_`
///
/// Leading and trailing underscores of the path part are dropped, so
/// `("get", "/users/{id}")` gives `get_users__id`.
pub fn derive_operation_id(method: &str, path: &str) -> String {
    let flattened: String = path
        .chars()
        .map(|c| if matches!(c, '{' | '}' | '/') { '_' } else { c })
        .collect();
    format!(
        "{}_{}",
        method.to_ascii_lowercase(),
        flattened.trim_matches('_')
    )
}

/// Target-language type for an abstract schema type
pub fn python_type(schema_type: &str) -> &'static str {
    match schema_type.to_ascii_lowercase().as_str() {
        "integer" => "int",
        "number" => "float",
        "string" => "str",
        "boolean" => "bool",
        "array" => "list",
        "object" => "dict",
        "file" => "str",
        "binary" => "bytes",
        _ => "str",
    }
}

/// JSON Schema type advertised in the service description
pub fn json_schema_type(schema_type: &str) -> &'static str {
    match schema_type.to_ascii_lowercase().as_str() {
        "integer" => "integer",
        "number" => "number",
        "boolean" => "boolean",
        "array" => "array",
        "object" => "object",
        _ => "string",
    }
}

/// Make `name` usable as a Python identifier
pub fn python_identifier(name: &str) -> String {
    let mut ident: String = name
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '_' { c } else { '_' })
        .collect();
    if ident.is_empty() || ident.starts_with(|c: char| c.is_ascii_digit()) {
        ident.insert(0, '_');
    }
    if PYTHON_KEYWORDS.contains(&ident.as_str()) || GENERATED_NAMES.contains(&ident.as_str()) {
        ident.push('_');
    }
    ident
}

fn schema_type(schema: &Schema) -> String {
    schema.schema_type().unwrap_or("string").to_string()
}

fn callable_parameter(param: &Parameter, whole_body: bool) -> CallableParameter {
    let schema_type = schema_type(&param.schema);
    CallableParameter {
        name: param.name.clone(),
        ident: python_identifier(&param.name),
        location: param.location,
        required: param.required || param.location == ParameterLocation::Path,
        description: param.description.clone(),
        python_type: python_type(&schema_type).to_string(),
        json_type: json_schema_type(&schema_type).to_string(),
        schema_type,
        whole_body,
    }
}

/// Object properties as individual body parameters, else one `body` catch-all
///
/// A schema with `properties` but no `type` is treated as an object.
fn body_parameters(schema: &Schema, body_required: bool) -> Vec<CallableParameter> {
    let properties = schema.properties();
    let object_like = schema.is_object() || (schema.schema_type().is_none() && !properties.is_empty());

    if object_like && !properties.is_empty() {
        let required = schema.required_properties();
        return properties
            .into_iter()
            .map(|(name, property)| {
                let param = Parameter {
                    required: required.contains(&name.as_str()),
                    description: property.description().unwrap_or_default().to_string(),
                    name,
                    location: ParameterLocation::Body,
                    schema: property,
                };
                callable_parameter(&param, false)
            })
            .collect();
    }

    let mut catch_all = Parameter::new("body", ParameterLocation::Body)
        .with_required(body_required)
        .with_description("Request body data");
    if !schema.is_empty() {
        catch_all = catch_all.with_schema(schema.clone());
    }
    vec![callable_parameter(&catch_all, true)]
}

/// Append a parameter, renaming its identifier when it collides
fn push_unique(parameters: &mut Vec<CallableParameter>, mut param: CallableParameter) {
    if parameters.iter().any(|p| p.name == param.name && p.location == param.location) {
        return;
    }
    let taken = |ident: &str| parameters.iter().any(|p| p.ident == ident);
    if taken(&param.ident) {
        let base = format!("{}_{}", param.ident, param.location);
        let mut ident = base.clone();
        let mut n = 2;
        while taken(&ident) {
            ident = format!("{}{}", base, n);
            n += 1;
        }
        param.ident = ident;
    }
    parameters.push(param);
}

/// Path rewritten as the body of a Python f-string
fn url_template(path: &str, parameters: &[CallableParameter]) -> String {
    let mut out = String::with_capacity(path.len());
    let mut rest = path;

    while let Some(start) = rest.find('{') {
        out.push_str(&escape_braces(&rest[..start]));
        let after = &rest[start + 1..];
        let Some(end) = after.find('}') else {
            out.push_str(&escape_braces(&rest[start..]));
            return out;
        };
        let name = &after[..end];
        let ident = parameters
            .iter()
            .find(|p| p.location == ParameterLocation::Path && p.name == name)
            .map(|p| p.ident.clone())
            .unwrap_or_else(|| python_identifier(name));
        out.push('{');
        out.push_str(&ident);
        out.push('}');
        rest = &after[end + 1..];
    }
    out.push_str(&escape_braces(rest));
    out
}

fn escape_braces(text: &str) -> String {
    text.replace('{', "{{").replace('}', "}}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use apidoc_mcp_common::{HttpMethod, RequestBody};
    use serde_json::json;

    #[test]
    fn test_derive_operation_id() {
        assert_eq!(derive_operation_id("get", "/users/{id}"), "get_users__id");
        assert_eq!(derive_operation_id("POST", "/users"), "post_users");
        assert_eq!(derive_operation_id("delete", "/"), "delete_");
        assert_eq!(
            derive_operation_id("get", "/users/{id}"),
            derive_operation_id("get", "/users/{id}")
        );
    }

    #[test]
    fn test_type_tables() {
        assert_eq!(python_type("integer"), "int");
        assert_eq!(python_type("NUMBER"), "float");
        assert_eq!(python_type("binary"), "bytes");
        assert_eq!(python_type("uuid"), "str");
        assert_eq!(json_schema_type("file"), "string");
        assert_eq!(json_schema_type("array"), "array");
    }

    #[test]
    fn test_python_identifier() {
        assert_eq!(python_identifier("X-Request-Id"), "X_Request_Id");
        assert_eq!(python_identifier("2fa"), "_2fa");
        assert_eq!(python_identifier("from"), "from_");
        assert_eq!(python_identifier("listPets"), "listPets");
    }

    #[test]
    fn test_generated_names_are_not_shadowed() {
        assert_eq!(python_identifier("url"), "url");
        assert_eq!(python_identifier("_url"), "_url_");
        assert_eq!(python_identifier("-payload"), "_payload_");
        assert_eq!(python_identifier("str"), "str_");
        assert_eq!(python_identifier("BASE_URL"), "BASE_URL_");
        assert_eq!(python_identifier("httpx"), "httpx_");
    }

    #[test]
    fn test_object_body_is_flattened() {
        let mut endpoint = Endpoint::new(HttpMethod::Post, "/users/{id}/tags");
        endpoint
            .parameters
            .push(Parameter::new("id", ParameterLocation::Path));
        endpoint.request_body = Some(RequestBody::json(Schema::new(json!({
            "type": "object",
            "properties": {
                "name": {"type": "string", "description": "Tag name"},
                "weight": {"type": "number"}
            },
            "required": ["name"]
        }))));

        let spec = synthesize(&endpoint);
        assert_eq!(spec.name, "post_users__id__tags");
        assert_eq!(spec.body_kind, BodyKind::Json);
        assert_eq!(spec.url_template, "/users/{id}/tags");

        let body = spec.body_parameters();
        assert_eq!(body.len(), 2);
        assert_eq!(body[0].name, "name");
        assert!(body[0].required);
        assert_eq!(body[0].description, "Tag name");
        assert!(!body[1].required);
        assert_eq!(body[1].python_type, "float");
    }

    #[test]
    fn test_non_object_body_becomes_catch_all() {
        let mut endpoint = Endpoint::new(HttpMethod::Put, "/blobs");
        endpoint.request_body = Some(RequestBody {
            content_type: "application/octet-stream".to_string(),
            schema: Schema::new(json!({"type": "string", "format": "binary"})),
            required: true,
        });

        let spec = synthesize(&endpoint);
        assert_eq!(spec.body_kind, BodyKind::Form);
        let body = spec.body_parameters();
        assert_eq!(body.len(), 1);
        assert_eq!(body[0].name, "body");
        assert!(body[0].whole_body);
        assert!(body[0].required);
    }

    #[test]
    fn test_identifier_collisions_are_renamed() {
        let mut endpoint = Endpoint::new(HttpMethod::Patch, "/items/{id}");
        endpoint
            .parameters
            .push(Parameter::new("id", ParameterLocation::Path));
        endpoint.request_body = Some(RequestBody::json(Schema::new(json!({
            "type": "object",
            "properties": {"id": {"type": "integer"}}
        }))));

        let spec = synthesize(&endpoint);
        let idents: Vec<&str> = spec.parameters.iter().map(|p| p.ident.as_str()).collect();
        assert_eq!(idents, vec!["id", "id_body"]);
        assert_eq!(spec.url_template, "/items/{id}");

        let function = spec.to_function();
        let properties = function["parameters"]["properties"].as_object().unwrap();
        let keys: Vec<&String> = properties.keys().collect();
        assert_eq!(keys, vec!["id", "id_body"]);
        assert_eq!(properties["id"]["type"], "string");
        assert_eq!(properties["id_body"]["type"], "integer");
        assert_eq!(function["parameters"]["required"], json!(["id"]));
    }

    #[test]
    fn test_repeated_collisions_stay_unique() {
        let mut endpoint = Endpoint::new(HttpMethod::Post, "/items/{id}");
        endpoint
            .parameters
            .push(Parameter::new("id", ParameterLocation::Path));
        endpoint
            .parameters
            .push(Parameter::new("id_body", ParameterLocation::Query));
        endpoint.request_body = Some(RequestBody::json(Schema::new(json!({
            "type": "object",
            "properties": {"id": {"type": "integer"}}
        }))));

        let spec = synthesize(&endpoint);
        let idents: Vec<&str> = spec.parameters.iter().map(|p| p.ident.as_str()).collect();
        assert_eq!(idents, vec!["id", "id_body", "id_body2"]);
    }

    #[test]
    fn test_function_entry() {
        let mut endpoint = Endpoint::new(HttpMethod::Get, "/search");
        endpoint.operation_id = Some("search".to_string());
        endpoint.summary = "Search".to_string();
        endpoint.parameters.push(
            Parameter::new("q", ParameterLocation::Query)
                .with_required(true)
                .with_description("Query"),
        );
        endpoint.parameters.push(
            Parameter::new("limit", ParameterLocation::Query)
                .with_schema(Schema::of_type("integer")),
        );

        let function = synthesize(&endpoint).to_function();
        assert_eq!(function["name"], "search");
        assert_eq!(function["parameters"]["properties"]["q"]["type"], "string");
        assert_eq!(function["parameters"]["properties"]["limit"]["type"], "integer");
        assert_eq!(function["parameters"]["required"], json!(["q"]));
    }
}
