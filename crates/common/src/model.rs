//! Canonical endpoint model
//!
//! Every source format is parsed into these records. They are plain values:
//! built once per parse and never mutated in place afterwards.

use crate::{path_placeholders, HttpMethod, ParameterLocation};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Minimal JSON-schema-like type descriptor
///
/// Kept as the raw JSON value so that passthrough documents, examples and
/// vendor keys survive untouched. Accessors read the handful of keys the
/// pipeline actually interprets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Schema(Value);

impl Default for Schema {
    fn default() -> Self {
        Schema(Value::Object(Map::new()))
    }
}

impl Schema {
    pub fn new(value: Value) -> Self {
        Schema(value)
    }

    /// `{"type": <type_name>}`
    pub fn of_type(type_name: &str) -> Self {
        let mut map = Map::new();
        map.insert("type".to_string(), Value::String(type_name.to_string()));
        Schema(Value::Object(map))
    }

    /// The default schema for loosely described parameters
    pub fn string() -> Self {
        Self::of_type("string")
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    pub fn into_value(self) -> Value {
        self.0
    }

    pub fn is_empty(&self) -> bool {
        match &self.0 {
            Value::Object(map) => map.is_empty(),
            Value::Null => true,
            _ => false,
        }
    }

    pub fn schema_type(&self) -> Option<&str> {
        self.0.get("type").and_then(Value::as_str)
    }

    pub fn format(&self) -> Option<&str> {
        self.0.get("format").and_then(Value::as_str)
    }

    pub fn description(&self) -> Option<&str> {
        self.0.get("description").and_then(Value::as_str)
    }

    pub fn ref_path(&self) -> Option<&str> {
        self.0.get("$ref").and_then(Value::as_str)
    }

    pub fn example(&self) -> Option<&Value> {
        self.0.get("example")
    }

    pub fn is_object(&self) -> bool {
        self.schema_type() == Some("object")
    }

    /// Object properties in declaration order
    pub fn properties(&self) -> Vec<(String, Schema)> {
        self.0
            .get("properties")
            .and_then(Value::as_object)
            .map(|props| {
                props
                    .iter()
                    .map(|(name, schema)| (name.clone(), Schema(schema.clone())))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Names listed in the schema's `required` array
    pub fn required_properties(&self) -> Vec<&str> {
        self.0
            .get("required")
            .and_then(Value::as_array)
            .map(|names| names.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default()
    }
}

/// One input of an endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,

    #[serde(rename = "in")]
    pub location: ParameterLocation,

    #[serde(default)]
    pub required: bool,

    #[serde(default)]
    pub description: String,

    #[serde(default = "Schema::string")]
    pub schema: Schema,
}

impl Parameter {
    /// New string-typed parameter; path parameters start out required
    pub fn new(name: impl Into<String>, location: ParameterLocation) -> Self {
        Self {
            name: name.into(),
            location,
            required: location == ParameterLocation::Path,
            description: String::new(),
            schema: Schema::string(),
        }
    }

    pub fn with_required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_schema(mut self, schema: Schema) -> Self {
        self.schema = schema;
        self
    }
}

fn default_content_type() -> String {
    "application/json".to_string()
}

/// Request payload description
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestBody {
    #[serde(default = "default_content_type")]
    pub content_type: String,

    #[serde(default)]
    pub schema: Schema,

    #[serde(default)]
    pub required: bool,
}

impl RequestBody {
    pub fn json(schema: Schema) -> Self {
        Self {
            content_type: default_content_type(),
            schema,
            required: false,
        }
    }
}

/// One documented response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    pub status_code: String,

    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub content_type: Option<String>,

    #[serde(default)]
    pub schema: Schema,
}

/// Canonical unit of API capability
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Endpoint {
    #[serde(default)]
    pub path: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<HttpMethod>,

    #[serde(rename = "operationId", default, skip_serializing_if = "Option::is_none")]
    pub operation_id: Option<String>,

    #[serde(default)]
    pub summary: String,

    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub parameters: Vec<Parameter>,

    #[serde(rename = "requestBody", default, skip_serializing_if = "Option::is_none")]
    pub request_body: Option<RequestBody>,

    #[serde(default)]
    pub responses: Vec<Response>,
}

impl Endpoint {
    pub fn new(method: HttpMethod, path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            method: Some(method),
            ..Default::default()
        }
    }

    /// `{name}` placeholders of the path template
    pub fn path_placeholders(&self) -> Vec<String> {
        path_placeholders(&self.path)
    }

    /// Names of parameters declared with `in = path`
    pub fn declared_path_parameters(&self) -> Vec<&str> {
        self.parameters
            .iter()
            .filter(|p| p.location == ParameterLocation::Path)
            .map(|p| p.name.as_str())
            .collect()
    }

    /// Uppercase method for display, `UNKNOWN` when missing
    pub fn method_label(&self) -> String {
        self.method
            .map(|m| m.to_string())
            .unwrap_or_else(|| "UNKNOWN".to_string())
    }

    /// Path for display, `<no path>` when missing
    pub fn path_label(&self) -> &str {
        if self.path.is_empty() {
            "<no path>"
        } else {
            &self.path
        }
    }

    /// Summary and description joined by a newline, skipping empty parts
    pub fn full_description(&self) -> String {
        match (self.summary.trim(), self.description.trim()) {
            ("", d) => d.to_string(),
            (s, "") => s.to_string(),
            (s, d) => format!("{}\n{}", s, d),
        }
    }
}

/// Base URL the API is served from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Server {
    pub url: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
}

impl Server {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            description: String::new(),
        }
    }
}

/// Canonical list form of a parsed document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApiDescription {
    pub title: String,

    #[serde(default)]
    pub description: String,

    pub version: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub servers: Vec<Server>,

    #[serde(default)]
    pub endpoints: Vec<Endpoint>,
}

/// Kind of a loosely-typed crawled operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationKind {
    Http,
    Cmd,
}

/// Parameter guess attached to a crawled operation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawParameter {
    pub name: String,

    /// `path`, `argument`, `option`, or absent when only a name was found
    #[serde(rename = "in", default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,

    #[serde(default)]
    pub required: bool,

    #[serde(default)]
    pub description: String,

    #[serde(default = "Schema::string")]
    pub schema: Schema,
}

/// Best-effort operation guess produced by the crawler
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawOperation {
    #[serde(rename = "type")]
    pub kind: OperationKind,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<HttpMethod>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,

    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub parameters: Vec<RawParameter>,
}

impl RawOperation {
    pub fn http(path: Option<String>, method: Option<HttpMethod>) -> Self {
        Self {
            kind: OperationKind::Http,
            path,
            method,
            command: None,
            description: String::new(),
            parameters: Vec::new(),
        }
    }

    pub fn cmd(command: impl Into<String>) -> Self {
        Self {
            kind: OperationKind::Cmd,
            path: None,
            method: None,
            command: Some(command.into()),
            description: String::new(),
            parameters: Vec::new(),
        }
    }

    /// Promote an `http` guess with both a path and a method to an Endpoint
    pub fn to_endpoint(&self) -> Option<Endpoint> {
        if self.kind != OperationKind::Http {
            return None;
        }
        let path = self.path.as_ref()?;
        let method = self.method?;

        let parameters = self
            .parameters
            .iter()
            .map(|raw| {
                let location = raw
                    .location
                    .as_deref()
                    .and_then(ParameterLocation::parse)
                    .unwrap_or(ParameterLocation::Query);
                Parameter {
                    name: raw.name.clone(),
                    location,
                    required: raw.required || location == ParameterLocation::Path,
                    description: raw.description.clone(),
                    schema: raw.schema.clone(),
                }
            })
            .collect();

        Some(Endpoint {
            path: path.clone(),
            method: Some(method),
            summary: self.description.lines().next().unwrap_or_default().to_string(),
            description: self.description.clone(),
            parameters,
            ..Default::default()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_schema_properties_keep_order() {
        let schema = Schema::new(json!({
            "type": "object",
            "properties": {
                "zeta": {"type": "string"},
                "alpha": {"type": "integer"}
            },
            "required": ["alpha"]
        }));

        let names: Vec<String> = schema.properties().into_iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["zeta", "alpha"]);
        assert_eq!(schema.required_properties(), vec!["alpha"]);
        assert!(schema.is_object());
    }

    #[test]
    fn test_endpoint_serializes_method_uppercase() {
        let endpoint = Endpoint::new(HttpMethod::Get, "/pets");
        let value = serde_json::to_value(&endpoint).unwrap();
        assert_eq!(value["method"], "GET");
        assert!(value.get("operationId").is_none());
    }

    #[test]
    fn test_full_description() {
        let mut endpoint = Endpoint::new(HttpMethod::Get, "/pets");
        endpoint.summary = "List pets".to_string();
        assert_eq!(endpoint.full_description(), "List pets");
        endpoint.description = "Paged".to_string();
        assert_eq!(endpoint.full_description(), "List pets\nPaged");
    }

    #[test]
    fn test_raw_operation_promotion() {
        let mut op = RawOperation::http(Some("/users/{id}".to_string()), Some(HttpMethod::Get));
        op.parameters.push(RawParameter {
            name: "id".to_string(),
            location: Some("path".to_string()),
            required: true,
            description: String::new(),
            schema: Schema::string(),
        });

        let endpoint = op.to_endpoint().unwrap();
        assert_eq!(endpoint.declared_path_parameters(), vec!["id"]);

        let without_method = RawOperation::http(Some("/users".to_string()), None);
        assert!(without_method.to_endpoint().is_none());
        assert!(RawOperation::cmd("docker run x").to_endpoint().is_none());
    }
}
