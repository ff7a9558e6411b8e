//! OpenAPI / Swagger type definitions
//!
//! Lenient representation shared by the OpenAPI 3.x and Swagger 2.0
//! parsers. Everything is optional or defaulted; maps whose order matters
//! (paths, responses, content types) stay as ordered JSON maps.

use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};

/// Maximum depth when inlining `$ref` schemas
const MAX_REF_DEPTH: usize = 8;

/// Document root (both spec generations)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SpecRoot {
    /// OpenAPI version (e.g., "3.0.0")
    #[serde(default, deserialize_with = "lenient_string")]
    pub openapi: Option<String>,

    /// Swagger version ("2.0")
    #[serde(default, deserialize_with = "lenient_string")]
    pub swagger: Option<String>,

    /// API metadata
    #[serde(default)]
    pub info: Info,

    /// Server list (OpenAPI 3)
    #[serde(default)]
    pub servers: Vec<Value>,

    /// Host, optionally with port (Swagger 2)
    #[serde(default, deserialize_with = "lenient_string")]
    pub host: Option<String>,

    #[serde(rename = "basePath", default, deserialize_with = "lenient_string")]
    pub base_path: Option<String>,

    /// Transfer protocols (Swagger 2)
    #[serde(default)]
    pub schemes: Vec<String>,

    /// API paths (endpoints), in document order
    #[serde(default)]
    pub paths: Map<String, Value>,

    /// Reusable components (OpenAPI 3)
    #[serde(default)]
    pub components: Components,

    /// Schema definitions (Swagger 2)
    #[serde(default)]
    pub definitions: Map<String, Value>,

    /// Shared parameters (Swagger 2)
    #[serde(default)]
    pub parameters: Map<String, Value>,

    /// Shared responses (Swagger 2)
    #[serde(default)]
    pub responses: Map<String, Value>,

    /// Default request MIME types (Swagger 2)
    #[serde(default)]
    pub consumes: Vec<String>,

    /// Default response MIME types (Swagger 2)
    #[serde(default)]
    pub produces: Vec<String>,
}

/// API information
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Info {
    #[serde(default, deserialize_with = "lenient_string")]
    pub title: Option<String>,

    /// YAML documents often carry `version: 1.0` as a number
    #[serde(default, deserialize_with = "lenient_string")]
    pub version: Option<String>,

    #[serde(default, deserialize_with = "lenient_string")]
    pub description: Option<String>,
}

/// Reusable components
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Components {
    #[serde(default)]
    pub schemas: Map<String, Value>,

    #[serde(default)]
    pub parameters: Map<String, Value>,

    #[serde(rename = "requestBodies", default)]
    pub request_bodies: Map<String, Value>,

    #[serde(default)]
    pub responses: Map<String, Value>,
}

/// HTTP operation
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Operation {
    #[serde(rename = "operationId", default, deserialize_with = "lenient_string")]
    pub operation_id: Option<String>,

    #[serde(default, deserialize_with = "lenient_string")]
    pub summary: Option<String>,

    #[serde(default, deserialize_with = "lenient_string")]
    pub description: Option<String>,

    /// Parameters or `$ref`s to shared parameters
    #[serde(default)]
    pub parameters: Vec<Value>,

    #[serde(rename = "requestBody", default)]
    pub request_body: Option<Value>,

    /// Status code → response, in document order
    #[serde(default)]
    pub responses: Map<String, Value>,

    /// Request MIME types (Swagger 2)
    #[serde(default)]
    pub consumes: Vec<String>,

    /// Response MIME types (Swagger 2)
    #[serde(default)]
    pub produces: Vec<String>,
}

/// Parameter definition (OpenAPI 3 `schema` or Swagger 2 inline type)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Parameter {
    #[serde(default)]
    pub name: String,

    /// Location: query, header, path, cookie, body, formData
    #[serde(rename = "in", default)]
    pub location: String,

    #[serde(default, deserialize_with = "lenient_string")]
    pub description: Option<String>,

    #[serde(default)]
    pub required: bool,

    #[serde(default)]
    pub schema: Option<Value>,

    #[serde(rename = "type", default)]
    pub param_type: Option<String>,

    #[serde(default)]
    pub format: Option<String>,

    #[serde(rename = "enum", default)]
    pub enum_values: Option<Vec<Value>>,

    #[serde(default)]
    pub items: Option<Value>,
}

impl Parameter {
    /// Swagger 2 style `{type, format, enum, items}` schema for non-body parameters
    pub fn inline_schema(&self) -> Value {
        let mut schema = Map::new();
        schema.insert(
            "type".to_string(),
            Value::String(self.param_type.clone().unwrap_or_else(|| "string".to_string())),
        );
        if let Some(ref format) = self.format {
            schema.insert("format".to_string(), Value::String(format.clone()));
        }
        if let Some(ref values) = self.enum_values {
            schema.insert("enum".to_string(), Value::Array(values.clone()));
        }
        if let Some(ref items) = self.items {
            schema.insert("items".to_string(), items.clone());
        }
        Value::Object(schema)
    }
}

/// Response (OpenAPI 3 `content` or Swagger 2 `schema`)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Response {
    #[serde(default, deserialize_with = "lenient_string")]
    pub description: Option<String>,

    #[serde(default)]
    pub content: Map<String, Value>,

    #[serde(default)]
    pub schema: Option<Value>,
}

/// Request body (OpenAPI 3)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RequestBody {
    #[serde(default)]
    pub content: Map<String, Value>,

    #[serde(default)]
    pub required: bool,
}

/// Accept strings, numbers and booleans where a string is expected
fn lenient_string<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        Some(Value::Bool(b)) => Some(b.to_string()),
        _ => None,
    })
}

/// Deserialize a JSON value into `T`, falling back to `T::default()`
pub fn lenient<T>(value: &Value) -> T
where
    T: for<'de> Deserialize<'de> + Default,
{
    serde_json::from_value(value.clone()).unwrap_or_default()
}

/// Schema of the first entry of a `content` map: `(media type, schema)`
pub fn first_media_type(content: &Map<String, Value>) -> Option<(String, Value)> {
    content.iter().next().map(|(media_type, media)| {
        let schema = media.get("schema").cloned().unwrap_or_else(|| Value::Object(Map::new()));
        (media_type.clone(), schema)
    })
}

impl SpecRoot {
    /// Look up a local `$ref` anywhere under `#/components/...` or the
    /// Swagger 2 top-level sections
    pub fn resolve_ref(&self, ref_path: &str) -> Option<&Value> {
        let rest = ref_path.strip_prefix("#/")?;
        let (section, name) = rest.rsplit_once('/')?;
        match section {
            "components/schemas" => self.components.schemas.get(name),
            "components/parameters" => self.components.parameters.get(name),
            "components/requestBodies" => self.components.request_bodies.get(name),
            "components/responses" => self.components.responses.get(name),
            "definitions" => self.definitions.get(name),
            "parameters" => self.parameters.get(name),
            "responses" => self.responses.get(name),
            _ => None,
        }
    }

    /// Follow a `$ref` object (one level); other values are returned as-is
    pub fn deref<'a>(&'a self, value: &'a Value) -> &'a Value {
        value
            .get("$ref")
            .and_then(Value::as_str)
            .and_then(|r| self.resolve_ref(r))
            .unwrap_or(value)
    }

    /// Inline schema `$ref`s so endpoints stand on their own
    ///
    /// Stops at `MAX_REF_DEPTH`; references that cannot be resolved, or
    /// that would recurse deeper, are left in place.
    pub fn inline_schema(&self, schema: &Value) -> Value {
        self.inline_at(schema, 0)
    }

    fn inline_at(&self, schema: &Value, depth: usize) -> Value {
        match schema {
            Value::Object(map) => {
                if let Some(ref_path) = map.get("$ref").and_then(Value::as_str) {
                    if depth < MAX_REF_DEPTH {
                        if let Some(target) = self.resolve_ref(ref_path) {
                            return self.inline_at(target, depth + 1);
                        }
                    }
                    return schema.clone();
                }
                let mut out = Map::new();
                for (key, value) in map {
                    out.insert(key.clone(), self.inline_at(value, depth));
                }
                Value::Object(out)
            }
            Value::Array(items) => {
                Value::Array(items.iter().map(|v| self.inline_at(v, depth)).collect())
            }
            other => other.clone(),
        }
    }
}
