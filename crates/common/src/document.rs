//! Normalized top-level API document
//!
//! A `Document` is an OpenAPI-shaped JSON object. It is the output of the
//! normalizer, the unit stored in the cache, and the input of the generator.

use crate::{HttpMethod, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Key marking a document whose content could not be interpreted
pub const TODO_KEY: &str = "todo";

/// Key under which a TODO-wrapped document keeps the untouched input
pub const ORIGINAL_DATA_KEY: &str = "original_data";

/// OpenAPI-shaped document, held as an ordered JSON object
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Document(Map<String, Value>);

impl Document {
    pub fn from_map(map: Map<String, Value>) -> Self {
        Document(map)
    }

    /// Wrap a JSON value; non-object values are rejected
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(map) => Some(Document(map)),
            _ => None,
        }
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Pretty-printed JSON, as written to the cache
    pub fn to_pretty_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.0)?)
    }

    pub fn openapi_version(&self) -> Option<&str> {
        self.0.get("openapi").and_then(Value::as_str)
    }

    fn info_str(&self, key: &str) -> Option<&str> {
        self.0
            .get("info")
            .and_then(|info| info.get(key))
            .and_then(Value::as_str)
            .or_else(|| self.0.get(key).and_then(Value::as_str))
    }

    /// `info.title`, falling back to a top-level `title`
    pub fn title(&self) -> Option<&str> {
        self.info_str("title").filter(|t| !t.trim().is_empty())
    }

    pub fn version(&self) -> Option<&str> {
        self.info_str("version")
    }

    pub fn description(&self) -> Option<&str> {
        self.info_str("description").filter(|d| !d.trim().is_empty())
    }

    pub fn paths(&self) -> Option<&Map<String, Value>> {
        self.0.get("paths").and_then(Value::as_object)
    }

    /// `(url, description)` for each declared server
    pub fn servers(&self) -> Vec<(String, String)> {
        self.0
            .get("servers")
            .and_then(Value::as_array)
            .map(|servers| {
                servers
                    .iter()
                    .filter_map(|s| {
                        let url = s.get("url").and_then(Value::as_str)?;
                        let description = s
                            .get("description")
                            .and_then(Value::as_str)
                            .unwrap_or_default();
                        Some((url.to_string(), description.to_string()))
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    /// True when the input was deferred for manual or LLM-assisted handling
    pub fn is_todo(&self) -> bool {
        self.0.get(TODO_KEY).and_then(Value::as_bool).unwrap_or(false)
    }

    /// The untouched input of a TODO-wrapped document
    pub fn original_data(&self) -> Option<&Value> {
        self.0.get(ORIGINAL_DATA_KEY)
    }

    /// Structural check deciding whether the document may be cached
    ///
    /// Requires `openapi` starting with `3.`, `info.title`, `info.version`
    /// and a `paths` mapping. Nothing deeper is validated.
    pub fn is_valid_openapi(&self) -> bool {
        let version_ok = self
            .openapi_version()
            .map(|v| v.starts_with("3."))
            .unwrap_or(false);
        let info_ok = self
            .0
            .get("info")
            .and_then(Value::as_object)
            .map(|info| info.contains_key("title") && info.contains_key("version"))
            .unwrap_or(false);
        let paths_ok = self.0.get("paths").map(Value::is_object).unwrap_or(false);

        version_ok && info_ok && paths_ok
    }

    /// Number of method entries across all paths
    pub fn operation_count(&self) -> usize {
        self.paths()
            .map(|paths| {
                paths
                    .values()
                    .filter_map(Value::as_object)
                    .map(|item| {
                        HttpMethod::ALL
                            .iter()
                            .filter(|m| item.contains_key(m.as_str()))
                            .count()
                    })
                    .sum()
            })
            .unwrap_or(0)
    }

    /// Copy of this document with `info.title` replaced by `name`
    ///
    /// A previous title is kept under `info.x-original-title`.
    pub fn with_service_name(&self, name: &str) -> Document {
        let mut map = self.0.clone();
        let info = map
            .entry("info".to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        if !info.is_object() {
            *info = Value::Object(Map::new());
        }
        if let Value::Object(info) = info {
            if let Some(previous) = info.get("title").cloned() {
                info.insert("x-original-title".to_string(), previous);
            }
            info.insert("title".to_string(), Value::String(name.to_string()));
        }
        Document(map)
    }

    /// Resolve a local schema reference
    ///
    /// Supports `#/components/schemas/<Name>` and Swagger-style
    /// `#/definitions/<Name>`.
    pub fn resolve_schema_ref(&self, ref_path: &str) -> Option<&Value> {
        if let Some(name) = ref_path.strip_prefix("#/components/schemas/") {
            return self
                .0
                .get("components")
                .and_then(|c| c.get("schemas"))
                .and_then(|s| s.get(name));
        }
        if let Some(name) = ref_path.strip_prefix("#/definitions/") {
            return self.0.get("definitions").and_then(|d| d.get(name));
        }
        None
    }
}
