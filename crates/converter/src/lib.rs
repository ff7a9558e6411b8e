//! Normalization of parsed API documentation for apidoc-mcp
//!
//! `normalize` is total: every input produces a `Document`.
//!
//! ## Shape detection (first match wins)
//!
//! 1. `openapi: "3.x"` → passed through unchanged
//! 2. `swagger: "2.0"` → structural conversion to OpenAPI 3.0
//! 3. `{endpoints: [...]}` → canonical list expanded into `paths`
//! 4. anything else → TODO document keeping the input under `original_data`
//!
//! Only documents passing `Document::is_valid_openapi` are eligible for
//! the cache; a TODO document never is.

mod cache;
mod canonical;
mod swagger;

pub use cache::{canonical_json, DocumentCache};

use apidoc_mcp_common::{Document, ORIGINAL_DATA_KEY, TODO_KEY};
use serde_json::{json, Map, Value};
use std::fmt;
use tracing::{info, warn};

/// Recognized shape of a normalizer input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputShape {
    OpenApi,
    Swagger,
    Canonical,
    Unstructured,
}

impl InputShape {
    /// Classify an input value
    pub fn detect(input: &Value) -> Self {
        let Some(map) = input.as_object() else {
            return InputShape::Unstructured;
        };

        let is_openapi = map
            .get("openapi")
            .and_then(Value::as_str)
            .is_some_and(|v| v.starts_with("3."));
        if is_openapi {
            return InputShape::OpenApi;
        }

        let is_swagger = match map.get("swagger") {
            Some(Value::String(s)) => s == "2.0",
            Some(Value::Number(n)) => n.as_f64() == Some(2.0),
            _ => false,
        };
        if is_swagger {
            return InputShape::Swagger;
        }

        if map.get("endpoints").is_some_and(Value::is_array) {
            return InputShape::Canonical;
        }

        InputShape::Unstructured
    }
}

impl fmt::Display for InputShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            InputShape::OpenApi => "openapi",
            InputShape::Swagger => "swagger",
            InputShape::Canonical => "canonical",
            InputShape::Unstructured => "unstructured",
        };
        f.write_str(name)
    }
}

/// Normalize any structured input into a single OpenAPI-shaped document
pub fn normalize(input: Value) -> Document {
    let shape = InputShape::detect(&input);
    info!(shape = %shape, "normalizing document");

    let document = match (shape, input) {
        (InputShape::OpenApi, Value::Object(map)) => Document::from_map(map),
        (InputShape::Swagger, Value::Object(map)) => {
            let converted = swagger::convert(&map);
            info!("converted Swagger 2.0 document to OpenAPI 3.0");
            Document::from_map(converted)
        }
        (InputShape::Canonical, Value::Object(map)) => {
            let expanded = canonical::expand(&map);
            info!("expanded endpoint list into OpenAPI 3.0 paths");
            Document::from_map(expanded)
        }
        (_, other) => todo_document(other),
    };

    if !document.is_todo() && !document.is_valid_openapi() {
        warn!("normalized document is not a valid OpenAPI 3 document");
    }
    document
}

/// Defer unrecognized input for manual or LLM-assisted handling
pub fn todo_document(original: Value) -> Document {
    warn!("unrecognized input, marking document as TODO");
    let mut map = Map::new();
    map.insert("title".to_string(), json!("Unstructured API Data"));
    map.insert("version".to_string(), json!("1.0.0"));
    map.insert(
        "description".to_string(),
        json!("This API data is unstructured and needs manual or LLM-assisted processing"),
    );
    map.insert(TODO_KEY.to_string(), Value::Bool(true));
    map.insert(ORIGINAL_DATA_KEY.to_string(), original);
    map.insert("paths".to_string(), Value::Object(Map::new()));
    Document::from_map(map)
}

/// Whether a normalized document may be written to the cache
pub fn is_cacheable(document: &Document) -> bool {
    !document.is_todo() && document.is_valid_openapi()
}
