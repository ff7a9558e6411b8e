//! Structured (JSON or YAML) document loading

use apidoc_mcp_common::{BridgeError, Result};
use serde_json::{Map, Number, Value};

/// Deserialize document text, trying JSON first and then YAML
///
/// YAML mappings with non-string keys (e.g. unquoted `200:` response codes)
/// are converted with their keys stringified.
pub fn load_structured(content: &str) -> Result<Value> {
    match serde_json::from_str::<Value>(content) {
        Ok(value) => Ok(value),
        Err(json_err) => {
            let yaml: serde_yaml::Value = serde_yaml::from_str(content).map_err(|yaml_err| {
                BridgeError::Parse(format!(
                    "Document is neither JSON ({}) nor YAML ({})",
                    json_err, yaml_err
                ))
            })?;
            Ok(yaml_to_json(yaml))
        }
    }
}

/// Load and require a top-level mapping
pub fn load_mapping(content: &str) -> Result<Map<String, Value>> {
    match load_structured(content)? {
        Value::Object(map) => Ok(map),
        other => Err(BridgeError::Parse(format!(
            "Expected a mapping at the document root, found {}",
            value_kind(&other)
        ))),
    }
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a sequence",
        Value::Object(_) => "a mapping",
    }
}

fn yaml_to_json(value: serde_yaml::Value) -> Value {
    use serde_yaml::Value as Yaml;

    match value {
        Yaml::Null => Value::Null,
        Yaml::Bool(b) => Value::Bool(b),
        Yaml::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::Number(i.into())
            } else if let Some(u) = n.as_u64() {
                Value::Number(u.into())
            } else {
                n.as_f64()
                    .and_then(Number::from_f64)
                    .map(Value::Number)
                    .unwrap_or(Value::Null)
            }
        }
        Yaml::String(s) => Value::String(s),
        Yaml::Sequence(items) => Value::Array(items.into_iter().map(yaml_to_json).collect()),
        Yaml::Mapping(mapping) => {
            let mut map = Map::new();
            for (key, value) in mapping {
                map.insert(yaml_key(&key), yaml_to_json(value));
            }
            Value::Object(map)
        }
        Yaml::Tagged(tagged) => yaml_to_json(tagged.value),
    }
}

fn yaml_key(key: &serde_yaml::Value) -> String {
    use serde_yaml::Value as Yaml;

    match key {
        Yaml::String(s) => s.clone(),
        Yaml::Number(n) => n.to_string(),
        Yaml::Bool(b) => b.to_string(),
        Yaml::Null => "null".to_string(),
        other => serde_yaml::to_string(other)
            .map(|s| s.trim().to_string())
            .unwrap_or_default(),
    }
}
