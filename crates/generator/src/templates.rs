//! Template loading and management

use apidoc_mcp_common::{BridgeError, Result};
use std::collections::HashMap;
use tera::{Tera, Value};

/// Load all templates
pub fn load_templates() -> Result<Tera> {
    let mut tera = Tera::default();

    tera.register_filter("py_str", py_str_filter);
    tera.register_filter("docstring", docstring_filter);
    tera.register_filter("one_line", one_line_filter);
    tera.register_filter("py_arguments", py_arguments_filter);
    tera.register_filter("md_cell", md_cell_filter);

    tera.add_raw_template(
        "mcp_server.py",
        include_str!("../templates/mcp_server.py.tera"),
    )
    .map_err(|e| BridgeError::Template(format!("Failed to load mcp_server.py template: {}", e)))?;

    tera.add_raw_template("README.md", include_str!("../templates/README.md.tera"))
        .map_err(|e| BridgeError::Template(format!("Failed to load README.md template: {}", e)))?;

    Ok(tera)
}

fn expect_str<'a>(value: &'a Value, filter: &str) -> tera::Result<&'a str> {
    value
        .as_str()
        .ok_or_else(|| tera::Error::msg(format!("{} filter expects a string", filter)))
}

/// Double-quoted Python string literal
fn py_str_filter(value: &Value, _args: &HashMap<String, Value>) -> tera::Result<Value> {
    let s = expect_str(value, "py_str")?;
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c => out.push(c),
        }
    }
    out.push('"');
    Ok(Value::String(out))
}

/// Text safe inside a triple-quoted docstring
fn docstring_filter(value: &Value, _args: &HashMap<String, Value>) -> tera::Result<Value> {
    let s = expect_str(value, "docstring")?;
    let escaped = s.trim().replace('\\', "\\\\").replace("\"\"\"", "\\\"\\\"\\\"");
    // a trailing quote would merge with the closing delimiter
    let escaped = match escaped.strip_suffix('"') {
        Some(head) if head.chars().rev().take_while(|c| *c == '\\').count() % 2 == 0 => {
            format!("{}\\\"", head)
        }
        _ => escaped,
    };
    Ok(Value::String(escaped))
}

/// Collapse all whitespace runs, newlines included, into single spaces
fn one_line_filter(value: &Value, _args: &HashMap<String, Value>) -> tera::Result<Value> {
    let s = expect_str(value, "one_line")?;
    Ok(Value::String(s.split_whitespace().collect::<Vec<_>>().join(" ")))
}

/// Escape a value for use inside a Markdown table cell
fn md_cell_filter(value: &Value, _args: &HashMap<String, Value>) -> tera::Result<Value> {
    let s = expect_str(value, "md_cell")?;
    let flat = s.split_whitespace().collect::<Vec<_>>().join(" ");
    Ok(Value::String(flat.replace('|', "\\|")))
}

/// Python argument list of a callable
///
/// Required parameters come first, optional ones default to `None`.
fn py_arguments_filter(value: &Value, _args: &HashMap<String, Value>) -> tera::Result<Value> {
    let params = value
        .as_array()
        .ok_or_else(|| tera::Error::msg("py_arguments filter expects a list of parameters"))?;

    let field = |param: &Value, key: &str| -> tera::Result<String> {
        param
            .get(key)
            .and_then(Value::as_str)
            .map(String::from)
            .ok_or_else(|| tera::Error::msg(format!("parameter is missing `{}`", key)))
    };

    let mut required = Vec::new();
    let mut optional = Vec::new();
    for param in params {
        let ident = field(param, "ident")?;
        let python_type = field(param, "python_type")?;
        if param.get("required").and_then(Value::as_bool).unwrap_or(false) {
            required.push(format!("{}: {}", ident, python_type));
        } else {
            optional.push(format!("{}: Optional[{}] = None", ident, python_type));
        }
    }

    required.extend(optional);
    Ok(Value::String(required.join(", ")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn apply(
        filter: fn(&Value, &HashMap<String, Value>) -> tera::Result<Value>,
        value: Value,
    ) -> String {
        filter(&value, &HashMap::new())
            .unwrap()
            .as_str()
            .unwrap()
            .to_string()
    }

    #[test]
    fn test_templates_load() {
        let tera = load_templates().unwrap();
        let names: Vec<&str> = tera.get_template_names().collect();
        assert!(names.contains(&"mcp_server.py"));
        assert!(names.contains(&"README.md"));
    }

    #[test]
    fn test_py_str_escapes() {
        assert_eq!(apply(py_str_filter, json!("a\"b\\c\nd")), r#""a\"b\\c\nd""#);
    }

    #[test]
    fn test_docstring_escapes_delimiters() {
        assert_eq!(apply(docstring_filter, json!("say \"\"\"hi\"\"\"")), r#"say \"\"\"hi\"\"\""#);
        assert_eq!(apply(docstring_filter, json!("ends with \"")), r#"ends with \""#);
    }

    #[test]
    fn test_py_arguments_orders_required_first() {
        let params = json!([
            {"ident": "limit", "python_type": "int", "required": false},
            {"ident": "id", "python_type": "str", "required": true}
        ]);
        assert_eq!(
            apply(py_arguments_filter, params),
            "id: str, limit: Optional[int] = None"
        );
    }

    #[test]
    fn test_md_cell() {
        assert_eq!(apply(md_cell_filter, json!("a | b\nc")), "a \\| b c");
    }
}
