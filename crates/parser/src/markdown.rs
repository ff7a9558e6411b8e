//! Markdown API document parser
//!
//! Reads loosely structured Markdown documentation:
//!
//! - the first `#` heading is the API title, the text under it the description
//! - each `##`/`###` section naming an HTTP method and a path is one endpoint
//! - the first pipe table in a section lists its parameters; column headers
//!   are recognized in English or Chinese
//! - the first fenced block after "Request Body" / "Response" (or 请求体 / 响应)
//!   is kept as the request or response example

use apidoc_mcp_common::{
    ApiDescription, Endpoint, HttpMethod, Parameter, ParameterLocation, RequestBody, Response,
    Result, Schema,
};
use regex::Regex;
use serde_json::{Map, Value};
use std::sync::LazyLock;
use tracing::{debug, info};

const DEFAULT_TITLE: &str = "Untitled API";
const DEFAULT_VERSION: &str = "1.0.0";
const JSON: &str = "application/json";

static TITLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^#\s+(.+?)\s*$").expect("title pattern is valid"));

static ANY_HEADING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^#{1,6}\s+").expect("heading pattern is valid"));

static SECTION_HEADING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(#{1,3})\s+(.+?)\s*$").expect("section pattern is valid"));

static VERSION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[Vv]ersion[:：]\s*([0-9.]+)").expect("version pattern is valid")
});

static METHOD_PATH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(GET|POST|PUT|DELETE|PATCH|OPTIONS|HEAD)\s+(\S+)")
        .expect("method pattern is valid")
});

static TABLE_SEPARATOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\|[-:|\s]+\|$").expect("separator pattern is valid"));

static REQUEST_EXAMPLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:请求体|[Rr]equest [Bb]ody)[\s\S]*?```[A-Za-z]*\n([\s\S]*?)```")
        .expect("request example pattern is valid")
});

static RESPONSE_EXAMPLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:响应|[Rr]esponse)[\s\S]*?```[A-Za-z]*\n([\s\S]*?)```")
        .expect("response example pattern is valid")
});

/// Column meaning in a parameter table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Column {
    Name,
    Type,
    Required,
    Description,
    Location,
    Ignored,
}

impl Column {
    /// Substring match on the lowercased header, first match wins
    fn classify(header: &str) -> Self {
        let header = header.to_lowercase();
        if header.contains("名称") || header.contains("name") {
            Column::Name
        } else if header.contains("类型") || header.contains("type") {
            Column::Type
        } else if header.contains("必填") || header.contains("required") {
            Column::Required
        } else if header.contains("描述") || header.contains("description") {
            Column::Description
        } else if header.contains("位置") || header.contains("in") {
            Column::Location
        } else {
            Column::Ignored
        }
    }
}

/// `##`/`###` section of the document, heading line included
struct Section<'a> {
    level: usize,
    title: &'a str,
    body: String,
}

/// Markdown document parser
pub struct MarkdownParser {
    content: String,
}

impl MarkdownParser {
    pub fn new(content: &str) -> Self {
        Self {
            content: content.replace("\r\n", "\n"),
        }
    }

    /// Build the canonical endpoint list
    ///
    /// Never fails; a document without recognizable sections yields an
    /// empty endpoint list.
    pub fn parse(&self) -> Result<ApiDescription> {
        let endpoints: Vec<Endpoint> = self
            .sections()
            .iter()
            .filter_map(|section| self.endpoint_from(section))
            .collect();

        info!(endpoints = endpoints.len(), "parsed Markdown document");

        Ok(ApiDescription {
            title: self.title(),
            description: self.description(),
            version: self.version(),
            servers: Vec::new(),
            endpoints,
        })
    }

    fn title(&self) -> String {
        TITLE
            .captures(&self.content)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().to_string())
            .unwrap_or_else(|| DEFAULT_TITLE.to_string())
    }

    /// Text between the title and the next heading of any level
    fn description(&self) -> String {
        let Some(title) = TITLE.find(&self.content) else {
            return String::new();
        };
        let rest = &self.content[title.end()..];
        let end = ANY_HEADING.find(rest).map(|m| m.start()).unwrap_or(rest.len());
        rest[..end].trim().to_string()
    }

    fn version(&self) -> String {
        VERSION
            .captures(&self.content)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().to_string())
            .unwrap_or_else(|| DEFAULT_VERSION.to_string())
    }

    /// Split the document at `#`..`###` headings outside fenced code
    ///
    /// Only `##`/`###` sections are returned; `####` and deeper stay in
    /// the body of their parent section.
    fn sections(&self) -> Vec<Section<'_>> {
        let mut sections: Vec<Section<'_>> = Vec::new();
        let mut current: Option<Section<'_>> = None;
        let mut in_fence = false;

        for line in self.content.lines() {
            if line.trim_start().starts_with("```") {
                in_fence = !in_fence;
            }
            let heading = if in_fence {
                None
            } else {
                SECTION_HEADING.captures(line)
            };

            match heading {
                Some(caps) => {
                    if let Some(done) = current.take() {
                        sections.push(done);
                    }
                    let level = caps.get(1).map(|m| m.as_str().len()).unwrap_or(1);
                    if level >= 2 {
                        let title = caps.get(2).map(|m| m.as_str()).unwrap_or_default();
                        current = Some(Section {
                            level,
                            title,
                            body: format!("{}\n", line),
                        });
                    }
                }
                None => {
                    if let Some(section) = current.as_mut() {
                        section.body.push_str(line);
                        section.body.push('\n');
                    }
                }
            }
        }
        if let Some(done) = current {
            sections.push(done);
        }
        sections
    }

    fn endpoint_from(&self, section: &Section<'_>) -> Option<Endpoint> {
        if section.level == 2 && !mentions_method(section.title) {
            return None;
        }

        let Some((method, path)) =
            method_and_path(section.title).or_else(|| method_and_path(&section.body))
        else {
            debug!(section = section.title, "no method and path in section");
            return None;
        };

        let mut endpoint = Endpoint::new(method, path);
        endpoint.summary = section.title.to_string();
        endpoint.description = section_description(&section.body);
        endpoint.parameters = parse_parameter_table(&section.body);
        endpoint.request_body = request_example(&section.body);
        endpoint.responses = vec![response_example(&section.body)];
        Some(endpoint)
    }
}

fn mentions_method(title: &str) -> bool {
    let upper = title.to_uppercase();
    ["GET", "POST", "PUT", "DELETE", "PATCH"]
        .iter()
        .any(|m| upper.contains(m))
}

/// First `METHOD /path` pair whose path token looks like a path
fn method_and_path(text: &str) -> Option<(HttpMethod, String)> {
    METHOD_PATH.captures_iter(text).find_map(|caps| {
        let method = HttpMethod::parse(caps.get(1)?.as_str())?;
        let path = caps.get(2)?.as_str().trim_matches(|c| c == '`' || c == '*');
        path.contains('/').then(|| (method, path.to_string()))
    })
}

/// Text after the heading up to the next heading or table row
fn section_description(body: &str) -> String {
    body.lines()
        .skip(1)
        .take_while(|line| {
            let trimmed = line.trim();
            !(ANY_HEADING.is_match(line) || (trimmed.starts_with('|') && trimmed.ends_with('|')))
        })
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}

fn split_row(line: &str) -> Vec<String> {
    line.trim()
        .trim_matches('|')
        .split('|')
        .map(|cell| cell.trim().to_string())
        .collect()
}

/// Parse the first pipe table of a section into parameters
fn parse_parameter_table(body: &str) -> Vec<Parameter> {
    let lines: Vec<&str> = body.lines().map(str::trim).collect();

    let Some(header_index) = lines.windows(2).position(|pair| {
        pair[0].starts_with('|') && pair[0].ends_with('|') && TABLE_SEPARATOR.is_match(pair[1])
    }) else {
        return Vec::new();
    };

    let columns: Vec<Column> = split_row(lines[header_index])
        .iter()
        .map(|h| Column::classify(h))
        .collect();

    lines[header_index + 2..]
        .iter()
        .take_while(|line| line.starts_with('|') && line.ends_with('|'))
        .filter_map(|line| parameter_from_row(&columns, &split_row(line)))
        .collect()
}

fn parameter_from_row(columns: &[Column], cells: &[String]) -> Option<Parameter> {
    let mut name = None;
    let mut schema = None;
    let mut required = None;
    let mut description = String::new();
    let mut location = None;

    for (column, cell) in columns.iter().zip(cells.iter()) {
        match column {
            Column::Name => name = Some(cell.trim_matches('`').to_string()),
            Column::Type => schema = Some(Schema::of_type(&cell.to_lowercase())),
            Column::Required => {
                let lower = cell.to_lowercase();
                required = Some(cell.contains('是') || lower.contains("yes") || lower.contains("true"));
            }
            Column::Description => description = cell.clone(),
            Column::Location => location = Some(location_label(cell)),
            Column::Ignored => {}
        }
    }

    let raw_name = name.filter(|n| !n.is_empty())?;
    let templated = raw_name.contains('{') && raw_name.contains('}');
    let name = if templated {
        raw_name.trim_matches(|c| c == '{' || c == '}').to_string()
    } else {
        raw_name
    };
    let location = location.unwrap_or(if templated {
        ParameterLocation::Path
    } else {
        ParameterLocation::Query
    });

    Some(Parameter {
        name,
        location,
        required: required.unwrap_or(location == ParameterLocation::Path),
        description,
        schema: schema.unwrap_or_else(Schema::string),
    })
}

fn location_label(cell: &str) -> ParameterLocation {
    let lower = cell.to_lowercase();
    if lower.contains("path") {
        ParameterLocation::Path
    } else if lower.contains("query") {
        ParameterLocation::Query
    } else if lower.contains("header") {
        ParameterLocation::Header
    } else if lower.contains("body") || lower.contains("form") {
        ParameterLocation::Body
    } else {
        ParameterLocation::Query
    }
}

/// Schema carrying the example, with properties inferred from a JSON object
fn example_schema(example: &str) -> Schema {
    let mut schema = Map::new();
    match serde_json::from_str::<Value>(example) {
        Ok(Value::Object(fields)) => {
            schema.insert("type".to_string(), Value::String("object".to_string()));
            let properties: Map<String, Value> = fields
                .iter()
                .map(|(key, value)| {
                    let mut property = Map::new();
                    property.insert(
                        "type".to_string(),
                        Value::String(json_type_name(value).to_string()),
                    );
                    (key.clone(), Value::Object(property))
                })
                .collect();
            schema.insert("properties".to_string(), Value::Object(properties));
            schema.insert("example".to_string(), Value::Object(fields));
        }
        Ok(Value::Array(items)) => {
            schema.insert("type".to_string(), Value::String("array".to_string()));
            schema.insert("example".to_string(), Value::Array(items));
        }
        _ => {
            schema.insert("type".to_string(), Value::String("object".to_string()));
            schema.insert("example".to_string(), Value::String(example.to_string()));
        }
    }
    Schema::new(Value::Object(schema))
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_i64() || n.is_u64() => "integer",
        Value::Number(_) => "number",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
        Value::String(_) | Value::Null => "string",
    }
}

fn request_example(body: &str) -> Option<RequestBody> {
    let example = REQUEST_EXAMPLE.captures(body)?.get(1)?.as_str().trim();
    Some(RequestBody {
        content_type: JSON.to_string(),
        schema: example_schema(example),
        required: true,
    })
}

/// The documented success response, or a bare `200` when none is shown
fn response_example(body: &str) -> Response {
    let schema = RESPONSE_EXAMPLE
        .captures(body)
        .and_then(|c| c.get(1))
        .map(|m| example_schema(m.as_str().trim()))
        .unwrap_or_default();

    Response {
        status_code: "200".to_string(),
        description: "Success".to_string(),
        content_type: Some(JSON.to_string()),
        schema,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = r#"# User Service

Manages users.
Version: 2.1.0

## GET /users/{id}

Fetch one user.

| Name | Type | Required | Description | In |
|------|------|----------|-------------|----|
| id | integer | yes | User id | path |
| verbose | boolean | no | Extra fields | query |

#### Response

```json
{"id": 1, "name": "Ann"}
```

## Overview

Nothing to see here.

## POST /users

Create a user.

#### Request Body

```json
{"name": "Ann", "age": 30, "admin": false}
```
"#;

    #[test]
    fn test_title_description_version() {
        let api = MarkdownParser::new(DOC).parse().unwrap();
        assert_eq!(api.title, "User Service");
        assert!(api.description.starts_with("Manages users."));
        assert_eq!(api.version, "2.1.0");
    }

    #[test]
    fn test_sections_become_endpoints() {
        let api = MarkdownParser::new(DOC).parse().unwrap();
        let labels: Vec<(String, &str)> = api
            .endpoints
            .iter()
            .map(|e| (e.method_label(), e.path.as_str()))
            .collect();
        assert_eq!(
            labels,
            vec![("GET".to_string(), "/users/{id}"), ("POST".to_string(), "/users")]
        );
    }

    #[test]
    fn test_parameter_table() {
        let api = MarkdownParser::new(DOC).parse().unwrap();
        let get = &api.endpoints[0];
        assert_eq!(get.parameters.len(), 2);
        assert_eq!(get.parameters[0].name, "id");
        assert_eq!(get.parameters[0].location, ParameterLocation::Path);
        assert!(get.parameters[0].required);
        assert_eq!(get.parameters[0].schema.schema_type(), Some("integer"));
        assert_eq!(get.parameters[1].location, ParameterLocation::Query);
        assert!(!get.parameters[1].required);
        assert_eq!(get.description, "Fetch one user.");
    }

    #[test]
    fn test_request_example_infers_properties() {
        let api = MarkdownParser::new(DOC).parse().unwrap();
        let body = api.endpoints[1].request_body.as_ref().unwrap();
        let props: Vec<(String, Option<String>)> = body
            .schema
            .properties()
            .into_iter()
            .map(|(n, s)| (n, s.schema_type().map(String::from)))
            .collect();
        assert_eq!(
            props,
            vec![
                ("name".to_string(), Some("string".to_string())),
                ("age".to_string(), Some("integer".to_string())),
                ("admin".to_string(), Some("boolean".to_string())),
            ]
        );
        assert!(body.required);
    }

    #[test]
    fn test_chinese_columns_and_braced_names() {
        let doc = "# 用户接口\n\n## 获取用户 GET /users/{userId}\n\n| 参数名称 | 类型 | 必填 | 描述 |\n|---|---|---|---|\n| {userId} | string | 是 | 用户ID |\n";
        let api = MarkdownParser::new(doc).parse().unwrap();
        let param = &api.endpoints[0].parameters[0];
        assert_eq!(param.name, "userId");
        assert_eq!(param.location, ParameterLocation::Path);
        assert!(param.required);
    }

    #[test]
    fn test_default_response_and_empty_doc() {
        let api = MarkdownParser::new("## DELETE /sessions\n").parse().unwrap();
        assert_eq!(api.title, DEFAULT_TITLE);
        assert_eq!(api.endpoints[0].responses[0].status_code, "200");
        assert!(api.endpoints[0].responses[0].schema.is_empty());

        let empty = MarkdownParser::new("just prose").parse().unwrap();
        assert!(empty.endpoints.is_empty());
    }

    #[test]
    fn test_heading_inside_code_fence_is_ignored() {
        let doc = "## POST /scripts\n\n```bash\n# not a heading\ncurl -X POST /scripts\n```\n";
        let api = MarkdownParser::new(doc).parse().unwrap();
        assert_eq!(api.endpoints.len(), 1);
    }
}
