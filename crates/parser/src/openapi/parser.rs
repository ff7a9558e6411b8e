//! OpenAPI 3.x and Swagger 2.0 document parsers

use super::endpoints::{collect_endpoints, Dialect};
use super::types::SpecRoot;
use crate::structured::load_mapping;
use apidoc_mcp_common::{ApiDescription, BridgeError, Result, Server};
use serde_json::Value;
use tracing::info;

const DEFAULT_TITLE: &str = "API";
const DEFAULT_VERSION: &str = "1.0.0";

/// OpenAPI 3.x parser
///
/// Accepts JSON or YAML. The document must carry an `openapi: 3.x` key.
pub struct OpenApiParser {
    spec: SpecRoot,
}

impl OpenApiParser {
    /// Parse OpenAPI content from a JSON or YAML string
    pub fn from_content(content: &str) -> Result<Self> {
        let map = load_mapping(content)?;
        match map.get("openapi").and_then(Value::as_str) {
            Some(version) if version.starts_with('3') => {}
            Some(version) => {
                return Err(BridgeError::Parse(format!(
                    "Unsupported OpenAPI version: {}",
                    version
                )))
            }
            None => {
                return Err(BridgeError::Parse(
                    "Missing `openapi` key; not an OpenAPI 3.x document".to_string(),
                ))
            }
        }

        let spec: SpecRoot = serde_json::from_value(Value::Object(map))
            .map_err(|e| BridgeError::Parse(format!("Malformed OpenAPI document: {}", e)))?;
        Ok(Self { spec })
    }

    /// Build the canonical endpoint list
    pub fn parse(&self) -> Result<ApiDescription> {
        let description = describe(&self.spec, Dialect::OpenApi3);
        info!(
            endpoints = description.endpoints.len(),
            "parsed OpenAPI document"
        );
        Ok(description)
    }
}

/// Swagger 2.0 parser
///
/// Body parameters become the endpoint's request body; `formData`
/// parameters become a form-encoded object body.
pub struct SwaggerParser {
    spec: SpecRoot,
}

impl SwaggerParser {
    /// Parse Swagger content from a JSON or YAML string
    pub fn from_content(content: &str) -> Result<Self> {
        let map = load_mapping(content)?;
        let version = match map.get("swagger") {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Number(n)) => n.to_string(),
            _ => {
                return Err(BridgeError::Parse(
                    "Missing `swagger` key; not a Swagger 2.0 document".to_string(),
                ))
            }
        };
        if !version.starts_with('2') {
            return Err(BridgeError::Parse(format!(
                "Unsupported Swagger version: {}",
                version
            )));
        }

        let spec: SpecRoot = serde_json::from_value(Value::Object(map))
            .map_err(|e| BridgeError::Parse(format!("Malformed Swagger document: {}", e)))?;
        Ok(Self { spec })
    }

    /// Build the canonical endpoint list
    pub fn parse(&self) -> Result<ApiDescription> {
        let description = describe(&self.spec, Dialect::Swagger2);
        info!(
            endpoints = description.endpoints.len(),
            "parsed Swagger document"
        );
        Ok(description)
    }
}

fn describe(spec: &SpecRoot, dialect: Dialect) -> ApiDescription {
    ApiDescription {
        title: spec
            .info
            .title
            .clone()
            .filter(|t| !t.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_TITLE.to_string()),
        description: spec.info.description.clone().unwrap_or_default(),
        version: spec
            .info
            .version
            .clone()
            .unwrap_or_else(|| DEFAULT_VERSION.to_string()),
        servers: match dialect {
            Dialect::OpenApi3 => declared_servers(&spec.servers),
            Dialect::Swagger2 => swagger_servers(spec),
        },
        endpoints: collect_endpoints(spec, dialect),
    }
}

fn declared_servers(servers: &[Value]) -> Vec<Server> {
    servers
        .iter()
        .filter_map(|server| {
            let url = server.get("url").and_then(Value::as_str)?;
            Some(Server {
                url: url.to_string(),
                description: server
                    .get("description")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string(),
            })
        })
        .collect()
}

/// `scheme://host/basePath` for each scheme, `https` when none is listed
fn swagger_servers(spec: &SpecRoot) -> Vec<Server> {
    let Some(host) = spec.host.as_deref().filter(|h| !h.is_empty()) else {
        return Vec::new();
    };
    let base_path = spec.base_path.as_deref().unwrap_or("");
    if spec.schemes.is_empty() {
        return vec![Server::new(format!("https://{}{}", host, base_path))];
    }
    spec.schemes
        .iter()
        .map(|scheme| Server::new(format!("{}://{}{}", scheme, host, base_path)))
        .collect()
}
