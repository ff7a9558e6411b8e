//! Common types and utilities for apidoc-mcp
//!
//! This crate contains the canonical endpoint model, the normalized
//! `Document` container, error types, content loading and configuration
//! shared by the parser, converter, generator and pipeline crates.

mod config;
mod document;
mod loader;
mod model;

pub use config::PipelineConfig;
pub use document::{Document, ORIGINAL_DATA_KEY, TODO_KEY};
pub use loader::{is_url, ContentLoader, DefaultLoader};
pub use model::{
    ApiDescription, Endpoint, OperationKind, Parameter, RawOperation, RawParameter, RequestBody,
    Response, Schema, Server,
};

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Errors that can occur while converting API documentation
#[derive(Error, Debug)]
pub enum BridgeError {
    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Fetch error: {0}")]
    Fetch(String),

    #[error("Generation error: {0}")]
    Generation(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Template error: {0}")]
    Template(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Result type for apidoc-mcp operations
pub type Result<T> = std::result::Result<T, BridgeError>;

/// Source document format, either sniffed or declared on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormatTag {
    OpenApi,
    Swagger,
    Markdown,
    Html,
    Crawler,
}

impl FormatTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            FormatTag::OpenApi => "openapi",
            FormatTag::Swagger => "swagger",
            FormatTag::Markdown => "markdown",
            FormatTag::Html => "html",
            FormatTag::Crawler => "crawler",
        }
    }
}

impl fmt::Display for FormatTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FormatTag {
    type Err = BridgeError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "openapi" => Ok(FormatTag::OpenApi),
            "swagger" => Ok(FormatTag::Swagger),
            "markdown" | "md" => Ok(FormatTag::Markdown),
            "html" => Ok(FormatTag::Html),
            "crawler" => Ok(FormatTag::Crawler),
            other => Err(BridgeError::Parse(format!("Unknown format: {}", other))),
        }
    }
}

/// HTTP method of an endpoint
///
/// Accepted case-insensitively, held lowercase (`as_str`) and displayed
/// uppercase (`Display`, serialization).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
    Patch,
    Options,
    Head,
}

impl HttpMethod {
    /// All methods in the order they are walked inside an OpenAPI path item
    pub const ALL: [HttpMethod; 7] = [
        HttpMethod::Get,
        HttpMethod::Post,
        HttpMethod::Put,
        HttpMethod::Delete,
        HttpMethod::Patch,
        HttpMethod::Options,
        HttpMethod::Head,
    ];

    /// Lowercase form, as used for OpenAPI path item keys
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "get",
            HttpMethod::Post => "post",
            HttpMethod::Put => "put",
            HttpMethod::Delete => "delete",
            HttpMethod::Patch => "patch",
            HttpMethod::Options => "options",
            HttpMethod::Head => "head",
        }
    }

    /// Parse a method token, ignoring case and surrounding whitespace
    pub fn parse(s: &str) -> Option<Self> {
        let lower = s.trim().to_ascii_lowercase();
        Self::ALL.into_iter().find(|m| m.as_str() == lower)
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_str().to_ascii_uppercase())
    }
}

impl Serialize for HttpMethod {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for HttpMethod {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        HttpMethod::parse(&s)
            .ok_or_else(|| serde::de::Error::custom(format!("unknown HTTP method: {}", s)))
    }
}

/// Where a parameter is carried in the request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParameterLocation {
    Path,
    Query,
    Header,
    Body,
}

impl ParameterLocation {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParameterLocation::Path => "path",
            ParameterLocation::Query => "query",
            ParameterLocation::Header => "header",
            ParameterLocation::Body => "body",
        }
    }

    /// Map a free-form location label onto a location
    ///
    /// `formData` and `form` are carried in the body. Anything else
    /// (e.g. `cookie`) has no location here.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "path" => Some(ParameterLocation::Path),
            "query" => Some(ParameterLocation::Query),
            "header" => Some(ParameterLocation::Header),
            "body" | "formdata" | "form" => Some(ParameterLocation::Body),
            _ => None,
        }
    }
}

impl fmt::Display for ParameterLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Extract `{name}` placeholders from a path template, in order of appearance
pub fn path_placeholders(path: &str) -> Vec<String> {
    let mut names = Vec::new();
    let mut rest = path;
    while let Some(start) = rest.find('{') {
        let after = &rest[start + 1..];
        match after.find('}') {
            Some(end) => {
                if end > 0 {
                    names.push(after[..end].to_string());
                }
                rest = &after[end + 1..];
            }
            None => break,
        }
    }
    names
}
