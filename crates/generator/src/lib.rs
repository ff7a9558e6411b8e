//! MCP service generation for apidoc-mcp
//!
//! This crate turns a normalized `Document` into a runnable MCP service:
//! - mcp-service.json (function descriptions)
//! - mcp_server.py (one async tool per endpoint)
//! - README.md

mod extract;
mod synthesizer;
mod templates;
mod validator;

pub use extract::extract_endpoints;
pub use synthesizer::{
    derive_operation_id, json_schema_type, python_identifier, python_type, synthesize, BodyKind,
    CallableParameter, CallableSpec,
};
pub use validator::{incompleteness_reason, is_complete, partition, IncompleteEndpoint};

use apidoc_mcp_common::{BridgeError, Document, Endpoint, Result};
use serde::Serialize;
use serde_json::{json, Value};
use std::fs;
use std::path::{Path, PathBuf};
use tera::Tera;
use tracing::{info, warn};

/// File name of the service description
pub const SERVICE_FILE: &str = "mcp-service.json";
/// File name of the generated server source
pub const SERVER_FILE: &str = "mcp_server.py";
/// File name of the generated documentation
pub const README_FILE: &str = "README.md";

/// Callables for every complete endpoint, plus the segregated rest
#[derive(Debug, Clone, PartialEq)]
pub struct ServicePlan {
    pub callables: Vec<CallableSpec>,
    pub endpoints: Vec<Endpoint>,
    pub incomplete: Vec<IncompleteEndpoint>,
}

impl ServicePlan {
    /// `{"functions": [...]}` service description
    pub fn service_description(&self) -> Value {
        let functions: Vec<Value> = self.callables.iter().map(CallableSpec::to_function).collect();
        json!({ "functions": functions })
    }
}

/// Outcome of a successful generation
#[derive(Debug, Clone)]
pub struct GenerationReport {
    pub output_dir: PathBuf,
    pub generated: usize,
    pub incomplete: Vec<IncompleteEndpoint>,
    pub files: Vec<PathBuf>,
}

#[derive(Serialize)]
struct SkippedEntry {
    label: String,
    reason: String,
}

#[derive(Serialize)]
struct ServerEntry {
    url: String,
    description: String,
}

#[derive(Serialize)]
struct ResponseEntry {
    status_code: String,
    description: String,
    content_type: Option<String>,
    example: Option<String>,
}

#[derive(Serialize)]
struct DocEntry<'a> {
    callable: &'a CallableSpec,
    summary: &'a str,
    details: &'a str,
    request_example: Option<String>,
    responses: Vec<ResponseEntry>,
}

/// MCP service generator
///
/// Extracts endpoints from a normalized document, validates them and renders
/// the service artifacts.
pub struct ServiceGenerator {
    document: Document,
    endpoints: Vec<Endpoint>,
    base_url_env: String,
    tera: Tera,
}

impl ServiceGenerator {
    /// Create a new generator from a normalized document
    pub fn new(document: Document) -> Result<Self> {
        let tera = templates::load_templates()?;
        let endpoints = extract_endpoints(&document);
        Ok(Self {
            document,
            endpoints,
            base_url_env: "API_BASE_URL".to_string(),
            tera,
        })
    }

    /// Environment variable the generated server reads its base URL from
    pub fn with_base_url_env(mut self, name: impl Into<String>) -> Self {
        self.base_url_env = name.into();
        self
    }

    pub fn endpoints(&self) -> &[Endpoint] {
        &self.endpoints
    }

    /// Validate every endpoint and synthesize callables for the complete ones
    pub fn plan(&self) -> ServicePlan {
        let (complete, incomplete) = partition(self.endpoints.clone());
        let callables = complete.iter().map(synthesize).collect();
        ServicePlan {
            callables,
            endpoints: complete,
            incomplete,
        }
    }

    /// Generate all service artifacts to a directory
    ///
    /// Fails without writing anything when no endpoint is complete.
    pub fn generate_to_directory(&self, output_dir: &Path) -> Result<GenerationReport> {
        let plan = self.plan();
        if plan.callables.is_empty() {
            warn!(
                incomplete = plan.incomplete.len(),
                "no valid API endpoints, nothing to generate"
            );
            return Err(BridgeError::Generation(format!(
                "No valid API endpoints found ({} incomplete)",
                plan.incomplete.len()
            )));
        }

        fs::create_dir_all(output_dir).map_err(|e| {
            BridgeError::Generation(format!("Failed to create output directory: {}", e))
        })?;

        let files = vec![
            self.generate_service_description(output_dir, &plan)?,
            self.generate_server(output_dir, &plan)?,
            self.generate_readme(output_dir, &plan)?,
        ];

        info!(
            generated = plan.callables.len(),
            incomplete = plan.incomplete.len(),
            output = %output_dir.display(),
            "generated MCP service"
        );
        for skipped in &plan.incomplete {
            warn!(endpoint = %skipped.label(), reason = %skipped.reason, "endpoint not implemented");
        }

        Ok(GenerationReport {
            output_dir: output_dir.to_path_buf(),
            generated: plan.callables.len(),
            incomplete: plan.incomplete,
            files,
        })
    }

    /// Generate mcp-service.json
    fn generate_service_description(&self, output_dir: &Path, plan: &ServicePlan) -> Result<PathBuf> {
        let rendered = serde_json::to_string_pretty(&plan.service_description())?;
        write_artifact(output_dir, SERVICE_FILE, rendered)
    }

    /// Generate mcp_server.py
    fn generate_server(&self, output_dir: &Path, plan: &ServicePlan) -> Result<PathBuf> {
        let mut context = self.create_context(plan);
        context.insert("callables", &plan.callables);

        let rendered = self
            .tera
            .render("mcp_server.py", &context)
            .map_err(|e| BridgeError::Template(format!("Template error: {:?}", e)))?;
        write_artifact(output_dir, SERVER_FILE, rendered)
    }

    /// Generate README.md
    fn generate_readme(&self, output_dir: &Path, plan: &ServicePlan) -> Result<PathBuf> {
        let entries: Vec<DocEntry> = plan
            .callables
            .iter()
            .zip(&plan.endpoints)
            .map(|(callable, endpoint)| doc_entry(callable, endpoint))
            .collect();

        let servers: Vec<ServerEntry> = self
            .document
            .servers()
            .into_iter()
            .map(|(url, description)| ServerEntry { url, description })
            .collect();

        let mut context = self.create_context(plan);
        context.insert("entries", &entries);
        context.insert("servers", &servers);

        let rendered = self
            .tera
            .render("README.md", &context)
            .map_err(|e| BridgeError::Template(format!("Template error: {:?}", e)))?;
        write_artifact(output_dir, README_FILE, rendered)
    }

    /// Create template context shared by all artifacts
    fn create_context(&self, plan: &ServicePlan) -> tera::Context {
        let skipped: Vec<SkippedEntry> = plan
            .incomplete
            .iter()
            .map(|i| SkippedEntry {
                label: i.label(),
                reason: i.reason.clone(),
            })
            .collect();
        let default_base_url = self
            .document
            .servers()
            .into_iter()
            .next()
            .map(|(url, _)| url)
            .unwrap_or_default();

        let mut context = tera::Context::new();
        context.insert("title", self.document.title().unwrap_or("API Service"));
        context.insert("version", self.document.version().unwrap_or("1.0.0"));
        context.insert("description", self.document.description().unwrap_or_default());
        context.insert("base_url_env", &self.base_url_env);
        context.insert("default_base_url", &default_base_url);
        context.insert("incomplete", &skipped);
        context
    }
}

fn doc_entry<'a>(callable: &'a CallableSpec, endpoint: &'a Endpoint) -> DocEntry<'a> {
    DocEntry {
        callable,
        summary: endpoint.summary.trim(),
        details: endpoint.description.trim(),
        request_example: endpoint
            .request_body
            .as_ref()
            .and_then(|body| body.schema.example())
            .map(pretty_example),
        responses: endpoint
            .responses
            .iter()
            .map(|r| ResponseEntry {
                status_code: r.status_code.clone(),
                description: r.description.clone(),
                content_type: r.content_type.clone().filter(|ct| !ct.is_empty()),
                example: r.schema.example().map(pretty_example),
            })
            .collect(),
    }
}

fn pretty_example(example: &Value) -> String {
    match example {
        Value::String(text) => text.clone(),
        other => serde_json::to_string_pretty(other).unwrap_or_else(|_| other.to_string()),
    }
}

fn write_artifact(output_dir: &Path, name: &str, content: String) -> Result<PathBuf> {
    let path = output_dir.join(name);
    fs::write(&path, content)
        .map_err(|e| BridgeError::Generation(format!("Failed to write {}: {}", name, e)))?;
    Ok(path)
}

/// Generate service artifacts (convenience function)
pub fn generate_service(document: Document, output_dir: &Path) -> Result<GenerationReport> {
    ServiceGenerator::new(document)?.generate_to_directory(output_dir)
}
