//! Conversion pipeline for apidoc-mcp
//!
//! Sequences the stages of one conversion run:
//!
//! 1. detect the format (unless given) and load the content
//! 2. look the content up in the document cache
//! 3. on a miss, parse and normalize, then cache the result if it is valid
//! 4. apply the service name and generate the MCP service
//!
//! Every stage runs on the calling thread, one document per run.

mod metrics;

pub use metrics::PipelineMetrics;

use apidoc_mcp_common::{
    BridgeError, ContentLoader, DefaultLoader, Document, FormatTag, PipelineConfig, Result,
};
use apidoc_mcp_converter::{is_cacheable, normalize, DocumentCache};
use apidoc_mcp_generator::{GenerationReport, ServiceGenerator};
use apidoc_mcp_parser::{load_structured, parse_content, FormatSniffer};
use metrics::timed;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

/// File a deferred document is written to for manual processing
pub const TODO_FILE: &str = "todo-document.json";

/// Per-run options
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunOptions {
    /// Source format; detected from the source when `None`
    pub format: Option<FormatTag>,
    /// Service name used as title and output subfolder
    pub service_name: Option<String>,
}

/// A normalized document and how it was obtained
#[derive(Debug, Clone, PartialEq)]
pub struct Prepared {
    pub document: Document,
    pub format: FormatTag,
    pub cache_hit: bool,
    pub parse_time: Duration,
    pub convert_time: Duration,
}

/// Outcome of a successful run
#[derive(Debug, Clone)]
pub struct PipelineOutcome {
    pub output_dir: PathBuf,
    pub document: Document,
    pub report: GenerationReport,
    pub metrics: PipelineMetrics,
}

/// Parse → normalize → generate orchestrator
pub struct Pipeline {
    config: PipelineConfig,
    loader: Box<dyn ContentLoader>,
    cache: Option<DocumentCache>,
}

impl Pipeline {
    /// Pipeline reading files and URLs through the default loader
    pub fn new(config: PipelineConfig) -> Result<Self> {
        let loader = DefaultLoader::new(&config)?;
        Ok(Self::with_loader(config, Box::new(loader)))
    }

    pub fn with_loader(config: PipelineConfig, loader: Box<dyn ContentLoader>) -> Self {
        let cache = config
            .cache_enabled
            .then(|| DocumentCache::new(config.cache_dir.clone()));
        Self {
            config,
            loader,
            cache,
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Run the full conversion of one source
    pub fn run(&self, source: &str, options: &RunOptions) -> Result<PipelineOutcome> {
        let started = Instant::now();

        let prepared = self
            .prepare(source, options.format)
            .inspect_err(|e| error!(error = %e, "document could not be parsed"))?;

        let mut metrics = PipelineMetrics {
            parse_time: prepared.parse_time,
            convert_time: prepared.convert_time,
            endpoints_count: prepared.document.operation_count(),
            cache_hit: prepared.cache_hit,
            ..Default::default()
        };

        let document = match options.service_name.as_deref() {
            Some(name) => {
                info!(name, "using service name");
                prepared.document.with_service_name(name)
            }
            None => prepared.document,
        };
        let output_dir = self.output_dir_for(&document, options.service_name.as_deref());

        if document.is_todo() {
            let path = write_deferred(&document, &output_dir)?;
            error!(path = %path.display(), "document needs manual processing");
            return Err(BridgeError::Generation(format!(
                "Document could not be interpreted; saved for manual processing at {}",
                path.display()
            )));
        }

        info!(output = %output_dir.display(), "[3/3] generating MCP service");
        let (report, generate_time) = timed(|| {
            ServiceGenerator::new(document.clone())?
                .with_base_url_env(self.config.base_url_env.clone())
                .generate_to_directory(&output_dir)
        });
        let report =
            report.inspect_err(|e| error!(error = %e, "MCP service generation failed"))?;

        metrics.generate_time = generate_time;
        metrics.generated_count = report.generated;
        metrics.incomplete_endpoints = report.incomplete.len();
        metrics.total_time = started.elapsed();

        info!(output = %output_dir.display(), "MCP service generated");
        Ok(PipelineOutcome {
            output_dir,
            document,
            report,
            metrics,
        })
    }

    /// Produce the normalized document for a source
    ///
    /// A cache hit skips parsing and normalization entirely.
    pub fn prepare(&self, source: &str, format: Option<FormatTag>) -> Result<Prepared> {
        let parse_started = Instant::now();
        let format = format.unwrap_or_else(|| FormatSniffer::new(self.loader.as_ref()).detect(source));
        info!(source, format = %format, "[1/3] parsing document");

        let content = self.loader.load(source)?;
        let key = cache_key(&content, format);

        if let Some(document) = self.cache.as_ref().and_then(|cache| cache.load(&key)) {
            info!(key = %key, "using cached normalized document");
            return Ok(Prepared {
                document,
                format,
                cache_hit: true,
                parse_time: parse_started.elapsed(),
                convert_time: Duration::ZERO,
            });
        }

        let parsed = parse_content(&content, format)?;
        info!(endpoints = parsed.endpoint_count(), "document parsed");
        let value = parsed.into_value()?;
        let parse_time = parse_started.elapsed();

        info!("[2/3] converting to OpenAPI");
        let (document, convert_time) = timed(|| normalize(value));

        match &self.cache {
            Some(cache) if is_cacheable(&document) => {
                cache.store(&key, &document);
            }
            Some(_) => debug!("document is not a valid OpenAPI document, not caching"),
            None => {}
        }

        Ok(Prepared {
            document,
            format,
            cache_hit: false,
            parse_time,
            convert_time,
        })
    }

    /// Output directory of a run
    ///
    /// An explicit service name is used as is. Otherwise the document title
    /// is lowercased with spaces replaced by `_`; without a title the
    /// configured output directory itself is used.
    pub fn output_dir_for(&self, document: &Document, service_name: Option<&str>) -> PathBuf {
        let base = &self.config.output_dir;
        if let Some(name) = service_name.filter(|n| !n.trim().is_empty()) {
            return base.join(name);
        }
        match document.title() {
            Some(title) => {
                let folder = folder_name(title);
                info!(folder = %folder, "using API title as service name");
                base.join(folder)
            }
            None => base.clone(),
        }
    }
}

/// Cache key of loaded content
///
/// Structured formats are keyed by their sorted-key JSON form so that
/// formatting and key order do not matter; everything else by its text.
fn cache_key(content: &str, format: FormatTag) -> String {
    let scope = format.as_str();
    match format {
        FormatTag::OpenApi | FormatTag::Swagger => match load_structured(content) {
            Ok(value) => DocumentCache::key_for_value(scope, &value),
            Err(_) => DocumentCache::key_for_text(scope, content),
        },
        _ => DocumentCache::key_for_text(scope, content),
    }
}

fn folder_name(title: &str) -> String {
    title
        .trim()
        .to_lowercase()
        .chars()
        .map(|c| match c {
            ' ' | '/' | '\\' => '_',
            c => c,
        })
        .collect()
}

/// Keep an undecipherable document next to where the service would have gone
fn write_deferred(document: &Document, output_dir: &Path) -> Result<PathBuf> {
    fs::create_dir_all(output_dir)?;
    let path = output_dir.join(TODO_FILE);
    fs::write(&path, document.to_pretty_json()?)?;
    warn!(path = %path.display(), "unrecognized input deferred for manual processing");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_folder_name() {
        assert_eq!(folder_name("Swagger Petstore"), "swagger_petstore");
        assert_eq!(folder_name(" Pets/Owners API "), "pets_owners_api");
    }

    #[test]
    fn test_structured_cache_key_ignores_formatting() {
        let json = r#"{"openapi": "3.0.0", "info": {"title": "t", "version": "1"}, "paths": {}}"#;
        let yaml = "paths: {}\ninfo:\n  version: '1'\n  title: t\nopenapi: 3.0.0\n";
        assert_eq!(
            cache_key(json, FormatTag::OpenApi),
            cache_key(yaml, FormatTag::OpenApi)
        );
        assert_ne!(
            cache_key(json, FormatTag::OpenApi),
            cache_key(json, FormatTag::Swagger)
        );
    }

    #[test]
    fn test_text_cache_key() {
        assert_eq!(
            cache_key("# API", FormatTag::Markdown),
            cache_key("# API", FormatTag::Markdown)
        );
        assert_ne!(
            cache_key("# API", FormatTag::Markdown),
            cache_key("# API ", FormatTag::Markdown)
        );
    }
}
