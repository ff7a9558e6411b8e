//! API documentation parsing for apidoc-mcp
//!
//! This crate turns raw documentation into canonical endpoint lists.
//!
//! ## Formats
//!
//! - **OpenAPI 3.x** and **Swagger 2.0**: JSON or YAML, walked path × method
//! - **Markdown**: headings, parameter tables and fenced examples
//! - **HTML / crawler**: best-effort heuristics over the DOM
//!
//! `FormatSniffer` guesses the format of a path or URL; `parse_document`
//! loads the content, runs the matching parser and falls back to the
//! crawler once when a structured parse fails or finds nothing.

pub mod crawler;
pub mod markdown;
pub mod openapi;
mod sniffer;
mod structured;

pub use crawler::{CrawlResult, CrawlerParser};
pub use markdown::MarkdownParser;
pub use openapi::{OpenApiParser, SwaggerParser};
pub use sniffer::{classify_structured, FormatSniffer};
pub use structured::{load_mapping, load_structured};

use apidoc_mcp_common::{ApiDescription, ContentLoader, FormatTag, Result};
use serde_json::Value;
use tracing::{info, warn};

const CRAWLED_TITLE: &str = "Crawled API";
const CRAWLED_VERSION: &str = "1.0.0";

/// Result of running a parser variant
#[derive(Debug, Clone, PartialEq)]
pub enum ParseOutput {
    /// Canonical endpoint list (structured and Markdown parsers)
    Description(ApiDescription),
    /// Loosely typed operation guesses (crawler)
    Operations(CrawlResult),
}

impl ParseOutput {
    /// True when nothing usable was found
    pub fn is_empty(&self) -> bool {
        match self {
            ParseOutput::Description(description) => description.endpoints.is_empty(),
            ParseOutput::Operations(result) => result.promotable() == 0,
        }
    }

    pub fn endpoint_count(&self) -> usize {
        match self {
            ParseOutput::Description(description) => description.endpoints.len(),
            ParseOutput::Operations(result) => result.promotable(),
        }
    }

    /// Structured form handed to the normalizer
    ///
    /// A description becomes the canonical `{title, version, endpoints}`
    /// mapping. Crawled operations are promoted to endpoints when they have
    /// a path and a method; when none do, the raw operation list is returned
    /// as-is so the normalizer defers it.
    pub fn into_value(self) -> Result<Value> {
        match self {
            ParseOutput::Description(description) => Ok(serde_json::to_value(description)?),
            ParseOutput::Operations(result) => {
                let endpoints: Vec<_> = result
                    .operations
                    .iter()
                    .filter_map(|op| op.to_endpoint())
                    .collect();
                if endpoints.is_empty() {
                    return Ok(serde_json::to_value(result.operations)?);
                }
                let description = ApiDescription {
                    title: result.title.unwrap_or_else(|| CRAWLED_TITLE.to_string()),
                    description: String::new(),
                    version: CRAWLED_VERSION.to_string(),
                    servers: Vec::new(),
                    endpoints,
                };
                Ok(serde_json::to_value(description)?)
            }
        }
    }
}

/// Closed set of parser variants
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentParser {
    OpenApi,
    Swagger,
    Markdown,
    Crawler,
}

impl DocumentParser {
    /// Static mapping from a format tag to its parser; HTML goes to the crawler
    pub fn for_format(tag: FormatTag) -> Self {
        match tag {
            FormatTag::OpenApi => DocumentParser::OpenApi,
            FormatTag::Swagger => DocumentParser::Swagger,
            FormatTag::Markdown => DocumentParser::Markdown,
            FormatTag::Html | FormatTag::Crawler => DocumentParser::Crawler,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            DocumentParser::OpenApi => "openapi",
            DocumentParser::Swagger => "swagger",
            DocumentParser::Markdown => "markdown",
            DocumentParser::Crawler => "crawler",
        }
    }

    /// Parse already-loaded content
    pub fn parse(&self, content: &str) -> Result<ParseOutput> {
        match self {
            DocumentParser::OpenApi => Ok(ParseOutput::Description(
                OpenApiParser::from_content(content)?.parse()?,
            )),
            DocumentParser::Swagger => Ok(ParseOutput::Description(
                SwaggerParser::from_content(content)?.parse()?,
            )),
            DocumentParser::Markdown => Ok(ParseOutput::Description(
                MarkdownParser::new(content).parse()?,
            )),
            DocumentParser::Crawler => Ok(ParseOutput::Operations(
                CrawlerParser::new(content).parse()?,
            )),
        }
    }
}

/// Parse content with the parser for `tag`, retrying once with the crawler
///
/// The crawler attempt is made when a non-crawler parser fails or finds no
/// endpoints. If the crawler finds nothing usable either, the original
/// error (or the original empty result) stands.
pub fn parse_content(content: &str, tag: FormatTag) -> Result<ParseOutput> {
    let parser = DocumentParser::for_format(tag);
    let first = parser.parse(content);

    if parser == DocumentParser::Crawler {
        return first;
    }

    match &first {
        Ok(output) if !output.is_empty() => return first,
        Ok(_) => warn!(parser = parser.name(), "no endpoints found, trying crawler"),
        Err(e) => warn!(parser = parser.name(), error = %e, "parse failed, trying crawler"),
    }

    let fallback = DocumentParser::Crawler.parse(content)?;
    if fallback.is_empty() {
        info!("crawler fallback found nothing usable");
        return first;
    }
    info!(
        endpoints = fallback.endpoint_count(),
        "crawler fallback recovered endpoints"
    );
    Ok(fallback)
}

/// Load a document through `loader` and parse it
///
/// `format` overrides detection; `None` sniffs the source first.
pub fn parse_document(
    source: &str,
    format: Option<FormatTag>,
    loader: &dyn ContentLoader,
) -> Result<ParseOutput> {
    let tag = format.unwrap_or_else(|| FormatSniffer::new(loader).detect(source));
    info!(source, format = %tag, "parsing document");
    let content = loader.load(source)?;
    parse_content(&content, tag)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_static_dispatch() {
        assert_eq!(DocumentParser::for_format(FormatTag::Html), DocumentParser::Crawler);
        assert_eq!(DocumentParser::for_format(FormatTag::Swagger), DocumentParser::Swagger);
    }

    #[test]
    fn test_malformed_openapi_falls_back_to_crawler() {
        let html = "<pre>GET /status</pre>";
        let output = parse_content(html, FormatTag::OpenApi).unwrap();
        assert!(matches!(output, ParseOutput::Operations(_)));
        assert_eq!(output.endpoint_count(), 1);
    }

    #[test]
    fn test_original_error_stands_when_crawler_finds_nothing() {
        let result = parse_content("{ not json", FormatTag::OpenApi);
        assert!(matches!(result, Err(apidoc_mcp_common::BridgeError::Parse(_))));
    }

    #[test]
    fn test_unpromotable_operations_stay_raw() {
        let html = "<pre>kubectl apply -f deploy.yaml</pre>";
        let output = parse_content(html, FormatTag::Html).unwrap();
        let value = output.into_value().unwrap();
        assert!(value.is_array());
        assert_eq!(value[0]["type"], "cmd");
    }

    #[test]
    fn test_promoted_operations_form_a_description() {
        let html = "<html><head><title>Status</title></head><body><pre>GET /status</pre></body></html>";
        let value = parse_content(html, FormatTag::Html)
            .unwrap()
            .into_value()
            .unwrap();
        assert_eq!(value["title"], "Status");
        assert_eq!(value["endpoints"][0]["path"], "/status");
        assert_eq!(value["endpoints"][0]["method"], "GET");
    }
}
