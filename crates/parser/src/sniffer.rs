//! Source format detection
//!
//! Detection never fails. Extension first, then declared version keys for
//! structured files, then the `Content-Type` of a HEAD request for bare
//! URLs; anything undecided is handed to the crawler.

use crate::structured::load_structured;
use apidoc_mcp_common::{is_url, ContentLoader, FormatTag};
use serde_json::Value;
use tracing::debug;

/// Classifies a path or URL into a `FormatTag`
pub struct FormatSniffer<'a> {
    loader: &'a dyn ContentLoader,
}

impl<'a> FormatSniffer<'a> {
    pub fn new(loader: &'a dyn ContentLoader) -> Self {
        Self { loader }
    }

    /// Detect the format of a document
    pub fn detect(&self, source: &str) -> FormatTag {
        let tag = self.detect_inner(source);
        debug!(source, format = %tag, "detected document format");
        tag
    }

    fn detect_inner(&self, source: &str) -> FormatTag {
        let extension = extension_of(source);

        match extension.as_deref() {
            Some("json" | "yaml" | "yml") => return self.inspect_structured(source),
            Some("md" | "markdown") => return FormatTag::Markdown,
            Some("html" | "htm") => return FormatTag::Html,
            _ => {}
        }

        if is_url(source) {
            return self.inspect_remote(source);
        }

        FormatTag::Crawler
    }

    /// Load a structured document and look for `swagger` / `openapi` keys
    ///
    /// Defaults to OpenAPI when loading or parsing fails or neither key
    /// is present.
    fn inspect_structured(&self, source: &str) -> FormatTag {
        match self.loader.load(source) {
            Ok(content) => classify_structured(&content).unwrap_or(FormatTag::OpenApi),
            Err(e) => {
                debug!(source, error = %e, "could not load structured document, assuming OpenAPI");
                FormatTag::OpenApi
            }
        }
    }

    fn inspect_remote(&self, url: &str) -> FormatTag {
        let content_type = match self.loader.content_type(url) {
            Ok(Some(content_type)) => content_type.to_ascii_lowercase(),
            Ok(None) => return FormatTag::Crawler,
            Err(e) => {
                debug!(url, error = %e, "HEAD request failed, falling back to crawler");
                return FormatTag::Crawler;
            }
        };

        if content_type.contains("json") || content_type.contains("yaml") {
            return self.inspect_structured(url);
        }
        if content_type.contains("text/html") {
            return FormatTag::Html;
        }
        if content_type.contains("markdown") {
            return FormatTag::Markdown;
        }
        FormatTag::Crawler
    }
}

/// `swagger: "2.x"` → Swagger, `openapi: "3.x"` → OpenAPI, otherwise undecided
pub fn classify_structured(content: &str) -> Option<FormatTag> {
    let value = load_structured(content).ok()?;
    let version_of = |key: &str| match value.get(key) {
        Some(Value::String(s)) => Some(s.clone()),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    };

    if version_of("swagger").is_some_and(|v| v.starts_with('2')) {
        return Some(FormatTag::Swagger);
    }
    if version_of("openapi").is_some_and(|v| v.starts_with('3')) {
        return Some(FormatTag::OpenApi);
    }
    None
}

/// Lowercased extension of the last path segment, ignoring query and fragment
fn extension_of(source: &str) -> Option<String> {
    let without_query = source.split(['?', '#']).next().unwrap_or(source);
    let last_segment = without_query
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(without_query);
    let (stem, extension) = last_segment.rsplit_once('.')?;
    if stem.is_empty() || extension.is_empty() {
        return None;
    }
    Some(extension.to_ascii_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extension_of() {
        assert_eq!(extension_of("./api/openapi.JSON"), Some("json".to_string()));
        assert_eq!(
            extension_of("https://example.com/spec.yaml?token=abc#top"),
            Some("yaml".to_string())
        );
        assert_eq!(extension_of("https://example.com/docs"), None);
        assert_eq!(extension_of("https://example.com/v1.2/docs"), None);
        assert_eq!(extension_of(".hidden"), None);
    }

    #[test]
    fn test_classify_structured() {
        assert_eq!(
            classify_structured("swagger: '2.0'\ninfo: {title: T}\n"),
            Some(FormatTag::Swagger)
        );
        assert_eq!(
            classify_structured(r#"{"openapi": "3.1.0"}"#),
            Some(FormatTag::OpenApi)
        );
        assert_eq!(classify_structured(r#"{"title": "x"}"#), None);
        assert_eq!(classify_structured("{ broken"), None);
    }
}
