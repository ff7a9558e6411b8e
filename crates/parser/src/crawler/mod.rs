//! Best-effort extraction from rendered HTML pages
//!
//! The crawler never fails: a page it cannot make sense of yields an empty
//! operation list, which the normalizer later defers as a TODO document.
//!
//! Strategies run in a fixed order (code blocks, tables, headings, generic
//! containers) and their results are concatenated. An element that produced
//! operations is not revisited, nor are its descendants.

mod patterns;
mod strategies;

pub use strategies::Strategy;

use apidoc_mcp_common::{OperationKind, RawOperation, Result};
use scraper::{Html, Selector};
use tracing::{info, warn};

/// Operations guessed from one page
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CrawlResult {
    /// Text of the page `<title>`, if any
    pub title: Option<String>,
    pub operations: Vec<RawOperation>,
}

impl CrawlResult {
    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    /// Number of `http` operations carrying both a path and a method
    pub fn promotable(&self) -> usize {
        self.operations
            .iter()
            .filter(|op| op.kind == OperationKind::Http && op.path.is_some() && op.method.is_some())
            .count()
    }
}

/// HTML page parser
pub struct CrawlerParser {
    page: Html,
}

impl CrawlerParser {
    pub fn new(content: &str) -> Self {
        Self {
            page: Html::parse_document(content),
        }
    }

    /// Run every strategy and collect the operations they find
    pub fn parse(&self) -> Result<CrawlResult> {
        let title = self.title();
        if let Some(ref title) = title {
            info!(title = %title, "crawling page");
        }

        let mut processed = Vec::new();
        let operations: Vec<RawOperation> = Strategy::ORDER
            .iter()
            .flat_map(|strategy| strategy.apply(&self.page, &mut processed))
            .collect();

        if operations.is_empty() {
            warn!("no operations or endpoints recognized on page");
        } else {
            info!(operations = operations.len(), "extracted candidate operations");
        }

        Ok(CrawlResult { title, operations })
    }

    fn title(&self) -> Option<String> {
        let selector = Selector::parse("title").ok()?;
        self.page
            .select(&selector)
            .next()
            .map(|t| strategies::element_text(&t, " "))
            .filter(|t| !t.is_empty())
    }
}
