//! Ordered extraction heuristics over a parsed HTML page

use super::patterns::{
    command_arguments, find_method, find_path, is_command, list_parameter, path_parameters,
};
use apidoc_mcp_common::{HttpMethod, RawOperation};
use scraper::{ElementRef, Html, Selector};
use tracing::debug;

/// One structural heuristic
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// `<pre>` and `<code>` blocks, line by line
    CodeBlocks,
    /// Table rows naming a method and a path
    Tables,
    /// `h2`–`h4` headings plus the siblings that follow them
    Headings,
    /// Dedicated endpoint containers
    Containers,
}

impl Strategy {
    /// Order in which strategies run; all of them run
    pub const ORDER: [Strategy; 4] = [
        Strategy::CodeBlocks,
        Strategy::Tables,
        Strategy::Headings,
        Strategy::Containers,
    ];

    fn selectors(&self) -> &'static [&'static str] {
        match self {
            Strategy::CodeBlocks => &["pre", "code"],
            Strategy::Tables => &["table"],
            Strategy::Headings => &["h2", "h3", "h4"],
            Strategy::Containers => &["div.endpoint", "section.api", "article.endpoint"],
        }
    }

    /// Run the heuristic over the page
    ///
    /// Elements inside an element that already produced operations are
    /// skipped; elements that produce operations are added to `processed`.
    pub fn apply<'a>(
        &self,
        page: &'a Html,
        processed: &mut Vec<ElementRef<'a>>,
    ) -> Vec<RawOperation> {
        let mut operations = Vec::new();

        for selector in self.selectors() {
            let Ok(selector) = Selector::parse(selector) else {
                continue;
            };
            for element in page.select(&selector) {
                if is_processed(&element, processed) {
                    continue;
                }
                let found = match self {
                    Strategy::CodeBlocks => code_block(&element),
                    Strategy::Tables => table(&element),
                    Strategy::Headings => heading_section(&element),
                    Strategy::Containers => container(&element),
                };
                if !found.is_empty() {
                    debug!(
                        strategy = ?self,
                        element = element.value().name(),
                        operations = found.len(),
                        "extracted operations"
                    );
                    processed.push(element);
                    operations.extend(found);
                }
            }
        }

        operations
    }
}

/// True when the element or one of its ancestors already produced operations
fn is_processed(element: &ElementRef<'_>, processed: &[ElementRef<'_>]) -> bool {
    processed.iter().any(|done| {
        done.id() == element.id() || element.ancestors().any(|a| a.id() == done.id())
    })
}

/// Trimmed, non-empty text nodes joined by `separator`
pub(crate) fn element_text(element: &ElementRef<'_>, separator: &str) -> String {
    element
        .text()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(separator)
}

fn previous_element<'a>(element: &ElementRef<'a>) -> Option<ElementRef<'a>> {
    element.prev_siblings().find_map(ElementRef::wrap)
}

fn next_element<'a>(element: &ElementRef<'a>) -> Option<ElementRef<'a>> {
    element.next_siblings().find_map(ElementRef::wrap)
}

/// `<p>` text directly before and after the element
fn neighbour_description(element: &ElementRef<'_>) -> String {
    let mut parts = Vec::new();
    if let Some(prev) = previous_element(element).filter(|e| e.value().name() == "p") {
        parts.push(element_text(&prev, ""));
    }
    if let Some(next) = next_element(element).filter(|e| e.value().name() == "p") {
        parts.push(element_text(&next, ""));
    }
    parts.join("\n")
}

fn http_operation(path: String, method: HttpMethod, description: String) -> RawOperation {
    let mut operation = RawOperation::http(Some(path.clone()), Some(method));
    operation.description = description;
    operation.parameters = path_parameters(&path);
    operation
}

fn code_block(element: &ElementRef<'_>) -> Vec<RawOperation> {
    let text = element_text(element, "\n");
    let mut operations = Vec::new();

    for line in text.lines().map(str::trim).filter(|l| !l.is_empty()) {
        let method = find_method(line);

        if is_command(line) {
            let mut operation = RawOperation::cmd(line);
            operation.description = neighbour_description(element);
            operation.parameters = command_arguments(line);
            operations.push(operation);
        } else if let Some(path) = find_path(line) {
            operations.push(http_operation(
                path,
                method.unwrap_or(HttpMethod::Get),
                neighbour_description(element),
            ));
        } else if let Some(method) = method {
            let mut operation = RawOperation::http(None, Some(method));
            let preview: String = line.chars().take(50).collect();
            operation.description =
                format!("Found method '{}' in code block: {}...", method.as_str(), preview);
            operations.push(operation);
        }
    }

    operations
}

fn table(element: &ElementRef<'_>) -> Vec<RawOperation> {
    let Ok(row_selector) = Selector::parse("tr") else {
        return Vec::new();
    };

    element
        .select(&row_selector)
        .filter_map(|row| {
            let cells: Vec<String> = row
                .children()
                .filter_map(ElementRef::wrap)
                .map(|cell| element_text(&cell, " "))
                .collect();
            let text = cells.join(" | ");
            let method = find_method(&text)?;
            let path = find_path(&text)?;
            let description = cells
                .iter()
                .filter(|c| find_method(c).is_none() && find_path(c).is_none())
                .cloned()
                .collect::<Vec<_>>()
                .join(" ");
            Some(http_operation(path, method, description))
        })
        .collect()
}

fn heading_section(element: &ElementRef<'_>) -> Vec<RawOperation> {
    let heading = element_text(element, "");
    let path = find_path(&heading);
    let command = is_command(&heading);
    if path.is_none() && !command {
        return Vec::new();
    }

    let mut description_parts = Vec::new();
    let mut list_parameters = Vec::new();

    for sibling in element.next_siblings().filter_map(ElementRef::wrap) {
        match sibling.value().name() {
            "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => break,
            "p" => description_parts.push(element_text(&sibling, "")),
            "ul" | "ol" => {
                let Ok(item_selector) = Selector::parse("li") else {
                    continue;
                };
                for item in sibling.select(&item_selector) {
                    let text = element_text(&item, "");
                    match list_parameter(&text) {
                        Some(param) => list_parameters.push(param),
                        None => description_parts.push(text),
                    }
                }
            }
            "pre" | "code" => {
                description_parts.push(format!("Example:\n{}", element_text(&sibling, "")))
            }
            _ => {}
        }
    }
    let description = description_parts.join("\n").trim().to_string();

    let mut operation = if command {
        let mut operation = RawOperation::cmd(heading.as_str());
        operation.description = description;
        operation.parameters = command_arguments(&heading);
        operation
    } else {
        let Some(path) = path else {
            return Vec::new();
        };
        let method = find_method(&heading).unwrap_or(HttpMethod::Get);
        http_operation(path, method, description)
    };
    operation.parameters.extend(list_parameters);

    vec![operation]
}

fn container(element: &ElementRef<'_>) -> Vec<RawOperation> {
    let text = element_text(element, " ");
    match (find_method(&text), find_path(&text)) {
        (Some(method), Some(path)) => vec![http_operation(path, method, text)],
        _ => Vec::new(),
    }
}
