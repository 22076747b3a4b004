//! Web fetch tool.
//!
//! Fetches a URL and hands the model clean text extracted from the HTML.
//! Works for static pages; JavaScript-rendered content comes back empty.
//! Every network-level problem (timeout, connect error, non-2xx status) is
//! reported in the output text so the model can explain or retry.

use std::time::Duration;

use async_trait::async_trait;
use plume_core::error::ToolError;
use plume_core::tool::{Tool, ToolResult};
use scraper::{ElementRef, Html, Node, Selector};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::debug;

/// Default request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Default extracted-text budget in characters.
pub const DEFAULT_CHAR_BUDGET: usize = 8000;

/// Elements whose text is never worth forwarding to the model.
const NOISE_TAGS: &[&str] = &[
    "script", "style", "nav", "header", "footer", "noscript", "svg", "iframe",
];

#[derive(Debug, Deserialize)]
struct WebFetchArgs {
    url: String,
}

pub struct WebFetchTool {
    client: reqwest::Client,
    timeout: Duration,
    char_budget: usize,
}

impl WebFetchTool {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
            timeout: DEFAULT_TIMEOUT,
            char_budget: DEFAULT_CHAR_BUDGET,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_char_budget(mut self, budget: usize) -> Self {
        self.char_budget = budget.max(1);
        self
    }
}

impl Default for WebFetchTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Tool for WebFetchTool {
    fn name(&self) -> &str {
        "web_fetch"
    }

    fn description(&self) -> &str {
        "Fetch a web page and return its readable text. Works best with \
         static content such as articles, documentation, and wikis. Pages \
         that require JavaScript to render will come back empty."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "url": {
                    "type": "string",
                    "description": "The URL to fetch"
                }
            },
            "required": ["url"]
        })
    }

    async fn execute(&self, arguments: Value) -> Result<ToolResult, ToolError> {
        let args: WebFetchArgs = serde_json::from_value(arguments)
            .map_err(|e| ToolError::InvalidArguments(e.to_string()))?;

        let response = match self
            .client
            .get(&args.url)
            .timeout(self.timeout)
            .header("User-Agent", "Mozilla/5.0 (compatible; PlumeAgent/1.0)")
            .send()
            .await
        {
            Ok(r) => r,
            Err(e) => {
                return Ok(ToolResult::failure(format!(
                    "Error: Failed to fetch the page at {}: {}",
                    args.url, e
                )));
            }
        };

        let status = response.status();
        if !status.is_success() {
            return Ok(ToolResult::failure(format!(
                "Error: Failed to fetch the page at {}: HTTP {}",
                args.url, status
            )));
        }

        let html = match response.text().await {
            Ok(t) => t,
            Err(e) => {
                return Ok(ToolResult::failure(format!(
                    "Error: Failed to fetch the page at {}: could not read the body ({})",
                    args.url, e
                )));
            }
        };

        let mut content = extract_text(&html);
        debug!(url = %args.url, chars = content.len(), "Extracted page text");

        if content.chars().count() > self.char_budget {
            content = content.chars().take(self.char_budget).collect();
            content.push_str("\n\n[Content truncated]");
        }

        if content.is_empty() {
            return Ok(ToolResult::failure(format!(
                "No readable text found at {}. The page may require JavaScript to render.",
                args.url
            )));
        }

        Ok(ToolResult::ok(content))
    }
}

/// Extract readable text from an HTML document, skipping noise elements and
/// separating block-level elements with newlines.
fn extract_text(html: &str) -> String {
    let document = Html::parse_document(html);
    let root = Selector::parse("body")
        .ok()
        .and_then(|sel| document.select(&sel).next())
        .unwrap_or_else(|| document.root_element());

    let mut raw = String::new();
    collect_text(&root, &mut raw);
    collapse_newlines(&raw)
}

fn collect_text(element: &ElementRef, out: &mut String) {
    for child in element.children() {
        match child.value() {
            Node::Text(text) => {
                let trimmed = text.trim();
                if !trimmed.is_empty() {
                    out.push_str(trimmed);
                    out.push(' ');
                }
            }
            Node::Element(el) => {
                if NOISE_TAGS.contains(&el.name()) {
                    continue;
                }
                if let Some(child_ref) = ElementRef::wrap(child) {
                    let is_block = matches!(
                        el.name(),
                        "p" | "div"
                            | "h1"
                            | "h2"
                            | "h3"
                            | "h4"
                            | "h5"
                            | "h6"
                            | "li"
                            | "br"
                            | "tr"
                            | "blockquote"
                            | "pre"
                            | "section"
                            | "article"
                            | "table"
                    );
                    if is_block {
                        out.push('\n');
                    }
                    collect_text(&child_ref, out);
                    if is_block {
                        out.push('\n');
                    }
                }
            }
            _ => {}
        }
    }
}

/// Cap runs of newlines at two and trim the ends.
fn collapse_newlines(text: &str) -> String {
    let mut cleaned = String::with_capacity(text.len());
    let mut run = 0;
    for ch in text.chars() {
        if ch == '\n' {
            run += 1;
            if run <= 2 {
                cleaned.push(ch);
            }
        } else {
            run = 0;
            cleaned.push(ch);
        }
    }
    cleaned.trim().to_string()
}
