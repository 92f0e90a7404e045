//! Web search tool using the DuckDuckGo HTML endpoint.

use std::time::Duration;

use async_trait::async_trait;
use outreach_core::{collapse_whitespace, truncate_chars};
use regex::Regex;
use serde_json::json;
use tracing::debug;
use url::Url;

use crate::error::ToolError;
use crate::tool::{Tool, ToolArgs, ToolResult};

const SEARCH_ENDPOINT: &str = "https://html.duckduckgo.com/html/";

// Wide enough that html2text never wraps a snippet or link.
const RENDER_WIDTH: usize = 10_000;

/// Maximum snippet length in characters.
pub const MAX_SNIPPET_CHARS: usize = 280;

/// First organic result of a search page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchHit {
    pub link: String,
    pub snippet: String,
}

/// Extracts the first result link and snippet from a results page.
pub struct ResultParser {
    link: Regex,
    snippet_link: Regex,
    snippet_block: Regex,
    tags: Regex,
}

impl ResultParser {
    pub fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            link: Regex::new(r#"<a[^>]+class="result__a"[^>]+href="([^"]+)""#)?,
            snippet_link: Regex::new(r#"(?s)<a[^>]+class="result__snippet"[^>]*>(.*?)</a>"#)?,
            snippet_block: Regex::new(r#"(?s)<div[^>]+class="result__snippet"[^>]*>(.*?)</div>"#)?,
            tags: Regex::new(r"<[^>]+>")?,
        })
    }

    /// Parse a results page. Missing pieces come back empty.
    pub fn parse(&self, html: &str) -> SearchHit {
        let link = self
            .link
            .captures(html)
            .and_then(|caps| caps.get(1))
            .map(|m| resolve_result_link(&html_text(m.as_str())))
            .unwrap_or_default();

        let snippet = self
            .snippet_link
            .captures(html)
            .or_else(|| self.snippet_block.captures(html))
            .and_then(|caps| caps.get(1))
            .map(|m| {
                let text = self.tags.replace_all(m.as_str(), " ");
                truncate_chars(&html_text(&text), MAX_SNIPPET_CHARS)
            })
            .unwrap_or_default();

        SearchHit { link, snippet }
    }
}

/// Unwrap DuckDuckGo redirect links (`//duckduckgo.com/l/?uddg=...`).
fn resolve_result_link(raw: &str) -> String {
    let absolute = if raw.starts_with("//") {
        format!("https:{}", raw)
    } else {
        raw.to_string()
    };

    Url::parse(&absolute)
        .ok()
        .and_then(|url| {
            url.query_pairs()
                .find(|(key, _)| key == "uddg")
                .map(|(_, target)| target.into_owned())
        })
        .unwrap_or(absolute)
}

/// Decode entities in a tag-free fragment and collapse its whitespace.
fn html_text(fragment: &str) -> String {
    let decoded = match html2text::from_read(fragment.as_bytes(), RENDER_WIDTH) {
        Ok(text) => text,
        Err(e) => {
            debug!("HTML decoding failed, keeping raw text: {}", e);
            fragment.to_string()
        }
    };
    collapse_whitespace(&decoded)
}

/// Searches the web and returns the first result.
///
/// # Parameters
///
/// - `query` (required)
///
/// Returns `{query, snippet, link}`.
pub struct WebSearch {
    client: reqwest::Client,
    parser: ResultParser,
}

impl WebSearch {
    /// Create a new web search tool.
    pub fn new() -> Result<Self, ToolError> {
        let client = reqwest::Client::builder()
            .user_agent("Mozilla/5.0")
            .timeout(Duration::from_secs(8))
            .build()?;
        let parser = ResultParser::new()
            .map_err(|e| ToolError::Configuration(format!("Invalid result pattern: {}", e)))?;
        Ok(Self { client, parser })
    }

    async fn fetch(&self, query: &str) -> Result<String, ToolError> {
        let url = Url::parse_with_params(SEARCH_ENDPOINT, &[("q", query)]).map_err(|e| {
            ToolError::InvalidParameter {
                name: "query".to_string(),
                reason: e.to_string(),
            }
        })?;
        debug!("Searching: {}", url);

        let response = self.client.get(url).send().await?;
        if !response.status().is_success() {
            return Err(ToolError::ExecutionFailed(format!(
                "Search returned status {}",
                response.status()
            )));
        }
        Ok(response.text().await?)
    }
}

#[async_trait]
impl Tool for WebSearch {
    fn name(&self) -> &str {
        "web_search"
    }

    fn description(&self) -> &str {
        "Searches the web and returns the first result link and snippet."
    }

    async fn run(&self, args: ToolArgs) -> Result<ToolResult, ToolError> {
        let query = args
            .get_string_opt("query")
            .ok_or_else(|| ToolError::MissingParameter("query".to_string()))?;

        match self.fetch(&query).await {
            Ok(html) => {
                let hit = self.parser.parse(&html);
                Ok(ToolResult::success(
                    self.name(),
                    json!({"query": query, "snippet": hit.snippet, "link": hit.link}),
                ))
            }
            Err(e) => Ok(ToolResult::failure(
                self.name(),
                json!({"query": query}),
                e.to_string(),
            )),
        }
    }
}
