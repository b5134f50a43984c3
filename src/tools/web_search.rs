//! Web search over DuckDuckGo's HTML endpoint.
//!
//! No API key is needed. The tool never fails on a well-formed call: transport
//! errors, bad statuses, timeouts and empty pages all come back as text the
//! oracle can read.

use std::sync::OnceLock;
use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;
use reqwest::header::USER_AGENT;
use serde::Serialize;
use thiserror::Error;
use tracing::debug;

use super::arguments::ToolArguments;
use super::tool::Tool;
use super::types::{ToolDescriptor, ToolParameters};
use crate::error::ToolError;
use crate::util::timeout::with_timeout;

pub const WEB_SEARCH_TOOL_NAME: &str = "web_search";
pub const DEFAULT_MAX_RESULTS: usize = 5;
pub const DEFAULT_SEARCH_TIMEOUT: Duration = Duration::from_secs(10);

const DEFAULT_ENDPOINT: &str = "https://html.duckduckgo.com/html/";
const BROWSER_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

/// One parsed search result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchHit {
    pub title: String,
    pub url: String,
    pub snippet: String,
}

#[derive(Debug, Error)]
enum SearchFailure {
    #[error("request timed out after {}ms", .0.as_millis())]
    Timeout(Duration),
    #[error("search endpoint returned status {0}")]
    Status(u16),
    #[error("{0}")]
    Transport(#[from] reqwest::Error),
}

/// The `web_search` tool.
pub struct WebSearchTool {
    descriptor: ToolDescriptor,
    client: reqwest::Client,
    endpoint: String,
    max_results: usize,
    timeout: Duration,
}

impl Default for WebSearchTool {
    fn default() -> Self {
        Self::new()
    }
}

impl WebSearchTool {
    pub fn new() -> Self {
        Self {
            descriptor: ToolDescriptor::new(
                WEB_SEARCH_TOOL_NAME,
                "Search the web for information. Returns titles, snippets, and URLs of search results.",
                ToolParameters::object()
                    .string("query", "The search query to look up", true)
                    .build(),
            ),
            client: reqwest::Client::new(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            max_results: DEFAULT_MAX_RESULTS,
            timeout: DEFAULT_SEARCH_TIMEOUT,
        }
    }

    /// Point the tool at a different HTML search endpoint.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn with_max_results(mut self, max_results: usize) -> Self {
        self.max_results = max_results.max(1);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn max_results(&self) -> usize {
        self.max_results
    }

    /// Run a search and render the outcome as text. Never fails.
    pub async fn search_text(&self, query: &str) -> String {
        let query = query.trim();
        if query.is_empty() {
            return no_results(query);
        }

        match self.search(query).await {
            Ok(hits) if hits.is_empty() => no_results(query),
            Ok(hits) => format_results(query, &hits),
            Err(err) => {
                debug!(query, error = %err, "web search failed");
                format!("Error performing search: {err}")
            }
        }
    }

    async fn search(&self, query: &str) -> Result<Vec<SearchHit>, SearchFailure> {
        let html = with_timeout(self.timeout, self.fetch(query), SearchFailure::Timeout).await?;
        Ok(parse_results(&html, self.max_results))
    }

    async fn fetch(&self, query: &str) -> Result<String, SearchFailure> {
        let response = self
            .client
            .post(&self.endpoint)
            .header(USER_AGENT, BROWSER_USER_AGENT)
            .form(&[("q", query)])
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(SearchFailure::Status(status.as_u16()));
        }
        Ok(response.text().await?)
    }
}

#[async_trait]
impl Tool for WebSearchTool {
    fn descriptor(&self) -> &ToolDescriptor {
        &self.descriptor
    }

    async fn execute(&self, args: &ToolArguments) -> Result<String, ToolError> {
        let query = args.get_str("query")?;
        Ok(self.search_text(query).await)
    }
}

fn no_results(query: &str) -> String {
    format!("No results found for query: {query}")
}

/// Render hits as the numbered text block handed to the oracle.
pub fn format_results(query: &str, hits: &[SearchHit]) -> String {
    let mut out = format!("Search results for '{query}':\n\n");
    for (i, hit) in hits.iter().enumerate() {
        out.push_str(&format!(
            "{}. {}\n   {}\n   URL: {}\n\n",
            i + 1,
            hit.title,
            hit.snippet,
            hit.url
        ));
    }
    out.trim().to_string()
}

fn anchor_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"(?s)<a\s([^>]*class="[^"]*\bresult__a\b[^"]*"[^>]*)>(.*?)</a>"#)
            .expect("anchor pattern is valid")
    })
}

fn href_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"href="([^"]*)""#).expect("href pattern is valid"))
}

fn snippet_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"(?s)class="[^"]*\bresult__snippet\b[^"]*"[^>]*>(.*?)</(?:a|div|td)>"#)
            .expect("snippet pattern is valid")
    })
}

fn tag_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"<[^>]*>").expect("tag pattern is valid"))
}

/// Extract up to `limit` results from a DuckDuckGo HTML results page.
pub fn parse_results(html: &str, limit: usize) -> Vec<SearchHit> {
    let anchors: Vec<_> = anchor_re().captures_iter(html).collect();
    let mut hits = Vec::new();

    for (i, caps) in anchors.iter().enumerate() {
        if hits.len() >= limit {
            break;
        }
        let (Some(whole), Some(attrs), Some(inner)) = (caps.get(0), caps.get(1), caps.get(2)) else {
            continue;
        };

        let title = clean_text(inner.as_str());
        if title.is_empty() {
            continue;
        }

        let url = href_re()
            .captures(attrs.as_str())
            .and_then(|c| c.get(1))
            .map(|m| resolve_url(m.as_str()))
            .unwrap_or_default();

        // The snippet lives between this anchor and the next one.
        let tail_end = anchors
            .get(i + 1)
            .and_then(|next| next.get(0))
            .map(|m| m.start())
            .unwrap_or(html.len());
        let snippet = snippet_re()
            .captures(&html[whole.end()..tail_end])
            .and_then(|c| c.get(1))
            .map(|m| clean_text(m.as_str()))
            .unwrap_or_default();

        hits.push(SearchHit { title, url, snippet });
    }

    hits
}

fn clean_text(fragment: &str) -> String {
    let stripped = tag_re().replace_all(fragment, "");
    decode_entities(&stripped)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn numeric_entity_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"&#(?:[xX]([0-9a-fA-F]{1,6})|([0-9]{1,7}));").expect("entity pattern is valid")
    })
}

fn decode_entities(s: &str) -> String {
    let named = s
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&nbsp;", " ");
    // `&amp;` goes last so `&amp;#39;` stays literal text.
    numeric_entity_re()
        .replace_all(&named, |caps: &regex::Captures<'_>| {
            let code = match (caps.get(1), caps.get(2)) {
                (Some(hex), _) => u32::from_str_radix(hex.as_str(), 16).ok(),
                (_, Some(dec)) => dec.as_str().parse().ok(),
                _ => None,
            };
            code.and_then(char::from_u32)
                .map(String::from)
                .unwrap_or_else(|| caps[0].to_string())
        })
        .replace("&amp;", "&")
}

/// Unwrap DuckDuckGo redirect links (`//duckduckgo.com/l/?uddg=<encoded>&rut=..`).
fn resolve_url(href: &str) -> String {
    let href = decode_entities(href);
    if let Some((_, rest)) = href.split_once("uddg=") {
        let encoded = rest.split('&').next().unwrap_or(rest);
        if let Ok(decoded) = urlencoding::decode(encoded) {
            return decoded.into_owned();
        }
    }
    match href.strip_prefix("//") {
        Some(rest) => format!("https://{rest}"),
        None => href,
    }
}
