// src/extract.rs
//! Article body retrieval and readable-text extraction.
//!
//! The gate works on the concatenated text of paragraph-level nodes; markup,
//! scripts and navigation never reach the classifier. Fetching sits behind a
//! trait so the pipeline can be driven by canned HTML in tests.

use anyhow::{Context, Result};
use async_trait::async_trait;
use once_cell::sync::OnceCell;
use scraper::{Html, Selector};
use std::time::Duration;

/// Per-page fetch timeout. One-shot; there are no retries anywhere.
pub const PAGE_FETCH_TIMEOUT: Duration = Duration::from_secs(10);

#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch_page(&self, url: &str) -> Result<String>;
}

pub struct HttpPageFetcher {
    http: reqwest::Client,
}

impl HttpPageFetcher {
    pub fn new() -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent("news-digest/0.1")
            .connect_timeout(Duration::from_secs(4))
            .timeout(PAGE_FETCH_TIMEOUT)
            .build()
            .context("building page fetch client")?;
        Ok(Self { http })
    }
}

#[async_trait]
impl PageFetcher for HttpPageFetcher {
    async fn fetch_page(&self, url: &str) -> Result<String> {
        let resp = self
            .http
            .get(url)
            .send()
            .await
            .with_context(|| format!("page get {url}"))?
            .error_for_status()
            .with_context(|| format!("page status {url}"))?;
        resp.text().await.context("page .text()")
    }
}

/// Concatenate the text of all `<p>` elements, whitespace-collapsed.
pub fn extract_paragraph_text(html: &str) -> String {
    let document = Html::parse_document(html);
    static P: OnceCell<Selector> = OnceCell::new();
    let selector = P.get_or_init(|| Selector::parse("p").expect("p selector"));

    let mut parts = Vec::new();
    for p in document.select(selector) {
        let text = p.text().collect::<Vec<_>>().join("");
        let text = collapse_whitespace(&text);
        if !text.is_empty() {
            parts.push(text);
        }
    }
    parts.join(" ")
}

/// Case-insensitive substring scan against the configured denylist; returns
/// the first matching marker.
pub fn find_boilerplate<'a>(content: &str, markers: &'a [String]) -> Option<&'a str> {
    let haystack = content.to_lowercase();
    markers
        .iter()
        .find(|m| !m.is_empty() && haystack.contains(&m.to_lowercase()))
        .map(|m| m.as_str())
}

/// Truncate to at most `max` characters, on a char boundary.
pub fn truncate_chars(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

fn collapse_whitespace(s: &str) -> String {
    static RE_WS: OnceCell<regex::Regex> = OnceCell::new();
    let re_ws = RE_WS.get_or_init(|| regex::Regex::new(r"\s+").unwrap());
    re_ws.replace_all(s.trim(), " ").to_string()
}
