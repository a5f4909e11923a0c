// src/ingest/types.rs
use anyhow::Result;

/// A feed entry stub: title/link/timestamp only. The article body is fetched
/// in a later stage. Identity is the link URL, stable across runs.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, PartialEq, Eq)]
pub struct FeedItem {
    pub title: String,
    pub link: String,
    /// Unix seconds; None when the feed carries no usable pubDate.
    pub published_at: Option<i64>,
}

#[async_trait::async_trait]
pub trait FeedSource: Send + Sync {
    async fn fetch(&self) -> Result<Vec<FeedItem>>;
    fn name(&self) -> String;
}
