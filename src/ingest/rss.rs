// src/ingest/rss.rs
//! RSS feed source. Parses `rss/channel/item` with quick-xml into feed entry
//! stubs; the article body is not touched here.

use anyhow::{Context, Result};
use async_trait::async_trait;
use metrics::{counter, histogram};
use quick_xml::de::from_str;
use serde::Deserialize;
use time::{format_description::well_known::Rfc2822, OffsetDateTime, UtcOffset};

use crate::ingest::types::{FeedItem, FeedSource};

#[derive(Debug, Deserialize)]
struct Rss {
    channel: Channel,
}
#[derive(Debug, Deserialize)]
struct Channel {
    #[serde(rename = "item", default)]
    item: Vec<Item>,
}
#[derive(Debug, Deserialize)]
struct Item {
    title: Option<String>,
    link: Option<String>,
    #[serde(rename = "pubDate")]
    pub_date: Option<String>,
}

fn parse_rfc2822_to_unix(ts: &str) -> Option<i64> {
    OffsetDateTime::parse(ts, &Rfc2822)
        .ok()
        .map(|dt| dt.to_offset(UtcOffset::UTC).unix_timestamp())
}

pub struct RssSource {
    mode: Mode,
}

enum Mode {
    Fixture { name: String, xml: String },
    Http { url: String, client: reqwest::Client },
}

impl RssSource {
    pub fn from_url(url: impl Into<String>, client: reqwest::Client) -> Self {
        Self {
            mode: Mode::Http {
                url: url.into(),
                client,
            },
        }
    }

    /// Parse a fixed XML document instead of going over the network. Tests.
    pub fn from_fixture_str(name: impl Into<String>, xml: &str) -> Self {
        Self {
            mode: Mode::Fixture {
                name: name.into(),
                xml: xml.to_string(),
            },
        }
    }

    fn parse_items_from_str(xml: &str) -> Result<Vec<FeedItem>> {
        let t0 = std::time::Instant::now();
        let xml_clean = scrub_html_entities_for_xml(xml);
        let rss: Rss = from_str(&xml_clean).context("parsing rss xml")?;

        let mut out = Vec::with_capacity(rss.channel.item.len());
        for it in rss.channel.item {
            // No link means no identity; such entries are unusable downstream.
            let Some(link) = it.link.filter(|l| !l.trim().is_empty()) else {
                continue;
            };
            out.push(FeedItem {
                title: it.title.unwrap_or_default().trim().to_string(),
                link: link.trim().to_string(),
                published_at: it.pub_date.as_deref().and_then(parse_rfc2822_to_unix),
            });
        }

        let ms = t0.elapsed().as_secs_f64() * 1_000.0;
        histogram!("digest_feed_parse_ms").record(ms);
        counter!("digest_feed_items_total").increment(out.len() as u64);
        Ok(out)
    }
}

#[async_trait]
impl FeedSource for RssSource {
    async fn fetch(&self) -> Result<Vec<FeedItem>> {
        match &self.mode {
            Mode::Fixture { xml, .. } => Self::parse_items_from_str(xml),
            Mode::Http { url, client } => {
                let body = client
                    .get(url)
                    .send()
                    .await
                    .with_context(|| format!("feed http get {url}"))?
                    .text()
                    .await
                    .context("feed http .text()")?;
                Self::parse_items_from_str(&body)
            }
        }
    }

    fn name(&self) -> String {
        match &self.mode {
            Mode::Fixture { name, .. } => name.clone(),
            Mode::Http { url, .. } => url.clone(),
        }
    }
}

fn scrub_html_entities_for_xml(s: &str) -> String {
    s.replace("&nbsp;", " ")
        .replace("&ndash;", "-")
        .replace("&mdash;", "-")
        .replace("&ldquo;", "\"")
        .replace("&rdquo;", "\"")
        .replace("&lsquo;", "'")
        .replace("&rsquo;", "'")
}
