//! news-digest — binary entrypoint.
//! Runs the pipeline once: fetch feeds, gate and score items, condense the
//! survivors and write the daily digest files. Scheduling is external
//! (cron or similar); there is no daemon mode.

use std::sync::Arc;

use news_digest::config::DigestConfig;
use news_digest::extract::HttpPageFetcher;
use news_digest::feedback::FeedbackStore;
use news_digest::ingest::types::FeedSource;
use news_digest::ingest::rss::RssSource;
use news_digest::pipeline::{self, PipelineServices};
use news_digest::render;
use news_digest::services::{HttpClassifier, HttpSummarizer, HttpTranslator};

use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env in local/dev; no-op elsewhere.
    let _ = dotenvy::dotenv();
    init_tracing();

    let cfg = DigestConfig::load()?;
    info!(feeds = cfg.feeds.len(), threshold = cfg.relevance.threshold, "starting digest run");

    // Service construction is the only place an unrecoverable failure can
    // happen; everything after this degrades per item.
    let feed_client = reqwest::Client::new();
    let services = PipelineServices {
        pages: Arc::new(HttpPageFetcher::new()?),
        classifier: Arc::new(HttpClassifier::from_config(&cfg.services)?),
        translator: Arc::new(HttpTranslator::from_config(&cfg.services)?),
        summarizer: Arc::new(HttpSummarizer::from_config(&cfg.services)?),
    };
    let mut feedback = FeedbackStore::load(&cfg.feedback.path);

    let sources: Vec<Box<dyn FeedSource>> = cfg
        .feeds
        .iter()
        .map(|url| {
            Box::new(RssSource::from_url(url.as_str(), feed_client.clone())) as Box<dyn FeedSource>
        })
        .collect();

    let run = pipeline::run_digest(&cfg, sources, &services, &mut feedback).await;
    info!(
        fetched = run.stats.fetched,
        accepted = run.stats.accepted,
        rejected = run.stats.rejected_total(),
        "digest run finished"
    );

    if run.articles.is_empty() {
        info!("no relevant articles found, nothing written");
        return Ok(());
    }

    let (md, html) = render::write_digest(&cfg.output.dir, &run.articles)?;
    println!("Digest written: {} and {}", md.display(), html.display());
    Ok(())
}
