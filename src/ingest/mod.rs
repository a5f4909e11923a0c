// src/ingest/mod.rs
//! Feed fetch stage: every configured source is pulled in its own task and
//! the results are merged after a full join. A source that is unreachable or
//! fails to parse contributes zero entries and a warning, never a failure of
//! the whole stage.

pub mod rss;
pub mod types;

use crate::ingest::types::{FeedItem, FeedSource};
use metrics::{counter, describe_counter, describe_histogram};
use once_cell::sync::OnceCell;
use tokio::task::JoinSet;
use tracing::{info, warn};

/// One-time metrics registration.
fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!(
            "digest_feed_items_total",
            "Feed entry stubs parsed from sources."
        );
        describe_counter!(
            "digest_feed_errors_total",
            "Feed sources that failed to fetch or parse."
        );
        describe_histogram!("digest_feed_parse_ms", "Feed parse time in milliseconds.");
    });
}

/// Fetch all sources concurrently and return the flattened, unordered list
/// of entry stubs. No ordering guarantee across sources.
pub async fn fetch_all(sources: Vec<Box<dyn FeedSource>>) -> Vec<FeedItem> {
    ensure_metrics_described();

    let mut tasks = JoinSet::new();
    for source in sources {
        tasks.spawn(async move {
            let name = source.name();
            (name, source.fetch().await)
        });
    }

    let mut items = Vec::new();
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((name, Ok(mut batch))) => {
                info!(source = %name, count = batch.len(), "feed fetched");
                items.append(&mut batch);
            }
            Ok((name, Err(e))) => {
                warn!(source = %name, error = ?e, "feed source error");
                counter!("digest_feed_errors_total").increment(1);
            }
            Err(e) => {
                warn!(error = ?e, "feed task panicked");
                counter!("digest_feed_errors_total").increment(1);
            }
        }
    }
    items
}
