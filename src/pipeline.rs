// src/pipeline.rs
//! The per-item decision sequence: body fetch → content gate → language
//! normalization → feedback-adjusted classification → condensing → ranking.
//!
//! Every stage failure is a one-shot rejection of that single item, carried
//! as a typed outcome so reasons stay inspectable and countable. Nothing an
//! item does can abort the run; the only terminal errors happen before the
//! pipeline starts.

use metrics::{counter, describe_counter};
use once_cell::sync::OnceCell;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info};

use crate::config::DigestConfig;
use crate::extract::{self, PageFetcher};
use crate::feedback::FeedbackStore;
use crate::ingest::types::{FeedItem, FeedSource};
use crate::rank::{rank_and_truncate, ProcessedArticle};
use crate::services::{DynClassifier, DynSummarizer, DynTranslator};

/// Explicitly constructed service clients handed to the pipeline; tests
/// substitute mocks per call without any process-wide state.
pub struct PipelineServices {
    pub pages: Arc<dyn PageFetcher>,
    pub classifier: DynClassifier,
    pub translator: DynTranslator,
    pub summarizer: DynSummarizer,
}

/// Why a single item dropped out of the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum RejectReason {
    PageFetch,
    EmptyContent,
    TooShort,
    Boilerplate,
    Translation,
    Classification,
    OffTopic,
    BelowThreshold,
}

impl RejectReason {
    pub fn as_str(self) -> &'static str {
        match self {
            RejectReason::PageFetch => "page_fetch",
            RejectReason::EmptyContent => "empty_content",
            RejectReason::TooShort => "too_short",
            RejectReason::Boilerplate => "boilerplate",
            RejectReason::Translation => "translation",
            RejectReason::Classification => "classification",
            RejectReason::OffTopic => "off_topic",
            RejectReason::BelowThreshold => "below_threshold",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ItemOutcome {
    Accepted(ProcessedArticle),
    Rejected(RejectReason),
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunStats {
    pub fetched: usize,
    pub accepted: usize,
    pub rejected: BTreeMap<&'static str, usize>,
}

impl RunStats {
    pub fn rejected_total(&self) -> usize {
        self.rejected.values().sum()
    }

    fn note_rejection(&mut self, reason: RejectReason) {
        *self.rejected.entry(reason.as_str()).or_insert(0) += 1;
    }
}

/// Outcome of a full run. Zero surviving articles is a success value, not an
/// error; the caller decides to report "nothing today".
#[derive(Debug)]
pub struct DigestRun {
    pub articles: Vec<ProcessedArticle>,
    pub stats: RunStats,
}

fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!(
            "digest_items_processed_total",
            "Feed items run through the pipeline."
        );
        describe_counter!("digest_items_accepted_total", "Items accepted into the digest.");
        describe_counter!(
            "digest_items_rejected_total",
            "Items rejected, labelled by reason."
        );
    });
}

/// Run one item through the full decision sequence.
pub async fn process_item(
    item: &FeedItem,
    cfg: &DigestConfig,
    services: &PipelineServices,
    feedback: &mut FeedbackStore,
) -> ItemOutcome {
    // 1) Body fetch, bounded timeout, no retry.
    let html = match services.pages.fetch_page(&item.link).await {
        Ok(html) => html,
        Err(e) => {
            debug!(link = %item.link, error = ?e, "page fetch failed");
            return ItemOutcome::Rejected(RejectReason::PageFetch);
        }
    };

    // 2) Readable text gate.
    let content = extract::extract_paragraph_text(&html);
    if content.is_empty() {
        return ItemOutcome::Rejected(RejectReason::EmptyContent);
    }
    if content.chars().count() < cfg.relevance.min_content_length {
        return ItemOutcome::Rejected(RejectReason::TooShort);
    }

    // 3) Boilerplate denylist (paywall notices and similar).
    if let Some(marker) = extract::find_boilerplate(&content, &cfg.relevance.boilerplate_markers) {
        debug!(link = %item.link, marker, "boilerplate marker hit");
        return ItemOutcome::Rejected(RejectReason::Boilerplate);
    }

    // 4) Language normalization; classification and summarization assume
    //    target-language text, so a failed translation is terminal here.
    let lang = services
        .translator
        .detect(&content)
        .await
        .unwrap_or_else(|| cfg.language.fallback.clone());
    let content = if lang != cfg.language.target {
        match services.translator.translate(&content, &cfg.language.target).await {
            Ok(translated) => translated,
            Err(e) => {
                debug!(link = %item.link, error = ?e, "translation failed");
                return ItemOutcome::Rejected(RejectReason::Translation);
            }
        }
    } else {
        content
    };

    // 5) Classification on a bounded prefix.
    let classify_input =
        extract::truncate_chars(&content, cfg.relevance.max_classification_length);
    let classification = match services.classifier.classify(classify_input).await {
        Ok(c) => c,
        Err(e) => {
            debug!(link = %item.link, error = ?e, "classification failed");
            return ItemOutcome::Rejected(RejectReason::Classification);
        }
    };

    // 6) Topic allow-list, case-insensitive.
    let on_topic = cfg
        .relevance
        .accepted_labels
        .iter()
        .any(|l| l.eq_ignore_ascii_case(&classification.label));
    if !on_topic {
        return ItemOutcome::Rejected(RejectReason::OffTopic);
    }

    // 7) Feedback-adjusted score against the threshold.
    let final_score =
        (classification.confidence + feedback.adjustment(&item.link)).clamp(0.0, 1.0);
    if final_score < cfg.relevance.threshold {
        debug!(link = %item.link, score = final_score, "below relevance threshold");
        return ItemOutcome::Rejected(RejectReason::BelowThreshold);
    }

    // 8) Accepted items reinforce future runs unless an external actor owns
    //    the judgments.
    if cfg.relevance.record_accepted {
        feedback.record(&item.link, true, &classification.label);
    }

    // 9) Condense, with a deterministic truncation fallback.
    let summary = condense(&content, cfg, services).await;

    ItemOutcome::Accepted(ProcessedArticle {
        title: item.title.clone(),
        link: item.link.clone(),
        summary,
        score: final_score,
        category: classification.label,
        published_at: item.published_at,
    })
}

/// Summarize a length-capped input; on service failure fall back to a fixed
/// prefix plus an ellipsis marker. The fallback never fails.
async fn condense(content: &str, cfg: &DigestConfig, services: &PipelineServices) -> String {
    let input = extract::truncate_chars(content, cfg.summary.max_input_length);
    match services
        .summarizer
        .summarize(input, cfg.summary.min_length, cfg.summary.max_length)
        .await
    {
        Ok(summary) => summary,
        Err(e) => {
            debug!(error = ?e, "summarizer failed, using truncation fallback");
            format!(
                "{}...",
                extract::truncate_chars(input, cfg.summary.fallback_prefix_chars)
            )
        }
    }
}

/// Full run: concurrent feed fetch with a full join, then strictly
/// sequential per-item processing, then rank/truncate.
pub async fn run_digest(
    cfg: &DigestConfig,
    sources: Vec<Box<dyn FeedSource>>,
    services: &PipelineServices,
    feedback: &mut FeedbackStore,
) -> DigestRun {
    ensure_metrics_described();

    let items = crate::ingest::fetch_all(sources).await;
    let mut stats = RunStats {
        fetched: items.len(),
        ..RunStats::default()
    };
    info!(count = items.len(), "feed stubs collected");

    let mut accepted = Vec::new();
    for item in &items {
        counter!("digest_items_processed_total").increment(1);
        match process_item(item, cfg, services, feedback).await {
            ItemOutcome::Accepted(article) => {
                info!(link = %article.link, score = article.score, "article accepted");
                counter!("digest_items_accepted_total").increment(1);
                stats.accepted += 1;
                accepted.push(article);
            }
            ItemOutcome::Rejected(reason) => {
                counter!("digest_items_rejected_total", "reason" => reason.as_str())
                    .increment(1);
                stats.note_rejection(reason);
            }
        }
    }

    let articles = rank_and_truncate(accepted, cfg.output.max_articles);
    DigestRun { articles, stats }
}
