// tests/pipeline_gate.rs
//! Relevance gate behavior for a single item: content-length gating,
//! boilerplate denylist, feedback adjustment against the threshold, label
//! allow-list, clamping, and the acceptance-records-feedback side effect.

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use news_digest::config::DigestConfig;
use news_digest::extract::PageFetcher;
use news_digest::feedback::FeedbackStore;
use news_digest::ingest::types::FeedItem;
use news_digest::pipeline::{process_item, ItemOutcome, PipelineServices, RejectReason};
use news_digest::services::{MockClassifier, MockSummarizer, MockTranslator};

struct StaticPages {
    html: String,
}

#[async_trait]
impl PageFetcher for StaticPages {
    async fn fetch_page(&self, _url: &str) -> Result<String> {
        Ok(self.html.clone())
    }
}

struct FailingPages;

#[async_trait]
impl PageFetcher for FailingPages {
    async fn fetch_page(&self, url: &str) -> Result<String> {
        anyhow::bail!("connect timeout for {url}")
    }
}

fn item(link: &str) -> FeedItem {
    FeedItem {
        title: "Some article".to_string(),
        link: link.to_string(),
        published_at: Some(1_700_000_000),
    }
}

/// HTML whose paragraph text is at least `chars` characters long.
fn html_with_content(chars: usize) -> String {
    let body = "palabras ".repeat(chars / 9 + 1);
    format!("<html><body><p>{body}</p></body></html>")
}

struct Harness {
    cfg: DigestConfig,
    classifier: Arc<MockClassifier>,
    summarizer: Arc<MockSummarizer>,
    services: PipelineServices,
}

/// Pipeline wired with mocks: pages serve `html`, detection always matches
/// the target language, classification returns ("tech", confidence).
fn harness(html: String, confidence: f32) -> Harness {
    let cfg = DigestConfig::default();
    let classifier = Arc::new(MockClassifier::new("tech", confidence));
    let summarizer = Arc::new(MockSummarizer::new());
    let services = PipelineServices {
        pages: Arc::new(StaticPages { html }),
        classifier: classifier.clone(),
        translator: Arc::new(MockTranslator::detecting(&cfg.language.target)),
        summarizer: summarizer.clone(),
    };
    Harness {
        cfg,
        classifier,
        summarizer,
        services,
    }
}

#[tokio::test]
async fn short_content_is_rejected_before_classification() {
    // Exactly 50 chars of content against the default 300-char minimum.
    let html = format!("<html><body><p>{}</p></body></html>", "x".repeat(50));
    let h = harness(html, 0.99);
    let mut feedback = FeedbackStore::in_memory();

    let out =
        process_item(&item("https://example.test/short"), &h.cfg, &h.services, &mut feedback)
            .await;
    assert_eq!(out, ItemOutcome::Rejected(RejectReason::TooShort));
    assert_eq!(h.classifier.calls(), 0, "classifier must not run for gated-out items");
}

#[tokio::test]
async fn page_fetch_failure_rejects_single_item() {
    let h = harness(html_with_content(500), 0.99);
    let services = PipelineServices {
        pages: Arc::new(FailingPages),
        classifier: h.classifier.clone(),
        translator: Arc::new(MockTranslator::detecting("es")),
        summarizer: h.summarizer.clone(),
    };
    let mut feedback = FeedbackStore::in_memory();
    let out =
        process_item(&item("https://example.test/down"), &h.cfg, &services, &mut feedback).await;
    assert_eq!(out, ItemOutcome::Rejected(RejectReason::PageFetch));
    assert_eq!(h.classifier.calls(), 0);
}

#[tokio::test]
async fn boilerplate_marker_rejects_before_classification() {
    let body = format!(
        "{} you must be a subscriber of LWN.net to read this {}",
        "relleno ".repeat(40),
        "relleno ".repeat(40)
    );
    let h = harness(format!("<html><body><p>{body}</p></body></html>"), 0.99);
    let mut feedback = FeedbackStore::in_memory();
    let out = process_item(
        &item("https://example.test/paywalled"),
        &h.cfg,
        &h.services,
        &mut feedback,
    )
    .await;
    assert_eq!(out, ItemOutcome::Rejected(RejectReason::Boilerplate));
    assert_eq!(h.classifier.calls(), 0);
}

#[tokio::test]
async fn stored_positive_feedback_lifts_borderline_item_over_threshold() {
    // 0.80 confidence + 0.1 adjustment = 0.90 >= 0.85 -> accepted.
    let h = harness(html_with_content(500), 0.80);
    let mut feedback = FeedbackStore::in_memory();
    feedback.record("https://example.test/seen-before", true, "tech");

    let out = process_item(
        &item("https://example.test/seen-before"),
        &h.cfg,
        &h.services,
        &mut feedback,
    )
    .await;
    match out {
        ItemOutcome::Accepted(article) => {
            assert!((article.score - 0.90).abs() < 1e-6);
            assert_eq!(article.category, "tech");
        }
        other => panic!("expected acceptance, got {other:?}"),
    }
}

#[tokio::test]
async fn same_confidence_without_feedback_is_rejected() {
    // 0.80 with no stored record stays below the 0.85 threshold.
    let h = harness(html_with_content(500), 0.80);
    let mut feedback = FeedbackStore::in_memory();
    let out = process_item(
        &item("https://example.test/never-seen"),
        &h.cfg,
        &h.services,
        &mut feedback,
    )
    .await;
    assert_eq!(out, ItemOutcome::Rejected(RejectReason::BelowThreshold));
}

#[tokio::test]
async fn final_score_is_clamped_to_one() {
    let h = harness(html_with_content(500), 0.95);
    let mut feedback = FeedbackStore::in_memory();
    feedback.record("https://example.test/favourite", true, "tech");

    let out = process_item(
        &item("https://example.test/favourite"),
        &h.cfg,
        &h.services,
        &mut feedback,
    )
    .await;
    match out {
        ItemOutcome::Accepted(article) => assert_eq!(article.score, 1.0),
        other => panic!("expected acceptance, got {other:?}"),
    }
}

#[tokio::test]
async fn negative_feedback_never_raises_the_score() {
    // 0.90 confidence - 0.1 = 0.80 < 0.85 -> a previously-irrelevant link
    // gets rejected even though its raw confidence clears the threshold.
    let h = harness(html_with_content(500), 0.90);
    let mut feedback = FeedbackStore::in_memory();
    feedback.record("https://example.test/disliked", false, "tech");

    let out = process_item(
        &item("https://example.test/disliked"),
        &h.cfg,
        &h.services,
        &mut feedback,
    )
    .await;
    assert_eq!(out, ItemOutcome::Rejected(RejectReason::BelowThreshold));
}

#[tokio::test]
async fn off_topic_label_is_rejected() {
    let h = harness(html_with_content(500), 0.99);
    let classifier = Arc::new(MockClassifier::new("Sports", 0.99));
    let services = PipelineServices {
        pages: Arc::new(StaticPages {
            html: html_with_content(500),
        }),
        classifier,
        translator: Arc::new(MockTranslator::detecting("es")),
        summarizer: h.summarizer.clone(),
    };
    let mut feedback = FeedbackStore::in_memory();
    let out =
        process_item(&item("https://example.test/sports"), &h.cfg, &services, &mut feedback).await;
    assert_eq!(out, ItemOutcome::Rejected(RejectReason::OffTopic));
}

#[tokio::test]
async fn label_allow_list_is_case_insensitive() {
    let h = harness(html_with_content(500), 0.99);
    let services = PipelineServices {
        pages: Arc::new(StaticPages {
            html: html_with_content(500),
        }),
        classifier: Arc::new(MockClassifier::new("Sci/Tech", 0.99)),
        translator: Arc::new(MockTranslator::detecting("es")),
        summarizer: h.summarizer.clone(),
    };
    let mut feedback = FeedbackStore::in_memory();
    let out =
        process_item(&item("https://example.test/scitech"), &h.cfg, &services, &mut feedback)
            .await;
    assert!(matches!(out, ItemOutcome::Accepted(_)));
}

#[tokio::test]
async fn translation_failure_is_terminal_for_the_item() {
    let h = harness(html_with_content(500), 0.99);
    let services = PipelineServices {
        pages: Arc::new(StaticPages {
            html: html_with_content(500),
        }),
        classifier: h.classifier.clone(),
        translator: Arc::new(MockTranslator {
            detected: Some("en".to_string()),
            fail_translation: true,
        }),
        summarizer: h.summarizer.clone(),
    };
    let mut feedback = FeedbackStore::in_memory();
    let out = process_item(
        &item("https://example.test/english"),
        &h.cfg,
        &services,
        &mut feedback,
    )
    .await;
    assert_eq!(out, ItemOutcome::Rejected(RejectReason::Translation));
    assert_eq!(h.classifier.calls(), 0, "translation precedes classification");
}

#[tokio::test]
async fn acceptance_records_positive_feedback() {
    let h = harness(html_with_content(500), 0.95);
    let mut feedback = FeedbackStore::in_memory();
    let link = "https://example.test/recorded";
    assert_eq!(feedback.adjustment(link), 0.0);

    let out = process_item(&item(link), &h.cfg, &h.services, &mut feedback).await;
    assert!(matches!(out, ItemOutcome::Accepted(_)));
    assert_eq!(feedback.adjustment(link), 0.1);
    assert_eq!(feedback.get(link).map(|r| r.relevant), Some(true));
}

#[tokio::test]
async fn recording_can_be_left_to_an_external_actor() {
    let h = harness(html_with_content(500), 0.95);
    let mut cfg = h.cfg.clone();
    cfg.relevance.record_accepted = false;
    let mut feedback = FeedbackStore::in_memory();

    let link = "https://example.test/not-recorded";
    let out = process_item(&item(link), &cfg, &h.services, &mut feedback).await;
    assert!(matches!(out, ItemOutcome::Accepted(_)));
    assert!(feedback.is_empty(), "pipeline must not self-record when disabled");
}
