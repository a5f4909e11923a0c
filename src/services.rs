// src/services.rs
//! External service clients: classification, translation, summarization.
//!
//! Each service is a trait with an HTTP implementation and a mock, so the
//! pipeline receives explicitly constructed clients instead of reaching for
//! process-wide handles. The engines behind the endpoints are opaque; only
//! the wire contract is fixed here.

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::config::ServicesConfig;

/// (label, confidence) pair returned by the classification service.
#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    pub label: String,
    /// In [0,1] before any feedback adjustment.
    pub confidence: f32,
}

#[async_trait]
pub trait Classifier: Send + Sync {
    async fn classify(&self, text: &str) -> Result<Classification>;
}

#[async_trait]
pub trait Translator: Send + Sync {
    /// Best-effort language detection; `None` means "could not tell".
    async fn detect(&self, text: &str) -> Option<String>;
    /// Translate `text` (source auto-detected by the service) into `target`.
    async fn translate(&self, text: &str, target: &str) -> Result<String>;
}

#[async_trait]
pub trait Summarizer: Send + Sync {
    /// Bounded-length summary with deterministic decoding.
    async fn summarize(&self, text: &str, min_length: usize, max_length: usize)
        -> Result<String>;
}

/// Trait-object aliases used by the pipeline wiring.
pub type DynClassifier = Arc<dyn Classifier>;
pub type DynTranslator = Arc<dyn Translator>;
pub type DynSummarizer = Arc<dyn Summarizer>;

fn service_http_client() -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent("news-digest/0.1")
        .connect_timeout(Duration::from_secs(4))
        .timeout(Duration::from_secs(30))
        .build()
        .context("building service http client")
}

// ------------------------------------------------------------
// Classification (HF inference style: POST {inputs} -> [[{label,score}]])
// ------------------------------------------------------------

pub struct HttpClassifier {
    http: reqwest::Client,
    url: String,
}

impl HttpClassifier {
    pub fn from_config(cfg: &ServicesConfig) -> Result<Self> {
        Ok(Self {
            http: service_http_client()?,
            url: format!(
                "{}/{}",
                cfg.classifier_endpoint.trim_end_matches('/'),
                cfg.classifier_model
            ),
        })
    }
}

#[async_trait]
impl Classifier for HttpClassifier {
    async fn classify(&self, text: &str) -> Result<Classification> {
        #[derive(Serialize)]
        struct Req<'a> {
            inputs: &'a str,
        }
        #[derive(Deserialize)]
        struct Scored {
            label: String,
            score: f32,
        }

        let resp = self
            .http
            .post(&self.url)
            .json(&Req { inputs: text })
            .send()
            .await
            .context("classifier request")?
            .error_for_status()
            .context("classifier status")?;

        // Top-ranked candidate per input; one input is sent.
        let body: Vec<Vec<Scored>> = resp.json().await.context("classifier body")?;
        let top = body
            .first()
            .and_then(|candidates| {
                candidates
                    .iter()
                    .max_by(|a, b| a.score.total_cmp(&b.score))
            })
            .ok_or_else(|| anyhow!("classifier returned no candidates"))?;

        Ok(Classification {
            label: top.label.clone(),
            confidence: top.score.clamp(0.0, 1.0),
        })
    }
}

// ------------------------------------------------------------
// Translation (LibreTranslate style: /detect + /translate)
// ------------------------------------------------------------

pub struct HttpTranslator {
    http: reqwest::Client,
    base_url: String,
}

impl HttpTranslator {
    pub fn from_config(cfg: &ServicesConfig) -> Result<Self> {
        Ok(Self {
            http: service_http_client()?,
            base_url: cfg.translator_endpoint.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl Translator for HttpTranslator {
    async fn detect(&self, text: &str) -> Option<String> {
        #[derive(Serialize)]
        struct Req<'a> {
            q: &'a str,
        }
        #[derive(Deserialize)]
        struct Detected {
            language: String,
        }

        let resp = self
            .http
            .post(format!("{}/detect", self.base_url))
            .json(&Req { q: text })
            .send()
            .await
            .ok()?;
        if !resp.status().is_success() {
            return None;
        }
        let body: Vec<Detected> = resp.json().await.ok()?;
        body.into_iter().next().map(|d| d.language)
    }

    async fn translate(&self, text: &str, target: &str) -> Result<String> {
        #[derive(Serialize)]
        struct Req<'a> {
            q: &'a str,
            source: &'a str,
            target: &'a str,
        }
        #[derive(Deserialize)]
        struct Resp {
            #[serde(rename = "translatedText")]
            translated_text: String,
        }

        let resp = self
            .http
            .post(format!("{}/translate", self.base_url))
            .json(&Req {
                q: text,
                source: "auto",
                target,
            })
            .send()
            .await
            .context("translate request")?
            .error_for_status()
            .context("translate status")?;
        let body: Resp = resp.json().await.context("translate body")?;
        Ok(body.translated_text)
    }
}

// ------------------------------------------------------------
// Summarization (HF inference style with length bounds, do_sample=false)
// ------------------------------------------------------------

pub struct HttpSummarizer {
    http: reqwest::Client,
    url: String,
}

impl HttpSummarizer {
    pub fn from_config(cfg: &ServicesConfig) -> Result<Self> {
        Ok(Self {
            http: service_http_client()?,
            url: format!(
                "{}/{}",
                cfg.summarizer_endpoint.trim_end_matches('/'),
                cfg.summarizer_model
            ),
        })
    }
}

#[async_trait]
impl Summarizer for HttpSummarizer {
    async fn summarize(
        &self,
        text: &str,
        min_length: usize,
        max_length: usize,
    ) -> Result<String> {
        #[derive(Serialize)]
        struct Params {
            min_length: usize,
            max_length: usize,
            do_sample: bool,
        }
        #[derive(Serialize)]
        struct Req<'a> {
            inputs: &'a str,
            parameters: Params,
        }
        #[derive(Deserialize)]
        struct Resp {
            summary_text: String,
        }

        let resp = self
            .http
            .post(&self.url)
            .json(&Req {
                inputs: text,
                parameters: Params {
                    min_length,
                    max_length,
                    do_sample: false,
                },
            })
            .send()
            .await
            .context("summarizer request")?
            .error_for_status()
            .context("summarizer status")?;
        let body: Vec<Resp> = resp.json().await.context("summarizer body")?;
        body.into_iter()
            .next()
            .map(|r| r.summary_text)
            .ok_or_else(|| anyhow!("summarizer returned no output"))
    }
}

// ------------------------------------------------------------
// Mocks (tests and local dry runs)
// ------------------------------------------------------------

/// Returns a fixed classification and counts invocations, so tests can
/// assert the classifier was never reached for gated-out items.
pub struct MockClassifier {
    pub fixed: Classification,
    calls: AtomicUsize,
}

impl MockClassifier {
    pub fn new(label: &str, confidence: f32) -> Self {
        Self {
            fixed: Classification {
                label: label.to_string(),
                confidence,
            },
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Classifier for MockClassifier {
    async fn classify(&self, _text: &str) -> Result<Classification> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.fixed.clone())
    }
}

/// Detects a fixed language and translates by prefixing, which keeps
/// translated output distinguishable in assertions.
pub struct MockTranslator {
    pub detected: Option<String>,
    pub fail_translation: bool,
}

impl MockTranslator {
    pub fn detecting(lang: &str) -> Self {
        Self {
            detected: Some(lang.to_string()),
            fail_translation: false,
        }
    }
}

#[async_trait]
impl Translator for MockTranslator {
    async fn detect(&self, _text: &str) -> Option<String> {
        self.detected.clone()
    }

    async fn translate(&self, text: &str, target: &str) -> Result<String> {
        if self.fail_translation {
            return Err(anyhow!("translation unavailable"));
        }
        Ok(format!("[{target}] {text}"))
    }
}

/// Echo-style summarizer; `failing` simulates an unavailable service so the
/// truncation fallback can be exercised.
pub struct MockSummarizer {
    pub failing: bool,
    calls: AtomicUsize,
}

impl MockSummarizer {
    pub fn new() -> Self {
        Self {
            failing: false,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing() -> Self {
        Self {
            failing: true,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Default for MockSummarizer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Summarizer for MockSummarizer {
    async fn summarize(
        &self,
        text: &str,
        _min_length: usize,
        max_length: usize,
    ) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing {
            return Err(anyhow!("summarizer unavailable"));
        }
        Ok(crate::extract::truncate_chars(text, max_length).to_string())
    }
}
