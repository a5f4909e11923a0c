// src/config.rs
//! Configuration surface for the digest run: feed list, gate thresholds,
//! language targets, service endpoints and output locations.
//!
//! Loaded from TOML (path via `DIGEST_CONFIG_PATH`, default
//! `config/digest.toml`); a missing file falls back to built-in defaults so
//! the binary stays runnable out of the box. `DIGEST_RELEVANCE_THRESHOLD`
//! overrides the threshold from the environment, clamped to <0..=1>.

use serde::Deserialize;
use std::fs;
use std::path::PathBuf;
use tracing::warn;

pub const DEFAULT_CONFIG_PATH: &str = "config/digest.toml";
pub const ENV_CONFIG_PATH: &str = "DIGEST_CONFIG_PATH";
pub const ENV_RELEVANCE_THRESHOLD: &str = "DIGEST_RELEVANCE_THRESHOLD";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DigestConfig {
    pub feeds: Vec<String>,
    pub relevance: RelevanceConfig,
    pub language: LanguageConfig,
    pub summary: SummaryConfig,
    pub output: OutputConfig,
    pub feedback: FeedbackConfig,
    pub services: ServicesConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RelevanceConfig {
    pub threshold: f32,
    pub min_content_length: usize,
    pub max_classification_length: usize,
    pub accepted_labels: Vec<String>,
    pub boilerplate_markers: Vec<String>,
    /// Record every accepted item as positive feedback (original behavior).
    /// Turn off when judgments come from an external reader instead.
    pub record_accepted: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LanguageConfig {
    /// Output language of the digest; non-target content gets translated.
    pub target: String,
    /// Assumed language when detection fails.
    pub fallback: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SummaryConfig {
    pub max_input_length: usize,
    pub min_length: usize,
    pub max_length: usize,
    /// Prefix size of the deterministic truncation fallback.
    pub fallback_prefix_chars: usize,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub dir: PathBuf,
    pub max_articles: usize,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FeedbackConfig {
    pub path: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServicesConfig {
    pub classifier_endpoint: String,
    pub classifier_model: String,
    pub summarizer_endpoint: String,
    pub summarizer_model: String,
    pub translator_endpoint: String,
}

impl Default for DigestConfig {
    fn default() -> Self {
        Self {
            feeds: vec!["https://www.omgubuntu.co.uk/feed".to_string()],
            relevance: RelevanceConfig::default(),
            language: LanguageConfig::default(),
            summary: SummaryConfig::default(),
            output: OutputConfig::default(),
            feedback: FeedbackConfig::default(),
            services: ServicesConfig::default(),
        }
    }
}

impl Default for RelevanceConfig {
    fn default() -> Self {
        Self {
            threshold: 0.85,
            min_content_length: 300,
            max_classification_length: 1000,
            accepted_labels: vec!["tech".to_string(), "sci/tech".to_string()],
            boilerplate_markers: vec!["subscriber of lwn.net".to_string()],
            record_accepted: true,
        }
    }
}

impl Default for LanguageConfig {
    fn default() -> Self {
        Self {
            target: "es".to_string(),
            fallback: "en".to_string(),
        }
    }
}

impl Default for SummaryConfig {
    fn default() -> Self {
        Self {
            max_input_length: 2000,
            min_length: 200,
            max_length: 350,
            fallback_prefix_chars: 700,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("output"),
            max_articles: 10,
        }
    }
}

impl Default for FeedbackConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("data/feedback.json"),
        }
    }
}

impl Default for ServicesConfig {
    fn default() -> Self {
        Self {
            classifier_endpoint: "https://api-inference.huggingface.co/models".to_string(),
            classifier_model: "mrm8488/bert-mini-finetuned-age_news-classification".to_string(),
            summarizer_endpoint: "https://api-inference.huggingface.co/models".to_string(),
            summarizer_model: "sshleifer/distilbart-cnn-12-6".to_string(),
            translator_endpoint: "https://translate.argosopentech.com".to_string(),
        }
    }
}

// parse optional float env and clamp to <0.0..=1.0>
fn parse_threshold_env(raw: Option<String>) -> Option<f32> {
    raw.and_then(|s| s.trim().parse::<f32>().ok())
        .map(|v| v.clamp(0.0, 1.0))
}

impl DigestConfig {
    /// Load from the configured path, applying env overrides. A missing file
    /// is not an error; a present-but-invalid file is (fail before the
    /// pipeline starts rather than run with half a config).
    pub fn load() -> anyhow::Result<Self> {
        let path = std::env::var(ENV_CONFIG_PATH)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH));

        let mut cfg = match fs::read_to_string(&path) {
            Ok(content) => Self::from_toml_str(&content)?,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "digest config not readable, using defaults");
                Self::default()
            }
        };

        if let Some(t) = parse_threshold_env(std::env::var(ENV_RELEVANCE_THRESHOLD).ok()) {
            cfg.relevance.threshold = t;
        }
        Ok(cfg)
    }

    pub fn from_toml_str(toml_str: &str) -> anyhow::Result<Self> {
        let mut cfg: DigestConfig = toml::from_str(toml_str)?;
        if !cfg.relevance.threshold.is_finite() {
            cfg.relevance.threshold = RelevanceConfig::default().threshold;
        }
        cfg.relevance.threshold = cfg.relevance.threshold.clamp(0.0, 1.0);
        Ok(cfg)
    }
}
