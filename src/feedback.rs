// src/feedback.rs
//! Durable reader-feedback store keyed by article link.
//!
//! Prior judgments bias future relevance decisions by a bounded ±0.1
//! adjustment. The whole store lives in memory and is rewritten wholesale
//! (tmp file + rename) after every mutation; volumes are small enough that
//! this stays cheap. Any I/O problem degrades to an ephemeral in-memory
//! store for the run — persistence must never abort the pipeline.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Score delta applied for a stored judgment.
pub const FEEDBACK_ADJUSTMENT: f32 = 0.1;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FeedbackRecord {
    pub relevant: bool,
    pub category: String,
    /// ISO-8601, UTC. Informational; the newest judgment simply wins.
    pub timestamp: String,
}

#[derive(Debug)]
pub struct FeedbackStore {
    path: Option<PathBuf>,
    records: HashMap<String, FeedbackRecord>,
}

impl FeedbackStore {
    /// Load the store from `path`. Absent file → empty store; unreadable or
    /// corrupt file → empty store with a warning. Never fails.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let records = match fs::read_to_string(&path) {
            Ok(s) => match serde_json::from_str::<HashMap<String, FeedbackRecord>>(&s) {
                Ok(map) => map,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "feedback store corrupt, starting empty");
                    HashMap::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => HashMap::new(),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "feedback store unreadable, starting empty");
                HashMap::new()
            }
        };
        Self {
            path: Some(path),
            records,
        }
    }

    /// Purely in-memory store (tests, or explicit ephemeral mode).
    pub fn in_memory() -> Self {
        Self {
            path: None,
            records: HashMap::new(),
        }
    }

    /// +0.1 for a stored relevant judgment, -0.1 for irrelevant, 0 when the
    /// link has never been judged. Read-only and infallible.
    pub fn adjustment(&self, link: &str) -> f32 {
        match self.records.get(link) {
            Some(rec) if rec.relevant => FEEDBACK_ADJUSTMENT,
            Some(_) => -FEEDBACK_ADJUSTMENT,
            None => 0.0,
        }
    }

    /// Upsert a judgment for `link` and persist the full store. The newest
    /// judgment overwrites any prior one. A failed write keeps the in-memory
    /// state and logs a warning; it is not an error.
    pub fn record(&mut self, link: &str, relevant: bool, category: &str) {
        self.records.insert(
            link.to_string(),
            FeedbackRecord {
                relevant,
                category: category.to_string(),
                timestamp: chrono::Utc::now().to_rfc3339(),
            },
        );
        self.persist();
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, link: &str) -> Option<&FeedbackRecord> {
        self.records.get(link)
    }

    fn persist(&self) {
        let Some(path) = &self.path else {
            return;
        };
        if let Err(e) = write_store_file(path, &self.records) {
            warn!(path = %path.display(), error = %e, "failed to persist feedback store, keeping in-memory state");
        }
    }
}

fn write_store_file(
    path: &Path,
    records: &HashMap<String, FeedbackRecord>,
) -> std::io::Result<()> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)?;
    }
    let json = serde_json::to_string_pretty(records)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
    let tmp = path.with_extension("json.tmp");
    let mut f = fs::File::create(&tmp)?;
    f.write_all(json.as_bytes())?;
    fs::rename(tmp, path)?;
    Ok(())
}
