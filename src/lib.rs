// src/lib.rs
// Public library surface for the binary and integration tests.

pub mod config;
pub mod extract;
pub mod feedback;
pub mod ingest;
pub mod pipeline;
pub mod rank;
pub mod render;
pub mod services;

// ---- Re-exports for a stable public API ----
pub use crate::config::DigestConfig;
pub use crate::feedback::FeedbackStore;
pub use crate::pipeline::{run_digest, DigestRun, ItemOutcome, PipelineServices, RejectReason};
pub use crate::rank::ProcessedArticle;
