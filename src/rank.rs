// src/rank.rs
//! Final ranking and truncation of accepted articles.

use serde::Serialize;

/// An item that survived the whole pipeline, ready for rendering.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ProcessedArticle {
    pub title: String,
    pub link: String,
    pub summary: String,
    /// Feedback-adjusted relevance, clamped to [0,1].
    pub score: f32,
    pub category: String,
    pub published_at: Option<i64>,
}

/// Sort descending by (score, publish time) and keep the first `max`.
/// Items without a timestamp sort as earliest. The sort is stable, so ties
/// in both keys preserve encounter order.
pub fn rank_and_truncate(
    mut articles: Vec<ProcessedArticle>,
    max: usize,
) -> Vec<ProcessedArticle> {
    articles.sort_by(|a, b| {
        b.score
            .total_cmp(&a.score)
            .then_with(|| sort_ts(b).cmp(&sort_ts(a)))
    });
    articles.truncate(max);
    articles
}

fn sort_ts(a: &ProcessedArticle) -> i64 {
    a.published_at.unwrap_or(i64::MIN)
}
