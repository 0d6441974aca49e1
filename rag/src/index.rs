//! Linear-scan cosine similarity search.
//!
//! The target corpus is a personal note vault, small enough that building a
//! proper ANN index costs more than it saves. Anything that replaces this
//! scan must preserve the contract: deterministic ranked top-K under a
//! threshold, raw cosine semantics in `[-1, 1]` (never a distance proxy).

use std::cmp::Ordering;

use crate::types::{Chunk, SearchResult};

/// Cosine similarity of two vectors: `dot(a,b) / (|a| * |b|)`.
///
/// If either vector has zero magnitude the similarity is undefined; it is
/// treated as 0.0, which excludes the chunk unless the threshold is 0.
#[must_use]
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let (mut dot, mut norm_a, mut norm_b) = (0.0f32, 0.0f32, 0.0f32);
    for (lhs, rhs) in a.iter().zip(b) {
        dot += lhs * rhs;
        norm_a += lhs * lhs;
        norm_b += rhs * rhs;
    }
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a.sqrt() * norm_b.sqrt())
}

/// Scores every embedded chunk against `query` and returns the ranked top
/// `max_results` at or above `threshold`.
///
/// Chunks without a vector are skipped. The sort is stable and descending
/// by score, so ties keep their original iteration order and repeated calls
/// over the same input return the same ordering.
#[must_use]
pub fn search(
    query: &[f32],
    chunks: &[Chunk],
    threshold: f32,
    max_results: usize,
) -> Vec<SearchResult> {
    let mut scored: Vec<SearchResult> = chunks
        .iter()
        .filter(|chunk| chunk.has_vector())
        .filter_map(|chunk| {
            let vector = chunk.vector.as_deref().unwrap_or_default();
            let score = cosine_similarity(query, vector);
            (score >= threshold).then(|| SearchResult {
                chunk: chunk.clone(),
                score,
            })
        })
        .collect();

    scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
    scored.truncate(max_results);
    scored
}
