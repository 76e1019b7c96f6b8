//! Cross-encoder reranking, delegated to whatever LLM client the caller
//! wires in.
//!
//! No cross-encoder/NLP scoring model exists in this engine's dependency
//! stack, so reranking becomes a single LLM call per query, batch-scoring
//! every candidate by relevance — the gateway crate implements this trait
//! over its chat-completion client. "Pre-loaded at startup" becomes "the
//! backing LLM client is constructed and health-checked during bootstrap",
//! so the first query doesn't pay cold-start latency.

use async_trait::async_trait;

use crate::RetrievalResult;

#[async_trait]
pub trait Reranker: Send + Sync {
    /// Score each of `documents` for relevance to `query`. Returns one score
    /// per input document, same order, higher is more relevant.
    async fn rerank(&self, query: &str, documents: &[String]) -> RetrievalResult<Vec<f32>>;
}

/// Reranking stage over a fused candidate list: returns `top_n`, where
/// `top_n = max(5, k / 2)`, forwarding input unchanged when no reranker is
/// configured.
pub async fn apply_reranking<T>(
    reranker: Option<&dyn Reranker>,
    query: &str,
    candidates: Vec<T>,
    k: usize,
    text_of: impl Fn(&T) -> &str,
) -> RetrievalResult<Vec<T>> {
    let Some(reranker) = reranker else {
        return Ok(candidates);
    };
    if candidates.is_empty() {
        return Ok(candidates);
    }

    let documents: Vec<String> = candidates.iter().map(|c| text_of(c).to_string()).collect();
    let scores = reranker.rerank(query, &documents).await?;

    let mut scored: Vec<(f32, T)> = candidates
        .into_iter()
        .zip(scores)
        .collect::<Vec<_>>()
        .into_iter()
        .map(|(c, s)| (s, c))
        .collect();
    scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));

    let top_n = std::cmp::max(5, k / 2);
    scored.truncate(top_n);
    Ok(scored.into_iter().map(|(_, c)| c).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    struct StubReranker;

    #[async_trait]
    impl Reranker for StubReranker {
        async fn rerank(&self, _query: &str, documents: &[String]) -> RetrievalResult<Vec<f32>> {
            // reverse order: last document scores highest
            Ok((0..documents.len()).rev().map(|i| i as f32).collect())
        }
    }

    #[tokio::test]
    async fn no_reranker_forwards_input_unchanged() {
        let candidates = vec!["a".to_string(), "b".to_string()];
        let result = apply_reranking(None, "q", candidates.clone(), 10, |s| s.as_str())
            .await
            .unwrap();
        assert_eq!(result, candidates);
    }

    #[tokio::test]
    async fn reranker_reorders_by_score_and_truncates_to_top_n() {
        let candidates: Vec<String> = (0..10).map(|i| i.to_string()).collect();
        let reranker = StubReranker;
        let result = apply_reranking(Some(&reranker), "q", candidates, 4, |s| s.as_str())
            .await
            .unwrap();
        // k=4 -> top_n = max(5, 2) = 5; stub scores index 0 highest (reversed)
        assert_eq!(result.len(), 5);
        assert_eq!(result[0], "0");
    }

    #[tokio::test]
    async fn empty_candidates_short_circuit() {
        let reranker = StubReranker;
        let result: Vec<String> = apply_reranking(Some(&reranker), "q", Vec::new(), 10, |s: &String| s.as_str())
            .await
            .unwrap();
        assert!(result.is_empty());
    }
}
