//! Retriever trait: abstract interface over the managed vector index.

use async_trait::async_trait;

use crate::context::RetrievedPassage;
use crate::core::errors::ApiError;

#[async_trait]
pub trait Retriever: Send + Sync {
    /// Backend name for status reporting.
    fn name(&self) -> &str;

    /// Search for the `top_k` passages closest to the query embedding,
    /// ranked by descending score.
    async fn search(
        &self,
        query_embedding: &[f32],
        top_k: usize,
    ) -> Result<Vec<RetrievedPassage>, ApiError>;
}

/// Sorts passages by descending score, keeping backend order for ties.
pub fn rank_passages(passages: &mut [RetrievedPassage]) {
    passages.sort_by(|a, b| b.score.total_cmp(&a.score));
}
