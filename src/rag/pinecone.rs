//! Pinecone retriever.
//!
//! Queries a managed Pinecone index over its REST data-plane API. Chunks were
//! indexed with `text` and `source` metadata; matches without text are skipped.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::store::{rank_passages, Retriever};
use crate::context::RetrievedPassage;
use crate::core::errors::ApiError;

#[derive(Clone)]
pub struct PineconeRetriever {
    index_host: String,
    api_key: Option<String>,
    namespace: Option<String>,
    client: Client,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct QueryRequest<'a> {
    vector: &'a [f32],
    top_k: usize,
    include_metadata: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    namespace: Option<&'a str>,
}

#[derive(Deserialize)]
struct QueryResponse {
    #[serde(default)]
    matches: Vec<QueryMatch>,
}

#[derive(Deserialize)]
struct QueryMatch {
    #[serde(default)]
    score: f32,
    #[serde(default)]
    metadata: Option<MatchMetadata>,
}

#[derive(Deserialize)]
struct MatchMetadata {
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    source: Option<String>,
}

impl PineconeRetriever {
    pub fn new(
        index_host: &str,
        api_key: Option<String>,
        namespace: Option<String>,
        timeout: Duration,
    ) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(ApiError::internal)?;
        Ok(Self {
            index_host: normalize_host(index_host),
            api_key,
            namespace,
            client,
        })
    }
}

fn normalize_host(host: &str) -> String {
    let host = host.trim().trim_end_matches('/');
    if host.starts_with("http://") || host.starts_with("https://") {
        host.to_string()
    } else {
        format!("https://{}", host)
    }
}

fn into_passages(response: QueryResponse) -> Vec<RetrievedPassage> {
    let mut passages: Vec<RetrievedPassage> = response
        .matches
        .into_iter()
        .filter_map(|m| {
            let metadata = m.metadata?;
            let text = metadata.text.filter(|t| !t.trim().is_empty())?;
            Some(RetrievedPassage {
                text,
                source: metadata.source.unwrap_or_else(|| "unknown".to_string()),
                score: m.score,
            })
        })
        .collect();
    rank_passages(&mut passages);
    passages
}

#[async_trait]
impl Retriever for PineconeRetriever {
    fn name(&self) -> &str {
        "pinecone"
    }

    async fn search(
        &self,
        query_embedding: &[f32],
        top_k: usize,
    ) -> Result<Vec<RetrievedPassage>, ApiError> {
        let body = QueryRequest {
            vector: query_embedding,
            top_k,
            include_metadata: true,
            namespace: self.namespace.as_deref(),
        };

        let mut builder = self
            .client
            .post(format!("{}/query", self.index_host))
            .json(&body);
        if let Some(key) = &self.api_key {
            builder = builder.header("Api-Key", key);
        }

        let res = builder.send().await.map_err(ApiError::upstream)?;
        if !res.status().is_success() {
            let status = res.status();
            let text = res.text().await.unwrap_or_default();
            return Err(ApiError::UpstreamUnavailable(format!(
                "index query failed: {} {}",
                status,
                text.trim()
            )));
        }

        let payload: QueryResponse = res.json().await.map_err(ApiError::upstream)?;
        let passages = into_passages(payload);
        tracing::debug!(matches = passages.len(), top_k, "Pinecone query finished");
        Ok(passages)
    }
}
