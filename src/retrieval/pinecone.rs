//! Pinecone-backed retriever.
//!
//! The corpus is pre-indexed out of band; at runtime this only issues
//! `/query` calls against an existing index. Queries are embedded first,
//! then matched by vector similarity.

use anyhow::Context;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

use super::embeddings::Embedder;
use super::traits::{Passage, Retriever};
use crate::providers::api_error;

pub struct PineconeRetriever {
    client: reqwest::Client,
    cached_query_url: String,
    api_key: Option<String>,
    #[allow(dead_code)]
    index_name: String,
    embedder: Arc<dyn Embedder>,
}

impl std::fmt::Debug for PineconeRetriever {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PineconeRetriever")
            .field("cached_query_url", &self.cached_query_url)
            .field("index_name", &self.index_name)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct QueryRequest {
    vector: Vec<f32>,
    top_k: usize,
    include_metadata: bool,
}

#[derive(Debug, Deserialize)]
struct QueryResponse {
    #[serde(default)]
    matches: Vec<Match>,
}

#[derive(Debug, Deserialize)]
struct Match {
    score: Option<f32>,
    metadata: Option<MatchMetadata>,
}

#[derive(Debug, Deserialize)]
struct MatchMetadata {
    text: Option<String>,
    source: Option<String>,
}

impl PineconeRetriever {
    pub fn new(
        index_url: &str,
        index_name: &str,
        api_key: Option<&str>,
        embedder: Arc<dyn Embedder>,
    ) -> Self {
        let base = index_url.trim_end_matches('/');
        Self {
            client: reqwest::Client::builder()
                .connect_timeout(Duration::from_secs(10))
                .timeout(Duration::from_secs(30))
                .pool_max_idle_per_host(10)
                .pool_idle_timeout(Duration::from_secs(90))
                .build()
                .unwrap_or_else(|_| reqwest::Client::new()),
            cached_query_url: format!("{base}/query"),
            api_key: api_key.map(str::to_string),
            index_name: index_name.to_string(),
            embedder,
        }
    }

    fn passage_from(m: Match) -> Option<Passage> {
        let metadata = m.metadata?;
        let text = metadata.text?;
        if text.trim().is_empty() {
            return None;
        }
        Some(Passage {
            text,
            source: metadata.source,
            score: m.score,
        })
    }
}

#[async_trait]
impl Retriever for PineconeRetriever {
    async fn search(&self, query: &str, top_k: usize) -> anyhow::Result<Vec<Passage>> {
        let api_key = self.api_key.as_ref().ok_or_else(|| {
            anyhow::anyhow!("Retrieval API key not set. Set MEDIQ_PINECONE_API_KEY or edit config.toml.")
        })?;

        let vector = self.embedder.embed(query).await?;

        let request = QueryRequest {
            vector,
            top_k,
            include_metadata: true,
        };

        let response = self
            .client
            .post(&self.cached_query_url)
            .header("Api-Key", api_key)
            .json(&request)
            .send()
            .await
            .context("index query failed")?;

        if !response.status().is_success() {
            return Err(api_error("index query", response).await);
        }

        let body: QueryResponse = response
            .json()
            .await
            .context("index query JSON decode failed")?;

        Ok(body
            .matches
            .into_iter()
            .filter_map(Self::passage_from)
            .collect())
    }
}
