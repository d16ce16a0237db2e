//! Query embedding for the vector index.
//!
//! The embedding model itself is opaque: this is just the HTTP hop that
//! turns a retrieval query into a vector the index understands.

use anyhow::Context;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embedding dimensions, fixed per model.
    fn dimensions(&self) -> usize;

    /// Embed a single query string.
    async fn embed(&self, text: &str) -> anyhow::Result<Vec<f32>>;
}

// ── OpenAI-compatible embeddings endpoint ─────────────────────────

pub struct OpenAiEmbedder {
    client: reqwest::Client,
    cached_embeddings_url: String,
    cached_auth_header: Option<String>,
    model: String,
    dims: usize,
}

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a str,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingDatum>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingDatum {
    embedding: Vec<f32>,
}

impl OpenAiEmbedder {
    pub fn new(base_url: &str, api_key: Option<&str>, model: &str, dims: usize) -> Self {
        let base = base_url.trim_end_matches('/');
        Self {
            client: reqwest::Client::builder()
                .connect_timeout(Duration::from_secs(10))
                .timeout(Duration::from_secs(30))
                .pool_max_idle_per_host(10)
                .pool_idle_timeout(Duration::from_secs(90))
                .build()
                .unwrap_or_else(|_| reqwest::Client::new()),
            cached_embeddings_url: format!("{base}/v1/embeddings"),
            cached_auth_header: api_key.map(|k| format!("Bearer {k}")),
            model: model.to_string(),
            dims,
        }
    }
}

#[async_trait]
impl Embedder for OpenAiEmbedder {
    fn dimensions(&self) -> usize {
        self.dims
    }

    async fn embed(&self, text: &str) -> anyhow::Result<Vec<f32>> {
        let auth_header = self.cached_auth_header.as_ref().ok_or_else(|| {
            anyhow::anyhow!("Embeddings API key not set. Set MEDIQ_PINECONE_API_KEY or edit config.toml.")
        })?;

        let request = EmbeddingRequest {
            model: &self.model,
            input: text,
        };

        let response = self
            .client
            .post(&self.cached_embeddings_url)
            .header("Authorization", auth_header)
            .json(&request)
            .send()
            .await
            .context("embeddings request failed")?;

        if !response.status().is_success() {
            return Err(crate::providers::api_error("embeddings", response).await);
        }

        let body: EmbeddingResponse = response
            .json()
            .await
            .context("embeddings response JSON decode failed")?;

        body.data
            .into_iter()
            .next()
            .map(|d| d.embedding)
            .ok_or_else(|| anyhow::anyhow!("Empty embedding result"))
    }
}
