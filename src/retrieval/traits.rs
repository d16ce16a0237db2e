use async_trait::async_trait;
use serde::Serialize;

/// One passage from the pre-indexed knowledge corpus.
#[derive(Debug, Clone, Serialize)]
pub struct Passage {
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<f32>,
}

/// The knowledge retriever: top-k semantic search over a pre-built corpus.
///
/// Opaque collaborator, treated as a pure function of the query. Calls are
/// at-most-once with a bounded timeout; failures propagate without retry.
#[async_trait]
pub trait Retriever: Send + Sync {
    async fn search(&self, query: &str, top_k: usize) -> anyhow::Result<Vec<Passage>>;
}
