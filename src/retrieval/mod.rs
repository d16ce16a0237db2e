pub mod embeddings;
pub mod pinecone;
pub mod traits;

pub use embeddings::{Embedder, OpenAiEmbedder};
pub use pinecone::PineconeRetriever;
pub use traits::{Passage, Retriever};

use crate::config::RetrievalConfig;
use std::sync::Arc;

/// Factory: build the production retriever from config.
pub fn create_retriever(config: &RetrievalConfig) -> anyhow::Result<PineconeRetriever> {
    let index_url = config
        .index_url
        .clone()
        .ok_or_else(|| anyhow::anyhow!("retrieval.index_url not configured (set MEDIQ_INDEX_URL)"))?;

    let embedder: Arc<dyn Embedder> = Arc::new(OpenAiEmbedder::new(
        &config.embedding_base_url,
        config.api_key.as_deref(),
        &config.embedding_model,
        config.embedding_dimensions,
    ));

    Ok(PineconeRetriever::new(
        &index_url,
        &config.index_name,
        config.api_key.as_deref(),
        embedder,
    ))
}

/// Join retrieved passages into prompt context, blank-line separated.
pub fn join_passages(passages: &[Passage]) -> String {
    passages
        .iter()
        .map(|p| p.text.as_str())
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn join_passages_uses_blank_line_separator() {
        let passages = vec![
            Passage {
                text: "first".into(),
                source: None,
                score: None,
            },
            Passage {
                text: "second".into(),
                source: None,
                score: None,
            },
        ];
        assert_eq!(join_passages(&passages), "first\n\nsecond");
    }

    #[test]
    fn join_passages_empty_is_empty() {
        assert_eq!(join_passages(&[]), "");
    }

    #[test]
    fn factory_requires_index_url() {
        let config = RetrievalConfig::default();
        let err = create_retriever(&config).unwrap_err();
        assert!(err.to_string().contains("index_url"));
    }
}
