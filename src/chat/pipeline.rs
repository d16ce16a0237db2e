//! Retrieval-augmented QA over the medical corpus.
//!
//! Four steps per question: rewrite follow-ups into standalone questions,
//! retrieve passages, generate a grounded answer, and let the caller attach
//! the disclaimer that fits its response shape.

use std::sync::Arc;

use tracing::{debug, info};

use super::prompts::{CONTEXTUALIZE_PROMPT, qa_system_prompt};
use crate::error::{ChatError, GenerationError, Result, RetrievalError};
use crate::providers::{Generator, Turn};
use crate::retrieval::{Retriever, join_passages};

pub const MAX_MESSAGE_CHARS: usize = 1000;
pub const MIN_MESSAGE_CHARS: usize = 2;

/// Reject a message before any upstream call is made.
pub fn validate_message(message: &str) -> Result<()> {
    if message.is_empty() {
        return Err(ChatError::EmptyMessage.into());
    }
    if message.chars().count() > MAX_MESSAGE_CHARS {
        return Err(ChatError::MessageTooLong {
            max: MAX_MESSAGE_CHARS,
        }
        .into());
    }
    if message.trim().chars().count() < MIN_MESSAGE_CHARS {
        return Err(ChatError::MessageTooShort.into());
    }
    Ok(())
}

pub struct ChatPipeline {
    generator: Arc<dyn Generator>,
    retriever: Arc<dyn Retriever>,
    top_k: usize,
}

impl ChatPipeline {
    pub fn new(
        generator: Arc<dyn Generator>,
        retriever: Arc<dyn Retriever>,
        top_k: usize,
    ) -> Self {
        Self {
            generator,
            retriever,
            top_k,
        }
    }

    /// Answer `message` grounded in the corpus, using `history` for
    /// follow-up resolution. Returns the bare answer; disclaimers are the
    /// gateway's concern.
    pub async fn answer(&self, message: &str, history: &[Turn]) -> Result<String> {
        validate_message(message)?;
        let message = message.trim();

        // A first question is already standalone; skip the rewrite hop.
        let query = if history.is_empty() {
            message.to_string()
        } else {
            let rewritten = self
                .generator
                .chat(Some(CONTEXTUALIZE_PROMPT), history, message)
                .await
                .map_err(|error| GenerationError::Request {
                    provider: self.generator.name().to_string(),
                    message: format!("{error:#}"),
                })?;
            debug!(original = %message, rewritten = %rewritten, "contextualized question");
            rewritten
        };

        let passages = self
            .retriever
            .search(&query, self.top_k)
            .await
            .map_err(|error| RetrievalError::Query(format!("{error:#}")))?;
        info!(passages = passages.len(), "retrieved context for chat");

        let system = qa_system_prompt(&join_passages(&passages));
        let answer = self
            .generator
            .chat(Some(&system), history, message)
            .await
            .map_err(|error| GenerationError::Request {
                provider: self.generator.name().to_string(),
                message: format!("{error:#}"),
            })?;

        Ok(answer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MediqError;
    use crate::retrieval::Passage;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Records every chat call so tests can assert on the step sequence.
    struct ScriptedGenerator {
        calls: Mutex<Vec<(Option<String>, usize, String)>>,
        replies: Mutex<Vec<String>>,
    }

    impl ScriptedGenerator {
        fn new(replies: Vec<&str>) -> Self {
            Self {
                calls: Mutex::new(Vec::new()),
                replies: Mutex::new(replies.into_iter().rev().map(String::from).collect()),
            }
        }
    }

    #[async_trait]
    impl Generator for ScriptedGenerator {
        fn name(&self) -> &'static str {
            "scripted"
        }

        async fn chat(
            &self,
            system: Option<&str>,
            history: &[Turn],
            message: &str,
        ) -> anyhow::Result<String> {
            self.calls.lock().unwrap().push((
                system.map(String::from),
                history.len(),
                message.to_string(),
            ));
            self.replies
                .lock()
                .unwrap()
                .pop()
                .ok_or_else(|| anyhow::anyhow!("no scripted reply left"))
        }
    }

    struct FixedRetriever {
        passages: Vec<Passage>,
        queries: Mutex<Vec<String>>,
    }

    impl FixedRetriever {
        fn new(texts: &[&str]) -> Self {
            Self {
                passages: texts
                    .iter()
                    .map(|t| Passage {
                        text: (*t).to_string(),
                        source: None,
                        score: None,
                    })
                    .collect(),
                queries: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl Retriever for FixedRetriever {
        async fn search(&self, query: &str, _top_k: usize) -> anyhow::Result<Vec<Passage>> {
            self.queries.lock().unwrap().push(query.to_string());
            Ok(self.passages.clone())
        }
    }

    fn pipeline(
        generator: ScriptedGenerator,
        retriever: FixedRetriever,
    ) -> (Arc<ScriptedGenerator>, Arc<FixedRetriever>, ChatPipeline) {
        let generator = Arc::new(generator);
        let retriever = Arc::new(retriever);
        let pipeline = ChatPipeline::new(generator.clone(), retriever.clone(), 5);
        (generator, retriever, pipeline)
    }

    #[test]
    fn empty_message_rejected() {
        assert!(matches!(
            validate_message(""),
            Err(MediqError::Chat(ChatError::EmptyMessage))
        ));
    }

    #[test]
    fn overlong_message_rejected() {
        let long = "x".repeat(1001);
        assert!(matches!(
            validate_message(&long),
            Err(MediqError::Chat(ChatError::MessageTooLong { max: 1000 }))
        ));
    }

    #[test]
    fn whitespace_padded_short_message_rejected() {
        assert!(matches!(
            validate_message("  a  "),
            Err(MediqError::Chat(ChatError::MessageTooShort))
        ));
    }

    #[test]
    fn two_chars_is_the_floor() {
        assert!(validate_message("ok").is_ok());
        assert!(validate_message("  ok  ").is_ok());
    }

    #[test]
    fn exactly_max_length_accepted() {
        let message = "x".repeat(1000);
        assert!(validate_message(&message).is_ok());
    }

    #[tokio::test]
    async fn empty_history_skips_rewrite() {
        let (generator, retriever, pipeline) =
            self::pipeline(ScriptedGenerator::new(vec!["Fever is common."]), FixedRetriever::new(&["fever facts"]));

        let answer = pipeline.answer("what causes fever?", &[]).await.unwrap();
        assert_eq!(answer, "Fever is common.");

        // Exactly one generator call, the QA one, with the raw question.
        let calls = generator.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert!(calls[0].0.as_deref().unwrap().contains("fever facts"));

        let queries = retriever.queries.lock().unwrap();
        assert_eq!(queries[0], "what causes fever?");
    }

    #[tokio::test]
    async fn history_triggers_rewrite_and_retrieves_rewritten_query() {
        let (generator, retriever, pipeline) = self::pipeline(
            ScriptedGenerator::new(vec![
                "What are the symptoms of diabetes?",
                "Thirst and fatigue.",
            ]),
            FixedRetriever::new(&["diabetes overview"]),
        );

        let history = vec![
            Turn::user("tell me about diabetes"),
            Turn::assistant("Diabetes is a metabolic disorder."),
        ];
        let answer = pipeline
            .answer("What are the symptoms?", &history)
            .await
            .unwrap();
        assert_eq!(answer, "Thirst and fatigue.");

        let calls = generator.calls.lock().unwrap();
        assert_eq!(calls.len(), 2);
        // First call is the rewrite, with the contextualizer as system prompt.
        assert!(calls[0].0.as_deref().unwrap().contains("standalone question"));
        assert_eq!(calls[0].1, 2);
        // Retrieval used the rewritten question, not the raw follow-up.
        let queries = retriever.queries.lock().unwrap();
        assert_eq!(queries[0], "What are the symptoms of diabetes?");
        // The QA call still sees the original message and history.
        assert_eq!(calls[1].2, "What are the symptoms?");
        assert_eq!(calls[1].1, 2);
    }

    #[tokio::test]
    async fn invalid_message_makes_no_upstream_calls() {
        let (generator, retriever, pipeline) = self::pipeline(
            ScriptedGenerator::new(vec![]),
            FixedRetriever::new(&[]),
        );

        let result = pipeline.answer("", &[]).await;
        assert!(matches!(
            result,
            Err(MediqError::Chat(ChatError::EmptyMessage))
        ));
        assert!(generator.calls.lock().unwrap().is_empty());
        assert!(retriever.queries.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn generator_failure_maps_to_generation_error() {
        let (_, _, pipeline) = self::pipeline(
            ScriptedGenerator::new(vec![]),
            FixedRetriever::new(&["context"]),
        );

        let result = pipeline.answer("what causes fever?", &[]).await;
        assert!(matches!(result, Err(MediqError::Generation(_))));
    }
}
