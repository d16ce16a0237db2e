use super::types::Turn;
use async_trait::async_trait;

/// The answer generator: a hosted chat-completion model behind HTTPS.
///
/// Opaque collaborator — no determinism, latency bound, or output-schema
/// guarantee. Calls are at-most-once; failures propagate without retry.
#[async_trait]
pub trait Generator: Send + Sync {
    /// Short provider name, for logs and error context.
    fn name(&self) -> &'static str;

    /// Single-prompt completion (diagnosis synthesis).
    async fn generate(&self, prompt: &str) -> anyhow::Result<String> {
        self.chat(None, &[], prompt).await
    }

    /// System-instructed completion over prior conversation turns plus the
    /// latest user message (QA pipeline).
    async fn chat(
        &self,
        system: Option<&str>,
        history: &[Turn],
        message: &str,
    ) -> anyhow::Result<String>;
}
