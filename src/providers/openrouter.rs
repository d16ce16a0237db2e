//! OpenAI-compatible chat-completions client (OpenRouter by default).

use super::traits::Generator;
use super::types::{Role, Turn};
use anyhow::Context;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub struct OpenRouterGenerator {
    /// Pre-computed `"Bearer <key>"` header value (avoids `format!` per request).
    cached_auth_header: Option<String>,
    cached_completions_url: String,
    model: String,
    temperature: f64,
    client: Client,
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<Message>,
    temperature: f64,
}

#[derive(Debug, Serialize)]
struct Message {
    role: &'static str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

impl OpenRouterGenerator {
    pub fn new(base_url: &str, api_key: Option<&str>, model: &str, temperature: f64) -> Self {
        let base = base_url.trim_end_matches('/');
        Self {
            cached_auth_header: api_key.map(|k| format!("Bearer {k}")),
            cached_completions_url: format!("{base}/chat/completions"),
            model: model.to_string(),
            temperature,
            client: Client::builder()
                .timeout(Duration::from_secs(30))
                .connect_timeout(Duration::from_secs(10))
                .pool_max_idle_per_host(10)
                .pool_idle_timeout(Duration::from_secs(90))
                .tcp_keepalive(Duration::from_secs(60))
                .build()
                .unwrap_or_else(|_| Client::new()),
        }
    }

    fn build_request(&self, system: Option<&str>, history: &[Turn], message: &str) -> ChatRequest {
        let mut messages = Vec::with_capacity(history.len() + 2);

        if let Some(sys) = system {
            messages.push(Message {
                role: "system",
                content: sys.to_string(),
            });
        }

        for turn in history {
            messages.push(Message {
                role: match turn.role {
                    Role::User => "user",
                    Role::Assistant => "assistant",
                },
                content: turn.content.clone(),
            });
        }

        messages.push(Message {
            role: "user",
            content: message.to_string(),
        });

        ChatRequest {
            model: self.model.clone(),
            messages,
            temperature: self.temperature,
        }
    }

    fn extract_text(chat_response: ChatResponse) -> anyhow::Result<String> {
        chat_response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| anyhow::anyhow!("No completion returned by generator"))
    }

    async fn call_api(&self, request: &ChatRequest) -> anyhow::Result<ChatResponse> {
        let auth_header = self.cached_auth_header.as_ref().ok_or_else(|| {
            anyhow::anyhow!(
                "Generator API key not set. Set MEDIQ_OPENROUTER_API_KEY or edit config.toml."
            )
        })?;

        let response = self
            .client
            .post(&self.cached_completions_url)
            .header("Authorization", auth_header)
            .json(request)
            .send()
            .await
            .context("generator request failed")?;

        if !response.status().is_success() {
            return Err(super::api_error("generator", response).await);
        }

        response
            .json()
            .await
            .context("generator response JSON decode failed")
    }
}

#[async_trait]
impl Generator for OpenRouterGenerator {
    fn name(&self) -> &'static str {
        "openrouter"
    }

    async fn chat(
        &self,
        system: Option<&str>,
        history: &[Turn],
        message: &str,
    ) -> anyhow::Result<String> {
        let request = self.build_request(system, history, message);
        let chat_response = self.call_api(&request).await?;
        Self::extract_text(chat_response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn generator() -> OpenRouterGenerator {
        OpenRouterGenerator::new(
            "https://openrouter.ai/api/v1",
            Some("sk-or-test"),
            "deepseek/deepseek-chat",
            0.4,
        )
    }

    #[test]
    fn caches_auth_header_and_url() {
        let g = generator();
        assert_eq!(g.cached_auth_header.as_deref(), Some("Bearer sk-or-test"));
        assert_eq!(
            g.cached_completions_url,
            "https://openrouter.ai/api/v1/chat/completions"
        );
    }

    #[test]
    fn trailing_slash_in_base_url_is_normalized() {
        let g = OpenRouterGenerator::new("https://example.com/v1/", None, "m", 0.0);
        assert_eq!(g.cached_completions_url, "https://example.com/v1/chat/completions");
    }

    #[tokio::test]
    async fn chat_fails_without_key() {
        let g = OpenRouterGenerator::new("https://openrouter.ai/api/v1", None, "m", 0.4);
        let result = g.generate("hello").await;
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("API key not set"));
    }

    #[test]
    fn request_serializes_system_history_and_message_in_order() {
        let g = generator();
        let history = vec![Turn::user("what is diabetes?"), Turn::assistant("…")];
        let req = g.build_request(Some("You are a medical assistant"), &history, "symptoms?");
        let json = serde_json::to_value(&req).unwrap();

        let messages = json["messages"].as_array().unwrap();
        assert_eq!(messages.len(), 4);
        assert_eq!(messages[0]["role"], "system");
        assert_eq!(messages[1]["role"], "user");
        assert_eq!(messages[2]["role"], "assistant");
        assert_eq!(messages[3]["role"], "user");
        assert_eq!(messages[3]["content"], "symptoms?");
        assert_eq!(json["model"], "deepseek/deepseek-chat");
    }

    #[test]
    fn request_without_system_omits_system_message() {
        let g = generator();
        let req = g.build_request(None, &[], "hi");
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["messages"].as_array().unwrap().len(), 1);
        assert_eq!(json["messages"][0]["role"], "user");
    }

    #[test]
    fn response_deserializes_single_choice() {
        let json = r#"{"choices":[{"message":{"content":"Hi!"}}]}"#;
        let resp: ChatResponse = serde_json::from_str(json).unwrap();
        assert_eq!(
            OpenRouterGenerator::extract_text(resp).unwrap(),
            "Hi!".to_string()
        );
    }

    #[test]
    fn empty_choices_is_an_error() {
        let resp: ChatResponse = serde_json::from_str(r#"{"choices":[]}"#).unwrap();
        assert!(OpenRouterGenerator::extract_text(resp).is_err());
    }

    #[test]
    fn null_content_is_an_error() {
        let resp: ChatResponse =
            serde_json::from_str(r#"{"choices":[{"message":{"content":null}}]}"#).unwrap();
        assert!(OpenRouterGenerator::extract_text(resp).is_err());
    }
}
