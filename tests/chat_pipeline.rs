//! Chat pipeline against mocked upstream HTTP services: an
//! OpenAI-compatible completions endpoint, an embeddings endpoint, and a
//! Pinecone-style index.

use std::sync::Arc;

use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

use mediq::chat::ChatPipeline;
use mediq::providers::{Generator, OpenRouterGenerator, Turn};
use mediq::retrieval::{Embedder, OpenAiEmbedder, PineconeRetriever, Retriever};

fn completion_body(content: &str) -> serde_json::Value {
    json!({
        "id": "gen-1",
        "choices": [
            {"index": 0, "message": {"role": "assistant", "content": content}}
        ]
    })
}

#[tokio::test]
async fn generator_sends_model_temperature_and_bearer_auth() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(header("authorization", "Bearer test-key"))
        .and(body_partial_json(json!({
            "model": "deepseek/deepseek-chat",
            "temperature": 0.4,
            "messages": [{"role": "user", "content": "what causes migraines?"}],
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion_body("Often triggers.")))
        .expect(1)
        .mount(&server)
        .await;

    let generator =
        OpenRouterGenerator::new(&server.uri(), Some("test-key"), "deepseek/deepseek-chat", 0.4);
    let answer = generator.generate("what causes migraines?").await.unwrap();

    assert_eq!(answer, "Often triggers.");
    server.verify().await;
}

#[tokio::test]
async fn generator_upstream_error_does_not_leak_auth() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(
            ResponseTemplate::new(401).set_body_string("unauthorized: Bearer sk-or-leaked-key"),
        )
        .mount(&server)
        .await;

    let generator = OpenRouterGenerator::new(&server.uri(), Some("sk-or-leaked-key"), "m", 0.4);
    let error = generator.generate("hello").await.unwrap_err();

    let rendered = format!("{error:#}");
    assert!(!rendered.contains("sk-or-leaked-key"), "{rendered}");
}

#[tokio::test]
async fn retriever_embeds_then_queries_the_index() {
    let embedding_server = MockServer::start().await;
    let index_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/embeddings"))
        .and(header("authorization", "Bearer pc-key"))
        .and(body_partial_json(json!({
            "model": "text-embedding-3-small",
            "input": "migraine triggers",
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{"embedding": [0.1, 0.2, 0.3]}]
        })))
        .expect(1)
        .mount(&embedding_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/query"))
        .and(header("api-key", "pc-key"))
        .and(body_partial_json(json!({
            "vector": [0.1, 0.2, 0.3],
            "topK": 5,
            "includeMetadata": true,
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "matches": [
                {"id": "a", "score": 0.92, "metadata": {"text": "Common migraine triggers include stress.", "source": "neuro.pdf"}},
                {"id": "b", "score": 0.80, "metadata": {"text": "Hydration matters."}},
                {"id": "c", "score": 0.50, "metadata": {}}
            ]
        })))
        .expect(1)
        .mount(&index_server)
        .await;

    let embedder: Arc<dyn Embedder> = Arc::new(OpenAiEmbedder::new(
        &embedding_server.uri(),
        Some("pc-key"),
        "text-embedding-3-small",
        3,
    ));
    let retriever = PineconeRetriever::new(
        &index_server.uri(),
        "medical-chatbot",
        Some("pc-key"),
        embedder,
    );

    let passages = retriever.search("migraine triggers", 5).await.unwrap();

    assert_eq!(passages.len(), 2);
    assert_eq!(passages[0].text, "Common migraine triggers include stress.");
    assert_eq!(passages[0].source.as_deref(), Some("neuro.pdf"));
    assert!(passages[0].score.unwrap() > 0.9);

    embedding_server.verify().await;
    index_server.verify().await;
}

#[tokio::test]
async fn pipeline_with_history_runs_rewrite_retrieve_generate() {
    let llm = MockServer::start().await;
    let embeddings = MockServer::start().await;
    let index = MockServer::start().await;

    // Rewrite call: the contextualizer system prompt is first.
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(body_partial_json(json!({
            "messages": [{"role": "system"}]
        })))
        .and(wiremock::matchers::body_string_contains("standalone question"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(completion_body("What are the symptoms of diabetes?")),
        )
        .expect(1)
        .mount(&llm)
        .await;

    // QA call: the grounded system prompt carries the retrieved passage.
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(wiremock::matchers::body_string_contains("retrieved context"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(completion_body("Thirst, fatigue, and weight loss.")),
        )
        .expect(1)
        .mount(&llm)
        .await;

    Mock::given(method("POST"))
        .and(path("/v1/embeddings"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{"embedding": [0.5, 0.5]}]
        })))
        .mount(&embeddings)
        .await;

    Mock::given(method("POST"))
        .and(path("/query"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "matches": [
                {"score": 0.9, "metadata": {"text": "Diabetes symptom overview."}}
            ]
        })))
        .mount(&index)
        .await;

    let generator: Arc<dyn Generator> = Arc::new(OpenRouterGenerator::new(
        &llm.uri(),
        Some("key"),
        "deepseek/deepseek-chat",
        0.4,
    ));
    let embedder: Arc<dyn Embedder> = Arc::new(OpenAiEmbedder::new(
        &embeddings.uri(),
        Some("key"),
        "text-embedding-3-small",
        2,
    ));
    let retriever: Arc<dyn Retriever> = Arc::new(PineconeRetriever::new(
        &index.uri(),
        "medical-chatbot",
        Some("key"),
        embedder,
    ));

    let pipeline = ChatPipeline::new(generator, retriever, 5);
    let history = vec![
        Turn::user("tell me about diabetes"),
        Turn::assistant("Diabetes is a metabolic disorder."),
    ];

    let answer = pipeline
        .answer("What are the symptoms?", &history)
        .await
        .unwrap();
    assert_eq!(answer, "Thirst, fatigue, and weight loss.");

    // The index saw the rewritten question as the embedding input.
    let embed_requests = embeddings.received_requests().await.unwrap();
    assert_eq!(embed_requests.len(), 1);
    let embed_body: serde_json::Value = embed_requests[0].body_json().unwrap();
    assert_eq!(embed_body["input"], "What are the symptoms of diabetes?");

    llm.verify().await;
}

#[tokio::test]
async fn pipeline_without_history_skips_the_rewrite_call() {
    let llm = MockServer::start().await;
    let embeddings = MockServer::start().await;
    let index = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(completion_body("Rest and fluids.")),
        )
        .expect(1)
        .mount(&llm)
        .await;

    Mock::given(method("POST"))
        .and(path("/v1/embeddings"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{"embedding": [1.0]}]
        })))
        .mount(&embeddings)
        .await;

    Mock::given(method("POST"))
        .and(path("/query"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"matches": []})))
        .mount(&index)
        .await;

    let generator: Arc<dyn Generator> = Arc::new(OpenRouterGenerator::new(
        &llm.uri(),
        Some("key"),
        "deepseek/deepseek-chat",
        0.4,
    ));
    let embedder: Arc<dyn Embedder> = Arc::new(OpenAiEmbedder::new(
        &embeddings.uri(),
        Some("key"),
        "text-embedding-3-small",
        1,
    ));
    let retriever: Arc<dyn Retriever> = Arc::new(PineconeRetriever::new(
        &index.uri(),
        "medical-chatbot",
        Some("key"),
        embedder,
    ));

    let pipeline = ChatPipeline::new(generator, retriever, 5);
    let answer = pipeline.answer("what helps a cold?", &[]).await.unwrap();

    assert_eq!(answer, "Rest and fluids.");
    let llm_requests: Vec<Request> = llm.received_requests().await.unwrap();
    assert_eq!(llm_requests.len(), 1);
}
