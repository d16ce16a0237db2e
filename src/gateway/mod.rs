//! Axum-based HTTP gateway.
//!
//! One shared [`AppState`] behind every handler, with body limits (64KB),
//! a request timeout (30s), and permissive CORS so browser frontends on
//! other origins can call the JSON API directly.

mod handlers;
mod ratelimit;

pub use ratelimit::{RateLimiter, Scope};

use handlers::{
    handle_api_chat, handle_clear, handle_form_chat, handle_get_diagnosis, handle_get_questions,
    handle_health, handle_reset, handle_start_assessment, handle_submit_answer,
};

use crate::chat::ChatPipeline;
use crate::config::Config;
use crate::diagnosis::DiagnosisSynthesizer;
use crate::providers::Generator;
use crate::retrieval::Retriever;
use crate::screening::TierDefinitions;
use crate::sessions::{InMemorySessionStore, SessionStore};
use anyhow::Result;
use axum::{
    Router,
    http::StatusCode,
    routing::{get, post},
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::CorsLayer;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::timeout::TimeoutLayer;

/// Maximum request body size (64KB)
pub const MAX_BODY_SIZE: usize = 65_536;
/// Request timeout (30s)
pub const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Shared state for all axum handlers
#[derive(Clone)]
pub struct AppState {
    pub chat: Arc<ChatPipeline>,
    pub diagnosis: Arc<DiagnosisSynthesizer>,
    pub sessions: Arc<dyn SessionStore>,
    pub tiers: Arc<TierDefinitions>,
    pub limiter: Arc<RateLimiter>,
}

impl AppState {
    /// Wire the pipelines from already-built collaborators. Tests inject
    /// stubs here; production goes through [`run_gateway`].
    pub fn new(
        generator: Arc<dyn Generator>,
        retriever: Arc<dyn Retriever>,
        config: &Config,
    ) -> Self {
        Self {
            chat: Arc::new(ChatPipeline::new(
                generator.clone(),
                retriever.clone(),
                config.retrieval.chat_top_k,
            )),
            diagnosis: Arc::new(DiagnosisSynthesizer::new(
                generator,
                retriever,
                config.retrieval.diagnosis_top_k,
            )),
            sessions: Arc::new(InMemorySessionStore::new(config.session.ttl_hours)),
            tiers: Arc::new(TierDefinitions::from_config(&config.screening)),
            limiter: Arc::new(RateLimiter::new(&config.limits)),
        }
    }
}

/// Build the full route table over `state`.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handle_health))
        .route("/get_questions", get(handle_get_questions))
        .route("/start_assessment", post(handle_start_assessment))
        .route("/submit_answer", post(handle_submit_answer))
        .route("/get_diagnosis", post(handle_get_diagnosis))
        .route("/api/chat", post(handle_api_chat))
        .route("/get", post(handle_form_chat))
        .route("/clear", post(handle_clear))
        .route("/reset", post(handle_reset))
        .with_state(state)
        .layer(RequestBodyLimitLayer::new(MAX_BODY_SIZE))
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(REQUEST_TIMEOUT_SECS),
        ))
        .layer(CorsLayer::permissive())
}

/// Bind and run the HTTP gateway.
pub async fn run_gateway(host: &str, port: u16, config: Config) -> Result<()> {
    let addr: SocketAddr = format!("{host}:{port}").parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    run_gateway_with_listener(listener, config).await
}

/// Run the HTTP gateway from a pre-bound listener.
pub async fn run_gateway_with_listener(
    listener: tokio::net::TcpListener,
    config: Config,
) -> Result<()> {
    let generator: Arc<dyn Generator> =
        Arc::new(crate::providers::create_generator(&config.generation));
    let retriever: Arc<dyn Retriever> =
        Arc::new(crate::retrieval::create_retriever(&config.retrieval)?);

    let state = AppState::new(generator, retriever, &config);
    let app = build_router(state);

    let addr = listener.local_addr()?;
    tracing::info!(%addr, "gateway listening");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        tracing::info!("shutdown signal received");
    }
}
