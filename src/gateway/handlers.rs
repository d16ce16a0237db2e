use axum::{
    Form,
    extract::{ConnectInfo, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Json},
};
use serde::Deserialize;
use std::net::SocketAddr;

use super::ratelimit::Scope;
use super::AppState;
use crate::assessment::{
    AnswerMap, AnswerValue, Assessment, MAIN_SYMPTOM_ID, QUESTIONS, SubmitOutcome,
};
use crate::chat::{API_CHAT_DISCLAIMER, CHAT_INLINE_DISCLAIMER};
use crate::error::{AssessmentError, MediqError};
use crate::providers::sanitize_api_error;
use crate::screening::{self, EmergencyVerdict};

/// POST /submit_answer body
#[derive(Deserialize)]
pub struct SubmitAnswerBody {
    pub question_id: String,
    pub answer: AnswerValue,
}

/// POST /get_diagnosis body — answers are optional, the session is the
/// fallback.
#[derive(Deserialize, Default)]
pub struct DiagnosisBody {
    #[serde(default)]
    pub answers: Option<AnswerMap>,
}

/// POST /api/chat body
#[derive(Deserialize)]
pub struct ChatBody {
    #[serde(default)]
    pub message: String,
}

/// POST /get form body
#[derive(Deserialize)]
pub struct ChatForm {
    #[serde(default)]
    pub msg: String,
}

type JsonBody<T> = Result<Json<T>, axum::extract::rejection::JsonRejection>;

// ── Identity and shared response plumbing ─────────────────────────

/// Session identity: explicit `X-Session-Id` header, client address
/// otherwise.
fn session_id(headers: &HeaderMap, addr: SocketAddr) -> String {
    headers
        .get("x-session-id")
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map_or_else(|| addr.ip().to_string(), str::to_string)
}

fn rate_limited() -> (StatusCode, Json<serde_json::Value>) {
    let err = serde_json::json!({
        "error": "Rate limit exceeded. Please try again later."
    });
    (StatusCode::TOO_MANY_REQUESTS, Json(err))
}

/// Map pipeline errors to HTTP: caller mistakes get a descriptive 400,
/// everything else a generic 500 with the detail logged (sanitized) only.
fn error_response(error: &MediqError) -> (StatusCode, Json<serde_json::Value>) {
    if error.is_invalid_input() {
        let message = match error {
            MediqError::Assessment(inner) => inner.to_string(),
            MediqError::Chat(inner) => inner.to_string(),
            _ => error.to_string(),
        };
        return (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({"error": message})),
        );
    }
    tracing::error!(
        "upstream failure: {}",
        sanitize_api_error(&error.to_string())
    );
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(serde_json::json!({"error": "Internal server error"})),
    )
}

fn bad_json(rejection: &axum::extract::rejection::JsonRejection) -> (StatusCode, Json<serde_json::Value>) {
    let err = serde_json::json!({"error": format!("Invalid JSON: {rejection}")});
    (StatusCode::BAD_REQUEST, Json(err))
}

fn emergency_response(verdict: &EmergencyVerdict) -> serde_json::Value {
    serde_json::json!({
        "status": "emergency",
        "emergency": {
            "detected": true,
            "tier": verdict.tier,
            "keyword": verdict.matched_keyword,
            "message": verdict.message,
            "action": verdict.tier.action(),
        }
    })
}

// ── General routes ────────────────────────────────────────────────

/// GET /health — always public, no secrets leaked
pub(super) async fn handle_health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "services": ["chat", "symptom-checker"],
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// GET /get_questions — full questionnaire schema for clients that render
/// the assessment themselves
pub(super) async fn handle_get_questions() -> impl IntoResponse {
    Json(serde_json::json!({
        "questions": QUESTIONS,
        "total": QUESTIONS.len(),
    }))
}

// ── Assessment routes ─────────────────────────────────────────────

/// POST /start_assessment — discard any prior run and begin at question 1
pub(super) async fn handle_start_assessment(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
) -> impl IntoResponse {
    if !state.limiter.check(&addr.ip().to_string(), Scope::General) {
        return rate_limited();
    }

    let handle = state.sessions.get_or_create(&session_id(&headers, addr)).await;
    handle.lock().await.assessment = Some(Assessment::new());

    tracing::info!("symptom assessment started");
    (
        StatusCode::OK,
        Json(serde_json::json!({
            "status": "started",
            "message": "Assessment started",
            "question": QUESTIONS[0],
            "total_questions": QUESTIONS.len(),
        })),
    )
}

/// POST /submit_answer — lock-step answer submission
pub(super) async fn handle_submit_answer(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    body: JsonBody<SubmitAnswerBody>,
) -> impl IntoResponse {
    if !state.limiter.check(&addr.ip().to_string(), Scope::General) {
        return rate_limited();
    }

    let Json(body) = match body {
        Ok(b) => b,
        Err(rejection) => return bad_json(&rejection),
    };

    let handle = state.sessions.get_or_create(&session_id(&headers, addr)).await;
    let mut session = handle.lock().await;
    // Clients may submit without an explicit start; treat it as one.
    let assessment = session.assessment.get_or_insert_with(Assessment::new);

    match assessment.submit_answer(&body.question_id, body.answer, &state.tiers) {
        Ok(SubmitOutcome::Emergency(verdict)) => {
            tracing::warn!(
                keyword = verdict.matched_keyword.as_deref().unwrap_or(""),
                "emergency detected during assessment"
            );
            (StatusCode::OK, Json(emergency_response(&verdict)))
        }
        Ok(SubmitOutcome::Continue {
            question,
            current,
            total,
        }) => {
            #[allow(clippy::cast_precision_loss)]
            let progress = (current - 1) as f64 / total as f64;
            (
                StatusCode::OK,
                Json(serde_json::json!({
                    "status": "continue",
                    "question": question,
                    "progress": progress,
                    "current": current,
                    "total": total,
                })),
            )
        }
        Ok(SubmitOutcome::Complete) => (
            StatusCode::OK,
            Json(serde_json::json!({
                "status": "complete",
                "message": "All questions answered",
                "answers": assessment.answers(),
            })),
        ),
        Err(error) => error_response(&MediqError::from(error)),
    }
}

/// POST /get_diagnosis — synthesize a differential diagnosis from the
/// request body's answers or the session's completed assessment
pub(super) async fn handle_get_diagnosis(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    body: JsonBody<DiagnosisBody>,
) -> impl IntoResponse {
    if !state.limiter.check(&addr.ip().to_string(), Scope::General) {
        return rate_limited();
    }

    let body = match body {
        Ok(Json(b)) => b,
        // The body is optional entirely; only malformed JSON is an error.
        Err(axum::extract::rejection::JsonRejection::MissingJsonContentType(_)) => {
            DiagnosisBody::default()
        }
        Err(rejection) => return bad_json(&rejection),
    };

    let handle = state.sessions.get_or_create(&session_id(&headers, addr)).await;
    let mut session = handle.lock().await;

    let answers = match body.answers.filter(|a| !a.is_empty()) {
        Some(answers) => answers,
        None => match session.assessment.as_ref() {
            Some(assessment) if !assessment.answers().is_empty() => {
                assessment.answers().clone()
            }
            _ => {
                return error_response(&MediqError::from(AssessmentError::NotStarted));
            }
        },
    };

    // Final safety check: the stored main symptom may have slipped past an
    // older keyword list.
    if let Some(text) = answers.get(MAIN_SYMPTOM_ID).and_then(AnswerValue::as_text) {
        let verdict = screening::screen(text, &state.tiers);
        if verdict.is_emergency {
            tracing::warn!(
                keyword = verdict.matched_keyword.as_deref().unwrap_or(""),
                "emergency detected at diagnosis time"
            );
            return (StatusCode::OK, Json(emergency_response(&verdict)));
        }
    }

    match state.diagnosis.synthesize(&answers).await {
        Ok(result) => {
            tracing::info!("diagnosis generated");
            session.assessment = None;
            (
                StatusCode::OK,
                Json(serde_json::json!({
                    "status": "success",
                    "diagnosis": result.diagnosis,
                    "disclaimer": result.disclaimer,
                    "patient_summary": result.patient_summary,
                })),
            )
        }
        Err(error) => error_response(&error),
    }
}

/// POST /reset — abandon the in-progress assessment
pub(super) async fn handle_reset(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
) -> impl IntoResponse {
    if !state.limiter.check(&addr.ip().to_string(), Scope::General) {
        return rate_limited();
    }

    if let Some(handle) = state.sessions.get(&session_id(&headers, addr)).await {
        handle.lock().await.assessment = None;
    }
    (StatusCode::OK, Json(serde_json::json!({"status": "reset"})))
}

// ── Chat routes ───────────────────────────────────────────────────

/// POST /api/chat — JSON chat endpoint; disclaimer as a separate field
pub(super) async fn handle_api_chat(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    body: JsonBody<ChatBody>,
) -> impl IntoResponse {
    if !state.limiter.check(&addr.ip().to_string(), Scope::Chat) {
        return rate_limited();
    }

    let Json(body) = match body {
        Ok(b) => b,
        Err(rejection) => return bad_json(&rejection),
    };

    match run_chat(&state, &session_id(&headers, addr), &body.message).await {
        Ok((answer, conversation_length)) => (
            StatusCode::OK,
            Json(serde_json::json!({
                "answer": answer,
                "disclaimer": API_CHAT_DISCLAIMER,
                "conversation_length": conversation_length,
            })),
        ),
        Err(error) => error_response(&error),
    }
}

/// POST /get — form-encoded chat endpoint; disclaimer inline in the answer
pub(super) async fn handle_form_chat(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Form(form): Form<ChatForm>,
) -> impl IntoResponse {
    if !state.limiter.check(&addr.ip().to_string(), Scope::Chat) {
        return rate_limited();
    }

    match run_chat(&state, &session_id(&headers, addr), &form.msg).await {
        Ok((answer, conversation_length)) => (
            StatusCode::OK,
            Json(serde_json::json!({
                "answer": format!("{answer}{CHAT_INLINE_DISCLAIMER}"),
                "conversation_length": conversation_length,
            })),
        ),
        Err(error) => error_response(&error),
    }
}

/// POST /clear — drop chat history, keep any assessment
pub(super) async fn handle_clear(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
) -> impl IntoResponse {
    if !state.limiter.check(&addr.ip().to_string(), Scope::General) {
        return rate_limited();
    }

    if let Some(handle) = state.sessions.get(&session_id(&headers, addr)).await {
        handle.lock().await.clear_chat();
    }
    tracing::info!("chat conversation cleared");
    (
        StatusCode::OK,
        Json(serde_json::json!({
            "status": "success",
            "message": "Conversation cleared",
        })),
    )
}

/// One chat exchange: answer the message against the session history, then
/// record the exchange. The session stays locked throughout so concurrent
/// messages on one session serialize.
async fn run_chat(
    state: &AppState,
    session_id: &str,
    message: &str,
) -> crate::error::Result<(String, usize)> {
    let handle = state.sessions.get_or_create(session_id).await;
    let mut session = handle.lock().await;

    let answer = state.chat.answer(message, &session.chat_history).await?;
    session.record_exchange(message.trim(), &answer);

    Ok((answer, session.chat_history.len()))
}
