use thiserror::Error;

// ─── Top-level error hierarchy ───────────────────────────────────────────────

/// Structured error hierarchy for `mediq`.
///
/// Each subsystem defines its own error variant. The gateway boundary maps
/// these to HTTP statuses; internal code continues to use `anyhow::Result`
/// for ad-hoc context chains.
#[derive(Debug, Error)]
pub enum MediqError {
    // ── Assessment / questionnaire ───────────────────────────────────────
    #[error("assessment: {0}")]
    Assessment(#[from] AssessmentError),

    // ── Chat pipeline ────────────────────────────────────────────────────
    #[error("chat: {0}")]
    Chat(#[from] ChatError),

    // ── Knowledge retrieval ──────────────────────────────────────────────
    #[error("retrieval: {0}")]
    Retrieval(#[from] RetrievalError),

    // ── Answer generation ────────────────────────────────────────────────
    #[error("generation: {0}")]
    Generation(#[from] GenerationError),

    // ── Generic fallthrough (wraps anyhow for interop) ──────────────────
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

// ─── Assessment errors ──────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum AssessmentError {
    #[error("expected answer for question '{expected}', got '{got}'")]
    OutOfOrder { expected: String, got: String },

    #[error("question '{id}' is required and cannot be empty")]
    RequiredAnswerMissing { id: String },

    #[error("answer for question '{id}' has the wrong shape: {reason}")]
    AnswerShape { id: String, reason: String },

    #[error("answer for question '{id}' is out of range ({min}..={max})")]
    OutOfRange { id: String, min: i64, max: i64 },

    #[error("assessment already finished ({status})")]
    AlreadyFinished { status: String },

    #[error("no assessment in progress")]
    NotStarted,
}

// ─── Chat errors ────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ChatError {
    #[error("message cannot be empty")]
    EmptyMessage,

    #[error("message too long (max {max} characters)")]
    MessageTooLong { max: usize },

    #[error("message too short")]
    MessageTooShort,
}

// ─── Retrieval errors ───────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum RetrievalError {
    #[error("index query failed: {0}")]
    Query(String),
}

// ─── Generation errors ──────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("provider {provider} request failed: {message}")]
    Request { provider: String, message: String },
}

// ─── Convenience re-exports ─────────────────────────────────────────────────

/// Shorthand result type for the crate.
pub type Result<T> = std::result::Result<T, MediqError>;

impl MediqError {
    /// Whether this error is the caller's fault (maps to HTTP 400 at the
    /// gateway boundary) as opposed to an upstream or internal failure.
    pub fn is_invalid_input(&self) -> bool {
        matches!(self, Self::Assessment(_) | Self::Chat(_))
    }
}
