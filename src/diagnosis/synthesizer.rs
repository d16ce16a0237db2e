//! Differential-diagnosis synthesis from completed assessment answers.

use std::sync::Arc;

use serde::Serialize;
use tracing::info;

use super::prompts::{MEDICAL_DISCLAIMER, diagnosis_prompt};
use crate::assessment::{AnswerMap, AnswerValue, MAIN_SYMPTOM_ID};
use crate::error::{GenerationError, Result, RetrievalError};
use crate::providers::Generator;
use crate::retrieval::{Retriever, join_passages};

/// Result of one synthesis run. `diagnosis` is the model output verbatim
/// (the prompt asks for JSON, but nothing enforces it).
#[derive(Debug, Clone, Serialize)]
pub struct DiagnosisResult {
    pub diagnosis: String,
    pub disclaimer: &'static str,
    pub patient_summary: String,
}

fn render_value(value: &AnswerValue) -> String {
    match value {
        AnswerValue::Number(n) => n.to_string(),
        AnswerValue::Text(s) => s.trim().to_string(),
        AnswerValue::Selection(items) => items
            .iter()
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(", "),
    }
}

/// Format answers for the prompt and the `patient_summary` response field.
///
/// Field order is fixed so the same answers always produce byte-identical
/// output. Absent or empty answers are omitted, not rendered blank.
pub fn format_patient_summary(answers: &AnswerMap) -> String {
    let mut lines = Vec::new();

    let mut push = |label: &str, id: &str, suffix: &str| {
        if let Some(value) = answers.get(id) {
            if !value.is_empty() {
                lines.push(format!("{label}: {}{suffix}", render_value(value)));
            }
        }
    };

    push("Age", "age", "");
    push("Main Symptom", MAIN_SYMPTOM_ID, "");
    push("Duration", "duration", "");
    push("Severity", "severity", "/10");
    push("Additional Symptoms", "additional_symptoms", "");
    push("Chronic Conditions", "chronic_conditions", "");
    push("Current Medications", "medications", "");

    lines.join("\n")
}

/// Retrieval query: the main symptom plus space-joined additional symptoms.
pub fn retrieval_query(answers: &AnswerMap) -> String {
    let main = answers
        .get(MAIN_SYMPTOM_ID)
        .and_then(AnswerValue::as_text)
        .unwrap_or_default()
        .trim();

    let additional = match answers.get("additional_symptoms") {
        Some(AnswerValue::Selection(items)) => items
            .iter()
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(" "),
        Some(AnswerValue::Text(s)) => s.trim().to_string(),
        _ => String::new(),
    };

    if additional.is_empty() {
        main.to_string()
    } else {
        format!("{main} {additional}")
    }
}

pub struct DiagnosisSynthesizer {
    generator: Arc<dyn Generator>,
    retriever: Arc<dyn Retriever>,
    top_k: usize,
}

impl DiagnosisSynthesizer {
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

    /// One retrieval, one generation, no retry.
    pub async fn synthesize(&self, answers: &AnswerMap) -> Result<DiagnosisResult> {
        let patient_summary = format_patient_summary(answers);
        let query = retrieval_query(answers);

        let passages = self
            .retriever
            .search(&query, self.top_k)
            .await
            .map_err(|error| RetrievalError::Query(format!("{error:#}")))?;
        info!(passages = passages.len(), "retrieved context for diagnosis");

        let prompt = diagnosis_prompt(&patient_summary, &join_passages(&passages));
        let diagnosis = self
            .generator
            .generate(&prompt)
            .await
            .map_err(|error| GenerationError::Request {
                provider: self.generator.name().to_string(),
                message: format!("{error:#}"),
            })?;

        Ok(DiagnosisResult {
            diagnosis,
            disclaimer: MEDICAL_DISCLAIMER,
            patient_summary,
        })
    }
}
