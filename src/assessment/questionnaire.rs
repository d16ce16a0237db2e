//! Fixed ordered questionnaire schema. Immutable and process-wide.

use serde::{Deserialize, Serialize};

/// Question id whose free-text answer is screened for emergencies.
pub const MAIN_SYMPTOM_ID: &str = "main_symptom";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum QuestionKind {
    Text,
    Choice,
    Scale,
    Multiselect,
    Number,
}

fn slice_is_empty(options: &&'static [&'static str]) -> bool {
    options.is_empty()
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct Question {
    pub id: &'static str,
    #[serde(rename = "question")]
    pub prompt: &'static str,
    #[serde(rename = "type")]
    pub kind: QuestionKind,
    #[serde(skip_serializing_if = "slice_is_empty")]
    pub options: &'static [&'static str],
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<i64>,
    pub required: bool,
}

/// The assessment questionnaire, in submission order.
pub const QUESTIONS: &[Question] = &[
    Question {
        id: MAIN_SYMPTOM_ID,
        prompt: "What is your main symptom or health concern?",
        kind: QuestionKind::Text,
        options: &[],
        min: None,
        max: None,
        required: true,
    },
    Question {
        id: "duration",
        prompt: "When did this symptom start?",
        kind: QuestionKind::Choice,
        options: &[
            "Less than 24 hours ago",
            "1-3 days ago",
            "4-7 days ago",
            "1-4 weeks ago",
            "More than a month ago",
        ],
        min: None,
        max: None,
        required: true,
    },
    Question {
        id: "severity",
        prompt: "On a scale of 1-10, how severe is this symptom?",
        kind: QuestionKind::Scale,
        options: &[],
        min: Some(1),
        max: Some(10),
        required: true,
    },
    Question {
        id: "additional_symptoms",
        prompt: "Are you experiencing any of these additional symptoms?",
        kind: QuestionKind::Multiselect,
        options: &[
            "Fever",
            "Fatigue",
            "Nausea",
            "Vomiting",
            "Diarrhea",
            "Headache",
            "Cough",
            "Shortness of breath",
            "Dizziness",
            "Body aches",
            "Loss of appetite",
        ],
        min: None,
        max: None,
        required: false,
    },
    Question {
        id: "age",
        prompt: "What is your age?",
        kind: QuestionKind::Number,
        options: &[],
        min: Some(0),
        max: Some(130),
        required: true,
    },
    Question {
        id: "chronic_conditions",
        prompt: "Do you have any chronic medical conditions?",
        kind: QuestionKind::Text,
        options: &[],
        min: None,
        max: None,
        required: false,
    },
    Question {
        id: "medications",
        prompt: "Are you currently taking any medications?",
        kind: QuestionKind::Text,
        options: &[],
        min: None,
        max: None,
        required: false,
    },
];

/// A submitted answer. Shape depends on the question kind: free text or a
/// chosen option (string), selected options (string list), or a number.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AnswerValue {
    Number(i64),
    Text(String),
    Selection(Vec<String>),
}

impl AnswerValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// True when the value carries no usable content.
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Number(_) => false,
            Self::Text(s) => s.trim().is_empty(),
            Self::Selection(items) => items.iter().all(|s| s.trim().is_empty()),
        }
    }
}
