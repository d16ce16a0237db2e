//! Assessment state machine: one in-progress questionnaire per session.

use super::questionnaire::{AnswerValue, MAIN_SYMPTOM_ID, QUESTIONS, Question, QuestionKind};
use crate::error::AssessmentError;
use crate::screening::{self, EmergencyVerdict, TierDefinitions};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    InProgress,
    Complete,
    EmergencyAborted,
}

impl Status {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::InProgress => "in_progress",
            Self::Complete => "complete",
            Self::EmergencyAborted => "emergency_aborted",
        }
    }
}

/// Outcome of a `submit_answer` transition.
#[derive(Debug, Clone)]
pub enum SubmitOutcome {
    /// The main-symptom answer matched an emergency keyword; the answer was
    /// not recorded and the assessment aborted.
    Emergency(EmergencyVerdict),
    /// Answer recorded, more questions remain.
    Continue {
        question: &'static Question,
        current: usize,
        total: usize,
    },
    /// Answer recorded and the questionnaire is exhausted.
    Complete,
}

/// Answer map keyed by question id. `BTreeMap` keeps serialization order
/// stable across runs.
pub type AnswerMap = BTreeMap<String, AnswerValue>;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Assessment {
    answers: AnswerMap,
    cursor: usize,
    status: Status,
}

impl Default for Assessment {
    fn default() -> Self {
        Self::new()
    }
}

impl Assessment {
    pub fn new() -> Self {
        Self {
            answers: AnswerMap::new(),
            cursor: 0,
            status: Status::InProgress,
        }
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn answers(&self) -> &AnswerMap {
        &self.answers
    }

    pub fn into_answers(self) -> AnswerMap {
        self.answers
    }

    pub fn total_questions() -> usize {
        QUESTIONS.len()
    }

    /// The question at the cursor, or `None` once the assessment is terminal.
    pub fn current_question(&self) -> Option<&'static Question> {
        if self.status != Status::InProgress {
            return None;
        }
        QUESTIONS.get(self.cursor)
    }

    /// Record one answer and advance. The client submits in lock-step; an id
    /// that doesn't match the cursor is rejected rather than trusted, so a
    /// confused client cannot corrupt the answer map.
    pub fn submit_answer(
        &mut self,
        question_id: &str,
        value: AnswerValue,
        tiers: &TierDefinitions,
    ) -> Result<SubmitOutcome, AssessmentError> {
        if self.status != Status::InProgress {
            return Err(AssessmentError::AlreadyFinished {
                status: self.status.as_str().to_string(),
            });
        }

        let question = QUESTIONS
            .get(self.cursor)
            .ok_or(AssessmentError::NotStarted)?;

        if question.id != question_id {
            return Err(AssessmentError::OutOfOrder {
                expected: question.id.to_string(),
                got: question_id.to_string(),
            });
        }

        validate_answer(question, &value)?;

        // Emergency screening gates the designated free-text field before
        // anything is recorded.
        if question.kind == QuestionKind::Text && question.id == MAIN_SYMPTOM_ID {
            if let Some(text) = value.as_text() {
                let verdict = screening::screen(text, tiers);
                if verdict.is_emergency {
                    self.status = Status::EmergencyAborted;
                    return Ok(SubmitOutcome::Emergency(verdict));
                }
            }
        }

        self.answers.insert(question.id.to_string(), value);
        self.cursor += 1;

        if self.cursor >= QUESTIONS.len() {
            self.status = Status::Complete;
            return Ok(SubmitOutcome::Complete);
        }

        Ok(SubmitOutcome::Continue {
            question: &QUESTIONS[self.cursor],
            current: self.cursor + 1,
            total: QUESTIONS.len(),
        })
    }
}

fn validate_answer(question: &Question, value: &AnswerValue) -> Result<(), AssessmentError> {
    if question.required && value.is_empty() {
        return Err(AssessmentError::RequiredAnswerMissing {
            id: question.id.to_string(),
        });
    }

    match question.kind {
        QuestionKind::Text => match value {
            AnswerValue::Text(_) => Ok(()),
            _ => Err(shape_error(question, "expected free text")),
        },
        QuestionKind::Choice => match value {
            AnswerValue::Text(choice) => {
                if value.is_empty() && !question.required {
                    return Ok(());
                }
                if question.options.contains(&choice.as_str()) {
                    Ok(())
                } else {
                    Err(shape_error(question, "not one of the listed options"))
                }
            }
            _ => Err(shape_error(question, "expected one of the listed options")),
        },
        QuestionKind::Multiselect => match value {
            AnswerValue::Selection(selected) => {
                if let Some(unknown) = selected
                    .iter()
                    .find(|s| !question.options.contains(&s.as_str()))
                {
                    return Err(shape_error(
                        question,
                        &format!("'{unknown}' is not a listed option"),
                    ));
                }
                Ok(())
            }
            _ => Err(shape_error(question, "expected a list of options")),
        },
        QuestionKind::Scale | QuestionKind::Number => match value {
            AnswerValue::Number(n) => {
                let min = question.min.unwrap_or(i64::MIN);
                let max = question.max.unwrap_or(i64::MAX);
                if (min..=max).contains(n) {
                    Ok(())
                } else {
                    Err(AssessmentError::OutOfRange {
                        id: question.id.to_string(),
                        min,
                        max,
                    })
                }
            }
            _ => Err(shape_error(question, "expected a number")),
        },
    }
}

fn shape_error(question: &Question, reason: &str) -> AssessmentError {
    AssessmentError::AnswerShape {
        id: question.id.to_string(),
        reason: reason.to_string(),
    }
}
