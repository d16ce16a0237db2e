mod questionnaire;
mod state;

pub use questionnaire::{AnswerValue, MAIN_SYMPTOM_ID, QUESTIONS, Question, QuestionKind};
pub use state::{AnswerMap, Assessment, Status, SubmitOutcome};
