pub mod prompts;
pub mod synthesizer;

pub use prompts::MEDICAL_DISCLAIMER;
pub use synthesizer::{DiagnosisResult, DiagnosisSynthesizer, format_patient_summary};
