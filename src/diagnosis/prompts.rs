//! Prompt and disclaimer constants for diagnosis synthesis.

/// Differential-diagnosis prompt. `{patient_info}` and `{context}` are
/// filled at synthesis time. The JSON schema in the prompt is advisory:
/// the model output is returned verbatim, never parsed, so clients must
/// treat `diagnosis` as free text that usually follows this shape.
const DIAGNOSIS_PROMPT_TEMPLATE: &str = "\
You are a medical symptom analysis assistant. Based on the patient information provided, generate a differential diagnosis.

IMPORTANT RULES:
1. This is for EDUCATIONAL purposes only
2. Always recommend consulting a healthcare professional
3. Never diagnose definitively - only suggest possibilities
4. Flag any emergency symptoms immediately

Patient Information:
{patient_info}

Relevant Medical Knowledge:
{context}

Please provide your analysis in the following JSON format:
{
  \"differential_diagnosis\": {
    \"most_likely_conditions\": [
      {
        \"condition\": \"Name of condition\",
        \"why_it_matches\": \"Brief explanation of matching symptoms\",
        \"typical_presentation\": \"How this condition typically presents\",
        \"expected_duration\": \"Typical duration\",
        \"self_care\": \"Self-care recommendations\",
        \"when_to_see_doctor\": \"When to seek medical attention\"
      }
    ],
    \"possible_conditions\": [
      {
        \"condition\": \"Name\",
        \"explanation\": \"Why it's possible\"
      }
    ],
    \"less_likely_but_serious\": [
      {
        \"condition\": \"Name\",
        \"red_flags\": \"Warning signs to watch for\"
      }
    ],
    \"clinical_recommendation\": {
      \"urgency_level\": \"Routine/Urgent/Emergency\",
      \"timeframe\": \"When to seek care\",
      \"diagnostic_tests\": [\"List of likely tests\"]
    },
    \"what_to_monitor\": {
      \"warning_signs\": [\"Signs that need immediate attention\"],
      \"when_to_seek_immediate_care\": \"Specific guidance\"
    }
  }
}

Provide 2-3 conditions in each category based on the symptoms.";

/// Disclaimer block attached to every diagnosis response.
pub const MEDICAL_DISCLAIMER: &str = "\n\n\u{2695}\u{fe0f} MEDICAL DISCLAIMER

This is an EDUCATIONAL tool only and does NOT provide medical diagnoses.

- This assessment is NOT a substitute for professional medical advice
- Always consult a qualified healthcare provider for medical concerns
- If experiencing severe symptoms, seek emergency care immediately
- The information provided is based on general medical knowledge
- Individual cases may vary significantly

Please consult a healthcare professional for proper evaluation.";

/// Fill the diagnosis prompt with a patient summary and retrieved context.
pub fn diagnosis_prompt(patient_info: &str, context: &str) -> String {
    DIAGNOSIS_PROMPT_TEMPLATE
        .replace("{patient_info}", patient_info)
        .replace("{context}", context)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_fills_both_slots() {
        let prompt = diagnosis_prompt("Age: 30", "fever passage");
        assert!(prompt.contains("Age: 30"));
        assert!(prompt.contains("fever passage"));
        assert!(!prompt.contains("{patient_info}"));
        assert!(!prompt.contains("{context}"));
    }

    #[test]
    fn prompt_keeps_json_schema_categories() {
        let prompt = diagnosis_prompt("", "");
        for category in [
            "most_likely_conditions",
            "possible_conditions",
            "less_likely_but_serious",
            "clinical_recommendation",
            "what_to_monitor",
        ] {
            assert!(prompt.contains(category), "missing {category}");
        }
    }

    #[test]
    fn disclaimer_is_educational_only() {
        assert!(MEDICAL_DISCLAIMER.contains("EDUCATIONAL"));
        assert!(MEDICAL_DISCLAIMER.contains("NOT a substitute"));
    }
}
