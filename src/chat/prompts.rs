//! Fixed prompt templates for the conversational QA pipeline.
//!
//! Wording is load-bearing: the grounding rules and the "don't answer,
//! just reformulate" instruction are what keep the pipeline safe.
//! Change with care.

/// System prompt for grounded question answering. `{context}` is filled
/// with the retrieved passages.
const QA_SYSTEM_PROMPT_TEMPLATE: &str = "\
You are a medical assistant for question-answering tasks. \
Use the following pieces of retrieved context to answer the question.

IMPORTANT GUIDELINES:
1. If you don't know the answer, say that you don't know - never make up medical information
2. Use three sentences maximum and keep the answer concise
3. If this is a follow-up question, consider the conversation history to provide contextually relevant answers
4. Always prioritize patient safety in your responses
5. For serious symptoms, advise consulting a healthcare professional

Context: {context}";

/// System prompt for rewriting a follow-up into a standalone question.
pub const CONTEXTUALIZE_PROMPT: &str = "\
Given a chat history and the latest user question \
which might reference context in the chat history, \
formulate a standalone question which can be understood \
without the chat history.

Do NOT answer the question, just reformulate it if needed \
and otherwise return it as is.

Examples:
- If user asks 'What are the symptoms?' after discussing diabetes, \
reformulate to 'What are the symptoms of diabetes?'
- If user asks 'How is it treated?' after discussing hypertension, \
reformulate to 'How is hypertension treated?'
- If the question is already clear and standalone, return it unchanged";

/// Disclaimer appended inline to the answer body (form endpoint).
pub const CHAT_INLINE_DISCLAIMER: &str = "\n\n\u{2695}\u{fe0f} Disclaimer: \
This is AI-generated information. Always consult a qualified healthcare \
professional for medical advice.";

/// Disclaimer returned as a separate field (JSON API endpoint).
pub const API_CHAT_DISCLAIMER: &str = "This is AI-generated information. \
Always consult a qualified healthcare professional.";

/// Fill the QA system prompt with retrieved context.
pub fn qa_system_prompt(context: &str) -> String {
    QA_SYSTEM_PROMPT_TEMPLATE.replace("{context}", context)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn qa_prompt_embeds_context() {
        let prompt = qa_system_prompt("aspirin inhibits platelet aggregation");
        assert!(prompt.contains("aspirin inhibits platelet aggregation"));
        assert!(!prompt.contains("{context}"));
    }

    #[test]
    fn qa_prompt_keeps_safety_guidelines() {
        let prompt = qa_system_prompt("");
        assert!(prompt.contains("three sentences maximum"));
        assert!(prompt.contains("say that you don't know"));
    }

    #[test]
    fn contextualize_prompt_forbids_answering() {
        assert!(CONTEXTUALIZE_PROMPT.contains("Do NOT answer the question"));
    }
}
