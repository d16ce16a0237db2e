pub mod pipeline;
pub mod prompts;

pub use pipeline::{ChatPipeline, MAX_MESSAGE_CHARS, MIN_MESSAGE_CHARS, validate_message};
pub use prompts::{API_CHAT_DISCLAIMER, CHAT_INLINE_DISCLAIMER};
