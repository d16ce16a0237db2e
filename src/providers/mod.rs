pub mod openrouter;
pub mod scrub;
pub mod traits;
pub mod types;

pub use openrouter::OpenRouterGenerator;
pub use scrub::{api_error, sanitize_api_error};
pub use traits::Generator;
pub use types::{Role, Turn};

use crate::config::GenerationConfig;

/// Factory: build the production generator from config.
pub fn create_generator(config: &GenerationConfig) -> OpenRouterGenerator {
    OpenRouterGenerator::new(
        &config.base_url,
        config.api_key.as_deref(),
        &config.model,
        config.temperature,
    )
}
