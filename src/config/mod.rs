pub mod schema;

pub use schema::{
    Config, GatewayConfig, GenerationConfig, LimitsConfig, RetrievalConfig, ScreeningConfig,
    SessionConfig,
};
