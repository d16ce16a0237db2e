use anyhow::{Context, Result};
use directories::UserDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

// ── Top-level config ──────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Path to config.toml - computed from home, not serialized
    #[serde(skip)]
    pub config_path: PathBuf,

    #[serde(default)]
    pub gateway: GatewayConfig,

    #[serde(default)]
    pub generation: GenerationConfig,

    #[serde(default)]
    pub retrieval: RetrievalConfig,

    #[serde(default)]
    pub screening: ScreeningConfig,

    #[serde(default)]
    pub limits: LimitsConfig,

    #[serde(default)]
    pub session: SessionConfig,
}

// ── Gateway ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Gateway port (default: 8080, matching the service's public port)
    #[serde(default = "default_gateway_port")]
    pub port: u16,
    /// Gateway host (default: 127.0.0.1)
    #[serde(default = "default_gateway_host")]
    pub host: String,
}

fn default_gateway_port() -> u16 {
    8080
}

fn default_gateway_host() -> String {
    "127.0.0.1".into()
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: default_gateway_port(),
            host: default_gateway_host(),
        }
    }
}

// ── Answer generation (hosted chat-completions API) ───────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    /// OpenAI-compatible chat completions base URL.
    #[serde(default = "default_generation_base_url")]
    pub base_url: String,
    /// Model name passed through to the provider.
    #[serde(default = "default_generation_model")]
    pub model: String,
    #[serde(default = "default_temperature")]
    pub temperature: f64,
    /// API key. Overridden by MEDIQ_OPENROUTER_API_KEY / OPENROUTER_API_KEY.
    #[serde(default)]
    pub api_key: Option<String>,
}

fn default_generation_base_url() -> String {
    "https://openrouter.ai/api/v1".into()
}

fn default_generation_model() -> String {
    "deepseek/deepseek-chat".into()
}

fn default_temperature() -> f64 {
    0.4
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            base_url: default_generation_base_url(),
            model: default_generation_model(),
            temperature: default_temperature(),
            api_key: None,
        }
    }
}

// ── Knowledge retrieval (vector index + embeddings) ───────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// Vector index query endpoint (Pinecone-style host URL).
    #[serde(default)]
    pub index_url: Option<String>,
    /// Corpus/index name, pre-populated offline.
    #[serde(default = "default_index_name")]
    pub index_name: String,
    /// API key for the index. Overridden by MEDIQ_PINECONE_API_KEY / PINECONE_API_KEY.
    #[serde(default)]
    pub api_key: Option<String>,
    /// Passages returned per chat query.
    #[serde(default = "default_chat_top_k")]
    pub chat_top_k: usize,
    /// Passages returned per diagnosis query.
    #[serde(default = "default_diagnosis_top_k")]
    pub diagnosis_top_k: usize,
    /// OpenAI-compatible embeddings base URL for query embedding.
    #[serde(default = "default_embedding_base_url")]
    pub embedding_base_url: String,
    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,
    #[serde(default = "default_embedding_dimensions")]
    pub embedding_dimensions: usize,
}

fn default_index_name() -> String {
    "medical-chatbot".into()
}

fn default_chat_top_k() -> usize {
    5
}

fn default_diagnosis_top_k() -> usize {
    5
}

fn default_embedding_base_url() -> String {
    "https://api.openai.com".into()
}

fn default_embedding_model() -> String {
    "text-embedding-3-small".into()
}

fn default_embedding_dimensions() -> usize {
    384
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            index_url: None,
            index_name: default_index_name(),
            api_key: None,
            chat_top_k: default_chat_top_k(),
            diagnosis_top_k: default_diagnosis_top_k(),
            embedding_base_url: default_embedding_base_url(),
            embedding_model: default_embedding_model(),
            embedding_dimensions: default_embedding_dimensions(),
        }
    }
}

// ── Emergency screening ───────────────────────────────────────────

/// Keyword tiers are configuration data, not an algorithmic contract.
/// Empty lists mean "use the built-in canonical set".
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ScreeningConfig {
    #[serde(default)]
    pub critical_keywords: Vec<String>,
    #[serde(default)]
    pub urgent_keywords: Vec<String>,
}

// ── Rate limits ───────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LimitsConfig {
    /// Chat endpoints: requests per minute per client address.
    #[serde(default = "default_chat_per_minute")]
    pub chat_per_minute: u32,
    /// Global default: requests per hour per client address.
    #[serde(default = "default_per_hour")]
    pub per_hour: u32,
    /// Global default: requests per day per client address.
    #[serde(default = "default_per_day")]
    pub per_day: u32,
}

fn default_chat_per_minute() -> u32 {
    30
}

fn default_per_hour() -> u32 {
    50
}

fn default_per_day() -> u32 {
    200
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            chat_per_minute: default_chat_per_minute(),
            per_hour: default_per_hour(),
            per_day: default_per_day(),
        }
    }
}

// ── Sessions ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Idle sessions expire after this many hours.
    #[serde(default = "default_session_ttl_hours")]
    pub ttl_hours: u64,
}

fn default_session_ttl_hours() -> u64 {
    24
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            ttl_hours: default_session_ttl_hours(),
        }
    }
}

// ── Loading ───────────────────────────────────────────────────────

impl Config {
    pub fn load_or_init() -> Result<Self> {
        let home = UserDirs::new()
            .map(|u| u.home_dir().to_path_buf())
            .context("Could not find home directory")?;
        let mediq_dir = home.join(".mediq");
        let config_path = mediq_dir.join("config.toml");

        if !mediq_dir.exists() {
            fs::create_dir_all(&mediq_dir).context("Failed to create .mediq directory")?;
        }

        let mut config = if config_path.exists() {
            let contents =
                fs::read_to_string(&config_path).context("Failed to read config file")?;
            let mut config: Config =
                toml::from_str(&contents).context("Failed to parse config file")?;
            config.config_path.clone_from(&config_path);
            config
        } else {
            let config = Self {
                config_path: config_path.clone(),
                ..Self::default()
            };
            config.save()?;
            config
        };

        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Apply environment variable overrides (secrets are never persisted).
    pub fn apply_env_overrides(&mut self) {
        if let Ok(key) = std::env::var("MEDIQ_OPENROUTER_API_KEY")
            .or_else(|_| std::env::var("OPENROUTER_API_KEY"))
            .or_else(|_| std::env::var("DEEPSEEK_API_KEY"))
        {
            if !key.is_empty() {
                self.generation.api_key = Some(key);
            }
        }

        if let Ok(key) = std::env::var("MEDIQ_PINECONE_API_KEY")
            .or_else(|_| std::env::var("PINECONE_API_KEY"))
        {
            if !key.is_empty() {
                self.retrieval.api_key = Some(key);
            }
        }

        if let Ok(url) = std::env::var("MEDIQ_INDEX_URL") {
            if !url.is_empty() {
                self.retrieval.index_url = Some(url);
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.retrieval.chat_top_k == 0 || self.retrieval.diagnosis_top_k == 0 {
            anyhow::bail!("retrieval top_k must be at least 1");
        }
        if !(0.0..=2.0).contains(&self.generation.temperature) {
            anyhow::bail!(
                "generation temperature {} out of range 0.0..=2.0",
                self.generation.temperature
            );
        }
        if self.limits.chat_per_minute == 0 {
            anyhow::bail!("limits.chat_per_minute must be at least 1");
        }
        Ok(())
    }

    pub fn save(&self) -> Result<()> {
        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(&self.config_path, contents).context("Failed to write config file")?;
        Ok(())
    }
}
