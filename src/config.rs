use crate::core::fallback::FallbackTrigger;
use crate::core::grounding::DEFAULT_SYSTEM_PROMPT;
use crate::services::completion::DEFAULT_API_URL;
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

/// Application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub server: ServerSettings,
    pub database: DatabaseSettings,
    #[serde(default)]
    pub llm: LlmSettings,
    #[serde(default)]
    pub matching: MatchingSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    pub workers: Option<usize>,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            workers: None,
        }
    }
}

fn default_host() -> String { "0.0.0.0".to_string() }
fn default_port() -> u16 { 3000 }

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSettings {
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
    #[serde(default = "default_acquire_timeout_secs")]
    pub acquire_timeout_secs: u64,
    #[serde(default = "default_idle_timeout_secs")]
    pub idle_timeout_secs: u64,
    #[serde(default = "default_true")]
    pub run_migrations: bool,
}

fn default_max_connections() -> u32 { 10 }
fn default_min_connections() -> u32 { 1 }
fn default_acquire_timeout_secs() -> u64 { 5 }
fn default_idle_timeout_secs() -> u64 { 600 }
fn default_true() -> bool { true }

/// Chat completion settings
#[derive(Debug, Clone, Deserialize)]
pub struct LlmSettings {
    #[serde(default = "default_api_url")]
    pub api_url: String,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_model")]
    pub default_model: String,
    #[serde(default = "default_fallback_models")]
    pub fallback_models: Vec<String>,
    #[serde(default)]
    pub fallback_trigger: FallbackTrigger,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_attempt_timeout_secs")]
    pub attempt_timeout_secs: u64,
    #[serde(default = "default_grounding_sample_size")]
    pub grounding_sample_size: usize,
    #[serde(default)]
    pub system_prompt: Option<String>,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            api_key: None,
            default_model: default_model(),
            fallback_models: default_fallback_models(),
            fallback_trigger: FallbackTrigger::default(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            request_timeout_secs: default_request_timeout_secs(),
            attempt_timeout_secs: default_attempt_timeout_secs(),
            grounding_sample_size: default_grounding_sample_size(),
            system_prompt: None,
        }
    }
}

impl LlmSettings {
    pub fn system_prompt(&self) -> &str {
        self.system_prompt.as_deref().unwrap_or(DEFAULT_SYSTEM_PROMPT)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn attempt_timeout(&self) -> Duration {
        Duration::from_secs(self.attempt_timeout_secs)
    }
}

fn default_api_url() -> String { DEFAULT_API_URL.to_string() }
fn default_model() -> String { "llama-3.1-8b-instant".to_string() }
fn default_fallback_models() -> Vec<String> {
    vec![
        "llama-3.1-70b-versatile".to_string(),
        "mixtral-8x7b".to_string(),
        "gemma2-9b-it".to_string(),
    ]
}
fn default_temperature() -> f32 { 0.5 }
fn default_max_tokens() -> u32 { 300 }
fn default_request_timeout_secs() -> u64 { 30 }
fn default_attempt_timeout_secs() -> u64 { 20 }
fn default_grounding_sample_size() -> usize { 15 }

#[derive(Debug, Clone, Deserialize)]
pub struct MatchingSettings {
    #[serde(default = "default_match_limit")]
    pub limit: usize,
}

impl Default for MatchingSettings {
    fn default() -> Self {
        Self { limit: default_match_limit() }
    }
}

fn default_match_limit() -> usize { 5 }

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

fn default_log_level() -> String { "info".to_string() }
fn default_log_format() -> String { "json".to_string() }

impl Settings {
    /// Load configuration from file and environment variables
    ///
    /// Configuration is loaded in the following order (later overrides earlier):
    /// 1. Default values in the struct
    /// 2. Configuration file (config/default.toml)
    /// 3. Local overrides (config/local.toml)
    /// 4. Environment variables (prefixed with NOURISH_)
    /// 5. Well-known variables: DATABASE_URL, GROQ_API_KEY, LLM_MODEL, PORT
    pub fn load() -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            .add_source(nourish_environment())
            .build()?;

        let settings = apply_env_overrides(settings, |key| std::env::var(key).ok())?;

        settings.try_deserialize()
    }

    /// Load configuration from a custom path, with the same environment layers as `load`
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        Self::load_from_with(path, |key| std::env::var(key).ok())
    }

    fn load_from_with<P, F>(path: P, lookup: F) -> Result<Self, ConfigError>
    where
        P: AsRef<Path>,
        F: Fn(&str) -> Option<String>,
    {
        let settings = Config::builder()
            .add_source(File::from(path.as_ref()))
            .add_source(nourish_environment())
            .build()?;

        apply_env_overrides(settings, lookup)?.try_deserialize()
    }
}

/// NOURISH__SECTION__KEY variables, e.g. NOURISH__LLM__DEFAULT_MODEL -> llm.default_model
fn nourish_environment() -> Environment {
    Environment::with_prefix("NOURISH")
        .prefix_separator("__")
        .separator("__")
        .list_separator(",")
        .with_list_parse_key("llm.fallback_models")
        .try_parsing(true)
}

/// Overlay the conventional deployment variables on top of loaded config
fn apply_env_overrides<F>(settings: Config, lookup: F) -> Result<Config, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut builder = Config::builder().add_source(settings);

    if let Some(url) = lookup("DATABASE_URL") {
        builder = builder.set_override("database.url", url)?;
    }
    if let Some(key) = lookup("GROQ_API_KEY") {
        builder = builder.set_override("llm.api_key", key)?;
    }
    if let Some(model) = lookup("LLM_MODEL") {
        builder = builder.set_override("llm.default_model", model)?;
    }
    if let Some(port) = lookup("PORT").and_then(|p| p.parse::<u16>().ok()) {
        builder = builder.set_override("server.port", i64::from(port))?;
    }

    builder.build()
}
