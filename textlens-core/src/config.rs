use config::{Config, ConfigError, Environment, File, FileFormat};
use serde::Deserialize;

use crate::error::TextlensError;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct TextlensConfig {
    #[serde(default)]
    pub service: ServiceConfig,
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub model: ModelConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServiceConfig {
    pub log_level: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct HttpConfig {
    pub host: String,
    pub port: u16,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
        }
    }
}

/// Chat-completions endpoint settings. The key itself never lives in the
/// config file, only the name of the variable that holds it.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ModelConfig {
    pub base_url: String,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub timeout_seconds: u64,
    pub api_key_env: String,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            model: "gpt-3.5-turbo".to_string(),
            temperature: 0.3,
            max_tokens: 512,
            timeout_seconds: 30,
            api_key_env: "OPENAI_API_KEY".to_string(),
        }
    }
}

impl TextlensConfig {
    /// Load from an optional TOML file, then `TEXTLENS__SECTION__KEY` env overrides.
    pub fn load(path: &str) -> Result<Self, ConfigError> {
        let s = Config::builder()
            .add_source(File::with_name(path).required(false))
            .add_source(
                Environment::with_prefix("TEXTLENS")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;
        s.try_deserialize()
    }

    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let s = Config::builder()
            .add_source(File::from_str(contents, FileFormat::Toml))
            .build()?;
        s.try_deserialize()
    }

    pub fn http_addr(&self) -> String {
        format!("{}:{}", self.http.host, self.http.port)
    }

    /// Resolve the model-service credential from the environment.
    pub fn api_key(&self) -> Result<String, TextlensError> {
        match std::env::var(&self.model.api_key_env) {
            Ok(key) if !key.trim().is_empty() => Ok(key),
            _ => Err(TextlensError::MissingApiKey(self.model.api_key_env.clone())),
        }
    }
}
