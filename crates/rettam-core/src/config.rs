//! rettam Configuration Management
//!
//! Handles configuration from environment variables and TOML files
//! with defaults suited to a single local user.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// HTTP server configuration
    pub server: ServerConfig,

    /// Model service endpoints
    pub models: ModelsConfig,

    /// Exploration store and front-end configuration
    pub store: StoreConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();
        config.apply_env()?;
        Ok(config)
    }

    /// Load from a TOML file
    pub fn from_file(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        let content = std::fs::read_to_string(&path).map_err(|e| ConfigError::FileReadError {
            path: path.clone(),
            source: e,
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path,
            message: e.to_string(),
        })
    }

    /// Load `RETTAM_CONFIG` if set, then apply environment overrides
    pub fn load() -> Result<Self, ConfigError> {
        let base = match std::env::var("RETTAM_CONFIG") {
            Ok(path) => Self::from_file(path)?,
            Err(_) => Self::default(),
        };
        base.with_env_override()
    }

    /// Merge with environment variables (env takes precedence)
    pub fn with_env_override(mut self) -> Result<Self, ConfigError> {
        self.apply_env()?;
        Ok(self)
    }

    fn apply_env(&mut self) -> Result<(), ConfigError> {
        // Server
        if let Ok(host) = std::env::var("API_HOST") {
            self.server.host = host;
        }
        if let Ok(port) = std::env::var("API_PORT") {
            self.server.port = parse_var("API_PORT", port)?;
        }
        if let Ok(origins) = std::env::var("CORS_ORIGINS") {
            self.server.cors_origins = split_list(&origins);
        }

        // Model services
        if let Ok(url) = std::env::var("SYNTAX_MODEL_URL") {
            self.models.syntax_url = url;
        }
        if let Ok(url) = std::env::var("NER_MODEL_URL") {
            self.models.ner_url = url;
        }
        if let Ok(url) = std::env::var("SENTIMENT_MODEL_URL") {
            self.models.sentiment_url = url;
        }
        if let Ok(url) = std::env::var("TOKENIZER_URL") {
            self.models.tokenizer_url = Some(url);
        }
        if let Ok(token) = std::env::var("MODEL_API_TOKEN") {
            self.models.api_token = Some(token);
        }
        if let Ok(max) = std::env::var("SENTIMENT_MAX_TOKENS") {
            self.models.sentiment_max_tokens = parse_var("SENTIMENT_MAX_TOKENS", max)?;
        }

        // Store
        if let Ok(path) = std::env::var("RETTAM_STORE") {
            self.store.path = PathBuf::from(path);
        }
        if let Ok(url) = std::env::var("RETTAM_API_URL") {
            self.store.api_url = url;
        }

        // Logging
        if let Ok(level) = std::env::var("LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Ok(json) = std::env::var("LOG_JSON") {
            self.logging.json_format = parse_var("LOG_JSON", json)?;
        }

        Ok(())
    }

    /// Check values that defaults cannot make valid
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.models.sentiment_max_tokens == 0 {
            return Err(ConfigError::InvalidValue {
                key: "models.sentiment_max_tokens".to_string(),
                value: "0".to_string(),
            });
        }
        for (key, url) in [
            ("models.syntax_url", &self.models.syntax_url),
            ("models.ner_url", &self.models.ner_url),
            ("models.sentiment_url", &self.models.sentiment_url),
        ] {
            if url.trim().is_empty() {
                return Err(ConfigError::MissingRequired(key.to_string()));
            }
        }
        Ok(())
    }
}

fn parse_var<T: std::str::FromStr>(key: &str, value: String) -> Result<T, ConfigError> {
    value.parse().map_err(|_| ConfigError::InvalidValue {
        key: key.to_string(),
        value,
    })
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host to bind to
    pub host: String,

    /// Port to listen on
    pub port: u16,

    /// Maximum request body size in bytes
    pub max_body_size: usize,

    /// Allowed origins for CORS
    pub cors_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3016,
            max_body_size: 2 * 1024 * 1024, // 2MB
            cors_origins: vec!["http://localhost:8080".to_string()],
        }
    }
}

/// Model service endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelsConfig {
    /// Syntactic analysis service (entities, noun chunks, dependencies)
    pub syntax_url: String,

    /// Token-classification inference endpoint
    pub ner_url: String,

    /// Text-classification inference endpoint
    pub sentiment_url: String,

    /// Tokenizer endpoint of the sentiment model. When unset, chunk sizes
    /// come from a word-count estimate, which a subword tokenizer can
    /// exceed; chunks may then be truncated by the sentiment model.
    pub tokenizer_url: Option<String>,

    /// Bearer token sent to every model service
    pub api_token: Option<String>,

    /// Maximum sequence length of the sentiment model
    pub sentiment_max_tokens: usize,
}

impl ModelsConfig {
    /// Whether chunking falls back to the word-count estimate
    pub fn estimates_tokens(&self) -> bool {
        self.tokenizer_url
            .as_deref()
            .map_or(true, |url| url.trim().is_empty())
    }
}

impl Default for ModelsConfig {
    fn default() -> Self {
        Self {
            syntax_url: "http://localhost:3017/analyze".to_string(),
            ner_url: "http://localhost:3018/ner".to_string(),
            sentiment_url: "http://localhost:3018/sentiment".to_string(),
            tokenizer_url: None,
            api_token: None,
            sentiment_max_tokens: 512,
        }
    }
}

/// Exploration store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// JSON file holding every exploration
    pub path: PathBuf,

    /// Base URL of the extraction API used for processing
    pub api_url: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("explorations.json"),
            api_url: "http://localhost:3016".to_string(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level or filter directive (trace, debug, info, warn, error)
    pub level: String,

    /// JSON format for logs
    pub json_format: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json_format: false,
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    FileReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },

    #[error("Missing required configuration: {0}")]
    MissingRequired(String),
}

impl From<ConfigError> for crate::RettamError {
    fn from(err: ConfigError) -> Self {
        crate::RettamError::ConfigError(err.to_string())
    }
}
