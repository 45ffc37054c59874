use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),
    #[error("invalid value for {name}: {message}")]
    InvalidValue { name: String, message: String },
    #[error("failed to parse {name} as integer: {source}")]
    ParseInt {
        name: String,
        #[source]
        source: std::num::ParseIntError,
    },
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    // Forum
    pub forum_base_url: String,
    pub forum_name: String,
    pub http_timeout: Duration,
    /// Zero disables the server's periodic ingestion after the startup run.
    pub poll_interval: Duration,

    // Database
    pub database_path: PathBuf,

    // Language model
    pub llm_api_key: String,
    pub llm_api_url: String,
    pub llm_model: String,

    // Web Server
    pub web_host: String,
    pub web_port: u16,
    pub static_dir: Option<PathBuf>,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if required environment variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            // Forum
            forum_base_url: env_or_default("FORUM_BASE_URL", "https://research.anoma.net")
                .trim_end_matches('/')
                .to_string(),
            forum_name: env_or_default("FORUM_NAME", "Anoma Research Forum"),
            http_timeout: Duration::from_secs(parse_env_u64("HTTP_TIMEOUT_SECS", 30)?),
            poll_interval: Duration::from_secs(parse_env_u64("POLL_INTERVAL_SECS", 3600)?),

            // Database
            database_path: PathBuf::from(env_or_default(
                "DATABASE_PATH",
                "./data/forum-digest.sqlite",
            )),

            // Language model
            llm_api_key: required_env("LLM_API_KEY")?,
            llm_api_url: env_or_default(
                "LLM_API_URL",
                "https://api.openai.com/v1/chat/completions",
            ),
            llm_model: env_or_default("LLM_MODEL", "gpt-4"),

            // Web Server
            web_host: env_or_default("WEB_HOST", "0.0.0.0"),
            // PORT is the conventional name on hosting platforms; WEB_PORT wins.
            web_port: match optional_env("WEB_PORT") {
                Some(_) => parse_env_u16("WEB_PORT", 3001)?,
                None => parse_env_u16("PORT", 3001)?,
            },
            static_dir: optional_env("STATIC_DIR").map(PathBuf::from),
        })
    }

    /// Configuration with local defaults and a dummy API key, for tests.
    #[must_use]
    pub fn for_testing() -> Self {
        Self {
            forum_base_url: "http://127.0.0.1:9".to_string(),
            forum_name: "Test Forum".to_string(),
            http_timeout: Duration::from_secs(5),
            poll_interval: Duration::ZERO,
            database_path: PathBuf::from("./data/test.sqlite"),
            llm_api_key: "test-key".to_string(),
            llm_api_url: "http://127.0.0.1:9/v1/chat/completions".to_string(),
            llm_model: "test-model".to_string(),
            web_host: "127.0.0.1".to_string(),
            web_port: 3001,
            static_dir: None,
        }
    }

    /// Validate that the configuration is usable.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.llm_api_key.is_empty() {
            return Err(ConfigError::InvalidValue {
                name: "LLM_API_KEY".to_string(),
                message: "cannot be empty".to_string(),
            });
        }
        for (name, value) in [
            ("FORUM_BASE_URL", &self.forum_base_url),
            ("LLM_API_URL", &self.llm_api_url),
        ] {
            if let Err(e) = url::Url::parse(value) {
                return Err(ConfigError::InvalidValue {
                    name: name.to_string(),
                    message: format!("not a valid URL ({e})"),
                });
            }
        }
        if self.http_timeout.is_zero() {
            return Err(ConfigError::InvalidValue {
                name: "HTTP_TIMEOUT_SECS".to_string(),
                message: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}

fn required_env(name: &str) -> Result<String, ConfigError> {
    std::env::var(name).map_err(|_| ConfigError::MissingEnvVar(name.to_string()))
}

fn optional_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|s| !s.is_empty())
}

fn env_or_default(name: &str, default: &str) -> String {
    std::env::var(name)
        .ok()
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| default.to_string())
}

fn parse_env_u64(name: &str, default: u64) -> Result<u64, ConfigError> {
    match std::env::var(name) {
        Ok(val) if !val.is_empty() => val.parse().map_err(|e| ConfigError::ParseInt {
            name: name.to_string(),
            source: e,
        }),
        _ => Ok(default),
    }
}

fn parse_env_u16(name: &str, default: u16) -> Result<u16, ConfigError> {
    match std::env::var(name) {
        Ok(val) if !val.is_empty() => val.parse().map_err(|e| ConfigError::ParseInt {
            name: name.to_string(),
            source: e,
        }),
        _ => Ok(default),
    }
}
