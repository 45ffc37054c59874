//! Tests for loading configuration from the environment.

use std::time::Duration;

use forum_digest::config::{Config, ConfigError};
use serial_test::serial;

const VARS: &[&str] = &[
    "DATABASE_PATH",
    "FORUM_BASE_URL",
    "FORUM_NAME",
    "LLM_API_KEY",
    "LLM_API_URL",
    "LLM_MODEL",
    "HTTP_TIMEOUT_SECS",
    "POLL_INTERVAL_SECS",
    "WEB_HOST",
    "WEB_PORT",
    "PORT",
    "STATIC_DIR",
];

fn clear_env() {
    for var in VARS {
        std::env::remove_var(var);
    }
}

#[test]
#[serial]
fn test_defaults_with_only_api_key() {
    clear_env();
    std::env::set_var("LLM_API_KEY", "sk-test");

    let config = Config::from_env().expect("config should load");
    assert_eq!(config.forum_base_url, "https://research.anoma.net");
    assert_eq!(config.forum_name, "Anoma Research Forum");
    assert_eq!(config.llm_model, "gpt-4");
    assert_eq!(config.http_timeout, Duration::from_secs(30));
    assert_eq!(config.poll_interval, Duration::from_secs(3600));
    assert_eq!(config.web_port, 3001);
    assert!(config.static_dir.is_none());
    assert!(config.validate().is_ok());

    clear_env();
}

#[test]
#[serial]
fn test_missing_api_key() {
    clear_env();

    let err = Config::from_env().unwrap_err();
    assert!(matches!(err, ConfigError::MissingEnvVar(ref name) if name == "LLM_API_KEY"));
}

#[test]
#[serial]
fn test_overrides_and_trailing_slash() {
    clear_env();
    std::env::set_var("LLM_API_KEY", "sk-test");
    std::env::set_var("FORUM_BASE_URL", "https://forum.example.com/");
    std::env::set_var("POLL_INTERVAL_SECS", "0");
    std::env::set_var("WEB_PORT", "8080");
    std::env::set_var("STATIC_DIR", "/srv/frontend");

    let config = Config::from_env().expect("config should load");
    assert_eq!(config.forum_base_url, "https://forum.example.com");
    assert!(config.poll_interval.is_zero());
    assert_eq!(config.web_port, 8080);
    assert_eq!(
        config.static_dir.as_deref(),
        Some(std::path::Path::new("/srv/frontend"))
    );

    clear_env();
}

#[test]
#[serial]
fn test_invalid_port() {
    clear_env();
    std::env::set_var("LLM_API_KEY", "sk-test");
    std::env::set_var("WEB_PORT", "not-a-port");

    let err = Config::from_env().unwrap_err();
    assert!(matches!(err, ConfigError::ParseInt { ref name, .. } if name == "WEB_PORT"));

    clear_env();
}

#[test]
#[serial]
fn test_port_fallback() {
    clear_env();
    std::env::set_var("LLM_API_KEY", "sk-test");
    std::env::set_var("PORT", "4000");

    let config = Config::from_env().expect("config should load");
    assert_eq!(config.web_port, 4000);

    std::env::set_var("WEB_PORT", "5000");
    let config = Config::from_env().expect("config should load");
    assert_eq!(config.web_port, 5000);

    clear_env();
}
