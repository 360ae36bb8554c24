//! Layered settings loading: defaults, JSON file, environment

use crate::{Settings, TelemetryExporter};
use serde_json::Value;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("{key}: {message}")]
    InvalidValue { key: String, message: String },
}

impl ConfigError {
    fn invalid(key: &str, message: impl Into<String>) -> Self {
        ConfigError::InvalidValue {
            key: key.to_string(),
            message: message.into(),
        }
    }
}

/// Load settings: defaults, then the JSON file at `path` (when given and
/// present), then environment variables.
pub fn load(path: Option<&Path>) -> Result<Settings, ConfigError> {
    let mut settings = Settings::default();

    if let Some(path) = path {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let value: Value = serde_json::from_str(&content)?;
            apply_file(&mut settings, &value)?;
        }
    }

    apply_env(&mut settings)?;
    Ok(settings)
}

/// Apply a parsed JSON config document to `settings`. Exposed for tests.
pub fn load_from_value(settings: &mut Settings, value: &Value) -> Result<(), ConfigError> {
    apply_file(settings, value)
}

fn apply_file(settings: &mut Settings, value: &Value) -> Result<(), ConfigError> {
    let Some(map) = value.as_object() else {
        return Err(ConfigError::invalid("config", "expected a JSON object"));
    };

    for (key, value) in map {
        apply_key(settings, key, value)?;
    }
    Ok(())
}

fn apply_key(settings: &mut Settings, key: &str, value: &Value) -> Result<(), ConfigError> {
    match key {
        "PubDev.Api.BaseAddress" => {
            settings.api.base_address = parse_url(key, value)?;
        }
        "PubDev.Api.UserAgent" => {
            settings.api.user_agent = parse_string(key, value)?;
        }
        "PubDev.Api.SearchResultLimit" => {
            settings.api.search_result_limit = parse_u64(key, value)? as usize;
        }
        "PubDev.Resilience.RetryCount" => {
            settings.resilience.retry_count = parse_u64(key, value)? as u32;
        }
        "PubDev.Resilience.RetryBaseDelay" => {
            settings.resilience.retry_base_delay = parse_duration_ms(key, value)?;
        }
        "PubDev.Resilience.Timeout" => {
            settings.resilience.timeout = parse_duration_ms(key, value)?;
        }
        "PubDev.Resilience.CircuitBreakerFailures" => {
            settings.resilience.breaker_min_throughput = parse_u64(key, value)? as u32;
        }
        "PubDev.Resilience.CircuitBreakerWindow" => {
            settings.resilience.breaker_window = parse_duration_ms(key, value)?;
        }
        "PubDev.Resilience.CircuitBreakerDuration" => {
            settings.resilience.breaker_open_duration = parse_duration_ms(key, value)?;
        }
        "MCP_LOG_LEVEL" => {
            settings.telemetry.log_level = parse_string(key, value)?;
        }
        "MCP_TELEMETRY_EXPORTER" => {
            settings.telemetry.exporter = parse_string(key, value)?.parse()?;
        }
        // Unrecognized keys are ignored so config files can carry
        // deployment-specific extras.
        _ => {}
    }
    Ok(())
}

fn apply_env(settings: &mut Settings) -> Result<(), ConfigError> {
    if let Ok(value) = std::env::var("PUBDEX_API_BASE_ADDRESS") {
        settings.api.base_address = Url::parse(&value)
            .map_err(|e| ConfigError::invalid("PUBDEX_API_BASE_ADDRESS", e.to_string()))?;
    }
    if let Ok(value) = std::env::var("PUBDEX_API_USER_AGENT") {
        settings.api.user_agent = value;
    }
    if let Ok(value) = std::env::var("PUBDEX_API_SEARCH_RESULT_LIMIT") {
        settings.api.search_result_limit =
            parse_env_u64("PUBDEX_API_SEARCH_RESULT_LIMIT", &value)? as usize;
    }
    if let Ok(value) = std::env::var("PUBDEX_RESILIENCE_RETRY_COUNT") {
        settings.resilience.retry_count =
            parse_env_u64("PUBDEX_RESILIENCE_RETRY_COUNT", &value)? as u32;
    }
    if let Ok(value) = std::env::var("PUBDEX_RESILIENCE_RETRY_BASE_DELAY_MS") {
        settings.resilience.retry_base_delay = Duration::from_millis(parse_env_u64(
            "PUBDEX_RESILIENCE_RETRY_BASE_DELAY_MS",
            &value,
        )?);
    }
    if let Ok(value) = std::env::var("PUBDEX_RESILIENCE_TIMEOUT_MS") {
        settings.resilience.timeout =
            Duration::from_millis(parse_env_u64("PUBDEX_RESILIENCE_TIMEOUT_MS", &value)?);
    }
    if let Ok(value) = std::env::var("PUBDEX_RESILIENCE_CB_FAILURES") {
        settings.resilience.breaker_min_throughput =
            parse_env_u64("PUBDEX_RESILIENCE_CB_FAILURES", &value)? as u32;
    }
    if let Ok(value) = std::env::var("PUBDEX_RESILIENCE_CB_WINDOW_MS") {
        settings.resilience.breaker_window =
            Duration::from_millis(parse_env_u64("PUBDEX_RESILIENCE_CB_WINDOW_MS", &value)?);
    }
    if let Ok(value) = std::env::var("PUBDEX_RESILIENCE_CB_DURATION_MS") {
        settings.resilience.breaker_open_duration =
            Duration::from_millis(parse_env_u64("PUBDEX_RESILIENCE_CB_DURATION_MS", &value)?);
    }
    if let Ok(value) = std::env::var("MCP_LOG_LEVEL") {
        settings.telemetry.log_level = value;
    }
    if let Ok(value) = std::env::var("MCP_TELEMETRY_EXPORTER") {
        settings.telemetry.exporter = value.parse::<TelemetryExporter>()?;
    }
    Ok(())
}

fn parse_string(key: &str, value: &Value) -> Result<String, ConfigError> {
    value
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| ConfigError::invalid(key, "expected a string"))
}

fn parse_url(key: &str, value: &Value) -> Result<Url, ConfigError> {
    let s = parse_string(key, value)?;
    Url::parse(&s).map_err(|e| ConfigError::invalid(key, e.to_string()))
}

fn parse_u64(key: &str, value: &Value) -> Result<u64, ConfigError> {
    value
        .as_u64()
        .ok_or_else(|| ConfigError::invalid(key, "expected a non-negative integer"))
}

/// Durations in the config file are integer milliseconds.
fn parse_duration_ms(key: &str, value: &Value) -> Result<Duration, ConfigError> {
    Ok(Duration::from_millis(parse_u64(key, value)?))
}

fn parse_env_u64(key: &str, value: &str) -> Result<u64, ConfigError> {
    value
        .parse()
        .map_err(|_| ConfigError::invalid(key, "expected a non-negative integer"))
}
