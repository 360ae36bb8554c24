//! # pubdex configuration
//!
//! Typed settings for the MCP server, loaded in three layers with the last
//! writer winning: built-in defaults, a JSON configuration file using dotted
//! keys (`PubDev.Api.BaseAddress`, ...), and environment variables
//! (`PUBDEX_*`, plus `MCP_LOG_LEVEL` / `MCP_TELEMETRY_EXPORTER` /
//! `MCP_TRANSPORT`).

mod loader;

pub use loader::{load, load_from_value, ConfigError};

use std::time::Duration;
use url::Url;

/// Upstream API settings
#[derive(Debug, Clone)]
pub struct ApiSettings {
    /// Absolute base URL of the upstream registry
    pub base_address: Url,
    /// User-Agent header sent on every upstream call
    pub user_agent: String,
    /// Maximum packages kept per search
    pub search_result_limit: usize,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            base_address: Url::parse("https://pub.dev").expect("static URL parses"),
            user_agent: format!("pubdex/{}", env!("CARGO_PKG_VERSION")),
            search_result_limit: 10,
        }
    }
}

/// Resilience pipeline settings
#[derive(Debug, Clone)]
pub struct ResilienceSettings {
    /// Maximum retry attempts per upstream call
    pub retry_count: u32,
    /// Base backoff delay; jitter is drawn from [0, base)
    pub retry_base_delay: Duration,
    /// Per-attempt timeout
    pub timeout: Duration,
    /// Minimum throughput before the breaker evaluates its failure ratio
    pub breaker_min_throughput: u32,
    /// Sliding window over which failures are counted
    pub breaker_window: Duration,
    /// How long an open breaker short-circuits calls
    pub breaker_open_duration: Duration,
}

impl Default for ResilienceSettings {
    fn default() -> Self {
        Self {
            retry_count: 3,
            retry_base_delay: Duration::from_millis(200),
            timeout: Duration::from_secs(3),
            breaker_min_throughput: 5,
            breaker_window: Duration::from_secs(30),
            breaker_open_duration: Duration::from_secs(15),
        }
    }
}

/// Telemetry exporter selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TelemetryExporter {
    #[default]
    None,
    Console,
    Otlp,
}

impl std::str::FromStr for TelemetryExporter {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, ConfigError> {
        match s.to_ascii_uppercase().as_str() {
            "NONE" => Ok(TelemetryExporter::None),
            "CONSOLE" => Ok(TelemetryExporter::Console),
            "OTLP" => Ok(TelemetryExporter::Otlp),
            other => Err(ConfigError::InvalidValue {
                key: "MCP_TELEMETRY_EXPORTER".to_string(),
                message: format!("unknown exporter '{other}'"),
            }),
        }
    }
}

/// Logging and telemetry settings
#[derive(Debug, Clone)]
pub struct TelemetrySettings {
    /// Minimum log severity when RUST_LOG is unset
    pub log_level: String,
    pub exporter: TelemetryExporter,
}

impl Default for TelemetrySettings {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            exporter: TelemetryExporter::None,
        }
    }
}

/// Which transport the server speaks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransportKind {
    #[default]
    Stdio,
    Http,
}

impl std::str::FromStr for TransportKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, ConfigError> {
        match s.to_ascii_uppercase().as_str() {
            "STDIO" => Ok(TransportKind::Stdio),
            "HTTP" => Ok(TransportKind::Http),
            other => Err(ConfigError::InvalidValue {
                key: "MCP_TRANSPORT".to_string(),
                message: format!("unknown transport '{other}'"),
            }),
        }
    }
}

/// Complete server settings
#[derive(Debug, Clone, Default)]
pub struct Settings {
    pub api: ApiSettings,
    pub resilience: ResilienceSettings,
    pub telemetry: TelemetrySettings,
}
