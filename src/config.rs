//! Dashboard configuration loaded from environment variables.
//!
//! Follows 12-factor style: all settings come from environment variables
//! (or a `.env` file via `dotenvy`).

use url::Url;

/// Invalid configuration value.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// `DASHBOARD_API_URL` is not an absolute URL.
    #[error("invalid DASHBOARD_API_URL {value:?}: {source}")]
    InvalidApiUrl {
        /// The rejected value.
        value: String,
        /// Parser error.
        #[source]
        source: url::ParseError,
    },
}

/// Top-level dashboard configuration.
///
/// Loaded once at startup via [`DashboardConfig::from_env`].
#[derive(Debug, Clone)]
pub struct DashboardConfig {
    /// Base URL of the incident backend (e.g. `https://argus.example.org`).
    pub api_url: Url,

    /// API token sent as `Authorization: Token <token>`.
    pub api_token: Option<String>,

    /// Per-request timeout in seconds.
    pub request_timeout_secs: u64,

    /// Capacity of the store's EventBus broadcast channel.
    pub event_bus_capacity: usize,
}

impl DashboardConfig {
    /// Default backend address for local development.
    pub const DEFAULT_API_URL: &'static str = "http://localhost:8000";

    /// Loads configuration from environment variables.
    ///
    /// Falls back to defaults when a variable is not set or a numeric
    /// value does not parse. Calls `dotenvy::dotenv().ok()` to optionally
    /// load a `.env` file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidApiUrl`] if `DASHBOARD_API_URL` is set
    /// but is not an absolute URL.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let raw_url = std::env::var("DASHBOARD_API_URL")
            .unwrap_or_else(|_| Self::DEFAULT_API_URL.to_string());
        let api_url = parse_api_url(&raw_url)?;

        let api_token = std::env::var("DASHBOARD_API_TOKEN")
            .ok()
            .filter(|t| !t.trim().is_empty());

        let request_timeout_secs = parse_env("DASHBOARD_REQUEST_TIMEOUT_SECS", 10);
        let event_bus_capacity = parse_env("DASHBOARD_EVENT_BUS_CAPACITY", 1024);

        Ok(Self {
            api_url,
            api_token,
            request_timeout_secs,
            event_bus_capacity,
        })
    }
}

fn parse_api_url(raw: &str) -> Result<Url, ConfigError> {
    Url::parse(raw.trim()).map_err(|source| ConfigError::InvalidApiUrl {
        value: raw.to_string(),
        source,
    })
}

/// Parses an environment variable as `T`, returning `default` on missing
/// or invalid values.
fn parse_env<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
