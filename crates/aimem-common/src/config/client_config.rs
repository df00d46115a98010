//! Client configuration structs
//!
//! Loads configuration from environment variables (and a `.env` file if present).

use serde::Deserialize;
use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Main client configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ClientConfig {
    pub app: AppSettings,
    pub sync: SyncConfig,
    pub api: ApiConfig,
}

/// General application settings
#[derive(Debug, Clone, Deserialize)]
pub struct AppSettings {
    #[serde(default = "default_app_name")]
    pub name: String,
    #[serde(default = "default_env")]
    pub env: Environment,
}

/// Environment type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Staging,
    Production,
}

impl Environment {
    #[must_use]
    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }

    #[must_use]
    pub fn is_development(&self) -> bool {
        matches!(self, Self::Development)
    }

    /// Map an `APP_ENV` value, or `None` if it names no known environment
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "production" => Some(Self::Production),
            "staging" => Some(Self::Staging),
            "development" => Some(Self::Development),
            _ => None,
        }
    }
}

impl From<&str> for Environment {
    /// Unknown values fall back to development
    fn from(s: &str) -> Self {
        Self::parse(s).unwrap_or_default()
    }
}

/// Push channel configuration
#[derive(Debug, Clone, Deserialize)]
pub struct SyncConfig {
    /// WebSocket endpoint, e.g. `ws://localhost:8000/ws`
    pub url: String,
    /// Workspace to join on startup
    #[serde(default)]
    pub workspace: Option<String>,
    /// Master switch; a disabled client never connects
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Capacity of the transport event channel
    #[serde(default = "default_event_buffer")]
    pub event_buffer: usize,
    /// Capacity of the outgoing frame channel
    #[serde(default = "default_outgoing_buffer")]
    pub outgoing_buffer: usize,
    /// Handshake timeout in milliseconds
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
    #[serde(default)]
    pub reconnect: ReconnectConfig,
}

impl SyncConfig {
    /// Build a sync config for an endpoint with default tuning
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            workspace: None,
            enabled: true,
            event_buffer: default_event_buffer(),
            outgoing_buffer: default_outgoing_buffer(),
            connect_timeout_ms: default_connect_timeout_ms(),
            reconnect: ReconnectConfig::default(),
        }
    }

    #[must_use]
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }
}

/// Automatic reconnect after a failed connection
///
/// Disabled by default: an errored client waits for a manual reconnect.
#[derive(Debug, Clone, Deserialize)]
pub struct ReconnectConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            max_attempts: default_max_attempts(),
            base_delay_ms: default_base_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
        }
    }
}

/// Document store HTTP API configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    /// Base URL, e.g. `http://localhost:8000`
    pub url: String,
    /// Request timeout in milliseconds
    #[serde(default = "default_http_timeout_ms")]
    pub timeout_ms: u64,
}

impl ApiConfig {
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

// Default value functions
fn default_app_name() -> String {
    "aimem-sync".to_string()
}

fn default_env() -> Environment {
    Environment::Development
}

fn default_true() -> bool {
    true
}

fn default_event_buffer() -> usize {
    256
}

fn default_outgoing_buffer() -> usize {
    64
}

fn default_connect_timeout_ms() -> u64 {
    10_000
}

fn default_http_timeout_ms() -> u64 {
    15_000
}

fn default_max_attempts() -> u32 {
    5
}

fn default_base_delay_ms() -> u64 {
    500
}

fn default_max_delay_ms() -> u64 {
    30_000
}

impl ClientConfig {
    /// Load configuration from environment variables
    ///
    /// # Errors
    /// Returns an error if required environment variables are missing or malformed
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&'static str) -> Option<String>,
    {
        let vars = Vars(lookup);

        Ok(Self {
            app: AppSettings {
                name: vars.get("APP_NAME").unwrap_or_else(default_app_name),
                env: vars
                    .get("APP_ENV")
                    .and_then(|s| Environment::parse(&s))
                    .unwrap_or_default(),
            },
            sync: SyncConfig {
                url: vars.required("AIMEM_SYNC_URL")?,
                workspace: vars.get("AIMEM_WORKSPACE").filter(|s| !s.trim().is_empty()),
                enabled: vars.parse_bool("AIMEM_SYNC_ENABLED")?.unwrap_or(true),
                event_buffer: vars
                    .parse("AIMEM_EVENT_BUFFER")?
                    .unwrap_or_else(default_event_buffer),
                outgoing_buffer: vars
                    .parse("AIMEM_OUTGOING_BUFFER")?
                    .unwrap_or_else(default_outgoing_buffer),
                connect_timeout_ms: vars
                    .parse("AIMEM_CONNECT_TIMEOUT_MS")?
                    .unwrap_or_else(default_connect_timeout_ms),
                reconnect: ReconnectConfig {
                    enabled: vars.parse_bool("AIMEM_RECONNECT_ENABLED")?.unwrap_or(false),
                    max_attempts: vars
                        .parse("AIMEM_RECONNECT_MAX_ATTEMPTS")?
                        .unwrap_or_else(default_max_attempts),
                    base_delay_ms: vars
                        .parse("AIMEM_RECONNECT_BASE_DELAY_MS")?
                        .unwrap_or_else(default_base_delay_ms),
                    max_delay_ms: vars
                        .parse("AIMEM_RECONNECT_MAX_DELAY_MS")?
                        .unwrap_or_else(default_max_delay_ms),
                },
            },
            api: ApiConfig {
                url: vars.required("AIMEM_API_URL")?,
                timeout_ms: vars
                    .parse("AIMEM_HTTP_TIMEOUT_MS")?
                    .unwrap_or_else(default_http_timeout_ms),
            },
        })
    }
}

struct Vars<F>(F);

impl<F> Vars<F>
where
    F: Fn(&'static str) -> Option<String>,
{
    fn get(&self, key: &'static str) -> Option<String> {
        (self.0)(key)
    }

    fn required(&self, key: &'static str) -> Result<String, ConfigError> {
        self.get(key)
            .filter(|s| !s.trim().is_empty())
            .ok_or(ConfigError::MissingVar(key))
    }

    fn parse<T: FromStr>(&self, key: &'static str) -> Result<Option<T>, ConfigError> {
        self.get(key)
            .map(|raw| {
                raw.trim()
                    .parse()
                    .map_err(|_| ConfigError::InvalidValue(key, raw.clone()))
            })
            .transpose()
    }

    fn parse_bool(&self, key: &'static str) -> Result<Option<bool>, ConfigError> {
        self.get(key)
            .map(|raw| match raw.trim().to_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => Ok(true),
                "0" | "false" | "no" | "off" => Ok(false),
                _ => Err(ConfigError::InvalidValue(key, raw.clone())),
            })
            .transpose()
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingVar(&'static str),

    #[error("Invalid value for {0}: {1}")]
    InvalidValue(&'static str, String),
}
