//! Application configuration
//!
//! Defaults are compiled in from config.toml and can be overridden at
//! startup through environment variables. The resolved configuration is
//! stored in a process-wide cell that is initialized once from main.

use once_cell::sync::OnceCell;
use serde::Deserialize;
use tracing::{info, warn};

/// Compiled-in defaults for local development.
const CONFIG_TOML: &str = include_str!("../config.toml");

/// Resolved configuration, initialized once at startup.
static CONFIG: OnceCell<Config> = OnceCell::new();

/// Application configuration
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct Config {
    pub backend: BackendConfig,
    pub gemini: GeminiConfig,
    #[serde(default)]
    pub links: LinksConfig,
}

/// Backend endpoints for the REST API and the transcript feed.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct BackendConfig {
    /// Base URL for REST calls, e.g. "http://localhost:6065"
    pub api_base: String,
    /// Base URL for the WebSocket feed, e.g. "ws://localhost:6065"
    pub ws_base: String,
}

/// Gemini API settings. The key comes from the environment only.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct GeminiConfig {
    pub model: String,
    #[serde(default)]
    pub api_key: Option<String>,
}

/// Optional outbound links shown in the client.
#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct LinksConfig {
    /// OAuth authorize URL the user is sent to for sign-in
    pub oauth_authorize: Option<String>,
    /// Payment page linked from the footer
    pub payment: Option<String>,
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub(crate) enum ConfigError {
    #[error("Failed to parse embedded config.toml: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid {which} URL {url:?}: {source}")]
    InvalidBaseUrl {
        which: &'static str,
        url: String,
        source: url::ParseError,
    },

    #[error("Configuration not initialized")]
    NotInitialized,
}

/// Load configuration from the embedded defaults and the environment.
pub(crate) fn load() -> Result<Config, ConfigError> {
    load_with(|key| std::env::var(key).ok())
}

/// Load configuration with an explicit environment lookup.
fn load_with(env: impl Fn(&str) -> Option<String>) -> Result<Config, ConfigError> {
    let mut config: Config = toml::from_str(CONFIG_TOML)?;

    if let Some(api_base) = env("BACKEND_API_URL") {
        config.backend.api_base = api_base;
    }
    if let Some(ws_base) = env("BACKEND_WS_URL") {
        config.backend.ws_base = ws_base;
    }
    if let Some(key) = env("GEMINI_API_KEY") {
        if !key.trim().is_empty() {
            config.gemini.api_key = Some(key);
        }
    }
    if let Some(authorize) = env("DISCORD_OAUTH_URL") {
        config.links.oauth_authorize = Some(authorize);
    }
    if let Some(payment) = env("PAYMENT_LINK_URL") {
        config.links.payment = Some(payment);
    }

    validate_base_url("backend API", &config.backend.api_base)?;
    validate_base_url("WebSocket", &config.backend.ws_base)?;

    Ok(config)
}

fn validate_base_url(which: &'static str, base: &str) -> Result<(), ConfigError> {
    url::Url::parse(base).map_err(|source| ConfigError::InvalidBaseUrl {
        which,
        url: base.to_string(),
        source,
    })?;
    Ok(())
}

/// Store the resolved configuration for global access.
pub(crate) fn initialize(config: Config) {
    if CONFIG.set(config).is_err() {
        warn!("Configuration already initialized");
    } else {
        info!("Configuration initialized");
    }
}

/// Get the resolved configuration.
pub(crate) fn get() -> Result<&'static Config, ConfigError> {
    CONFIG.get().ok_or(ConfigError::NotInitialized)
}
