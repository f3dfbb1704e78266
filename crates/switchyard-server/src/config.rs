// ABOUTME: Configuration loading and validation for the switchyard server and chat REPL.
// ABOUTME: Reads SWITCHYARD_* environment variables; bad values fail startup before any session exists.

use std::net::SocketAddr;
use std::time::Duration;

use thiserror::Error;

use switchyard_agent::RunConfig;
use switchyard_agent::providers::SUPPORTED_PROVIDERS;
use switchyard_agent::router::{DEFAULT_HISTORY_WINDOW, DEFAULT_MAX_TURNS};

/// Errors that can occur during configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("SWITCHYARD_BIND is not a valid socket address: {0}")]
    InvalidBind(String),

    #[error("{var} must be a non-negative integer, got {value:?}")]
    InvalidNumber { var: &'static str, value: String },

    #[error("SWITCHYARD_MAX_TURNS must be at least 1")]
    ZeroMaxTurns,

    #[error("unsupported LLM provider: {0} (expected gemini or openai)")]
    UnsupportedProvider(String),
}

/// Settings loaded from the environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwitchyardConfig {
    pub bind: SocketAddr,
    pub provider: String,
    pub model: Option<String>,
    pub max_turns: usize,
    /// 0 sends the whole history to the model.
    pub history_window: usize,
    /// Seconds a session may sit unused before it is dropped. 0 keeps sessions
    /// until they are deleted.
    pub session_idle_secs: usize,
}

/// Default idle lifetime of a session: 30 minutes.
pub const DEFAULT_SESSION_IDLE_SECS: usize = 30 * 60;

impl Default for SwitchyardConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([127, 0, 0, 1], 8000)),
            provider: "gemini".to_string(),
            model: None,
            max_turns: DEFAULT_MAX_TURNS,
            history_window: DEFAULT_HISTORY_WINDOW,
            session_idle_secs: DEFAULT_SESSION_IDLE_SECS,
        }
    }
}

fn var(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_usize(name: &'static str, default: usize) -> Result<usize, ConfigError> {
    match var(name) {
        Some(value) => value.parse().map_err(|_| ConfigError::InvalidNumber {
            var: name,
            value,
        }),
        None => Ok(default),
    }
}

impl SwitchyardConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// Environment variables:
    /// - SWITCHYARD_BIND: socket address to bind (default: 127.0.0.1:8000)
    /// - SWITCHYARD_PROVIDER: gemini or openai (default: gemini)
    /// - SWITCHYARD_MODEL: model name override (optional)
    /// - SWITCHYARD_MAX_TURNS: routing steps allowed per message (default: 10)
    /// - SWITCHYARD_HISTORY_WINDOW: history messages sent to the model, 0 for all (default: 50)
    /// - SWITCHYARD_SESSION_IDLE_SECS: drop sessions unused this long, 0 to keep them (default: 1800)
    ///
    /// Provider credentials are checked separately when the model client is built.
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let bind = match var("SWITCHYARD_BIND") {
            Some(bind_str) => bind_str
                .parse()
                .map_err(|_| ConfigError::InvalidBind(bind_str))?,
            None => defaults.bind,
        };

        let provider = var("SWITCHYARD_PROVIDER")
            .map(|p| p.to_ascii_lowercase())
            .unwrap_or(defaults.provider);

        let config = Self {
            bind,
            provider,
            model: var("SWITCHYARD_MODEL"),
            max_turns: parse_usize("SWITCHYARD_MAX_TURNS", defaults.max_turns)?,
            history_window: parse_usize("SWITCHYARD_HISTORY_WINDOW", defaults.history_window)?,
            session_idle_secs: parse_usize(
                "SWITCHYARD_SESSION_IDLE_SECS",
                defaults.session_idle_secs,
            )?,
        };
        config.validate()?;
        Ok(config)
    }

    /// Check values that may also have come from CLI overrides.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !SUPPORTED_PROVIDERS.contains(&self.provider.as_str()) {
            return Err(ConfigError::UnsupportedProvider(self.provider.clone()));
        }
        if self.max_turns == 0 {
            return Err(ConfigError::ZeroMaxTurns);
        }
        Ok(())
    }

    pub fn run_config(&self) -> RunConfig {
        RunConfig::new(self.max_turns, self.history_window)
    }

    /// How long a session may stay unused, or None when sessions never expire.
    pub fn session_idle(&self) -> Option<Duration> {
        (self.session_idle_secs > 0).then(|| Duration::from_secs(self.session_idle_secs as u64))
    }
}
