//! Configuration for the Sophrosyne service
//!
//! Settings are layered from an optional `sophrosyne.toml` file and
//! `SOPHROSYNE_*` environment variables. The Anthropic API key is always
//! taken from the environment, never from the config file.

use crate::error::Result;
use serde::Deserialize;
use std::env;
use std::time::Duration;

/// Default budget for a single synchronous store operation
const DEFAULT_STORE_TIMEOUT_SECS: u64 = 10;

/// Default character budget for the serialized skillbook prompt context
const DEFAULT_SKILLBOOK_CHAR_BUDGET: usize = 8000;

fn default_bind_addr() -> String {
    "127.0.0.1:3600".to_string()
}

fn default_database_url() -> String {
    "sqlite://sophrosyne.db?mode=rwc".to_string()
}

fn default_store_timeout_secs() -> u64 {
    DEFAULT_STORE_TIMEOUT_SECS
}

fn default_skillbook_char_budget() -> usize {
    DEFAULT_SKILLBOOK_CHAR_BUDGET
}

fn default_model() -> String {
    "claude-3-5-haiku-20241022".to_string()
}

fn default_max_tokens() -> usize {
    1024
}

fn default_temperature() -> f32 {
    0.7
}

/// Reflection generator settings
#[derive(Debug, Clone, Deserialize)]
pub struct ReflectionSettings {
    /// Model used to generate outcome reflections
    #[serde(default = "default_model")]
    pub model: String,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: usize,

    #[serde(default = "default_temperature")]
    pub temperature: f32,
}

impl Default for ReflectionSettings {
    fn default() -> Self {
        Self {
            model: default_model(),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
        }
    }
}

/// Service configuration
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Address the intake API listens on
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// SQLite database URL
    #[serde(default = "default_database_url")]
    pub database_url: String,

    /// Time budget for one synchronous store operation, in seconds
    #[serde(default = "default_store_timeout_secs")]
    pub store_timeout_secs: u64,

    /// Hard cap on the serialized skillbook prompt context
    #[serde(default = "default_skillbook_char_budget")]
    pub skillbook_char_budget: usize,

    /// Secret for verifying HMAC-signed session tokens
    #[serde(default)]
    pub session_secret: String,

    /// Telemetry collector base URL; telemetry is a no-op when unset
    #[serde(default)]
    pub telemetry_url: Option<String>,

    #[serde(default)]
    pub reflection: ReflectionSettings,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            database_url: default_database_url(),
            store_timeout_secs: default_store_timeout_secs(),
            skillbook_char_budget: default_skillbook_char_budget(),
            session_secret: String::new(),
            telemetry_url: None,
            reflection: ReflectionSettings::default(),
        }
    }
}

impl Config {
    /// Load configuration from `sophrosyne.toml` (if present) with
    /// `SOPHROSYNE_*` environment overrides
    pub fn load() -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name("sophrosyne").required(false))
            .add_source(
                config::Environment::with_prefix("SOPHROSYNE").separator("__"),
            )
            .build()?;

        Ok(settings.try_deserialize()?)
    }

    pub fn store_timeout(&self) -> Duration {
        Duration::from_secs(self.store_timeout_secs)
    }

    /// Anthropic API key from the environment
    ///
    /// Empty when unset; the reflection generator refuses to start without
    /// it, while the rest of the service runs fine.
    pub fn anthropic_api_key(&self) -> String {
        env::var("ANTHROPIC_API_KEY").unwrap_or_default()
    }
}
