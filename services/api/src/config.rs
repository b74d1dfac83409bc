//! services/api/src/config.rs
//!
//! Defines the application's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use nutrition_planner_core::GenerationTimeouts;
use tracing::Level;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing the environment variable {0}")]
    MissingVar(String),
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    pub database_url: String,
    pub log_level: Level,
    pub prompts_path: PathBuf,
    /// Absent means every plan is built from templates.
    pub openai_api_key: Option<String>,
    pub plan_model: String,
    pub generation_timeouts: GenerationTimeouts,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test environments to ensure tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds a configuration from any variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        // --- Server and Database Settings ---
        let bind_address_str = lookup("BIND_ADDRESS").unwrap_or_else(|| "0.0.0.0:3000".to_string());
        let bind_address = bind_address_str.parse::<SocketAddr>().map_err(|e| {
            ConfigError::InvalidValue("BIND_ADDRESS".to_string(), e.to_string())
        })?;

        let database_url =
            lookup("DATABASE_URL").ok_or_else(|| ConfigError::MissingVar("DATABASE_URL".to_string()))?;

        let log_level_str = lookup("RUST_LOG").unwrap_or_else(|| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        let prompts_path = lookup("PROMPTS_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("./prompts"));

        // --- Generative Client ---
        let openai_api_key = lookup("OPENAI_API_KEY").filter(|key| !key.trim().is_empty());
        let plan_model = lookup("PLAN_MODEL").unwrap_or_else(|| "gpt-4o-mini".to_string());

        let defaults = GenerationTimeouts::default();
        let soft = parse_secs(
            "GENERATION_SOFT_TIMEOUT_SECS",
            lookup("GENERATION_SOFT_TIMEOUT_SECS"),
            defaults.soft,
        )?;
        let hard = parse_secs(
            "GENERATION_TIMEOUT_SECS",
            lookup("GENERATION_TIMEOUT_SECS"),
            defaults.hard,
        )?;
        if soft > hard {
            return Err(ConfigError::InvalidValue(
                "GENERATION_SOFT_TIMEOUT_SECS".to_string(),
                format!(
                    "soft timeout ({}s) exceeds the hard timeout ({}s)",
                    soft.as_secs(),
                    hard.as_secs()
                ),
            ));
        }

        Ok(Self {
            bind_address,
            database_url,
            log_level,
            prompts_path,
            openai_api_key,
            plan_model,
            generation_timeouts: GenerationTimeouts { soft, hard },
        })
    }
}

/// Parses a positive whole number of seconds, or returns `default` when unset.
fn parse_secs(name: &str, value: Option<String>, default: Duration) -> Result<Duration, ConfigError> {
    let Some(raw) = value else {
        return Ok(default);
    };
    match raw.trim().parse::<u64>() {
        Ok(secs) if secs > 0 => Ok(Duration::from_secs(secs)),
        _ => Err(ConfigError::InvalidValue(
            name.to_string(),
            format!("'{}' is not a positive number of seconds", raw),
        )),
    }
}
