//! Server configuration, read from the environment (and `.env` when present).

use std::time::Duration;

use tonepicker_core::AiSettings;
use tonepicker_suggest::{DEFAULT_TTL, DEFAULT_UPSTREAM_TIMEOUT};

pub const DEFAULT_PORT: u16 = 5000;
pub const DEV_ORIGIN: &str = "http://localhost:3000";
pub const DEFAULT_PRODUCTION_ORIGIN: &str = "https://yourdomain.com";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid value for {name}: {value:?}")]
    Invalid { name: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub environment: Environment,
    pub production_origin: String,
    pub ai: AiSettings,
    pub cache_ttl: Duration,
    pub upstream_timeout: Duration,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from an arbitrary variable source. Empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let port = parse_or(var("PORT"), "PORT", DEFAULT_PORT)?;
        let environment = match var("TONEPICKER_ENV").as_deref() {
            Some("production") => Environment::Production,
            _ => Environment::Development,
        };
        let ai = AiSettings {
            provider: var("TONEPICKER_PROVIDER")
                .unwrap_or_else(|| AiSettings::DEFAULT_PROVIDER.to_string()),
            api_key: var("TONEPICKER_API_KEY")
                .or_else(|| var("MISTRAL_API_KEY"))
                .unwrap_or_default(),
            model: var("TONEPICKER_MODEL").unwrap_or_else(|| AiSettings::DEFAULT_MODEL.to_string()),
        };
        let cache_ttl = parse_or(var("TONEPICKER_CACHE_TTL_SECS"), "TONEPICKER_CACHE_TTL_SECS", DEFAULT_TTL.as_secs())?;
        let upstream_timeout = parse_or(
            var("TONEPICKER_UPSTREAM_TIMEOUT_SECS"),
            "TONEPICKER_UPSTREAM_TIMEOUT_SECS",
            DEFAULT_UPSTREAM_TIMEOUT.as_secs(),
        )?;

        Ok(Self {
            port,
            environment,
            production_origin: var("TONEPICKER_ALLOWED_ORIGIN")
                .unwrap_or_else(|| DEFAULT_PRODUCTION_ORIGIN.to_string()),
            ai,
            cache_ttl: Duration::from_secs(cache_ttl),
            upstream_timeout: Duration::from_secs(upstream_timeout),
        })
    }

    /// Cross-origin callers allowed for the current environment.
    pub fn allowed_origins(&self) -> Vec<String> {
        match self.environment {
            Environment::Production => vec![self.production_origin.clone()],
            Environment::Development => vec![DEV_ORIGIN.to_string()],
        }
    }
}

fn parse_or<T: std::str::FromStr>(
    value: Option<String>,
    name: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match value {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { name, value: raw }),
    }
}
