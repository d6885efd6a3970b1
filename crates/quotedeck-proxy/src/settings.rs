//! Proxy configuration, loaded from environment variables.
//!
//! The upstream API key is the one secret in the whole system; it lives here
//! and nowhere else, and the `Debug` impl redacts it so startup logging can
//! print the settings wholesale.

use std::net::SocketAddr;
use std::time::Duration;

use thiserror::Error;

const ENV_API_KEY: &str = "FINNHUB_API_KEY";
const ENV_BIND_ADDR: &str = "QUOTEDECK_BIND_ADDR";
const ENV_UPSTREAM_URL: &str = "QUOTEDECK_UPSTREAM_URL";

const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8787";
const DEFAULT_UPSTREAM_URL: &str = "https://finnhub.io/api/v1";
const DEFAULT_UPSTREAM_TIMEOUT: Duration = Duration::from_secs(8);

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("required environment variable {0} is not set")]
    MissingVar(&'static str),
    #[error("environment variable {name} holds an invalid value: {value}")]
    InvalidVar { name: &'static str, value: String },
}

/// Runtime settings for the proxy binary.
#[derive(Clone)]
pub struct Settings {
    pub bind_addr: SocketAddr,
    pub upstream_base: String,
    api_key: String,
    pub upstream_timeout: Duration,
    /// Shared-cache lifetime advertised on successful responses.
    pub cache_max_age_secs: u32,
    pub stale_while_revalidate_secs: u32,
}

impl Settings {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Env-independent constructor, so tests never mutate process globals.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let api_key = lookup(ENV_API_KEY)
            .filter(|value| !value.trim().is_empty())
            .ok_or(ConfigError::MissingVar(ENV_API_KEY))?;

        let bind_raw =
            lookup(ENV_BIND_ADDR).unwrap_or_else(|| String::from(DEFAULT_BIND_ADDR));
        let bind_addr = bind_raw.parse().map_err(|_| ConfigError::InvalidVar {
            name: ENV_BIND_ADDR,
            value: bind_raw.clone(),
        })?;

        let upstream_base =
            lookup(ENV_UPSTREAM_URL).unwrap_or_else(|| String::from(DEFAULT_UPSTREAM_URL));

        Ok(Self {
            bind_addr,
            upstream_base,
            api_key,
            upstream_timeout: DEFAULT_UPSTREAM_TIMEOUT,
            cache_max_age_secs: 30,
            stale_while_revalidate_secs: 60,
        })
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    pub fn cache_control_value(&self) -> String {
        format!(
            "public, s-maxage={}, stale-while-revalidate={}",
            self.cache_max_age_secs, self.stale_while_revalidate_secs
        )
    }
}

impl std::fmt::Debug for Settings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Settings")
            .field("bind_addr", &self.bind_addr)
            .field("upstream_base", &self.upstream_base)
            .field("api_key", &"[REDACTED]")
            .field("upstream_timeout", &self.upstream_timeout)
            .field("cache_max_age_secs", &self.cache_max_age_secs)
            .field(
                "stale_while_revalidate_secs",
                &self.stale_while_revalidate_secs,
            )
            .finish()
    }
}
