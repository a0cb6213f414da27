//! Console configuration, loaded from the environment and an optional
//! `atrium.toml` next to the working directory. Environment variables use
//! the `ATRIUM_` prefix and win over the file.

use crate::api::CoordinatorConfig;
use anyhow::Context;
use figment::providers::{Env, Format, Toml};
use figment::Figment;
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Base URL of the Atrium backend.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Bearer token sent on every request. Optional for unauthenticated
    /// local backends.
    #[serde(default)]
    pub api_token: Option<String>,

    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// How long successful responses are served from memory, in milliseconds.
    #[serde(default = "default_cache_ttl_ms")]
    pub cache_ttl_ms: u64,

    /// TTL for failed responses, in milliseconds. Defaults to `cache_ttl_ms`
    /// when unset; set it lower to stop transient failures from sticking for
    /// the full window.
    #[serde(default)]
    pub error_ttl_ms: Option<u64>,

    /// Optional per-request timeout in seconds. Unset means the transport's
    /// own behavior governs.
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,
}

fn default_base_url() -> String {
    "http://localhost:8080".to_owned()
}

fn default_log_level() -> String {
    "info".to_owned()
}

fn default_cache_ttl_ms() -> u64 {
    30_000
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_token: None,
            log_level: default_log_level(),
            cache_ttl_ms: default_cache_ttl_ms(),
            error_ttl_ms: None,
            request_timeout_secs: None,
        }
    }
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        Figment::new()
            .merge(Toml::file("atrium.toml"))
            .merge(Env::prefixed("ATRIUM_"))
            .extract()
            .context("failed to load configuration")
    }

    /// Coordinator settings derived from this config.
    pub fn coordinator(&self) -> CoordinatorConfig {
        let success_ttl = Duration::from_millis(self.cache_ttl_ms);
        CoordinatorConfig {
            success_ttl,
            error_ttl: self
                .error_ttl_ms
                .map(Duration::from_millis)
                .unwrap_or(success_ttl),
            timeout: self.request_timeout_secs.map(Duration::from_secs),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coordinator_defaults_mirror_cache_ttl() {
        let config = Config::default();
        let coordinator = config.coordinator();
        assert_eq!(coordinator.success_ttl, Duration::from_millis(30_000));
        assert_eq!(coordinator.error_ttl, coordinator.success_ttl);
        assert_eq!(coordinator.timeout, None);
    }

    #[test]
    fn error_ttl_overrides_when_set() {
        let config = Config {
            error_ttl_ms: Some(5_000),
            request_timeout_secs: Some(10),
            ..Config::default()
        };
        let coordinator = config.coordinator();
        assert_eq!(coordinator.error_ttl, Duration::from_millis(5_000));
        assert_eq!(coordinator.timeout, Some(Duration::from_secs(10)));
    }
}
