//! Client for the Atrium platform REST API.
//!
//! All reads go through the [`RequestCoordinator`]: concurrent identical
//! requests collapse into one network call and recent results are served
//! from memory. Mutations bypass the cache and invalidate the affected
//! endpoint prefix so the next read re-fetches.

pub mod coordinator;
pub mod json;
pub mod middleware;
pub mod transport;

use std::sync::Arc;

use anyhow::{anyhow, Context};
use http::Method;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};

use crate::config::Config;
use crate::utils::token_scope;

pub use coordinator::{cache_key, ApiResponse, CoordinatorConfig, Params, RequestCoordinator};
pub use transport::{HttpTransport, RequestOptions, Transport, TransportError, TransportResponse};

/// Shared handle every resource module and command talks through.
pub struct ApiClient {
    coordinator: RequestCoordinator,
    token_scope: Option<String>,
    force_fresh: bool,
}

impl ApiClient {
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        let transport = HttpTransport::new(&config.base_url, config.api_token.as_deref())
            .context("failed to construct HTTP transport")?;
        let coordinator = RequestCoordinator::new(Arc::new(transport), config.coordinator());
        Ok(Self::with_coordinator(
            coordinator,
            config.api_token.as_deref().map(token_scope),
        ))
    }

    /// Build a client over an existing coordinator (tests, alternative
    /// transports).
    pub fn with_coordinator(coordinator: RequestCoordinator, token_scope: Option<String>) -> Self {
        Self {
            coordinator,
            token_scope,
            force_fresh: false,
        }
    }

    /// Make every subsequent read bypass the cache (`--fresh`).
    pub fn force_fresh(&mut self, on: bool) {
        self.force_fresh = on;
    }

    /// Cached GET. The truncated token scope participates in the cache key
    /// so entries are segregated per credential.
    pub async fn get(&self, endpoint: &str, mut params: Params) -> ApiResponse {
        if let Some(scope) = &self.token_scope {
            params.insert("tokenScope".to_owned(), json!(scope));
        }
        let options = if self.force_fresh {
            RequestOptions::fresh()
        } else {
            RequestOptions::get()
        };
        self.coordinator.request(endpoint, options, &params).await
    }

    /// Issue a mutation. Never cached, never deduplicated; callers
    /// invalidate the affected prefix after a success.
    pub async fn send(&self, method: Method, endpoint: &str, body: Option<Value>) -> ApiResponse {
        self.coordinator
            .request(endpoint, RequestOptions::send(method, body), &Params::new())
            .await
    }

    /// Drop cached results whose key contains `prefix`.
    pub fn invalidate(&self, prefix: &str) {
        self.coordinator.invalidate(prefix);
    }

    /// Drop all cached and pending state (teardown).
    pub fn clear_cache(&self) {
        self.coordinator.clear_all();
    }
}

/// Decode a successful envelope into a typed payload; failures become
/// errors carrying the backend's message.
pub(crate) fn decode<T: DeserializeOwned>(response: ApiResponse, what: &str) -> anyhow::Result<T> {
    match response {
        ApiResponse::Success { data } => serde_json::from_value(data)
            .with_context(|| format!("unexpected {what} payload shape")),
        ApiResponse::Failure { error } => Err(anyhow!("{what} request failed: {error}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_surfaces_backend_errors() {
        let err = decode::<Value>(ApiResponse::failure("boom"), "agent list").unwrap_err();
        assert!(err.to_string().contains("boom"));
    }

    #[test]
    fn decode_rejects_shape_mismatches() {
        #[derive(Debug, serde::Deserialize)]
        struct Typed {
            #[allow(dead_code)]
            count: u64,
        }
        let err = decode::<Typed>(
            ApiResponse::success(json!({"count": "not a number"})),
            "metrics",
        )
        .unwrap_err();
        assert!(err.to_string().contains("metrics"));
    }
}
