//! Transport seam between the request coordinator and the HTTP stack.
//!
//! The coordinator only knows the [`Transport`] trait; [`HttpTransport`] is
//! the production implementation. Tests substitute in-memory transports.

use async_trait::async_trait;
use http::Method;
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use serde_json::Value;
use std::time::Duration;
use url::Url;

use crate::api::json::parse_json_with_context;
use crate::api::middleware::RequestLogger;

/// Transport configuration for one request. Opaque to the coordinator except
/// for `bypass_cache`, which never participates in cache-key derivation.
#[derive(Debug, Clone)]
pub struct RequestOptions {
    pub method: Method,
    /// Extra headers beyond the client-wide authorization header.
    pub headers: Vec<(String, String)>,
    /// JSON body for mutations.
    pub body: Option<Value>,
    /// Skip deduplication and caching entirely for this call.
    pub bypass_cache: bool,
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self {
            method: Method::GET,
            headers: Vec::new(),
            body: None,
            bypass_cache: false,
        }
    }
}

impl RequestOptions {
    /// A plain cached GET.
    pub fn get() -> Self {
        Self::default()
    }

    /// A GET that bypasses the cache.
    pub fn fresh() -> Self {
        Self {
            bypass_cache: true,
            ..Self::default()
        }
    }

    /// A mutation. Mutations always bypass the cache; callers invalidate
    /// the affected prefix afterwards.
    pub fn send(method: Method, body: Option<Value>) -> Self {
        Self {
            method,
            body,
            bypass_cache: true,
            ..Self::default()
        }
    }
}

/// What the transport hands back: an HTTP status and the decoded JSON body.
#[derive(Debug, Clone)]
pub struct TransportResponse {
    pub status: u16,
    pub body: Value,
}

impl TransportResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    #[error("network error: {0}")]
    Network(String),
    #[error("malformed response from {url}: {message}")]
    Decode { url: String, message: String },
    #[error("request timed out after {0:?}")]
    TimedOut(Duration),
}

/// The HTTP-call primitive the coordinator wraps.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn execute(
        &self,
        endpoint: &str,
        options: &RequestOptions,
    ) -> Result<TransportResponse, TransportError>;
}

/// Production transport over reqwest, with request logging middleware and a
/// client-wide bearer token.
pub struct HttpTransport {
    client: ClientWithMiddleware,
    base_url: Url,
    auth_header: Option<String>,
}

impl HttpTransport {
    pub fn new(base_url: &str, api_token: Option<&str>) -> Result<Self, TransportError> {
        let base_url = Url::parse(base_url)
            .map_err(|e| TransportError::InvalidRequest(format!("bad base URL: {e}")))?;
        let client = reqwest::Client::builder()
            .user_agent(concat!("atrium/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| TransportError::InvalidRequest(e.to_string()))?;
        let client = ClientBuilder::new(client).with(RequestLogger).build();

        Ok(Self {
            client,
            base_url,
            auth_header: api_token.map(|token| format!("Bearer {token}")),
        })
    }

    fn url_for(&self, endpoint: &str) -> Result<Url, TransportError> {
        self.base_url
            .join(endpoint)
            .map_err(|e| TransportError::InvalidRequest(format!("bad endpoint {endpoint}: {e}")))
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn execute(
        &self,
        endpoint: &str,
        options: &RequestOptions,
    ) -> Result<TransportResponse, TransportError> {
        let url = self.url_for(endpoint)?;
        let mut request = self.client.request(options.method.clone(), url.clone());
        if let Some(auth) = &self.auth_header {
            request = request.header(http::header::AUTHORIZATION, auth);
        }
        for (name, value) in &options.headers {
            request = request.header(name.as_str(), value.as_str());
        }
        if let Some(body) = &options.body {
            request = request.json(body);
        }

        let response = request
            .send()
            .await
            .map_err(|e| TransportError::Network(e.to_string()))?;
        let status = response.status().as_u16();
        let text = response
            .text()
            .await
            .map_err(|e| TransportError::Network(e.to_string()))?;

        let body = if text.trim().is_empty() {
            Value::Null
        } else {
            match parse_json_with_context::<Value>(&text) {
                Ok(value) => value,
                // A garbled success body is a real decode failure; error
                // bodies need not be JSON, the status drives the envelope.
                Err(e) if (200..300).contains(&status) => {
                    return Err(TransportError::Decode {
                        url: url.to_string(),
                        message: e.to_string(),
                    });
                }
                Err(_) => Value::Null,
            }
        };

        Ok(TransportResponse { status, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_join_resolves_endpoints_against_the_base() {
        let transport = HttpTransport::new("http://localhost:8080", None).unwrap();
        assert_eq!(
            transport.url_for("/api/agents").unwrap().as_str(),
            "http://localhost:8080/api/agents"
        );
        assert_eq!(
            transport
                .url_for("/api/agents?page=2&pageSize=8")
                .unwrap()
                .as_str(),
            "http://localhost:8080/api/agents?page=2&pageSize=8"
        );
    }

    #[test]
    fn bad_base_url_is_rejected() {
        assert!(matches!(
            HttpTransport::new("not a url", None),
            Err(TransportError::InvalidRequest(_))
        ));
    }

    #[test]
    fn options_constructors_set_bypass() {
        assert!(!RequestOptions::get().bypass_cache);
        assert!(RequestOptions::fresh().bypass_cache);
        assert!(RequestOptions::send(Method::POST, None).bypass_cache);
    }
}
