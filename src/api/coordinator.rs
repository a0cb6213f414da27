//! Request coordination: deduplication, TTL caching, and invalidation.
//!
//! Every read of the backend funnels through [`RequestCoordinator::request`].
//! Concurrent identical requests collapse into a single network call whose
//! result every joined caller observes; settled results are memoized for a
//! TTL window; mutations invalidate by key substring so the next read
//! re-fetches. Failed results are cached too (with their own configurable
//! TTL), so a failing endpoint is not hammered within the window.
//!
//! A key may be `absent → pending → cached → (expired|invalidated) → absent`,
//! linear per key. Pending and cached entries live in separate concurrent
//! maps sharing one keyspace; the check-then-register step uses the map's
//! atomic entry API, so two threads racing on the same key still produce
//! exactly one fetch.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use futures::future::{BoxFuture, Shared};
use futures::FutureExt;
use serde_json::Value;
use tokio::time::Instant;
use tracing::debug;

use crate::api::transport::{RequestOptions, Transport, TransportError};
use crate::utils::fmt_duration;

/// Parameters identifying a logical request, used only for cache-key
/// derivation. A sorted map, so serialization is canonical by construction
/// and insertion order never changes the key.
pub type Params = BTreeMap<String, Value>;

/// Compose the cache key for an endpoint and its identifying parameters.
pub fn cache_key(endpoint: &str, params: &Params) -> String {
    let params = serde_json::to_string(params).unwrap_or_else(|_| "{}".to_owned());
    format!("{endpoint}:{params}")
}

/// The uniform envelope every call resolves to. The coordinator never
/// returns `Err` past its boundary: transport failures and non-success
/// statuses both become [`ApiResponse::Failure`].
#[derive(Debug, Clone, PartialEq)]
pub enum ApiResponse {
    Success { data: Value },
    Failure { error: String },
}

impl ApiResponse {
    pub fn success(data: Value) -> Self {
        Self::Success { data }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self::Failure {
            error: error.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    pub fn data(&self) -> Option<&Value> {
        match self {
            Self::Success { data } => Some(data),
            Self::Failure { .. } => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Success { .. } => None,
            Self::Failure { error } => Some(error),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CoordinatorConfig {
    /// How long successful results are served from memory.
    pub success_ttl: Duration,
    /// How long failed results are served from memory. Equal to
    /// `success_ttl` by default; a shorter value lets callers recover from
    /// transient failures sooner without invalidating by hand.
    pub error_ttl: Duration,
    /// Optional bound on each network call, surfaced as its own error kind.
    /// `None` leaves timing to the underlying transport.
    pub timeout: Option<Duration>,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        let ttl = Duration::from_millis(30_000);
        Self {
            success_ttl: ttl,
            error_ttl: ttl,
            timeout: None,
        }
    }
}

/// A memoized settled result. Valid while `cached_at.elapsed() < ttl`;
/// expired entries are removed lazily at read time.
struct CacheEntry {
    response: ApiResponse,
    cached_at: Instant,
    ttl: Duration,
}

type SharedFetch = Shared<BoxFuture<'static, ApiResponse>>;

/// Deduplicating, caching front door for all backend reads.
///
/// A constructed value, not module state: consumers receive an instance
/// (cheaply cloneable, all internals shared) and tests build isolated ones.
#[derive(Clone)]
pub struct RequestCoordinator {
    transport: Arc<dyn Transport>,
    cache: Arc<DashMap<String, CacheEntry>>,
    pending: Arc<DashMap<String, SharedFetch>>,
    config: CoordinatorConfig,
}

impl RequestCoordinator {
    pub fn new(transport: Arc<dyn Transport>, config: CoordinatorConfig) -> Self {
        Self {
            transport,
            cache: Arc::new(DashMap::new()),
            pending: Arc::new(DashMap::new()),
            config,
        }
    }

    /// Issue a request, deduplicating against in-flight calls and serving
    /// fresh cache entries from memory.
    ///
    /// With `options.bypass_cache` set, the call goes straight to the
    /// transport: no deduplication, no cache read, no cache write. The
    /// bypass flag never participates in key derivation.
    pub async fn request(
        &self,
        endpoint: &str,
        options: RequestOptions,
        params: &Params,
    ) -> ApiResponse {
        if options.bypass_cache {
            return self.execute(endpoint, &options).await;
        }

        let key = cache_key(endpoint, params);
        if let Some(response) = self.cached(&key) {
            debug!(key = %key, "serving from cache");
            return response;
        }

        self.join_or_start(key, endpoint, &options).await
    }

    /// Remove every cache entry whose key contains `pattern`. An empty
    /// pattern clears the whole cache map. In-flight requests are untouched.
    pub fn invalidate(&self, pattern: &str) {
        let before = self.cache.len();
        self.cache.retain(|key, _| !key.contains(pattern));
        debug!(
            pattern = %pattern,
            removed = before.saturating_sub(self.cache.len()),
            "cache invalidated"
        );
    }

    /// Drop everything: cached results and the pending-request registry.
    /// In-flight transport calls still run to completion, but no new caller
    /// will join them.
    pub fn clear_all(&self) {
        self.cache.clear();
        self.pending.clear();
    }

    fn cached(&self, key: &str) -> Option<ApiResponse> {
        let entry = self.cache.get(key)?;
        if entry.cached_at.elapsed() < entry.ttl {
            return Some(entry.response.clone());
        }
        drop(entry);
        self.cache.remove(key);
        None
    }

    fn join_or_start(&self, key: String, endpoint: &str, options: &RequestOptions) -> SharedFetch {
        let mut leader: Option<SharedFetch> = None;
        let fetch = match self.pending.entry(key.clone()) {
            Entry::Occupied(entry) => {
                debug!(key = %key, "joining in-flight request");
                entry.get().clone()
            }
            Entry::Vacant(slot) => {
                let this = self.clone();
                let endpoint = endpoint.to_owned();
                let options = options.clone();
                let fut: SharedFetch = async move {
                    let started = Instant::now();
                    let response = this.execute(&endpoint, &options).await;
                    let ttl = if response.is_success() {
                        this.config.success_ttl
                    } else {
                        this.config.error_ttl
                    };
                    // Cache before removing the pending entry, so a racing
                    // caller always finds one of the two.
                    this.cache.insert(
                        key.clone(),
                        CacheEntry {
                            response: response.clone(),
                            cached_at: Instant::now(),
                            ttl,
                        },
                    );
                    this.pending.remove(&key);
                    debug!(
                        key = %key,
                        success = response.is_success(),
                        elapsed = fmt_duration(started.elapsed()),
                        "request settled"
                    );
                    response
                }
                .boxed()
                .shared();
                slot.insert(fut.clone());
                leader = Some(fut.clone());
                fut
            }
        };

        // Drive the leader independently of its callers, so the result
        // settles and the pending entry is cleaned up even if every joined
        // caller is cancelled.
        if let Some(fut) = leader {
            tokio::spawn(fut);
        }

        fetch
    }

    async fn execute(&self, endpoint: &str, options: &RequestOptions) -> ApiResponse {
        let call = self.transport.execute(endpoint, options);
        let result = match self.config.timeout {
            Some(limit) => tokio::time::timeout(limit, call)
                .await
                .unwrap_or_else(|_| Err(TransportError::TimedOut(limit))),
            None => call.await,
        };

        match result {
            Ok(response) if response.is_success() => ApiResponse::success(response.body),
            Ok(response) => {
                ApiResponse::failure(format!("request failed with status {}", response.status))
            }
            Err(error) => ApiResponse::failure(error.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::transport::TransportResponse;
    use async_trait::async_trait;
    use serde_json::json;

    type Responder = dyn Fn(&str, usize) -> Result<TransportResponse, TransportError> + Send + Sync;

    /// In-memory transport counting calls per endpoint, with an optional
    /// artificial delay so tests can overlap requests under a paused clock.
    struct MockTransport {
        calls: DashMap<String, usize>,
        delay: Duration,
        respond: Box<Responder>,
    }

    impl MockTransport {
        fn with<F>(delay: Duration, respond: F) -> Arc<Self>
        where
            F: Fn(&str, usize) -> Result<TransportResponse, TransportError>
                + Send
                + Sync
                + 'static,
        {
            Arc::new(Self {
                calls: DashMap::new(),
                delay,
                respond: Box::new(respond),
            })
        }

        fn ok(body: Value) -> Arc<Self> {
            Self::with(Duration::ZERO, move |_, _| {
                Ok(TransportResponse {
                    status: 200,
                    body: body.clone(),
                })
            })
        }

        fn calls(&self, endpoint: &str) -> usize {
            self.calls.get(endpoint).map(|c| *c).unwrap_or(0)
        }
    }

    #[async_trait]
    impl Transport for MockTransport {
        async fn execute(
            &self,
            endpoint: &str,
            _options: &RequestOptions,
        ) -> Result<TransportResponse, TransportError> {
            let seq = {
                let mut count = self.calls.entry(endpoint.to_owned()).or_insert(0);
                *count += 1;
                *count
            };
            if self.delay > Duration::ZERO {
                tokio::time::sleep(self.delay).await;
            }
            (self.respond)(endpoint, seq)
        }
    }

    fn coordinator(transport: Arc<MockTransport>) -> RequestCoordinator {
        RequestCoordinator::new(transport, CoordinatorConfig::default())
    }

    // -- key derivation --

    #[test]
    fn cache_key_ignores_insertion_order() {
        let mut a = Params::new();
        a.insert("pageSize".to_owned(), json!(8));
        a.insert("page".to_owned(), json!(1));
        let mut b = Params::new();
        b.insert("page".to_owned(), json!(1));
        b.insert("pageSize".to_owned(), json!(8));
        assert_eq!(cache_key("/api/agents", &a), cache_key("/api/agents", &b));
    }

    #[test]
    fn cache_key_empty_params() {
        assert_eq!(cache_key("/api/agents", &Params::new()), "/api/agents:{}");
    }

    #[test]
    fn cache_key_distinguishes_values() {
        let a = Params::from([("page".to_owned(), json!(1))]);
        let b = Params::from([("page".to_owned(), json!(2))]);
        assert_ne!(cache_key("/api/agents", &a), cache_key("/api/agents", &b));
    }

    // -- deduplication --

    #[tokio::test(start_paused = true)]
    async fn concurrent_identical_requests_share_one_network_call() {
        let transport = MockTransport::with(Duration::from_millis(200), |_, _| {
            Ok(TransportResponse {
                status: 200,
                body: json!({"agents": [{"id": "a-1"}]}),
            })
        });
        let coordinator = coordinator(transport.clone());
        let params = Params::from([("page".to_owned(), json!(1))]);

        let (a, b, c) = tokio::join!(
            coordinator.request("/api/agents", RequestOptions::get(), &params),
            coordinator.request("/api/agents", RequestOptions::get(), &params),
            coordinator.request("/api/agents", RequestOptions::get(), &params),
        );

        assert_eq!(transport.calls("/api/agents"), 1);
        assert!(a.is_success());
        assert_eq!(a, b);
        assert_eq!(b, c);
    }

    #[tokio::test(start_paused = true)]
    async fn pending_entry_removed_after_settlement() {
        let transport = MockTransport::ok(json!({}));
        let coordinator = coordinator(transport);
        coordinator
            .request("/api/agents", RequestOptions::get(), &Params::new())
            .await;
        assert!(coordinator.pending.is_empty());
        assert_eq!(coordinator.cache.len(), 1);
    }

    // -- caching --

    #[tokio::test(start_paused = true)]
    async fn repeat_within_ttl_serves_from_cache() {
        let transport = MockTransport::ok(json!({"tools": []}));
        let coordinator = coordinator(transport.clone());

        let first = coordinator
            .request("/api/tools", RequestOptions::get(), &Params::new())
            .await;
        let second = coordinator
            .request("/api/tools", RequestOptions::get(), &Params::new())
            .await;

        assert_eq!(transport.calls("/api/tools"), 1);
        assert_eq!(first, second);
    }

    #[tokio::test(start_paused = true)]
    async fn entry_expires_after_ttl() {
        let transport = MockTransport::ok(json!({"tools": []}));
        let coordinator = coordinator(transport.clone());

        coordinator
            .request("/api/tools", RequestOptions::get(), &Params::new())
            .await;
        tokio::time::advance(Duration::from_secs(31)).await;
        coordinator
            .request("/api/tools", RequestOptions::get(), &Params::new())
            .await;

        assert_eq!(transport.calls("/api/tools"), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn bypass_skips_cache_in_both_directions() {
        let transport = MockTransport::with(Duration::ZERO, |_, seq| {
            Ok(TransportResponse {
                status: 200,
                body: json!({"seq": seq}),
            })
        });
        let coordinator = coordinator(transport.clone());
        let params = Params::new();

        let first = coordinator
            .request("/api/agents", RequestOptions::get(), &params)
            .await;
        assert_eq!(first.data(), Some(&json!({"seq": 1})));

        // Bypass always hits the network, even with a valid entry cached.
        let fresh = coordinator
            .request("/api/agents", RequestOptions::fresh(), &params)
            .await;
        assert_eq!(fresh.data(), Some(&json!({"seq": 2})));
        assert_eq!(transport.calls("/api/agents"), 2);

        // And it never wrote: the original entry still serves.
        let cached = coordinator
            .request("/api/agents", RequestOptions::get(), &params)
            .await;
        assert_eq!(cached.data(), Some(&json!({"seq": 1})));
        assert_eq!(transport.calls("/api/agents"), 2);
    }

    // -- invalidation --

    #[tokio::test(start_paused = true)]
    async fn invalidation_is_scoped_to_matching_keys() {
        let transport = MockTransport::ok(json!({}));
        let coordinator = coordinator(transport.clone());

        coordinator
            .request("/api/agents", RequestOptions::get(), &Params::new())
            .await;
        coordinator
            .request("/api/tools", RequestOptions::get(), &Params::new())
            .await;

        coordinator.invalidate("/api/agents");

        coordinator
            .request("/api/agents", RequestOptions::get(), &Params::new())
            .await;
        coordinator
            .request("/api/tools", RequestOptions::get(), &Params::new())
            .await;

        assert_eq!(transport.calls("/api/agents"), 2);
        assert_eq!(transport.calls("/api/tools"), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn empty_pattern_invalidates_everything() {
        let transport = MockTransport::ok(json!({}));
        let coordinator = coordinator(transport.clone());

        coordinator
            .request("/api/agents", RequestOptions::get(), &Params::new())
            .await;
        coordinator
            .request("/api/tools", RequestOptions::get(), &Params::new())
            .await;
        coordinator.invalidate("");

        coordinator
            .request("/api/agents", RequestOptions::get(), &Params::new())
            .await;
        coordinator
            .request("/api/tools", RequestOptions::get(), &Params::new())
            .await;

        assert_eq!(transport.calls("/api/agents"), 2);
        assert_eq!(transport.calls("/api/tools"), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn clear_all_forgets_pending_without_aborting_it() {
        let transport = MockTransport::with(Duration::from_millis(200), |_, _| {
            Ok(TransportResponse {
                status: 200,
                body: json!({}),
            })
        });
        let coordinator = coordinator(transport.clone());

        let inflight = {
            let coordinator = coordinator.clone();
            tokio::spawn(async move {
                coordinator
                    .request("/api/agents", RequestOptions::get(), &Params::new())
                    .await
            })
        };
        // Let the first request register before clearing.
        tokio::time::sleep(Duration::from_millis(10)).await;
        coordinator.clear_all();

        // The pending registry is gone, so this starts a second call
        // instead of joining the first.
        let second = coordinator
            .request("/api/agents", RequestOptions::get(), &Params::new())
            .await;
        let first = inflight.await.expect("in-flight request should settle");

        assert!(first.is_success());
        assert!(second.is_success());
        assert_eq!(transport.calls("/api/agents"), 2);
    }

    // -- failure semantics --

    #[tokio::test(start_paused = true)]
    async fn transport_errors_become_failure_envelopes() {
        let transport = MockTransport::with(Duration::ZERO, |_, _| {
            Err(TransportError::Network("connection refused".to_owned()))
        });
        let coordinator = coordinator(transport);

        let response = coordinator
            .request("/api/agents", RequestOptions::get(), &Params::new())
            .await;

        assert!(!response.is_success());
        assert!(!response.error().unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn non_success_statuses_become_failure_envelopes() {
        let transport = MockTransport::with(Duration::ZERO, |_, _| {
            Ok(TransportResponse {
                status: 503,
                body: Value::Null,
            })
        });
        let coordinator = coordinator(transport);

        let response = coordinator
            .request("/api/agents", RequestOptions::get(), &Params::new())
            .await;

        assert_eq!(
            response.error(),
            Some("request failed with status 503")
        );
    }

    #[tokio::test(start_paused = true)]
    async fn failures_are_cached_until_error_ttl() {
        let transport = MockTransport::with(Duration::ZERO, |_, seq| {
            if seq == 1 {
                Ok(TransportResponse {
                    status: 500,
                    body: Value::Null,
                })
            } else {
                Ok(TransportResponse {
                    status: 200,
                    body: json!({"ok": true}),
                })
            }
        });
        let config = CoordinatorConfig {
            error_ttl: Duration::from_secs(5),
            ..CoordinatorConfig::default()
        };
        let coordinator = RequestCoordinator::new(transport.clone(), config);

        let first = coordinator
            .request("/api/agents", RequestOptions::get(), &Params::new())
            .await;
        assert!(!first.is_success());

        // The failure sticks: an immediate repeat does not re-fetch.
        let repeat = coordinator
            .request("/api/agents", RequestOptions::get(), &Params::new())
            .await;
        assert_eq!(first, repeat);
        assert_eq!(transport.calls("/api/agents"), 1);

        // After the error TTL the endpoint gets another chance.
        tokio::time::advance(Duration::from_secs(6)).await;
        let recovered = coordinator
            .request("/api/agents", RequestOptions::get(), &Params::new())
            .await;
        assert!(recovered.is_success());
        assert_eq!(transport.calls("/api/agents"), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn timeout_is_a_distinct_failure() {
        let transport = MockTransport::with(Duration::from_secs(5), |_, _| {
            Ok(TransportResponse {
                status: 200,
                body: Value::Null,
            })
        });
        let config = CoordinatorConfig {
            timeout: Some(Duration::from_secs(1)),
            ..CoordinatorConfig::default()
        };
        let coordinator = RequestCoordinator::new(transport.clone(), config);

        let response = coordinator
            .request("/api/agents", RequestOptions::get(), &Params::new())
            .await;

        assert!(!response.is_success());
        assert!(response.error().unwrap().contains("timed out"));
        assert_eq!(transport.calls("/api/agents"), 1);
    }
}
