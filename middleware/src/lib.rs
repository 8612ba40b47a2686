//! # Netcache Middleware
//!
//! Dispatch-interception layer that turns a single declarative "fetch this
//! resource" action into a three-phase lifecycle (pending → success/failure)
//! and short-circuits redundant fetches against a previously stored result
//! under a TTL policy.
//!
//! ## Dispatch contract
//!
//! Per invocation the downstream continuation `next` is called:
//!
//! - exactly **once** for any non-lifecycle action (including thunks, which
//!   are forwarded without being invoked), returning that call's result
//! - **zero** times for a lifecycle action whose descriptor has no endpoint
//!   (silent no-op) or whose cache entry blocks the fetch
//! - exactly **twice** for a valid, non-cached lifecycle action: the pending
//!   phase strictly before the transport call, then the terminal phase
//!
//! The middleware never writes to the store and never lets an error escape
//! the dispatch chain: transport and transform failures degrade to a
//! failure-phase dispatch.
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use netcache_core::{Action, LifecycleAction, PhaseTypes, RequestDescriptor};
//! use netcache_middleware::{HttpTransport, MiddlewareConfig, NetworkCacheMiddleware};
//!
//! let middleware = NetworkCacheMiddleware::new(Arc::new(HttpTransport::new()))
//!     .with_config(MiddlewareConfig::from_env());
//!
//! let action = Action::Lifecycle(
//!     LifecycleAction::new(
//!         PhaseTypes::new("USER_REQUEST", "USER_SUCCESS", "USER_FAILURE"),
//!         RequestDescriptor::get("https://api.com/user"),
//!     )
//!     .with_cache_path("session.user"),
//! );
//!
//! middleware.handle(|| store.snapshot(), &mut |a| store.dispatch(a), action).await;
//! ```

use std::sync::Arc;

use netcache_core::action::{Action, LifecycleAction, PhaseAction};
use netcache_core::environment::{Clock, SystemClock, Transport};
use netcache_core::path;
use netcache_core::payload::{CacheEntry, LifecyclePayload};
use serde_json::Value;

pub mod config;
pub mod transport;

pub use config::{DEFAULT_CACHE_TTL, MiddlewareConfig};
pub use transport::HttpTransport;

/// Why a lifecycle action was short-circuited with zero downstream
/// dispatches.
///
/// All three are silent at the dispatch surface; they are distinguished only
/// through tracing events and metrics counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ShortCircuit {
    /// The descriptor carries no resolvable endpoint
    MissingEndpoint,
    /// A fresh result already sits at the cache path
    CacheHit,
    /// An earlier invocation's fetch is still marked in flight
    InFlight,
}

/// The dispatch-interception middleware.
///
/// Holds the injected transport and clock plus the TTL configuration. All
/// per-request state lives in the external store; the middleware itself is
/// cheap to clone and share.
#[derive(Clone)]
pub struct NetworkCacheMiddleware {
    transport: Arc<dyn Transport>,
    clock: Arc<dyn Clock>,
    config: MiddlewareConfig,
}

impl NetworkCacheMiddleware {
    /// Create a middleware over the given transport with the system clock
    /// and default configuration
    #[must_use]
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            clock: Arc::new(SystemClock),
            config: MiddlewareConfig::default(),
        }
    }

    /// Replace the clock (fixed clocks make cache expiry deterministic in
    /// tests)
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Replace the configuration
    #[must_use]
    pub fn with_config(mut self, config: MiddlewareConfig) -> Self {
        self.config = config;
        self
    }

    /// Intercept one dispatched action.
    ///
    /// `get_state` is a synchronous accessor into the store's current
    /// snapshot; `next` is the downstream continuation. For pass-through
    /// actions the continuation's result is returned; lifecycle actions
    /// always return `None` (their outcome is delivered as dispatched phase
    /// actions, never as a return value or an error).
    ///
    /// The only suspension point is the awaited transport call; the pending
    /// phase is dispatched synchronously before it.
    #[tracing::instrument(skip_all, name = "network_cache_dispatch")]
    pub async fn handle<G, N, R>(&self, get_state: G, next: &mut N, action: Action) -> Option<R>
    where
        G: Fn() -> Value,
        N: FnMut(Action) -> R,
    {
        let lifecycle = match action {
            Action::Lifecycle(lifecycle) => lifecycle,
            other => {
                tracing::debug!(kind = other.kind().unwrap_or("<thunk>"), "Passing action through");
                metrics::counter!("middleware.pass_through").increment(1);
                return Some(next(other));
            }
        };

        if let Some(reason) = self.short_circuit(&lifecycle, &get_state) {
            self.record_short_circuit(&lifecycle, reason);
            return None;
        }

        self.run_lifecycle(lifecycle, next).await;
        None
    }

    /// Decide whether the fetch should be skipped entirely.
    ///
    /// Checks descriptor validity first (missing endpoint), then consults
    /// the cache gate when a cache path was given.
    fn short_circuit<G>(&self, lifecycle: &LifecycleAction, get_state: &G) -> Option<ShortCircuit>
    where
        G: Fn() -> Value,
    {
        if lifecycle.request.endpoint.is_none() {
            return Some(ShortCircuit::MissingEndpoint);
        }

        let cache_path = lifecycle.cache_path.as_deref()?;
        let snapshot = get_state();
        let entry = path::resolve(&snapshot, cache_path).and_then(CacheEntry::from_value)?;

        // An in-flight duplicate blocks regardless of TTL.
        if entry.fetching {
            return Some(ShortCircuit::InFlight);
        }
        if entry.is_fresh(self.clock.now()) {
            return Some(ShortCircuit::CacheHit);
        }

        None
    }

    /// Run the two-dispatch lifecycle: pending, one transport call, terminal
    /// phase.
    async fn run_lifecycle<N, R>(&self, lifecycle: LifecycleAction, next: &mut N)
    where
        N: FnMut(Action) -> R,
    {
        let LifecycleAction {
            types,
            request,
            cache_path,
            mapper,
            extra,
        } = lifecycle;

        // Validated by short_circuit; a descriptor can't lose its endpoint
        // between the gate and here.
        let Some(transport_request) = request.to_transport_request() else {
            return;
        };

        next(Action::Phase(PhaseAction::new(
            &types.pending,
            LifecyclePayload::pending(),
            extra.clone(),
        )));

        let outcome = match self.transport.call(transport_request).await {
            Ok(response) => match mapper {
                Some(map) => map(response.data).map_err(|e| e.to_string()),
                None => Ok(response.data),
            },
            Err(e) => Err(e.to_string()),
        };

        match outcome {
            Ok(data) => {
                let timestamp = cache_path.is_some().then(|| self.expiry_millis());
                metrics::counter!("middleware.request.success").increment(1);
                next(Action::Phase(PhaseAction::new(
                    &types.success,
                    LifecyclePayload::success(data, timestamp),
                    extra,
                )));
            }
            Err(message) => {
                tracing::warn!(error = %message, failure = %types.failure, "Fetch failed");
                metrics::counter!("middleware.request.failure").increment(1);
                next(Action::Phase(PhaseAction::new(
                    &types.failure,
                    LifecyclePayload::failure(message),
                    extra,
                )));
            }
        }
    }

    /// Cache expiry for a success dispatched now: `now + TTL` in epoch
    /// milliseconds.
    fn expiry_millis(&self) -> i64 {
        let ttl = i64::try_from(self.config.cache_ttl.as_millis()).unwrap_or(i64::MAX);
        self.clock.now().timestamp_millis().saturating_add(ttl)
    }

    fn record_short_circuit(&self, lifecycle: &LifecycleAction, reason: ShortCircuit) {
        match reason {
            ShortCircuit::MissingEndpoint => {
                tracing::debug!(
                    pending = %lifecycle.types.pending,
                    "Descriptor has no endpoint, dropping lifecycle action"
                );
                metrics::counter!("middleware.missing_endpoint").increment(1);
            }
            ShortCircuit::CacheHit => {
                tracing::debug!(
                    cache_path = lifecycle.cache_path.as_deref().unwrap_or_default(),
                    "Fresh cache entry, skipping fetch"
                );
                metrics::counter!("middleware.cache_hit").increment(1);
            }
            ShortCircuit::InFlight => {
                tracing::debug!(
                    cache_path = lifecycle.cache_path.as_deref().unwrap_or_default(),
                    "Fetch already in flight, skipping duplicate"
                );
                metrics::counter!("middleware.in_flight").increment(1);
            }
        }
    }
}

impl std::fmt::Debug for NetworkCacheMiddleware {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NetworkCacheMiddleware")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use netcache_core::action::PhaseTypes;
    use netcache_core::request::RequestDescriptor;
    use netcache_testing::{FixedClock, MockTransport};
    use serde_json::json;
    use std::time::Duration;

    fn middleware_at(millis: i64) -> NetworkCacheMiddleware {
        NetworkCacheMiddleware::new(Arc::new(MockTransport::new()))
            .with_clock(Arc::new(FixedClock::at_millis(millis)))
    }

    fn lifecycle(descriptor: RequestDescriptor) -> LifecycleAction {
        LifecycleAction::new(
            PhaseTypes::new("X_REQUEST", "X_SUCCESS", "X_FAILURE"),
            descriptor,
        )
    }

    #[test]
    fn gate_reports_missing_endpoint_before_anything_else() {
        let middleware = middleware_at(5);
        let action = lifecycle(RequestDescriptor::default()).with_cache_path("auth");

        let reason = middleware.short_circuit(&action, &|| json!({}));
        assert_eq!(reason, Some(ShortCircuit::MissingEndpoint));
    }

    #[test]
    fn gate_distinguishes_fresh_hits_from_in_flight_duplicates() {
        let middleware = middleware_at(5);
        let action = lifecycle(RequestDescriptor::get("https://api.com")).with_cache_path("auth");

        let fresh = || json!({ "auth": { "data": 1, "timestamp": 6 } });
        assert_eq!(
            middleware.short_circuit(&action, &fresh),
            Some(ShortCircuit::CacheHit)
        );

        let in_flight = || json!({ "auth": { "fetching": true } });
        assert_eq!(
            middleware.short_circuit(&action, &in_flight),
            Some(ShortCircuit::InFlight)
        );

        // Off-type sibling fields don't hide a flight already in progress.
        let partly_malformed = || json!({ "auth": { "fetching": true, "timestamp": "soon" } });
        assert_eq!(
            middleware.short_circuit(&action, &partly_malformed),
            Some(ShortCircuit::InFlight)
        );
    }

    #[test]
    fn gate_proceeds_without_path_on_miss_and_on_expiry() {
        let middleware = middleware_at(7);
        let no_path = lifecycle(RequestDescriptor::get("https://api.com"));
        assert_eq!(middleware.short_circuit(&no_path, &|| json!({})), None);

        let action = no_path.with_cache_path("auth");
        assert_eq!(middleware.short_circuit(&action, &|| json!({})), None);

        let expired = || json!({ "auth": { "data": 1, "timestamp": 6 } });
        assert_eq!(middleware.short_circuit(&action, &expired), None);

        let not_an_entry = || json!({ "auth": 42 });
        assert_eq!(middleware.short_circuit(&action, &not_an_entry), None);
    }

    #[test]
    fn expiry_saturates_on_oversized_ttl() {
        let middleware =
            middleware_at(5).with_config(MiddlewareConfig::default().with_cache_ttl(
                Duration::from_millis(u64::MAX),
            ));
        assert_eq!(middleware.expiry_millis(), i64::MAX);
    }
}
