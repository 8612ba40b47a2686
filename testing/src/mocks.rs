//! Mock implementations of the environment traits.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError};

use chrono::{DateTime, TimeZone, Utc};
use futures::future::BoxFuture;
use netcache_core::action::Action;
use netcache_core::environment::{Clock, Transport, TransportError, TransportResponse};
use netcache_core::request::TransportRequest;
use serde_json::Value;

/// Fixed clock for deterministic tests
///
/// Always returns the same time, making cache expiry reproducible.
///
/// # Example
///
/// ```
/// use netcache_core::environment::Clock;
/// use netcache_testing::FixedClock;
///
/// let clock = FixedClock::at_millis(5);
/// assert_eq!(clock.now().timestamp_millis(), 5);
/// assert_eq!(clock.now(), clock.now());
/// ```
#[derive(Debug, Clone)]
pub struct FixedClock {
    time: DateTime<Utc>,
}

impl FixedClock {
    /// Create a fixed clock with the given time
    #[must_use]
    pub const fn new(time: DateTime<Utc>) -> Self {
        Self { time }
    }

    /// Create a fixed clock at the given epoch millisecond
    #[must_use]
    pub fn at_millis(millis: i64) -> Self {
        Self {
            time: Utc
                .timestamp_millis_opt(millis)
                .single()
                .unwrap_or_default(),
        }
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.time
    }
}

/// Create a default fixed clock for tests (2025-01-01 00:00:00 UTC)
///
/// # Panics
///
/// This function will panic if the hardcoded timestamp fails to parse,
/// which should never happen in practice.
#[must_use]
#[allow(clippy::expect_used)]
pub fn test_clock() -> FixedClock {
    FixedClock::new(
        DateTime::parse_from_rfc3339("2025-01-01T00:00:00Z")
            .expect("hardcoded timestamp should always parse")
            .with_timezone(&Utc),
    )
}

type Outcome = Result<TransportResponse, TransportError>;

#[derive(Debug, Default)]
struct MockTransportInner {
    queue: Mutex<VecDeque<Outcome>>,
    fallback: Mutex<Option<Outcome>>,
    calls: Mutex<Vec<TransportRequest>>,
}

/// Stubbed transport recording every call it receives.
///
/// Outcomes are served from a queue first, then from a sticky fallback;
/// with neither configured every call rejects. Clones share the same
/// interior, so a test can keep a handle for inspection after handing the
/// transport to the middleware.
#[derive(Debug, Clone, Default)]
pub struct MockTransport {
    inner: Arc<MockTransportInner>,
}

impl MockTransport {
    /// A transport with no stubbed outcomes (every call rejects)
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A transport whose every call resolves with the given data
    #[must_use]
    pub fn resolving(data: Value) -> Self {
        let transport = Self::new();
        *transport.inner.fallback.lock().unwrap_or_else(PoisonError::into_inner) =
            Some(Ok(TransportResponse::new(data)));
        transport
    }

    /// A transport whose every call rejects with the given message
    #[must_use]
    pub fn rejecting(message: impl Into<String>) -> Self {
        let transport = Self::new();
        *transport.inner.fallback.lock().unwrap_or_else(PoisonError::into_inner) =
            Some(Err(TransportError::Message(message.into())));
        transport
    }

    /// Queue a one-shot successful outcome
    pub fn push_ok(&self, data: Value) {
        self.inner
            .queue
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(Ok(TransportResponse::new(data)));
    }

    /// Queue a one-shot failing outcome
    pub fn push_err(&self, error: TransportError) {
        self.inner
            .queue
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(Err(error));
    }

    /// Every request the middleware has sent, in order
    #[must_use]
    pub fn calls(&self) -> Vec<TransportRequest> {
        self.inner
            .calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// How many transport calls have been made
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.inner
            .calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    fn next_outcome(&self) -> Outcome {
        let queued = self
            .inner
            .queue
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front();

        queued
            .or_else(|| {
                self.inner
                    .fallback
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .clone()
            })
            .unwrap_or_else(|| {
                Err(TransportError::Message(
                    "MockTransport has no stubbed outcome".to_string(),
                ))
            })
    }
}

impl Transport for MockTransport {
    fn call(
        &self,
        request: TransportRequest,
    ) -> BoxFuture<'_, Result<TransportResponse, TransportError>> {
        self.inner
            .calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(request);

        let outcome = self.next_outcome();
        Box::pin(async move { outcome })
    }
}

/// Records every action the middleware hands downstream.
///
/// [`ActionLog::recorder`] produces the `next` continuation: it logs the
/// action and returns it, mimicking a dispatch chain whose result is the
/// action itself. Clones share the same log.
#[derive(Debug, Clone, Default)]
pub struct ActionLog {
    actions: Arc<Mutex<Vec<Action>>>,
}

impl ActionLog {
    /// Create an empty log
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A `next` continuation that records into this log
    pub fn recorder(&self) -> impl FnMut(Action) -> Action + use<> {
        let actions = Arc::clone(&self.actions);
        move |action| {
            actions
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(action.clone());
            action
        }
    }

    /// Everything dispatched so far, in order
    #[must_use]
    pub fn actions(&self) -> Vec<Action> {
        self.actions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of recorded dispatches
    #[must_use]
    pub fn len(&self) -> usize {
        self.actions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Whether nothing has been dispatched
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
