//! Ergonomic testing harness for the middleware
//!
//! Provides a fluent API with readable Given-When-Then syntax around a full
//! middleware invocation: stubbed transport, fixed clock, a state snapshot,
//! and assertions over everything dispatched downstream.

#![allow(clippy::module_name_repetitions)]

use std::sync::Arc;

use netcache_core::action::Action;
use netcache_middleware::{MiddlewareConfig, NetworkCacheMiddleware};
use serde_json::Value;

use crate::mocks::{ActionLog, FixedClock, MockTransport, test_clock};

/// Type alias for dispatch assertion functions
type DispatchAssertion = Box<dyn FnOnce(&[Action])>;

/// Type alias for return-value assertion functions
type ResultAssertion = Box<dyn FnOnce(&Option<Action>)>;

/// Fluent API for testing the middleware with Given-When-Then syntax
///
/// # Example
///
/// ```ignore
/// MiddlewareTest::new()
///     .with_transport(MockTransport::resolving(json!({ "status": "SUCCESS" })))
///     .with_clock(FixedClock::at_millis(5))
///     .given_state(json!({}))
///     .when_action(action)
///     .then_dispatched(|actions| {
///         assert_eq!(actions.len(), 2);
///     })
///     .run()
///     .await;
/// ```
pub struct MiddlewareTest {
    transport: MockTransport,
    clock: FixedClock,
    config: MiddlewareConfig,
    state: Value,
    action: Option<Action>,
    dispatch_assertions: Vec<DispatchAssertion>,
    result_assertions: Vec<ResultAssertion>,
}

impl MiddlewareTest {
    /// Create a test with an unstubbed transport, the default fixed clock,
    /// default configuration, and an empty state snapshot
    #[must_use]
    pub fn new() -> Self {
        Self {
            transport: MockTransport::new(),
            clock: test_clock(),
            config: MiddlewareConfig::default(),
            state: Value::Object(serde_json::Map::new()),
            action: None,
            dispatch_assertions: Vec::new(),
            result_assertions: Vec::new(),
        }
    }

    /// Set the stubbed transport
    #[must_use]
    pub fn with_transport(mut self, transport: MockTransport) -> Self {
        self.transport = transport;
        self
    }

    /// Set the clock
    #[must_use]
    pub fn with_clock(mut self, clock: FixedClock) -> Self {
        self.clock = clock;
        self
    }

    /// Set the middleware configuration
    #[must_use]
    pub fn with_config(mut self, config: MiddlewareConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the store snapshot the cache gate will read (Given)
    #[must_use]
    pub fn given_state(mut self, state: Value) -> Self {
        self.state = state;
        self
    }

    /// Set the action to dispatch (When)
    #[must_use]
    pub fn when_action(mut self, action: Action) -> Self {
        self.action = Some(action);
        self
    }

    /// Add an assertion over everything dispatched downstream (Then)
    #[must_use]
    pub fn then_dispatched<F>(mut self, assertion: F) -> Self
    where
        F: FnOnce(&[Action]) + 'static,
    {
        self.dispatch_assertions.push(Box::new(assertion));
        self
    }

    /// Add an assertion over the middleware's return value (Then).
    ///
    /// Pass-through actions return the continuation's result; lifecycle
    /// actions always return `None`.
    #[must_use]
    pub fn then_result<F>(mut self, assertion: F) -> Self
    where
        F: FnOnce(&Option<Action>) + 'static,
    {
        self.result_assertions.push(Box::new(assertion));
        self
    }

    /// Run the middleware and execute all assertions
    ///
    /// # Panics
    ///
    /// Panics if no action was set with `when_action()`, or if any
    /// assertion fails.
    #[allow(clippy::expect_used)] // Test code can use expect
    pub async fn run(self) {
        let action = self.action.expect("Action must be set with when_action()");

        let middleware = NetworkCacheMiddleware::new(Arc::new(self.transport.clone()))
            .with_clock(Arc::new(self.clock))
            .with_config(self.config);

        let log = ActionLog::new();
        let mut next = log.recorder();
        let state = self.state;

        let result = middleware.handle(|| state.clone(), &mut next, action).await;

        let dispatched = log.actions();
        for assertion in self.dispatch_assertions {
            assertion(&dispatched);
        }
        for assertion in self.result_assertions {
            assertion(&result);
        }
    }
}

impl Default for MiddlewareTest {
    fn default() -> Self {
        Self::new()
    }
}

/// Helper assertions for dispatched actions
pub mod assertions {
    use netcache_core::action::{Action, PhaseAction};

    /// Assert that nothing was dispatched downstream
    ///
    /// # Panics
    ///
    /// Panics if any action was dispatched.
    #[allow(clippy::panic)] // Test assertion
    pub fn assert_no_dispatch(actions: &[Action]) {
        assert!(
            actions.is_empty(),
            "Expected no downstream dispatch, but found {}: {:?}",
            actions.len(),
            actions
        );
    }

    /// Extract the phase action at the given position
    ///
    /// # Panics
    ///
    /// Panics if the position is out of range or holds a non-phase action.
    #[allow(clippy::panic)] // Test assertion
    #[must_use]
    pub fn phase_at(actions: &[Action], index: usize) -> &PhaseAction {
        match actions.get(index) {
            Some(Action::Phase(phase)) => phase,
            other => panic!("Expected a phase action at {index}, found {other:?}"),
        }
    }

    /// Assert the two-dispatch lifecycle order: pending first, then the
    /// given terminal phase
    ///
    /// # Panics
    ///
    /// Panics unless exactly two phase actions were dispatched with the
    /// expected types.
    #[allow(clippy::panic)] // Test assertion
    pub fn assert_lifecycle(actions: &[Action], pending: &str, terminal: &str) {
        assert_eq!(
            actions.len(),
            2,
            "Expected exactly two dispatches, found {}: {actions:?}",
            actions.len()
        );
        assert_eq!(phase_at(actions, 0).kind, pending);
        assert_eq!(phase_at(actions, 1).kind, terminal);
        assert!(phase_at(actions, 0).payload.fetching);
        assert!(!phase_at(actions, 1).payload.fetching);
    }
}
