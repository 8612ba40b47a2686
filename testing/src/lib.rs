//! # Netcache Testing
//!
//! Testing utilities for the netcache middleware:
//!
//! - Mock implementations of the environment traits (`FixedClock`,
//!   `MockTransport`)
//! - An [`ActionLog`] standing in for the downstream continuation
//! - A fluent Given-When-Then harness ([`MiddlewareTest`])
//!
//! ## Example
//!
//! ```
//! use netcache_core::{Action, LifecycleAction, PhaseTypes, RequestDescriptor};
//! use netcache_testing::{MiddlewareTest, MockTransport};
//! use serde_json::json;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! MiddlewareTest::new()
//!     .with_transport(MockTransport::resolving(json!({ "status": "SUCCESS" })))
//!     .when_action(Action::Lifecycle(LifecycleAction::new(
//!         PhaseTypes::new("X_REQUEST", "X_SUCCESS", "X_FAILURE"),
//!         RequestDescriptor::get("https://api.com"),
//!     )))
//!     .then_dispatched(|actions| assert_eq!(actions.len(), 2))
//!     .run()
//!     .await;
//! # }
//! ```

pub mod harness;
pub mod mocks;

pub use harness::MiddlewareTest;
pub use mocks::{ActionLog, FixedClock, MockTransport, test_clock};
