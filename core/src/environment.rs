//! Environment traits: injected dependencies for the middleware.
//!
//! All external capabilities are abstracted behind traits so the middleware
//! stays deterministic under test:
//!
//! - [`Clock`]: current-time access (fixed in tests, system in production)
//! - [`Transport`]: the external network-call capability
//!
//! # Dyn Compatibility
//!
//! `Transport` returns an explicit boxed future instead of using `async fn`
//! so it can be held as `Arc<dyn Transport>` by middleware instances.

use chrono::{DateTime, Utc};
use futures::future::BoxFuture;
use serde_json::Value;
use thiserror::Error;

use crate::request::TransportRequest;

/// Clock trait - abstracts time operations for testability
///
/// # Examples
///
/// ```
/// use chrono::{DateTime, Utc};
/// use netcache_core::environment::Clock;
///
/// struct FixedClock(DateTime<Utc>);
///
/// impl Clock for FixedClock {
///     fn now(&self) -> DateTime<Utc> {
///         self.0
///     }
/// }
/// ```
pub trait Clock: Send + Sync {
    /// Get the current time
    fn now(&self) -> DateTime<Utc>;
}

/// Production clock backed by the system time
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Errors that can occur during a transport call.
///
/// The display string is exactly what lands in the failure payload's `error`
/// field, so variants keep their messages terse and human-readable.
#[derive(Debug, Clone, Error)]
pub enum TransportError {
    /// The request could not be sent or the connection failed
    #[error("Request failed: {0}")]
    RequestFailed(String),

    /// The endpoint answered with a non-success status
    #[error("Endpoint returned status {status}: {message}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Response body or status text
        message: String,
    },

    /// The response body could not be decoded
    #[error("Response parsing failed: {0}")]
    ResponseParseFailed(String),

    /// A transport-specific failure carrying its message verbatim
    #[error("{0}")]
    Message(String),
}

/// The raw result of a transport call
#[derive(Debug, Clone, PartialEq)]
pub struct TransportResponse {
    /// The response data; becomes the success payload's `data` unless a
    /// mapper reshapes it first
    pub data: Value,
}

impl TransportResponse {
    /// Wrap response data
    #[must_use]
    pub const fn new(data: Value) -> Self {
        Self { data }
    }
}

/// The external network-call capability.
///
/// The middleware awaits exactly one `call` per lifecycle action and never
/// lets its error escape the dispatch chain: a rejection becomes the failure
/// phase's payload.
pub trait Transport: Send + Sync {
    /// Perform the network call described by the request
    ///
    /// # Errors
    ///
    /// Implementations report any failure as a [`TransportError`]; the
    /// middleware turns it into a failure-phase dispatch.
    fn call(
        &self,
        request: TransportRequest,
    ) -> BoxFuture<'_, Result<TransportResponse, TransportError>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transport_error_messages_are_payload_ready() {
        assert_eq!(
            TransportError::RequestFailed("connection refused".into()).to_string(),
            "Request failed: connection refused"
        );
        assert_eq!(
            TransportError::Status {
                status: 503,
                message: "unavailable".into()
            }
            .to_string(),
            "Endpoint returned status 503: unavailable"
        );
    }

    #[test]
    fn system_clock_advances() {
        let clock = SystemClock;
        let earlier = clock.now();
        assert!(clock.now() >= earlier);
    }
}
