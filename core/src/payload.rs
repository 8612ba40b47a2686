//! Lifecycle payload shapes and the cached-entry view.
//!
//! [`LifecyclePayload`] is what the middleware emits; [`CacheEntry`] is the
//! read-only view of what a reducer previously committed at a cache path.
//! Both use the canonical six-field shape (`data`, `fetching`, `error`,
//! `timestamp`, `cancelled`, `completed`). The `cancelled` flag exists for
//! the surrounding application; this layer never sets it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The payload attached to every emitted phase action.
///
/// Reducers are expected to apply these payloads verbatim, which is what
/// makes the cache gate's later reads of [`CacheEntry`] line up.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LifecyclePayload {
    /// The fetched (optionally mapped) result; null until success
    pub data: Option<Value>,
    /// Whether a transport call is in flight
    pub fetching: bool,
    /// Failure message; null except on the failure phase
    pub error: Option<String>,
    /// Cache expiry in epoch milliseconds; set only on a cached success
    pub timestamp: Option<i64>,
    /// Reserved for the surrounding application; never set by this layer
    pub cancelled: bool,
    /// Whether the lifecycle reached a successful terminal state
    pub completed: bool,
}

impl LifecyclePayload {
    /// The pending-phase payload, emitted strictly before the transport call
    #[must_use]
    pub const fn pending() -> Self {
        Self {
            data: None,
            fetching: true,
            error: None,
            timestamp: None,
            cancelled: false,
            completed: false,
        }
    }

    /// The success-phase payload.
    ///
    /// `timestamp` is the cache expiry (dispatch time plus TTL) when the
    /// request used a cache path, `None` otherwise.
    #[must_use]
    pub const fn success(data: Value, timestamp: Option<i64>) -> Self {
        Self {
            data: Some(data),
            fetching: false,
            error: None,
            timestamp,
            cancelled: false,
            completed: true,
        }
    }

    /// The failure-phase payload carrying the normalized error message
    #[must_use]
    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            data: None,
            fetching: false,
            error: Some(error.into()),
            timestamp: None,
            cancelled: false,
            completed: false,
        }
    }
}

/// A previously stored lifecycle result, read back from the store snapshot.
///
/// Decoded leniently: missing or off-type fields take their defaults,
/// unknown fields are ignored. The middleware only ever reads these;
/// creation and mutation are entirely owned by the consuming store's
/// reducers.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CacheEntry {
    /// Whether an earlier invocation's pending phase is still in flight
    pub fetching: bool,
    /// The previously fetched result, if any
    pub data: Option<Value>,
    /// The previous failure message, if any
    pub error: Option<String>,
    /// Cache expiry in epoch milliseconds, if the result was cached
    pub timestamp: Option<i64>,
    /// Application-managed cancellation flag
    pub cancelled: bool,
    /// Whether the previous lifecycle completed successfully
    pub completed: bool,
}

impl CacheEntry {
    /// Decode an entry from a resolved snapshot value.
    ///
    /// Returns `None` when the value is not an object (the gate treats that
    /// as "entry absent" and proceeds with the fetch). Fields are read
    /// individually, so an off-type field falls back to its default without
    /// masking the rest: `fetching: true` still blocks a duplicate even if a
    /// sibling field holds a value of the wrong type.
    #[must_use]
    pub fn from_value(value: &Value) -> Option<Self> {
        let entry = value.as_object()?;
        let flag = |name: &str| entry.get(name).and_then(Value::as_bool).unwrap_or(false);
        Some(Self {
            fetching: flag("fetching"),
            data: entry.get("data").filter(|data| !data.is_null()).cloned(),
            error: entry
                .get("error")
                .and_then(Value::as_str)
                .map(str::to_owned),
            timestamp: entry.get("timestamp").and_then(Value::as_i64),
            cancelled: flag("cancelled"),
            completed: flag("completed"),
        })
    }

    /// Whether the entry is fresh at the given instant.
    ///
    /// Fresh means a result is present and its expiry lies in the future:
    /// `data` set, `timestamp` set, and `timestamp > now`.
    #[must_use]
    pub fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        match (&self.data, self.timestamp) {
            (Some(_), Some(timestamp)) => timestamp > now.timestamp_millis(),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn at_millis(ms: i64) -> DateTime<Utc> {
        Utc.timestamp_millis_opt(ms).single().unwrap_or_default()
    }

    #[test]
    fn pending_payload_shape() {
        let payload = LifecyclePayload::pending();
        assert_eq!(payload.data, None);
        assert!(payload.fetching);
        assert_eq!(payload.error, None);
        assert_eq!(payload.timestamp, None);
        assert!(!payload.cancelled);
        assert!(!payload.completed);
    }

    #[test]
    fn success_payload_carries_data_and_expiry() {
        let payload = LifecyclePayload::success(json!({"status": "SUCCESS"}), Some(600_005));
        assert_eq!(payload.data, Some(json!({"status": "SUCCESS"})));
        assert!(!payload.fetching);
        assert!(payload.completed);
        assert_eq!(payload.timestamp, Some(600_005));
    }

    #[test]
    fn failure_payload_normalizes_message() {
        let payload = LifecyclePayload::failure("FAILURE");
        assert_eq!(payload.error.as_deref(), Some("FAILURE"));
        assert_eq!(payload.data, None);
        assert!(!payload.completed);
    }

    #[test]
    fn entry_decodes_leniently_from_partial_objects() {
        let entry = CacheEntry::from_value(&json!({
            "fetching": false,
            "data": { "sessionId": "USER" },
            "timestamp": 600_000,
            "unknown_field": true,
        }));

        assert_eq!(
            entry,
            Some(CacheEntry {
                fetching: false,
                data: Some(json!({ "sessionId": "USER" })),
                error: None,
                timestamp: Some(600_000),
                cancelled: false,
                completed: false,
            })
        );
        assert_eq!(CacheEntry::from_value(&json!("not an entry")), None);
    }

    #[test]
    fn off_type_fields_fall_back_without_masking_the_rest() {
        let entry = CacheEntry::from_value(&json!({
            "fetching": true,
            "timestamp": "not a number",
            "error": 500,
        }));

        assert_eq!(
            entry,
            Some(CacheEntry {
                fetching: true,
                ..CacheEntry::default()
            })
        );
    }

    #[test]
    fn freshness_requires_data_and_future_expiry() {
        let entry = CacheEntry {
            data: Some(json!({ "sessionId": "USER" })),
            timestamp: Some(6),
            ..CacheEntry::default()
        };
        assert!(entry.is_fresh(at_millis(5)));
        assert!(!entry.is_fresh(at_millis(6)));
        assert!(!entry.is_fresh(at_millis(7)));

        let no_data = CacheEntry {
            timestamp: Some(i64::MAX),
            ..CacheEntry::default()
        };
        assert!(!no_data.is_fresh(at_millis(5)));

        let no_expiry = CacheEntry {
            data: Some(json!(1)),
            ..CacheEntry::default()
        };
        assert!(!no_expiry.is_fresh(at_millis(5)));
    }
}
