//! Request descriptors: what a lifecycle action asks the transport to fetch.

use serde_json::{Map, Value};

/// Transform-only keys that must never be forwarded to the transport.
const TRANSFORM_ONLY_FIELDS: [&str; 1] = ["mapper"];

/// The declarative request carried by a lifecycle action.
///
/// `endpoint` is the only required field for execution; `options` are opaque
/// transport options (method, headers, query parameters, body) handed to the
/// transport as-is, minus any transform-only fields.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestDescriptor {
    /// The resource to fetch; without it the whole operation is a no-op
    pub endpoint: Option<String>,
    /// Opaque transport options
    pub options: Map<String, Value>,
}

impl RequestDescriptor {
    /// A descriptor for a plain GET of the given endpoint
    pub fn get(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: Some(endpoint.into()),
            options: Map::new(),
        }
    }

    /// Attach a transport option
    #[must_use]
    pub fn with_option(mut self, key: impl Into<String>, value: Value) -> Self {
        self.options.insert(key.into(), value);
        self
    }

    /// Decode a descriptor from a raw JSON value.
    ///
    /// Lenient by design: a non-object or an object without an `endpoint`
    /// string yields a descriptor that fails validation later (silent no-op),
    /// never an error here.
    #[must_use]
    pub fn from_value(value: Value) -> Self {
        let Value::Object(mut fields) = value else {
            return Self::default();
        };

        let endpoint = fields
            .remove("endpoint")
            .and_then(|e| e.as_str().map(String::from));

        Self {
            endpoint,
            options: fields,
        }
    }

    /// Validate the descriptor and produce the request the transport sees.
    ///
    /// Returns `None` when no endpoint is present. Transform-only fields are
    /// stripped from the options so the transport receives only
    /// transport-relevant ones.
    #[must_use]
    pub fn to_transport_request(&self) -> Option<TransportRequest> {
        let endpoint = self.endpoint.clone()?;

        let mut options = self.options.clone();
        for field in TRANSFORM_ONLY_FIELDS {
            options.remove(field);
        }

        Some(TransportRequest { endpoint, options })
    }
}

/// A validated request, ready for the transport.
///
/// Produced only by [`RequestDescriptor::to_transport_request`]; the endpoint
/// is guaranteed present and transform-only fields are already stripped.
#[derive(Debug, Clone, PartialEq)]
pub struct TransportRequest {
    /// The resource to fetch
    pub endpoint: String,
    /// Transport-relevant options only
    pub options: Map<String, Value>,
}

impl TransportRequest {
    /// Look up a string-valued option
    #[must_use]
    pub fn option_str(&self, key: &str) -> Option<&str> {
        self.options.get(key).and_then(Value::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn missing_endpoint_fails_validation() {
        let descriptor = RequestDescriptor::from_value(json!({
            "link": "https://api.com",
        }));
        assert_eq!(descriptor.to_transport_request(), None);
        assert_eq!(RequestDescriptor::default().to_transport_request(), None);
    }

    #[test]
    fn transform_only_fields_never_reach_the_transport() {
        let descriptor = RequestDescriptor::get("https://api.com")
            .with_option("method", json!("POST"))
            .with_option("mapper", json!("smuggled"));

        let request = descriptor.to_transport_request();
        let options = request.as_ref().map(|r| &r.options);
        assert_eq!(options.and_then(|o| o.get("method")), Some(&json!("POST")));
        assert_eq!(options.and_then(|o| o.get("mapper")), None);
    }

    #[test]
    fn from_value_keeps_unrecognized_fields_as_options() {
        let descriptor = RequestDescriptor::from_value(json!({
            "endpoint": "https://api.com",
            "headers": { "x-session": "USER" },
        }));
        assert_eq!(descriptor.endpoint.as_deref(), Some("https://api.com"));
        assert_eq!(
            descriptor.options.get("headers"),
            Some(&json!({ "x-session": "USER" }))
        );
    }
}
