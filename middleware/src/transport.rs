//! Production transport built on `reqwest`.
//!
//! Interprets a validated [`TransportRequest`]'s options the way callers of
//! the middleware describe requests: `method`, `headers`, `params` (query
//! string), `body` (JSON), and `timeout_ms`. Unknown options are ignored
//! rather than rejected so descriptors stay forward-compatible.

use std::time::Duration;

use futures::future::BoxFuture;
use netcache_core::environment::{Transport, TransportError, TransportResponse};
use netcache_core::request::TransportRequest;
use reqwest::{Client, Method};
use serde_json::Value;

/// HTTP implementation of the [`Transport`] capability
#[derive(Debug, Clone, Default)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    /// Create a transport with a fresh connection pool
    #[must_use]
    pub fn new() -> Self {
        Self {
            client: Client::new(),
        }
    }

    /// Create a transport over an existing client (shared pools, custom TLS)
    #[must_use]
    pub const fn with_client(client: Client) -> Self {
        Self { client }
    }

    fn build(&self, request: &TransportRequest) -> reqwest::RequestBuilder {
        let method = request
            .option_str("method")
            .and_then(|m| Method::from_bytes(m.to_ascii_uppercase().as_bytes()).ok())
            .unwrap_or(Method::GET);

        let mut builder = self.client.request(method, &request.endpoint);

        if let Some(headers) = request.options.get("headers").and_then(Value::as_object) {
            for (name, value) in headers {
                if let Some(value) = value.as_str() {
                    builder = builder.header(name, value);
                }
            }
        }

        if let Some(params) = request.options.get("params").and_then(Value::as_object) {
            let pairs: Vec<(&str, String)> = params
                .iter()
                .map(|(k, v)| {
                    let value = v.as_str().map_or_else(|| v.to_string(), String::from);
                    (k.as_str(), value)
                })
                .collect();
            builder = builder.query(&pairs);
        }

        if let Some(body) = request.options.get("body") {
            builder = builder.json(body);
        }

        if let Some(timeout_ms) = request.options.get("timeout_ms").and_then(Value::as_u64) {
            builder = builder.timeout(Duration::from_millis(timeout_ms));
        }

        builder
    }
}

impl Transport for HttpTransport {
    fn call(
        &self,
        request: TransportRequest,
    ) -> BoxFuture<'_, Result<TransportResponse, TransportError>> {
        let builder = self.build(&request);

        Box::pin(async move {
            let response = builder
                .send()
                .await
                .map_err(|e| TransportError::RequestFailed(e.to_string()))?;

            let status = response.status();
            if !status.is_success() {
                let message = response.text().await.unwrap_or_default();
                return Err(TransportError::Status {
                    status: status.as_u16(),
                    message,
                });
            }

            let data = response
                .json::<Value>()
                .await
                .map_err(|e| TransportError::ResponseParseFailed(e.to_string()))?;

            Ok(TransportResponse::new(data))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use netcache_core::request::RequestDescriptor;
    use serde_json::json;

    fn built(descriptor: RequestDescriptor) -> Option<reqwest::Request> {
        let request = descriptor.to_transport_request()?;
        HttpTransport::new().build(&request).build().ok()
    }

    #[test]
    fn method_option_is_case_insensitive_with_get_fallback() {
        let post = built(RequestDescriptor::get("https://api.com").with_option("method", json!("post")));
        assert_eq!(post.map(|r| r.method().clone()), Some(Method::POST));

        let fallback =
            built(RequestDescriptor::get("https://api.com").with_option("method", json!("not a method")));
        assert_eq!(fallback.map(|r| r.method().clone()), Some(Method::GET));
    }

    #[test]
    fn params_become_the_query_string() {
        let request = built(
            RequestDescriptor::get("https://api.com/search")
                .with_option("params", json!({ "q": "sessions", "page": 2 })),
        );
        // serde_json maps iterate in key order, so the query string is sorted
        let query = request.and_then(|r| r.url().query().map(String::from));
        assert_eq!(query.as_deref(), Some("page=2&q=sessions"));
    }
}
