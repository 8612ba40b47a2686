//! Wire-level tests for the reqwest-backed transport.

#![allow(clippy::expect_used, clippy::panic)] // Test code

use netcache_core::environment::{Transport, TransportError};
use netcache_core::request::RequestDescriptor;
use netcache_middleware::HttpTransport;
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn descriptor(server: &MockServer, route: &str) -> RequestDescriptor {
    RequestDescriptor::get(format!("{}{route}", server.uri()))
}

#[tokio::test]
async fn gets_json_from_the_endpoint() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/user"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "status": "SUCCESS" })))
        .mount(&server)
        .await;

    let request = descriptor(&server, "/user")
        .to_transport_request()
        .expect("endpoint is set");

    let response = HttpTransport::new().call(request).await;
    assert_eq!(
        response.expect("endpoint is mocked").data,
        json!({ "status": "SUCCESS" })
    );
}

#[tokio::test]
async fn honors_method_headers_params_and_body_options() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/sessions"))
        .and(header("x-session", "USER"))
        .and(query_param("refresh", "true"))
        .and(body_json(json!({ "scope": "all" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "ok": true })))
        .mount(&server)
        .await;

    let request = descriptor(&server, "/sessions")
        .with_option("method", json!("post"))
        .with_option("headers", json!({ "x-session": "USER" }))
        .with_option("params", json!({ "refresh": "true" }))
        .with_option("body", json!({ "scope": "all" }))
        .to_transport_request()
        .expect("endpoint is set");

    let response = HttpTransport::new().call(request).await;
    assert_eq!(response.expect("endpoint is mocked").data, json!({ "ok": true }));
}

#[tokio::test]
async fn non_success_statuses_become_status_errors() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/broken"))
        .respond_with(ResponseTemplate::new(503).set_body_string("unavailable"))
        .mount(&server)
        .await;

    let request = descriptor(&server, "/broken")
        .to_transport_request()
        .expect("endpoint is set");

    match HttpTransport::new().call(request).await {
        Err(TransportError::Status { status, message }) => {
            assert_eq!(status, 503);
            assert_eq!(message, "unavailable");
        }
        other => panic!("Expected a status error, found {other:?}"),
    }
}

#[tokio::test]
async fn undecodable_bodies_become_parse_errors() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/not-json"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html></html>"))
        .mount(&server)
        .await;

    let request = descriptor(&server, "/not-json")
        .to_transport_request()
        .expect("endpoint is set");

    assert!(matches!(
        HttpTransport::new().call(request).await,
        Err(TransportError::ResponseParseFailed(_))
    ));
}

#[tokio::test]
async fn connection_failures_become_request_errors() {
    // Nothing listens on this port.
    let request = RequestDescriptor::get("http://127.0.0.1:9")
        .to_transport_request()
        .expect("endpoint is set");

    assert!(matches!(
        HttpTransport::new().call(request).await,
        Err(TransportError::RequestFailed(_))
    ));
}
