//! HTTP-level tests for `HttpProcessorClient` against a fake processor
//! server, backed by `wiremock`.

use std::time::Duration;

use rust_decimal_macros::dec;
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use paygate_core::processor::{HttpProcessorClient, ProcessorClient};
use paygate_core::Error;

#[tokio::test]
async fn charge_success_parses_the_wire_response() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/charge"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "transaction_id": "ptx_123",
            "auth_code": "AUTH1",
            "error_code": null,
            "error_message": null,
        })))
        .mount(&server)
        .await;

    let client = HttpProcessorClient::new("processor_a", server.uri(), Duration::from_secs(5));
    let result = client.charge(dec!(10.00), "USD", "ntk_x", "k-1").await.expect("charge succeeds");

    assert!(result.success);
    assert_eq!(result.transaction_id.as_deref(), Some("ptx_123"));
    assert!(client.is_healthy());
}

#[tokio::test]
async fn charge_decline_does_not_mark_the_client_unhealthy() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/charge"))
        .respond_with(ResponseTemplate::new(402).set_body_json(json!({
            "success": false,
            "transaction_id": "ptx_declined",
            "auth_code": null,
            "error_code": "insufficient_funds",
            "error_message": "insufficient funds",
        })))
        .mount(&server)
        .await;

    let client = HttpProcessorClient::new("processor_a", server.uri(), Duration::from_secs(5));
    let result = client.charge(dec!(10.00), "USD", "ntk_x", "k-2").await.expect("call completes");

    assert!(!result.success);
    assert_eq!(result.error_code.as_deref(), Some("insufficient_funds"));
    assert!(client.is_healthy());
}

#[tokio::test]
async fn charge_transport_failure_marks_the_client_unhealthy() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/charge"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let client = HttpProcessorClient::new("processor_a", server.uri(), Duration::from_secs(5));
    let err = client.charge(dec!(10.00), "USD", "ntk_x", "k-3").await.expect_err("transport failure surfaces");

    assert!(matches!(err, Error::Network(_)));
    assert!(!client.is_healthy());
}

#[tokio::test]
async fn refund_success_parses_the_wire_response() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/refund"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "refund_id": "prf_1",
            "error_code": null,
        })))
        .mount(&server)
        .await;

    let client = HttpProcessorClient::new("processor_a", server.uri(), Duration::from_secs(5));
    let result = client.refund("ptx_123", dec!(1.00), "test").await.expect("refund succeeds");

    assert!(result.success);
    assert_eq!(result.refund_id.as_deref(), Some("prf_1"));
}

#[tokio::test]
async fn probe_health_reflects_the_health_endpoint() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let client = HttpProcessorClient::new("processor_a", server.uri(), Duration::from_secs(5));
    assert!(client.probe_health().await);
    assert!(client.is_healthy());
}
