//! Integration tests for error translation

use super::*;
use groupby_bridge::{BridgeError, Query, TransportError};
use serde_json::json;
use test_case::test_case;
use wiremock::matchers::{method, path};
use wiremock::{Mock, ResponseTemplate};

#[tokio::test(flavor = "multi_thread")]
async fn test_server_error_with_embedded_message() {
    let mock_server = setup_mock_server().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/search"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({"errors": "invalid token"})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let bridge = builder(&mock_server);
    let err = blocking(move || bridge.build().unwrap().search(&Query::new()))
        .await
        .unwrap_err();

    let message = err.to_string();
    assert!(message.starts_with("Exception from bridge: "));
    assert!(message.contains("500 Internal Server Error"));
    assert!(message.contains("invalid token"));
    assert_eq!(err.status(), Some(500));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_server_error_with_undecodable_body() {
    let mock_server = setup_mock_server().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/search/refinements"))
        .respond_with(ResponseTemplate::new(502).set_body_string("<html>bad gateway</html>"))
        .mount(&mock_server)
        .await;

    let bridge = builder(&mock_server);
    let err = blocking(move || {
        bridge
            .build()
            .unwrap()
            .refinements(&Query::new(), "brand")
    })
    .await
    .unwrap_err();

    let message = err.to_string();
    assert!(message.contains("502 Bad Gateway"));
    assert!(message.ends_with("\nbody:\n<html>bad gateway</html>"));
}

#[test_case(201 ; "created")]
#[test_case(204 ; "no content")]
#[test_case(400 ; "bad request")]
#[test_case(404 ; "not found")]
#[test_case(503 ; "unavailable")]
#[tokio::test(flavor = "multi_thread")]
async fn test_any_status_but_200_fails(status: u16) {
    let mock_server = setup_mock_server().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(status))
        .expect(1)
        .mount(&mock_server)
        .await;

    let bridge = builder(&mock_server);
    let err = blocking(move || bridge.build().unwrap().search(&Query::new()))
        .await
        .unwrap_err();

    assert!(matches!(err, BridgeError::RequestFailed { .. }));
    assert_eq!(err.status(), Some(status));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_request_after_shutdown_fails() {
    let mock_server = setup_mock_server().await;

    Mock::given(method("POST"))
        .respond_with(success_response(json!({})))
        .expect(0)
        .mount(&mock_server)
        .await;

    let bridge = builder(&mock_server);
    let err = blocking(move || {
        let bridge = bridge.build().unwrap();
        bridge.shutdown();
        bridge.shutdown();
        bridge.search(&Query::new())
    })
    .await
    .unwrap_err();

    assert!(matches!(
        err,
        BridgeError::Transport {
            source: TransportError::Closed
        }
    ));
    assert!(!err.is_retryable());
}

#[test]
fn test_malformed_base_url() {
    let err = Bridge::new(CLIENT_KEY, "ftp://bridge.local/api").unwrap_err();
    assert!(matches!(err, BridgeError::MalformedEndpoint { .. }));

    let err = Bridge::new(CLIENT_KEY, "not a url").unwrap_err();
    assert!(matches!(err, BridgeError::MalformedEndpoint { .. }));

    let err = Bridge::new("  ", "http://bridge.local").unwrap_err();
    assert!(matches!(err, BridgeError::Configuration { .. }));
}
