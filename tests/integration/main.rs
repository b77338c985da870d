//! Integration tests using WireMock
//!
//! These tests run a real `Bridge` against a mock HTTP server and verify the
//! full request/response cycle: URI building, headers, serialization, retries
//! and error translation.

mod errors;
mod pool;
mod retry;
mod search;

use std::sync::Arc;
use std::time::Duration;

use groupby_bridge::mocks::RecordingSleeper;
use groupby_bridge::{Bridge, BridgeBuilder};
use wiremock::{MockServer, ResponseTemplate};

pub const CLIENT_KEY: &str = "integration-client-key";

/// Runs blocking bridge code off the async runtime.
pub async fn blocking<T, F>(f: F) -> T
where
    T: Send + 'static,
    F: FnOnce() -> T + Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .expect("blocking task panicked")
}

/// Helper to create a mock server
pub async fn setup_mock_server() -> MockServer {
    MockServer::start().await
}

/// Base URL of the bridge served by `server`.
pub fn base_url(server: &MockServer) -> String {
    format!("{}/api/v1", server.uri())
}

/// Builder pointed at `server`.
pub fn builder(server: &MockServer) -> BridgeBuilder {
    Bridge::builder()
        .client_key(CLIENT_KEY)
        .base_url(base_url(server))
}

/// Helper to create success response templates
pub fn success_response(body: serde_json::Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(body)
}
