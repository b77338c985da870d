//! Integration tests for the bounded connection pool

use super::*;
use groupby_bridge::{BridgeError, ConnectionConfig, Query, TransportError};
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::Mock;

#[tokio::test(flavor = "multi_thread")]
async fn test_unread_body_holds_its_connection() {
    let mock_server = setup_mock_server().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/search"))
        .respond_with(success_response(json!({"totalRecordCount": 3})))
        .mount(&mock_server)
        .await;

    let connection = ConnectionConfig::new()
        .max_connections(1)
        .max_connections_per_route(1)
        .connection_request_timeout(Duration::from_millis(50));
    let bridge = builder(&mock_server).connection(connection);

    let (blocked, after_release) = blocking(move || {
        let bridge = bridge.build().unwrap();
        let held = bridge
            .fire_request(bridge.search_url(), None, "{}", false)
            .unwrap();

        let blocked = bridge.search(&Query::new());
        drop(held);
        let after_release = bridge.search(&Query::new());
        (blocked, after_release)
    })
    .await;

    assert!(matches!(
        blocked,
        Err(BridgeError::Transport {
            source: TransportError::PoolTimeout { .. }
        })
    ));
    assert_eq!(after_release.unwrap().total_record_count, 3);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_concurrent_searches_share_one_bridge() {
    let mock_server = setup_mock_server().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/search"))
        .respond_with(success_response(json!({"totalRecordCount": 1})))
        .expect(16)
        .mount(&mock_server)
        .await;

    let connection = ConnectionConfig::new()
        .max_connections(4)
        .max_connections_per_route(2);
    let bridge = builder(&mock_server).connection(connection);

    let totals = blocking(move || {
        let bridge = Arc::new(bridge.build().unwrap());
        let handles: Vec<_> = (0..16)
            .map(|_| {
                let bridge = Arc::clone(&bridge);
                std::thread::spawn(move || bridge.search(&Query::new()).unwrap().total_record_count)
            })
            .collect();
        handles
            .into_iter()
            .map(|handle| handle.join().unwrap())
            .sum::<u64>()
    })
    .await;

    assert_eq!(totals, 16);
}
