//! Integration tests for connection retries

use super::*;
use groupby_bridge::resilience::Sleeper;
use groupby_bridge::{BridgeError, Query, TransportError};
use std::net::TcpListener;

/// A local URL nothing is listening on.
fn refused_base_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    format!("http://127.0.0.1:{port}/api/v1")
}

#[test]
fn test_connection_refused_exhausts_retries() {
    let sleeper = Arc::new(RecordingSleeper::new());
    let bridge = Bridge::builder()
        .client_key(CLIENT_KEY)
        .base_url(refused_base_url())
        .sleeper(Arc::clone(&sleeper) as Arc<dyn Sleeper>)
        .build()
        .unwrap();

    let err = bridge.search(&Query::new()).unwrap_err();

    match err {
        BridgeError::RetriesExhausted {
            url,
            attempts,
            source,
        } => {
            assert_eq!(url, bridge.search_url());
            assert_eq!(attempts, 3);
            assert!(source.is_transient());
        }
        other => panic!("Expected RetriesExhausted, got {other:?}"),
    }
    assert_eq!(sleeper.sleeps(), vec![Duration::from_millis(80); 2]);
}

#[test]
fn test_url_text_does_not_change_retry_class() {
    let sleeper = Arc::new(RecordingSleeper::new());
    let bridge = Bridge::builder()
        .client_key(CLIENT_KEY)
        .base_url(refused_base_url())
        .sleeper(Arc::clone(&sleeper) as Arc<dyn Sleeper>)
        .build()
        .unwrap();

    let query = Query::new().url_param("feature", "tls");
    let err = bridge.search(&query).unwrap_err();

    match err {
        BridgeError::RetriesExhausted {
            attempts, source, ..
        } => {
            assert_eq!(attempts, 3);
            assert!(matches!(source, TransportError::Connection { .. }));
        }
        other => panic!("Expected RetriesExhausted, got {other:?}"),
    }
    assert_eq!(sleeper.sleeps().len(), 2);
}

#[test]
fn test_max_tries_change_applies_to_next_request() {
    let sleeper = Arc::new(RecordingSleeper::new());
    let bridge = Bridge::builder()
        .client_key(CLIENT_KEY)
        .base_url(refused_base_url())
        .sleeper(Arc::clone(&sleeper) as Arc<dyn Sleeper>)
        .build()
        .unwrap();

    bridge.set_max_tries(1);
    let err = bridge.cluster().unwrap_err();

    assert!(matches!(err, BridgeError::RetriesExhausted { attempts: 1, .. }));
    assert!(err.to_string().starts_with("Tried to connect 1 times to: "));
    assert!(sleeper.sleeps().is_empty());
}

#[test]
fn test_real_sleeper_waits_between_attempts() {
    let bridge = Bridge::builder()
        .client_key(CLIENT_KEY)
        .base_url(refused_base_url())
        .max_tries(2)
        .retry_timeout(Duration::from_millis(50))
        .build()
        .unwrap();

    let started = std::time::Instant::now();
    let err = bridge.search(&Query::new()).unwrap_err();

    assert!(matches!(err, BridgeError::RetriesExhausted { attempts: 2, .. }));
    assert!(started.elapsed() >= Duration::from_millis(50));
}
