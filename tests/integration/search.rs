//! Integration tests for search, refinements and cluster requests

use super::*;
use groupby_bridge::client::SKIP_CACHING_HEADER;
use groupby_bridge::{CloudBridge, FieldSort, Header, Query, SelectedRefinement};
use pretty_assertions::assert_eq;
use serde_json::json;
use std::io::Read;
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, ResponseTemplate};

#[tokio::test(flavor = "multi_thread")]
async fn test_search_integration_success() {
    let mock_server = setup_mock_server().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/search"))
        .and(query_param("retry", "0"))
        .and(query_param("env", "staging"))
        .and(header("Content-Type", "application/json"))
        .and(header("X-Tenant", "acme"))
        .and(body_partial_json(json!({
            "clientKey": CLIENT_KEY,
            "query": "boots",
            "pageSize": 20,
            "sort": [{"field": "price", "order": "Descending"}],
            "refinements": [{"type": "Value", "navigationName": "brand", "value": "Acme"}]
        })))
        .respond_with(success_response(json!({
            "query": "boots",
            "totalRecordCount": 2,
            "records": [
                {"_id": "r1", "_t": "Hiking boot", "allMeta": {"price": 120}},
                {"_id": "r2", "_t": "Rain boot", "allMeta": {"price": 45}}
            ],
            "availableNavigation": [{
                "name": "brand",
                "refinements": [{"type": "Value", "value": "Acme", "count": 2}]
            }]
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let bridge = builder(&mock_server).header("X-Tenant", "acme");
    let results = blocking(move || {
        let bridge = bridge.build().unwrap();
        let query = Query::new()
            .query("boots")
            .page_size(20)
            .sort(FieldSort::new("price").descending())
            .refinement(SelectedRefinement::value("brand", "Acme"))
            .url_param("env", "staging");
        bridge.search(&query)
    })
    .await
    .unwrap();

    assert_eq!(results.total_record_count, 2);
    assert_eq!(results.records[1].title.as_deref(), Some("Rain boot"));
    assert_eq!(results.navigation("brand").unwrap().refinements[0].count(), 2);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_refinements_integration_success() {
    let mock_server = setup_mock_server().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/search/refinements"))
        .and(query_param("retry", "0"))
        .and(body_partial_json(json!({
            "navigationName": "brand",
            "originalQuery": {"clientKey": CLIENT_KEY, "query": "boots"}
        })))
        .respond_with(success_response(json!({
            "navigation": {
                "name": "brand",
                "refinements": [
                    {"type": "Value", "value": "Acme", "count": 4},
                    {"type": "Value", "value": "Globex", "count": 1}
                ]
            }
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let bridge = builder(&mock_server);
    let result = blocking(move || {
        let bridge = bridge.build().unwrap();
        bridge.refinements(&Query::new().query("boots"), "brand")
    })
    .await
    .unwrap();

    let navigation = result.navigation.unwrap();
    assert_eq!(navigation.refinements.len(), 2);
    assert_eq!(navigation.refinements[1].count(), 1);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_binary_search_integration() {
    let mock_server = setup_mock_server().await;
    let payload = rmp_serde::to_vec_named(&json!({"totalRecordCount": 7})).unwrap();

    Mock::given(method("POST"))
        .and(path("/api/v1/search"))
        .and(body_partial_json(json!({"returnBinary": true})))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(payload))
        .mount(&mock_server)
        .await;

    let bridge = builder(&mock_server);
    let results = blocking(move || {
        let bridge = bridge.build().unwrap();
        bridge.search(&Query::new().return_binary(true))
    })
    .await
    .unwrap();

    assert_eq!(results.total_record_count, 7);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_cluster_integration() {
    let mock_server = setup_mock_server().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/cluster"))
        .and(body_partial_json(json!({"clientKey": CLIENT_KEY})))
        .respond_with(success_response(json!({"nodes": [{"name": "node-1"}]})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let bridge = builder(&mock_server);
    let info = blocking(move || bridge.build().unwrap().cluster())
        .await
        .unwrap();

    assert_eq!(info["nodes"][0]["name"], "node-1");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_fire_request_streams_body() {
    let mock_server = setup_mock_server().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/custom"))
        .and(query_param("retry", "0"))
        .respond_with(ResponseTemplate::new(200).set_body_string("streamed text"))
        .mount(&mock_server)
        .await;

    let url = format!("{}/custom", base_url(&mock_server));
    let bridge = builder(&mock_server);
    let text = blocking(move || {
        let bridge = bridge.build().unwrap();
        let mut body = bridge.fire_request(&url, None, "{}", false).unwrap();
        let mut text = String::new();
        body.read_to_string(&mut text).unwrap();
        text
    })
    .await;

    assert_eq!(text, "streamed text");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_header_changes_apply_to_later_requests() {
    let mock_server = setup_mock_server().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/search"))
        .and(header("Skip-Caching", "true"))
        .respond_with(success_response(json!({"totalRecordCount": 1})))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/v1/search"))
        .respond_with(success_response(json!({"totalRecordCount": 2})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let bridge = builder(&mock_server);
    let counts = blocking(move || {
        let bridge = bridge.build().unwrap();
        bridge
            .headers()
            .set(Header::new(SKIP_CACHING_HEADER, "true"));
        let first = bridge.search(&Query::new()).unwrap().total_record_count;

        bridge.headers().remove("skip-caching");
        let second = bridge.search(&Query::new()).unwrap().total_record_count;
        vec![first, second]
    })
    .await;

    assert_eq!(counts, vec![1, 2]);
}

#[test]
fn test_cloud_bridge_url() {
    let bridge = CloudBridge::new(CLIENT_KEY, "acme").unwrap();

    assert_eq!(
        bridge.refinements_url(),
        "https://acme.groupbycloud.com:443/api/v1/search/refinements"
    );
    assert_eq!(bridge.cluster_url(), "https://acme.groupbycloud.com:443/api/v1/cluster");
    bridge.shutdown();
}
