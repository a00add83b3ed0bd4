#![allow(dead_code, unused_imports, unused_variables)]

use std::time::Duration;

use mkpro_core::{ApiClient, ApiConfig, MkproError, RequestOptions, API_KEY_HEADER};
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer, api_key: Option<&str>) -> ApiClient {
    let config = ApiConfig {
        base_url: server.uri(),
        api_key: api_key.map(str::to_string),
        timeout_ms: 2_000,
    };
    ApiClient::new(&config).unwrap()
}

#[tokio::test]
async fn test_error_message_prefers_detail() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/detail"))
        .respond_with(
            ResponseTemplate::new(400).set_body_json(json!({"detail": "bad brand", "error": "x"})),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/error"))
        .respond_with(ResponseTemplate::new(502).set_body_json(json!({"error": "upstream down"})))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/bare"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let client = client_for(&server, None);

    let err = client.request("/detail", RequestOptions::get()).await.unwrap_err();
    assert_eq!(err.to_string(), "bad brand");
    assert_eq!(err.status(), Some(400));

    let err = client.request("/error", RequestOptions::get()).await.unwrap_err();
    assert_eq!(err.to_string(), "upstream down");

    let err = client.request("/bare", RequestOptions::get()).await.unwrap_err();
    assert_eq!(err.to_string(), "HTTP 503");
}

#[tokio::test]
async fn test_non_json_error_body_is_wrapped() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/health"))
        .respond_with(ResponseTemplate::new(500).set_body_string("Internal Server Error"))
        .mount(&server)
        .await;

    let client = client_for(&server, None);
    let err = client
        .request("/api/health", RequestOptions::get())
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Internal Server Error");
}

#[tokio::test]
async fn test_empty_success_body_is_empty_object() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/context/set"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let client = client_for(&server, None);
    let value = client
        .request("/api/context/set", RequestOptions::post(json!({"brand_id": 1})))
        .await
        .unwrap();
    assert_eq!(value, json!({}));
}

#[tokio::test]
async fn test_slow_response_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"ok": true}))
                .set_delay(Duration::from_millis(500)),
        )
        .mount(&server)
        .await;

    let client = client_for(&server, None);
    let err = client
        .request(
            "/slow",
            RequestOptions::get().with_timeout(Duration::from_millis(50)),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, MkproError::Timeout));
    assert_eq!(err.to_string(), "timeout");
}

#[tokio::test]
async fn test_api_key_header_attached() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/brands"))
        .and(header(API_KEY_HEADER, "secret-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server, Some("secret-key"));
    assert!(client.has_api_key());
    let value = client.request("/api/brands", RequestOptions::get()).await.unwrap();
    assert_eq!(value, json!([]));
}

#[tokio::test]
async fn test_blank_api_key_not_sent() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/health"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
        .mount(&server)
        .await;

    let client = client_for(&server, Some("   "));
    assert!(!client.has_api_key());
    client.request("/api/health", RequestOptions::get()).await.unwrap();

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    assert!(!requests[0].headers.contains_key(API_KEY_HEADER));
}

#[tokio::test]
async fn test_query_and_body_are_sent() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/wa/start"))
        .and(query_param("brand_id", "7"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"started": true})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/api/wa/config"))
        .and(body_json(json!({"brand_id": 7, "agent_mode": "auto"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server, None);
    let started = client
        .request("/api/wa/start", RequestOptions::post_empty().query("brand_id", 7))
        .await
        .unwrap();
    assert_eq!(started["started"], true);

    client
        .request(
            "/api/wa/config",
            RequestOptions::put(json!({"brand_id": 7, "agent_mode": "auto"})),
        )
        .await
        .unwrap();
}

#[tokio::test]
async fn test_unreachable_backend_is_network_error() {
    let config = ApiConfig {
        base_url: "http://127.0.0.1:1".to_string(),
        api_key: None,
        timeout_ms: 2_000,
    };
    let client = ApiClient::new(&config).unwrap();
    let err = client
        .request("/api/health", RequestOptions::get())
        .await
        .unwrap_err();

    assert!(matches!(err, MkproError::Network(_)));
    assert!(err.is_transient());
}

#[tokio::test]
async fn test_typed_decode_failure_is_schema_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/chat/thread"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"messages": "nope"})))
        .mount(&server)
        .await;

    let client = client_for(&server, None);
    let result: Result<mkpro_core::ChatThread, _> = client
        .get_json("/api/chat/thread", &[("brand_id", "1".to_string())])
        .await;
    assert!(matches!(result, Err(MkproError::ResponseSchema(_))));
}
