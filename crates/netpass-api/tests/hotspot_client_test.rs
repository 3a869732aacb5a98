#![allow(clippy::unwrap_used)]
// Integration tests for `HotspotClient` using wiremock.

use serde_json::json;
use url::Url;
use wiremock::matchers::{basic_auth, body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use netpass_api::{Error, HotspotClient, NasCredentials};

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup() -> (MockServer, HotspotClient) {
    let server = MockServer::start().await;
    let base_url = Url::parse(&server.uri()).unwrap();
    let creds = NasCredentials::new("api", "s3cret".to_string().into());
    let client = HotspotClient::with_client(reqwest::Client::new(), base_url, creds);
    (server, client)
}

// ── Listing ─────────────────────────────────────────────────────────

#[tokio::test]
async fn test_list_active_sessions() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/rest/ip/hotspot/active"))
        .and(basic_auth("api", "s3cret"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {
                ".id": "*1A",
                "user": "K7PX2M9Q",
                "address": "10.5.50.12",
                "mac-address": "AA:BB:CC:00:11:22",
                "server": "hotspot1",
                "uptime": "1h2m",
                "bytes-in": "52428800",
                "bytes-out": "1048576"
            },
            {
                ".id": "*1B",
                "user": "alice"
            }
        ])))
        .mount(&server)
        .await;

    let sessions = client.list_active().await.unwrap();

    assert_eq!(sessions.len(), 2);
    assert_eq!(sessions[0].id, "*1A");
    assert_eq!(sessions[0].user, "K7PX2M9Q");
    assert_eq!(sessions[0].bytes_in(), Some(52_428_800));
    assert_eq!(sessions[0].uptime_secs(), Some(3_720));
    assert_eq!(sessions[1].address, None);
}

#[tokio::test]
async fn test_list_active_unauthorized() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/rest/ip/hotspot/active"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let result = client.list_active().await;
    assert!(
        matches!(result, Err(Error::Authentication { .. })),
        "expected Authentication error, got: {result:?}"
    );
}

#[tokio::test]
async fn test_list_active_malformed_body() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/rest/ip/hotspot/active"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>login</html>"))
        .mount(&server)
        .await;

    let result = client.list_active().await;
    assert!(matches!(result, Err(Error::Deserialization { .. })));
}

// ── Removal ─────────────────────────────────────────────────────────

#[tokio::test]
async fn test_remove_active_posts_row_id() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/rest/ip/hotspot/active/remove"))
        .and(body_json(json!({ ".id": "*1A" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    client.remove_active("*1A").await.unwrap();
}

#[tokio::test]
async fn test_remove_active_empty_body() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/rest/ip/hotspot/active/remove"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    client.remove_active("*2").await.unwrap();
}

#[tokio::test]
async fn test_remove_unknown_session_is_not_found() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/rest/ip/hotspot/active/remove"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "error": 404,
            "message": "Not Found",
            "detail": "no such item"
        })))
        .mount(&server)
        .await;

    let err = client.remove_active("*FF").await.unwrap_err();
    assert!(err.is_not_found(), "expected not-found, got: {err:?}");
    assert_eq!(err.to_string(), "NAS API error (HTTP 404): Not Found: no such item");
}
