#![allow(clippy::unwrap_used)]
// Integration tests for `MiniserverClient` using wiremock.

use std::time::Duration;

use secrecy::SecretString;
use url::Url;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use loxhook_api::{Credentials, Error, MiniserverClient, TransportConfig};

// ── Helpers ─────────────────────────────────────────────────────────

fn transport(timeout: Duration) -> TransportConfig {
    TransportConfig::new(
        timeout,
        Credentials::new("admin", SecretString::from("secret".to_string())),
    )
}

async fn setup() -> (MockServer, MiniserverClient) {
    let server = MockServer::start().await;
    let base_url = Url::parse(&server.uri()).unwrap();
    let client = MiniserverClient::new(base_url, &transport(Duration::from_secs(2))).unwrap();
    (server, client)
}

// ── Probe ───────────────────────────────────────────────────────────

#[tokio::test]
async fn test_probe_success() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/jdev/cfg/api"))
        .respond_with(ResponseTemplate::new(200).set_body_string("{}"))
        .expect(1)
        .mount(&server)
        .await;

    client.probe().await.unwrap();
}

#[tokio::test]
async fn test_probe_rejects_non_success_status() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/jdev/cfg/api"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let result = client.probe().await;
    assert!(
        matches!(result, Err(Error::Status { status: 500, .. })),
        "expected Status error, got: {result:?}"
    );
}

#[tokio::test]
async fn test_probe_unreachable() {
    let base_url = Url::parse("http://127.0.0.1:1").unwrap();
    let client = MiniserverClient::new(base_url, &transport(Duration::from_secs(2))).unwrap();

    let err = client.probe().await.unwrap_err();
    assert!(!err.is_timeout(), "expected a connection error, got: {err:?}");
    assert!(matches!(err, Error::Transport(_)));
}

// ── Commands ────────────────────────────────────────────────────────

#[tokio::test]
async fn test_send_command_uses_post_and_basic_auth() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/dev/sps/io/VI7/Pulse"))
        .and(header("authorization", "Basic YWRtaW46c2VjcmV0"))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw(
                r#"<LL control="dev/sps/io/VI7/Pulse" value="1" Code="200"/>"#,
                "text/xml",
            ),
        )
        .expect(1)
        .mount(&server)
        .await;

    let resp = client.send_command("/dev/sps/io/VI7/Pulse").await.unwrap();

    assert_eq!(resp.status, 200);
    assert_eq!(resp.content_type.as_deref(), Some("text/xml"));
    assert!(String::from_utf8_lossy(&resp.body).contains("VI7/Pulse"));
}

#[tokio::test]
async fn test_send_command_passes_through_error_status() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/dev/sps/io/VI9/On"))
        .respond_with(ResponseTemplate::new(401).set_body_string("Unauthorized"))
        .mount(&server)
        .await;

    let resp = client.send_command("/dev/sps/io/VI9/On").await.unwrap();
    assert_eq!(resp.status, 401);
    assert_eq!(&resp.body[..], b"Unauthorized");
}

#[tokio::test]
async fn test_send_command_timeout() {
    let server = MockServer::start().await;
    let base_url = Url::parse(&server.uri()).unwrap();
    let client = MiniserverClient::new(base_url, &transport(Duration::from_millis(200))).unwrap();

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(3)))
        .mount(&server)
        .await;

    let err = client.send_command("/dev/sps/io/VI1/On").await.unwrap_err();
    assert!(err.is_timeout(), "expected timeout, got: {err:?}");
    assert!(matches!(err, Error::Timeout { .. }));
}

#[tokio::test]
async fn test_paths_replace_base_path() {
    let base_url = Url::parse("http://192.168.1.2:80/ignored/path").unwrap();
    let client = MiniserverClient::new(base_url, &transport(Duration::from_secs(2))).unwrap();

    let url = client.url_for("/dev/sps/io/VI3/Pulse").unwrap();
    assert_eq!(url.as_str(), "http://192.168.1.2/dev/sps/io/VI3/Pulse");
}
