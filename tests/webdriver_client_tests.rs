use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use posting_harvest::error::{SessionError, WebDriverError};
use posting_harvest::session::{BrowserSession, SessionOptions};
use posting_harvest::webdriver::{By, Driver, ELEMENT_KEY, ElementRef, WebDriverClient};

async fn server_with_session() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/session"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "value": { "sessionId": "s-1", "capabilities": { "browserName": "chrome" } }
        })))
        .mount(&server)
        .await;
    server
}

#[tokio::test]
async fn creates_session_and_finds_elements() {
    let server = server_with_session().await;
    Mock::given(method("POST"))
        .and(path("/session/s-1/elements"))
        .and(body_json(json!({ "using": "css selector", "value": ".JobCard" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "value": [ { ELEMENT_KEY: "e-1" }, { ELEMENT_KEY: "e-2" } ]
        })))
        .mount(&server)
        .await;

    let client = WebDriverClient::create_session(&server.uri(), &json!({}))
        .await
        .unwrap();
    assert_eq!(client.session_id(), "s-1");

    let found = client.find_all(&By::class("JobCard")).await.unwrap();
    assert_eq!(
        found,
        vec![ElementRef("e-1".into()), ElementRef("e-2".into())]
    );
}

#[tokio::test]
async fn reads_attribute_text_and_rect() {
    let server = server_with_session().await;
    Mock::given(method("GET"))
        .and(path("/session/s-1/element/e-1/attribute/href"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "value": "/wd/42" })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/session/s-1/element/e-1/attribute/data-company-name"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "value": null })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/session/s-1/element/e-1/text"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "value": "주요업무" })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/session/s-1/element/e-1/rect"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "value": { "x": 8, "y": 240.5, "width": 320, "height": 24 }
        })))
        .mount(&server)
        .await;

    let client = WebDriverClient::create_session(&server.uri(), &json!({}))
        .await
        .unwrap();
    let element = ElementRef("e-1".into());

    assert_eq!(
        client.attribute(&element, "href").await.unwrap().as_deref(),
        Some("/wd/42")
    );
    assert_eq!(client.attribute(&element, "data-company-name").await.unwrap(), None);
    assert_eq!(client.text(&element).await.unwrap(), "주요업무");
    let rect = client.rect(&element).await.unwrap();
    assert_eq!(rect.y, 240.5);
    assert_eq!(rect.width, 320.0);
}

#[tokio::test]
async fn w3c_error_payload_becomes_protocol_error() {
    let server = server_with_session().await;
    Mock::given(method("POST"))
        .and(path("/session/s-1/url"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({
            "value": { "error": "timeout", "message": "page load timed out", "stacktrace": "" }
        })))
        .mount(&server)
        .await;

    let client = WebDriverClient::create_session(&server.uri(), &json!({}))
        .await
        .unwrap();
    let err = client.navigate("https://www.wanted.co.kr").await.unwrap_err();
    assert_eq!(err.code(), Some("timeout"));
    assert!(err.to_string().contains("page load timed out"));
}

#[tokio::test]
async fn non_json_failure_keeps_status() {
    let server = server_with_session().await;
    Mock::given(method("GET"))
        .and(path("/session/s-1/source"))
        .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway"))
        .mount(&server)
        .await;

    let client = WebDriverClient::create_session(&server.uri(), &json!({}))
        .await
        .unwrap();
    let err = client.page_source().await.unwrap_err();
    assert!(matches!(err, WebDriverError::Http { status: 502, ref body } if body == "bad gateway"));
}

#[tokio::test]
async fn missing_session_id_is_a_decode_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/session"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "value": {} })))
        .mount(&server)
        .await;

    let err = WebDriverClient::create_session(&server.uri(), &json!({}))
        .await
        .err()
        .unwrap();
    assert!(matches!(err, WebDriverError::Decode(_)));
}

async fn mount_status(server: &MockServer, value: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path("/status"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "value": value })))
        .mount(server)
        .await;
}

fn session_options(endpoint: String) -> SessionOptions {
    SessionOptions {
        webdriver_url: endpoint,
        webdriver_binary: None,
        autostart: false,
        start_timeout: Duration::from_secs(1),
        headless: true,
        user_agent: "test-agent".into(),
    }
}

#[tokio::test]
async fn browser_session_deletes_remote_session_on_close() {
    let server = server_with_session().await;
    mount_status(&server, json!({ "ready": true, "message": "ChromeDriver ready" })).await;
    Mock::given(method("DELETE"))
        .and(path("/session/s-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "value": null })))
        .expect(1)
        .mount(&server)
        .await;

    let session = BrowserSession::open(&session_options(server.uri()))
        .await
        .unwrap();
    assert_eq!(session.session_id(), "s-1");
    let profile_dir = session.profile_dir().to_path_buf();
    assert!(profile_dir.is_dir());

    session.close().await;
    assert!(!profile_dir.exists());
}

#[tokio::test]
async fn unreachable_endpoint_without_autostart_fails_setup() {
    let err = BrowserSession::open(&session_options("http://127.0.0.1:9".into()))
        .await
        .err()
        .unwrap();
    assert!(matches!(err, SessionError::Unreachable(_)));
}

#[tokio::test]
async fn status_without_ready_flag_is_used_as_is() {
    let server = server_with_session().await;
    mount_status(&server, json!({ "build": { "version": "120.0" } })).await;

    let session = BrowserSession::open(&session_options(server.uri()))
        .await
        .unwrap();
    assert_eq!(session.session_id(), "s-1");
}

#[tokio::test]
async fn busy_endpoint_without_autostart_fails_setup() {
    let server = server_with_session().await;
    mount_status(&server, json!({ "ready": false, "message": "session limit reached" })).await;

    let err = BrowserSession::open(&session_options(server.uri()))
        .await
        .err()
        .unwrap();
    assert!(matches!(err, SessionError::Unreachable(ref endpoint) if endpoint == &server.uri()));
}
