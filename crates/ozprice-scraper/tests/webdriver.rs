//! Integration tests for `WebDriverSession` against a mocked driver.
//!
//! Each test stands up a `wiremock` server speaking the W3C WebDriver wire
//! format, so no browser or chromedriver is needed.

use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use ozprice_scraper::{BrowserSession, SessionError, WebDriverSession};

const SESSION: &str = "4f1c2e";

async fn driver_with_session() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/session"))
        .and(body_json(json!({
            "capabilities": {
                "alwaysMatch": {
                    "browserName": "chrome",
                    "timeouts": { "pageLoad": 30000 }
                }
            }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "value": { "sessionId": SESSION, "capabilities": { "browserName": "chrome" } }
        })))
        .expect(1)
        .mount(&server)
        .await;
    server
}

async fn connect(server: &MockServer) -> WebDriverSession {
    WebDriverSession::connect(
        &server.uri(),
        Duration::from_secs(30),
        Duration::from_secs(5),
    )
    .await
    .expect("failed to create test session")
}

fn driver_error(status: u16, code: &str, message: &str) -> ResponseTemplate {
    ResponseTemplate::new(status).set_body_json(json!({
        "value": { "error": code, "message": message, "stacktrace": "" }
    }))
}

#[tokio::test]
async fn connect_reads_session_id() {
    let server = driver_with_session().await;
    let session = connect(&server).await;
    assert_eq!(session.session_id(), SESSION);
    assert!(!session.is_closed());
}

#[tokio::test]
async fn connect_surfaces_driver_refusal() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/session"))
        .respond_with(driver_error(500, "session not created", "Chrome failed to start"))
        .mount(&server)
        .await;

    let result =
        WebDriverSession::connect(&server.uri(), Duration::from_secs(30), Duration::from_secs(5))
            .await;

    assert!(
        matches!(&result, Err(SessionError::Driver { code, .. }) if code == "session not created"),
        "expected Driver error, got: {result:?}"
    );
}

#[tokio::test]
async fn navigate_posts_target_url() {
    let server = driver_with_session().await;
    Mock::given(method("POST"))
        .and(path(format!("/session/{SESSION}/url")))
        .and(body_json(json!({ "url": "https://www.ozon.ru/product/42/" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "value": null })))
        .expect(1)
        .mount(&server)
        .await;

    let mut session = connect(&server).await;
    session
        .navigate("https://www.ozon.ru/product/42/")
        .await
        .expect("navigate should succeed");
}

#[tokio::test]
async fn navigate_timeout_maps_to_timeout() {
    let server = driver_with_session().await;
    Mock::given(method("POST"))
        .and(path(format!("/session/{SESSION}/url")))
        .respond_with(driver_error(500, "timeout", "timeout: Timed out receiving message"))
        .mount(&server)
        .await;

    let mut session = connect(&server).await;
    let err = session.navigate("https://www.ozon.ru/").await.unwrap_err();
    assert!(matches!(err, SessionError::Timeout(_)), "got: {err:?}");
}

#[tokio::test]
async fn reads_page_source_and_url() {
    let server = driver_with_session().await;
    Mock::given(method("GET"))
        .and(path(format!("/session/{SESSION}/source")))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "value": "<html><pre>{}</pre></html>" })),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("/session/{SESSION}/url")))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "value": "https://www.ozon.ru/product/42/" })),
        )
        .mount(&server)
        .await;

    let mut session = connect(&server).await;
    assert_eq!(
        session.current_document_text().await.unwrap(),
        "<html><pre>{}</pre></html>"
    );
    assert_eq!(
        session.current_url().await.unwrap(),
        "https://www.ozon.ru/product/42/"
    );
}

#[tokio::test]
async fn ready_state_complete_means_ready() {
    let server = driver_with_session().await;
    Mock::given(method("POST"))
        .and(path(format!("/session/{SESSION}/execute/sync")))
        .and(body_json(json!({ "script": "return document.readyState", "args": [] })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "value": "complete" })))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(format!("/session/{SESSION}/execute/sync")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "value": "interactive" })))
        .mount(&server)
        .await;

    let mut session = connect(&server).await;
    assert!(session.is_document_ready().await.unwrap());
    assert!(!session.is_document_ready().await.unwrap());
}

#[tokio::test]
async fn unknown_session_is_invalid_session() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/session/stale/source"))
        .respond_with(driver_error(404, "invalid session id", "invalid session id"))
        .mount(&server)
        .await;

    let mut session =
        WebDriverSession::attach(&server.uri(), "stale", Duration::from_secs(5)).unwrap();
    let err = session.current_document_text().await.unwrap_err();
    assert!(err.is_invalid_session(), "got: {err:?}");
}

#[tokio::test]
async fn non_webdriver_reply_is_protocol_error() {
    let server = driver_with_session().await;
    Mock::given(method("GET"))
        .and(path(format!("/session/{SESSION}/source")))
        .respond_with(ResponseTemplate::new(502).set_body_string("<html>Bad Gateway</html>"))
        .mount(&server)
        .await;

    let mut session = connect(&server).await;
    let err = session.current_document_text().await.unwrap_err();
    assert!(matches!(err, SessionError::Protocol(_)), "got: {err:?}");
}

#[tokio::test]
async fn close_is_idempotent_and_final() {
    let server = driver_with_session().await;
    Mock::given(method("DELETE"))
        .and(path(format!("/session/{SESSION}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "value": null })))
        .expect(1)
        .mount(&server)
        .await;

    let mut session = connect(&server).await;
    session.close().await.expect("first close");
    session.close().await.expect("second close is a no-op");
    assert!(session.is_closed());

    let err = session.navigate("https://www.ozon.ru/").await.unwrap_err();
    assert!(err.is_invalid_session());
}
