//! [`BrowserSession`] over the W3C WebDriver HTTP protocol.
//!
//! Talks to chromedriver (or any W3C-compliant driver) directly with
//! `reqwest`; no WebDriver client crate is involved.

use std::time::Duration;

use reqwest::{Client, Method};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::decode::preview;
use crate::session::{BrowserSession, SessionError};

const READY_STATE_SCRIPT: &str = "return document.readyState";

/// Reply envelope: every WebDriver response wraps its payload in `value`.
#[derive(Debug, Deserialize)]
struct WireReply {
    #[serde(default)]
    value: Value,
    /// Legacy drivers put the new session id at the top level.
    #[serde(rename = "sessionId")]
    session_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WireError {
    error: String,
    #[serde(default)]
    message: String,
}

pub struct WebDriverSession {
    client: Client,
    base_url: String,
    session_id: String,
    closed: bool,
}

impl std::fmt::Debug for WebDriverSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebDriverSession")
            .field("base_url", &self.base_url)
            .field("session_id", &self.session_id)
            .field("closed", &self.closed)
            .finish_non_exhaustive()
    }
}

impl WebDriverSession {
    /// Starts a new Chrome session on the driver at `driver_url`.
    ///
    /// `request_timeout` bounds every HTTP call to the driver and should
    /// exceed `page_load_timeout`, which the driver enforces on navigation.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Http`] if the driver is unreachable, or the
    /// mapped driver error if it refuses to create the session.
    pub async fn connect(
        driver_url: &str,
        page_load_timeout: Duration,
        request_timeout: Duration,
    ) -> Result<Self, SessionError> {
        let client = build_client(request_timeout)?;
        let base_url = driver_url.trim_end_matches('/').to_owned();
        let page_load_ms = u64::try_from(page_load_timeout.as_millis()).unwrap_or(u64::MAX);
        let capabilities = json!({
            "capabilities": {
                "alwaysMatch": {
                    "browserName": "chrome",
                    "timeouts": { "pageLoad": page_load_ms }
                }
            }
        });

        let reply = send(
            &client,
            Method::POST,
            &format!("{base_url}/session"),
            Some(&capabilities),
        )
        .await?;
        let session_id = reply
            .value
            .get("sessionId")
            .and_then(Value::as_str)
            .map(str::to_owned)
            .or(reply.session_id)
            .ok_or_else(|| {
                SessionError::Protocol("new session reply has no sessionId".to_owned())
            })?;

        tracing::info!(driver = %base_url, session_id = %session_id, "webdriver session created");
        Ok(Self {
            client,
            base_url,
            session_id,
            closed: false,
        })
    }

    /// Reuses a session that is already running on the driver.
    ///
    /// No request is made; a stale id surfaces as
    /// [`SessionError::InvalidSession`] on first use.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Http`] if the HTTP client cannot be built.
    pub fn attach(
        driver_url: &str,
        session_id: &str,
        request_timeout: Duration,
    ) -> Result<Self, SessionError> {
        Ok(Self {
            client: build_client(request_timeout)?,
            base_url: driver_url.trim_end_matches('/').to_owned(),
            session_id: session_id.to_owned(),
            closed: false,
        })
    }

    #[must_use]
    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    async fn command(
        &self,
        method: Method,
        endpoint: &str,
        body: Option<&Value>,
    ) -> Result<Value, SessionError> {
        if self.closed {
            return Err(SessionError::InvalidSession(format!(
                "session {} already closed",
                self.session_id
            )));
        }
        let url = format!("{}/session/{}{endpoint}", self.base_url, self.session_id);
        Ok(send(&self.client, method, &url, body).await?.value)
    }
}

fn build_client(request_timeout: Duration) -> Result<Client, SessionError> {
    Ok(Client::builder()
        .timeout(request_timeout)
        .connect_timeout(Duration::from_secs(10))
        .build()?)
}

async fn send(
    client: &Client,
    method: Method,
    url: &str,
    body: Option<&Value>,
) -> Result<WireReply, SessionError> {
    let mut request = client.request(method, url);
    if let Some(body) = body {
        request = request.json(body);
    }
    let response = request.send().await?;
    let status = response.status();
    let text = response.text().await?;
    parse_reply(status, &text)
}

fn parse_reply(status: reqwest::StatusCode, text: &str) -> Result<WireReply, SessionError> {
    let reply: WireReply = serde_json::from_str(text).map_err(|e| {
        SessionError::Protocol(format!(
            "HTTP {status}, body is not a WebDriver reply ({e}): {}",
            preview(text, 200)
        ))
    })?;

    if let Ok(err) = WireError::deserialize(&reply.value) {
        return Err(map_driver_error(err));
    }
    if !status.is_success() {
        return Err(SessionError::Protocol(format!(
            "HTTP {status} without a WebDriver error: {}",
            preview(text, 200)
        )));
    }
    Ok(reply)
}

fn map_driver_error(err: WireError) -> SessionError {
    match err.error.as_str() {
        "invalid session id" | "no such window" => SessionError::InvalidSession(err.message),
        "timeout" | "script timeout" => SessionError::Timeout(err.message),
        _ => SessionError::Driver {
            code: err.error,
            message: err.message,
        },
    }
}

fn expect_string(value: Value, what: &str) -> Result<String, SessionError> {
    match value {
        Value::String(s) => Ok(s),
        other => Err(SessionError::Protocol(format!(
            "expected {what} to be a string, got {other}"
        ))),
    }
}

impl BrowserSession for WebDriverSession {
    async fn navigate(&mut self, url: &str) -> Result<(), SessionError> {
        self.command(Method::POST, "/url", Some(&json!({ "url": url })))
            .await
            .map(|_| ())
    }

    async fn current_document_text(&mut self) -> Result<String, SessionError> {
        let value = self.command(Method::GET, "/source", None).await?;
        expect_string(value, "page source")
    }

    async fn is_document_ready(&mut self) -> Result<bool, SessionError> {
        let body = json!({ "script": READY_STATE_SCRIPT, "args": [] });
        let value = self.command(Method::POST, "/execute/sync", Some(&body)).await?;
        Ok(expect_string(value, "document.readyState")? == "complete")
    }

    async fn current_url(&mut self) -> Result<String, SessionError> {
        let value = self.command(Method::GET, "/url", None).await?;
        expect_string(value, "current url")
    }

    async fn close(&mut self) -> Result<(), SessionError> {
        if self.closed {
            return Ok(());
        }
        let result = self.command(Method::DELETE, "", None).await;
        self.closed = true;
        match result {
            Ok(_) => {
                tracing::info!(session_id = %self.session_id, "webdriver session closed");
                Ok(())
            }
            Err(e) if e.is_invalid_session() => Ok(()),
            Err(e) => Err(e),
        }
    }
}
