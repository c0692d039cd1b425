//! Waiting for the asynchronously rendered page payload.
//!
//! There is no completion event to subscribe to: the data shows up some time
//! after navigation, so the awaiter re-reads the document until a payload
//! carrying the marker field parses, or the deadline passes.
//!
//! States: `WaitDocumentReady` → `Poll` → (`Ready` | `TimedOut`).

use std::time::Duration;

use serde_json::Value;
use tokio::time::Instant;

use crate::decode::preview;
use crate::error::ScraperError;
use crate::extract::{extract_payload, RawPayload};
use crate::session::BrowserSession;

pub const DEFAULT_READY_TIMEOUT: Duration = Duration::from_secs(10);
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(500);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AwaitState {
    WaitDocumentReady,
    Poll,
    TimedOut,
}

/// Result of [`PayloadAwaiter::await_payload`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AwaitOutcome {
    /// A payload containing the marker field parsed as JSON.
    Ready { payload: RawPayload, document: String },
    /// The deadline passed. `partial` is the last extracted candidate (which
    /// lacks the marker or is not JSON) and is kept for diagnosis only.
    TimedOut {
        partial: Option<RawPayload>,
        document: Option<String>,
    },
}

impl AwaitOutcome {
    /// The payload regardless of state; `TimedOut` may still carry a partial one.
    #[must_use]
    pub fn payload(&self) -> Option<&RawPayload> {
        match self {
            AwaitOutcome::Ready { payload, .. } => Some(payload),
            AwaitOutcome::TimedOut { partial, .. } => partial.as_ref(),
        }
    }

    /// Last document text that was read, if any read succeeded.
    #[must_use]
    pub fn document(&self) -> Option<&str> {
        match self {
            AwaitOutcome::Ready { document, .. } => Some(document),
            AwaitOutcome::TimedOut { document, .. } => document.as_deref(),
        }
    }

    #[must_use]
    pub fn is_ready(&self) -> bool {
        matches!(self, AwaitOutcome::Ready { .. })
    }
}

/// Polls a live session for the page payload.
#[derive(Debug, Clone)]
pub struct PayloadAwaiter {
    ready_timeout: Duration,
    poll_interval: Duration,
}

impl Default for PayloadAwaiter {
    fn default() -> Self {
        Self::new(DEFAULT_READY_TIMEOUT, DEFAULT_POLL_INTERVAL)
    }
}

impl PayloadAwaiter {
    #[must_use]
    pub fn new(ready_timeout: Duration, poll_interval: Duration) -> Self {
        Self {
            ready_timeout,
            poll_interval,
        }
    }

    /// Waits up to `timeout` (measured from the call) for a JSON payload whose
    /// top-level object contains `marker`.
    ///
    /// The document-ready wait is capped at the ready sub-timeout and counts
    /// against `timeout`. Document read failures during polling are logged
    /// and polling continues.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::InvalidSession`] if the session is closed or
    /// unknown to the driver. Nothing else is an error.
    pub async fn await_payload<S: BrowserSession>(
        &self,
        session: &mut S,
        marker: &str,
        timeout: Duration,
    ) -> Result<AwaitOutcome, ScraperError> {
        let deadline = Instant::now() + timeout;
        let mut state = AwaitState::WaitDocumentReady;
        let mut partial: Option<RawPayload> = None;
        let mut last_document: Option<String> = None;
        let mut polls = 0u32;

        loop {
            state = match state {
                AwaitState::WaitDocumentReady => {
                    self.wait_document_ready(session, deadline).await?;
                    AwaitState::Poll
                }
                AwaitState::Poll => {
                    let now = Instant::now();
                    if now >= deadline {
                        AwaitState::TimedOut
                    } else {
                        polls += 1;
                        if let Some(document) = read_document(session).await? {
                            if polls == 1 {
                                describe_document(&document);
                            }
                            if let Some(payload) = extract_payload(&document) {
                                if has_marker(&payload, marker) {
                                    tracing::debug!(polls, marker, "payload with marker found");
                                    return Ok(AwaitOutcome::Ready { payload, document });
                                }
                                partial = Some(payload);
                            }
                            last_document = Some(document);
                        }
                        let remaining = deadline.saturating_duration_since(Instant::now());
                        tokio::time::sleep(self.poll_interval.min(remaining)).await;
                        AwaitState::Poll
                    }
                }
                AwaitState::TimedOut => {
                    if let Some(document) = read_document(session).await? {
                        if let Some(payload) = extract_payload(&document) {
                            if has_marker(&payload, marker) {
                                tracing::debug!(
                                    polls,
                                    marker,
                                    "payload with marker found at deadline"
                                );
                                return Ok(AwaitOutcome::Ready { payload, document });
                            }
                            partial = Some(payload);
                        }
                        last_document = Some(document);
                    }
                    tracing::warn!(
                        timeout_secs = timeout.as_secs_f64(),
                        polls,
                        marker,
                        has_partial = partial.is_some(),
                        "timed out waiting for payload"
                    );
                    return Ok(AwaitOutcome::TimedOut {
                        partial,
                        document: last_document,
                    });
                }
            };
        }
    }

    async fn wait_document_ready<S: BrowserSession>(
        &self,
        session: &mut S,
        deadline: Instant,
    ) -> Result<(), ScraperError> {
        let ready_deadline = (Instant::now() + self.ready_timeout).min(deadline);
        loop {
            match session.is_document_ready().await {
                Ok(true) => return Ok(()),
                Ok(false) => {}
                Err(e) if e.is_invalid_session() => return Err(ScraperError::InvalidSession(e)),
                Err(e) => tracing::debug!(error = %e, "readiness check failed"),
            }
            let now = Instant::now();
            if now >= ready_deadline {
                tracing::debug!("document not ready before sub-timeout; polling anyway");
                return Ok(());
            }
            tokio::time::sleep(self.poll_interval.min(ready_deadline - now)).await;
        }
    }
}

async fn read_document<S: BrowserSession>(session: &mut S) -> Result<Option<String>, ScraperError> {
    match session.current_document_text().await {
        Ok(document) => Ok(Some(document)),
        Err(e) if e.is_invalid_session() => Err(ScraperError::InvalidSession(e)),
        Err(e) => {
            tracing::debug!(error = %e, "error reading page source");
            Ok(None)
        }
    }
}

fn has_marker(payload: &RawPayload, marker: &str) -> bool {
    serde_json::from_str::<Value>(payload.as_str())
        .ok()
        .is_some_and(|value| value.get(marker).is_some())
}

/// Logs the shape of a loaded document at debug level.
pub fn describe_document(document: &str) {
    let has_pre = document.to_ascii_lowercase().contains("<pre");
    let direct_json = document.trim_start().starts_with('{');
    tracing::debug!(
        length = document.len(),
        has_pre,
        direct_json,
        starts_with = %preview(document, 200),
        "page content"
    );
}
