//! The browser capability consumed by the fetch pipeline.

use thiserror::Error;

/// Errors reported by a [`BrowserSession`] implementation.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The session was closed or is unknown to the driver. Not recoverable.
    #[error("invalid session: {0}")]
    InvalidSession(String),

    /// Navigation or script execution exceeded the driver's timeout.
    #[error("driver timeout: {0}")]
    Timeout(String),

    /// The driver answered with a W3C error code other than the above.
    #[error("driver error {code}: {message}")]
    Driver { code: String, message: String },

    /// Transport failure talking to the driver.
    #[error("driver HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The driver replied with something that is not a WebDriver response.
    #[error("unexpected driver response: {0}")]
    Protocol(String),
}

impl SessionError {
    #[must_use]
    pub fn is_invalid_session(&self) -> bool {
        matches!(self, SessionError::InvalidSession(_))
    }
}

/// One live, stateful browser tab driven by the pipeline.
///
/// Every method takes `&mut self`: a session runs at most one navigation at a
/// time and is never shared between concurrent fetches. Callers wanting
/// parallelism allocate one session per worker.
#[allow(async_fn_in_trait)]
pub trait BrowserSession {
    /// Loads `url`, returning once the browser reports the navigation done.
    async fn navigate(&mut self, url: &str) -> Result<(), SessionError>;

    /// Full rendered markup of the current document.
    async fn current_document_text(&mut self) -> Result<String, SessionError>;

    /// `true` once the page's own load-complete signal has fired.
    async fn is_document_ready(&mut self) -> Result<bool, SessionError>;

    /// Current address, for diagnostics only.
    async fn current_url(&mut self) -> Result<String, SessionError>;

    /// Releases the session. Calling it again is a no-op.
    async fn close(&mut self) -> Result<(), SessionError>;
}
