//! One fetch attempt for one article against a live session.

use std::time::Duration;

use ozprice_core::{AppConfig, ArticleId, FailureReason, FetchOutcome, PriceRecord};

use crate::awaiter::{AwaitOutcome, PayloadAwaiter};
use crate::block::BlockDetector;
use crate::decode::{decode_price_record, MARKER_FIELD};
use crate::error::ScraperError;
use crate::markup::scan_markup_prices;
use crate::session::{BrowserSession, SessionError};
use crate::url::{ArticleUrl, OzonUrlBuilder};

pub const DEFAULT_PAYLOAD_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_POST_NAVIGATION_DELAY: Duration = Duration::from_secs(2);

/// A single attempt at fetching one article.
///
/// Attempt failures come back as [`FetchOutcome::Failure`]; `Err` is reserved
/// for conditions that make further attempts on the session pointless.
#[allow(async_fn_in_trait)]
pub trait FetchOnce<S: BrowserSession> {
    async fn fetch_once(
        &self,
        session: &mut S,
        article: ArticleId,
    ) -> Result<FetchOutcome, ScraperError>;
}

#[derive(Debug, Clone)]
pub struct ArticleFetcher<U = OzonUrlBuilder> {
    urls: U,
    blocker: BlockDetector,
    awaiter: PayloadAwaiter,
    payload_timeout: Duration,
    post_navigation_delay: Duration,
    markup_fallback: bool,
}

impl Default for ArticleFetcher<OzonUrlBuilder> {
    fn default() -> Self {
        Self::new(OzonUrlBuilder::default())
    }
}

impl ArticleFetcher<OzonUrlBuilder> {
    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self::new(OzonUrlBuilder::from_app_config(config))
            .with_awaiter(PayloadAwaiter::new(
                Duration::from_secs(config.document_ready_timeout_secs),
                Duration::from_millis(config.poll_interval_ms),
            ))
            .with_payload_timeout(Duration::from_secs(config.payload_timeout_secs))
            .with_post_navigation_delay(Duration::from_millis(config.post_navigation_delay_ms))
            .with_markup_fallback(config.markup_fallback)
    }
}

impl<U: ArticleUrl> ArticleFetcher<U> {
    /// Fetcher with default detector, awaiter and timings.
    #[must_use]
    pub fn new(urls: U) -> Self {
        Self {
            urls,
            blocker: BlockDetector::default(),
            awaiter: PayloadAwaiter::default(),
            payload_timeout: DEFAULT_PAYLOAD_TIMEOUT,
            post_navigation_delay: DEFAULT_POST_NAVIGATION_DELAY,
            markup_fallback: false,
        }
    }

    #[must_use]
    pub fn with_blocker(mut self, blocker: BlockDetector) -> Self {
        self.blocker = blocker;
        self
    }

    #[must_use]
    pub fn with_awaiter(mut self, awaiter: PayloadAwaiter) -> Self {
        self.awaiter = awaiter;
        self
    }

    #[must_use]
    pub fn with_payload_timeout(mut self, timeout: Duration) -> Self {
        self.payload_timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_post_navigation_delay(mut self, delay: Duration) -> Self {
        self.post_navigation_delay = delay;
        self
    }

    #[must_use]
    pub fn with_markup_fallback(mut self, enabled: bool) -> Self {
        self.markup_fallback = enabled;
        self
    }

    fn markup_prices(&self, article: ArticleId, document: Option<&str>) -> Option<PriceRecord> {
        if !self.markup_fallback {
            return None;
        }
        let record = scan_markup_prices(document?)?;
        tracing::info!(article = %article, price = ?record.price, "price recovered from page markup");
        Some(record)
    }
}

impl<S, U> FetchOnce<S> for ArticleFetcher<U>
where
    S: BrowserSession,
    U: ArticleUrl,
{
    async fn fetch_once(
        &self,
        session: &mut S,
        article: ArticleId,
    ) -> Result<FetchOutcome, ScraperError> {
        let url = self.urls.article_url(article);
        tracing::info!(article = %article, url = %url, "navigating to product");

        if let Err(e) = session.navigate(&url).await {
            return match e {
                SessionError::InvalidSession(_) => Err(ScraperError::InvalidSession(e)),
                SessionError::Protocol(_) => Ok(FetchOutcome::failure(
                    FailureReason::InternalError,
                    e.to_string(),
                )),
                SessionError::Timeout(_) | SessionError::Driver { .. } | SessionError::Http(_) => {
                    tracing::warn!(article = %article, error = %e, "navigation failed");
                    Ok(FetchOutcome::failure(
                        FailureReason::NavigationFailed,
                        e.to_string(),
                    ))
                }
            };
        }

        if !self.post_navigation_delay.is_zero() {
            tokio::time::sleep(self.post_navigation_delay).await;
        }

        let read = match session.current_document_text().await {
            Err(e) if e.is_invalid_session() => return Err(ScraperError::InvalidSession(e)),
            read => read,
        };
        if self.blocker.is_blocked_read(&read) {
            let detail = match &read {
                Ok(document) => self
                    .blocker
                    .matched_signature(document)
                    .unwrap_or_default()
                    .to_owned(),
                Err(e) => format!("page unreadable: {e}"),
            };
            let current_url = session.current_url().await.unwrap_or_default();
            tracing::warn!(
                article = %article,
                current_url = %current_url,
                detail = %detail,
                "page looks blocked"
            );
            return Ok(FetchOutcome::failure(FailureReason::Blocked, detail));
        }
        if let Ok(current_url) = session.current_url().await {
            tracing::debug!(article = %article, current_url = %current_url, "page loaded");
        }

        let awaited = self
            .awaiter
            .await_payload(session, MARKER_FIELD, self.payload_timeout)
            .await?;

        match awaited {
            AwaitOutcome::Ready { payload, document } => {
                if let Some(record) = decode_price_record(payload.as_str()) {
                    tracing::info!(article = %article, price = ?record.price, "price decoded");
                    return Ok(FetchOutcome::Success(record));
                }
                if let Some(record) = self.markup_prices(article, Some(&document)) {
                    return Ok(FetchOutcome::Success(record));
                }
                tracing::warn!(article = %article, "payload has no usable price widget");
                Ok(FetchOutcome::failure(
                    FailureReason::PayloadUndecodable,
                    "no usable webPrice widget in payload",
                ))
            }
            AwaitOutcome::TimedOut { partial, document } => {
                if let Some(record) = self.markup_prices(article, document.as_deref()) {
                    return Ok(FetchOutcome::Success(record));
                }
                let detail = if partial.is_some() {
                    format!(
                        "payload without {MARKER_FIELD} after {}s",
                        self.payload_timeout.as_secs()
                    )
                } else {
                    format!("no payload after {}s", self.payload_timeout.as_secs())
                };
                Ok(FetchOutcome::failure(FailureReason::PayloadTimeout, detail))
            }
        }
    }
}
