//! Sequential, retrying batch runner.

use std::time::Duration;

use ozprice_core::{AppConfig, ArticleId, ArticleResult, BatchResult, FailureReason, FetchOutcome};
use uuid::Uuid;

use crate::error::ScraperError;
use crate::fetcher::FetchOnce;
use crate::session::BrowserSession;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Attempts per article, including the first one.
    pub max_retries: u32,
    /// Fixed pause between attempts of the same article.
    pub retry_delay: Duration,
    /// Pause after each article, the last one included.
    pub inter_article_delay: Duration,
    /// Largest batch accepted by [`RetryingPipeline::fetch_batch`].
    pub max_articles: usize,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            retry_delay: Duration::from_secs(2),
            inter_article_delay: Duration::from_secs(1),
            max_articles: 50,
        }
    }
}

impl RetryPolicy {
    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            retry_delay: Duration::from_millis(config.retry_delay_ms),
            inter_article_delay: Duration::from_millis(config.inter_article_delay_ms),
            max_articles: config.max_articles_per_request,
        }
    }
}

/// Runs a [`FetchOnce`] step over a batch, one article at a time.
#[derive(Debug, Clone)]
pub struct RetryingPipeline<F> {
    fetcher: F,
    policy: RetryPolicy,
}

impl<F> RetryingPipeline<F> {
    #[must_use]
    pub fn new(fetcher: F, policy: RetryPolicy) -> Self {
        Self { fetcher, policy }
    }

    #[must_use]
    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Validates raw ids and runs the batch.
    ///
    /// # Errors
    ///
    /// Before any navigation: [`ScraperError::EmptyBatch`],
    /// [`ScraperError::BatchTooLarge`], or [`ScraperError::InvalidArticle`]
    /// for a zero id. During the run: [`ScraperError::InvalidSession`].
    pub async fn fetch_batch<S>(
        &self,
        session: &mut S,
        ids: &[u64],
    ) -> Result<BatchResult, ScraperError>
    where
        S: BrowserSession,
        F: FetchOnce<S>,
    {
        if ids.is_empty() {
            return Err(ScraperError::EmptyBatch);
        }
        if ids.len() > self.policy.max_articles {
            return Err(ScraperError::BatchTooLarge {
                count: ids.len(),
                max: self.policy.max_articles,
            });
        }
        let articles = ids
            .iter()
            .map(|&id| ArticleId::try_from(id))
            .collect::<Result<Vec<_>, _>>()?;
        self.run(session, &articles).await
    }

    /// Fetches every article in order, one result per input.
    ///
    /// If the session dies after at least one attempt went through, the
    /// current and all remaining articles are recorded as
    /// [`FailureReason::InternalError`] without navigating, and the results
    /// gathered so far are kept.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::InvalidSession`] only when the very first
    /// attempt of the run finds the session invalid.
    pub async fn run<S>(
        &self,
        session: &mut S,
        articles: &[ArticleId],
    ) -> Result<BatchResult, ScraperError>
    where
        S: BrowserSession,
        F: FetchOnce<S>,
    {
        let run_id = Uuid::new_v4();
        tracing::info!(%run_id, articles = articles.len(), "starting price fetch run");

        let mut results = Vec::with_capacity(articles.len());
        let mut attempts = 0u32;
        let mut lost: Option<String> = None;
        for &article in articles {
            if let Some(detail) = &lost {
                results.push(ArticleResult {
                    article,
                    outcome: FetchOutcome::failure(FailureReason::InternalError, detail.clone()),
                });
                continue;
            }
            match self.attempt_article(session, article, &mut attempts).await {
                Ok(outcome) => results.push(ArticleResult { article, outcome }),
                Err(ScraperError::InvalidSession(e)) if attempts > 0 => {
                    tracing::error!(
                        %run_id,
                        article = %article,
                        error = %e,
                        "browser session lost, failing remaining articles"
                    );
                    let detail = format!("session lost: {e}");
                    results.push(ArticleResult {
                        article,
                        outcome: FetchOutcome::failure(FailureReason::InternalError, detail.clone()),
                    });
                    lost = Some(detail);
                    continue;
                }
                Err(e) => return Err(e),
            }
            tokio::time::sleep(self.policy.inter_article_delay).await;
        }

        let batch = BatchResult::new(run_id, results);
        tracing::info!(
            %run_id,
            total = batch.total,
            succeeded = batch.succeeded,
            failed = batch.failed(),
            "price fetch run complete"
        );
        Ok(batch)
    }

    /// Attempts one article up to `max_retries` times.
    ///
    /// The first success wins. Otherwise the last attempt's failure is
    /// returned unchanged.
    ///
    /// # Errors
    ///
    /// Propagates [`ScraperError::InvalidSession`] without further attempts.
    pub async fn fetch_article<S>(
        &self,
        session: &mut S,
        article: ArticleId,
    ) -> Result<FetchOutcome, ScraperError>
    where
        S: BrowserSession,
        F: FetchOnce<S>,
    {
        let mut attempts = 0;
        self.attempt_article(session, article, &mut attempts).await
    }

    /// Retry loop behind [`Self::fetch_article`]; `attempts` counts the
    /// attempts that returned, across calls.
    async fn attempt_article<S>(
        &self,
        session: &mut S,
        article: ArticleId,
        attempts: &mut u32,
    ) -> Result<FetchOutcome, ScraperError>
    where
        S: BrowserSession,
        F: FetchOnce<S>,
    {
        let max_retries = self.policy.max_retries;
        let mut last = FetchOutcome::failure(
            FailureReason::MaxRetriesExceeded,
            "no fetch attempt was made",
        );

        for attempt in 1..=max_retries {
            let outcome = self.fetcher.fetch_once(session, article).await?;
            *attempts += 1;
            if outcome.is_success() {
                return Ok(outcome);
            }
            if attempt < max_retries {
                if let FetchOutcome::Failure { reason, detail } = &outcome {
                    tracing::warn!(
                        article = %article,
                        attempt,
                        max_retries,
                        delay_secs = self.policy.retry_delay.as_secs_f64(),
                        %reason,
                        detail = %detail,
                        "fetch attempt failed, retrying"
                    );
                }
                tokio::time::sleep(self.policy.retry_delay).await;
            }
            last = outcome;
        }

        if let FetchOutcome::Failure { reason, .. } = &last {
            tracing::error!(article = %article, max_retries, %reason, "all fetch attempts failed");
        }
        Ok(last)
    }
}

#[cfg(test)]
#[path = "pipeline_test.rs"]
mod tests;
