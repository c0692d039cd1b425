//! End-to-end runs of the retrying pipeline over a simulated browser.
//!
//! The simulated session renders its payload some time after navigation,
//! driven by tokio's paused clock so the tests run instantly.

use std::time::Duration;

use tokio::time::Instant;

use ozprice_core::{FailureReason, FetchOutcome, PriceRecord, UrlForm};
use ozprice_scraper::{
    ArticleFetcher, BrowserSession, OzonUrlBuilder, PayloadAwaiter, RetryPolicy,
    RetryingPipeline, ScraperError, SessionError,
};

const RENDERED: &str = r#"<html><body><pre>{"widgetStates":{"webPrice-77":"{\"price\":\"12 990 ₽\",\"cardPrice\":\"11 490 ₽\"}"}}</pre></body></html>"#;
const SHELL: &str = "<html><body><div id=\"app\"></div></body></html>";

/// Browser that shows `SHELL` until `render_after` has passed since the last
/// navigation, then `rendered`.
struct SimulatedBrowser {
    render_after: Duration,
    rendered: String,
    navigated_at: Option<Instant>,
    visits: Vec<String>,
    closed: bool,
}

impl SimulatedBrowser {
    fn new(render_after: Duration, rendered: &str) -> Self {
        Self {
            render_after,
            rendered: rendered.to_owned(),
            navigated_at: None,
            visits: Vec::new(),
            closed: false,
        }
    }

    fn check_open(&self) -> Result<(), SessionError> {
        if self.closed {
            Err(SessionError::InvalidSession("closed".to_owned()))
        } else {
            Ok(())
        }
    }
}

impl BrowserSession for SimulatedBrowser {
    async fn navigate(&mut self, url: &str) -> Result<(), SessionError> {
        self.check_open()?;
        self.visits.push(url.to_owned());
        self.navigated_at = Some(Instant::now());
        Ok(())
    }

    async fn current_document_text(&mut self) -> Result<String, SessionError> {
        self.check_open()?;
        let rendered = self
            .navigated_at
            .is_some_and(|at| at.elapsed() >= self.render_after);
        Ok(if rendered {
            self.rendered.clone()
        } else {
            SHELL.to_owned()
        })
    }

    async fn is_document_ready(&mut self) -> Result<bool, SessionError> {
        self.check_open()?;
        Ok(self.navigated_at.is_some())
    }

    async fn current_url(&mut self) -> Result<String, SessionError> {
        self.check_open()?;
        Ok(self.visits.last().cloned().unwrap_or_default())
    }

    async fn close(&mut self) -> Result<(), SessionError> {
        self.closed = true;
        Ok(())
    }
}

fn pipeline(payload_timeout: Duration) -> RetryingPipeline<ArticleFetcher> {
    let urls = OzonUrlBuilder::new("https://www.ozon.ru", UrlForm::ComposerApi);
    let fetcher = ArticleFetcher::new(urls)
        .with_awaiter(PayloadAwaiter::new(
            Duration::from_secs(10),
            Duration::from_millis(500),
        ))
        .with_payload_timeout(payload_timeout)
        .with_post_navigation_delay(Duration::ZERO);
    RetryingPipeline::new(fetcher, RetryPolicy::default())
}

#[tokio::test(start_paused = true)]
async fn fetches_price_rendered_after_one_second() {
    let mut browser = SimulatedBrowser::new(Duration::from_secs(1), RENDERED);

    let batch = pipeline(Duration::from_secs(30))
        .fetch_batch(&mut browser, &[1_774_818_716])
        .await
        .expect("batch should run");

    assert_eq!(batch.total, 1);
    assert_eq!(batch.succeeded, 1);
    assert_eq!(batch.results[0].article.get(), 1_774_818_716);
    assert_eq!(
        batch.results[0].outcome,
        FetchOutcome::Success(PriceRecord::available(Some(11_490), Some(12_990), None))
    );
    assert_eq!(
        browser.visits,
        vec!["https://www.ozon.ru/api/composer-api.bx/page/json/v2?url=/product/1774818716/"]
    );
}

#[tokio::test(start_paused = true)]
async fn payload_that_never_renders_times_out_after_three_attempts() {
    let mut browser = SimulatedBrowser::new(Duration::from_secs(3600), RENDERED);

    let started = Instant::now();
    let batch = pipeline(Duration::from_secs(5))
        .fetch_batch(&mut browser, &[42])
        .await
        .unwrap();

    assert_eq!(
        batch.results[0].outcome.failure_reason(),
        Some(FailureReason::PayloadTimeout)
    );
    assert_eq!(browser.visits.len(), 3);
    // Three 5 s waits, two 2 s retry pauses, one 1 s inter-article pause.
    assert_eq!(started.elapsed(), Duration::from_secs(20));
}

#[tokio::test(start_paused = true)]
async fn blocked_page_reports_blocked() {
    let mut browser = SimulatedBrowser::new(
        Duration::ZERO,
        "<html><title>Доступ ограничен</title></html>",
    );

    let batch = pipeline(Duration::from_secs(5))
        .fetch_batch(&mut browser, &[42, 43])
        .await
        .unwrap();

    assert_eq!(batch.succeeded, 0);
    for result in &batch.results {
        assert_eq!(result.outcome.failure_reason(), Some(FailureReason::Blocked));
    }
    assert_eq!(browser.visits.len(), 6);
}

#[tokio::test(start_paused = true)]
async fn closed_browser_aborts_batch() {
    let mut browser = SimulatedBrowser::new(Duration::ZERO, RENDERED);
    browser.close().await.unwrap();

    let result = pipeline(Duration::from_secs(5))
        .fetch_batch(&mut browser, &[42])
        .await;

    assert!(matches!(result, Err(ScraperError::InvalidSession(_))));
}

#[test]
fn batch_serializes_in_flat_result_shape() {
    let batch = ozprice_core::BatchResult::new(
        uuid::Uuid::nil(),
        vec![ozprice_core::ArticleResult {
            article: ozprice_core::ArticleId::try_from(7).unwrap(),
            outcome: FetchOutcome::failure(FailureReason::Blocked, "cloudflare"),
        }],
    );
    let json = serde_json::to_value(&batch).unwrap();
    assert_eq!(json["results"][0]["article"], 7);
    assert_eq!(json["results"][0]["success"], false);
    assert_eq!(json["results"][0]["error"], "blocked by anti-bot protection: cloudflare");
}
