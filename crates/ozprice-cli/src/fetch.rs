//! `ozprice fetch`: run one batch on a WebDriver session and print it.

use std::time::Duration;

use anyhow::Context;
use ozprice_core::AppConfig;
use ozprice_scraper::{
    ArticleFetcher, BrowserSession, RetryPolicy, RetryingPipeline, WebDriverSession,
};

#[derive(Debug, Default)]
pub(crate) struct FetchOptions {
    pub webdriver_url: Option<String>,
    pub session_id: Option<String>,
    pub pretty: bool,
}

pub(crate) async fn run_fetch(
    config: &AppConfig,
    articles: &[u64],
    options: &FetchOptions,
) -> anyhow::Result<()> {
    let driver_url = options
        .webdriver_url
        .as_deref()
        .unwrap_or(&config.webdriver_url);
    let request_timeout = Duration::from_secs(config.driver_request_timeout_secs);

    let mut session = match options.session_id.as_deref() {
        Some(id) => WebDriverSession::attach(driver_url, id, request_timeout)?,
        None => WebDriverSession::connect(
            driver_url,
            Duration::from_secs(config.page_load_timeout_secs),
            request_timeout,
        )
        .await
        .with_context(|| format!("failed to start a browser session on {driver_url}"))?,
    };

    let pipeline = RetryingPipeline::new(
        ArticleFetcher::from_app_config(config),
        RetryPolicy::from_app_config(config),
    );
    let result = pipeline.fetch_batch(&mut session, articles).await;

    // An attached session belongs to whoever started it.
    if options.session_id.is_none() {
        if let Err(e) = session.close().await {
            tracing::warn!(error = %e, "failed to close browser session");
        }
    }

    let batch = result?;
    let json = if options.pretty {
        serde_json::to_string_pretty(&batch)?
    } else {
        serde_json::to_string(&batch)?
    };
    println!("{json}");

    if batch.failed() > 0 {
        tracing::warn!(
            failed = batch.failed(),
            total = batch.total,
            "some articles could not be priced"
        );
    }
    Ok(())
}
