use thiserror::Error;

use crate::session::SessionError;

/// Hard failures of the fetch pipeline.
///
/// Per-attempt problems (navigation, blocks, timeouts, undecodable payloads)
/// are never errors; they are reported as [`ozprice_core::FetchOutcome`]
/// values. Only contract violations by the caller surface here.
#[derive(Debug, Error)]
pub enum ScraperError {
    #[error("browser session is no longer valid: {0}")]
    InvalidSession(#[source] SessionError),

    #[error("article batch is empty")]
    EmptyBatch,

    #[error("article batch has {count} ids, the limit is {max}")]
    BatchTooLarge { count: usize, max: usize },

    #[error(transparent)]
    InvalidArticle(#[from] ozprice_core::CoreError),
}
