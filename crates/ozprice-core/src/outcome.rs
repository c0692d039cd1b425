//! Per-article outcomes and batch aggregation.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};
use uuid::Uuid;

use crate::{ArticleId, PriceRecord};

/// Why a single article could not be priced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureReason {
    /// The browser could not load the target URL (network error or timeout).
    NavigationFailed,
    /// An anti-automation page was served instead of the product.
    Blocked,
    /// No payload carrying `widgetStates` appeared before the deadline.
    PayloadTimeout,
    /// A payload arrived but did not contain a usable price widget.
    PayloadUndecodable,
    /// No attempt ran, so no more specific reason exists.
    MaxRetriesExceeded,
    /// Unexpected fault inside an attempt (e.g. a malformed driver reply).
    InternalError,
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FailureReason::NavigationFailed => "navigation failed",
            FailureReason::Blocked => "blocked by anti-bot protection",
            FailureReason::PayloadTimeout => "timed out waiting for payload",
            FailureReason::PayloadUndecodable => "payload could not be decoded",
            FailureReason::MaxRetriesExceeded => "max retries exceeded",
            FailureReason::InternalError => "internal error",
        };
        f.write_str(s)
    }
}

/// Result of fetching one article: exactly one of success or failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    Success(PriceRecord),
    Failure {
        reason: FailureReason,
        detail: String,
    },
}

impl FetchOutcome {
    pub fn failure(reason: FailureReason, detail: impl Into<String>) -> Self {
        FetchOutcome::Failure {
            reason,
            detail: detail.into(),
        }
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, FetchOutcome::Success(_))
    }

    #[must_use]
    pub fn failure_reason(&self) -> Option<FailureReason> {
        match self {
            FetchOutcome::Success(_) => None,
            FetchOutcome::Failure { reason, .. } => Some(*reason),
        }
    }
}

/// Outcome for one article of a batch.
///
/// Serializes in the flat `{article, success, price_info, error, reason}`
/// shape consumed by API clients.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArticleResult {
    pub article: ArticleId,
    pub outcome: FetchOutcome,
}

impl Serialize for ArticleResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("ArticleResult", 5)?;
        state.serialize_field("article", &self.article)?;
        match &self.outcome {
            FetchOutcome::Success(record) => {
                state.serialize_field("success", &true)?;
                state.serialize_field("price_info", record)?;
                state.serialize_field("error", &None::<String>)?;
                state.serialize_field("reason", &None::<FailureReason>)?;
            }
            FetchOutcome::Failure { reason, detail } => {
                state.serialize_field("success", &false)?;
                state.serialize_field("price_info", &None::<PriceRecord>)?;
                let error = if detail.is_empty() {
                    reason.to_string()
                } else {
                    format!("{reason}: {detail}")
                };
                state.serialize_field("error", &error)?;
                state.serialize_field("reason", reason)?;
            }
        }
        state.end()
    }
}

/// Ordered outcomes for a whole batch, one per input article.
#[derive(Debug, Clone, Serialize)]
pub struct BatchResult {
    pub run_id: Uuid,
    pub completed_at: DateTime<Utc>,
    pub total: usize,
    pub succeeded: usize,
    pub results: Vec<ArticleResult>,
}

impl BatchResult {
    /// Aggregates `results` (kept in the given order) and stamps the run.
    #[must_use]
    pub fn new(run_id: Uuid, results: Vec<ArticleResult>) -> Self {
        let succeeded = results.iter().filter(|r| r.outcome.is_success()).count();
        Self {
            run_id,
            completed_at: Utc::now(),
            total: results.len(),
            succeeded,
            results,
        }
    }

    #[must_use]
    pub fn failed(&self) -> usize {
        self.total - self.succeeded
    }
}
