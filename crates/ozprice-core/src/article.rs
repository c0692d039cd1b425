//! Product identifiers.

use std::fmt;
use std::num::NonZeroU64;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::CoreError;

/// Numeric Ozon article (SKU) identifying one product.
///
/// Opaque: the only guarantee is that it is a positive integer. Whether the
/// product exists is only known once its page has been loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u64", into = "u64")]
pub struct ArticleId(NonZeroU64);

impl ArticleId {
    #[must_use]
    pub fn get(self) -> u64 {
        self.0.get()
    }
}

impl TryFrom<u64> for ArticleId {
    type Error = CoreError;

    fn try_from(value: u64) -> Result<Self, Self::Error> {
        NonZeroU64::new(value)
            .map(Self)
            .ok_or_else(|| CoreError::InvalidArticleId(value.to_string()))
    }
}

impl From<ArticleId> for u64 {
    fn from(id: ArticleId) -> Self {
        id.get()
    }
}

impl FromStr for ArticleId {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        trimmed
            .parse::<u64>()
            .map_err(|_| CoreError::InvalidArticleId(trimmed.to_owned()))
            .and_then(Self::try_from)
    }
}

impl fmt::Display for ArticleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
