//! Anti-automation page detection.
//!
//! A coarse substring heuristic over the lower-cased document. False
//! positives (a slow normal page that mentions "blocked") are absorbed by the
//! retry loop rather than by precision here.

use crate::session::SessionError;

/// Interstitial, challenge and denial wording seen on block pages.
pub const DEFAULT_BLOCK_SIGNATURES: &[&str] = &[
    "cloudflare",
    "checking your browser",
    "enable javascript",
    "access denied",
    "blocked",
    "доступ ограничен",
];

#[derive(Debug, Clone)]
pub struct BlockDetector {
    signatures: Vec<String>,
}

impl Default for BlockDetector {
    fn default() -> Self {
        Self::new(DEFAULT_BLOCK_SIGNATURES.iter().copied())
    }
}

impl BlockDetector {
    /// Builds a detector from custom signatures (matched case-insensitively).
    pub fn new<I, S>(signatures: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            signatures: signatures
                .into_iter()
                .map(|s| s.as_ref().to_lowercase())
                .filter(|s| !s.is_empty())
                .collect(),
        }
    }

    /// First signature found in `document`, if any.
    #[must_use]
    pub fn matched_signature(&self, document: &str) -> Option<&str> {
        let lower = document.to_lowercase();
        self.signatures
            .iter()
            .find(|sig| lower.contains(sig.as_str()))
            .map(String::as_str)
    }

    #[must_use]
    pub fn is_blocked(&self, document: &str) -> bool {
        self.matched_signature(document).is_some()
    }

    /// Fail-closed variant: a document that could not be read counts as blocked.
    #[must_use]
    pub fn is_blocked_read(&self, read: &Result<String, SessionError>) -> bool {
        match read {
            Ok(document) => self.is_blocked(document),
            Err(_) => true,
        }
    }
}
