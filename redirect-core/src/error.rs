//! Error taxonomy for the redirect flow.
//!
//! Copy failures are recovered locally and never escape the copy strategy.
//! Everything else bubbles up to the orchestrator boundary, which degrades
//! to a store redirect.

/// A single clipboard technique could not place text on the clipboard.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CopyError {
    #[error("clipboard unavailable: {0}")]
    Unavailable(String),
    #[error("clipboard write failed: {0}")]
    WriteFailed(String),
}

/// Faults raised while orchestrating a redirect.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RedirectError {
    #[error("environment unavailable: {0}")]
    Environment(String),
    #[error("navigation failed: {0}")]
    Navigation(String),
    #[error("app did not take over navigation before the deep-link timeout")]
    DeepLinkTimeout,
    #[error("unexpected redirect failure: {0}")]
    Unexpected(String),
}

/// Problems found while building configuration or link tables.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("duplicate deep-link entry for referral code `{0}`")]
    DuplicateReferral(String),
    #[error("invalid URL `{url}`: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
    #[error("invalid redirect policy: {0}")]
    InvalidPolicy(String),
}
