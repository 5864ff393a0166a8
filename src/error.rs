//! Error taxonomy for the discovery engine.
//!
//! Three taxa, matching the failure semantics the explorer is built around:
//! transient per-item errors are recovered locally and never surface as
//! `DiscoveryError`; recoverable-global and fatal errors are the only two
//! that the explorer itself returns.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("no entry points supplied")]
    NoEntryPoints,

    #[error("failed to acquire browser capability: {0}")]
    BrowserUnavailable(String),

    #[error("navigation to {url} failed: {source}")]
    Navigation {
        url: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("global timeout of {0}ms expired")]
    Timeout(u64),

    #[error("failed to persist graph to {path}: {source}")]
    Persist {
        path: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("unexpected failure: {0}")]
    Fatal(#[from] anyhow::Error),
}

impl DiscoveryError {
    /// Whether this error should degrade the crawl (recoverable) rather than
    /// abort it. Only [`DiscoveryError::NoEntryPoints`] and
    /// [`DiscoveryError::BrowserUnavailable`] are fatal at setup time; a
    /// mid-crawl [`DiscoveryError::Timeout`] is recoverable — the partial
    /// graph is still persisted and returned with `status: partial`.
    pub fn is_fatal_setup(&self) -> bool {
        matches!(
            self,
            DiscoveryError::NoEntryPoints | DiscoveryError::BrowserUnavailable(_)
        )
    }
}
