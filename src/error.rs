//! Error taxonomy for the symbol harvesting pipeline.
//!
//! Only [`BuilderError::Config`] terminates a run; every other variant is
//! recoverable at the per-kernel boundary in the pipeline. An archive member
//! that simply is not present is modelled as `Ok(None)` by the extractors,
//! never as an error.

/// Crate-wide error type.
#[derive(Debug, thiserror::Error)]
pub enum BuilderError {
    /// Unsupported distribution/branch combination or broken local setup.
    /// Raised before any network I/O; aborts the whole run.
    #[error("unsupported configuration: {0}")]
    Config(String),

    /// Network or HTTP failure during listing, validation, or download.
    #[error("fetch failed for {url}: {reason}")]
    Fetch {
        /// The URL that was requested.
        url: String,
        /// Human-readable description of the failure.
        reason: String,
    },

    /// A package archive could not be opened under the primary or the
    /// fallback container/compression scheme.
    #[error("unreadable package archive: {0}")]
    Format(String),

    /// The external symbol-table generator failed or produced output we
    /// could not use at all.
    #[error("symbol generator failed: {0}")]
    Generator(String),

    /// Local filesystem failure.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl BuilderError {
    /// Shorthand for a [`BuilderError::Fetch`] from any displayable cause.
    pub fn fetch(url: &str, reason: impl std::fmt::Display) -> Self {
        Self::Fetch {
            url: url.to_owned(),
            reason: reason.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, BuilderError>;
