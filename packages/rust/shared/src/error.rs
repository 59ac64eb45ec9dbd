//! Error types for the article enricher.
//!
//! Library crates use [`EnricherError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.
//!
//! Recoverable stage failures are not errors: they are reported as
//! [`crate::Degradation`] values and the pipeline carries on with a fallback.

use std::path::PathBuf;

/// Top-level error type for all enricher operations.
#[derive(Debug, thiserror::Error)]
pub enum EnricherError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Transport failure or non-success HTTP status.
    #[error("network error: {0}")]
    Network(String),

    /// HTML, JSON or URL parsing error.
    #[error("parse error: {message}")]
    Parse { message: String },

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Generative text provider failure (quota, network, malformed response).
    #[error("provider error: {0}")]
    Provider(String),

    /// No article could be fetched from the storage service. Aborts the run.
    #[error("source unavailable: {0}")]
    SourceUnavailable(String),

    /// The rewritten article could not be stored. Ends the run unsuccessfully.
    #[error("publish failed: {0}")]
    PublishFailed(String),
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, EnricherError>;

impl EnricherError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a parse error from any displayable message.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse {
            message: msg.into(),
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Whether this error ends the run (as opposed to a stage-local failure).
    pub fn is_run_failure(&self) -> bool {
        matches!(self, Self::SourceUnavailable(_) | Self::PublishFailed(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_formatting() {
        let err = EnricherError::config("missing api_url");
        assert_eq!(err.to_string(), "config error: missing api_url");

        let err = EnricherError::SourceUnavailable("storage returned no articles".into());
        assert!(err.to_string().contains("no articles"));
    }

    #[test]
    fn run_failures_are_flagged() {
        assert!(EnricherError::SourceUnavailable("x".into()).is_run_failure());
        assert!(EnricherError::PublishFailed("x".into()).is_run_failure());
        assert!(!EnricherError::Provider("quota".into()).is_run_failure());
        assert!(!EnricherError::Network("timeout".into()).is_run_failure());
    }
}
