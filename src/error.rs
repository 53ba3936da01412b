//! Error types for raiplay-dl
//!
//! The taxonomy follows the three places a run can go wrong:
//! - [`CatalogError`] - the episode list could not be retrieved or understood
//! - [`FetchError`] - a single episode download failed
//! - [`ConfigError`] - user-supplied settings or request values are invalid
//!
//! [`FetchError`] never escapes a batch: the orchestrator converts it into a failed
//! [`TaskResult`](crate::types::TaskResult). [`CatalogError`] aborts a batch before any
//! task is scheduled and is surfaced as the report's condition.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for raiplay-dl operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for raiplay-dl
#[derive(Debug, Error)]
pub enum Error {
    /// Episode catalog error
    #[error("catalog error: {0}")]
    Catalog(#[from] CatalogError),

    /// Media fetch error
    #[error("fetch error: {0}")]
    Fetch(#[from] FetchError),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Errors raised while turning a show URL into an episode list
#[derive(Debug, Error)]
pub enum CatalogError {
    /// HTTP request failed or returned a non-success status
    #[error("request to {url} failed: {reason}")]
    Http {
        /// The URL that was requested
        url: String,
        /// Transport error or status description
        reason: String,
    },

    /// The show page does not carry the episode index element
    #[error("could not find rai-episodes element (missing {missing}), the page structure might have changed")]
    MissingEpisodeIndex {
        /// Element or attribute that was expected
        missing: String,
    },

    /// The requested season does not exist for this show
    #[error("season index {requested} out of range ({available} seasons available)")]
    SeasonOutOfRange {
        /// Zero-based season index that was requested
        requested: usize,
        /// Number of seasons the catalog returned
        available: usize,
    },

    /// The episode JSON did not have the expected structure
    #[error("unexpected episode data shape: {0}")]
    UnexpectedShape(String),

    /// A URL could not be parsed or joined
    #[error("invalid URL {url}: {reason}")]
    InvalidUrl {
        /// The offending URL
        url: String,
        /// Parser message
        reason: String,
    },
}

/// Errors raised while downloading a single asset
#[derive(Debug, Error)]
pub enum FetchError {
    /// The external download tool could not be located
    #[error("download tool unavailable: {0}")]
    ToolUnavailable(String),

    /// The external download tool could not be started
    #[error("failed to start {tool}: {reason}")]
    Spawn {
        /// Tool binary that was executed
        tool: PathBuf,
        /// OS error message
        reason: String,
    },

    /// The external download tool exited unsuccessfully
    #[error("{tool} exited with {status}: {stderr}")]
    ExitStatus {
        /// Tool name
        tool: String,
        /// Exit status description (code or signal)
        status: String,
        /// Trailing stderr output, trimmed
        stderr: String,
    },

    /// I/O error while preparing the destination or reading tool output
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The download task panicked or was aborted
    #[error("download task aborted: {0}")]
    Panicked(String),

    /// Any other adapter failure
    #[error("{0}")]
    Other(String),
}

/// Invalid configuration or user-supplied request values
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A configuration value is out of range
    #[error("invalid value for {key}: {message}")]
    InvalidValue {
        /// The configuration key (e.g., "max_concurrent_downloads")
        key: String,
        /// Human-readable explanation
        message: String,
    },

    /// A user-supplied URL could not be parsed
    #[error("invalid URL {url}: {reason}")]
    InvalidUrl {
        /// The offending input
        url: String,
        /// Parser message
        reason: String,
    },

    /// Season numbers are 1-based
    #[error("invalid season number {0}: seasons start at 1")]
    InvalidSeason(usize),

    /// Configuration file could not be read or parsed
    #[error("failed to load configuration from {path}: {reason}")]
    Load {
        /// Path of the configuration file
        path: PathBuf,
        /// Read or parse error
        reason: String,
    },
}

impl CatalogError {
    pub(crate) fn http(url: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        Self::Http {
            url: url.into(),
            reason: reason.to_string(),
        }
    }
}

impl ConfigError {
    pub(crate) fn invalid(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidValue {
            key: key.into(),
            message: message.into(),
        }
    }
}
