//! Error types for the download module.
//!
//! Every variant carries the URL or path it concerns so a batch summary can
//! say which file failed and why without extra bookkeeping.

use std::path::PathBuf;

use thiserror::Error;

use super::path::PathError;

/// Errors that can occur while fetching a single file.
///
/// These never abort a batch; the orchestrator records them as the failed
/// request's outcome.
#[derive(Debug, Error)]
pub enum DownloadError {
    /// Network-level error (DNS resolution, connection refused, TLS errors, etc.)
    #[error("network error downloading {url}: {source}")]
    Network {
        /// The URL that failed to download.
        url: String,
        /// The underlying network error.
        #[source]
        source: reqwest::Error,
    },

    /// The transport gave up waiting on connect or read.
    #[error("timeout downloading {url}")]
    Timeout {
        /// The URL that timed out.
        url: String,
    },

    /// HTTP error response (4xx client errors, 5xx server errors).
    #[error("received error response: HTTP {status} downloading {url}")]
    HttpStatus {
        /// The URL that returned an error status.
        url: String,
        /// The HTTP status code.
        status: u16,
    },

    /// File system error while creating directories or writing the file.
    #[error("IO error writing to {path}: {source}")]
    Io {
        /// The file path where the error occurred.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The provided URL is malformed or invalid.
    #[error("invalid URL: {url}")]
    InvalidUrl {
        /// The invalid URL string.
        url: String,
    },

    /// The URL cannot be mapped to a path inside the target root.
    #[error("cannot resolve target path for {url}: {source}")]
    InvalidTarget {
        /// The URL whose path was rejected.
        url: String,
        /// Why the path was rejected.
        #[source]
        source: PathError,
    },

    /// Another request of the same batch already writes to this path.
    #[error("{url} resolves to {path}, which another request already targets")]
    DuplicateTarget {
        /// The URL that lost the claim.
        url: String,
        /// The contested local path.
        path: PathBuf,
    },

    /// The download task ended without reporting (panic).
    #[error("download task for {url} terminated unexpectedly")]
    TaskAborted {
        /// The URL whose task died.
        url: String,
    },
}

/// Coarse classification of a failure, used for batch summaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// The server answered with a 4xx/5xx status.
    HttpStatus,
    /// Connection, read, write or timeout failure.
    Transport,
    /// The URL could not be mapped to a local file.
    InvalidTarget,
    /// The task running the download died.
    Aborted,
}

impl DownloadError {
    /// Creates a network error from a reqwest error.
    ///
    /// reqwest timeouts are reported as [`DownloadError::Timeout`].
    pub fn network(url: impl Into<String>, source: reqwest::Error) -> Self {
        if source.is_timeout() {
            return Self::timeout(url);
        }
        Self::Network {
            url: url.into(),
            source,
        }
    }

    /// Creates an HTTP status error.
    pub fn http_status(url: impl Into<String>, status: u16) -> Self {
        Self::HttpStatus {
            url: url.into(),
            status,
        }
    }

    /// Creates a timeout error.
    pub fn timeout(url: impl Into<String>) -> Self {
        Self::Timeout { url: url.into() }
    }

    /// Creates an IO error.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Creates an invalid URL error.
    pub fn invalid_url(url: impl Into<String>) -> Self {
        Self::InvalidUrl { url: url.into() }
    }

    /// Creates an invalid target error.
    pub fn invalid_target(url: impl Into<String>, source: PathError) -> Self {
        Self::InvalidTarget {
            url: url.into(),
            source,
        }
    }

    /// Creates a duplicate-target error.
    pub fn duplicate_target(url: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self::DuplicateTarget {
            url: url.into(),
            path: path.into(),
        }
    }

    /// Creates a task-aborted error.
    pub fn task_aborted(url: impl Into<String>) -> Self {
        Self::TaskAborted { url: url.into() }
    }

    /// Classifies this error for summaries.
    #[must_use]
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::HttpStatus { .. } => FailureKind::HttpStatus,
            Self::Network { .. } | Self::Timeout { .. } | Self::Io { .. } => {
                FailureKind::Transport
            }
            Self::InvalidUrl { .. } | Self::InvalidTarget { .. } | Self::DuplicateTarget { .. } => {
                FailureKind::InvalidTarget
            }
            Self::TaskAborted { .. } => FailureKind::Aborted,
        }
    }
}

// No From<reqwest::Error> / From<std::io::Error>: every variant needs the url
// or path, which the source errors don't carry. Use the constructors above.
