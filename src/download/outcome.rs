//! Requests, targets and results of a download batch.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::auth::{AuthError, Credentials};
use super::error::{DownloadError, FailureKind};
use super::path::{self, PathError};

/// One remote file to fetch, with its resolved Authorization header.
///
/// The header is computed when the request is built, so conflicting
/// credentials are rejected before anything is sent.
#[derive(Clone, PartialEq, Eq)]
pub struct DownloadRequest {
    url: String,
    authorization: Option<String>,
}

impl DownloadRequest {
    /// Builds a request, resolving `credentials` into a header value.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::ConfigConflict`] when the credentials carry both a
    /// password and a preset authorization header.
    pub fn new(url: impl Into<String>, credentials: Option<&Credentials>) -> Result<Self, AuthError> {
        let authorization = match credentials {
            Some(credentials) => credentials.authorization_header()?,
            None => None,
        };
        Ok(Self {
            url: url.into(),
            authorization,
        })
    }

    /// Builds a request that is sent without an Authorization header.
    #[must_use]
    pub fn unauthenticated(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            authorization: None,
        }
    }

    /// The remote URL.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// The Authorization header value, if any.
    #[must_use]
    pub fn authorization(&self) -> Option<&str> {
        self.authorization.as_deref()
    }
}

impl fmt::Debug for DownloadRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DownloadRequest")
            .field("url", &self.url)
            .field(
                "authorization",
                &self.authorization.as_ref().map(|_| "<redacted>"),
            )
            .finish()
    }
}

/// Where a request's body is written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadTarget {
    local_path: PathBuf,
}

impl DownloadTarget {
    /// Resolves the target for `url` under `root`, see [`path::resolve`].
    ///
    /// # Errors
    ///
    /// Returns the [`PathError`] from path resolution.
    pub fn resolve(url: &str, prefix_marker: &str, root: &Path) -> Result<Self, PathError> {
        path::resolve(url, prefix_marker, root).map(|local_path| Self { local_path })
    }

    /// Wraps an already resolved path.
    #[must_use]
    pub fn new(local_path: impl Into<PathBuf>) -> Self {
        Self {
            local_path: local_path.into(),
        }
    }

    /// The local file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.local_path
    }
}

/// Result of one request. Exactly one per request that finished in time.
#[derive(Debug)]
pub enum DownloadOutcome {
    /// The body was fully written to `path`.
    Success {
        /// The remote URL.
        url: String,
        /// Where the body was written.
        path: PathBuf,
        /// Bytes written.
        bytes: u64,
    },
    /// The request failed; siblings are unaffected.
    Failure {
        /// The remote URL.
        url: String,
        /// What went wrong.
        error: DownloadError,
    },
}

impl DownloadOutcome {
    /// The remote URL this outcome belongs to.
    #[must_use]
    pub fn url(&self) -> &str {
        match self {
            Self::Success { url, .. } | Self::Failure { url, .. } => url,
        }
    }

    /// Returns true for [`DownloadOutcome::Success`].
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    /// The failure, if this outcome is one.
    #[must_use]
    pub fn error(&self) -> Option<&DownloadError> {
        match self {
            Self::Success { .. } => None,
            Self::Failure { error, .. } => Some(error),
        }
    }
}

/// Terminal state of a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchStatus {
    /// Every request succeeded before the deadline.
    AllSucceeded,
    /// Every request finished before the deadline, at least one failed.
    OneOrMoreFailed,
    /// The deadline passed with requests still in flight.
    TimedOut,
}

impl BatchStatus {
    /// Stable label for logs.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::AllSucceeded => "all_succeeded",
            Self::OneOrMoreFailed => "one_or_more_failed",
            Self::TimedOut => "timed_out",
        }
    }
}

impl fmt::Display for BatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Aggregated result of one orchestrator run. Frozen once returned.
#[derive(Debug)]
pub struct BatchResult {
    status: BatchStatus,
    outcomes: Vec<DownloadOutcome>,
    pending: Vec<String>,
    elapsed: Duration,
}

impl BatchResult {
    /// Builds a result that finished before the deadline.
    ///
    /// The status is derived from the outcomes.
    #[must_use]
    pub fn completed(outcomes: Vec<DownloadOutcome>, elapsed: Duration) -> Self {
        let status = if outcomes.iter().all(DownloadOutcome::is_success) {
            BatchStatus::AllSucceeded
        } else {
            BatchStatus::OneOrMoreFailed
        };
        Self {
            status,
            outcomes,
            pending: Vec::new(),
            elapsed,
        }
    }

    /// Builds a result for a batch cut short by the deadline.
    #[must_use]
    pub fn timed_out(outcomes: Vec<DownloadOutcome>, pending: Vec<String>, elapsed: Duration) -> Self {
        Self {
            status: BatchStatus::TimedOut,
            outcomes,
            pending,
            elapsed,
        }
    }

    /// The terminal status.
    #[must_use]
    pub fn status(&self) -> BatchStatus {
        self.status
    }

    /// Returns true when the status is [`BatchStatus::AllSucceeded`].
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status == BatchStatus::AllSucceeded
    }

    /// Outcomes observed before return, in request order.
    #[must_use]
    pub fn outcomes(&self) -> &[DownloadOutcome] {
        &self.outcomes
    }

    /// URLs still in flight when the deadline passed, in request order.
    #[must_use]
    pub fn pending(&self) -> &[String] {
        &self.pending
    }

    /// Wall-clock time the batch took.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// Number of successful outcomes.
    #[must_use]
    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_success()).count()
    }

    /// Iterates over failed outcomes as `(url, error)`.
    pub fn failures(&self) -> impl Iterator<Item = (&str, &DownloadError)> {
        self.outcomes.iter().filter_map(|outcome| match outcome {
            DownloadOutcome::Failure { url, error } => Some((url.as_str(), error)),
            DownloadOutcome::Success { .. } => None,
        })
    }

    /// Number of failed outcomes.
    #[must_use]
    pub fn failed(&self) -> usize {
        self.failures().count()
    }

    /// Number of failures of the given kind.
    #[must_use]
    pub fn failed_with(&self, kind: FailureKind) -> usize {
        self.failures().filter(|(_, e)| e.kind() == kind).count()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn success(url: &str) -> DownloadOutcome {
        DownloadOutcome::Success {
            url: url.to_string(),
            path: PathBuf::from("/out").join(url),
            bytes: 1,
        }
    }

    fn failure(url: &str, status: u16) -> DownloadOutcome {
        DownloadOutcome::Failure {
            url: url.to_string(),
            error: DownloadError::http_status(url, status),
        }
    }

    #[test]
    fn test_request_with_conflicting_credentials_fails() {
        let creds = Credentials {
            authorization: Some("Bearer t".to_string()),
            ..Credentials::basic("u", "p")
        };
        let result = DownloadRequest::new("https://h/a", Some(&creds));
        assert_eq!(result, Err(AuthError::ConfigConflict));
    }

    #[test]
    fn test_request_resolves_header_once() {
        let request =
            DownloadRequest::new("https://h/a", Some(&Credentials::preset("Bearer t"))).unwrap();
        assert_eq!(request.url(), "https://h/a");
        assert_eq!(request.authorization(), Some("Bearer t"));
        assert_eq!(DownloadRequest::unauthenticated("https://h/a").authorization(), None);
    }

    #[test]
    fn test_request_debug_hides_authorization() {
        let request =
            DownloadRequest::new("https://h/a", Some(&Credentials::basic("u", "p"))).unwrap();
        let debug = format!("{request:?}");
        assert!(debug.contains("https://h/a"));
        assert!(!debug.contains("Basic"), "header leaked: {debug}");
    }

    #[test]
    fn test_completed_batch_all_success() {
        let result = BatchResult::completed(vec![success("a"), success("b")], Duration::ZERO);
        assert_eq!(result.status(), BatchStatus::AllSucceeded);
        assert!(result.is_success());
        assert_eq!(result.succeeded(), 2);
        assert_eq!(result.failed(), 0);
        assert!(result.pending().is_empty());
    }

    #[test]
    fn test_completed_batch_with_failure() {
        let result = BatchResult::completed(vec![success("a"), failure("b", 500)], Duration::ZERO);
        assert_eq!(result.status(), BatchStatus::OneOrMoreFailed);
        assert!(!result.is_success());
        let failures: Vec<_> = result.failures().collect();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].0, "b");
        assert_eq!(result.failed_with(FailureKind::HttpStatus), 1);
    }

    #[test]
    fn test_empty_batch_is_success() {
        let result = BatchResult::completed(Vec::new(), Duration::ZERO);
        assert_eq!(result.status(), BatchStatus::AllSucceeded);
    }

    #[test]
    fn test_timed_out_batch_keeps_pending() {
        let result = BatchResult::timed_out(
            vec![success("a")],
            vec!["b".to_string()],
            Duration::from_millis(10),
        );
        assert_eq!(result.status(), BatchStatus::TimedOut);
        assert_eq!(result.pending(), ["b".to_string()]);
        assert_eq!(result.outcomes().len(), 1);
        assert_eq!(result.status().to_string(), "timed_out");
    }
}
