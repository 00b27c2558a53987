//! Concurrent batch orchestration under a single deadline.
//!
//! The orchestrator spawns one tokio task per request, then drains the
//! [`JoinSet`] until every task reported or the batch deadline passes. There
//! is no concurrency cap: batches are small and bounded by configuration.
//!
//! # Concurrency Model
//!
//! - Targets are resolved before dispatch; a bad or duplicate path fails that
//!   request without spawning anything
//! - Each remaining request runs in its own task with a clone of the client
//! - Outcomes are stored by request index, so completion order is irrelevant
//! - At the deadline the remaining tasks are aborted; their outcomes are
//!   never reported

use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::path::{Path, PathBuf};
use std::time::Duration;

use futures_util::FutureExt;
use tokio::task::JoinSet;
use tokio::time::Instant;
use tracing::{debug, info, instrument, warn};

use super::auth::{AuthError, Credentials};
use super::client::HttpClient;
use super::constants::DEFAULT_BATCH_TIMEOUT;
use super::error::DownloadError;
use super::outcome::{BatchResult, DownloadOutcome, DownloadRequest, DownloadTarget};

/// Builds one request per URL with the shared credentials.
///
/// This is where a credential conflict stops the batch, before anything is
/// dispatched.
///
/// # Errors
///
/// Returns [`AuthError::ConfigConflict`] when the credentials carry both a
/// password and a preset authorization header.
pub fn requests_from_urls(
    urls: &[String],
    credentials: Option<&Credentials>,
) -> Result<Vec<DownloadRequest>, AuthError> {
    urls.iter()
        .map(|url| DownloadRequest::new(url.clone(), credentials))
        .collect()
}

/// Where and how long a batch runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchSettings {
    target_root: PathBuf,
    prefix_marker: String,
    timeout: Duration,
}

impl Default for BatchSettings {
    fn default() -> Self {
        Self::new(".", DEFAULT_BATCH_TIMEOUT)
    }
}

impl BatchSettings {
    /// Settings with no prefix marker (URL paths are used as-is).
    #[must_use]
    pub fn new(target_root: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            target_root: target_root.into(),
            prefix_marker: String::new(),
            timeout,
        }
    }

    /// Sets the marker after which a URL's relative path starts.
    #[must_use]
    pub fn with_prefix_marker(mut self, prefix_marker: impl Into<String>) -> Self {
        self.prefix_marker = prefix_marker.into();
        self
    }

    /// Root directory all files are written under.
    #[must_use]
    pub fn target_root(&self) -> &Path {
        &self.target_root
    }

    /// Marker after which a URL's relative path starts.
    #[must_use]
    pub fn prefix_marker(&self) -> &str {
        &self.prefix_marker
    }

    /// Deadline for the whole batch.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

/// Fans requests out to concurrent fetches and aggregates the outcomes.
#[derive(Debug, Clone)]
pub struct DownloadOrchestrator {
    client: HttpClient,
    settings: BatchSettings,
}

impl DownloadOrchestrator {
    /// Creates an orchestrator that fetches with `client`.
    #[must_use]
    pub fn new(client: HttpClient, settings: BatchSettings) -> Self {
        Self { client, settings }
    }

    /// The settings this orchestrator runs with.
    #[must_use]
    pub fn settings(&self) -> &BatchSettings {
        &self.settings
    }

    /// Runs one batch and returns its aggregated result.
    ///
    /// Waits for every request or until the configured timeout elapses,
    /// whichever comes first. Individual failures never abort the batch; they
    /// show up as [`DownloadOutcome::Failure`] entries. If the deadline passes
    /// first, the result is [`super::BatchStatus::TimedOut`], the still
    /// running tasks are aborted and their URLs are listed as pending.
    #[instrument(
        skip(self, requests),
        fields(
            requests = requests.len(),
            target_root = %self.settings.target_root.display(),
            timeout_ms = self.settings.timeout.as_millis(),
        )
    )]
    pub async fn run_batch(&self, requests: Vec<DownloadRequest>) -> BatchResult {
        let started = Instant::now();
        let deadline = started + self.settings.timeout;

        let urls: Vec<String> = requests.iter().map(|r| r.url().to_string()).collect();
        let mut slots: Vec<Option<DownloadOutcome>> = urls.iter().map(|_| None).collect();
        let mut claimed: HashMap<PathBuf, usize> = HashMap::new();
        let mut tasks = JoinSet::new();

        info!(urls = ?urls, "download batch started");

        for (index, request) in requests.into_iter().enumerate() {
            let target = match self.claim_target(&request, &mut claimed, index) {
                Ok(target) => target,
                Err(error) => {
                    warn!(url = %request.url(), error = %error, "skipping request");
                    slots[index] = Some(DownloadOutcome::Failure {
                        url: request.url().to_string(),
                        error,
                    });
                    continue;
                }
            };

            let client = self.client.clone();
            tasks.spawn(async move {
                info!(url = %request.url(), path = %target.path().display(), "downloading file");
                let outcome = AssertUnwindSafe(client.fetch(&request, &target))
                    .catch_unwind()
                    .await
                    .unwrap_or_else(|_| DownloadOutcome::Failure {
                        url: request.url().to_string(),
                        error: DownloadError::task_aborted(request.url()),
                    });
                (index, outcome)
            });
        }

        debug!(task_count = tasks.len(), "waiting for downloads to complete");

        loop {
            match tokio::time::timeout_at(deadline, tasks.join_next()).await {
                Ok(Some(Ok((index, outcome)))) => slots[index] = Some(outcome),
                Ok(Some(Err(join_error))) => {
                    // Only cancellation lands here; panics are caught inside the task.
                    warn!(error = %join_error, "download task ended without an outcome");
                }
                Ok(None) => break,
                Err(_) => {
                    tasks.abort_all();
                    return timed_out(slots, urls, started.elapsed());
                }
            }
        }

        let outcomes: Vec<DownloadOutcome> = slots
            .into_iter()
            .zip(urls)
            .map(|(slot, url)| {
                slot.unwrap_or_else(|| DownloadOutcome::Failure {
                    error: DownloadError::task_aborted(&url),
                    url,
                })
            })
            .collect();

        let result = BatchResult::completed(outcomes, started.elapsed());
        info!(
            status = %result.status(),
            succeeded = result.succeeded(),
            failed = result.failed(),
            elapsed_ms = result.elapsed().as_millis(),
            "download batch finished"
        );
        result
    }

    /// Resolves the request's target and reserves its path for this batch.
    fn claim_target(
        &self,
        request: &DownloadRequest,
        claimed: &mut HashMap<PathBuf, usize>,
        index: usize,
    ) -> Result<DownloadTarget, DownloadError> {
        let target = DownloadTarget::resolve(
            request.url(),
            &self.settings.prefix_marker,
            &self.settings.target_root,
        )
        .map_err(|e| DownloadError::invalid_target(request.url(), e))?;

        if let Some(&first) = claimed.get(target.path()) {
            debug!(first_index = first, index, "target path already claimed");
            return Err(DownloadError::duplicate_target(
                request.url(),
                target.path().to_path_buf(),
            ));
        }
        claimed.insert(target.path().to_path_buf(), index);
        Ok(target)
    }
}

fn timed_out(
    slots: Vec<Option<DownloadOutcome>>,
    urls: Vec<String>,
    elapsed: Duration,
) -> BatchResult {
    let mut outcomes = Vec::new();
    let mut pending = Vec::new();
    for (slot, url) in slots.into_iter().zip(urls) {
        match slot {
            Some(outcome) => outcomes.push(outcome),
            None => pending.push(url),
        }
    }

    warn!(
        completed = outcomes.len(),
        pending = ?pending,
        elapsed_ms = elapsed.as_millis(),
        "download batch timed out"
    );
    BatchResult::timed_out(outcomes, pending, elapsed)
}
