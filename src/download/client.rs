//! HTTP client wrapper for fetching single files.
//!
//! This module provides the `HttpClient` struct which issues the GET,
//! validates the status and streams the body to its target path.

use std::path::{Path, PathBuf};
use std::time::Duration;

use futures_util::StreamExt;
use reqwest::Client;
use reqwest::header::AUTHORIZATION;
use tokio::fs::File;
use tokio::io::{AsyncWriteExt, BufWriter};
use tracing::{debug, info, instrument, warn};

use super::constants::{CONNECT_TIMEOUT_SECS, READ_TIMEOUT_SECS};
use super::error::DownloadError;
use super::outcome::{DownloadOutcome, DownloadRequest, DownloadTarget};
use crate::user_agent;

/// HTTP client for fetching files with streaming support.
///
/// Create once and clone into each download task; clones share the
/// connection pool.
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
}

impl Default for HttpClient {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpClient {
    /// Creates a new HTTP client with default timeouts.
    ///
    /// Default configuration:
    /// - Connect timeout: 30 seconds
    /// - Read timeout: 5 minutes (for large files)
    /// - Gzip decompression: enabled
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client builder fails to build with the static
    /// configuration. This should never happen in practice.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn new() -> Self {
        Self::with_timeouts(CONNECT_TIMEOUT_SECS, READ_TIMEOUT_SECS)
            .expect("failed to build HTTP client with static configuration")
    }

    /// Creates a new HTTP client with explicit timeout values.
    ///
    /// # Errors
    ///
    /// Returns the reqwest builder error if the client cannot be built
    /// (e.g. the TLS backend fails to initialize).
    #[instrument(level = "debug")]
    pub fn with_timeouts(
        connect_timeout_secs: u64,
        read_timeout_secs: u64,
    ) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(connect_timeout_secs))
            .read_timeout(Duration::from_secs(read_timeout_secs))
            .gzip(true)
            .user_agent(user_agent::default_download_user_agent())
            .build()?;
        Ok(Self { client })
    }

    /// Fetches one request into its target path.
    ///
    /// The target file is only opened after the response status has been
    /// checked, so a 4xx/5xx answer leaves any existing file untouched. Parent
    /// directories are created as needed and an existing file is overwritten.
    ///
    /// Never returns an error: every failure is captured in the
    /// [`DownloadOutcome::Failure`].
    #[instrument(skip(self, request, target), fields(url = %request.url()))]
    pub async fn fetch(&self, request: &DownloadRequest, target: &DownloadTarget) -> DownloadOutcome {
        let url = request.url();
        match self.fetch_inner(request, target.path()).await {
            Ok(bytes) => {
                info!(path = %target.path().display(), bytes, "download complete");
                DownloadOutcome::Success {
                    url: url.to_string(),
                    path: target.path().to_path_buf(),
                    bytes,
                }
            }
            Err(error) => {
                warn!(error = %error, "download failed");
                DownloadOutcome::Failure {
                    url: url.to_string(),
                    error,
                }
            }
        }
    }

    async fn fetch_inner(
        &self,
        request: &DownloadRequest,
        file_path: &Path,
    ) -> Result<u64, DownloadError> {
        let url = request.url();
        debug!("starting download");

        let response = self.send_request(request).await?;

        if let Some(parent) = file_path.parent() {
            // create_dir_all treats an existing directory as success, so
            // siblings racing on a shared parent are fine.
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| DownloadError::io(parent.to_path_buf(), e))?;
        }

        debug!(path = %file_path.display(), "writing content to target");
        let file = File::create(file_path)
            .await
            .map_err(|e| DownloadError::io(file_path.to_path_buf(), e))?;
        let mut guard = PartialFileGuard::new(file_path);

        let bytes_written = stream_to_file(file, response, url, file_path).await?;

        guard.disarm();
        Ok(bytes_written)
    }

    async fn send_request(
        &self,
        request: &DownloadRequest,
    ) -> Result<reqwest::Response, DownloadError> {
        let url = request.url();
        let mut builder = self.client.get(url);
        if let Some(authorization) = request.authorization() {
            builder = builder.header(AUTHORIZATION, authorization);
        }

        let response = builder.send().await.map_err(|e| {
            if e.is_builder() {
                DownloadError::invalid_url(url)
            } else {
                DownloadError::network(url, e)
            }
        })?;

        let status = response.status();
        if status.is_client_error() || status.is_server_error() {
            return Err(DownloadError::http_status(url, status.as_u16()));
        }

        Ok(response)
    }
}

/// Streams response body to file, returning bytes written.
async fn stream_to_file(
    file: File,
    response: reqwest::Response,
    url: &str,
    file_path: &Path,
) -> Result<u64, DownloadError> {
    let mut writer = BufWriter::new(file);
    let mut stream = response.bytes_stream();
    let mut bytes_written: u64 = 0;

    while let Some(chunk_result) = stream.next().await {
        let chunk = chunk_result.map_err(|e| DownloadError::network(url, e))?;

        writer
            .write_all(&chunk)
            .await
            .map_err(|e| DownloadError::io(file_path.to_path_buf(), e))?;

        bytes_written += chunk.len() as u64;
    }

    // Ensure all data is flushed to disk
    writer
        .flush()
        .await
        .map_err(|e| DownloadError::io(file_path.to_path_buf(), e))?;
    writer
        .into_inner()
        .sync_all()
        .await
        .map_err(|e| DownloadError::io(file_path.to_path_buf(), e))?;

    Ok(bytes_written)
}

/// Removes a partially written file unless disarmed.
///
/// Covers both stream errors and the task being aborted at the batch deadline,
/// where no code after the await point runs.
struct PartialFileGuard {
    path: Option<PathBuf>,
}

impl PartialFileGuard {
    fn new(path: &Path) -> Self {
        Self {
            path: Some(path.to_path_buf()),
        }
    }

    fn disarm(&mut self) {
        self.path = None;
    }
}

impl Drop for PartialFileGuard {
    fn drop(&mut self) {
        if let Some(path) = self.path.take() {
            debug!(path = %path.display(), "cleaning up partial file");
            let _ = std::fs::remove_file(&path);
        }
    }
}
