//! Concurrent batch download of remote files to a local directory tree.
//!
//! This module fetches every configured URL in parallel, maps each URL to a
//! path under a target root, and folds the per-file results into one
//! [`BatchResult`] bounded by a single deadline.
//!
//! # Features
//!
//! - Full fan-out: one tokio task per URL, no concurrency cap
//! - Basic or preset Authorization header on every request
//! - Streaming downloads (memory-efficient for large files)
//! - Error statuses never touch the target file
//! - Paths that would escape the target root are rejected
//!
//! # Example
//!
//! ```no_run
//! use confetch_core::download::{
//!     BatchSettings, Credentials, DownloadOrchestrator, HttpClient, requests_from_urls,
//! };
//! use std::time::Duration;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let urls = vec!["https://config.example/app/common/master/app/a.yml".to_string()];
//! let credentials = Credentials::basic("user", "secret");
//! let requests = requests_from_urls(&urls, Some(&credentials))?;
//!
//! let settings = BatchSettings::new("./config", Duration::from_secs(180))
//!     .with_prefix_marker("common/master/app/");
//! let orchestrator = DownloadOrchestrator::new(HttpClient::new(), settings);
//! let result = orchestrator.run_batch(requests).await;
//! println!("{:?}: {} succeeded", result.status(), result.succeeded());
//! # Ok(())
//! # }
//! ```

pub mod auth;
mod client;
mod constants;
mod error;
mod orchestrator;
mod outcome;
pub mod path;

pub use auth::{AuthError, Credentials, authorization_header};
pub use client::HttpClient;
pub use constants::{CONNECT_TIMEOUT_SECS, DEFAULT_BATCH_TIMEOUT, READ_TIMEOUT_SECS};
pub use error::{DownloadError, FailureKind};
pub use orchestrator::{BatchSettings, DownloadOrchestrator, requests_from_urls};
pub use outcome::{BatchResult, BatchStatus, DownloadOutcome, DownloadRequest, DownloadTarget};
pub use path::{PathError, resolve as resolve_path};

// Note: we do NOT define module-local Result aliases.
// Use `Result<T, DownloadError>` explicitly in function signatures.
