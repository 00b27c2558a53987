//! Confetch Core Library
//!
//! This library fetches a configured set of remote files concurrently at
//! process startup, writes each one under a local root directory (keeping the
//! remote subdirectory layout) and reports a single aggregated result.
//!
//! # Architecture
//!
//! Everything lives in the [`download`] module:
//! - [`download::path`] - remote URL to local path mapping
//! - [`download::auth`] - Authorization header computation
//! - [`download::HttpClient`] - single-file fetch with streaming to disk
//! - [`download::DownloadOrchestrator`] - concurrent fan-out under one deadline

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod download;
#[cfg(test)]
pub mod test_support;
pub(crate) mod user_agent;

// Re-export commonly used types
pub use download::{
    AuthError, BatchResult, BatchSettings, BatchStatus, Credentials, DEFAULT_BATCH_TIMEOUT,
    DownloadError, DownloadOrchestrator, DownloadOutcome, DownloadRequest, DownloadTarget,
    FailureKind, HttpClient, PathError, authorization_header, requests_from_urls, resolve_path,
};
