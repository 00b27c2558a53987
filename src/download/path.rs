//! Remote URL to local path mapping.
//!
//! A URL such as `https://host/app/common/master/app/sub/b.txt` with the prefix
//! marker `common/master/app/` maps to `<root>/sub/b.txt`. The mapping is a pure
//! function of (url, marker, root); nothing touches the filesystem here.

use std::path::{Component, Path, PathBuf};

use thiserror::Error;
use tracing::warn;
use url::Url;

/// Errors produced while mapping a URL onto the target root.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PathError {
    /// A `..` segment would climb out of the target root.
    #[error("path of {url} escapes the target root")]
    EscapesRoot {
        /// The offending URL.
        url: String,
    },

    /// A segment decodes to something other than a plain file or directory name.
    #[error("invalid path segment {segment:?} in {url}")]
    InvalidSegment {
        /// The offending URL.
        url: String,
        /// The decoded segment.
        segment: String,
    },

    /// Nothing is left after the marker, so the URL would map onto the root itself.
    #[error("no relative path left in {url}")]
    EmptyRelativePath {
        /// The offending URL.
        url: String,
    },

    /// The marker is absent and the URL cannot be parsed to take its path instead.
    #[error("invalid URL: {url}")]
    InvalidUrl {
        /// The offending URL.
        url: String,
    },
}

/// Resolves the local path for `url` under `root`.
///
/// Everything after the first occurrence of `prefix_marker` is taken as the
/// relative path. When the marker is empty or does not occur in the URL, the
/// URL's own path (without the leading `/`) is used instead and a warning is
/// logged. Query string and fragment are dropped and each segment is
/// percent-decoded. Empty and `.` segments are skipped.
///
/// # Errors
///
/// - [`PathError::EscapesRoot`] for any `..` segment
/// - [`PathError::InvalidSegment`] for a segment that is not a single normal
///   path component once decoded (embedded separators, NUL, drive prefixes)
/// - [`PathError::EmptyRelativePath`] when no segment remains
/// - [`PathError::InvalidUrl`] when the fallback needs to parse a malformed URL
pub fn resolve(url: &str, prefix_marker: &str, root: &Path) -> Result<PathBuf, PathError> {
    let relative = relative_remote_path(url, prefix_marker)?;

    let mut resolved = root.to_path_buf();
    let mut depth = 0usize;
    for raw_segment in relative.split('/') {
        let segment = urlencoding::decode(raw_segment)
            .map(std::borrow::Cow::into_owned)
            .unwrap_or_else(|_| raw_segment.to_string());

        match segment.as_str() {
            "" | "." => {}
            ".." => {
                return Err(PathError::EscapesRoot {
                    url: url.to_string(),
                });
            }
            name if is_plain_segment(name) => {
                resolved.push(name);
                depth += 1;
            }
            _ => {
                return Err(PathError::InvalidSegment {
                    url: url.to_string(),
                    segment,
                });
            }
        }
    }

    if depth == 0 {
        return Err(PathError::EmptyRelativePath {
            url: url.to_string(),
        });
    }
    Ok(resolved)
}

/// Returns the raw (still percent-encoded) path after the marker.
fn relative_remote_path<'a>(url: &'a str, prefix_marker: &str) -> Result<&'a str, PathError> {
    let after_marker = if prefix_marker.is_empty() {
        None
    } else {
        url.find(prefix_marker)
            .map(|index| &url[index + prefix_marker.len()..])
    };

    if let Some(relative) = after_marker {
        return Ok(strip_query_and_fragment(relative));
    }

    let parsed = Url::parse(url).map_err(|_| PathError::InvalidUrl {
        url: url.to_string(),
    })?;
    if parsed.cannot_be_a_base() {
        return Err(PathError::InvalidUrl {
            url: url.to_string(),
        });
    }
    warn!(
        url = %url,
        prefix_marker = %prefix_marker,
        "prefix marker not found, using full URL path"
    );

    // Url::path() has dot segments already folded away; slice the raw text instead
    // so `..` still reaches the escape check.
    let without_query = strip_query_and_fragment(url);
    let after_scheme = without_query
        .split_once("://")
        .map_or(without_query, |(_, rest)| rest);
    Ok(after_scheme
        .find('/')
        .map_or("", |index| &after_scheme[index..]))
}

fn strip_query_and_fragment(path: &str) -> &str {
    path.split(['?', '#']).next().unwrap_or_default()
}

fn is_plain_segment(name: &str) -> bool {
    if name.contains(['/', '\\', '\0']) {
        return false;
    }
    let mut components = Path::new(name).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    )
}
