//! Authorization header computation for download requests.
//!
//! A credential is either a username/password pair, sent as HTTP Basic auth,
//! or a preset header value passed through verbatim. Setting both is a
//! configuration error caught before any request goes out.

use std::fmt;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::Deserialize;
use thiserror::Error;

/// Username sent with a password when none is configured.
pub const DEFAULT_USERNAME: &str = "user";

/// Errors raised while turning credentials into a header value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    /// Both a password and a preset authorization header were supplied.
    #[error("you must set either 'password' or 'authorization', not both")]
    ConfigConflict,
}

/// Computes the Authorization header value for one credential.
///
/// Empty strings are treated as absent.
///
/// - `secret` set: `Basic base64(username:secret)`
/// - `preset` set: the preset value unchanged
/// - neither: `None`, the request goes out unauthenticated
///
/// # Errors
///
/// Returns [`AuthError::ConfigConflict`] when both `secret` and `preset` are set.
pub fn authorization_header(
    username: &str,
    secret: Option<&str>,
    preset: Option<&str>,
) -> Result<Option<String>, AuthError> {
    let secret = secret.filter(|s| !s.is_empty());
    let preset = preset.filter(|p| !p.is_empty());

    match (secret, preset) {
        (Some(_), Some(_)) => Err(AuthError::ConfigConflict),
        (Some(secret), None) => {
            let token = STANDARD.encode(format!("{username}:{secret}"));
            Ok(Some(format!("Basic {token}")))
        }
        (None, Some(preset)) => Ok(Some(preset.to_string())),
        (None, None) => Ok(None),
    }
}

/// Credentials shared by every request of a batch.
///
/// Deserializes from the `[credentials]` table of the config file.
#[derive(Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Credentials {
    /// Username for Basic auth.
    #[serde(default = "default_username")]
    pub username: String,
    /// Password for Basic auth.
    #[serde(default)]
    pub password: Option<String>,
    /// Preset Authorization header value.
    #[serde(default)]
    pub authorization: Option<String>,
}

fn default_username() -> String {
    DEFAULT_USERNAME.to_string()
}

impl Default for Credentials {
    fn default() -> Self {
        Self {
            username: default_username(),
            password: None,
            authorization: None,
        }
    }
}

impl Credentials {
    /// Username/password credentials sent as HTTP Basic auth.
    #[must_use]
    pub fn basic(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: Some(password.into()),
            authorization: None,
        }
    }

    /// A preset Authorization header, e.g. `Bearer <token>`.
    #[must_use]
    pub fn preset(authorization: impl Into<String>) -> Self {
        Self {
            authorization: Some(authorization.into()),
            ..Self::default()
        }
    }

    /// Computes the header value for these credentials.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::ConfigConflict`] when both password and
    /// authorization are set.
    pub fn authorization_header(&self) -> Result<Option<String>, AuthError> {
        authorization_header(
            &self.username,
            self.password.as_deref(),
            self.authorization.as_deref(),
        )
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field(
                "authorization",
                &self.authorization.as_ref().map(|_| "<redacted>"),
            )
            .finish()
    }
}
