//! Application configuration loading for the confetch binary.

use std::env;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use confetch_core::Credentials;
use confetch_core::download::{CONNECT_TIMEOUT_SECS, DEFAULT_BATCH_TIMEOUT, READ_TIMEOUT_SECS};
use serde::Deserialize;

use crate::cli::Args;

const DEFAULT_DOWNLOAD_TIMEOUT_SECS: u64 = DEFAULT_BATCH_TIMEOUT.as_secs();
const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = CONNECT_TIMEOUT_SECS;
const DEFAULT_READ_TIMEOUT_SECS: u64 = READ_TIMEOUT_SECS;

/// TOML-backed file configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    /// Remote files to fetch.
    #[serde(default)]
    pub urls: Vec<String>,
    /// URL substring after which the local relative path starts.
    #[serde(default)]
    pub prefix_marker: String,
    /// Directory the files are written under.
    #[serde(default)]
    pub target_dir: Option<PathBuf>,
    /// Deadline for the whole batch.
    #[serde(default = "default_download_timeout_secs")]
    pub download_timeout_secs: u64,
    /// Per-request connect timeout.
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
    /// Per-request read timeout.
    #[serde(default = "default_read_timeout_secs")]
    pub read_timeout_secs: u64,
    /// Credentials shared by every request.
    #[serde(default)]
    pub credentials: Credentials,
}

fn default_download_timeout_secs() -> u64 {
    DEFAULT_DOWNLOAD_TIMEOUT_SECS
}

fn default_connect_timeout_secs() -> u64 {
    DEFAULT_CONNECT_TIMEOUT_SECS
}

fn default_read_timeout_secs() -> u64 {
    DEFAULT_READ_TIMEOUT_SECS
}

impl Default for FileConfig {
    fn default() -> Self {
        Self {
            urls: Vec::new(),
            prefix_marker: String::new(),
            target_dir: None,
            download_timeout_secs: DEFAULT_DOWNLOAD_TIMEOUT_SECS,
            connect_timeout_secs: DEFAULT_CONNECT_TIMEOUT_SECS,
            read_timeout_secs: DEFAULT_READ_TIMEOUT_SECS,
            credentials: Credentials::default(),
        }
    }
}

impl FileConfig {
    /// Validates config values against runtime and CLI constraints.
    pub fn validate(&self) -> Result<()> {
        validate_timeout_secs("connect_timeout_secs", self.connect_timeout_secs, 3600)?;
        validate_timeout_secs("read_timeout_secs", self.read_timeout_secs, 3600)?;
        validate_timeout_secs(
            "download_timeout_secs",
            self.download_timeout_secs,
            86_400,
        )?;
        self.credentials
            .authorization_header()
            .context("Invalid `[credentials]` table")?;
        Ok(())
    }
}

fn validate_timeout_secs(field: &str, value: u64, max: u64) -> Result<()> {
    if !(1..=max).contains(&value) {
        bail!("Invalid config value for `{field}`: {value}. Expected range: 1..={max}");
    }
    Ok(())
}

/// Settings for one run, after merging the config file with CLI flags.
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub urls: Vec<String>,
    pub prefix_marker: String,
    pub target_dir: PathBuf,
    pub batch_timeout: Duration,
    pub connect_timeout: Duration,
    pub read_timeout: Duration,
    pub credentials: Credentials,
    /// Config file that was read, if any.
    pub source: Option<PathBuf>,
}

/// Resolves default config path.
///
/// Priority:
/// 1. `$XDG_CONFIG_HOME/confetch/config.toml`
/// 2. `$HOME/.config/confetch/config.toml`
#[must_use]
pub fn resolve_default_config_path() -> Option<PathBuf> {
    default_config_path_from(env_var_non_empty_os("XDG_CONFIG_HOME"), env_var_non_empty_os("HOME"))
}

fn default_config_path_from(xdg_config_home: Option<OsString>, home: Option<OsString>) -> Option<PathBuf> {
    if let Some(xdg_config_home) = xdg_config_home {
        return Some(
            PathBuf::from(xdg_config_home)
                .join("confetch")
                .join("config.toml"),
        );
    }

    let home = home?;
    Some(
        PathBuf::from(home)
            .join(".config")
            .join("confetch")
            .join("config.toml"),
    )
}

fn env_var_non_empty_os(name: &str) -> Option<OsString> {
    let value = env::var_os(name)?;
    if value.is_empty() { None } else { Some(value) }
}

/// Loads the config file and applies CLI overrides.
///
/// An explicit `--config` must exist; the default location is optional.
pub fn resolve_config(args: &Args) -> Result<ResolvedConfig> {
    resolve_config_with_default(args, resolve_default_config_path())
}

fn resolve_config_with_default(args: &Args, default_path: Option<PathBuf>) -> Result<ResolvedConfig> {
    let (file_config, source) = match (&args.config, default_path) {
        (Some(explicit), _) => (load_file_config(explicit)?, Some(explicit.clone())),
        (None, Some(default)) if default.exists() => (load_file_config(&default)?, Some(default)),
        (None, _) => (FileConfig::default(), None),
    };

    let FileConfig {
        urls,
        prefix_marker,
        target_dir,
        download_timeout_secs,
        connect_timeout_secs,
        read_timeout_secs,
        credentials,
    } = file_config;

    let urls = if args.urls.is_empty() {
        urls
    } else {
        args.urls.clone()
    };
    let Some(target_dir) = args.target_dir.clone().or(target_dir) else {
        bail!("No target directory configured: set `target_dir` in the config file or pass --target-dir");
    };
    let prefix_marker = args.prefix_marker.clone().unwrap_or(prefix_marker);
    let download_timeout_secs = args.timeout_secs.unwrap_or(download_timeout_secs);

    Ok(ResolvedConfig {
        urls,
        prefix_marker,
        target_dir,
        batch_timeout: Duration::from_secs(download_timeout_secs),
        connect_timeout: Duration::from_secs(connect_timeout_secs),
        read_timeout: Duration::from_secs(read_timeout_secs),
        credentials,
        source,
    })
}

fn load_file_config(path: &Path) -> Result<FileConfig> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file '{}'", path.display()))?;
    parse_config_str(&raw)
        .with_context(|| format!("Failed to parse config file '{}'", path.display()))
}

fn parse_config_str(raw: &str) -> Result<FileConfig> {
    let cfg: FileConfig = toml::from_str(raw)?;
    cfg.validate()?;
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use clap::Parser;
    use tempfile::TempDir;

    use super::*;

    fn args(extra: &[&str]) -> Args {
        let mut argv = vec!["confetch"];
        argv.extend_from_slice(extra);
        Args::try_parse_from(argv).expect("test args should parse")
    }

    #[test]
    fn test_parse_config_full_file() {
        let cfg = parse_config_str(
            r#"
urls = [
    "https://config.example/app/common/master/app/a.txt",
    "https://config.example/app/common/master/app/sub/b.txt",
]
prefix_marker = "common/master/app/"
target_dir = "/out"
download_timeout_secs = 60 # one minute

[credentials]
username = "svc"
password = "secret"
"#,
        )
        .expect("full config should parse");
        assert_eq!(cfg.urls.len(), 2);
        assert_eq!(cfg.prefix_marker, "common/master/app/");
        assert_eq!(cfg.target_dir, Some(PathBuf::from("/out")));
        assert_eq!(cfg.download_timeout_secs, 60);
        assert_eq!(cfg.connect_timeout_secs, DEFAULT_CONNECT_TIMEOUT_SECS);
        assert_eq!(cfg.credentials.username, "svc");
        assert_eq!(cfg.credentials.password.as_deref(), Some("secret"));
    }

    #[test]
    fn test_parse_config_empty_uses_defaults() {
        let cfg = parse_config_str("").expect("empty config should parse");
        assert!(cfg.urls.is_empty());
        assert!(cfg.target_dir.is_none());
        assert_eq!(cfg.download_timeout_secs, 180);
        assert_eq!(cfg.read_timeout_secs, 300);
        assert_eq!(cfg.credentials, Credentials::default());
    }

    #[test]
    fn test_parse_config_rejects_unknown_keys() {
        let err = parse_config_str("unknown_key = 123").expect_err("unknown key error expected");
        assert!(
            format!("{err:#}").contains("unknown_key"),
            "unexpected error: {err:#}"
        );
    }

    #[test]
    fn test_parse_config_rejects_unknown_credentials_keys() {
        let err = parse_config_str("[credentials]\ntoken = \"x\"")
            .expect_err("unknown credentials key expected");
        assert!(format!("{err:#}").contains("token"));
    }

    #[test]
    fn test_parse_config_rejects_invalid_timeout_value() {
        let err = parse_config_str("connect_timeout_secs = 0").expect_err("invalid timeout expected");
        assert!(err.to_string().contains("connect_timeout_secs"));

        let err = parse_config_str("download_timeout_secs = 86401")
            .expect_err("batch timeout above range expected");
        assert!(err.to_string().contains("download_timeout_secs"));
    }

    #[test]
    fn test_parse_config_rejects_password_and_authorization() {
        let err = parse_config_str(
            r#"
[credentials]
password = "p"
authorization = "Bearer t"
"#,
        )
        .expect_err("credential conflict expected");
        let msg = format!("{err:#}");
        assert!(msg.contains("credentials"), "unexpected error: {msg}");
        assert!(msg.contains("not both"), "unexpected error: {msg}");
    }

    #[test]
    fn test_default_config_path_prefers_xdg() {
        let path = default_config_path_from(Some("/xdg".into()), Some("/home/u".into()));
        assert_eq!(path, Some(PathBuf::from("/xdg/confetch/config.toml")));
    }

    #[test]
    fn test_default_config_path_falls_back_to_home() {
        let path = default_config_path_from(None, Some("/home/u".into()));
        assert_eq!(path, Some(PathBuf::from("/home/u/.config/confetch/config.toml")));
        assert_eq!(default_config_path_from(None, None), None);
    }

    #[test]
    fn test_resolve_config_cli_overrides_file() {
        let dir = TempDir::new().unwrap();
        let config_path = dir.path().join("config.toml");
        fs::write(
            &config_path,
            r#"
urls = ["https://h/app/a.txt"]
prefix_marker = "app/"
target_dir = "/from-file"
download_timeout_secs = 60
"#,
        )
        .unwrap();

        let config_arg = config_path.to_string_lossy().to_string();
        let resolved = resolve_config_with_default(
            &args(&[
                "--config",
                &config_arg,
                "--target-dir",
                "/from-cli",
                "--timeout",
                "5",
                "https://h/app/b.txt",
            ]),
            None,
        )
        .expect("config should resolve");

        assert_eq!(resolved.urls, vec!["https://h/app/b.txt".to_string()]);
        assert_eq!(resolved.prefix_marker, "app/");
        assert_eq!(resolved.target_dir, PathBuf::from("/from-cli"));
        assert_eq!(resolved.batch_timeout, Duration::from_secs(5));
        assert_eq!(resolved.source, Some(config_path));
    }

    #[test]
    fn test_resolve_config_reads_default_path_when_present() {
        let dir = TempDir::new().unwrap();
        let default_path = dir.path().join("config.toml");
        fs::write(&default_path, "target_dir = \"/out\"\nurls = [\"https://h/a\"]").unwrap();

        let resolved = resolve_config_with_default(&args(&[]), Some(default_path.clone()))
            .expect("default config should resolve");
        assert_eq!(resolved.target_dir, PathBuf::from("/out"));
        assert_eq!(resolved.urls.len(), 1);
        assert_eq!(resolved.source, Some(default_path));
    }

    #[test]
    fn test_resolve_config_missing_default_is_not_an_error() {
        let dir = TempDir::new().unwrap();
        let resolved = resolve_config_with_default(
            &args(&["-o", "/out"]),
            Some(dir.path().join("absent.toml")),
        )
        .expect("missing default config is fine");
        assert!(resolved.source.is_none());
        assert!(resolved.urls.is_empty());
        assert_eq!(resolved.batch_timeout, Duration::from_secs(180));
    }

    #[test]
    fn test_resolve_config_missing_explicit_config_fails() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("absent.toml");
        let missing_arg = missing.to_string_lossy().to_string();
        let err = resolve_config_with_default(&args(&["-c", &missing_arg, "-o", "/out"]), None)
            .expect_err("explicit missing config should fail");
        assert!(err.to_string().contains("Failed to read config file"));
    }

    #[test]
    fn test_resolve_config_requires_target_dir() {
        let err = resolve_config_with_default(&args(&["https://h/a"]), None)
            .expect_err("target dir is required");
        assert!(err.to_string().contains("target_dir"));
    }
}
