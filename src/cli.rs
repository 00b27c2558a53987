//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::Parser;

/// Fetch a configured set of remote files concurrently at startup.
///
/// Confetch downloads every configured URL in parallel into a target
/// directory, keeping the remote subdirectory layout, and exits non-zero if
/// any file failed or the batch ran out of time.
#[derive(Parser, Debug)]
#[command(name = "confetch")]
#[command(author, version, about)]
pub struct Args {
    /// URLs to fetch (replaces `urls` from the config file)
    pub urls: Vec<String>,

    /// Path to the TOML config file
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Directory the files are written under
    #[arg(short = 'o', long, value_name = "DIR")]
    pub target_dir: Option<PathBuf>,

    /// URL substring after which the local relative path starts
    #[arg(short = 'p', long, value_name = "MARKER")]
    pub prefix_marker: Option<String>,

    /// Deadline for the whole batch in seconds (1-86400)
    #[arg(short = 't', long = "timeout", value_name = "SECS", value_parser = clap::value_parser!(u64).range(1..=86_400))]
    pub timeout_secs: Option<u64>,

    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long)]
    pub quiet: bool,
}

impl Args {
    /// Default log filter when `RUST_LOG` is unset.
    pub fn default_log_level(&self) -> &'static str {
        if self.quiet {
            "error"
        } else {
            match self.verbose {
                0 => "info",
                1 => "debug",
                _ => "trace",
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_default_args_parses_successfully() {
        let args = Args::try_parse_from(["confetch"]).unwrap();
        assert!(args.urls.is_empty());
        assert!(args.config.is_none());
        assert!(args.target_dir.is_none());
        assert!(args.timeout_secs.is_none());
        assert_eq!(args.verbose, 0);
        assert!(!args.quiet);
        assert_eq!(args.default_log_level(), "info");
    }

    #[test]
    fn test_cli_verbose_flag_increments_count() {
        let args = Args::try_parse_from(["confetch", "-v"]).unwrap();
        assert_eq!(args.default_log_level(), "debug");

        let args = Args::try_parse_from(["confetch", "-vv"]).unwrap();
        assert_eq!(args.verbose, 2);
        assert_eq!(args.default_log_level(), "trace");
    }

    #[test]
    fn test_cli_quiet_wins_over_verbose() {
        let args = Args::try_parse_from(["confetch", "-q", "-v"]).unwrap();
        assert_eq!(args.default_log_level(), "error");
    }

    #[test]
    fn test_cli_overrides_and_positional_urls() {
        let args = Args::try_parse_from([
            "confetch",
            "-c",
            "/etc/confetch.toml",
            "-o",
            "/out",
            "-p",
            "common/master/app/",
            "-t",
            "30",
            "https://h/common/master/app/a.txt",
            "https://h/common/master/app/b.txt",
        ])
        .unwrap();
        assert_eq!(args.config, Some(PathBuf::from("/etc/confetch.toml")));
        assert_eq!(args.target_dir, Some(PathBuf::from("/out")));
        assert_eq!(args.prefix_marker.as_deref(), Some("common/master/app/"));
        assert_eq!(args.timeout_secs, Some(30));
        assert_eq!(args.urls.len(), 2);
    }

    #[test]
    fn test_cli_timeout_zero_rejected() {
        let result = Args::try_parse_from(["confetch", "--timeout", "0"]);
        let err = result.unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
    }

    #[test]
    fn test_cli_help_flag_shows_usage() {
        let err = Args::try_parse_from(["confetch", "--help"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayHelp);
    }

    #[test]
    fn test_cli_invalid_flag_returns_error() {
        let err = Args::try_parse_from(["confetch", "--invalid-flag"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::UnknownArgument);
    }
}
