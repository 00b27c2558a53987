//! Exit code logic for the confetch process.
//!
//! Single responsibility: map a batch status to the process exit outcome.

use std::process::ExitCode;

use confetch_core::BatchStatus;

/// How the process ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ProcessExit {
    /// Every file was written.
    Success,
    /// At least one file failed.
    Failure,
    /// The batch deadline passed.
    TimedOut,
}

impl ProcessExit {
    pub(crate) fn code(self) -> u8 {
        match self {
            Self::Success => 0,
            Self::Failure => 1,
            Self::TimedOut => 2,
        }
    }
}

impl From<ProcessExit> for ExitCode {
    fn from(exit: ProcessExit) -> Self {
        ExitCode::from(exit.code())
    }
}

/// Determines the process exit outcome from the batch status.
pub(crate) fn determine_exit_outcome(status: BatchStatus) -> ProcessExit {
    match status {
        BatchStatus::AllSucceeded => ProcessExit::Success,
        BatchStatus::OneOrMoreFailed => ProcessExit::Failure,
        BatchStatus::TimedOut => ProcessExit::TimedOut,
    }
}
