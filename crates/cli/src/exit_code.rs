// Consistent exit codes for the contribution-adder CLI.
//
//   0  = success (including a skipped run)
//   1  = general error
//   2  = usage/argument error
//   10 = configuration error
//   11 = authentication error
//   13 = network error

use std::process;

use contribution_runner::config::ConfigError;
use contribution_runner::error::RunnerError;
use contribution_runner::git::worker::GitWorkerError;

/// Git stderr fragments that mean the remote rejected our credentials.
const AUTH_MARKERS: &[&str] = &[
    "authentication failed",
    "could not read username",
    "permission denied",
    "the requested url returned error: 401",
    "the requested url returned error: 403",
];

/// Named exit codes for the CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    Success = 0,
    Error = 1,
    Usage = 2,
    Config = 10,
    Auth = 11,
    Network = 13,
}

impl ExitCode {
    pub fn code(self) -> i32 {
        self as i32
    }

    /// Map an anyhow error to an exit code by inspecting the error chain.
    pub fn from_error(err: &anyhow::Error) -> Self {
        for cause in err.chain() {
            if cause.downcast_ref::<ConfigError>().is_some() {
                return Self::Config;
            }
            if let Some(runner_err) = cause.downcast_ref::<RunnerError>() {
                return Self::from_runner_error(runner_err);
            }
        }
        Self::Error
    }

    pub fn from_runner_error(err: &RunnerError) -> Self {
        if matches!(err, RunnerError::Config(_) | RunnerError::EmptyTargetRepo) {
            return Self::Config;
        }
        if err.git_error().is_some_and(is_auth_failure) {
            return Self::Auth;
        }
        if err.is_remote_failure() {
            return Self::Network;
        }
        Self::Error
    }
}

pub fn is_auth_failure(err: &GitWorkerError) -> bool {
    let stderr = err.stderr().to_ascii_lowercase();
    AUTH_MARKERS.iter().any(|marker| stderr.contains(marker))
}

impl From<ExitCode> for process::ExitCode {
    fn from(code: ExitCode) -> Self {
        process::ExitCode::from(code.code() as u8)
    }
}
