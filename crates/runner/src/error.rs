// Errors surfaced by a contribution run.

use std::path::PathBuf;

use contribution_common::primes::PrimeError;
use thiserror::Error;

use crate::config::ConfigError;
use crate::git::worker::GitWorkerError;

#[derive(Debug, Error)]
pub enum RunnerError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Prime(#[from] PrimeError),

    #[error("target repository cannot be empty")]
    EmptyTargetRepo,

    #[error("invalid remote url for `{target_repo}`: {source}")]
    InvalidRemoteUrl {
        target_repo: String,
        #[source]
        source: url::ParseError,
    },

    #[error("failed to prepare worktree directory {}: {source}", path.display())]
    Worktree {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to clone repository into {}", path.display())]
    Clone {
        path: PathBuf,
        #[source]
        source: GitWorkerError,
    },

    #[error("failed to fetch from remote `{remote}`")]
    Fetch {
        remote: String,
        #[source]
        source: GitWorkerError,
    },

    #[error("failed to check out branch `{branch}`")]
    Checkout {
        branch: String,
        #[source]
        source: GitWorkerError,
    },

    #[error("failed to configure committer identity")]
    Identity(#[source] GitWorkerError),

    #[error("failed to append to contribution log {}: {source}", path.display())]
    Log {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to create commit {index}/{total}")]
    Commit {
        index: i64,
        total: i64,
        #[source]
        source: GitWorkerError,
    },

    #[error("push of `{branch}` to `{remote}` failed after {attempts} attempt(s)")]
    PushExhausted {
        remote: String,
        branch: String,
        attempts: u32,
        #[source]
        source: GitWorkerError,
    },
}

impl RunnerError {
    /// The underlying git failure, when the error came from a git command.
    pub fn git_error(&self) -> Option<&GitWorkerError> {
        match self {
            RunnerError::Clone { source, .. }
            | RunnerError::Fetch { source, .. }
            | RunnerError::Checkout { source, .. }
            | RunnerError::Identity(source)
            | RunnerError::Commit { source, .. }
            | RunnerError::PushExhausted { source, .. } => Some(source),
            _ => None,
        }
    }

    /// Whether the failure happened while talking to the remote.
    pub fn is_remote_failure(&self) -> bool {
        matches!(
            self,
            RunnerError::Clone { .. } | RunnerError::Fetch { .. } | RunnerError::PushExhausted { .. }
        )
    }
}
