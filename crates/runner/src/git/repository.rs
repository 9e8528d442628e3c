// Working-copy preparation: clone or reuse, check out the branch, track upstream.
//
// Steps, in order:
//   1. clone into the worktree, or fetch when `.git` already exists
//   2. check out the branch (falling back to `checkout -B`)
//   3. pull and set upstream when the remote branch exists (best effort)
//   4. make sure a committer identity resolves

use std::path::PathBuf;

use tracing::{debug, info, warn};
use url::Url;

use super::worker::{CommandExecutor, GitWorker};
use crate::config::{AppConfig, IdentityConfig};
use crate::error::RunnerError;

/// Build `https://{token}@{host}/{target_repo}.git`, or return `override_url`.
///
/// The override skips validation entirely; it exists for local mirrors and
/// tests that must stay off the network.
pub fn build_remote_url(
    config: &AppConfig,
    host: &str,
    override_url: Option<&str>,
) -> Result<String, RunnerError> {
    if let Some(url) = override_url {
        return Ok(url.to_string());
    }

    if config.target_repo.trim().is_empty() {
        return Err(RunnerError::EmptyTargetRepo);
    }

    let invalid = |source| RunnerError::InvalidRemoteUrl {
        target_repo: config.target_repo.clone(),
        source,
    };
    let mut url =
        Url::parse(&format!("https://{host}/{}.git", config.target_repo)).map_err(invalid)?;
    url.set_username(&config.token).map_err(|()| invalid(url::ParseError::EmptyHost))?;

    Ok(url.to_string())
}

/// What the preparer needs besides the worker itself.
#[derive(Debug, Clone, Copy)]
pub struct PrepareOptions<'a> {
    /// `owner/name`, for log messages only.
    pub target_repo: &'a str,
    pub remote: &'a str,
    pub branch: &'a str,
    pub identity: &'a IdentityConfig,
}

impl PrepareOptions<'_> {
    /// `refs/remotes/<remote>/<branch>`.
    pub fn remote_ref(&self) -> String {
        format!("refs/remotes/{}/{}", self.remote, self.branch)
    }

    /// `<remote>/<branch>`.
    pub fn upstream(&self) -> String {
        format!("{}/{}", self.remote, self.branch)
    }
}

/// Result of [`prepare_repository`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedRepository {
    pub worktree: PathBuf,
    /// `true` when this run cloned, `false` when it reused an existing clone.
    pub cloned: bool,
    /// Whether the remote already had the target branch.
    pub tracks_remote: bool,
}

/// Make the worker's repository ready to receive commits on `options.branch`.
pub fn prepare_repository<E: CommandExecutor>(
    worker: &GitWorker<E>,
    remote_url: &str,
    options: &PrepareOptions<'_>,
) -> Result<PreparedRepository, RunnerError> {
    let worktree = worker.repo_path().to_path_buf();
    if let Some(parent) = worktree.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .map_err(|source| RunnerError::Worktree { path: parent.to_path_buf(), source })?;
    }

    let cloned = if worker.is_cloned() {
        debug!(worktree = %worktree.display(), "using existing repository");
        worker
            .fetch(options.remote)
            .map_err(|source| RunnerError::Fetch { remote: options.remote.to_string(), source })?;
        false
    } else {
        info!(
            target_repo = options.target_repo,
            worktree = %worktree.display(),
            "cloning repository"
        );
        worker
            .clone_from(remote_url, options.remote)
            .map_err(|source| RunnerError::Clone { path: worktree.clone(), source })?;
        true
    };

    let tracks_remote = remote_branch_exists(worker, options);
    checkout_branch(worker, options, tracks_remote)?;
    if tracks_remote {
        pull_latest(worker, options);
        ensure_upstream(worker, options);
    }
    ensure_identity(worker, options.identity)?;

    Ok(PreparedRepository { worktree, cloned, tracks_remote })
}

fn remote_branch_exists<E: CommandExecutor>(
    worker: &GitWorker<E>,
    options: &PrepareOptions<'_>,
) -> bool {
    match worker.ref_exists(&options.remote_ref()) {
        Ok(exists) => exists,
        Err(error) => {
            warn!(%error, "unable to inspect remote branch; treating it as absent");
            false
        }
    }
}

fn checkout_branch<E: CommandExecutor>(
    worker: &GitWorker<E>,
    options: &PrepareOptions<'_>,
    tracks_remote: bool,
) -> Result<(), RunnerError> {
    let branch = options.branch;
    let Err(error) = worker.checkout(branch) else {
        return Ok(());
    };
    debug!(branch, %error, "plain checkout failed; creating branch");

    let upstream = options.upstream();
    let start_point = tracks_remote.then_some(upstream.as_str());
    worker
        .checkout_reset(branch, start_point)
        .map_err(|source| RunnerError::Checkout { branch: branch.to_string(), source })?;
    Ok(())
}

fn pull_latest<E: CommandExecutor>(worker: &GitWorker<E>, options: &PrepareOptions<'_>) {
    if let Err(error) = worker.pull(options.remote, options.branch) {
        warn!(branch = options.branch, %error, "failed to pull latest changes");
    }
}

fn ensure_upstream<E: CommandExecutor>(worker: &GitWorker<E>, options: &PrepareOptions<'_>) {
    if let Err(error) = worker.set_upstream(&options.upstream(), options.branch) {
        debug!(branch = options.branch, %error, "unable to set upstream");
    }
}

/// Write `user.name` / `user.email` to the repository when they don't resolve.
pub fn ensure_identity<E: CommandExecutor>(
    worker: &GitWorker<E>,
    identity: &IdentityConfig,
) -> Result<(), RunnerError> {
    for (key, default) in [("user.name", &identity.name), ("user.email", &identity.email)] {
        if worker.config_get(key).map_err(RunnerError::Identity)?.is_none() {
            debug!(key, value = default.as_str(), "setting default committer identity");
            worker.config_set(key, default).map_err(RunnerError::Identity)?;
        }
    }
    Ok(())
}
