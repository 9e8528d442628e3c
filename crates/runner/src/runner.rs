// End-to-end contribution workflow.
//
// config → prepare working copy → pick primes → commit loop → push with retry.
// Collaborators that tests need to control (config loading, prime picking and
// summing, sleeping, the git executable) are injected at construction.

use std::path::PathBuf;
use std::time::Duration;

use contribution_common::primes::{pick_two_primes, sum_primes, PrimeError, PrimePair};
use contribution_common::types::{RunOutcome, RunSummary};
use tracing::info;

use crate::commits::generate_commits;
use crate::config::{load_config_from_env, AppConfig, ConfigError, IdentityConfig, RunnerConfig};
use crate::error::RunnerError;
use crate::git::repository::{build_remote_url, prepare_repository, PrepareOptions};
use crate::git::worker::{CommandExecutor, GitWorker, ProcessCommandExecutor};
use crate::push::{push_with_retry, RetryPolicy};

/// Working tree used when none is given, relative to the invocation directory.
pub const DEFAULT_WORKTREE: &str = ".cache/contribution_repo";

pub type ConfigLoader = Box<dyn Fn() -> Result<AppConfig, ConfigError>>;
pub type PrimePicker = Box<dyn Fn(Option<u64>) -> Result<PrimePair, PrimeError>>;
pub type PrimeSummer = Box<dyn Fn(PrimePair) -> i64>;
pub type Sleeper = Box<dyn Fn(Duration)>;

/// Replaceable collaborators of [`ContributionRunner`].
pub struct RunnerDependencies {
    pub config_loader: ConfigLoader,
    pub prime_picker: PrimePicker,
    pub prime_summer: PrimeSummer,
    pub sleep: Sleeper,
}

impl Default for RunnerDependencies {
    fn default() -> Self {
        Self {
            config_loader: Box::new(load_config_from_env),
            prime_picker: Box::new(pick_two_primes),
            prime_summer: Box::new(sum_primes),
            sleep: Box::new(std::thread::sleep),
        }
    }
}

impl RunnerDependencies {
    pub fn with_config_loader(
        mut self,
        loader: impl Fn() -> Result<AppConfig, ConfigError> + 'static,
    ) -> Self {
        self.config_loader = Box::new(loader);
        self
    }

    pub fn with_prime_picker(
        mut self,
        picker: impl Fn(Option<u64>) -> Result<PrimePair, PrimeError> + 'static,
    ) -> Self {
        self.prime_picker = Box::new(picker);
        self
    }

    pub fn with_prime_summer(mut self, summer: impl Fn(PrimePair) -> i64 + 'static) -> Self {
        self.prime_summer = Box::new(summer);
        self
    }

    pub fn with_sleep(mut self, sleep: impl Fn(Duration) + 'static) -> Self {
        self.sleep = Box::new(sleep);
        self
    }
}

/// Where and how a run operates.
#[derive(Debug, Clone, PartialEq)]
pub struct RunnerOptions {
    pub worktree: PathBuf,
    pub branch: String,
    pub remote: String,
    pub remote_host: String,
    /// Replaces the computed `https://{token}@{host}/...` URL when set.
    pub remote_override: Option<String>,
    pub seed: Option<u64>,
    pub retry: RetryPolicy,
    pub identity: IdentityConfig,
    pub log_file: String,
}

impl Default for RunnerOptions {
    fn default() -> Self {
        Self::from_settings(&RunnerConfig::default())
    }
}

impl RunnerOptions {
    pub fn from_settings(settings: &RunnerConfig) -> Self {
        Self {
            worktree: PathBuf::from(DEFAULT_WORKTREE),
            branch: settings.git.branch.clone(),
            remote: settings.git.remote.clone(),
            remote_host: settings.git.remote_host.clone(),
            remote_override: None,
            seed: None,
            retry: RetryPolicy::new(
                settings.git.max_push_attempts,
                Duration::from_secs(settings.git.max_backoff_secs),
            ),
            identity: settings.identity.clone(),
            log_file: settings.log_file.as_str().to_string(),
        }
    }
}

/// Clones (or reuses) the target repository, adds commits and pushes them.
pub struct ContributionRunner<E = ProcessCommandExecutor> {
    options: RunnerOptions,
    deps: RunnerDependencies,
    executor: E,
}

impl ContributionRunner<ProcessCommandExecutor> {
    pub fn new(options: RunnerOptions, deps: RunnerDependencies) -> Self {
        Self { options, deps, executor: ProcessCommandExecutor }
    }
}

impl<E: CommandExecutor + Clone> ContributionRunner<E> {
    pub fn with_executor(options: RunnerOptions, deps: RunnerDependencies, executor: E) -> Self {
        Self { options, deps, executor }
    }

    pub fn options(&self) -> &RunnerOptions {
        &self.options
    }

    /// Execute the workflow once.
    pub fn run(&self) -> Result<RunSummary, RunnerError> {
        let options = &self.options;
        let config = (self.deps.config_loader)()?;
        let remote_url =
            build_remote_url(&config, &options.remote_host, options.remote_override.as_deref())?;

        let worker = GitWorker::with_executor(&options.worktree, self.executor.clone())
            .with_secret(config.token.as_str());
        let prepare = PrepareOptions {
            target_repo: &config.target_repo,
            remote: &options.remote,
            branch: &options.branch,
            identity: &options.identity,
        };
        prepare_repository(&worker, &remote_url, &prepare)?;

        let prime_pair = (self.deps.prime_picker)(options.seed)?;
        let commit_count = (self.deps.prime_summer)(prime_pair);
        let mut summary = RunSummary {
            target_repo: config.target_repo.clone(),
            branch: options.branch.clone(),
            worktree: options.worktree.display().to_string(),
            prime_pair: Some(prime_pair),
            commit_count,
            push_attempts: 0,
            outcome: RunOutcome::Skipped,
        };

        if commit_count <= 0 {
            info!(commit_count, "computed non-positive commit count; skipping run");
            return Ok(summary);
        }

        info!(commit_count, %prime_pair, "generating commits");
        generate_commits(&worker, &options.log_file, commit_count)?;

        summary.push_attempts = push_with_retry(
            &worker,
            &options.remote,
            &options.branch,
            &options.retry,
            self.deps.sleep.as_ref(),
        )?;
        summary.outcome = RunOutcome::Pushed;
        Ok(summary)
    }
}
