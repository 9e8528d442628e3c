// The single `contribution-adder` workflow: resolve settings, run, summarize.

use std::path::PathBuf;

use anyhow::Context;
use clap::Args;
use contribution_common::types::{RunOutcome, RunSummary};
use contribution_runner::config::{load_config, RunnerConfig};
use contribution_runner::runner::{ContributionRunner, RunnerDependencies, RunnerOptions};
use tracing::debug;

#[derive(Debug, Default, Args)]
pub struct RunArgs {
    /// Seed for deterministic commit counts (random when omitted).
    #[arg(long)]
    pub seed: Option<u64>,

    /// Directory used for the cached repository clone
    /// (defaults to .cache/contribution_repo).
    #[arg(long, value_name = "PATH")]
    pub worktree: Option<PathBuf>,

    /// Branch to commit on (defaults to main).
    #[arg(long)]
    pub branch: Option<String>,

    /// Runner settings file (defaults to ~/.contribution-adder/config.toml).
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Env file providing TARGET_REPO / CONTRIB_PAT (defaults to ./.env).
    #[arg(long, value_name = "PATH")]
    pub env_file: Option<PathBuf>,

    /// Maximum number of push attempts.
    #[arg(long, value_name = "N")]
    pub max_push_attempts: Option<u32>,

    /// Push to this URL instead of https://<token>@<host>/<repo>.git.
    #[arg(long, value_name = "URL", hide = true)]
    pub remote_url: Option<String>,

    /// Force JSON output.
    #[arg(long)]
    pub json: bool,
}

pub fn run(args: &RunArgs) -> anyhow::Result<RunSummary> {
    let settings = RunnerConfig::load(args.config.as_deref())
        .context("failed to load runner settings")?;
    let options = build_options(args, &settings);
    debug!(?options, "resolved runner options");

    let env_file = args.env_file.clone();
    let deps = RunnerDependencies::default()
        .with_config_loader(move || load_config(None, env_file.as_deref()));

    let runner = ContributionRunner::new(options, deps);
    runner.run().with_context(|| {
        format!("contribution run on branch `{}` failed", runner.options().branch)
    })
}

/// Layer command-line overrides on top of the settings file.
pub fn build_options(args: &RunArgs, settings: &RunnerConfig) -> RunnerOptions {
    let mut options = RunnerOptions::from_settings(settings);
    if let Some(worktree) = &args.worktree {
        options.worktree = worktree.clone();
    }
    if let Some(branch) = &args.branch {
        options.branch = branch.clone();
    }
    if let Some(max_attempts) = args.max_push_attempts {
        options.retry.max_attempts = max_attempts;
    }
    options.remote_override = args.remote_url.clone();
    options.seed = args.seed;
    options
}

pub fn format_human(summary: &RunSummary) -> String {
    let pair = summary
        .prime_pair
        .map(|pair| pair.to_string())
        .unwrap_or_else(|| "n/a".to_string());

    match summary.outcome {
        RunOutcome::Skipped => format!(
            "Computed non-positive commit count ({}); nothing committed or pushed.",
            summary.commit_count
        ),
        RunOutcome::Pushed => [
            format!(
                "Pushed {} commit(s) to {} ({}) on attempt {}.",
                summary.commit_count, summary.target_repo, summary.branch, summary.push_attempts
            ),
            format!("Prime pair: {pair}"),
            format!("Worktree: {}", summary.worktree),
        ]
        .join("\n"),
    }
}
