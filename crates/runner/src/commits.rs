// Commit generation: one appended log line and one commit per iteration.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;

use chrono::{DateTime, SecondsFormat, Utc};
use tracing::debug;

use crate::error::RunnerError;
use crate::git::worker::{CommandExecutor, GitWorker};

/// `{timestamp} - automated contribution {index}/{total}`.
pub fn log_entry(timestamp: DateTime<Utc>, index: i64, total: i64) -> String {
    format!(
        "{} - automated contribution {index}/{total}",
        timestamp.to_rfc3339_opts(SecondsFormat::Micros, false)
    )
}

/// `chore: automated contribution {index}/{total}`.
pub fn commit_message(index: i64, total: i64) -> String {
    format!("chore: automated contribution {index}/{total}")
}

/// Append `entry` plus a newline to `path`, creating the file if needed.
pub fn append_log_entry(path: &Path, entry: &str) -> std::io::Result<()> {
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    writeln!(file, "{entry}")
}

/// Create `count` commits in order, each appending one line to `log_file`
/// (relative to the worktree). Returns the number of commits created.
///
/// A non-positive `count` creates nothing.
pub fn generate_commits<E: CommandExecutor>(
    worker: &GitWorker<E>,
    log_file: &str,
    count: i64,
) -> Result<i64, RunnerError> {
    if count <= 0 {
        return Ok(0);
    }

    let log_path = worker.repo_path().join(log_file);
    if let Some(parent) = log_path.parent() {
        std::fs::create_dir_all(parent)
            .map_err(|source| RunnerError::Log { path: log_path.clone(), source })?;
    }

    for index in 1..=count {
        let entry = log_entry(Utc::now(), index, count);
        append_log_entry(&log_path, &entry)
            .map_err(|source| RunnerError::Log { path: log_path.clone(), source })?;

        let message = commit_message(index, count);
        worker
            .add(&[log_file])
            .and_then(|_| worker.commit(&message))
            .map_err(|source| RunnerError::Commit { index, total: count, source })?;
        debug!(index, total = count, message = message.as_str(), "created commit");
    }

    Ok(count)
}
