// Run result types shared between the runner library and the CLI.

use serde::{Deserialize, Serialize};

use crate::primes::PrimePair;

/// How a contribution run ended.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RunOutcome {
    /// Commits were created and pushed.
    Pushed,
    /// The computed commit count was not positive; nothing was committed.
    Skipped,
}

/// Summary of one contribution run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RunSummary {
    /// `owner/name` of the target repository.
    pub target_repo: String,
    pub branch: String,
    /// Local working tree the commits were created in.
    pub worktree: String,
    pub prime_pair: Option<PrimePair>,
    pub commit_count: i64,
    /// Push attempts used, including the successful one. Zero when skipped.
    pub push_attempts: u32,
    pub outcome: RunOutcome,
}

impl RunSummary {
    pub fn is_skipped(&self) -> bool {
        self.outcome == RunOutcome::Skipped
    }
}
