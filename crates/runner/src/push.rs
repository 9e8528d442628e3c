// Push with bounded retries and capped exponential backoff.
//
// Delay before attempt n+1 is min(2^(n-1), cap) seconds: 1s, 2s, 4s, ...
// Nothing sleeps after the final attempt.

use std::time::Duration;

use tracing::{info, warn};

use crate::error::RunnerError;
use crate::git::worker::{CommandExecutor, GitWorker, GitWorkerError};

/// Attempt budget and backoff cap for pushing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self { max_attempts: 3, max_delay: Duration::from_secs(30) }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, max_delay: Duration) -> Self {
        Self { max_attempts, max_delay }
    }

    /// Delay after a failed `attempt` (1-based).
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        let exp = attempt.saturating_sub(1).min(30); // cap exponent to avoid overflow
        Duration::from_secs(1u64 << exp).min(self.max_delay)
    }

    fn attempts(&self) -> u32 {
        self.max_attempts.max(1)
    }
}

/// Push `branch` to `remote` as `<branch>:<branch>`, retrying per `policy`.
///
/// Returns the attempt number that succeeded. After the last failed attempt
/// the most recent git error is returned inside [`RunnerError::PushExhausted`].
pub fn push_with_retry<E: CommandExecutor>(
    worker: &GitWorker<E>,
    remote: &str,
    branch: &str,
    policy: &RetryPolicy,
    sleep: &dyn Fn(Duration),
) -> Result<u32, RunnerError> {
    let attempts = policy.attempts();
    let mut last_error: Option<GitWorkerError> = None;

    for attempt in 1..=attempts {
        match worker.push(remote, branch) {
            Ok(_) => {
                info!(attempt, remote, branch, "pushed changes");
                return Ok(attempt);
            }
            Err(error) => {
                warn!(attempt, max_attempts = attempts, %error, "push attempt failed");
                last_error = Some(error);
                if attempt < attempts {
                    sleep(policy.backoff_delay(attempt));
                }
            }
        }
    }

    let source = last_error.unwrap_or_else(|| GitWorkerError::CommandFailed {
        command: format!("git push {remote} {branch}:{branch}"),
        code: None,
        stderr: String::new(),
    });
    Err(RunnerError::PushExhausted {
        remote: remote.to_string(),
        branch: branch.to_string(),
        attempts,
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{failed, ok, ScriptedExecutor};
    use std::cell::RefCell;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    fn flaky_push(failures: u32) -> (ScriptedExecutor, Arc<AtomicU32>) {
        let count = Arc::new(AtomicU32::new(0));
        let seen = Arc::clone(&count);
        let executor = ScriptedExecutor::new(move |_| {
            let n = seen.fetch_add(1, Ordering::SeqCst) + 1;
            if n <= failures {
                failed(1, &format!("simulated failure {n}\n"))
            } else {
                ok("")
            }
        });
        (executor, count)
    }

    #[test]
    fn backoff_doubles_from_one_second() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.backoff_delay(1), Duration::from_secs(1));
        assert_eq!(policy.backoff_delay(2), Duration::from_secs(2));
        assert_eq!(policy.backoff_delay(3), Duration::from_secs(4));
        assert_eq!(policy.backoff_delay(5), Duration::from_secs(16));
    }

    #[test]
    fn backoff_caps_at_max_delay() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.backoff_delay(6), Duration::from_secs(30));
        assert_eq!(policy.backoff_delay(64), Duration::from_secs(30));
        assert_eq!(policy.backoff_delay(u32::MAX), Duration::from_secs(30));

        let tight = RetryPolicy::new(5, Duration::from_secs(3));
        assert_eq!(tight.backoff_delay(3), Duration::from_secs(3));
    }

    #[test]
    fn first_success_stops_immediately() {
        let (executor, count) = flaky_push(0);
        let worker = GitWorker::with_executor("/tmp/repo", executor);
        let sleeps = RefCell::new(Vec::new());

        let attempt = push_with_retry(&worker, "origin", "main", &RetryPolicy::default(), &|d| {
            sleeps.borrow_mut().push(d)
        })
        .expect("push should succeed");

        assert_eq!(attempt, 1);
        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert!(sleeps.borrow().is_empty());
    }

    #[test]
    fn recovers_after_two_failures() {
        let (executor, count) = flaky_push(2);
        let worker = GitWorker::with_executor("/tmp/repo", executor);
        let sleeps = RefCell::new(Vec::new());

        let attempt = push_with_retry(&worker, "origin", "main", &RetryPolicy::default(), &|d| {
            sleeps.borrow_mut().push(d)
        })
        .expect("third attempt should succeed");

        assert_eq!(attempt, 3);
        assert_eq!(count.load(Ordering::SeqCst), 3);
        assert_eq!(*sleeps.borrow(), vec![Duration::from_secs(1), Duration::from_secs(2)]);
    }

    #[test]
    fn exhausted_attempts_return_last_error_without_trailing_sleep() {
        let (executor, count) = flaky_push(u32::MAX);
        let worker = GitWorker::with_executor("/tmp/repo", executor);
        let sleeps = RefCell::new(Vec::new());

        let error = push_with_retry(&worker, "origin", "main", &RetryPolicy::default(), &|d| {
            sleeps.borrow_mut().push(d)
        })
        .expect_err("all attempts fail");

        assert_eq!(count.load(Ordering::SeqCst), 3);
        assert_eq!(sleeps.borrow().len(), 2);
        match error {
            RunnerError::PushExhausted { attempts, source, .. } => {
                assert_eq!(attempts, 3);
                assert_eq!(source.stderr(), "simulated failure 3\n");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn zero_attempt_budget_still_pushes_once() {
        let (executor, count) = flaky_push(0);
        let worker = GitWorker::with_executor("/tmp/repo", executor);

        let policy = RetryPolicy::new(0, Duration::from_secs(30));
        push_with_retry(&worker, "origin", "main", &policy, &|_| {}).expect("push succeeds");

        assert_eq!(count.load(Ordering::SeqCst), 1);
    }
}
