// Thin wrapper around the `git` executable.
//
// Every version-control call of a run goes through `GitWorker`, which hands
// the actual process spawn to a `CommandExecutor`. Tests swap the executor
// to script failures without touching the network.

use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};
use std::process::Command;

use url::Url;

const REDACTED: &str = "***";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GitCommandOutput {
    pub stdout: String,
    pub stderr: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GitWorkerError {
    EmptyAddPaths,
    SpawnFailed { command: String, message: String },
    CommandFailed { command: String, code: Option<i32>, stderr: String },
}

impl GitWorkerError {
    /// Stderr of a failed command, empty for other variants.
    pub fn stderr(&self) -> &str {
        match self {
            GitWorkerError::CommandFailed { stderr, .. } => stderr,
            _ => "",
        }
    }
}

impl Display for GitWorkerError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            GitWorkerError::EmptyAddPaths => write!(f, "git add requires at least one path"),
            GitWorkerError::SpawnFailed { command, message } => {
                write!(f, "failed to run `{command}`: {message}")
            }
            GitWorkerError::CommandFailed { command, code, stderr } => {
                write!(f, "`{command}` failed with code {:?}: {}", code, stderr.trim())
            }
        }
    }
}

impl Error for GitWorkerError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandResult {
    pub success: bool,
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

pub trait CommandExecutor {
    fn execute(
        &self,
        program: &str,
        args: &[String],
        cwd: &Path,
    ) -> Result<CommandResult, std::io::Error>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessCommandExecutor;

impl CommandExecutor for ProcessCommandExecutor {
    fn execute(
        &self,
        program: &str,
        args: &[String],
        cwd: &Path,
    ) -> Result<CommandResult, std::io::Error> {
        // Credentials live in the remote URL; never block on an interactive prompt.
        let output = Command::new(program)
            .args(args)
            .current_dir(cwd)
            .env("GIT_TERMINAL_PROMPT", "0")
            .output()?;
        Ok(CommandResult {
            success: output.status.success(),
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

#[derive(Debug, Clone)]
pub struct GitWorker<E = ProcessCommandExecutor> {
    repo_path: PathBuf,
    executor: E,
    /// Raw secret plus its URL-userinfo encoding when that differs.
    secrets: Vec<String>,
}

impl GitWorker<ProcessCommandExecutor> {
    pub fn new(repo_path: impl Into<PathBuf>) -> Self {
        Self { repo_path: repo_path.into(), executor: ProcessCommandExecutor, secrets: Vec::new() }
    }
}

impl<E: CommandExecutor> GitWorker<E> {
    pub fn with_executor(repo_path: impl Into<PathBuf>, executor: E) -> Self {
        Self { repo_path: repo_path.into(), executor, secrets: Vec::new() }
    }

    /// Scrub `secret` from every command line and stderr this worker reports,
    /// both as given and percent-encoded the way it appears in a remote URL.
    pub fn with_secret(mut self, secret: impl Into<String>) -> Self {
        let secret = secret.into();
        self.secrets.clear();
        if secret.is_empty() {
            return self;
        }
        if let Some(encoded) = userinfo_encoded(&secret).filter(|encoded| *encoded != secret) {
            self.secrets.push(encoded);
        }
        self.secrets.push(secret);
        self
    }

    pub fn repo_path(&self) -> &Path {
        &self.repo_path
    }

    pub fn executor(&self) -> &E {
        &self.executor
    }

    /// Whether the working tree already holds a clone.
    pub fn is_cloned(&self) -> bool {
        self.repo_path.join(".git").exists()
    }

    /// `git clone --origin <remote> <url> <repo_path>`.
    ///
    /// Runs from the invocation directory so a relative `repo_path` or `url`
    /// means the same thing here as for every later command.
    pub fn clone_from(&self, url: &str, remote: &str) -> Result<GitCommandOutput, GitWorkerError> {
        let args = vec![
            "clone".to_string(),
            "--origin".to_string(),
            remote.to_string(),
            url.to_string(),
            self.repo_path.to_string_lossy().into_owned(),
        ];
        self.run_in(Path::new("."), args)
    }

    pub fn fetch(&self, remote: &str) -> Result<GitCommandOutput, GitWorkerError> {
        self.run(vec!["fetch".to_string(), remote.to_string()])
    }

    pub fn checkout(&self, branch: &str) -> Result<GitCommandOutput, GitWorkerError> {
        self.run(vec!["checkout".to_string(), branch.to_string()])
    }

    /// `git checkout -B <branch> [start_point]`.
    pub fn checkout_reset(
        &self,
        branch: &str,
        start_point: Option<&str>,
    ) -> Result<GitCommandOutput, GitWorkerError> {
        let mut args = vec!["checkout".to_string(), "-B".to_string(), branch.to_string()];
        args.extend(start_point.map(str::to_string));
        self.run(args)
    }

    /// Whether `reference` resolves in the repository.
    pub fn ref_exists(&self, reference: &str) -> Result<bool, GitWorkerError> {
        let args = vec![
            "rev-parse".to_string(),
            "--verify".to_string(),
            "--quiet".to_string(),
            reference.to_string(),
        ];
        match self.run(args) {
            Ok(_) => Ok(true),
            Err(GitWorkerError::CommandFailed { .. }) => Ok(false),
            Err(error) => Err(error),
        }
    }

    pub fn pull(&self, remote: &str, branch: &str) -> Result<GitCommandOutput, GitWorkerError> {
        self.run(vec!["pull".to_string(), remote.to_string(), branch.to_string()])
    }

    pub fn set_upstream(
        &self,
        upstream: &str,
        branch: &str,
    ) -> Result<GitCommandOutput, GitWorkerError> {
        self.run(vec![
            "branch".to_string(),
            "--set-upstream-to".to_string(),
            upstream.to_string(),
            branch.to_string(),
        ])
    }

    /// Read a config value. `Ok(None)` when the key is unset.
    pub fn config_get(&self, key: &str) -> Result<Option<String>, GitWorkerError> {
        match self.run(vec!["config".to_string(), "--get".to_string(), key.to_string()]) {
            Ok(output) => {
                let value = output.stdout.trim();
                Ok((!value.is_empty()).then(|| value.to_string()))
            }
            // `git config --get` exits with 1 for a missing key.
            Err(GitWorkerError::CommandFailed { code: Some(1), .. }) => Ok(None),
            Err(error) => Err(error),
        }
    }

    /// Write a value to the repository-local config.
    pub fn config_set(&self, key: &str, value: &str) -> Result<GitCommandOutput, GitWorkerError> {
        self.run(vec!["config".to_string(), key.to_string(), value.to_string()])
    }

    pub fn add<S: AsRef<str>>(&self, paths: &[S]) -> Result<GitCommandOutput, GitWorkerError> {
        if paths.is_empty() {
            return Err(GitWorkerError::EmptyAddPaths);
        }

        let mut args = vec!["add".to_string()];
        args.extend(paths.iter().map(|path| path.as_ref().to_string()));
        self.run(args)
    }

    pub fn commit(&self, message: &str) -> Result<GitCommandOutput, GitWorkerError> {
        self.run(vec!["commit".to_string(), "-m".to_string(), message.to_string()])
    }

    /// `git push <remote> <branch>:<branch>`.
    pub fn push(&self, remote: &str, branch: &str) -> Result<GitCommandOutput, GitWorkerError> {
        self.run(vec!["push".to_string(), remote.to_string(), format!("{branch}:{branch}")])
    }

    fn run(&self, args: Vec<String>) -> Result<GitCommandOutput, GitWorkerError> {
        self.run_in(&self.repo_path, args)
    }

    fn run_in(&self, cwd: &Path, args: Vec<String>) -> Result<GitCommandOutput, GitWorkerError> {
        let command = self.redact(&format!("git {}", args.join(" ")));
        let result = self.executor.execute("git", &args, cwd).map_err(|error| {
            GitWorkerError::SpawnFailed { command: command.clone(), message: error.to_string() }
        })?;

        if result.success {
            return Ok(GitCommandOutput { stdout: result.stdout, stderr: result.stderr });
        }

        let stderr = if result.stderr.trim().is_empty() { result.stdout } else { result.stderr };

        Err(GitWorkerError::CommandFailed {
            command,
            code: result.code,
            stderr: self.redact(&stderr),
        })
    }

    fn redact(&self, text: &str) -> String {
        self.secrets
            .iter()
            .fold(text.to_string(), |text, secret| text.replace(secret.as_str(), REDACTED))
    }
}

fn userinfo_encoded(secret: &str) -> Option<String> {
    let mut url = Url::parse("https://host.invalid/").ok()?;
    url.set_username(secret).ok()?;
    Some(url.username().to_string())
}
