// Configuration for a contribution run.
//
// Secrets: `TARGET_REPO` and `CONTRIB_PAT` from the environment, optionally
// seeded from a `.env` file.
// Tunables: `~/.contribution-adder/config.toml` (or an explicit path).

use std::collections::HashMap;
use std::fmt::{Debug, Formatter};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

pub const ENV_TARGET_REPO: &str = "TARGET_REPO";
pub const ENV_TOKEN: &str = "CONTRIB_PAT";

/// Default `.env` file name, resolved against the current directory.
pub const DOTENV_FILE: &str = ".env";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error(
        "Missing required environment variable(s): {}. Ensure they are set or provided via a .env file.",
        missing.join(", ")
    )]
    MissingConfiguration { missing: Vec<&'static str> },

    #[error("failed to load env file {}: {source}", path.display())]
    Dotenv {
        path: PathBuf,
        #[source]
        source: dotenvy::Error,
    },

    #[error("failed to read config file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

// ── Required settings ──────────────────────────────────────────────

/// Settings every run needs: which repository and how to authenticate.
#[derive(Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// `owner/name` of the target repository.
    pub target_repo: String,
    /// Access token embedded in the HTTPS remote URL.
    pub token: String,
}

impl AppConfig {
    pub fn new(target_repo: impl Into<String>, token: impl Into<String>) -> Self {
        Self { target_repo: target_repo.into(), token: token.into() }
    }
}

impl Debug for AppConfig {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("target_repo", &self.target_repo)
            .field("token", &"<redacted>")
            .finish()
    }
}

/// Resolve [`AppConfig`] from `env`, or from the process environment.
///
/// When `env` is `None` the `.env` file at `dotenv_path` (default `./.env`)
/// is merged into the process environment first; values already set are
/// never overridden and a missing file is ignored. An explicit mapping is
/// read as-is, leaving process state untouched.
pub fn load_config(
    env: Option<&HashMap<String, String>>,
    dotenv_path: Option<&Path>,
) -> Result<AppConfig, ConfigError> {
    match env {
        Some(mapping) => resolve(|name| mapping.get(name).cloned()),
        None => {
            load_dotenv_if_present(dotenv_path)?;
            resolve(|name| std::env::var(name).ok())
        }
    }
}

/// [`load_config`] against the process environment and `./.env`.
pub fn load_config_from_env() -> Result<AppConfig, ConfigError> {
    load_config(None, None)
}

/// Merge a `.env` file into the process environment without overriding.
///
/// Returns whether a file was loaded.
pub fn load_dotenv_if_present(dotenv_path: Option<&Path>) -> Result<bool, ConfigError> {
    let candidate =
        dotenv_path.map(Path::to_path_buf).unwrap_or_else(|| PathBuf::from(DOTENV_FILE));
    if !candidate.is_file() {
        return Ok(false);
    }

    dotenvy::from_path(&candidate)
        .map_err(|source| ConfigError::Dotenv { path: candidate.clone(), source })?;
    debug!(path = %candidate.display(), "loaded env file");
    Ok(true)
}

fn resolve(lookup: impl Fn(&str) -> Option<String>) -> Result<AppConfig, ConfigError> {
    let target_repo = lookup(ENV_TARGET_REPO).filter(|value| !value.is_empty());
    let token = lookup(ENV_TOKEN).filter(|value| !value.is_empty());

    match (target_repo, token) {
        (Some(target_repo), Some(token)) => Ok(AppConfig { target_repo, token }),
        (target_repo, token) => {
            let mut missing = Vec::new();
            if target_repo.is_none() {
                missing.push(ENV_TARGET_REPO);
            }
            if token.is_none() {
                missing.push(ENV_TOKEN);
            }
            Err(ConfigError::MissingConfiguration { missing })
        }
    }
}

// ── Runner settings file ───────────────────────────────────────────

/// Root directory for global settings: `~/.contribution-adder/`.
pub fn global_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(".contribution-adder"))
}

/// Path to the global settings file: `~/.contribution-adder/config.toml`.
pub fn global_config_path() -> Option<PathBuf> {
    global_dir().map(|d| d.join("config.toml"))
}

/// Tunables for a run. Every field has a default, so a partial file works.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct RunnerConfig {
    pub git: GitSettings,
    pub identity: IdentityConfig,
    /// Log file inside the working tree that each commit appends to.
    pub log_file: LogFileName,
}

impl RunnerConfig {
    /// Load from `path` when given (it must exist), else from the global
    /// settings file when present, else defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = path {
            return Self::load_from(path);
        }

        match global_config_path().filter(|p| p.is_file()) {
            Some(global) => Self::load_from(&global),
            None => Ok(Self::default()),
        }
    }

    /// Load from a specific path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|source| ConfigError::Io { path: path.to_path_buf(), source })?;
        toml::from_str(&contents)
            .map_err(|source| ConfigError::Parse { path: path.to_path_buf(), source })
    }
}

/// Remote and push behaviour.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GitSettings {
    /// Host of the HTTPS remote (defaults to `"github.com"`).
    pub remote_host: String,
    /// Git remote name (defaults to `"origin"`).
    pub remote: String,
    /// Branch to commit on (defaults to `"main"`).
    pub branch: String,
    pub max_push_attempts: u32,
    /// Upper bound for the delay between push attempts.
    pub max_backoff_secs: u64,
}

impl Default for GitSettings {
    fn default() -> Self {
        Self {
            remote_host: "github.com".into(),
            remote: "origin".into(),
            branch: "main".into(),
            max_push_attempts: 3,
            max_backoff_secs: 30,
        }
    }
}

/// Committer identity written to the repository when none is configured.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct IdentityConfig {
    pub name: String,
    pub email: String,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            name: "Contribution Adder Bot".into(),
            email: "contribution-adder@example.com".into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct LogFileName(pub String);

impl Default for LogFileName {
    fn default() -> Self {
        Self("contribution-log.txt".into())
    }
}

impl LogFileName {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn explicit_mapping_with_both_values_loads() {
        let mapping = env(&[(ENV_TARGET_REPO, "octo/repo"), (ENV_TOKEN, "ghp_token")]);
        let config = load_config(Some(&mapping), None).expect("config should load");

        assert_eq!(config, AppConfig::new("octo/repo", "ghp_token"));
    }

    #[test]
    fn missing_token_is_named_in_error() {
        let mapping = env(&[(ENV_TARGET_REPO, "octo/repo")]);
        let error = load_config(Some(&mapping), None).expect_err("token is required");

        let message = error.to_string();
        assert!(message.contains(ENV_TOKEN), "unexpected message: {message}");
        assert!(!message.contains(ENV_TARGET_REPO), "unexpected message: {message}");
    }

    #[test]
    fn every_missing_variable_is_listed() {
        let error = load_config(Some(&HashMap::new()), None).expect_err("both are required");

        match &error {
            ConfigError::MissingConfiguration { missing } => {
                assert_eq!(missing, &vec![ENV_TARGET_REPO, ENV_TOKEN]);
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(
            error.to_string(),
            "Missing required environment variable(s): TARGET_REPO, CONTRIB_PAT. \
             Ensure they are set or provided via a .env file."
        );
    }

    #[test]
    fn empty_values_count_as_missing() {
        let mapping = env(&[(ENV_TARGET_REPO, ""), (ENV_TOKEN, "ghp_token")]);
        let error = load_config(Some(&mapping), None).expect_err("empty repo is missing");

        assert!(error.to_string().contains(ENV_TARGET_REPO));
    }

    #[test]
    fn debug_output_redacts_token() {
        let config = AppConfig::new("octo/repo", "ghp_super_secret");
        let rendered = format!("{config:?}");

        assert!(rendered.contains("octo/repo"));
        assert!(!rendered.contains("ghp_super_secret"));
    }

    #[test]
    fn dotenv_file_fills_unset_variables_only() {
        let temp = tempfile::TempDir::new().expect("tempdir should be created");
        let path = temp.path().join(".env");
        std::fs::write(
            &path,
            "CONTRIB_ADDER_TEST_FROM_FILE=file-value\nCONTRIB_ADDER_TEST_PRESET=file-value\n",
        )
        .expect("env file should be written");
        std::env::set_var("CONTRIB_ADDER_TEST_PRESET", "process-value");

        let loaded = load_dotenv_if_present(Some(&path)).expect("env file should load");

        assert!(loaded);
        assert_eq!(
            std::env::var("CONTRIB_ADDER_TEST_FROM_FILE").as_deref(),
            Ok("file-value")
        );
        assert_eq!(std::env::var("CONTRIB_ADDER_TEST_PRESET").as_deref(), Ok("process-value"));
    }

    #[test]
    fn missing_dotenv_file_is_ignored() {
        let temp = tempfile::TempDir::new().expect("tempdir should be created");
        let loaded = load_dotenv_if_present(Some(&temp.path().join("absent.env")))
            .expect("missing file is not an error");
        assert!(!loaded);
    }

    #[test]
    fn env_file_supplies_required_settings() {
        let temp = tempfile::TempDir::new().expect("tempdir should be created");
        let path = temp.path().join("contrib.env");
        std::fs::write(&path, "TARGET_REPO=octo/from-file\nCONTRIB_PAT=ghp_from_file\n")
            .expect("env file should be written");
        std::env::remove_var(ENV_TARGET_REPO);
        std::env::remove_var(ENV_TOKEN);

        let config = load_config(None, Some(&path)).expect("env file provides both values");

        assert_eq!(config, AppConfig::new("octo/from-file", "ghp_from_file"));
    }

    #[test]
    fn malformed_env_file_is_reported() {
        let temp = tempfile::TempDir::new().expect("tempdir should be created");
        let path = temp.path().join("broken.env");
        std::fs::write(&path, "CONTRIB_ADDER_TEST_BROKEN='unterminated\n")
            .expect("env file should be written");

        let error = load_config(None, Some(&path)).expect_err("malformed file should fail");

        match &error {
            ConfigError::Dotenv { path: reported, .. } => assert_eq!(reported, &path),
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(error.to_string().contains("broken.env"));
    }

    #[test]
    fn runner_config_defaults() {
        let config = RunnerConfig::default();
        assert_eq!(config.git.remote_host, "github.com");
        assert_eq!(config.git.remote, "origin");
        assert_eq!(config.git.branch, "main");
        assert_eq!(config.git.max_push_attempts, 3);
        assert_eq!(config.git.max_backoff_secs, 30);
        assert_eq!(config.identity.name, "Contribution Adder Bot");
        assert_eq!(config.identity.email, "contribution-adder@example.com");
        assert_eq!(config.log_file.as_str(), "contribution-log.txt");
    }

    #[test]
    fn partial_runner_config_keeps_defaults() {
        let temp = tempfile::TempDir::new().expect("tempdir should be created");
        let path = temp.path().join("config.toml");
        std::fs::write(
            &path,
            "log_file = \"activity.txt\"\n\n[git]\nbranch = \"develop\"\nmax_push_attempts = 5\n",
        )
        .expect("config should be written");

        let config = RunnerConfig::load(Some(&path)).expect("config should parse");

        assert_eq!(config.git.branch, "develop");
        assert_eq!(config.git.max_push_attempts, 5);
        assert_eq!(config.git.remote, "origin");
        assert_eq!(config.identity, IdentityConfig::default());
        assert_eq!(config.log_file.as_str(), "activity.txt");
    }

    #[test]
    fn explicit_runner_config_path_must_exist() {
        let temp = tempfile::TempDir::new().expect("tempdir should be created");
        let error = RunnerConfig::load(Some(&temp.path().join("nope.toml")))
            .expect_err("missing explicit file should fail");
        assert!(matches!(error, ConfigError::Io { .. }));
    }

    #[test]
    fn malformed_runner_config_reports_parse_error() {
        let temp = tempfile::TempDir::new().expect("tempdir should be created");
        let path = temp.path().join("config.toml");
        std::fs::write(&path, "[git\nbranch = 1\n").expect("config should be written");

        let error = RunnerConfig::load_from(&path).expect_err("bad toml should fail");
        assert!(matches!(error, ConfigError::Parse { .. }));
    }
}
