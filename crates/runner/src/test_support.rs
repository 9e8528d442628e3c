// Scripted `CommandExecutor` shared by the unit tests.

use std::path::Path;
use std::sync::{Arc, Mutex};

use crate::git::worker::{CommandExecutor, CommandResult};

type Script = dyn Fn(&[String]) -> CommandResult + Send + Sync;

/// Answers each git invocation through a closure and records the arguments.
#[derive(Clone)]
pub struct ScriptedExecutor {
    calls: Arc<Mutex<Vec<Vec<String>>>>,
    script: Arc<Script>,
}

impl ScriptedExecutor {
    pub fn new(script: impl Fn(&[String]) -> CommandResult + Send + Sync + 'static) -> Self {
        Self { calls: Arc::new(Mutex::new(Vec::new())), script: Arc::new(script) }
    }

    /// Every command succeeds with empty output.
    pub fn succeeding() -> Self {
        Self::new(|_| ok(""))
    }

    pub fn calls(&self) -> Vec<Vec<String>> {
        self.calls.lock().expect("scripted calls lock poisoned").clone()
    }

    /// Invocations whose first argument is `subcommand`.
    pub fn calls_to(&self, subcommand: &str) -> Vec<Vec<String>> {
        self.calls()
            .into_iter()
            .filter(|args| args.first().map(String::as_str) == Some(subcommand))
            .collect()
    }
}

impl CommandExecutor for ScriptedExecutor {
    fn execute(
        &self,
        program: &str,
        args: &[String],
        _cwd: &Path,
    ) -> Result<CommandResult, std::io::Error> {
        assert_eq!(program, "git");
        self.calls.lock().expect("scripted calls lock poisoned").push(args.to_vec());
        Ok((self.script)(args))
    }
}

pub fn ok(stdout: &str) -> CommandResult {
    CommandResult {
        success: true,
        code: Some(0),
        stdout: stdout.to_string(),
        stderr: String::new(),
    }
}

pub fn failed(code: i32, stderr: &str) -> CommandResult {
    CommandResult {
        success: false,
        code: Some(code),
        stdout: String::new(),
        stderr: stderr.to_string(),
    }
}

pub fn args(parts: &[&str]) -> Vec<String> {
    parts.iter().map(|part| part.to_string()).collect()
}
