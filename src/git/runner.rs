//! Git subprocess execution.
//!
//! All repository access shells out to the system `git` binary, inheriting
//! the user's git config, hooks and identity.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::debug;

use crate::error::GitError;
use crate::timeout::timeout_from_env;

/// Default timeout for a single git invocation.
const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Environment variable to override the default timeout.
const TIMEOUT_ENV_VAR: &str = "AUTO_COMMIT_GIT_TIMEOUT";

/// Captured result of a finished git command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
}

/// Trait for running git commands.
///
/// This abstraction allows replacing the git subprocess in tests.
#[async_trait]
pub trait ProcessRunner: Send + Sync {
    /// Run `git <args...>` and capture its output.
    ///
    /// A non-zero exit is reported through `CommandOutput::success`, not as an
    /// error; errors mean the command could not be run to completion.
    async fn run(&self, args: &[&str]) -> Result<CommandOutput, GitError>;
}

/// Runner that invokes the system `git` binary in a fixed directory.
#[derive(Debug, Clone)]
pub struct GitRunner {
    workdir: PathBuf,
    timeout: Duration,
}

impl GitRunner {
    /// Create a runner for `workdir` using the configured timeout.
    pub fn new(workdir: impl Into<PathBuf>) -> Self {
        Self {
            workdir: workdir.into(),
            timeout: timeout_from_env(TIMEOUT_ENV_VAR, DEFAULT_TIMEOUT_SECS),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn workdir(&self) -> &Path {
        &self.workdir
    }
}

#[async_trait]
impl ProcessRunner for GitRunner {
    async fn run(&self, args: &[&str]) -> Result<CommandOutput, GitError> {
        let operation = args.first().copied().unwrap_or("").to_string();
        debug!(?args, workdir = %self.workdir.display(), "Running git");

        let output = timeout(
            self.timeout,
            Command::new("git")
                .args(args)
                .current_dir(&self.workdir)
                .stdin(Stdio::null())
                .stdout(Stdio::piped())
                .stderr(Stdio::piped())
                .kill_on_drop(true)
                .output(),
        )
        .await
        .map_err(|_| GitError::Timeout {
            operation: operation.clone(),
            seconds: self.timeout.as_secs(),
        })?
        .map_err(|source| GitError::SpawnFailed {
            operation: operation.clone(),
            source,
        })?;

        Ok(CommandOutput {
            success: output.status.success(),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        })
    }
}
