//! Claude CLI spawning.

use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;
use tokio::time::timeout;

use crate::error::GenerationError;
use crate::timeout::timeout_from_env;

/// Default timeout for Claude subprocess execution (2 minutes).
const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Environment variable to override the default timeout.
const TIMEOUT_ENV_VAR: &str = "AUTO_COMMIT_CLAUDE_TIMEOUT";

fn get_timeout() -> Duration {
    timeout_from_env(TIMEOUT_ENV_VAR, DEFAULT_TIMEOUT_SECS)
}

/// Check if Claude Code CLI is installed and accessible.
pub async fn check_claude_installed() -> Result<(), GenerationError> {
    if which::which("claude").is_err() {
        return Err(GenerationError::NotInstalled);
    }

    let version_check = Command::new("claude")
        .arg("--version")
        .output()
        .await
        .map_err(GenerationError::SpawnFailed)?;

    if !version_check.status.success() {
        return Err(GenerationError::NotInstalled);
    }

    Ok(())
}

/// Run Claude CLI with a prompt and return its raw stdout.
///
/// Runs `claude -p <prompt> --output-format json [--model <model>]`.
///
/// # Timeout
///
/// The subprocess has a default timeout of 120 seconds, configurable via the
/// `AUTO_COMMIT_CLAUDE_TIMEOUT` environment variable (value in seconds).
/// If the timeout is exceeded, returns `GenerationError::Timeout`.
pub async fn run_claude(prompt: &str, model: Option<&str>) -> Result<String, GenerationError> {
    run_claude_binary("claude", prompt, model, get_timeout()).await
}

/// Shared subprocess helper, parameterized on the binary for tests.
pub(crate) async fn run_claude_binary(
    program: &str,
    prompt: &str,
    model: Option<&str>,
    timeout_duration: Duration,
) -> Result<String, GenerationError> {
    let mut cmd = Command::new(program);
    cmd.arg("-p")
        .arg(prompt)
        .arg("--output-format")
        .arg("json");
    if let Some(model) = model {
        cmd.arg("--model").arg(model);
    }
    cmd.stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let output = timeout(timeout_duration, cmd.output())
        .await
        .map_err(|_| GenerationError::Timeout(timeout_duration.as_secs()))?
        .map_err(GenerationError::SpawnFailed)?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr).to_string();
        let code = output.status.code().unwrap_or(-1);
        return Err(GenerationError::NonZeroExit { code, stderr });
    }

    Ok(String::from_utf8_lossy(&output.stdout).to_string())
}
