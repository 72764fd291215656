//! Repository probes and the stage+commit step.
//!
//! Probes never fail: anything that stops git from answering is read as the
//! safe negative (not a worktree, nothing to commit).

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::GitError;

use super::runner::{CommandOutput, ProcessRunner};

/// Whether the runner's directory belongs to a worktree other than the one
/// rooted at `reference_dir`.
///
/// Compares `git rev-parse --show-toplevel` with `reference_dir` after
/// canonicalizing both. Returns `false` when git cannot answer.
pub async fn is_secondary_worktree<R>(runner: &R, reference_dir: &Path) -> bool
where
    R: ProcessRunner + ?Sized,
{
    let output = match runner.run(&["rev-parse", "--show-toplevel"]).await {
        Ok(output) if output.success => output,
        Ok(output) => {
            debug!("git rev-parse failed: {}", output.stderr.trim());
            return false;
        }
        Err(e) => {
            debug!("Worktree probe failed: {}", e);
            return false;
        }
    };

    let toplevel = output.stdout.trim();
    if toplevel.is_empty() {
        return false;
    }

    let toplevel = canonical(Path::new(toplevel));
    let reference = canonical(reference_dir);
    debug!(toplevel = %toplevel.display(), reference = %reference.display(), "Worktree probe");
    toplevel != reference
}

/// Top-level directory of the repository's primary checkout.
///
/// Linked worktrees share one common git directory that lives inside the
/// primary checkout, so its parent is the primary top level. Returns `None`
/// when git cannot answer or the common directory is not a `.git` directory
/// (bare repositories, submodules).
pub async fn primary_worktree_root<R>(runner: &R) -> Option<PathBuf>
where
    R: ProcessRunner + ?Sized,
{
    let output = match runner
        .run(&["rev-parse", "--path-format=absolute", "--git-common-dir"])
        .await
    {
        Ok(output) if output.success => output,
        Ok(output) => {
            debug!("git rev-parse --git-common-dir failed: {}", output.stderr.trim());
            return None;
        }
        Err(e) => {
            debug!("Primary worktree lookup failed: {}", e);
            return None;
        }
    };

    let common_dir = Path::new(output.stdout.trim());
    if common_dir.file_name().is_none_or(|name| name != ".git") {
        return None;
    }
    common_dir.parent().map(canonical)
}

/// Whether `git status --porcelain` reports anything. Returns `false` when git
/// cannot answer.
pub async fn has_uncommitted_changes<R>(runner: &R) -> bool
where
    R: ProcessRunner + ?Sized,
{
    match runner.run(&["status", "--porcelain"]).await {
        Ok(output) if output.success => !output.stdout.trim().is_empty(),
        Ok(output) => {
            debug!("git status failed: {}", output.stderr.trim());
            false
        }
        Err(e) => {
            debug!("Change probe failed: {}", e);
            false
        }
    }
}

/// Stage every working-tree change and commit it with `message`.
///
/// Steps:
/// 1. `git add -A`
/// 2. `git commit --cleanup=verbatim -m <message>`
///
/// Verbatim cleanup keeps prompt and response text byte for byte; git would
/// otherwise collapse blank lines inside them.
pub async fn stage_and_commit<R>(runner: &R, message: &str) -> Result<(), GitError>
where
    R: ProcessRunner + ?Sized,
{
    run_checked(runner, &["add", "-A"], "add").await?;
    run_checked(runner, &["commit", "--cleanup=verbatim", "-m", message], "commit").await?;
    Ok(())
}

/// Run a git command and turn a non-zero exit into a descriptive error.
async fn run_checked<R>(
    runner: &R,
    args: &[&str],
    operation: &str,
) -> Result<CommandOutput, GitError>
where
    R: ProcessRunner + ?Sized,
{
    let output = runner.run(args).await?;
    if !output.success {
        // `git commit` reports "nothing to commit" on stdout.
        let detail = if output.stderr.trim().is_empty() {
            output.stdout.trim()
        } else {
            output.stderr.trim()
        };
        return Err(GitError::CommandFailed {
            operation: operation.to_string(),
            stderr: detail.to_string(),
        });
    }
    Ok(output)
}

fn canonical(path: &Path) -> PathBuf {
    fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}
