//! Git operations: the process runner seam, repository probes, and commit.

pub mod probe;
pub mod runner;

pub use probe::{
    has_uncommitted_changes, is_secondary_worktree, primary_worktree_root, stage_and_commit,
};
pub use runner::{CommandOutput, GitRunner, ProcessRunner};
