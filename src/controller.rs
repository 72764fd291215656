//! Turn-completion pipeline: gate checks, dedup, summary, commit.
//!
//! One controller lives for the whole host session. It owns the live settings
//! and the id of the last turn it handled, and is driven one event at a time.

use std::fmt;
use std::path::PathBuf;

use tracing::{debug, info, warn};

use crate::commit::{TextGenerator, compose, generate_summary, truncate};
use crate::error::{GitError, SettingsError};
use crate::git::{ProcessRunner, has_uncommitted_changes, is_secondary_worktree, stage_and_commit};
use crate::host::SessionClient;
use crate::settings::{AutoCommitSettings, CommitMode, SettingsPatch, SettingsStore};
use crate::turn::extract_last_turn;

/// Why a turn-completion signal did not lead to a commit attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    Disabled,
    PrimaryCheckout,
    HistoryUnavailable,
    NoTurn,
    AlreadyCommitted,
    NoChanges,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            SkipReason::Disabled => "auto-commit is disabled",
            SkipReason::PrimaryCheckout => "not in a secondary worktree",
            SkipReason::HistoryUnavailable => "session history unavailable",
            SkipReason::NoTurn => "no user message in session",
            SkipReason::AlreadyCommitted => "turn already handled",
            SkipReason::NoChanges => "working tree is clean",
        };
        f.write_str(text)
    }
}

/// Result of one pipeline run.
#[derive(Debug)]
pub enum TurnOutcome {
    Skipped(SkipReason),
    Committed { turn_id: String, message: String },
    Failed { turn_id: String, error: GitError },
}

/// Orchestrates auto-commits for one project.
pub struct AutoCommitController<S, G, R> {
    sessions: S,
    generator: G,
    runner: R,
    worktree_root: PathBuf,
    settings: SettingsStore,
    last_committed_turn: Option<String>,
}

impl<S, G, R> AutoCommitController<S, G, R>
where
    S: SessionClient,
    G: TextGenerator,
    R: ProcessRunner,
{
    /// `worktree_root` is the primary checkout; commits in `worktree` mode only
    /// happen when git reports a different top-level directory.
    pub fn new(
        sessions: S,
        generator: G,
        runner: R,
        worktree_root: impl Into<PathBuf>,
        settings: SettingsStore,
    ) -> Self {
        Self {
            sessions,
            generator,
            runner,
            worktree_root: worktree_root.into(),
            settings,
            last_committed_turn: None,
        }
    }

    /// Id of the most recently handled turn, if any.
    pub fn last_committed_turn(&self) -> Option<&str> {
        self.last_committed_turn.as_deref()
    }

    /// Handle a turn-completion signal for `session_id`.
    ///
    /// Never fails: every path ends in a skip, a commit, or a logged failure.
    pub async fn on_turn_complete(&mut self, session_id: &str) -> TurnOutcome {
        let outcome = self.run_pipeline(session_id).await;
        match &outcome {
            TurnOutcome::Skipped(reason) => debug!(session_id, "Skipping auto-commit: {}", reason),
            TurnOutcome::Committed { turn_id, message } => info!(
                session_id,
                turn_id = turn_id.as_str(),
                summary = message.lines().next().unwrap_or_default(),
                "Created auto-commit"
            ),
            TurnOutcome::Failed { turn_id, error } => warn!(
                session_id,
                turn_id = turn_id.as_str(),
                "Auto-commit failed: {}",
                error
            ),
        }
        outcome
    }

    async fn run_pipeline(&mut self, session_id: &str) -> TurnOutcome {
        let settings = self.settings.get();

        match settings.mode {
            CommitMode::Disabled => return TurnOutcome::Skipped(SkipReason::Disabled),
            CommitMode::Worktree => {
                if !is_secondary_worktree(&self.runner, &self.worktree_root).await {
                    return TurnOutcome::Skipped(SkipReason::PrimaryCheckout);
                }
            }
            CommitMode::Enabled => {}
        }

        let messages = match self.sessions.messages(session_id).await {
            Ok(messages) => messages,
            Err(e) => {
                warn!(session_id, "Failed to read session messages: {}", e);
                return TurnOutcome::Skipped(SkipReason::HistoryUnavailable);
            }
        };

        let Some(turn) = extract_last_turn(&messages) else {
            return TurnOutcome::Skipped(SkipReason::NoTurn);
        };

        if self.last_committed_turn.as_deref() == Some(turn.user_message_id.as_str()) {
            return TurnOutcome::Skipped(SkipReason::AlreadyCommitted);
        }

        // Marked before any slow work so a repeated signal cannot commit twice.
        self.last_committed_turn = Some(turn.user_message_id.clone());

        if !has_uncommitted_changes(&self.runner).await {
            return TurnOutcome::Skipped(SkipReason::NoChanges);
        }

        let summary = generate_summary(&turn, &settings, &self.generator).await;
        let message = truncate(&compose(&summary, &turn), settings.max_commit_length);

        match stage_and_commit(&self.runner, &message).await {
            Ok(()) => TurnOutcome::Committed {
                turn_id: turn.user_message_id,
                message,
            },
            Err(error) => TurnOutcome::Failed {
                turn_id: turn.user_message_id,
                error,
            },
        }
    }

    pub fn settings(&self) -> AutoCommitSettings {
        self.settings.get()
    }

    pub fn set_settings(&mut self, patch: &SettingsPatch) -> Result<AutoCommitSettings, SettingsError> {
        self.settings.set(patch)
    }

    pub fn reset_settings(&mut self) -> AutoCommitSettings {
        self.settings.reset()
    }

    pub fn init_settings(&self, patch: &SettingsPatch) -> Result<AutoCommitSettings, SettingsError> {
        self.settings.init(patch)
    }
}
