//! auto-commit - commit every completed assistant turn.
//!
//! # Overview
//!
//! When the coding assistant finishes a turn, auto-commit checks the working
//! tree and, if anything changed, commits it with a message built from an
//! LLM-written summary line, the user's prompt and the assistant's response.
//! Whether and where this happens is controlled by a small settings object
//! persisted at `.opencode/auto-commit.settings.yml`.

pub mod claude;
pub mod commit;
pub mod controller;
pub mod error;
pub mod git;
pub mod host;
pub mod protocol;
pub mod settings;
mod timeout;
pub mod turn;

// Re-export commonly used types
pub use controller::{AutoCommitController, SkipReason, TurnOutcome};
pub use error::{GenerationError, GitError, HostError, SettingsError};
pub use settings::{AutoCommitSettings, CommitMode, SettingsPatch, SettingsStore};
pub use turn::{MessageWithParts, Part, Role, Turn, extract_last_turn};
