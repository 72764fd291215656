//! Error types for auto-commit modules using thiserror.

use thiserror::Error;

/// Errors from git subprocess operations.
#[derive(Error, Debug)]
pub enum GitError {
    #[error("Failed to spawn git {operation}: {source}")]
    SpawnFailed {
        operation: String,
        #[source]
        source: std::io::Error,
    },

    #[error("git {operation} timed out after {seconds} seconds")]
    Timeout { operation: String, seconds: u64 },

    #[error("git {operation} failed: {stderr}")]
    CommandFailed { operation: String, stderr: String },
}

/// Errors from the assistant host's HTTP API.
#[derive(Error, Debug)]
pub enum HostError {
    #[error("Request to host failed: {0}")]
    Request(#[source] reqwest::Error),

    #[error("Host returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Failed to decode host response: {0}")]
    Decode(String),
}

/// Errors from summary text generation.
#[derive(Error, Debug)]
pub enum GenerationError {
    #[error("Claude Code CLI not found. Install with: npm install -g @anthropic-ai/claude-code")]
    NotInstalled,

    #[error("Failed to spawn generator process: {0}")]
    SpawnFailed(#[source] std::io::Error),

    #[error("Generator timed out after {0} seconds")]
    Timeout(u64),

    #[error("Generator exited with code {code}: {stderr}")]
    NonZeroExit { code: i32, stderr: String },

    #[error("Generator reported an error: {0}")]
    ExecutionFailed(String),

    #[error("Generator returned no text")]
    Empty,

    #[error(transparent)]
    Host(#[from] HostError),
}

/// Errors from settings validation and persistence.
#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("Invalid settings: {0}")]
    InvalidPatch(String),

    #[error("Unknown settings key '{0}' (expected one of: mode, commitModel, maxCommitLength)")]
    UnknownKey(String),

    #[error("maxCommitLength must be at least {min}, got {value}")]
    MaxCommitLengthTooSmall { value: usize, min: usize },

    #[error("Failed to create settings directory {path}: {source}")]
    CreateDir {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize settings: {0}")]
    Serialize(#[source] serde_yaml::Error),

    #[error("Failed to write settings file {path}: {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },
}
