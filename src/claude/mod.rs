//! Claude CLI integration.

pub mod generator;
pub mod subprocess;

pub use generator::ClaudeCliGenerator;
pub use subprocess::{check_claude_installed, run_claude};
