//! One-line commit summaries via a text-generation delegate.
//!
//! Summary generation never fails from the caller's point of view: any
//! delegate error or empty answer becomes [`FALLBACK_SUMMARY`].

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::error::GenerationError;
use crate::settings::AutoCommitSettings;
use crate::turn::Turn;

/// Summary used whenever the delegate cannot produce one.
pub const FALLBACK_SUMMARY: &str = "Auto-commit";

/// A single text-generation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    pub prompt: String,
    /// Model identifier; `None` lets the generator use its default model.
    pub model: Option<String>,
}

/// Trait for generating text from a prompt.
///
/// This abstraction allows mocking the LLM in tests.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Generate a response and return its text.
    async fn generate(&self, request: &GenerationRequest) -> Result<String, GenerationError>;
}

/// Build the summary instruction for a turn.
pub fn build_summary_prompt(turn: &Turn) -> String {
    format!(
        r#"Summarize the following coding session exchange as a git commit subject line.

Rules:
- A single line of at most 50 characters
- Imperative mood ("Add", "Fix", "Refactor")
- No trailing period, no quotes, no prefixes

## User Prompt
{}

## LLM Response
{}

Return ONLY the summary text, nothing else."#,
        turn.user_prompt, turn.assistant_response
    )
}

/// Produce a commit summary for `turn`.
///
/// Uses `settings.commit_model` when set. The answer is trimmed and cut to its
/// first non-empty line.
pub async fn generate_summary<G>(turn: &Turn, settings: &AutoCommitSettings, generator: &G) -> String
where
    G: TextGenerator + ?Sized,
{
    let request = GenerationRequest {
        prompt: build_summary_prompt(turn),
        model: settings.commit_model.clone(),
    };
    debug!("Summary prompt length: {} chars", request.prompt.len());

    match generator.generate(&request).await {
        Ok(text) => match first_line(&text) {
            Some(line) => line.to_string(),
            None => {
                warn!("Summary generator returned no text, using fallback");
                FALLBACK_SUMMARY.to_string()
            }
        },
        Err(e) => {
            warn!("Summary generation failed: {}, using fallback", e);
            FALLBACK_SUMMARY.to_string()
        }
    }
}

fn first_line(text: &str) -> Option<&str> {
    text.lines().map(str::trim).find(|line| !line.is_empty())
}
