//! [`TextGenerator`] backed by the Claude Code CLI.

use async_trait::async_trait;

use crate::commit::summary::{GenerationRequest, TextGenerator};
use crate::error::GenerationError;

use super::subprocess::run_claude;

/// Generator that shells out to `claude -p`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ClaudeCliGenerator;

#[async_trait]
impl TextGenerator for ClaudeCliGenerator {
    async fn generate(&self, request: &GenerationRequest) -> Result<String, GenerationError> {
        let response = run_claude(&request.prompt, request.model.as_deref()).await?;
        parse_claude_response(&response)
    }
}

/// Claude CLI JSON envelope when using --output-format json
#[derive(serde::Deserialize)]
struct ClaudeCliResponse {
    result: String,
    #[serde(default)]
    is_error: bool,
}

/// Extract the answer text from Claude's stdout.
///
/// Falls back to the raw output when it is not a CLI envelope.
fn parse_claude_response(response: &str) -> Result<String, GenerationError> {
    let content = match serde_json::from_str::<ClaudeCliResponse>(response) {
        Ok(envelope) if envelope.is_error => {
            return Err(GenerationError::ExecutionFailed(envelope.result));
        }
        Ok(envelope) => envelope.result,
        Err(_) => response.to_string(),
    };

    if content.trim().is_empty() {
        return Err(GenerationError::Empty);
    }
    Ok(content)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_claude_cli_envelope() {
        let response = r#"{"type":"result","subtype":"success","is_error":false,"result":"Add settings loader"}"#;
        assert_eq!(parse_claude_response(response).unwrap(), "Add settings loader");
    }

    #[test]
    fn test_parse_claude_cli_error_envelope() {
        let response = r#"{"type":"result","is_error":true,"result":"Credit balance is too low"}"#;
        let err = parse_claude_response(response).unwrap_err();
        assert!(matches!(err, GenerationError::ExecutionFailed(ref m) if m.contains("Credit")));
    }

    #[test]
    fn test_parse_raw_text_fallback() {
        assert_eq!(parse_claude_response("Fix typo\n").unwrap(), "Fix typo\n");
    }

    #[test]
    fn test_parse_empty_result_is_error() {
        let response = r#"{"type":"result","is_error":false,"result":"  "}"#;
        assert!(matches!(
            parse_claude_response(response),
            Err(GenerationError::Empty)
        ));
    }
}
