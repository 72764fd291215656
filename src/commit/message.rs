//! Commit message assembly and length bounding.

use tracing::warn;

use crate::turn::Turn;

/// Appended to a message that was cut to fit the configured bound.
pub const TRUNCATION_MARKER: &str = "\n...";

/// Assemble the commit message for a turn.
///
/// Produces:
/// ```text
/// {summary}
///
/// ## User Prompt
/// {user prompt}
///
/// ## LLM Response
/// {assistant response}
/// ```
///
/// Prompt and response are included verbatim.
pub fn compose(summary: &str, turn: &Turn) -> String {
    format!(
        "{summary}\n\n## User Prompt\n{}\n\n## LLM Response\n{}",
        turn.user_prompt, turn.assistant_response
    )
}

/// Bound `message` to `max_len` characters.
///
/// Lengths count chars, so a cut never splits a UTF-8 sequence. An oversized
/// message keeps its first `max_len - 4` chars and gains `"\n..."`, landing
/// on exactly `max_len`.
pub fn truncate(message: &str, max_len: usize) -> String {
    if message.chars().count() <= max_len {
        return message.to_string();
    }

    let marker_len = TRUNCATION_MARKER.chars().count();
    if max_len < marker_len {
        warn!(
            "Commit length bound {} is shorter than the truncation marker",
            max_len
        );
        return TRUNCATION_MARKER.chars().take(max_len).collect();
    }

    let mut truncated: String = message.chars().take(max_len - marker_len).collect();
    truncated.push_str(TRUNCATION_MARKER);
    truncated
}

#[cfg(test)]
mod tests {
    use super::*;

    fn turn(prompt: &str, response: &str) -> Turn {
        Turn {
            user_message_id: "u1".to_string(),
            user_prompt: prompt.to_string(),
            assistant_response: response.to_string(),
        }
    }

    #[test]
    fn test_compose_exact_layout() {
        let message = compose("Add a file", &turn("Add file", "Done"));
        assert_eq!(
            message,
            "Add a file\n\n## User Prompt\nAdd file\n\n## LLM Response\nDone"
        );
    }

    #[test]
    fn test_compose_keeps_content_verbatim() {
        let message = compose(
            "Fix",
            &turn("## not a header\n`code`", "line1\n\n\nline2 \"quoted\""),
        );
        assert!(message.contains("## User Prompt\n## not a header\n`code`\n\n"));
        assert!(message.ends_with("## LLM Response\nline1\n\n\nline2 \"quoted\""));
    }

    #[test]
    fn test_compose_with_empty_response() {
        let message = compose("Summary", &turn("prompt", ""));
        assert!(message.ends_with("## LLM Response\n"));
    }

    #[test]
    fn test_truncate_leaves_short_message() {
        assert_eq!(truncate("short", 100), "short");
        let exact = "x".repeat(100);
        assert_eq!(truncate(&exact, 100), exact);
    }

    #[test]
    fn test_truncate_is_exact() {
        let message = "abcdefghij".repeat(30);
        let result = truncate(&message, 100);

        assert_eq!(result.chars().count(), 100);
        assert!(result.ends_with("\n..."));
        assert_eq!(&result[..96], &message[..96]);
    }

    #[test]
    fn test_truncate_counts_chars_not_bytes() {
        let message = "é".repeat(150);
        let result = truncate(&message, 100);

        assert_eq!(result.chars().count(), 100);
        assert!(result.starts_with(&"é".repeat(96)));
        assert!(result.ends_with(TRUNCATION_MARKER));
    }

    #[test]
    fn test_truncate_below_marker_length_does_not_panic() {
        assert_eq!(truncate("long message", 2), "\n.");
        assert_eq!(truncate("long message", 0), "");
        assert_eq!(truncate("long message", 4), "\n...");
    }
}
