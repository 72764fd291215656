//! Session message model and extraction of the latest completed turn.
//!
//! A turn is the last user message in a session plus every assistant message
//! that names it as parent. Assistant replies are matched by parent id, not by
//! position, so replies interleaved with other exchanges are still collected.

use serde::{Deserialize, Serialize};

/// Author of a session message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// A single part of a message.
///
/// Only text parts carry prose; tool calls, step markers, files and any part
/// type this crate does not know about collapse into `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Part {
    /// A text part may arrive without its `text` while it is still streaming.
    Text {
        #[serde(default)]
        text: String,
    },
    #[serde(other)]
    Other,
}

impl Part {
    pub fn text(text: impl Into<String>) -> Self {
        Part::Text { text: text.into() }
    }

    fn as_text(&self) -> Option<&str> {
        match self {
            Part::Text { text } => Some(text.as_str()),
            Part::Other => None,
        }
    }
}

/// A session message together with its ordered parts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageWithParts {
    pub id: String,
    pub role: Role,
    pub parent_id: Option<String>,
    pub parts: Vec<Part>,
}

impl MessageWithParts {
    pub fn user(id: impl Into<String>, parts: Vec<Part>) -> Self {
        Self {
            id: id.into(),
            role: Role::User,
            parent_id: None,
            parts,
        }
    }

    pub fn assistant(id: impl Into<String>, parent_id: impl Into<String>, parts: Vec<Part>) -> Self {
        Self {
            id: id.into(),
            role: Role::Assistant,
            parent_id: Some(parent_id.into()),
            parts,
        }
    }

    /// Text parts in order, joined by newline. Non-text parts are skipped.
    pub fn text(&self) -> String {
        join_text(&self.parts)
    }
}

/// Join the text parts of `parts` with newlines, skipping everything else.
pub fn join_text(parts: &[Part]) -> String {
    parts
        .iter()
        .filter_map(Part::as_text)
        .collect::<Vec<_>>()
        .join("\n")
}

/// The latest user/assistant exchange in a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Turn {
    /// Id of the triggering user message; the dedup key.
    pub user_message_id: String,
    pub user_prompt: String,
    pub assistant_response: String,
}

/// Extract the most recent turn from a session's message history.
///
/// Returns `None` when the history holds no user message. A user message with
/// no replies yields an empty `assistant_response`.
pub fn extract_last_turn(messages: &[MessageWithParts]) -> Option<Turn> {
    let anchor = messages.iter().rev().find(|m| m.role == Role::User)?;

    let assistant_response = messages
        .iter()
        .filter(|m| m.role == Role::Assistant && m.parent_id.as_deref() == Some(anchor.id.as_str()))
        .map(MessageWithParts::text)
        .collect::<Vec<_>>()
        .join("\n");

    Some(Turn {
        user_message_id: anchor.id.clone(),
        user_prompt: anchor.text(),
        assistant_response,
    })
}
