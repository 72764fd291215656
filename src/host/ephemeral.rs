//! Summary generation in a throwaway host session.
//!
//! The summary prompt runs in its own session so it never shows up in the
//! user's conversation. The session is deleted after the prompt step whatever
//! its outcome.

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::commit::summary::{GenerationRequest, TextGenerator};
use crate::error::GenerationError;
use crate::turn::join_text;

use super::client::HostClient;

const SESSION_TITLE: &str = "auto-commit summary";

/// [`TextGenerator`] backed by a temporary host session.
#[derive(Debug, Clone)]
pub struct EphemeralSessionGenerator {
    client: HostClient,
}

impl EphemeralSessionGenerator {
    pub fn new(client: HostClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl TextGenerator for EphemeralSessionGenerator {
    async fn generate(&self, request: &GenerationRequest) -> Result<String, GenerationError> {
        let session_id = self.client.create_session(SESSION_TITLE).await?;
        debug!(session_id, "Created summary session");

        let reply = self
            .client
            .prompt(&session_id, &request.prompt, request.model.as_deref())
            .await;

        if let Err(e) = self.client.delete_session(&session_id).await {
            warn!("Failed to delete summary session {}: {}", session_id, e);
        }

        let text = join_text(&reply?);

        if text.trim().is_empty() {
            return Err(GenerationError::Empty);
        }
        Ok(text)
    }
}
