//! HTTP client for the assistant host's session API.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::HostError;
use crate::turn::{MessageWithParts, Part, Role};

/// Address the host server listens on by default.
pub const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:4096";

/// Upper bound for one HTTP exchange, including a full summary prompt.
const REQUEST_TIMEOUT_SECS: u64 = 120;

/// Trait for reading a session's message history.
///
/// This abstraction allows mocking the host in tests.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SessionClient: Send + Sync {
    /// All messages of `session_id`, oldest first.
    async fn messages(&self, session_id: &str) -> Result<Vec<MessageWithParts>, HostError>;
}

#[derive(Deserialize)]
struct WireMessage {
    info: WireInfo,
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Deserialize)]
struct WireInfo {
    id: String,
    role: Role,
    #[serde(rename = "parentID", default)]
    parent_id: Option<String>,
}

impl From<WireMessage> for MessageWithParts {
    fn from(wire: WireMessage) -> Self {
        MessageWithParts {
            id: wire.info.id,
            role: wire.info.role,
            parent_id: wire.info.parent_id,
            parts: wire.parts,
        }
    }
}

#[derive(Deserialize)]
struct WireSession {
    id: String,
}

#[derive(Serialize)]
struct CreateSessionBody<'a> {
    title: &'a str,
}

#[derive(Serialize)]
struct PromptBody<'a> {
    parts: Vec<PromptPart<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    model: Option<ModelRef<'a>>,
}

#[derive(Serialize)]
struct PromptPart<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    text: &'a str,
}

#[derive(Debug, PartialEq, Eq, Serialize)]
struct ModelRef<'a> {
    #[serde(rename = "providerID", skip_serializing_if = "Option::is_none")]
    provider_id: Option<&'a str>,
    #[serde(rename = "modelID")]
    model_id: &'a str,
}

impl<'a> ModelRef<'a> {
    /// Split `provider/model`; a bare name leaves the provider to the host.
    fn parse(model: &'a str) -> Self {
        match model.split_once('/') {
            Some((provider, model_id)) => ModelRef {
                provider_id: Some(provider),
                model_id,
            },
            None => ModelRef {
                provider_id: None,
                model_id: model,
            },
        }
    }
}

/// Client for one project directory on the host server.
#[derive(Debug, Clone)]
pub struct HostClient {
    http: Client,
    base_url: String,
    directory: String,
}

impl HostClient {
    pub fn new(base_url: &str, directory: impl Into<String>) -> Result<Self, HostError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(HostError::Request)?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            directory: directory.into(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn scoped(&self, request: RequestBuilder) -> RequestBuilder {
        request.query(&[("directory", self.directory.as_str())])
    }

    /// Send a request and return the body of a successful response.
    async fn send(&self, request: RequestBuilder) -> Result<String, HostError> {
        let response = self
            .scoped(request)
            .send()
            .await
            .map_err(HostError::Request)?;

        let status = response.status();
        let body = response.text().await.map_err(HostError::Request)?;

        if !status.is_success() {
            return Err(HostError::Status {
                status: status.as_u16(),
                body,
            });
        }

        Ok(body)
    }

    async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, HostError> {
        let body = self.send(request).await?;
        serde_json::from_str(&body).map_err(|e| HostError::Decode(e.to_string()))
    }

    /// Fetch every message of a session, oldest first.
    pub async fn session_messages(
        &self,
        session_id: &str,
    ) -> Result<Vec<MessageWithParts>, HostError> {
        let url = self.url(&format!("/session/{session_id}/message"));
        let messages: Vec<WireMessage> = self.send_json(self.http.get(url)).await?;
        debug!(session_id, count = messages.len(), "Fetched session messages");
        Ok(messages.into_iter().map(MessageWithParts::from).collect())
    }

    /// Create a new session and return its id.
    pub async fn create_session(&self, title: &str) -> Result<String, HostError> {
        let request = self
            .http
            .post(self.url("/session"))
            .json(&CreateSessionBody { title });
        let session: WireSession = self.send_json(request).await?;
        Ok(session.id)
    }

    /// Submit one text prompt to a session and return the reply's parts.
    pub async fn prompt(
        &self,
        session_id: &str,
        text: &str,
        model: Option<&str>,
    ) -> Result<Vec<Part>, HostError> {
        let body = PromptBody {
            parts: vec![PromptPart { kind: "text", text }],
            model: model.map(ModelRef::parse),
        };
        let request = self
            .http
            .post(self.url(&format!("/session/{session_id}/message")))
            .json(&body);
        let reply: WireMessage = self.send_json(request).await?;
        Ok(reply.parts)
    }

    pub async fn delete_session(&self, session_id: &str) -> Result<(), HostError> {
        let request = self.http.delete(self.url(&format!("/session/{session_id}")));
        self.send(request).await?;
        Ok(())
    }
}

#[async_trait]
impl SessionClient for HostClient {
    async fn messages(&self, session_id: &str) -> Result<Vec<MessageWithParts>, HostError> {
        self.session_messages(session_id).await
    }
}
