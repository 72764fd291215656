//! Line-delimited JSON channel between the host and the controller.
//!
//! Each input line is one of:
//!
//! ```text
//! {"type":"session.idle","properties":{"sessionID":"ses_1"}}
//! {"type":"tool","id":1,"name":"auto_commit_settings_set","args":{"mode":"enabled"}}
//! ```
//!
//! Idle events run the commit pipeline and produce no output. Tool calls get
//! exactly one response line. Other event types are ignored. Lines are handled
//! strictly in order, one at a time.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, warn};

use crate::commit::TextGenerator;
use crate::controller::AutoCommitController;
use crate::git::ProcessRunner;
use crate::host::SessionClient;
use crate::settings::{AutoCommitSettings, SettingsPatch};

pub const TOOL_GET: &str = "auto_commit_settings_get";
pub const TOOL_SET: &str = "auto_commit_settings_set";
pub const TOOL_RESET: &str = "auto_commit_settings_reset";
pub const TOOL_INIT: &str = "auto_commit_settings_init";

/// One inbound line.
#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
pub enum Inbound {
    #[serde(rename = "session.idle")]
    SessionIdle { properties: SessionIdleProperties },
    #[serde(rename = "tool")]
    Tool(ToolCall),
    #[serde(other)]
    Ignored,
}

#[derive(Debug, Deserialize)]
pub struct SessionIdleProperties {
    #[serde(rename = "sessionID")]
    pub session_id: String,
}

#[derive(Debug, Deserialize)]
pub struct ToolCall {
    /// Echoed back untouched so the host can match responses.
    #[serde(default)]
    pub id: Option<Value>,
    pub name: String,
    #[serde(default)]
    pub args: Value,
}

#[derive(Debug, PartialEq, Serialize)]
pub struct ToolResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub settings: Option<AutoCommitSettings>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ToolResponse {
    fn success(id: Option<Value>, settings: AutoCommitSettings) -> Self {
        Self {
            id,
            ok: true,
            settings: Some(settings),
            error: None,
        }
    }

    fn failure(id: Option<Value>, error: impl ToString) -> Self {
        Self {
            id,
            ok: false,
            settings: None,
            error: Some(error.to_string()),
        }
    }
}

/// Run one settings tool call against the controller.
pub fn handle_tool<S, G, R>(controller: &mut AutoCommitController<S, G, R>, call: ToolCall) -> ToolResponse
where
    S: SessionClient,
    G: TextGenerator,
    R: ProcessRunner,
{
    let ToolCall { id, name, args } = call;

    let result = match name.as_str() {
        TOOL_GET => Ok(controller.settings()),
        TOOL_RESET => Ok(controller.reset_settings()),
        TOOL_SET => SettingsPatch::from_json(&args).and_then(|patch| controller.set_settings(&patch)),
        TOOL_INIT => SettingsPatch::from_json(&args).and_then(|patch| controller.init_settings(&patch)),
        other => return ToolResponse::failure(id, format!("Unknown tool '{other}'")),
    };

    match result {
        Ok(settings) => ToolResponse::success(id, settings),
        Err(e) => ToolResponse::failure(id, e),
    }
}

/// Serve inbound lines until EOF.
///
/// Malformed lines are logged and skipped; only I/O errors on the channel
/// itself end the loop early.
pub async fn serve<S, G, R, I, O>(
    controller: &mut AutoCommitController<S, G, R>,
    input: I,
    mut output: O,
) -> std::io::Result<()>
where
    S: SessionClient,
    G: TextGenerator,
    R: ProcessRunner,
    I: AsyncBufRead + Unpin,
    O: AsyncWrite + Unpin,
{
    let mut lines = input.lines();

    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }

        let inbound: Inbound = match serde_json::from_str(&line) {
            Ok(inbound) => inbound,
            Err(e) => {
                warn!("Skipping malformed input line: {}", e);
                continue;
            }
        };

        match inbound {
            Inbound::SessionIdle { properties } => {
                controller.on_turn_complete(&properties.session_id).await;
            }
            Inbound::Tool(call) => {
                debug!(tool = call.name.as_str(), "Handling tool call");
                let response = handle_tool(controller, call);
                let mut encoded = serde_json::to_string(&response)?;
                encoded.push('\n');
                output.write_all(encoded.as_bytes()).await?;
                output.flush().await?;
            }
            Inbound::Ignored => {}
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::json;

    use crate::commit::summary::MockTextGenerator;
    use crate::error::GitError;
    use crate::git::CommandOutput;
    use crate::host::client::MockSessionClient;
    use crate::settings::{CommitMode, SettingsStore, settings_path};

    /// Reports a clean tree for every command.
    struct CleanGit;

    #[async_trait]
    impl ProcessRunner for CleanGit {
        async fn run(&self, _args: &[&str]) -> Result<CommandOutput, GitError> {
            Ok(CommandOutput {
                success: true,
                ..Default::default()
            })
        }
    }

    fn controller(
        dir: &std::path::Path,
        sessions: MockSessionClient,
        mode: CommitMode,
    ) -> AutoCommitController<MockSessionClient, MockTextGenerator, CleanGit> {
        let settings = AutoCommitSettings {
            mode,
            ..Default::default()
        };
        AutoCommitController::new(
            sessions,
            MockTextGenerator::new(),
            CleanGit,
            dir,
            SettingsStore::with_settings(dir, settings),
        )
    }

    async fn run_lines(
        controller: &mut AutoCommitController<MockSessionClient, MockTextGenerator, CleanGit>,
        input: &str,
    ) -> Vec<Value> {
        let mut output = Vec::new();
        serve(controller, input.as_bytes(), &mut output).await.unwrap();
        String::from_utf8(output)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect()
    }

    #[test]
    fn test_inbound_decoding() {
        let idle: Inbound =
            serde_json::from_str(r#"{"type":"session.idle","properties":{"sessionID":"ses_9"}}"#)
                .unwrap();
        assert!(matches!(idle, Inbound::SessionIdle { ref properties } if properties.session_id == "ses_9"));

        let other: Inbound =
            serde_json::from_str(r#"{"type":"message.updated","properties":{}}"#).unwrap();
        assert!(matches!(other, Inbound::Ignored));
    }

    #[tokio::test]
    async fn test_idle_events_are_dispatched_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let mut sessions = MockSessionClient::new();
        let mut seq = mockall::Sequence::new();
        for id in ["ses_a", "ses_b"] {
            sessions
                .expect_messages()
                .withf(move |s| s == id)
                .times(1)
                .in_sequence(&mut seq)
                .returning(|_| Ok(Vec::new()));
        }
        let mut controller = controller(dir.path(), sessions, CommitMode::Enabled);

        let responses = run_lines(
            &mut controller,
            concat!(
                r#"{"type":"session.idle","properties":{"sessionID":"ses_a"}}"#,
                "\n",
                r#"{"type":"file.edited","properties":{"file":"a.rs"}}"#,
                "\n",
                r#"{"type":"session.idle","properties":{"sessionID":"ses_b"}}"#,
                "\n"
            ),
        )
        .await;

        assert!(responses.is_empty());
    }

    #[tokio::test]
    async fn test_tool_calls_get_one_response_each() {
        let dir = tempfile::tempdir().unwrap();
        let mut controller = controller(dir.path(), MockSessionClient::new(), CommitMode::Worktree);

        let responses = run_lines(
            &mut controller,
            concat!(
                r#"{"type":"tool","id":1,"name":"auto_commit_settings_get"}"#,
                "\n",
                r#"{"type":"tool","id":2,"name":"auto_commit_settings_set","args":{"mode":"enabled","maxCommitLength":500}}"#,
                "\n",
                r#"{"type":"tool","id":3,"name":"auto_commit_settings_set","args":{"maxCommitLength":5}}"#,
                "\n",
                "not json\n",
                r#"{"type":"tool","id":4,"name":"auto_commit_settings_delete"}"#,
                "\n"
            ),
        )
        .await;

        assert_eq!(responses.len(), 4);
        assert_eq!(
            responses[0],
            json!({"id": 1, "ok": true, "settings": {"mode": "worktree", "maxCommitLength": 10000}})
        );
        assert_eq!(
            responses[1],
            json!({"id": 2, "ok": true, "settings": {"mode": "enabled", "maxCommitLength": 500}})
        );
        assert_eq!(responses[2]["ok"], json!(false));
        assert!(responses[2]["error"].as_str().unwrap().contains("at least 100"));
        assert_eq!(responses[3]["ok"], json!(false));
        assert!(responses[3]["error"].as_str().unwrap().contains("auto_commit_settings_delete"));

        assert_eq!(controller.settings().max_commit_length, 500);
    }

    #[tokio::test]
    async fn test_init_then_reset_picks_up_written_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut controller = controller(dir.path(), MockSessionClient::new(), CommitMode::Disabled);

        let init = handle_tool(
            &mut controller,
            ToolCall {
                id: None,
                name: TOOL_INIT.to_string(),
                args: json!({"mode": "enabled", "commitModel": "anthropic/claude-haiku"}),
            },
        );
        assert!(init.ok);
        assert!(settings_path(dir.path()).exists());
        assert_eq!(controller.settings().mode, CommitMode::Disabled);

        let reset = handle_tool(
            &mut controller,
            ToolCall {
                id: None,
                name: TOOL_RESET.to_string(),
                args: Value::Null,
            },
        );
        let settings = reset.settings.unwrap();
        assert_eq!(settings.mode, CommitMode::Enabled);
        assert_eq!(settings.commit_model.as_deref(), Some("anthropic/claude-haiku"));
    }
}
