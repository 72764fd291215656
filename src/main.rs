//! auto-commit - CLI entry point.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tokio::io::BufReader;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use auto_commit::claude::{ClaudeCliGenerator, check_claude_installed};
use auto_commit::commit::TextGenerator;
use auto_commit::git::{GitRunner, primary_worktree_root};
use auto_commit::host::{DEFAULT_SERVER_URL, EphemeralSessionGenerator, HostClient};
use auto_commit::protocol::serve;
use auto_commit::settings::settings_path;
use auto_commit::{AutoCommitController, CommitMode, SettingsPatch, SettingsStore};

/// Environment variable holding the tracing filter.
const LOG_ENV_VAR: &str = "AUTO_COMMIT_LOG";

/// Commit every completed assistant turn.
#[derive(Parser, Debug)]
#[command(name = "auto-commit")]
#[command(about = "Commit every completed assistant turn with a prompt/response message")]
#[command(version)]
struct Cli {
    /// Project directory
    #[arg(short = 'C', long, default_value = ".", global = true)]
    directory: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Handle host events and settings tool calls on stdin, one JSON object per line
    Serve {
        /// Host server URL
        #[arg(long, env = "AUTO_COMMIT_SERVER_URL", default_value = DEFAULT_SERVER_URL)]
        server_url: String,

        /// Primary checkout used by worktree mode (defaults to the repository's
        /// main worktree as reported by git)
        #[arg(long)]
        worktree_root: Option<PathBuf>,

        /// Backend used to write the commit summary
        #[arg(long, value_enum, default_value_t = GeneratorKind::Host)]
        generator: GeneratorKind,
    },

    /// Inspect or create the settings file
    Settings {
        #[command(subcommand)]
        action: SettingsAction,
    },
}

#[derive(Subcommand, Debug)]
enum SettingsAction {
    /// Print the effective settings (defaults plus settings file)
    Show,

    /// Write a settings file with defaults plus the given values
    Init {
        #[arg(long, value_enum)]
        mode: Option<ModeArg>,

        #[arg(long)]
        commit_model: Option<String>,

        #[arg(long)]
        max_commit_length: Option<usize>,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum GeneratorKind {
    /// Throwaway session on the host server
    Host,
    /// Claude Code CLI
    Claude,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ModeArg {
    Disabled,
    Worktree,
    Enabled,
}

impl From<ModeArg> for CommitMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Disabled => CommitMode::Disabled,
            ModeArg::Worktree => CommitMode::Worktree,
            ModeArg::Enabled => CommitMode::Enabled,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let directory = std::fs::canonicalize(&cli.directory)
        .with_context(|| format!("Project directory {} not found", cli.directory.display()))?;

    match cli.command {
        Command::Serve {
            server_url,
            worktree_root,
            generator,
        } => {
            let runner = GitRunner::new(&directory);
            let worktree_root = match worktree_root {
                Some(root) => root,
                None => default_worktree_root(&runner, &directory).await,
            };
            let host = HostClient::new(&server_url, directory.display().to_string())
                .context("Failed to build host client")?;

            match generator {
                GeneratorKind::Host => {
                    let summaries = EphemeralSessionGenerator::new(host.clone());
                    run_serve(&directory, &worktree_root, runner, host, summaries).await
                }
                GeneratorKind::Claude => {
                    check_claude_installed()
                        .await
                        .context("Claude Code CLI is required for --generator claude")?;
                    run_serve(&directory, &worktree_root, runner, host, ClaudeCliGenerator).await
                }
            }
        }
        Command::Settings { action } => match action {
            SettingsAction::Show => {
                let settings = SettingsStore::load(&directory).get();
                print!(
                    "{}",
                    serde_yaml::to_string(&settings).context("Failed to render settings")?
                );
                Ok(())
            }
            SettingsAction::Init {
                mode,
                commit_model,
                max_commit_length,
            } => {
                let patch = SettingsPatch {
                    mode: mode.map(CommitMode::from),
                    commit_model: commit_model.map(Some),
                    max_commit_length,
                };
                SettingsStore::load(&directory)
                    .init(&patch)
                    .context("Failed to write settings file")?;
                println!("✓ Wrote {}", settings_path(&directory).display());
                Ok(())
            }
        },
    }
}

/// Drive the controller from stdin until the host closes the stream.
async fn run_serve<G: TextGenerator>(
    directory: &Path,
    worktree_root: &Path,
    runner: GitRunner,
    host: HostClient,
    generator: G,
) -> Result<()> {
    let settings = SettingsStore::load(directory);
    info!(
        directory = %directory.display(),
        worktree_root = %worktree_root.display(),
        mode = %settings.get().mode,
        "auto-commit serving"
    );

    let mut controller = AutoCommitController::new(
        host,
        generator,
        runner,
        worktree_root,
        settings,
    );

    serve(
        &mut controller,
        BufReader::new(tokio::io::stdin()),
        tokio::io::stdout(),
    )
    .await
    .context("Host channel closed with an error")
}

/// The primary checkout of the repository containing `directory`.
///
/// Falls back to `directory` itself when git cannot tell, which makes
/// worktree mode treat the project directory as the primary checkout.
async fn default_worktree_root(runner: &GitRunner, directory: &Path) -> PathBuf {
    match primary_worktree_root(runner).await {
        Some(root) => root,
        None => {
            warn!(
                "Could not locate the primary worktree of {}, using it as the reference",
                directory.display()
            );
            directory.to_path_buf()
        }
    }
}

/// Log to stderr; stdout carries tool responses.
fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV_VAR).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
