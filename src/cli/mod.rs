//! Command-line interface definitions.

use std::future::Future;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use tokio_util::sync::CancellationToken;

use crate::agent::{ResearchAgent, RunReport};
use crate::config::AgentConfig;
use crate::error::{AgentError, ConfigError};

/// Delve research agent CLI
#[derive(Parser, Debug)]
#[command(name = "delve", version, about = "Delve: an autonomous web research agent")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Answer a single question and exit
    Ask(AskArgs),
    /// Ask questions interactively until `quit`
    Repl(ReplArgs),
}

/// Options shared by every command.
#[derive(Args, Debug, Clone, Default)]
pub struct CommonArgs {
    /// Model passed to the oracle (overrides MODEL_NAME)
    #[arg(short, long)]
    pub model: Option<String>,

    /// Maximum oracle turns before forcing an answer (overrides MAX_ITERATIONS)
    #[arg(short = 'n', long)]
    pub max_iterations: Option<usize>,

    /// Log progress at info level
    #[arg(short, long)]
    pub verbose: bool,

    /// TOML config file; environment variables still take precedence
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}

/// Arguments for `delve ask`.
#[derive(Args, Debug)]
pub struct AskArgs {
    /// The research question
    pub query: String,

    #[command(flatten)]
    pub common: CommonArgs,
}

/// Arguments for `delve repl`.
#[derive(Args, Debug)]
pub struct ReplArgs {
    #[command(flatten)]
    pub common: CommonArgs,
}

impl Cli {
    pub fn common(&self) -> &CommonArgs {
        match &self.command {
            Commands::Ask(args) => &args.common,
            Commands::Repl(args) => &args.common,
        }
    }
}

impl CommonArgs {
    /// Layer flags over a base config. Flags win.
    pub fn apply(&self, mut config: AgentConfig) -> AgentConfig {
        if let Some(model) = &self.model {
            config.model = model.clone();
        }
        if let Some(max) = self.max_iterations {
            config.max_iterations = max;
        }
        if self.verbose {
            config.verbose = true;
        }
        config
    }

    /// Resolve the effective config: file (if any), then environment, then flags.
    pub fn load_config(&self) -> Result<AgentConfig, ConfigError> {
        let config = match &self.config {
            Some(path) => {
                let _ = dotenvy::dotenv();
                AgentConfig::from_toml_file(path)?.merge_env()?
            }
            None => AgentConfig::from_env()?,
        };
        let config = self.apply(config);
        config.validate()?;
        Ok(config)
    }
}

/// Log filter used when `RUST_LOG` is unset.
pub fn default_log_filter(config: &AgentConfig) -> &'static str {
    if config.verbose {
        "delve=info"
    } else {
        "warn"
    }
}

/// Run one query, canceling it if `interrupt` resolves first.
///
/// The run stops at its next iteration boundary after an interrupt. Nothing
/// outlives the call.
pub async fn run_interruptible(
    agent: &ResearchAgent,
    query: &str,
    interrupt: impl Future<Output = ()>,
) -> Result<RunReport, AgentError> {
    let cancel = CancellationToken::new();
    let run = agent.run_with_cancel(query, &cancel);
    tokio::pin!(run);

    tokio::select! {
        biased;
        _ = interrupt => {
            cancel.cancel();
            run.await
        }
        result = &mut run => result,
    }
}

/// Whether a REPL line asks to leave the loop.
pub fn is_exit_command(line: &str) -> bool {
    matches!(line.trim().to_ascii_lowercase().as_str(), "quit" | "exit" | "q")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oracle::{OracleRequest, OracleResponse, ReasoningOracle};
    use crate::tools::ToolRegistry;
    use async_trait::async_trait;
    use clap::Parser;
    use std::io::Write;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct Answering(AtomicUsize);

    #[async_trait]
    impl ReasoningOracle for Answering {
        fn name(&self) -> &str {
            "answering"
        }

        async fn respond(
            &self,
            _request: &OracleRequest<'_>,
        ) -> Result<OracleResponse, crate::error::OracleError> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(OracleResponse::text("answer"))
        }
    }

    #[test]
    fn parse_ask_with_defaults() {
        let cli = Cli::try_parse_from(["delve", "ask", "What is Rust?"]).unwrap();
        match cli.command {
            Commands::Ask(args) => {
                assert_eq!(args.query, "What is Rust?");
                assert!(args.common.model.is_none());
                assert!(args.common.max_iterations.is_none());
                assert!(!args.common.verbose);
                assert!(args.common.config.is_none());
            }
            other => panic!("expected Ask, got {other:?}"),
        }
    }

    #[test]
    fn parse_ask_with_all_options() {
        let cli = Cli::try_parse_from([
            "delve",
            "ask",
            "-m",
            "gpt-4o",
            "-n",
            "3",
            "--verbose",
            "--config",
            "delve.toml",
            "Who maintains tokio?",
        ])
        .unwrap();
        let common = cli.common().clone();
        assert_eq!(common.model.as_deref(), Some("gpt-4o"));
        assert_eq!(common.max_iterations, Some(3));
        assert!(common.verbose);
        assert_eq!(common.config, Some(PathBuf::from("delve.toml")));
    }

    #[test]
    fn parse_repl() {
        let cli = Cli::try_parse_from(["delve", "repl", "--max-iterations", "2"]).unwrap();
        assert!(matches!(cli.command, Commands::Repl(_)));
        assert_eq!(cli.common().max_iterations, Some(2));
    }

    #[test]
    fn parse_missing_subcommand_is_error() {
        assert!(Cli::try_parse_from(["delve"]).is_err());
    }

    #[test]
    fn parse_ask_missing_query_is_error() {
        assert!(Cli::try_parse_from(["delve", "ask"]).is_err());
    }

    #[test]
    fn flags_override_config() {
        let args = CommonArgs {
            model: Some("gpt-4o".into()),
            max_iterations: Some(2),
            verbose: true,
            config: None,
        };
        let config = args.apply(AgentConfig::default());
        assert_eq!(config.model, "gpt-4o");
        assert_eq!(config.max_iterations, 2);
        assert!(config.verbose);

        let untouched = CommonArgs::default().apply(AgentConfig::default());
        assert_eq!(untouched, AgentConfig::default());
    }

    #[test]
    fn exit_commands() {
        for line in ["quit", "exit", "q", "  QUIT  "] {
            assert!(is_exit_command(line), "{line}");
        }
        assert!(!is_exit_command("question"));
        assert!(!is_exit_command(""));
    }

    #[tokio::test]
    async fn interrupt_cancels_the_run() {
        let oracle = Arc::new(Answering(AtomicUsize::new(0)));
        let agent = ResearchAgent::new(oracle.clone(), ToolRegistry::new());

        let err = run_interruptible(&agent, "q", std::future::ready(()))
            .await
            .unwrap_err();

        assert!(matches!(err, AgentError::Canceled));
        assert_eq!(oracle.0.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn uninterrupted_run_returns_the_answer() {
        let oracle = Arc::new(Answering(AtomicUsize::new(0)));
        let agent = ResearchAgent::new(oracle.clone(), ToolRegistry::new());

        let report = run_interruptible(&agent, "q", std::future::pending())
            .await
            .unwrap();

        assert_eq!(report.answer, "answer");
        assert_eq!(oracle.0.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn verbose_from_config_file_enables_info_logging() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "verbose = true").unwrap();
        let args = CommonArgs {
            config: Some(file.path().to_path_buf()),
            ..CommonArgs::default()
        };

        let config = args.load_config().unwrap();

        assert!(config.verbose);
        assert_eq!(default_log_filter(&config), "delve=info");
        assert_eq!(default_log_filter(&AgentConfig::default()), "warn");
    }
}
