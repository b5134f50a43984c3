//! Delve CLI binary entry point.

use std::io::Write;
use std::sync::Arc;

use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

use delve::agent::{ResearchAgent, RunEvent, RunEventPayload};
use delve::cli::{default_log_filter, is_exit_command, run_interruptible, Cli, Commands};
use delve::config::AgentConfig;
use delve::error::AgentError;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let config = match cli.common().load_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };
    init_tracing(&config);

    let result = match cli.command {
        Commands::Ask(args) => handle_ask(&config, &args.query).await,
        Commands::Repl(_) => handle_repl(&config).await,
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn init_tracing(config: &AgentConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_log_filter(config)));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn build_agent(config: &AgentConfig) -> Result<ResearchAgent, AgentError> {
    let agent = ResearchAgent::from_config(config)?;
    Ok(agent.with_event_sink(Arc::new(print_event)))
}

/// Resolves on the first Ctrl-C. A failed handler install never resolves.
async fn ctrl_c() {
    if tokio::signal::ctrl_c().await.is_err() {
        std::future::pending::<()>().await;
    }
}

async fn handle_ask(config: &AgentConfig, query: &str) -> Result<(), AgentError> {
    let agent = build_agent(config)?;
    let report = run_interruptible(&agent, query, ctrl_c()).await?;
    println!("{}", report.answer);
    Ok(())
}

async fn handle_repl(config: &AgentConfig) -> Result<(), AgentError> {
    let agent = build_agent(config)?;
    println!("Delve research agent ({}). Type 'quit' to exit.", config.model);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("\nQuestion: ");
        let _ = std::io::stdout().flush();

        let line = tokio::select! {
            line = lines.next_line() => line,
            _ = tokio::signal::ctrl_c() => break,
        };
        let Ok(Some(line)) = line else { break };

        let query = line.trim();
        if query.is_empty() {
            continue;
        }
        if is_exit_command(query) {
            break;
        }

        match run_interruptible(&agent, query, ctrl_c()).await {
            Ok(report) => {
                println!("\n{}", report.answer);
                if config.verbose && !report.notes.is_empty() {
                    eprintln!("\n{}", report.notes.summary());
                }
            }
            Err(e) => eprintln!("Error: {e}"),
        }
    }

    println!("Goodbye!");
    Ok(())
}

fn print_event(event: RunEvent) {
    match &event.payload {
        RunEventPayload::IterationStarted {
            iteration,
            max_iterations,
        } => {
            eprintln!("[{iteration}/{max_iterations}] thinking...");
        }
        RunEventPayload::ToolCallStarted { call } => {
            eprintln!("  -> {} {}", call.name, call.arguments);
        }
        RunEventPayload::ToolCallCompleted { result } if result.is_error => {
            eprintln!("  !! {}", truncate(&result.text, 200));
        }
        RunEventPayload::Finalizing { reason } => {
            eprintln!("forcing a final answer ({reason})");
        }
        _ => {}
    }
}

fn truncate(text: &str, max: usize) -> &str {
    if text.len() <= max {
        return text;
    }
    let mut end = max;
    while end > 0 && !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}
