//! Delve: a tool-using research agent.
//!
//! A [`ResearchAgent`](agent::ResearchAgent) answers a question by looping
//! between a [`ReasoningOracle`](oracle::ReasoningOracle) (usually an LLM)
//! and a [`ToolRegistry`](tools::ToolRegistry) of callable tools such as web
//! search. The loop is bounded: after `max_iterations` oracle turns the agent
//! withholds tools and asks for a final answer.
//!
//! # Quick Start
//!
//! ```no_run
//! use delve::prelude::*;
//!
//! # async fn example() -> delve::error::Result<()> {
//! let config = AgentConfig::from_env()?;
//! let agent = ResearchAgent::from_config(&config)?;
//! let answer = agent.run("What is the tallest mountain in Europe?").await?;
//! println!("{answer}");
//! # Ok(())
//! # }
//! ```

pub mod agent;
pub mod config;
pub mod error;
pub mod oracle;
pub mod prelude;
pub mod tools;
pub mod types;
pub mod util;

#[cfg(feature = "cli")]
pub mod cli;
