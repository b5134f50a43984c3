//! The research agent: a bounded reason/act loop over an oracle and a tool registry.

use std::num::NonZeroUsize;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, warn, Instrument};
use uuid::Uuid;

use super::events::{RunEventEmitter, RunEventPayload, RunEventSink, RunId};
use super::notes::ResearchNotes;
use super::prompts::{FINALIZE_PROMPT, SYSTEM_DIRECTIVE};
use super::report::RunReport;
use super::state::{FinalizeReason, LoopState, StateMachine};
use crate::config::{AgentConfig, DEFAULT_MAX_ITERATIONS};
use crate::error::{AgentError, ConfigError};
use crate::oracle::{create_oracle, OracleRequest, ReasoningOracle};
use crate::tools::{ToolArguments, ToolRegistry, WEB_SEARCH_TOOL_NAME};
use crate::types::{Conversation, EmptyTurn, Message, OracleTurn, ToolInvocation, ToolResult, Usage};

/// Progress logging: `info` when the agent is verbose, `debug` otherwise.
macro_rules! progress {
    ($verbose:expr, $($arg:tt)+) => {
        if $verbose {
            tracing::info!($($arg)+)
        } else {
            tracing::debug!($($arg)+)
        }
    };
}

/// Answers research questions by alternating oracle calls and tool dispatches.
///
/// The agent itself holds no per-run state. Each call to [`run`](Self::run)
/// builds a fresh conversation, so one agent can serve concurrent runs and
/// nothing leaks between them.
///
/// Every run terminates after at most `max_iterations` budgeted oracle calls
/// plus one finalization call. If the budget runs out (or the oracle returns
/// an empty turn) the agent asks once more for an answer with tools withheld.
#[derive(Clone)]
pub struct ResearchAgent {
    oracle: Arc<dyn ReasoningOracle>,
    tools: Arc<ToolRegistry>,
    max_iterations: usize,
    verbose: bool,
    system_prompt: String,
    event_sink: Option<RunEventSink>,
}

impl ResearchAgent {
    /// Agent with default settings (5 iterations, built-in system directive).
    pub fn new(oracle: Arc<dyn ReasoningOracle>, tools: ToolRegistry) -> Self {
        Self {
            oracle,
            tools: Arc::new(tools),
            max_iterations: DEFAULT_MAX_ITERATIONS,
            verbose: false,
            system_prompt: SYSTEM_DIRECTIVE.to_string(),
            event_sink: None,
        }
    }

    /// Agent over an explicit oracle and registry, tuned from `config`.
    pub fn with_config(
        oracle: Arc<dyn ReasoningOracle>,
        tools: ToolRegistry,
        config: &AgentConfig,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let mut agent = Self::new(oracle, tools);
        agent.max_iterations = config.max_iterations;
        agent.verbose = config.verbose;
        if let Some(prompt) = &config.system_prompt {
            agent.system_prompt = prompt.clone();
        }
        Ok(agent)
    }

    /// Agent using the configured oracle backend and the built-in tools.
    pub fn from_config(config: &AgentConfig) -> Result<Self, AgentError> {
        config.validate()?;
        let oracle = create_oracle(config)?;
        let tools = ToolRegistry::with_defaults(config)
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;
        Ok(Self::with_config(oracle, tools, config)?)
    }

    pub fn with_max_iterations(mut self, max_iterations: NonZeroUsize) -> Self {
        self.max_iterations = max_iterations.get();
        self
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = prompt.into();
        self
    }

    pub fn with_event_sink(mut self, sink: RunEventSink) -> Self {
        self.event_sink = Some(sink);
        self
    }

    pub fn max_iterations(&self) -> usize {
        self.max_iterations
    }

    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    pub fn oracle(&self) -> &Arc<dyn ReasoningOracle> {
        &self.oracle
    }

    /// Answer `query`.
    pub async fn run(&self, query: &str) -> Result<String, AgentError> {
        self.run_with_report(query).await.map(|report| report.answer)
    }

    /// Answer `query` and return run statistics alongside the answer.
    pub async fn run_with_report(&self, query: &str) -> Result<RunReport, AgentError> {
        self.run_with_cancel(query, &CancellationToken::new()).await
    }

    /// Like [`run_with_report`](Self::run_with_report), but stops with
    /// [`AgentError::Canceled`] once `cancel` fires. The token is checked
    /// before each oracle call; calls already in flight run to completion.
    pub async fn run_with_cancel(
        &self,
        query: &str,
        cancel: &CancellationToken,
    ) -> Result<RunReport, AgentError> {
        let run_id = Uuid::new_v4();
        let span = tracing::info_span!("research_run", %run_id, oracle = self.oracle.name());

        async {
            let mut run = Run::start(self, run_id, query);
            let outcome = run.drive(cancel).await;
            if let Err(err) = &outcome {
                run.fail(err);
            }
            outcome
        }
        .instrument(span)
        .await
    }
}

impl std::fmt::Debug for ResearchAgent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResearchAgent")
            .field("oracle", &self.oracle.name())
            .field("tools", &self.tools)
            .field("max_iterations", &self.max_iterations)
            .field("verbose", &self.verbose)
            .finish()
    }
}

/// State owned by a single run.
struct Run<'a> {
    agent: &'a ResearchAgent,
    run_id: RunId,
    emitter: RunEventEmitter,
    machine: StateMachine,
    conversation: Conversation,
    notes: ResearchNotes,
    usage: Usage,
    iterations: usize,
    tool_dispatches: usize,
}

impl<'a> Run<'a> {
    fn start(agent: &'a ResearchAgent, run_id: RunId, query: &str) -> Self {
        let emitter = RunEventEmitter::new(run_id, agent.event_sink.clone());
        progress!(agent.verbose, query, max_iterations = agent.max_iterations, "research run started");
        emitter.emit(RunEventPayload::Started {
            query: query.to_string(),
        });

        Self {
            agent,
            run_id,
            emitter,
            machine: StateMachine::new(run_id),
            conversation: Conversation::seeded(agent.system_prompt.as_str(), query),
            notes: ResearchNotes::new(),
            usage: Usage::default(),
            iterations: 0,
            tool_dispatches: 0,
        }
    }

    async fn drive(&mut self, cancel: &CancellationToken) -> Result<RunReport, AgentError> {
        let verbose = self.agent.verbose;
        self.machine.enter(LoopState::AwaitingOracle);

        let reason = loop {
            if self.iterations >= self.agent.max_iterations {
                break FinalizeReason::BudgetExhausted;
            }
            if cancel.is_cancelled() {
                return Err(AgentError::Canceled);
            }

            self.iterations += 1;
            progress!(
                verbose,
                iteration = self.iterations,
                max_iterations = self.agent.max_iterations,
                "iteration started"
            );
            self.emitter.emit(RunEventPayload::IterationStarted {
                iteration: self.iterations,
                max_iterations: self.agent.max_iterations,
            });

            let request = OracleRequest::new(self.conversation.messages(), self.agent.tools.descriptors());
            let response = self.agent.oracle.respond(&request).await?;
            self.usage.merge(&response.usage);

            match OracleTurn::classify(response) {
                Ok(OracleTurn::FinalText { text }) => {
                    self.conversation.push_turn(OracleTurn::FinalText { text: text.clone() });
                    return Ok(self.finish(text, None));
                }
                Ok(OracleTurn::ToolInvocations { calls }) => {
                    progress!(verbose, iteration = self.iterations, calls = calls.len(), "oracle requested tools");
                    self.conversation.push_turn(OracleTurn::ToolInvocations { calls: calls.clone() });
                    self.machine.enter(LoopState::DispatchingTools);
                    for call in &calls {
                        let result = self.dispatch(call).await;
                        self.conversation.push_tool_result(result);
                    }
                    self.machine.enter(LoopState::AwaitingOracle);
                }
                Err(EmptyTurn) => {
                    warn!(iteration = self.iterations, "oracle returned neither tool calls nor text");
                    break FinalizeReason::ContractViolation;
                }
            }
        };

        self.finalize(reason, cancel).await
    }

    async fn dispatch(&mut self, call: &ToolInvocation) -> ToolResult {
        progress!(self.agent.verbose, tool = %call.name, call_id = %call.id, "dispatching tool");
        self.emitter.emit(RunEventPayload::ToolCallStarted { call: call.clone() });

        if call.name == WEB_SEARCH_TOOL_NAME {
            if let Some(query) = search_query(&call.arguments) {
                self.notes.add_search(query);
            }
        }

        let result = match self.agent.tools.execute(&call.name, &call.arguments).await {
            Ok(text) => {
                self.notes.add_finding(call.name.as_str(), text.as_str());
                ToolResult {
                    invocation_id: call.id.clone(),
                    tool_name: call.name.clone(),
                    text,
                    is_error: false,
                }
            }
            Err(err) => {
                warn!(tool = %call.name, call_id = %call.id, error = %err, "tool call failed");
                ToolResult {
                    invocation_id: call.id.clone(),
                    tool_name: call.name.clone(),
                    text: err.to_tool_result_text(),
                    is_error: true,
                }
            }
        };

        self.tool_dispatches += 1;
        progress!(
            self.agent.verbose,
            tool = %call.name,
            call_id = %call.id,
            chars = result.text.len(),
            is_error = result.is_error,
            "tool result appended"
        );
        self.emitter.emit(RunEventPayload::ToolCallCompleted {
            result: result.clone(),
        });
        result
    }

    /// One last oracle call with tools withheld. Terminal either way.
    async fn finalize(
        &mut self,
        reason: FinalizeReason,
        cancel: &CancellationToken,
    ) -> Result<RunReport, AgentError> {
        if cancel.is_cancelled() {
            return Err(AgentError::Canceled);
        }

        self.machine.enter(LoopState::Finalizing);
        progress!(self.agent.verbose, %reason, iterations = self.iterations, "forcing final answer");
        self.emitter.emit(RunEventPayload::Finalizing { reason });

        self.conversation.push(Message::user(FINALIZE_PROMPT));
        let request = OracleRequest::new(self.conversation.messages(), &[]);
        let response = self.agent.oracle.respond(&request).await?;
        self.usage.merge(&response.usage);

        if !response.tool_calls.is_empty() {
            debug!(calls = response.tool_calls.len(), "ignoring tool calls during finalization");
        }
        if response.text.trim().is_empty() {
            return Err(match reason {
                FinalizeReason::BudgetExhausted => AgentError::BudgetExhaustedNoAnswer,
                FinalizeReason::ContractViolation => AgentError::OracleContractViolation,
            });
        }

        let text = response.text;
        self.conversation.push_turn(OracleTurn::FinalText { text: text.clone() });
        Ok(self.finish(text, Some(reason)))
    }

    fn finish(&mut self, answer: String, forced: Option<FinalizeReason>) -> RunReport {
        self.machine.enter(LoopState::Done);
        progress!(
            self.agent.verbose,
            iterations = self.iterations,
            tool_dispatches = self.tool_dispatches,
            chars = answer.len(),
            "research run completed"
        );
        self.emitter.emit(RunEventPayload::Completed {
            iterations: self.iterations,
            chars: answer.len(),
        });

        RunReport {
            run_id: self.run_id,
            answer,
            iterations: self.iterations,
            tool_dispatches: self.tool_dispatches,
            forced_finalization: forced,
            usage: self.usage,
            notes: std::mem::take(&mut self.notes),
        }
    }

    fn fail(&mut self, err: &AgentError) {
        if !self.machine.state().is_terminal() {
            self.machine.enter(LoopState::Failed);
        }
        match err {
            AgentError::Canceled => {
                progress!(self.agent.verbose, iterations = self.iterations, "research run canceled");
                self.emitter.emit(RunEventPayload::Canceled);
            }
            other => {
                warn!(
                    iterations = self.iterations,
                    category = %other.category(),
                    error = %other,
                    "research run failed"
                );
                self.emitter.emit(RunEventPayload::Failed {
                    error: other.to_string(),
                });
            }
        }
    }
}

fn search_query(arguments: &serde_json::Value) -> Option<String> {
    ToolArguments::from_value(arguments)
        .ok()
        .and_then(|args| args.get_str_opt("query").map(str::to_string))
}
