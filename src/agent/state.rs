//! Run state machine.
//!
//! ```text
//! Initializing -> AwaitingOracle
//! AwaitingOracle -> DispatchingTools -> AwaitingOracle
//! AwaitingOracle -> Done                  (final text)
//! AwaitingOracle -> Finalizing            (budget exhausted / empty turn)
//! Finalizing -> Done | Failed
//! any non-terminal -> Failed              (oracle error, cancellation)
//! ```
//!
//! Forced finalization is a terminal path, not a retry: it makes exactly one
//! more oracle call and the run ends either way.

use serde::{Deserialize, Serialize};
use strum::Display;
use tracing::trace;

use super::events::RunId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum LoopState {
    Initializing,
    AwaitingOracle,
    DispatchingTools,
    Finalizing,
    Done,
    Failed,
}

impl LoopState {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }

    pub fn can_transition_to(self, next: LoopState) -> bool {
        use LoopState::*;
        match (self, next) {
            (Initializing, AwaitingOracle)
            | (AwaitingOracle, DispatchingTools)
            | (DispatchingTools, AwaitingOracle)
            | (AwaitingOracle, Done)
            | (AwaitingOracle, Finalizing)
            | (Finalizing, Done) => true,
            (from, Failed) => !from.is_terminal(),
            _ => false,
        }
    }
}

/// Why a run was forced into finalization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum FinalizeReason {
    BudgetExhausted,
    ContractViolation,
}

/// Tracks the current state of one run.
#[derive(Debug)]
pub(crate) struct StateMachine {
    run_id: RunId,
    state: LoopState,
}

impl StateMachine {
    pub(crate) fn new(run_id: RunId) -> Self {
        Self {
            run_id,
            state: LoopState::Initializing,
        }
    }

    pub(crate) fn state(&self) -> LoopState {
        self.state
    }

    pub(crate) fn enter(&mut self, next: LoopState) {
        debug_assert!(
            self.state.can_transition_to(next),
            "illegal transition {} -> {}",
            self.state,
            next
        );
        trace!(run_id = %self.run_id, from = %self.state, to = %next, "state transition");
        self.state = next;
    }
}
