//! Outcome of a completed run.

use serde::{Deserialize, Serialize};

use super::events::RunId;
use super::notes::ResearchNotes;
use super::state::FinalizeReason;
use crate::types::Usage;

/// Everything a successful run produced besides the conversation itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub run_id: RunId,
    pub answer: String,
    /// Oracle turns consumed inside the budgeted loop. Never exceeds the
    /// configured maximum; the finalization call is not counted.
    pub iterations: usize,
    pub tool_dispatches: usize,
    /// Set when the answer came from the forced finalization call.
    pub forced_finalization: Option<FinalizeReason>,
    pub usage: Usage,
    pub notes: ResearchNotes,
}

impl RunReport {
    pub fn was_forced(&self) -> bool {
        self.forced_finalization.is_some()
    }
}
