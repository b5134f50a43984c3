//! Research agent: the bounded oracle/tool loop and its observability types.

#[allow(clippy::module_inception)]
pub mod agent;
pub mod events;
pub mod notes;
pub mod prompts;
pub mod report;
pub mod state;

pub use agent::ResearchAgent;
pub use events::{RunEvent, RunEventPayload, RunEventSink, RunId};
pub use notes::{Finding, ResearchNotes};
pub use prompts::{FINALIZE_PROMPT, SYSTEM_DIRECTIVE};
pub use report::RunReport;
pub use state::{FinalizeReason, LoopState};
